#![forbid(unsafe_code)]

//! xmlsign: sign an XML file with a certificate found by thumbprint.

use clap::error::ErrorKind;
use clap::Parser;
use log::LevelFilter;
use std::process;
use xmlsign::cli::{self, Cli};
use xmlsign::signer::XmlSigner;
use xmlsign_certstore::Resolver;

fn main() {
    let cli = match Cli::try_parse_from(cli::normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => process::exit(0),
                _ => process::exit(1),
            }
        }
    };

    init_logging(cli.verbose);

    let config = match cli.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{}", cli::usage());
            process::exit(1);
        }
    };

    let resolver = Resolver::system(&config.user_store, &config.machine_store);
    let signer = XmlSigner::new(resolver, config.ctx);
    let outcome = signer.sign_file(&config.input, &config.output, &config.thumbprints);
    process::exit(outcome.exit_code());
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
