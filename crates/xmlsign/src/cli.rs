#![forbid(unsafe_code)]

//! Command line parsing.
//!
//! The slash switches `/v`, `/verbose`, `/o`, `/out` and `/sha1` are
//! rewritten to their long flags before clap sees them, so both spellings
//! are accepted. Only exact matches are rewritten; an absolute input path
//! such as `/tmp/in.xml` stays a positional argument.

use clap::{Parser, ValueEnum};
use log::warn;
use std::ffi::OsString;
use std::path::PathBuf;
use xmlsign_c14n::C14nMode;
use xmlsign_certstore::Thumbprint;
use xmlsign_core::algorithm;
use xmlsign_dsig::DsigContext;

const SYNOPSIS: &str =
    "xmlsign <infile> [/v | /verbose] [/o | /out <outfile>] /sha1 <sha1> [/sha1 <sha1b> ...]";

pub const DEFAULT_MACHINE_STORE: &str = "/etc/xmlsign/my";

/// The one-line usage printed after argument errors.
pub fn usage() -> String {
    format!("Usage: {SYNOPSIS}")
}

#[derive(Parser, Debug)]
#[command(
    name = "xmlsign",
    about = "Sign an XML file with an enveloped XML-DSig signature",
    version,
    override_usage = SYNOPSIS
)]
pub struct Cli {
    /// Input XML file
    #[arg(value_name = "INFILE")]
    pub inputs: Vec<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output file (default: overwrite the input)
    #[arg(short, long, value_name = "OUTFILE")]
    pub out: Option<PathBuf>,

    /// Thumbprint of an acceptable signing certificate, tried in order
    #[arg(long = "sha1", value_name = "THUMBPRINT")]
    pub sha1: Vec<String>,

    /// Reference digest algorithm
    #[arg(long, value_enum, default_value_t = DigestName::Sha256)]
    pub digest: DigestName,

    /// Canonicalize with comments
    #[arg(long)]
    pub with_comments: bool,

    /// Refuse certificates outside their validity period
    #[arg(long)]
    pub check_validity: bool,

    /// CurrentUser store directory (default: $HOME/.xmlsign/my)
    #[arg(long, env = "XMLSIGN_USER_STORE", value_name = "DIR")]
    pub user_store: Option<PathBuf>,

    /// LocalMachine store directory
    #[arg(
        long,
        env = "XMLSIGN_MACHINE_STORE",
        value_name = "DIR",
        default_value = DEFAULT_MACHINE_STORE
    )]
    pub machine_store: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DigestName {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestName {
    pub fn uri(self) -> &'static str {
        match self {
            DigestName::Sha1 => algorithm::SHA1,
            DigestName::Sha256 => algorithm::SHA256,
            DigestName::Sha384 => algorithm::SHA384,
            DigestName::Sha512 => algorithm::SHA512,
        }
    }
}

/// Argument errors that end the run with the usage text.
#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error("Missing input file")]
    MissingInput,

    #[error("Multiple input files not supported")]
    MultipleInputs,

    #[error("Missing SHA1 parameter")]
    MissingThumbprint,
}

/// A validated invocation.
#[derive(Debug)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub verbose: bool,
    pub thumbprints: Vec<Thumbprint>,
    pub ctx: DsigContext,
    pub user_store: PathBuf,
    pub machine_store: PathBuf,
}

impl Cli {
    /// Validate the arguments.
    ///
    /// A `/sha1` value that is not a thumbprint cannot match any
    /// certificate; it is dropped with a warning.
    pub fn into_config(self) -> Result<Config, UsageError> {
        let mut inputs = self.inputs.into_iter();
        let input = inputs.next().ok_or(UsageError::MissingInput)?;
        if inputs.next().is_some() {
            return Err(UsageError::MultipleInputs);
        }

        if self.sha1.is_empty() {
            return Err(UsageError::MissingThumbprint);
        }
        let thumbprints: Vec<Thumbprint> = self
            .sha1
            .iter()
            .filter_map(|value| match value.parse() {
                Ok(thumbprint) => Some(thumbprint),
                Err(e) => {
                    warn!("Ignoring SHA1 parameter {value:?}: {e}");
                    None
                }
            })
            .collect();

        let c14n_mode = if self.with_comments {
            C14nMode::InclusiveWithComments
        } else {
            C14nMode::Inclusive
        };
        let ctx = DsigContext::new()
            .with_digest_method(self.digest.uri())
            .with_c14n_mode(c14n_mode)
            .with_check_validity(self.check_validity);

        Ok(Config {
            output: self.out.unwrap_or_else(|| input.clone()),
            input,
            verbose: self.verbose,
            thumbprints,
            ctx,
            user_store: self.user_store.unwrap_or_else(default_user_store),
            machine_store: self.machine_store,
        })
    }
}

/// `$HOME/.xmlsign/my`, relative to the working directory without `HOME`.
pub fn default_user_store() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(".xmlsign")
        .join("my")
}

/// Rewrite slash switches to the long flags clap understands.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            let flag = match arg.to_str() {
                Some("/v" | "/verbose") => "--verbose",
                Some("/o" | "/out") => "--out",
                Some("/sha1") => "--sha1",
                _ => return arg,
            };
            OsString::from(flag)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSA_SHA1: &str = "C0FF9B6489FF7A1ED60D7018C5895459E968A8B8";

    fn parse(args: &[&str]) -> Result<Config, UsageError> {
        let argv = std::iter::once("xmlsign").chain(args.iter().copied());
        Cli::try_parse_from(normalize_args(argv)).unwrap().into_config()
    }

    #[test]
    fn slash_switches_are_rewritten() {
        let args = normalize_args(["xmlsign", "/tmp/in.xml", "/v", "/out", "o.xml", "/sha1", "AB"]);
        assert_eq!(
            args,
            ["xmlsign", "/tmp/in.xml", "--verbose", "--out", "o.xml", "--sha1", "AB"]
                .map(OsString::from)
        );
        assert_eq!(normalize_args(["/V", "/o"]), ["/V", "--out"].map(OsString::from));
    }

    #[test]
    fn slash_and_gnu_forms_agree() {
        let slash = parse(&["in.xml", "/verbose", "/o", "out.xml", "/sha1", RSA_SHA1]).unwrap();
        let gnu = parse(&["in.xml", "-v", "--out", "out.xml", "--sha1", RSA_SHA1]).unwrap();
        for config in [slash, gnu] {
            assert!(config.verbose);
            assert_eq!(config.input, PathBuf::from("in.xml"));
            assert_eq!(config.output, PathBuf::from("out.xml"));
            assert_eq!(config.thumbprints.len(), 1);
        }
    }

    #[test]
    fn output_defaults_to_input() {
        let config = parse(&["doc.xml", "/sha1", RSA_SHA1]).unwrap();
        assert_eq!(config.output, config.input);
        assert!(!config.verbose);
        assert_eq!(config.ctx.digest_method, algorithm::SHA256);
    }

    #[test]
    fn thumbprints_keep_their_order() {
        let second = "FDB5BB0DEBDA8D05B5BCA326E42B8B86ACCDA46D";
        let config = parse(&["doc.xml", "/sha1", second, "/sha1", "c0:ff:9b:64:89:ff:7a:1e:d6:0d:70:18:c5:89:54:59:e9:68:a8:b8"]).unwrap();
        let values: Vec<&str> = config.thumbprints.iter().map(Thumbprint::as_str).collect();
        assert_eq!(values, [second, RSA_SHA1]);
    }

    #[test]
    fn missing_input() {
        assert!(matches!(parse(&["/sha1", RSA_SHA1]), Err(UsageError::MissingInput)));
        assert!(matches!(parse(&[]), Err(UsageError::MissingInput)));
    }

    #[test]
    fn multiple_inputs() {
        let err = parse(&["a.xml", "b.xml", "/sha1", RSA_SHA1]).unwrap_err();
        assert_eq!(err.to_string(), "Multiple input files not supported");
    }

    #[test]
    fn missing_thumbprint() {
        let err = parse(&["a.xml", "/v"]).unwrap_err();
        assert_eq!(err.to_string(), "Missing SHA1 parameter");
    }

    #[test]
    fn malformed_thumbprint_is_dropped() {
        let config = parse(&["a.xml", "/sha1", "not-hex", "/sha1", RSA_SHA1]).unwrap();
        let values: Vec<&str> = config.thumbprints.iter().map(Thumbprint::as_str).collect();
        assert_eq!(values, [RSA_SHA1]);

        let config = parse(&["a.xml", "/sha1", "C0FF"]).unwrap();
        assert!(config.thumbprints.is_empty());
    }

    #[test]
    fn signing_options() {
        let config = parse(&[
            "a.xml",
            "--sha1",
            RSA_SHA1,
            "--digest",
            "sha512",
            "--with-comments",
            "--check-validity",
            "--user-store",
            "/srv/user",
            "--machine-store",
            "/srv/machine",
        ])
        .unwrap();
        assert_eq!(config.ctx.digest_method, algorithm::SHA512);
        assert_eq!(config.ctx.c14n_mode, C14nMode::InclusiveWithComments);
        assert!(config.ctx.check_validity);
        assert_eq!(config.user_store, PathBuf::from("/srv/user"));
        assert_eq!(config.machine_store, PathBuf::from("/srv/machine"));
    }

    #[test]
    fn trailing_switch_without_value_is_rejected_by_clap() {
        for args in [
            ["xmlsign", "a.xml", "/sha1", RSA_SHA1, "/o"],
            ["xmlsign", "a.xml", "/o", "b.xml", "/sha1"],
        ] {
            assert!(Cli::try_parse_from(normalize_args(args)).is_err());
        }
    }

    #[test]
    fn unknown_digest_is_rejected_by_clap() {
        let argv = normalize_args(["xmlsign", "a.xml", "--sha1", RSA_SHA1, "--digest", "md5"]);
        assert!(Cli::try_parse_from(argv).is_err());
    }
}
