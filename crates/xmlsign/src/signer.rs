#![forbid(unsafe_code)]

//! Signing of one XML file: resolve a certificate, sign, write the result.

use log::{debug, error, warn};
use std::path::Path;
use xmlsign_certstore::{Resolver, Thumbprint};
use xmlsign_core::Error;
use xmlsign_dsig::{DsigContext, SignatureResult};
use xmlsign_xml::XmlDocument;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The output holds the signed document.
    Signed,
    /// No usable certificate; the document was left unsigned.
    Unsigned,
    Failed,
}

impl Outcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Signed | Outcome::Unsigned => 0,
            Outcome::Failed => 1,
        }
    }
}

pub struct XmlSigner {
    resolver: Resolver,
    ctx: DsigContext,
}

impl XmlSigner {
    pub fn new(resolver: Resolver, ctx: DsigContext) -> Self {
        Self { resolver, ctx }
    }

    /// Sign `input` into `output`, which may be the same file.
    ///
    /// The signed document keeps the input's encoding (UTF-8 or UTF-16).
    ///
    /// A missing certificate or an unusable key leaves the document
    /// unsigned; when `output` is another file it receives the input bytes
    /// unchanged. Errors are logged and reported as [`Outcome::Failed`].
    pub fn sign_file(&self, input: &Path, output: &Path, thumbprints: &[Thumbprint]) -> Outcome {
        match self.run(input, output, thumbprints) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("{e}");
                Outcome::Failed
            }
        }
    }

    fn run(&self, input: &Path, output: &Path, thumbprints: &[Thumbprint]) -> Result<Outcome, Error> {
        let data = read_file(input)?;
        let document = XmlDocument::parse_bytes(&data)
            .map_err(|e| Error::Other(format!("{}: {e}", input.display())))?;

        let resolution = self.resolver.resolve(thumbprints);
        let result = xmlsign_dsig::sign(&self.ctx, &document, &resolution)
            .map_err(|e| internal_error(input, &e.to_string()))?;

        match result {
            SignatureResult::Signed(signed) => {
                write_output(output, &document.encoding().encode(&signed))?;
                debug!("Signed {} into {}", input.display(), output.display());
                Ok(Outcome::Signed)
            }
            SignatureResult::NoCertificateAvailable => {
                warn!(
                    "Xml file {} not successfully signed. Please check that one of the required certificates is installed in the system.",
                    input.display()
                );
                keep_unsigned(input, output, &data)
            }
            SignatureResult::KeyAccessDenied { subject, reason } => {
                warn!(
                    "Xml file {} not successfully signed. Please check that the private key of certificate '{subject}' is installed with correct read rights. Inner error: {reason}",
                    input.display()
                );
                keep_unsigned(input, output, &data)
            }
            SignatureResult::VerificationFailed { reason } => Err(internal_error(input, &reason)),
        }
    }
}

fn internal_error(input: &Path, reason: &str) -> Error {
    Error::Other(format!(
        "Internal error: cannot apply/verify signature to {}: {reason}",
        input.display()
    ))
}

/// In-place runs leave the input alone; otherwise copy it to `output`.
fn keep_unsigned(input: &Path, output: &Path, data: &[u8]) -> Result<Outcome, Error> {
    if !same_file(input, output) {
        write_output(output, data)?;
    }
    Ok(Outcome::Unsigned)
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, Error> {
    std::fs::read(path).map_err(|e| Error::Other(format!("{}: {e}", path.display())))
}

fn write_output(path: &Path, data: &[u8]) -> Result<(), Error> {
    std::fs::write(path, data).map_err(|e| Error::Other(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use xmlsign_xml::TextEncoding;

    const RSA_SHA1: &str = "C0FF9B6489FF7A1ED60D7018C5895459E968A8B8";
    const UNKNOWN_SHA1: &str = "0000000000000000000000000000000000000000";
    const EXPIRED_SHA1: &str = "94984CB0DC107FB6E53616B343036A3116554AC5";
    const INPUT: &str = "<root><child/></root>";

    struct Setup {
        user: TempDir,
        machine: TempDir,
        work: TempDir,
    }

    impl Setup {
        fn new() -> Self {
            Self {
                user: tempfile::tempdir().unwrap(),
                machine: tempfile::tempdir().unwrap(),
                work: tempfile::tempdir().unwrap(),
            }
        }

        fn install(&self, dir: &Path, with_key: bool) {
            self.install_as(dir, "rsa-2048", with_key);
        }

        fn install_as(&self, dir: &Path, fixture: &str, with_key: bool) {
            let keys = Path::new("../../test-data/keys");
            fs::copy(keys.join(format!("{fixture}-cert.pem")), dir.join(format!("{fixture}.pem"))).unwrap();
            if with_key {
                fs::copy(keys.join(format!("{fixture}-key.pem")), dir.join(format!("{fixture}.key"))).unwrap();
            }
        }

        fn input(&self, text: &str) -> PathBuf {
            let path = self.work.path().join("in.xml");
            fs::write(&path, text).unwrap();
            path
        }

        fn signer(&self) -> XmlSigner {
            XmlSigner::new(
                Resolver::system(self.user.path(), self.machine.path()),
                DsigContext::default(),
            )
        }
    }

    fn thumbprints(values: &[&str]) -> Vec<Thumbprint> {
        values.iter().map(|v| v.parse().unwrap()).collect()
    }

    #[test]
    fn signs_into_separate_output() {
        let setup = Setup::new();
        setup.install(setup.machine.path(), true);
        let input = setup.input(INPUT);
        let output = setup.work.path().join("out.xml");

        let outcome = setup.signer().sign_file(&input, &output, &thumbprints(&[RSA_SHA1]));
        assert_eq!(outcome, Outcome::Signed);
        assert_eq!(outcome.exit_code(), 0);

        let signed = fs::read_to_string(&output).unwrap();
        assert!(signed.starts_with("<root><child/><Signature "));
        assert!(signed.ends_with("</Signature></root>"));
        assert_eq!(fs::read_to_string(&input).unwrap(), INPUT);
    }

    #[test]
    fn signs_in_place() {
        let setup = Setup::new();
        setup.install(setup.user.path(), true);
        let input = setup.input(INPUT);

        let outcome = setup.signer().sign_file(&input, &input, &thumbprints(&[UNKNOWN_SHA1, RSA_SHA1]));
        assert_eq!(outcome, Outcome::Signed);
        assert!(fs::read_to_string(&input).unwrap().contains("<SignatureValue>"));
    }

    #[test]
    fn unmatched_thumbprint_copies_input() {
        let setup = Setup::new();
        setup.install(setup.user.path(), true);
        let input = setup.input("<?xml version=\"1.0\"?>\n<root>\n  <child/>\n</root>\n");
        let output = setup.work.path().join("out.xml");

        let outcome = setup.signer().sign_file(&input, &output, &thumbprints(&[UNKNOWN_SHA1]));
        assert_eq!(outcome, Outcome::Unsigned);
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(fs::read(&output).unwrap(), fs::read(&input).unwrap());
    }

    #[test]
    fn empty_thumbprint_list_is_unsigned() {
        let setup = Setup::new();
        setup.install(setup.user.path(), true);
        let input = setup.input(INPUT);
        assert_eq!(setup.signer().sign_file(&input, &input, &[]), Outcome::Unsigned);
        assert_eq!(fs::read_to_string(&input).unwrap(), INPUT);
    }

    #[test]
    fn missing_key_leaves_document_unsigned() {
        let setup = Setup::new();
        setup.install(setup.user.path(), false);
        let input = setup.input(INPUT);
        let output = setup.work.path().join("out.xml");

        let outcome = setup.signer().sign_file(&input, &output, &thumbprints(&[RSA_SHA1]));
        assert_eq!(outcome, Outcome::Unsigned);
        assert_eq!(fs::read_to_string(&output).unwrap(), INPUT);
    }

    #[test]
    fn expired_certificate_gives_way_to_valid_one() {
        let setup = Setup::new();
        setup.install_as(setup.user.path(), "rsa-2048-expired", true);
        setup.install(setup.machine.path(), true);
        let input = setup.input(INPUT);

        let outcome = setup.signer().sign_file(&input, &input, &thumbprints(&[EXPIRED_SHA1, RSA_SHA1]));
        assert_eq!(outcome, Outcome::Signed);

        let signed = fs::read_to_string(&input).unwrap();
        let pem = fs::read_to_string("../../test-data/keys/rsa-2048-cert.pem").unwrap();
        let der_base64: String = pem.lines().filter(|l| !l.starts_with("-----")).collect();
        assert!(signed.contains(&format!("<X509Certificate>{der_base64}</X509Certificate>")));
    }

    #[test]
    fn expired_certificate_alone_leaves_document_unsigned() {
        let setup = Setup::new();
        setup.install_as(setup.user.path(), "rsa-2048-expired", true);
        let input = setup.input(INPUT);
        let outcome = setup.signer().sign_file(&input, &input, &thumbprints(&[EXPIRED_SHA1]));
        assert_eq!(outcome, Outcome::Unsigned);
        assert_eq!(fs::read_to_string(&input).unwrap(), INPUT);
    }

    #[test]
    fn utf16_document_is_signed_in_its_encoding() {
        let setup = Setup::new();
        setup.install(setup.user.path(), true);
        let text = "<?xml version=\"1.0\" encoding=\"UTF-16\"?><root>\u{e9}t\u{e9}</root>";
        let input = setup.work.path().join("in.xml");
        fs::write(&input, TextEncoding::Utf16Le.encode(text)).unwrap();

        let outcome = setup.signer().sign_file(&input, &input, &thumbprints(&[RSA_SHA1]));
        assert_eq!(outcome, Outcome::Signed);

        let (signed, encoding) = xmlsign_xml::encoding::decode(&fs::read(&input).unwrap()).unwrap();
        assert_eq!(encoding, TextEncoding::Utf16Le);
        assert!(signed.starts_with(text.trim_end_matches("</root>")));
        assert!(signed.ends_with("</Signature></root>"));
    }

    #[test]
    fn unreadable_input_fails() {
        let setup = Setup::new();
        let input = setup.work.path().join("missing.xml");
        let outcome = setup.signer().sign_file(&input, &input, &thumbprints(&[RSA_SHA1]));
        assert_eq!(outcome, Outcome::Failed);
        assert_eq!(outcome.exit_code(), 1);
    }

    #[test]
    fn malformed_input_fails() {
        let setup = Setup::new();
        setup.install(setup.user.path(), true);
        let input = setup.input("<root><unclosed></root>");
        let outcome = setup.signer().sign_file(&input, &input, &thumbprints(&[RSA_SHA1]));
        assert_eq!(outcome, Outcome::Failed);
    }

    #[test]
    fn unwritable_output_fails() {
        let setup = Setup::new();
        setup.install(setup.user.path(), true);
        let input = setup.input(INPUT);
        let output = setup.work.path().join("no-such-dir").join("out.xml");
        let outcome = setup.signer().sign_file(&input, &output, &thumbprints(&[RSA_SHA1]));
        assert_eq!(outcome, Outcome::Failed);
    }
}
