use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const RSA_SHA1: &str = "C0FF9B6489FF7A1ED60D7018C5895459E968A8B8";
const UNKNOWN_SHA1: &str = "0000000000000000000000000000000000000000";
const EXPIRED_SHA1: &str = "94984CB0DC107FB6E53616B343036A3116554AC5";
const INPUT: &str = "<root><child/></root>";

fn cli_exe() -> &'static str {
    env!("CARGO_BIN_EXE_xmlsign")
}

fn key_fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("test-data")
        .join("keys")
        .join(name)
}

struct Workspace {
    user: TempDir,
    machine: TempDir,
    work: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            user: tempfile::tempdir().expect("user store"),
            machine: tempfile::tempdir().expect("machine store"),
            work: tempfile::tempdir().expect("work dir"),
        }
    }

    fn install(&self, store: &Path, with_key: bool) {
        self.install_as(store, "rsa-2048", with_key);
    }

    fn install_as(&self, store: &Path, fixture: &str, with_key: bool) {
        fs::copy(key_fixture(&format!("{fixture}-cert.pem")), store.join(format!("{fixture}.pem")))
            .expect("copy cert");
        if with_key {
            fs::copy(key_fixture(&format!("{fixture}-key.pem")), store.join(format!("{fixture}.key")))
                .expect("copy key");
        }
    }

    fn input(&self, text: &str) -> PathBuf {
        let path = self.work.path().join("in.xml");
        fs::write(&path, text).expect("write input");
        path
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(cli_exe())
            .args(args)
            .arg("--user-store")
            .arg(self.user.path())
            .arg("--machine-store")
            .arg(self.machine.path())
            .env_remove("RUST_LOG")
            .current_dir(self.work.path())
            .output()
            .expect("run xmlsign")
    }
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Base64 DER of a PEM certificate fixture, as it appears in `X509Certificate`.
fn der_base64(name: &str) -> String {
    let pem = fs::read_to_string(key_fixture(name)).expect("read fixture");
    pem.lines().filter(|line| !line.starts_with("-----")).collect()
}

#[test]
fn missing_input_prints_usage() {
    let ws = Workspace::new();
    let output = ws.run(&["/sha1", RSA_SHA1]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("Missing input file"), "{err}");
    assert!(err.contains("Usage: xmlsign <infile>"), "{err}");
}

#[test]
fn missing_thumbprint_prints_usage() {
    let ws = Workspace::new();
    let input = ws.input(INPUT);
    let output = ws.run(&[input.to_str().expect("utf-8 path")]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Missing SHA1 parameter"));
    assert_eq!(fs::read_to_string(&input).expect("input"), INPUT);
}

#[test]
fn multiple_inputs_are_rejected() {
    let ws = Workspace::new();
    let output = ws.run(&["a.xml", "b.xml", "/sha1", RSA_SHA1]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Multiple input files not supported"));
}

#[test]
fn matching_thumbprint_signs_in_place() {
    let ws = Workspace::new();
    ws.install(ws.user.path(), true);
    ws.input(INPUT);

    let output = ws.run(&["in.xml", "/sha1", RSA_SHA1]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));

    let signed = fs::read_to_string(ws.work.path().join("in.xml")).expect("signed");
    assert!(signed.starts_with(r#"<root><child/><Signature xmlns="http://www.w3.org/2000/09/xmldsig#">"#));
    assert!(signed.ends_with("</Signature></root>"));
    assert!(signed.contains("<X509Certificate>"));
}

#[test]
fn unmatched_thumbprint_warns_and_keeps_document() {
    let ws = Workspace::new();
    ws.install(ws.machine.path(), true);
    let input = ws.input(INPUT);

    let output = ws.run(&["in.xml", "/sha1", UNKNOWN_SHA1]);
    assert_eq!(output.status.code(), Some(0));
    let err = stderr(&output);
    assert!(err.contains("Xml file in.xml not successfully signed"), "{err}");
    assert_eq!(fs::read_to_string(&input).expect("input"), INPUT);
}

#[test]
fn missing_key_keeps_document() {
    let ws = Workspace::new();
    ws.install(ws.user.path(), false);
    let input = ws.input(INPUT);

    let output = ws.run(&["in.xml", "/sha1", RSA_SHA1]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stderr(&output).contains("CN=XmlSign Test RSA"));
    assert_eq!(fs::read_to_string(&input).expect("input"), INPUT);
}

#[test]
fn out_switch_writes_elsewhere() {
    let ws = Workspace::new();
    ws.install(ws.machine.path(), true);
    let input = ws.input(INPUT);

    let output = ws.run(&["in.xml", "/o", "signed.xml", "/sha1", RSA_SHA1]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(fs::read_to_string(&input).expect("input"), INPUT);
    let signed = fs::read_to_string(ws.work.path().join("signed.xml")).expect("output");
    assert!(signed.contains("</Signature></root>"));
}

#[test]
fn unsigned_run_copies_to_out() {
    let ws = Workspace::new();
    ws.input(INPUT);

    let output = ws.run(&["in.xml", "--out", "copy.xml", "--sha1", UNKNOWN_SHA1]);
    assert_eq!(output.status.code(), Some(0));
    let copy = fs::read_to_string(ws.work.path().join("copy.xml")).expect("copy");
    assert_eq!(copy, INPUT);
}

#[test]
fn verbose_traces_the_search() {
    let ws = Workspace::new();
    ws.install(ws.user.path(), true);
    ws.input(INPUT);

    let output = ws.run(&["in.xml", "/verbose", "/sha1", RSA_SHA1]);
    assert_eq!(output.status.code(), Some(0));
    let err = stderr(&output);
    assert!(err.contains(&format!("Trying to use sha1 {RSA_SHA1} with X509Store, on CurrentUser.")), "{err}");
    assert!(err.contains("Key found."), "{err}");
}

#[test]
fn gnu_flags_and_options() {
    let ws = Workspace::new();
    ws.install(ws.user.path(), true);
    ws.input(INPUT);

    let output = ws.run(&["-v", "in.xml", "-o", "out.xml", "--sha1", RSA_SHA1, "--digest", "sha512"]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    let signed = fs::read_to_string(ws.work.path().join("out.xml")).expect("output");
    assert!(signed.contains("http://www.w3.org/2001/04/xmlenc#sha512"));
    assert!(signed.contains("http://www.w3.org/2001/04/xmldsig-more#rsa-sha512"));
}

#[test]
fn malformed_xml_fails() {
    let ws = Workspace::new();
    ws.install(ws.user.path(), true);
    ws.input("<root>");

    let output = ws.run(&["in.xml", "/sha1", RSA_SHA1]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn malformed_thumbprint_is_ignored() {
    let ws = Workspace::new();
    ws.install(ws.user.path(), true);
    let input = ws.input(INPUT);

    let output = ws.run(&["in.xml", "/sha1", "not-hex"]);
    assert_eq!(output.status.code(), Some(0));
    let err = stderr(&output);
    assert!(err.contains("Ignoring SHA1 parameter \"not-hex\""), "{err}");
    assert!(err.contains("Xml file in.xml not successfully signed"), "{err}");
    assert!(!err.contains("Usage:"), "{err}");
    assert_eq!(fs::read_to_string(&input).expect("input"), INPUT);
}

#[test]
fn malformed_thumbprint_does_not_hide_valid_one() {
    let ws = Workspace::new();
    ws.install(ws.user.path(), true);
    ws.input(INPUT);

    let output = ws.run(&["in.xml", "/sha1", "C0FF", "/sha1", RSA_SHA1]);
    assert_eq!(output.status.code(), Some(0));
    let signed = fs::read_to_string(ws.work.path().join("in.xml")).expect("signed");
    assert!(signed.ends_with("</Signature></root>"));
}

#[test]
fn expired_certificate_falls_through_to_machine_store() {
    let ws = Workspace::new();
    ws.install_as(ws.user.path(), "rsa-2048-expired", true);
    ws.install(ws.machine.path(), true);
    ws.input(INPUT);

    let output = ws.run(&["in.xml", "/v", "/sha1", EXPIRED_SHA1, "/sha1", RSA_SHA1]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));
    let err = stderr(&output);
    assert!(err.contains("Skipping certificate CN=XmlSign Expired RSA"), "{err}");

    let signed = fs::read_to_string(ws.work.path().join("in.xml")).expect("signed");
    assert!(signed.contains(&der_base64("rsa-2048-cert.pem")));
    assert!(!signed.contains(&der_base64("rsa-2048-expired-cert.pem")));
}

#[test]
fn only_expired_certificate_keeps_document() {
    let ws = Workspace::new();
    ws.install_as(ws.user.path(), "rsa-2048-expired", true);
    let input = ws.input(INPUT);

    let output = ws.run(&["in.xml", "/sha1", EXPIRED_SHA1]);
    assert_eq!(output.status.code(), Some(0));
    assert!(stderr(&output).contains("not successfully signed"));
    assert_eq!(fs::read_to_string(&input).expect("input"), INPUT);
}

#[test]
fn utf16_input_is_signed_as_utf16() {
    let ws = Workspace::new();
    ws.install(ws.user.path(), true);
    let text = "<?xml version=\"1.0\" encoding=\"UTF-16\"?>\n<root>caf\u{e9}</root>";
    let mut data = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        data.extend_from_slice(&unit.to_le_bytes());
    }
    fs::write(ws.work.path().join("in.xml"), data).expect("write input");

    let output = ws.run(&["in.xml", "/sha1", RSA_SHA1]);
    assert_eq!(output.status.code(), Some(0), "{}", stderr(&output));

    let bytes = fs::read(ws.work.path().join("in.xml")).expect("signed");
    assert_eq!(&bytes[..2], &[0xFF, 0xFE]);
    let units: Vec<u16> = bytes[2..]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let signed = String::from_utf16(&units).expect("utf-16 output");
    assert!(signed.starts_with("<?xml version=\"1.0\" encoding=\"UTF-16\"?>\n<root>caf\u{e9}<Signature "));
    assert!(signed.ends_with("</Signature></root>"));
}
