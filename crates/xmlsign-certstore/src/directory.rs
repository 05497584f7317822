#![forbid(unsafe_code)]

//! Directory-backed certificate store.
//!
//! Every `*.pem`, `*.crt`, `*.cer` and `*.der` file in the directory is a
//! candidate certificate. The private key is either a key block in the
//! same PEM file or a sibling file named `<stem>.key`.

use crate::certificate::X509Certificate;
use crate::loader;
use crate::store::{CertificateStore, KeySource, StoreHandle, StoredCertificate};
use crate::thumbprint::Thumbprint;
use log::{debug, trace};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use xmlsign_core::Error;

const CERT_EXTENSIONS: &[&str] = &["pem", "crt", "cer", "der"];

/// A certificate store reading a directory of certificate files.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    name: String,
    path: PathBuf,
}

impl DirectoryStore {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn store_error(&self, reason: impl Into<String>) -> Error {
        Error::Store {
            store: self.name.clone(),
            reason: reason.into(),
        }
    }

    /// Certificate file paths, sorted by file name.
    fn certificate_files(&self) -> Result<Vec<PathBuf>, Error> {
        let entries = std::fs::read_dir(&self.path)
            .map_err(|e| self.store_error(format!("{}: {e}", self.path.display())))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| self.store_error(e.to_string()))?;
            let path = entry.path();
            let is_cert = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| CERT_EXTENSIONS.iter().any(|c| ext.eq_ignore_ascii_case(c)));
            if is_cert && path.is_file() {
                files.push(path);
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }
}

impl CertificateStore for DirectoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> Result<Box<dyn StoreHandle + '_>, Error> {
        let files = match std::fs::metadata(&self.path) {
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(
                    "Store {} at {} does not exist, treating it as empty.",
                    self.name,
                    self.path.display()
                );
                Vec::new()
            }
            Err(e) => return Err(self.store_error(format!("{}: {e}", self.path.display()))),
            Ok(meta) if !meta.is_dir() => {
                return Err(self.store_error(format!("{} is not a directory", self.path.display())))
            }
            Ok(_) => self.certificate_files()?,
        };

        let mut entries = Vec::new();
        for file in files {
            match read_entry(&file) {
                Ok(entry) => entries.push(entry),
                Err(e) => debug!("Skipping {}: {e}", file.display()),
            }
        }
        trace!("Opened store {} with {} certificate(s).", self.name, entries.len());

        Ok(Box::new(DirectoryHandle {
            store: &self.name,
            entries,
        }))
    }
}

/// Parse one certificate file and locate its private key.
///
/// Key material is not read here; only its location is recorded.
fn read_entry(path: &Path) -> Result<StoredCertificate, Error> {
    let data = std::fs::read(path)?;
    let certificate = X509Certificate::from_pem_or_der(&data)?;

    let key_source = if loader::has_private_key_block(&data) {
        KeySource::Embedded(data)
    } else {
        let sibling = path.with_extension("key");
        if sibling.is_file() {
            KeySource::File(sibling)
        } else {
            KeySource::Missing
        }
    };
    Ok(StoredCertificate::new(certificate, key_source))
}

struct DirectoryHandle<'a> {
    store: &'a str,
    entries: Vec<StoredCertificate>,
}

impl StoreHandle for DirectoryHandle<'_> {
    fn find_by_thumbprint(&self, thumbprint: &Thumbprint) -> Result<Vec<StoredCertificate>, Error> {
        Ok(self
            .entries
            .iter()
            .filter(|e| thumbprint.matches(&e.certificate))
            .cloned()
            .collect())
    }
}

impl Drop for DirectoryHandle<'_> {
    fn drop(&mut self) {
        trace!("Closed store {}.", self.store);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSA_SHA1: &str = "C0FF9B6489FF7A1ED60D7018C5895459E968A8B8";
    const EC_SHA1: &str = "86C6F74014C9E021256DE9D31382D19519178E41";

    fn copy_fixture(dir: &Path, name: &str, as_name: &str) {
        std::fs::copy(format!("../../test-data/keys/{name}"), dir.join(as_name)).unwrap();
    }

    fn find(store: &DirectoryStore, thumbprint: &str) -> Vec<StoredCertificate> {
        let handle = store.open().unwrap();
        handle.find_by_thumbprint(&thumbprint.parse().unwrap()).unwrap()
    }

    #[test]
    fn finds_certificate_with_sibling_key() {
        let dir = tempfile::tempdir().unwrap();
        copy_fixture(dir.path(), "rsa-2048-cert.pem", "signer.pem");
        copy_fixture(dir.path(), "rsa-2048-key.pem", "signer.key");
        copy_fixture(dir.path(), "ec-p256-cert.pem", "ec.crt");

        let store = DirectoryStore::new("CurrentUser", dir.path());
        let found = find(&store, RSA_SHA1);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key_source, KeySource::File(dir.path().join("signer.key")));
        assert!(found[0].private_key().is_ok());

        let ec = find(&store, EC_SHA1);
        assert_eq!(ec.len(), 1);
        assert_eq!(ec[0].key_source, KeySource::Missing);
    }

    #[test]
    fn der_certificates_and_embedded_keys() {
        let dir = tempfile::tempdir().unwrap();
        copy_fixture(dir.path(), "rsa-2048-cert.der", "b.der");
        let mut combined = std::fs::read("../../test-data/keys/ec-p256-cert.pem").unwrap();
        combined.extend(std::fs::read("../../test-data/keys/ec-p256-key.pem").unwrap());
        std::fs::write(dir.path().join("a.pem"), combined).unwrap();

        let store = DirectoryStore::new("LocalMachine", dir.path());
        assert_eq!(find(&store, RSA_SHA1).len(), 1);
        let ec = find(&store, EC_SHA1);
        assert!(matches!(ec[0].key_source, KeySource::Embedded(_)));
        assert_eq!(ec[0].private_key().unwrap().algorithm_name(), "EC P-256");
    }

    #[test]
    fn duplicates_are_returned_in_file_name_order() {
        let dir = tempfile::tempdir().unwrap();
        copy_fixture(dir.path(), "rsa-2048-cert.pem", "b.pem");
        copy_fixture(dir.path(), "rsa-2048-cert.pem", "a.pem");
        copy_fixture(dir.path(), "rsa-2048-key.pem", "b.key");

        let found = find(&DirectoryStore::new("CurrentUser", dir.path()), RSA_SHA1);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].key_source, KeySource::Missing);
        assert_eq!(found[1].key_source, KeySource::File(dir.path().join("b.key")));
    }

    #[test]
    fn ignores_unrelated_and_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        std::fs::write(dir.path().join("broken.pem"), "-----BEGIN CERTIFICATE-----\n").unwrap();
        copy_fixture(dir.path(), "rsa-2048-key.pem", "orphan.key");

        let found = find(&DirectoryStore::new("CurrentUser", dir.path()), RSA_SHA1);
        assert!(found.is_empty());
    }

    #[test]
    fn missing_directory_is_an_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new("CurrentUser", dir.path().join("absent"));
        assert!(find(&store, RSA_SHA1).is_empty());
    }

    #[test]
    fn file_in_place_of_directory_cannot_be_opened() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("store");
        std::fs::write(&file, "x").unwrap();
        let store = DirectoryStore::new("LocalMachine", &file);
        let Err(err) = store.open() else {
            panic!("expected open to fail");
        };
        assert!(matches!(err, Error::Store { ref store, .. } if store == "LocalMachine"));
    }
}
