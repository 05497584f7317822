#![forbid(unsafe_code)]

//! Certificate store abstraction.
//!
//! A store is a named, read-only repository of certificates with their
//! private keys. Opening a store yields a handle that is released when it
//! is dropped, so every exit path of a search closes the store.

use crate::certificate::X509Certificate;
use crate::loader;
use crate::thumbprint::Thumbprint;
use std::path::PathBuf;
use xmlsign_core::Error;
use xmlsign_crypto::SigningKey;

/// A named certificate repository.
pub trait CertificateStore {
    /// Store location name used in diagnostics ("CurrentUser", "LocalMachine").
    fn name(&self) -> &str;

    /// Open the store read-only.
    fn open(&self) -> Result<Box<dyn StoreHandle + '_>, Error>;
}

/// An open store. Dropping the handle releases the store.
pub trait StoreHandle {
    /// Every certificate in the store whose hash matches `thumbprint`, in
    /// the store's enumeration order.
    fn find_by_thumbprint(&self, thumbprint: &Thumbprint) -> Result<Vec<StoredCertificate>, Error>;
}

/// Where the private key of a stored certificate can be read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// PEM data holding a private key block alongside the certificate.
    Embedded(Vec<u8>),
    /// A separate key file.
    File(PathBuf),
    /// The store has no private key for the certificate.
    Missing,
}

/// A certificate entry as returned by a store lookup.
#[derive(Debug, Clone)]
pub struct StoredCertificate {
    pub certificate: X509Certificate,
    pub key_source: KeySource,
}

impl StoredCertificate {
    pub fn new(certificate: X509Certificate, key_source: KeySource) -> Self {
        Self {
            certificate,
            key_source,
        }
    }

    /// Read the private key and check that it belongs to the certificate.
    pub fn private_key(&self) -> Result<SigningKey, Error> {
        let key = match &self.key_source {
            KeySource::Embedded(data) => loader::load_private_key(data)?,
            KeySource::File(path) => {
                let data = std::fs::read(path).map_err(|e| {
                    Error::Key(format!("cannot read private key {}: {e}", path.display()))
                })?;
                loader::load_private_key(&data)?
            }
            KeySource::Missing => {
                return Err(Error::Key(
                    "no private key is associated with the certificate".into(),
                ))
            }
        };

        let public = self.certificate.public_key()?;
        if !key.same_public_key(&public) {
            return Err(Error::Key(
                "private key does not belong to the certificate".into(),
            ));
        }
        Ok(key)
    }
}
