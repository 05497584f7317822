#![forbid(unsafe_code)]

//! Thumbprint resolution across prioritized certificate stores.

use crate::certificate::X509Certificate;
use crate::directory::DirectoryStore;
use crate::store::{CertificateStore, StoredCertificate};
use crate::thumbprint::Thumbprint;
use log::{debug, warn};
use std::path::PathBuf;
use xmlsign_crypto::SigningKey;

pub const CURRENT_USER: &str = "CurrentUser";
pub const LOCAL_MACHINE: &str = "LocalMachine";

/// A certificate together with its usable private key.
#[derive(Debug)]
pub struct SigningCertificate {
    pub certificate: X509Certificate,
    pub key: SigningKey,
    /// Name of the store the certificate was found in.
    pub store: String,
}

/// Outcome of a thumbprint search.
#[derive(Debug)]
pub enum Resolution {
    Found(SigningCertificate),
    /// A certificate matched but its private key could not be used.
    KeyInaccessible { subject: String, reason: String },
    NotFound,
}

/// Searches stores in priority order for the first matching certificate.
pub struct Resolver {
    stores: Vec<Box<dyn CertificateStore>>,
}

impl Resolver {
    /// Stores are searched in the given order.
    pub fn new(stores: Vec<Box<dyn CertificateStore>>) -> Self {
        Self { stores }
    }

    /// The CurrentUser store followed by the LocalMachine store.
    pub fn system(user_store: impl Into<PathBuf>, machine_store: impl Into<PathBuf>) -> Self {
        let user: Box<dyn CertificateStore> = Box::new(DirectoryStore::new(CURRENT_USER, user_store));
        let machine: Box<dyn CertificateStore> =
            Box::new(DirectoryStore::new(LOCAL_MACHINE, machine_store));
        Self::new(vec![user, machine])
    }

    pub fn store_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.stores.iter().map(|s| s.name())
    }

    /// Find a signing certificate for the first thumbprint that matches.
    ///
    /// Within each store the thumbprints are tried in order; a store with a
    /// match ends the search, so lower-priority stores are not opened. A
    /// match whose key cannot be used ends the search too. Certificates
    /// outside their validity period never match.
    pub fn resolve(&self, thumbprints: &[Thumbprint]) -> Resolution {
        if thumbprints.is_empty() {
            return Resolution::NotFound;
        }

        for store in &self.stores {
            let handle = match store.open() {
                Ok(handle) => handle,
                Err(e) => {
                    warn!("Skipping certificate store: {e}");
                    continue;
                }
            };

            for thumbprint in thumbprints {
                debug!(
                    "Trying to use sha1 {thumbprint} with X509Store, on {}.",
                    store.name()
                );
                let matches = match handle.find_by_thumbprint(thumbprint) {
                    Ok(matches) => matches,
                    Err(e) => {
                        warn!("Search for {thumbprint} in {} failed: {e}", store.name());
                        continue;
                    }
                };
                let Some(entry) = matches.into_iter().find(is_valid) else {
                    continue;
                };

                return match entry.private_key() {
                    Ok(key) => {
                        debug!("Key found.");
                        Resolution::Found(SigningCertificate {
                            certificate: entry.certificate,
                            key,
                            store: store.name().to_owned(),
                        })
                    }
                    Err(e) => Resolution::KeyInaccessible {
                        subject: entry.certificate.subject(),
                        reason: e.to_string(),
                    },
                };
            }
        }

        Resolution::NotFound
    }
}

fn is_valid(entry: &StoredCertificate) -> bool {
    match entry.certificate.check_validity() {
        Ok(()) => true,
        Err(e) => {
            debug!("Skipping certificate {}: {e}", entry.certificate.subject());
            false
        }
    }
}
