#![forbid(unsafe_code)]

//! Certificate resolution for xmlsign.
//!
//! Certificates live in named stores that are searched in priority order
//! for a certificate whose DER hash matches one of the requested
//! thumbprints. The shipped store reads a directory of certificate and
//! key files.

pub mod certificate;
pub mod directory;
pub mod loader;
pub mod resolver;
pub mod store;
pub mod thumbprint;

pub use certificate::X509Certificate;
pub use directory::DirectoryStore;
pub use resolver::{Resolution, Resolver, SigningCertificate};
pub use store::{CertificateStore, KeySource, StoreHandle, StoredCertificate};
pub use thumbprint::Thumbprint;
