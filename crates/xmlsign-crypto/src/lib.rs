#![forbid(unsafe_code)]

//! Cryptographic algorithms for xmlsign, selected by their XML-DSig URIs.
//!
//! The primitives come from the RustCrypto crates; this crate only maps
//! algorithm URIs to them and converts signature encodings.

pub mod digest;
pub mod sign;

pub use digest::DigestAlgorithm;
pub use sign::{SignatureAlgorithm, SigningKey};
