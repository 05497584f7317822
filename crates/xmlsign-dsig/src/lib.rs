#![forbid(unsafe_code)]

//! Enveloped XML Digital Signatures.
//!
//! [`compute_signature`] builds a `<Signature>` element for a document,
//! [`attach`] appends it as the last child of the root element and
//! [`verify`] checks a signed document against an expected certificate.
//! [`sign`] runs all three and refuses to return a signature that does
//! not verify.

pub mod attach;
pub mod context;
mod nodes;
mod reference;
pub mod sign;
pub mod template;
pub mod verify;

pub use attach::attach;
pub use context::DsigContext;
pub use sign::{compute_signature, sign, SignatureNode, SignatureResult};
pub use verify::{verify, VerifyResult};
