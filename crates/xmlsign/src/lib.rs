#![forbid(unsafe_code)]

pub mod cli;
pub mod signer;

pub use xmlsign_core as core;
pub use xmlsign_xml as xml;
pub use xmlsign_c14n as c14n;
pub use xmlsign_crypto as crypto;
pub use xmlsign_transforms as transforms;
pub use xmlsign_certstore as certstore;
pub use xmlsign_dsig as dsig;
