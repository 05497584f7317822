#![forbid(unsafe_code)]

//! DSig context: options for signature creation and verification.

use xmlsign_c14n::C14nMode;
use xmlsign_core::algorithm;

/// Context for XML-DSig operations.
#[derive(Debug, Clone)]
pub struct DsigContext {
    /// DigestMethod URI of the reference.
    pub digest_method: String,
    /// CanonicalizationMethod applied to SignedInfo.
    pub c14n_mode: C14nMode,
    /// Emit `KeyInfo/X509Data/X509Certificate` with the signing certificate.
    pub include_key_info: bool,
    /// Reject certificates outside their validity period when verifying.
    pub check_validity: bool,
}

impl DsigContext {
    pub fn new() -> Self {
        Self {
            digest_method: algorithm::SHA256.to_owned(),
            c14n_mode: C14nMode::Inclusive,
            include_key_info: true,
            check_validity: false,
        }
    }

    pub fn with_digest_method(mut self, uri: &str) -> Self {
        self.digest_method = uri.to_owned();
        self
    }

    pub fn with_c14n_mode(mut self, mode: C14nMode) -> Self {
        self.c14n_mode = mode;
        self
    }

    pub fn with_check_validity(mut self, check: bool) -> Self {
        self.check_validity = check;
        self
    }
}

impl Default for DsigContext {
    fn default() -> Self {
        Self::new()
    }
}
