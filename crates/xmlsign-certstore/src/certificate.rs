#![forbid(unsafe_code)]

//! X.509 certificates as found in certificate stores and `KeyInfo`.

use crate::loader;
use der::{Decode, Encode};
use sha1::Digest;
use std::fmt;
use xmlsign_core::Error;
use xmlsign_crypto::SigningKey;

/// A parsed X.509 certificate together with its DER encoding.
#[derive(Clone)]
pub struct X509Certificate {
    der: Vec<u8>,
    cert: x509_cert::Certificate,
}

impl X509Certificate {
    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        let cert = x509_cert::Certificate::from_der(der)
            .map_err(|e| Error::Certificate(format!("failed to parse X.509 certificate: {e}")))?;
        Ok(Self {
            der: der.to_vec(),
            cert,
        })
    }

    /// Parse the first `CERTIFICATE` block of PEM data.
    pub fn from_pem(data: &[u8]) -> Result<Self, Error> {
        let der = loader::pem_blocks(data)
            .into_iter()
            .find(|(label, _)| label == "CERTIFICATE")
            .map(|(_, der)| der)
            .ok_or_else(|| Error::Certificate("no CERTIFICATE block in PEM data".into()))?;
        Self::from_der(&der)
    }

    /// Parse PEM or DER, whichever `data` looks like.
    pub fn from_pem_or_der(data: &[u8]) -> Result<Self, Error> {
        if loader::looks_like_pem(data) {
            Self::from_pem(data)
        } else {
            Self::from_der(data)
        }
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// Subject distinguished name in RFC 4514 form, e.g.
    /// `CN=Signer,O=Example,C=DE`.
    pub fn subject(&self) -> String {
        self.cert.tbs_certificate.subject.to_string()
    }

    pub fn issuer(&self) -> String {
        self.cert.tbs_certificate.issuer.to_string()
    }

    /// Upper-case hex SHA-1 of the DER encoding.
    pub fn thumbprint_sha1(&self) -> String {
        hex::encode_upper(sha1::Sha1::digest(&self.der))
    }

    /// Upper-case hex SHA-256 of the DER encoding.
    pub fn thumbprint_sha256(&self) -> String {
        hex::encode_upper(sha2::Sha256::digest(&self.der))
    }

    /// The subject public key, usable for signature verification.
    pub fn public_key(&self) -> Result<SigningKey, Error> {
        let spki_der = self
            .cert
            .tbs_certificate
            .subject_public_key_info
            .to_der()
            .map_err(|e| Error::Certificate(format!("failed to encode SPKI: {e}")))?;
        loader::load_spki_der(&spki_der)
    }

    pub fn not_before(&self) -> der::DateTime {
        self.cert.tbs_certificate.validity.not_before.to_date_time()
    }

    pub fn not_after(&self) -> der::DateTime {
        self.cert.tbs_certificate.validity.not_after.to_date_time()
    }

    /// Check that the current system time is inside the validity period.
    pub fn check_validity(&self) -> Result<(), Error> {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| Error::Certificate(format!("system time error: {e}")))?;
        let now = der::DateTime::from_unix_duration(now)
            .map_err(|e| Error::Certificate(format!("time conversion error: {e}")))?;
        self.check_validity_at(&now)
    }

    /// Check that `time` is inside the validity period.
    pub fn check_validity_at(&self, time: &der::DateTime) -> Result<(), Error> {
        let not_before = self.not_before();
        let not_after = self.not_after();
        if *time < not_before {
            return Err(Error::Certificate(format!(
                "certificate {} is not yet valid (notBefore: {not_before})",
                self.subject()
            )));
        }
        if *time > not_after {
            return Err(Error::Certificate(format!(
                "certificate {} has expired (notAfter: {not_after})",
                self.subject()
            )));
        }
        Ok(())
    }
}

impl PartialEq for X509Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for X509Certificate {}

impl fmt::Debug for X509Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("X509Certificate")
            .field("subject", &self.subject())
            .field("sha1", &self.thumbprint_sha1())
            .finish()
    }
}
