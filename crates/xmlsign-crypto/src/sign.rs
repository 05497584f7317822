#![forbid(unsafe_code)]

//! Signature algorithm implementations (RSA PKCS#1 v1.5, ECDSA).

use std::fmt;
use xmlsign_core::{algorithm, Error};
use signature::SignatureEncoding;

/// Key material for signature operations.
pub enum SigningKey {
    Rsa(rsa::RsaPrivateKey),
    RsaPublic(rsa::RsaPublicKey),
    EcP256(p256::ecdsa::SigningKey),
    EcP256Public(p256::ecdsa::VerifyingKey),
    EcP384(p384::ecdsa::SigningKey),
    EcP384Public(p384::ecdsa::VerifyingKey),
}

impl SigningKey {
    /// Short human readable algorithm name.
    pub fn algorithm_name(&self) -> &'static str {
        match self {
            Self::Rsa(_) | Self::RsaPublic(_) => "RSA",
            Self::EcP256(_) | Self::EcP256Public(_) => "EC P-256",
            Self::EcP384(_) | Self::EcP384Public(_) => "EC P-384",
        }
    }

    pub fn is_private(&self) -> bool {
        matches!(self, Self::Rsa(_) | Self::EcP256(_) | Self::EcP384(_))
    }

    /// The public half of this key.
    pub fn to_public(&self) -> SigningKey {
        match self {
            Self::Rsa(sk) => Self::RsaPublic(sk.to_public_key()),
            Self::RsaPublic(pk) => Self::RsaPublic(pk.clone()),
            Self::EcP256(sk) => Self::EcP256Public(*sk.verifying_key()),
            Self::EcP256Public(vk) => Self::EcP256Public(*vk),
            Self::EcP384(sk) => Self::EcP384Public(*sk.verifying_key()),
            Self::EcP384Public(vk) => Self::EcP384Public(*vk),
        }
    }

    /// Whether both keys share the same public key.
    pub fn same_public_key(&self, other: &SigningKey) -> bool {
        match (self.to_public(), other.to_public()) {
            (Self::RsaPublic(a), Self::RsaPublic(b)) => a == b,
            (Self::EcP256Public(a), Self::EcP256Public(b)) => a == b,
            (Self::EcP384Public(a), Self::EcP384Public(b)) => a == b,
            _ => false,
        }
    }

    /// The `SignatureMethod` URI to use with this key and a digest URI.
    ///
    /// ECDSA keys are bound to the hash of their curve size.
    pub fn signature_method(&self, digest_uri: &str) -> Result<&'static str, Error> {
        match self {
            Self::Rsa(_) | Self::RsaPublic(_) => match digest_uri {
                algorithm::SHA1 => Ok(algorithm::RSA_SHA1),
                algorithm::SHA224 => Ok(algorithm::RSA_SHA224),
                algorithm::SHA256 => Ok(algorithm::RSA_SHA256),
                algorithm::SHA384 => Ok(algorithm::RSA_SHA384),
                algorithm::SHA512 => Ok(algorithm::RSA_SHA512),
                _ => Err(Error::UnsupportedAlgorithm(format!(
                    "RSA signature with digest {digest_uri}"
                ))),
            },
            Self::EcP256(_) | Self::EcP256Public(_) => Ok(algorithm::ECDSA_SHA256),
            Self::EcP384(_) | Self::EcP384Public(_) => Ok(algorithm::ECDSA_SHA384),
        }
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_private() { "private" } else { "public" };
        write!(f, "SigningKey({} {kind})", self.algorithm_name())
    }
}

/// Trait for signature algorithms.
pub trait SignatureAlgorithm: Send {
    fn uri(&self) -> &'static str;
    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error>;
    fn verify(&self, key: &SigningKey, data: &[u8], signature: &[u8]) -> Result<bool, Error>;
}

/// Create a signature algorithm from its URI.
pub fn from_uri(uri: &str) -> Result<Box<dyn SignatureAlgorithm>, Error> {
    match uri {
        algorithm::RSA_SHA1 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA1, hash: HashType::Sha1 })),
        algorithm::RSA_SHA224 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA224, hash: HashType::Sha224 })),
        algorithm::RSA_SHA256 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA256, hash: HashType::Sha256 })),
        algorithm::RSA_SHA384 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA384, hash: HashType::Sha384 })),
        algorithm::RSA_SHA512 => Ok(Box::new(RsaPkcs1v15 { uri: algorithm::RSA_SHA512, hash: HashType::Sha512 })),

        algorithm::ECDSA_SHA256 => Ok(Box::new(EcdsaP256)),
        algorithm::ECDSA_SHA384 => Ok(Box::new(EcdsaP384)),

        _ => Err(Error::UnsupportedAlgorithm(format!("signature algorithm: {uri}"))),
    }
}

#[derive(Debug, Clone, Copy)]
enum HashType { Sha1, Sha224, Sha256, Sha384, Sha512 }

// ── RSA PKCS#1 v1.5 ─────────────────────────────────────────────────

struct RsaPkcs1v15 { uri: &'static str, hash: HashType }

impl RsaPkcs1v15 {
    fn sign_with_key(&self, private_key: &rsa::RsaPrivateKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        use signature::Signer;
        macro_rules! do_sign {
            ($hasher:ty) => {{
                let sk = rsa::pkcs1v15::SigningKey::<$hasher>::new(private_key.clone());
                let sig = sk
                    .try_sign(data)
                    .map_err(|e| Error::Crypto(format!("RSA signing failed: {e}")))?;
                Ok(sig.to_vec())
            }};
        }
        match self.hash {
            HashType::Sha1 => do_sign!(sha1::Sha1),
            HashType::Sha224 => do_sign!(sha2::Sha224),
            HashType::Sha256 => do_sign!(sha2::Sha256),
            HashType::Sha384 => do_sign!(sha2::Sha384),
            HashType::Sha512 => do_sign!(sha2::Sha512),
        }
    }

    fn verify_with_key(&self, public_key: &rsa::RsaPublicKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        use signature::Verifier;
        let sig = rsa::pkcs1v15::Signature::try_from(sig_bytes)
            .map_err(|e| Error::Crypto(format!("invalid RSA signature: {e}")))?;
        macro_rules! do_verify {
            ($hasher:ty) => {{
                let vk = rsa::pkcs1v15::VerifyingKey::<$hasher>::new(public_key.clone());
                Ok(vk.verify(data, &sig).is_ok())
            }};
        }
        match self.hash {
            HashType::Sha1 => do_verify!(sha1::Sha1),
            HashType::Sha224 => do_verify!(sha2::Sha224),
            HashType::Sha256 => do_verify!(sha2::Sha256),
            HashType::Sha384 => do_verify!(sha2::Sha384),
            HashType::Sha512 => do_verify!(sha2::Sha512),
        }
    }
}

impl SignatureAlgorithm for RsaPkcs1v15 {
    fn uri(&self) -> &'static str { self.uri }

    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        match key {
            SigningKey::Rsa(pk) => self.sign_with_key(pk, data),
            _ => Err(Error::Key(format!("RSA private key required, got {key:?}"))),
        }
    }

    fn verify(&self, key: &SigningKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        let pubk = match key {
            SigningKey::Rsa(pk) => pk.to_public_key(),
            SigningKey::RsaPublic(pk) => pk.clone(),
            _ => return Err(Error::Key(format!("RSA key required, got {key:?}"))),
        };
        self.verify_with_key(&pubk, data, sig_bytes)
    }
}

// ── ECDSA P-256 ──────────────────────────────────────────────────────

struct EcdsaP256;

/// Convert XML-DSig ECDSA r||s to a typed Signature for P-256.
pub fn xmldsig_to_p256(rs: &[u8]) -> Result<p256::ecdsa::Signature, Error> {
    p256::ecdsa::Signature::from_slice(rs)
        .map_err(|e| Error::Crypto(format!("invalid P-256 signature ({} bytes): {e}", rs.len())))
}

impl SignatureAlgorithm for EcdsaP256 {
    fn uri(&self) -> &'static str { algorithm::ECDSA_SHA256 }

    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        use signature::Signer;
        let SigningKey::EcP256(sk) = key else {
            return Err(Error::Key(format!("P-256 signing key required, got {key:?}")));
        };
        let sig: p256::ecdsa::Signature = sk
            .try_sign(data)
            .map_err(|e| Error::Crypto(format!("P-256 signing failed: {e}")))?;
        // Signature::to_bytes is the fixed-size r||s form XML-DSig uses.
        Ok(sig.to_bytes().to_vec())
    }

    fn verify(&self, key: &SigningKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        use signature::Verifier;
        let vk = match key {
            SigningKey::EcP256(sk) => *sk.verifying_key(),
            SigningKey::EcP256Public(vk) => *vk,
            _ => return Err(Error::Key(format!("P-256 key required, got {key:?}"))),
        };
        let sig = xmldsig_to_p256(sig_bytes)?;
        Ok(vk.verify(data, &sig).is_ok())
    }
}

// ── ECDSA P-384 ──────────────────────────────────────────────────────

struct EcdsaP384;

/// Convert XML-DSig ECDSA r||s to a typed Signature for P-384.
pub fn xmldsig_to_p384(rs: &[u8]) -> Result<p384::ecdsa::Signature, Error> {
    p384::ecdsa::Signature::from_slice(rs)
        .map_err(|e| Error::Crypto(format!("invalid P-384 signature ({} bytes): {e}", rs.len())))
}

impl SignatureAlgorithm for EcdsaP384 {
    fn uri(&self) -> &'static str { algorithm::ECDSA_SHA384 }

    fn sign(&self, key: &SigningKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        use signature::Signer;
        let SigningKey::EcP384(sk) = key else {
            return Err(Error::Key(format!("P-384 signing key required, got {key:?}")));
        };
        let sig: p384::ecdsa::Signature = sk
            .try_sign(data)
            .map_err(|e| Error::Crypto(format!("P-384 signing failed: {e}")))?;
        Ok(sig.to_bytes().to_vec())
    }

    fn verify(&self, key: &SigningKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        use signature::Verifier;
        let vk = match key {
            SigningKey::EcP384(sk) => *sk.verifying_key(),
            SigningKey::EcP384Public(vk) => *vk,
            _ => return Err(Error::Key(format!("P-384 key required, got {key:?}"))),
        };
        let sig = xmldsig_to_p384(sig_bytes)?;
        Ok(vk.verify(data, &sig).is_ok())
    }
}
