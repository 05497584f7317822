#![forbid(unsafe_code)]

//! Key loading from PEM and DER (PKCS#8, PKCS#1, SEC1, SubjectPublicKeyInfo).

use log::debug;
use xmlsign_core::Error;
use xmlsign_crypto::SigningKey;

const BEGIN: &str = "-----BEGIN ";

/// Whether `data` contains at least one PEM encapsulation boundary.
pub fn looks_like_pem(data: &[u8]) -> bool {
    data.windows(BEGIN.len()).any(|w| w == BEGIN.as_bytes())
}

/// Decode every PEM block in `data` as `(label, der)`, in file order.
///
/// Text around the blocks (comments, `openssl x509 -text` dumps) is
/// ignored, as are blocks that fail to decode.
pub fn pem_blocks(data: &[u8]) -> Vec<(String, Vec<u8>)> {
    let Ok(text) = std::str::from_utf8(data) else {
        return Vec::new();
    };

    let mut blocks = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(BEGIN) {
        let block = &rest[start..];
        let Some(label_end) = block[BEGIN.len()..].find("-----") else {
            break;
        };
        let label = &block[BEGIN.len()..BEGIN.len() + label_end];
        let end_marker = format!("-----END {label}-----");
        let Some(end) = block.find(&end_marker) else {
            break;
        };
        let encoded = &block[..end + end_marker.len()];
        match pem_rfc7468::decode_vec(encoded.as_bytes()) {
            Ok((label, der)) => blocks.push((label.to_owned(), der)),
            Err(e) => debug!("skipping undecodable PEM block {label:?}: {e}"),
        }
        rest = &block[end + end_marker.len()..];
    }
    blocks
}

/// Load a private key from PEM or DER data.
///
/// In PEM input the first private key block wins; certificate blocks next
/// to it are skipped. DER input is tried as PKCS#8, then PKCS#1, then SEC1.
pub fn load_private_key(data: &[u8]) -> Result<SigningKey, Error> {
    if looks_like_pem(data) {
        for (label, der) in pem_blocks(data) {
            match label.as_str() {
                "PRIVATE KEY" => return load_pkcs8_der(&der),
                "RSA PRIVATE KEY" => return load_rsa_pkcs1_der(&der),
                "EC PRIVATE KEY" => return load_sec1_der(&der),
                "ENCRYPTED PRIVATE KEY" => {
                    return Err(Error::Key(
                        "encrypted private keys are not supported".into(),
                    ))
                }
                _ => continue,
            }
        }
        return Err(Error::Key("no private key block in PEM data".into()));
    }

    load_pkcs8_der(data)
        .or_else(|_| load_rsa_pkcs1_der(data))
        .or_else(|_| load_sec1_der(data))
        .map_err(|_| Error::Key("unable to parse DER private key (tried PKCS#8, PKCS#1, SEC1)".into()))
}

/// Whether `data` carries a private key block.
pub fn has_private_key_block(data: &[u8]) -> bool {
    looks_like_pem(data)
        && pem_blocks(data)
            .iter()
            .any(|(label, _)| label.ends_with("PRIVATE KEY"))
}

/// Load a private key from PKCS#8 DER bytes.
///
/// Tries RSA, then EC P-256, P-384 in order.
fn load_pkcs8_der(der: &[u8]) -> Result<SigningKey, Error> {
    use pkcs8::DecodePrivateKey;

    if let Ok(pk) = rsa::RsaPrivateKey::from_pkcs8_der(der) {
        return Ok(SigningKey::Rsa(pk));
    }
    if let Ok(sk) = p256::ecdsa::SigningKey::from_pkcs8_der(der) {
        return Ok(SigningKey::EcP256(sk));
    }
    if let Ok(sk) = p384::ecdsa::SigningKey::from_pkcs8_der(der) {
        return Ok(SigningKey::EcP384(sk));
    }

    Err(Error::Key(
        "unable to parse PKCS#8 private key (tried RSA, P-256, P-384)".into(),
    ))
}

fn load_rsa_pkcs1_der(der: &[u8]) -> Result<SigningKey, Error> {
    use pkcs1::DecodeRsaPrivateKey;
    let pk = rsa::RsaPrivateKey::from_pkcs1_der(der)
        .map_err(|e| Error::Key(format!("failed to parse RSA private key: {e}")))?;
    Ok(SigningKey::Rsa(pk))
}

/// Load an EC private key from SEC1 `ECPrivateKey` DER.
fn load_sec1_der(der: &[u8]) -> Result<SigningKey, Error> {
    if let Ok(secret) = p256::SecretKey::from_sec1_der(der) {
        return Ok(SigningKey::EcP256(secret.into()));
    }
    if let Ok(secret) = p384::SecretKey::from_sec1_der(der) {
        return Ok(SigningKey::EcP384(secret.into()));
    }
    Err(Error::Key(
        "unable to parse SEC1 EC private key (tried P-256, P-384)".into(),
    ))
}

/// Load a public key from SubjectPublicKeyInfo DER bytes.
pub fn load_spki_der(spki_der: &[u8]) -> Result<SigningKey, Error> {
    use spki::DecodePublicKey;

    if let Ok(pk) = rsa::RsaPublicKey::from_public_key_der(spki_der) {
        return Ok(SigningKey::RsaPublic(pk));
    }
    if let Ok(vk) = p256::ecdsa::VerifyingKey::from_public_key_der(spki_der) {
        return Ok(SigningKey::EcP256Public(vk));
    }
    if let Ok(vk) = p384::ecdsa::VerifyingKey::from_public_key_der(spki_der) {
        return Ok(SigningKey::EcP384Public(vk));
    }

    Err(Error::Key(
        "unsupported public key algorithm in SPKI DER".into(),
    ))
}
