#![forbid(unsafe_code)]

//! XML-DSig enveloped signature verification against an expected
//! certificate.
//!
//! Processing order:
//! 1. The `<Signature>` must be the last element child of the root
//! 2. Read `<SignedInfo>`: CanonicalizationMethod, SignatureMethod
//! 3. For each `<Reference>`: dereference, run transforms, digest, compare
//! 4. Check `<KeyInfo>` names the expected certificate
//! 5. Canonicalize `<SignedInfo>` and verify `<SignatureValue>`

use crate::context::DsigContext;
use crate::nodes;
use crate::reference;
use log::debug;
use xmlsign_c14n::C14nMode;
use xmlsign_certstore::X509Certificate;
use xmlsign_core::{ns, Error};
use xmlsign_xml::{NodeSet, XmlDocument};

/// Result of signature verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    Valid,
    Invalid { reason: String },
}

impl VerifyResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyResult::Valid)
    }

    fn invalid(reason: impl Into<String>) -> Self {
        VerifyResult::Invalid {
            reason: reason.into(),
        }
    }
}

/// Verify the enveloped signature of `signed_xml` with `certificate`.
///
/// Structural problems of the signature (wrong position, digest mismatch,
/// foreign certificate, bad signature value) are `Invalid`; malformed XML,
/// missing elements and unsupported algorithms are errors.
pub fn verify(
    ctx: &DsigContext,
    signed_xml: &str,
    certificate: &X509Certificate,
) -> Result<VerifyResult, Error> {
    let document = XmlDocument::parse(signed_xml.to_owned())?;
    let doc = document.parse_doc()?;

    let Some(signature) = nodes::last_root_child(&doc).filter(|n| nodes::is_dsig(n, ns::node::SIGNATURE))
    else {
        return Ok(VerifyResult::invalid(
            "Signature is not the last child of the document element",
        ));
    };

    let signed_info = nodes::require_child_element(signature, ns::node::SIGNED_INFO)?;
    let c14n_uri = nodes::algorithm(nodes::require_child_element(
        signed_info,
        ns::node::CANONICALIZATION_METHOD,
    )?)?;
    let c14n_mode = C14nMode::from_uri(c14n_uri)
        .ok_or_else(|| Error::UnsupportedAlgorithm(format!("C14N: {c14n_uri}")))?;
    let signature_method = nodes::algorithm(nodes::require_child_element(
        signed_info,
        ns::node::SIGNATURE_METHOD,
    )?)?;

    let mut references = 0;
    for reference in nodes::find_child_elements(signed_info, ns::node::REFERENCE) {
        references += 1;
        let uri = reference.attribute(ns::attr::URI).unwrap_or("");
        let expected = nodes::base64_content(nodes::require_child_element(
            reference,
            ns::node::DIGEST_VALUE,
        )?)?;
        let computed = reference::digest_reference(&document, reference, signature)?;
        if computed != expected {
            return Ok(VerifyResult::invalid(format!(
                "Reference URI={uri:?}: digest mismatch"
            )));
        }
        debug!("Reference URI={uri:?} digest matches");
    }
    if references == 0 {
        return Ok(VerifyResult::invalid("SignedInfo has no Reference"));
    }

    if let Some(key_info) = nodes::find_child_element(signature, ns::node::KEY_INFO) {
        if let Some(result) = check_key_info(key_info, certificate)? {
            return Ok(result);
        }
    }

    if ctx.check_validity {
        if let Err(e) = certificate.check_validity() {
            return Ok(VerifyResult::invalid(e.to_string()));
        }
    }

    let subset = NodeSet::tree_without_comments(signed_info);
    let signed_info_c14n = xmlsign_c14n::canonicalize_doc(&doc, c14n_mode, Some(&subset))?;
    let signature_value = nodes::base64_content(nodes::require_child_element(
        signature,
        ns::node::SIGNATURE_VALUE,
    )?)?;

    let public_key = certificate.public_key()?;
    let algorithm = xmlsign_crypto::sign::from_uri(signature_method)?;
    if algorithm.verify(&public_key, &signed_info_c14n, &signature_value)? {
        Ok(VerifyResult::Valid)
    } else {
        Ok(VerifyResult::invalid("signature value verification failed"))
    }
}

/// `Some(Invalid)` when `KeyInfo` carries certificates and none of them is
/// the expected one.
fn check_key_info(
    key_info: roxmltree::Node<'_, '_>,
    certificate: &X509Certificate,
) -> Result<Option<VerifyResult>, Error> {
    let mut seen = 0;
    for x509_data in nodes::find_child_elements(key_info, ns::node::X509_DATA) {
        for cert in nodes::find_child_elements(x509_data, ns::node::X509_CERTIFICATE) {
            seen += 1;
            if nodes::base64_content(cert)? == certificate.der() {
                return Ok(None);
            }
        }
    }
    if seen == 0 {
        return Ok(None);
    }
    Ok(Some(VerifyResult::invalid(format!(
        "KeyInfo certificate is not {}",
        certificate.subject()
    ))))
}
