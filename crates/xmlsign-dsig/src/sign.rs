#![forbid(unsafe_code)]

//! XML-DSig enveloped signature creation.
//!
//! Both the reference digest and `SignedInfo` are computed over the
//! document with the signature template already in place as the last child
//! of the root element, so the canonical forms match what a verifier sees.

use crate::attach::attach;
use crate::context::DsigContext;
use crate::nodes;
use crate::reference;
use crate::template::SignatureTemplate;
use crate::verify::{verify, VerifyResult};
use base64::Engine;
use log::debug;
use xmlsign_certstore::{Resolution, X509Certificate};
use xmlsign_core::{ns, Error};
use xmlsign_crypto::SigningKey;
use xmlsign_xml::{NodeSet, XmlDocument};

/// A serialized `<Signature>` element ready to be attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureNode {
    xml: String,
}

impl SignatureNode {
    pub fn as_str(&self) -> &str {
        &self.xml
    }

    pub fn into_string(self) -> String {
        self.xml
    }
}

/// Outcome of [`sign`].
#[derive(Debug)]
pub enum SignatureResult {
    /// The signed document text; its signature verified.
    Signed(String),
    /// No certificate matched any thumbprint.
    NoCertificateAvailable,
    /// A certificate matched but its private key could not be used.
    KeyAccessDenied { subject: String, reason: String },
    /// The freshly computed signature did not verify.
    VerificationFailed { reason: String },
}

/// Compute an enveloped signature of `document` with `key`.
///
/// The document itself is not modified; see [`attach`].
pub fn compute_signature(
    ctx: &DsigContext,
    document: &XmlDocument,
    key: &SigningKey,
    certificate: &X509Certificate,
) -> Result<SignatureNode, Error> {
    if !key.is_private() {
        return Err(Error::Key(format!("signing requires a private key, got {key:?}")));
    }
    let engine = base64::engine::general_purpose::STANDARD;

    let signature_method = key.signature_method(&ctx.digest_method)?;
    let signer = xmlsign_crypto::sign::from_uri(signature_method)?;
    debug!("Signing with {signature_method}, digest {}", ctx.digest_method);

    let mut template = SignatureTemplate {
        c14n_method: ctx.c14n_mode.uri(),
        signature_method,
        digest_method: &ctx.digest_method,
        digest_value: String::new(),
        signature_value: String::new(),
        certificate: ctx.include_key_info.then(|| engine.encode(certificate.der())),
    };

    let placed = place(document, &template)?;
    let digest = {
        let doc = placed.parse_doc()?;
        let signature = placed_signature(&doc)?;
        let signed_info = nodes::require_child_element(signature, ns::node::SIGNED_INFO)?;
        let reference = nodes::require_child_element(signed_info, ns::node::REFERENCE)?;
        reference::digest_reference(&placed, reference, signature)?
    };
    template.digest_value = engine.encode(digest);

    let placed = place(document, &template)?;
    let signed_info_c14n = {
        let doc = placed.parse_doc()?;
        let signature = placed_signature(&doc)?;
        let signed_info = nodes::require_child_element(signature, ns::node::SIGNED_INFO)?;
        let subset = NodeSet::tree_without_comments(signed_info);
        xmlsign_c14n::canonicalize_doc(&doc, ctx.c14n_mode, Some(&subset))?
    };

    let value = signer.sign(key, &signed_info_c14n)?;
    template.signature_value = engine.encode(value);

    Ok(SignatureNode {
        xml: template.render()?,
    })
}

/// Resolve, compute, attach and verify.
///
/// Missing certificates and inaccessible keys are reported as results, not
/// errors. Errors are reserved for documents that cannot be signed at all.
pub fn sign(
    ctx: &DsigContext,
    document: &XmlDocument,
    resolution: &Resolution,
) -> Result<SignatureResult, Error> {
    let signing = match resolution {
        Resolution::NotFound => return Ok(SignatureResult::NoCertificateAvailable),
        Resolution::KeyInaccessible { subject, reason } => {
            return Ok(SignatureResult::KeyAccessDenied {
                subject: subject.clone(),
                reason: reason.clone(),
            })
        }
        Resolution::Found(signing) => signing,
    };

    let node = compute_signature(ctx, document, &signing.key, &signing.certificate)?;
    let signed = attach(document, &node)?;

    Ok(match verify(ctx, &signed, &signing.certificate) {
        Ok(VerifyResult::Valid) => SignatureResult::Signed(signed),
        Ok(VerifyResult::Invalid { reason }) => SignatureResult::VerificationFailed { reason },
        Err(e) => SignatureResult::VerificationFailed {
            reason: e.to_string(),
        },
    })
}

/// The document with the rendered template as last child of the root.
fn place(document: &XmlDocument, template: &SignatureTemplate<'_>) -> Result<XmlDocument, Error> {
    XmlDocument::parse(document.append_to_root(&template.render()?)?)
}

fn placed_signature<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
) -> Result<roxmltree::Node<'a, 'input>, Error> {
    nodes::last_root_child(doc)
        .filter(|n| nodes::is_dsig(n, ns::node::SIGNATURE))
        .ok_or_else(|| Error::XmlStructure("signature template was not placed last".into()))
}
