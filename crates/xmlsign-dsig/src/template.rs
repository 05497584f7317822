#![forbid(unsafe_code)]

//! Serialization of the `<Signature>` element.

use xmlsign_core::{algorithm, ns, Error};
use xmlsign_xml::XmlWriter;

/// Values of an enveloped signature over the whole document (`URI=""`).
///
/// Rendering with empty `digest_value`/`signature_value` yields the
/// template that is put in place before those values are computed.
#[derive(Debug, Clone)]
pub struct SignatureTemplate<'a> {
    pub c14n_method: &'a str,
    pub signature_method: &'a str,
    pub digest_method: &'a str,
    pub digest_value: String,
    pub signature_value: String,
    /// Base64 DER of the signing certificate, emitted as `KeyInfo`.
    pub certificate: Option<String>,
}

impl SignatureTemplate<'_> {
    pub fn render(&self) -> Result<String, Error> {
        use ns::node;

        let mut w = XmlWriter::new();
        w.start_element(node::SIGNATURE, &[("xmlns", ns::DSIG)])?;

        w.start_element(node::SIGNED_INFO, &[])?;
        w.empty_element(node::CANONICALIZATION_METHOD, &[(ns::attr::ALGORITHM, self.c14n_method)])?;
        w.empty_element(node::SIGNATURE_METHOD, &[(ns::attr::ALGORITHM, self.signature_method)])?;
        w.start_element(node::REFERENCE, &[(ns::attr::URI, "")])?;
        w.start_element(node::TRANSFORMS, &[])?;
        w.empty_element(node::TRANSFORM, &[(ns::attr::ALGORITHM, algorithm::ENVELOPED_SIGNATURE)])?;
        w.end_element(node::TRANSFORMS)?;
        w.empty_element(node::DIGEST_METHOD, &[(ns::attr::ALGORITHM, self.digest_method)])?;
        w.text_element(node::DIGEST_VALUE, &[], &self.digest_value)?;
        w.end_element(node::REFERENCE)?;
        w.end_element(node::SIGNED_INFO)?;

        w.text_element(node::SIGNATURE_VALUE, &[], &self.signature_value)?;

        if let Some(cert) = &self.certificate {
            w.start_element(node::KEY_INFO, &[])?;
            w.start_element(node::X509_DATA, &[])?;
            w.text_element(node::X509_CERTIFICATE, &[], cert)?;
            w.end_element(node::X509_DATA)?;
            w.end_element(node::KEY_INFO)?;
        }

        w.end_element(node::SIGNATURE)?;
        w.into_string()
    }
}
