#![forbid(unsafe_code)]

//! Appending a signature to the signed document.

use crate::sign::SignatureNode;
use xmlsign_core::Error;
use xmlsign_xml::XmlDocument;

/// Return the document text with `signature` as the last child of the root
/// element.
///
/// Only the bytes at the insertion point change; a self-closing root is
/// expanded into a start and end tag around the signature.
pub fn attach(document: &XmlDocument, signature: &SignatureNode) -> Result<String, Error> {
    document.append_to_root(signature.as_str())
}
