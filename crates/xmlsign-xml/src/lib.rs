#![forbid(unsafe_code)]

//! XML document helpers for xmlsign.
//!
//! Parsing is done with `roxmltree`, which keeps byte ranges into the
//! source text. Those ranges let the signer splice a signature into the
//! original bytes without re-serializing the document. Fresh XML (the
//! `<Signature>` element) is produced with a `quick-xml` writer.

pub mod document;
pub mod encoding;
pub mod nodeset;
pub mod writer;

pub use document::{InsertionPoint, XmlDocument};
pub use encoding::TextEncoding;
pub use nodeset::NodeSet;
pub use writer::XmlWriter;

use xmlsign_core::Error;

/// Return roxmltree parsing options that allow DTD.
///
/// roxmltree never loads external entities, so internal subsets are
/// harmless and documents carrying a DOCTYPE can still be signed.
pub fn parsing_options() -> roxmltree::ParsingOptions {
    roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    }
}

/// Parse `text` with [`parsing_options`].
pub fn parse(text: &str) -> Result<roxmltree::Document<'_>, Error> {
    roxmltree::Document::parse_with_options(text, parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))
}

/// The qualified name (`prefix:local` or `local`) of an element as written
/// in the source document.
pub fn element_qname(node: &roxmltree::Node<'_, '_>) -> String {
    let local = node.tag_name().name();
    let text = node.document().input_text();
    let raw = text.get(node.range().start + 1..).map(|rest| {
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
            .unwrap_or(rest.len());
        &rest[..end]
    });
    match raw {
        Some(raw) if is_qname_of(raw, local) => raw.to_owned(),
        _ => match node.tag_name().namespace() {
            Some(uri) => qualify(node, uri, local, true),
            None => local.to_owned(),
        },
    }
}

/// The qualified name of an attribute as written in the source document.
pub fn attribute_qname(node: &roxmltree::Node<'_, '_>, attr: &roxmltree::Attribute<'_, '_>) -> String {
    let local = attr.name();
    let text = node.document().input_text();
    match text.get(attr.range_qname()) {
        Some(raw) if is_qname_of(raw, local) => raw.to_owned(),
        _ => match attr.namespace() {
            Some(xmlsign_core::ns::XML) => format!("xml:{local}"),
            Some(uri) => qualify(node, uri, local, false),
            None => local.to_owned(),
        },
    }
}

fn is_qname_of(raw: &str, local: &str) -> bool {
    match raw.rsplit_once(':') {
        Some((prefix, name)) => !prefix.is_empty() && name == local,
        None => raw == local,
    }
}

/// Rebuild a qualified name from the in-scope bindings when the source
/// text is not available (e.g. nodes produced by entity expansion).
fn qualify(node: &roxmltree::Node<'_, '_>, uri: &str, local: &str, allow_default: bool) -> String {
    let mut prefixed = None;
    for ns in node.namespaces() {
        if ns.uri() != uri {
            continue;
        }
        match ns.name() {
            None if allow_default => return local.to_owned(),
            Some(prefix) if prefixed.is_none() => prefixed = Some(prefix),
            _ => {}
        }
    }
    match prefixed {
        Some(prefix) => format!("{prefix}:{local}"),
        None => local.to_owned(),
    }
}
