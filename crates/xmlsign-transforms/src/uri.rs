#![forbid(unsafe_code)]

//! Reference URI dereferencing.
//!
//! Only the empty URI is supported: the entire document minus comments.
//! Same-document fragments and external resources are rejected.

use crate::pipeline::TransformData;
use roxmltree::Document;
use xmlsign_core::Error;
use xmlsign_xml::{NodeSet, XmlDocument};

/// Dereference `uri` against `doc` and return the node set it selects.
pub fn resolve_uri(uri: &str, doc: &Document<'_>) -> Result<NodeSet, Error> {
    if uri.is_empty() {
        Ok(NodeSet::all_without_comments(doc))
    } else {
        Err(Error::InvalidUri(format!("unsupported reference URI: {uri}")))
    }
}

/// Dereference `uri` within `document` as pipeline input.
pub fn dereference(uri: &str, document: &XmlDocument) -> Result<TransformData, Error> {
    let node_set = resolve_uri(uri, &document.parse_doc()?)?;
    Ok(TransformData::Xml {
        xml_text: document.text().to_owned(),
        node_set: Some(node_set),
    })
}
