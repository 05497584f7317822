#![forbid(unsafe_code)]

//! Element lookup helpers.

use roxmltree::Node;
use xmlsign_core::{ns, Error};

pub(crate) fn is_dsig(node: &Node<'_, '_>, local_name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local_name
        && node.tag_name().namespace() == Some(ns::DSIG)
}

pub(crate) fn find_child_element<'a, 'input>(
    parent: Node<'a, 'input>,
    local_name: &str,
) -> Option<Node<'a, 'input>> {
    parent.children().find(|n| is_dsig(n, local_name))
}

pub(crate) fn require_child_element<'a, 'input>(
    parent: Node<'a, 'input>,
    local_name: &str,
) -> Result<Node<'a, 'input>, Error> {
    find_child_element(parent, local_name)
        .ok_or_else(|| Error::MissingElement(local_name.to_owned()))
}

pub(crate) fn find_child_elements<'a, 'input>(
    parent: Node<'a, 'input>,
    local_name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    parent.children().filter(move |n| is_dsig(n, local_name))
}

pub(crate) fn algorithm<'a>(node: Node<'a, '_>) -> Result<&'a str, Error> {
    node.attribute(ns::attr::ALGORITHM).ok_or_else(|| {
        Error::MissingAttribute(format!("Algorithm on {}", node.tag_name().name()))
    })
}

/// The last element child of the document element.
pub(crate) fn last_root_child<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
) -> Option<Node<'a, 'input>> {
    doc.root_element().children().filter(|n| n.is_element()).last()
}

/// Decode base64 element content, ignoring embedded whitespace.
pub(crate) fn base64_content(node: Node<'_, '_>) -> Result<Vec<u8>, Error> {
    use base64::Engine;
    let clean: String = node
        .text()
        .unwrap_or("")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    base64::engine::general_purpose::STANDARD
        .decode(clean)
        .map_err(|e| Error::Base64(format!("{}: {e}", node.tag_name().name())))
}
