#![forbid(unsafe_code)]

//! Inclusive Canonical XML 1.0 (C14N 1.0).
//!
//! Algorithm URI: `http://www.w3.org/TR/2001/REC-xml-c14n-20010315`
//! With comments: `http://www.w3.org/TR/2001/REC-xml-c14n-20010315#WithComments`
//!
//! The canonical form:
//! - Outputs namespace declarations sorted by prefix (default first)
//! - Outputs attributes sorted by (namespace-URI, local-name)
//! - Escapes text and attribute values per C14N rules
//! - Optionally preserves or strips comments
//! - Supports document-subset canonicalization via NodeSet

use crate::escape;
use crate::render::{Attr, NsDecl};
use roxmltree::{Node, NodeType};
use std::collections::BTreeMap;
use xmlsign_core::{ns, Error};
use xmlsign_xml::NodeSet;

/// Canonicalize a document using Inclusive C14N 1.0.
pub fn canonicalize(
    doc: &roxmltree::Document<'_>,
    with_comments: bool,
    node_set: Option<&NodeSet>,
) -> Result<Vec<u8>, Error> {
    let mut output = Vec::new();
    let ctx = C14nContext {
        with_comments,
        node_set,
    };
    ctx.process_node(doc.root(), &mut output, &BTreeMap::new())?;
    Ok(output)
}

struct C14nContext<'a> {
    with_comments: bool,
    node_set: Option<&'a NodeSet>,
}

impl C14nContext<'_> {
    fn is_visible(&self, node: &Node<'_, '_>) -> bool {
        match self.node_set {
            None => true,
            Some(ns) => ns.contains(node),
        }
    }

    /// `rendered` maps prefix → URI for the declarations in effect at the
    /// nearest output ancestor element.
    fn process_node(
        &self,
        node: Node<'_, '_>,
        output: &mut Vec<u8>,
        rendered: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        match node.node_type() {
            NodeType::Root => {
                for child in node.children() {
                    self.process_node(child, output, rendered)?;
                }
            }
            NodeType::Element => self.process_element(node, output, rendered)?,
            NodeType::Text => {
                if self.is_visible(&node) {
                    let text = node.text().unwrap_or("");
                    output.extend_from_slice(escape::escape_text(text).as_bytes());
                }
            }
            NodeType::Comment => {
                if self.with_comments && self.is_visible(&node) {
                    with_document_level_breaks(&node, output, |out| {
                        out.extend_from_slice(b"<!--");
                        out.extend_from_slice(node.text().unwrap_or("").as_bytes());
                        out.extend_from_slice(b"-->");
                    });
                }
            }
            NodeType::PI => {
                if self.is_visible(&node) {
                    let Some(pi) = node.pi() else {
                        return Err(Error::Canonicalization(
                            "processing instruction without target".into(),
                        ));
                    };
                    with_document_level_breaks(&node, output, |out| {
                        out.extend_from_slice(b"<?");
                        out.extend_from_slice(pi.target.as_bytes());
                        if let Some(value) = pi.value.filter(|v| !v.is_empty()) {
                            out.push(b' ');
                            out.extend_from_slice(escape::escape_pi(value).as_bytes());
                        }
                        out.extend_from_slice(b"?>");
                    });
                }
            }
        }
        Ok(())
    }

    fn process_element(
        &self,
        node: Node<'_, '_>,
        output: &mut Vec<u8>,
        rendered: &BTreeMap<String, String>,
    ) -> Result<(), Error> {
        if !self.is_visible(&node) {
            // Invisible elements contribute nothing themselves; their
            // visible descendants compare against the same output ancestor.
            for child in node.children() {
                self.process_node(child, output, rendered)?;
            }
            return Ok(());
        }

        let in_scope = collect_inscope_namespaces(&node);

        let mut ns_decls: Vec<NsDecl> = in_scope
            .iter()
            .filter(|(prefix, uri)| rendered.get(*prefix) != Some(*uri))
            .map(|(prefix, uri)| NsDecl {
                prefix: prefix.clone(),
                uri: uri.clone(),
            })
            .collect();

        // The output ancestor declared a default namespace this element no
        // longer has: undeclare it.
        let default_dropped = rendered.get("").is_some_and(|uri| !uri.is_empty())
            && !in_scope.contains_key("");
        if default_dropped {
            ns_decls.push(NsDecl {
                prefix: String::new(),
                uri: String::new(),
            });
        }
        ns_decls.sort();

        let mut attrs: Vec<Attr> = node
            .attributes()
            .map(|attr| Attr {
                ns_uri: attr.namespace().unwrap_or("").to_owned(),
                local_name: attr.name().to_owned(),
                qualified_name: xmlsign_xml::attribute_qname(&node, &attr),
                value: attr.value().to_owned(),
            })
            .collect();

        // xml:* attributes are inherited only when the element is the apex
        // of a visible subtree, i.e. its parent element is not output.
        if self.node_set.is_some() {
            let parent_hidden = node
                .parent()
                .map_or(true, |p| !p.is_element() || !self.is_visible(&p));
            if parent_hidden {
                let inherited = collect_inherited_xml_attrs(&node, &attrs);
                attrs.extend(inherited);
            }
        }
        attrs.sort();

        let elem_name = xmlsign_xml::element_qname(&node);

        output.push(b'<');
        output.extend_from_slice(elem_name.as_bytes());
        for ns_decl in &ns_decls {
            output.extend_from_slice(ns_decl.render().as_bytes());
        }
        for attr in &attrs {
            output.extend_from_slice(attr.render().as_bytes());
        }
        output.push(b'>');

        for child in node.children() {
            self.process_node(child, output, &in_scope)?;
        }

        output.extend_from_slice(b"</");
        output.extend_from_slice(elem_name.as_bytes());
        output.push(b'>');
        Ok(())
    }
}

/// Comments and PIs that are children of the document node are separated
/// from the document element by a line feed.
fn with_document_level_breaks(
    node: &Node<'_, '_>,
    output: &mut Vec<u8>,
    render: impl FnOnce(&mut Vec<u8>),
) {
    let at_document_level = node
        .parent()
        .is_some_and(|p| p.node_type() == NodeType::Root);

    if at_document_level && node.prev_siblings().any(|s| s.is_element()) {
        output.push(b'\n');
    }
    render(output);
    if at_document_level && node.next_siblings().any(|s| s.is_element()) {
        output.push(b'\n');
    }
}

/// Collect xml:* attributes from all ancestors, nearest value first, that
/// the element does not already carry.
fn collect_inherited_xml_attrs(node: &Node<'_, '_>, existing: &[Attr]) -> Vec<Attr> {
    let mut inherited: BTreeMap<String, String> = BTreeMap::new();
    for ancestor in node.ancestors().skip(1).filter(|n| n.is_element()) {
        for attr in ancestor.attributes() {
            if attr.namespace() == Some(ns::XML) {
                inherited
                    .entry(attr.name().to_owned())
                    .or_insert_with(|| attr.value().to_owned());
            }
        }
    }

    inherited
        .into_iter()
        .filter(|(name, _)| {
            !existing
                .iter()
                .any(|a| a.ns_uri == ns::XML && a.local_name == *name)
        })
        .map(|(name, value)| Attr {
            ns_uri: ns::XML.to_owned(),
            qualified_name: format!("xml:{name}"),
            local_name: name,
            value,
        })
        .collect()
}

/// Collect all in-scope namespaces for an element, keyed by prefix (""
/// for the default namespace). The `xml` prefix and an empty default
/// namespace are never part of the result.
fn collect_inscope_namespaces(node: &Node<'_, '_>) -> BTreeMap<String, String> {
    let mut result = BTreeMap::new();
    for ns in node.namespaces() {
        let prefix = ns.name().unwrap_or("");
        if prefix == "xml" || (prefix.is_empty() && ns.uri().is_empty()) {
            continue;
        }
        result.insert(prefix.to_owned(), ns.uri().to_owned());
    }
    result
}
