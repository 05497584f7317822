#![forbid(unsafe_code)]

//! Node sets for document-subset canonicalization.
//!
//! A `NodeSet` holds roxmltree `NodeId`s. Ids are positional, so a set
//! built from one parse stays valid for any other parse of the same text.

use roxmltree::{Document, Node, NodeId};
use std::collections::HashSet;

/// A set of XML document nodes identified by `NodeId`.
#[derive(Debug, Clone, Default)]
pub struct NodeSet {
    nodes: HashSet<NodeId>,
}

impl NodeSet {
    /// Every node of the document, comments included.
    pub fn all(doc: &Document<'_>) -> Self {
        Self {
            nodes: doc.root().descendants().map(|n| n.id()).collect(),
        }
    }

    /// Every node except comments. `URI=""` selects exactly this set.
    pub fn all_without_comments(doc: &Document<'_>) -> Self {
        Self::tree_without_comments(doc.root())
    }

    /// The subtree rooted at `node`, without comment nodes.
    pub fn tree_without_comments(node: Node<'_, '_>) -> Self {
        Self {
            nodes: node
                .descendants()
                .filter(|n| !n.is_comment())
                .map(|n| n.id())
                .collect(),
        }
    }

    pub fn contains(&self, node: &Node<'_, '_>) -> bool {
        self.nodes.contains(&node.id())
    }

    /// Remove `node` and all of its descendants.
    pub fn remove_subtree(&mut self, node: Node<'_, '_>) {
        for n in node.descendants() {
            self.nodes.remove(&n.id());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}
