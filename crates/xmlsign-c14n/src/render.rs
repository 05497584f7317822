#![forbid(unsafe_code)]

//! Namespace declarations and attributes as they are written to the
//! canonical form, with the C14N ordering rules.

use crate::escape;
use std::cmp::Ordering;

/// A namespace declaration; `prefix` is empty for the default namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NsDecl {
    pub prefix: String,
    pub uri: String,
}

impl NsDecl {
    pub fn render(&self) -> String {
        let uri = escape::escape_attr(&self.uri);
        if self.prefix.is_empty() {
            format!(" xmlns=\"{uri}\"")
        } else {
            format!(" xmlns:{}=\"{uri}\"", self.prefix)
        }
    }
}

/// The default namespace first, then by prefix.
impl Ord for NsDecl {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .prefix
            .is_empty()
            .cmp(&self.prefix.is_empty())
            .then_with(|| self.prefix.cmp(&other.prefix))
    }
}

impl PartialOrd for NsDecl {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An attribute to be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    /// Namespace URI, empty when the attribute is unqualified.
    pub ns_uri: String,
    pub local_name: String,
    /// Name as written: `prefix:local` or `local`.
    pub qualified_name: String,
    pub value: String,
}

impl Attr {
    pub fn render(&self) -> String {
        format!(
            " {}=\"{}\"",
            self.qualified_name,
            escape::escape_attr(&self.value)
        )
    }
}

/// Unqualified attributes first (by local name), then by namespace URI
/// and local name.
impl Ord for Attr {
    fn cmp(&self, other: &Self) -> Ordering {
        self.ns_uri
            .cmp(&other.ns_uri)
            .then_with(|| self.local_name.cmp(&other.local_name))
    }
}

impl PartialOrd for Attr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
