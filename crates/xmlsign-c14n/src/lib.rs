#![forbid(unsafe_code)]

//! XML Canonicalization for xmlsign.
//!
//! Implements Canonical XML 1.0, with and without comments, over whole
//! documents and document subsets.

pub mod escape;
pub mod inclusive;
pub mod render;

use xmlsign_core::{algorithm, Error};
use xmlsign_xml::NodeSet;

/// The canonicalization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum C14nMode {
    /// Canonical XML 1.0
    #[default]
    Inclusive,
    /// Canonical XML 1.0 with comments
    InclusiveWithComments,
}

impl C14nMode {
    /// Get the algorithm URI for this mode.
    pub fn uri(&self) -> &'static str {
        match self {
            Self::Inclusive => algorithm::C14N,
            Self::InclusiveWithComments => algorithm::C14N_WITH_COMMENTS,
        }
    }

    /// Parse a C14N mode from an algorithm URI.
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            algorithm::C14N => Some(Self::Inclusive),
            algorithm::C14N_WITH_COMMENTS => Some(Self::InclusiveWithComments),
            _ => None,
        }
    }

    pub fn with_comments(&self) -> bool {
        matches!(self, Self::InclusiveWithComments)
    }
}

/// Canonicalize an XML document.
///
/// - `xml`: the raw XML text
/// - `mode`: which C14N variant to use
/// - `node_set`: optional node set (for document-subset canonicalization)
pub fn canonicalize(xml: &str, mode: C14nMode, node_set: Option<&NodeSet>) -> Result<Vec<u8>, Error> {
    let doc = xmlsign_xml::parse(xml)?;
    canonicalize_doc(&doc, mode, node_set)
}

/// Convenience: canonicalize with a pre-parsed document.
pub fn canonicalize_doc(
    doc: &roxmltree::Document<'_>,
    mode: C14nMode,
    node_set: Option<&NodeSet>,
) -> Result<Vec<u8>, Error> {
    inclusive::canonicalize(doc, mode.with_comments(), node_set)
}
