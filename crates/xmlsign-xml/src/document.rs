#![forbid(unsafe_code)]

//! Owned XML document with root-level splicing.

use crate::encoding::{self, TextEncoding};
use xmlsign_core::Error;

/// An owned XML document.  Stores the text and the encoding it was read in.
///
/// To work with the parsed tree, call [`XmlDocument::parse_doc`] which
/// returns a temporary `roxmltree::Document` borrowing from the text.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    text: String,
    encoding: TextEncoding,
}

/// Where content can be appended as the last child of the root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertionPoint {
    /// Byte offset of the root element's end tag.
    BeforeEndTag(usize),
    /// The root is an empty-element tag; `offset` points at its `/>`.
    SelfClosing { offset: usize, qname: String },
}

impl XmlDocument {
    /// Parse and validate XML from a string, taking ownership.
    pub fn parse(text: String) -> Result<Self, Error> {
        crate::parse(&text)?;
        Ok(Self {
            text,
            encoding: TextEncoding::Utf8,
        })
    }

    /// Parse and validate XML from bytes in UTF-8 or UTF-16.
    pub fn parse_bytes(data: &[u8]) -> Result<Self, Error> {
        let (text, encoding) = encoding::decode(data)?;
        crate::parse(&text)?;
        Ok(Self { text, encoding })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The encoding the document was read in.
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Parse the stored text into a temporary `roxmltree::Document`.
    pub fn parse_doc(&self) -> Result<roxmltree::Document<'_>, Error> {
        crate::parse(&self.text)
    }

    /// Locate the spot where a new last child of the root element goes.
    pub fn root_insertion_point(&self) -> Result<InsertionPoint, Error> {
        let doc = self.parse_doc()?;
        let root = doc.root_element();
        let range = root.range();
        let element_text = self
            .text
            .get(range.clone())
            .ok_or_else(|| Error::XmlStructure("root element range out of bounds".into()))?;

        if element_text.ends_with("/>") {
            return Ok(InsertionPoint::SelfClosing {
                offset: range.end - 2,
                qname: crate::element_qname(&root),
            });
        }

        // The end tag is the last markup of the element, so the last "</"
        // inside its range starts it.
        let end_tag = element_text
            .rfind("</")
            .ok_or_else(|| Error::XmlStructure("root element has no end tag".into()))?;
        Ok(InsertionPoint::BeforeEndTag(range.start + end_tag))
    }

    /// Return a copy of the document text with `fragment` appended as the
    /// last child of the root element. All other bytes are kept as is.
    pub fn append_to_root(&self, fragment: &str) -> Result<String, Error> {
        let mut out = String::with_capacity(self.text.len() + fragment.len() + 16);
        match self.root_insertion_point()? {
            InsertionPoint::BeforeEndTag(offset) => {
                out.push_str(&self.text[..offset]);
                out.push_str(fragment);
                out.push_str(&self.text[offset..]);
            }
            InsertionPoint::SelfClosing { offset, qname } => {
                out.push_str(&self.text[..offset]);
                out.push('>');
                out.push_str(fragment);
                out.push_str("</");
                out.push_str(&qname);
                out.push('>');
                out.push_str(&self.text[offset + 2..]);
            }
        }
        Ok(out)
    }
}
