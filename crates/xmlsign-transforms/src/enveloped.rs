#![forbid(unsafe_code)]

//! Enveloped signature transform.
//!
//! Removes the `<Signature>` element holding the reference, with all of its
//! descendants, from the node set.

use crate::pipeline::{Transform, TransformData};
use roxmltree::NodeId;
use xmlsign_core::{algorithm, Error};
use xmlsign_xml::NodeSet;

pub struct EnvelopedSignatureTransform {
    signature: NodeId,
}

impl EnvelopedSignatureTransform {
    /// `signature` identifies the `<Signature>` element in the text that
    /// will flow through the pipeline. Node ids are positional, so an id
    /// taken from one parse of a text is valid for any other parse of it.
    pub fn new(signature: NodeId) -> Self {
        Self { signature }
    }

    pub fn from_node(node: roxmltree::Node<'_, '_>) -> Self {
        Self::new(node.id())
    }
}

impl Transform for EnvelopedSignatureTransform {
    fn uri(&self) -> &str {
        algorithm::ENVELOPED_SIGNATURE
    }

    fn execute(&self, input: TransformData) -> Result<TransformData, Error> {
        let TransformData::Xml { xml_text, node_set } = input else {
            return Err(Error::Transform(
                "enveloped-signature transform requires XML input".into(),
            ));
        };

        let node_set = {
            let doc = xmlsign_xml::parse(&xml_text)?;
            let signature = doc
                .get_node(self.signature)
                .filter(|n| n.is_element())
                .ok_or_else(|| {
                    Error::Transform("enveloped signature element not found".into())
                })?;

            let mut set = node_set.unwrap_or_else(|| NodeSet::all(&doc));
            set.remove_subtree(signature);
            set
        };

        Ok(TransformData::Xml {
            xml_text,
            node_set: Some(node_set),
        })
    }
}
