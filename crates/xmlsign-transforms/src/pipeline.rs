#![forbid(unsafe_code)]

//! Transform pipeline and trait definitions.

use xmlsign_c14n::C14nMode;
use xmlsign_core::Error;
use xmlsign_xml::NodeSet;

/// Data flowing through the transform pipeline.
#[derive(Debug)]
pub enum TransformData {
    /// XML node set (for XML-aware transforms like C14N).
    Xml {
        xml_text: String,
        node_set: Option<NodeSet>,
    },
    /// Raw octets.
    Binary(Vec<u8>),
}

impl TransformData {
    /// Convert to octets, applying inclusive C14N without comments to a
    /// node set that reaches the end of the pipeline.
    pub fn to_binary(&self) -> Result<Vec<u8>, Error> {
        match self {
            TransformData::Binary(data) => Ok(data.clone()),
            TransformData::Xml { xml_text, node_set } => {
                xmlsign_c14n::canonicalize(xml_text, C14nMode::Inclusive, node_set.as_ref())
            }
        }
    }
}

/// Trait for individual transforms.
pub trait Transform: Send {
    /// The algorithm URI for this transform.
    fn uri(&self) -> &str;

    /// Execute the transform on the given data.
    fn execute(&self, input: TransformData) -> Result<TransformData, Error>;
}

/// A pipeline of transforms executed in sequence.
pub struct TransformPipeline {
    transforms: Vec<Box<dyn Transform>>,
}

impl TransformPipeline {
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    pub fn push(&mut self, transform: Box<dyn Transform>) {
        self.transforms.push(transform);
    }

    /// Execute all transforms in order.
    pub fn execute(&self, input: TransformData) -> Result<TransformData, Error> {
        let mut data = input;
        for transform in &self.transforms {
            data = transform.execute(data)?;
        }
        Ok(data)
    }

    /// Algorithm URIs in execution order.
    pub fn uris(&self) -> impl Iterator<Item = &str> + '_ {
        self.transforms.iter().map(|t| t.uri())
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::new()
    }
}
