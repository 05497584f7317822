#![forbid(unsafe_code)]

//! Transform pipeline for xmlsign references.
//!
//! Each reference carries a sequence of transforms applied in order to the
//! dereferenced node set. Only whole-document references are supported.

pub mod enveloped;
pub mod pipeline;
pub mod uri;

pub use enveloped::EnvelopedSignatureTransform;
pub use pipeline::{Transform, TransformData, TransformPipeline};
