#![forbid(unsafe_code)]

//! `<Reference>` processing shared by signing and verification.

use crate::nodes;
use log::trace;
use roxmltree::Node;
use xmlsign_core::{algorithm, ns, Error};
use xmlsign_transforms::{uri, EnvelopedSignatureTransform, TransformPipeline};
use xmlsign_xml::XmlDocument;

/// Dereference a `<Reference>`, run its transforms and digest the result.
///
/// `reference` and `signature` must come from a parse of `document`'s
/// text; `signature` is the `<Signature>` element holding the reference.
pub(crate) fn digest_reference(
    document: &XmlDocument,
    reference: Node<'_, '_>,
    signature: Node<'_, '_>,
) -> Result<Vec<u8>, Error> {
    let uri = reference.attribute(ns::attr::URI).unwrap_or("");
    let digest_uri = nodes::algorithm(nodes::require_child_element(reference, ns::node::DIGEST_METHOD)?)?;

    let pipeline = build_pipeline(reference, signature)?;
    trace!(
        "Reference URI={uri:?} transforms {:?}",
        pipeline.uris().collect::<Vec<_>>()
    );
    let data = pipeline.execute(uri::dereference(uri, document)?)?;

    xmlsign_crypto::digest::digest(digest_uri, &data.to_binary()?)
}

fn build_pipeline(reference: Node<'_, '_>, signature: Node<'_, '_>) -> Result<TransformPipeline, Error> {
    let mut pipeline = TransformPipeline::new();
    let Some(transforms) = nodes::find_child_element(reference, ns::node::TRANSFORMS) else {
        return Ok(pipeline);
    };

    for transform in nodes::find_child_elements(transforms, ns::node::TRANSFORM) {
        let uri = nodes::algorithm(transform)?;
        match uri {
            algorithm::ENVELOPED_SIGNATURE => {
                pipeline.push(Box::new(EnvelopedSignatureTransform::from_node(signature)));
            }
            _ => return Err(Error::UnsupportedAlgorithm(format!("transform: {uri}"))),
        }
    }
    Ok(pipeline)
}
