#![forbid(unsafe_code)]

//! Core types shared by all xmlsign crates: the error type, algorithm
//! URIs and XML-DSig namespace/element names.

pub mod algorithm;
pub mod error;
pub mod ns;

pub use error::{Error, Result};
