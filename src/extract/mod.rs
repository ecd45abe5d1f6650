//! Extractor registry and built-in extractors
//!
//! Extraction turns one raw operator record of a source format into the
//! canonical type tag and attribute set of a node. It is pure: creating the
//! node is left to the caller (see [`crate::front`]).

pub mod common;
pub mod mxnet;
pub mod onnx;
pub mod registry;

pub use common::{NodeAttrs, RawAttrs};
pub use registry::{ExtractFn, ExtractorEntry, ExtractorRegistry, SourceFormat};
