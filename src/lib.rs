//! # Graph Canonicalizer
//!
//! Rewrite-pass engine that turns operator graphs imported from a source
//! model format into a canonical form ready for IR serialization.
//!
//! This crate provides operator extraction, shape/value inference, pattern
//! matching and dependency-ordered graph rewriting.
//!
//! ## Features
//!
//! - **Extraction**: `(format, operator)` registry turning raw records into
//!   canonical nodes
//! - **Inference**: per-type output shape and constant value functions
//! - **Passes**: declarative patterns plus mutations, ordered by
//!   `runs_after` / `runs_before` constraints
//! - **Validation**: every output connected or terminated before handoff
//!
//! ## Example
//!
//! ```ignore
//! use graph_canonicalizer::prelude::*;
//!
//! let source = SourceGraph::new(SourceFormat::Onnx)
//!     .input("data", vec![1, 3, 8, 8])
//!     .op("pool", "MaxPool", RawAttrs::new().with("kernel_shape", vec![2i64, 2]))
//!     .edge("data", 0, "pool", 0)
//!     .output("pooled", "pool", 0);
//!
//! let pipeline = Pipeline::builder().build()?;
//! let (graph, report) = pipeline.run(&source)?;
//! ```

#![deny(unsafe_code)]

pub mod error;
pub mod extract;
pub mod front;
pub mod graph;
pub mod infer;
pub mod pattern;
pub mod pipeline;
pub mod tensor;
pub mod traits;
pub mod transform;
pub mod transformers;
pub mod validation;

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Prelude module - import commonly used types with `use graph_canonicalizer::prelude::*`
pub mod prelude {
    pub use crate::error::{GraphResult, TransformError};
    pub use crate::extract::{ExtractorRegistry, NodeAttrs, RawAttrs, SourceFormat};
    pub use crate::front::SourceGraph;
    pub use crate::graph::{
        Annotation, AttrValue, Attributes, Graph, NodeDesc, NodeId, PortRef, RemoveMode,
    };
    pub use crate::infer::{InferenceEngine, InferenceRegistry, ShapeFormat};
    pub use crate::pattern::{matcher, Match, Pattern, PatternMatcher};
    pub use crate::pipeline::{Pipeline, PipelineConfig, PipelineReport};
    pub use crate::traits::Transformer;
    pub use crate::transform::{Pass, PassRegistry, TransformConfig, TransformEngine};
    pub use crate::transformers::default_passes;
    pub use crate::validation::check_canonical;
}

// ============================================================================
// Crate-level re-exports
// ============================================================================

pub use error::{GraphResult, TransformError};
pub use traits::Transformer;

// ============================================================================
// Version information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_prelude_pipeline() {
        use crate::prelude::*;

        let pipeline = Pipeline::builder().build().unwrap();
        assert_eq!(pipeline.schedule()[0], "FakeOutputResolver");
    }
}
