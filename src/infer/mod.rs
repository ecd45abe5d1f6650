//! Shape and value inference
//!
//! Each canonical node type has a pure function computing its output
//! annotations from its input annotations. [`InferenceEngine`] walks the graph
//! in topological order and writes the results to the output ports.

pub mod engine;
pub mod ops;
pub mod prior;
pub mod registry;

pub use engine::{InferStats, InferenceEngine};
pub use prior::ShapeFormat;
pub use registry::{InferFn, InferenceRegistry};
