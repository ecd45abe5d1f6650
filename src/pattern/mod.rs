//! Pattern matching
//!
//! Patterns are data: labelled node constraints (type tag, attribute
//! predicates) and edges between labels. One generic matcher evaluates any
//! pattern against a [`Graph`](crate::graph::Graph).
//!
//! # Example
//!
//! ```ignore
//! use graph_canonicalizer::pattern::{matcher, Pattern};
//!
//! let pattern = Pattern::builder()
//!     .node("pool", "Pooling")
//!     .attr_eq("pool_method", "max")
//!     .build()?;
//!
//! for m in matcher(&graph).find_all(&pattern) {
//!     println!("max pooling at {:?}", m.get("pool"));
//! }
//! ```

pub mod matcher;
pub mod ops;

// Re-export main types
pub use matcher::{matcher, Match, PatternMatcher};
pub use ops::{
    is_pool_op, AttrPredicate, EdgePattern, NodePattern, Pattern, PatternBuilder, POOL_OPS,
};
