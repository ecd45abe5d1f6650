//! Tensor shape utilities
//!
//! Shapes are plain `i64` dimension lists. A negative dimension marks a
//! dynamic (unknown until runtime) extent.

pub mod shape;

pub use shape::{format_shape, is_dynamic, normalize_axis, numel, pooled_dim, Shape};
