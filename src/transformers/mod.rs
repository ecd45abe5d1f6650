//! Built-in canonicalization passes
//!
//! - **FakeOutputResolver**: collapse `FakeOutput` markers
//! - **MaxPool** / **AvgPool**: split generic `Pooling` by `pool_method`
//! - **GatherNormalizer**: move the `axis` attribute of `AttributedGather`
//!   into a `Const` input
//!
//! # Overview
//!
//! Each pass implements the [`Transformer`] trait and can be applied on its
//! own with [`run_pass`](crate::transform::run_pass), or scheduled together
//! through [`default_passes`].
//!
//! # Example
//!
//! ```ignore
//! use graph_canonicalizer::transform::TransformEngine;
//! use graph_canonicalizer::transformers::default_passes;
//!
//! let registry = default_passes();
//! let engine = TransformEngine::new(&registry)?;
//! let stats = engine.run(&mut graph)?;
//!
//! println!("Applied {} rewrites", stats.transforms_applied);
//! ```

/// Common utilities
pub mod common;
/// FakeOutput resolution
pub mod fake_output;
/// Gather normalization
pub mod gather;
/// Pooling canonicalization
pub mod pooling;

pub use crate::traits::Transformer;
pub use common::{terminate_disconnected_outputs, terminate_output_ports};
pub use fake_output::FakeOutputResolver;
pub use gather::GatherNormalizer;
pub use pooling::{PoolingToAvgPool, PoolingToMaxPool};

use crate::transform::PassRegistry;

/// Registry holding every built-in pass, enabled, in declaration order
pub fn default_passes() -> PassRegistry {
    PassRegistry::new()
        .with(FakeOutputResolver::new().into_pass())
        .with(PoolingToMaxPool::new().into_pass())
        .with(PoolingToAvgPool::new().into_pass())
        .with(GatherNormalizer::new().into_pass())
}
