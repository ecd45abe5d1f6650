//! Pass infrastructure
//!
//! - [`Pass`]: name, enabled flag, pattern, ordering constraints, mutation
//! - [`PassRegistry`]: explicit registration table and scheduler
//! - [`TransformEngine`]: runs the scheduled passes over a graph
//!
//! # Example
//!
//! ```ignore
//! use graph_canonicalizer::pattern::Pattern;
//! use graph_canonicalizer::transform::{Pass, PassRegistry, TransformEngine};
//!
//! let registry = PassRegistry::new()
//!     .with(Pass::new("FakeOutputResolver", Pattern::single("fake", "FakeOutput"), resolve))
//!     .with(
//!         Pass::new("MaxPool", max_pool_pattern, to_max_pool)
//!             .runs_after("FakeOutputResolver"),
//!     );
//!
//! // Scheduling errors (cycles, unknown names) are raised here
//! let engine = TransformEngine::new(&registry)?;
//! let stats = engine.run(&mut graph)?;
//! ```

pub mod core;
pub mod pass;
pub mod schedule;

// Re-export main types and functions
pub use core::{run_pass, TransformConfig, TransformEngine, TransformStats};
pub use pass::{Mutation, Pass};
pub use schedule::PassRegistry;
