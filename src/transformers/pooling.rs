//! Pooling canonicalization
//!
//! Generic `Pooling` nodes are split by `pool_method` into `MaxPool` and
//! `AvgPool`. Both keep every output port terminated.

use crate::error::GraphResult;
use crate::graph::{AttrValue, Graph, PortRef};
use crate::pattern::{AttrPredicate, Match, Pattern};
use crate::traits::Transformer;

use super::common::{bound, remove_attrs, set_op_type, terminate_disconnected_outputs};

/// `Pooling{pool_method = "max"}` → `MaxPool`
///
/// `MaxPool` has two outputs: values (0) and indices (1). A missing indices
/// port is added with the values annotation. Every disconnected output gets
/// a `Result` terminal.
#[derive(Debug, Default)]
pub struct PoolingToMaxPool;

impl PoolingToMaxPool {
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for PoolingToMaxPool {
    fn name(&self) -> &'static str {
        "MaxPool"
    }

    fn pattern(&self) -> Pattern {
        Pattern::single("pool", "Pooling").with_predicate(AttrPredicate::Equals(
            "pool_method".to_string(),
            AttrValue::from("max"),
        ))
    }

    fn runs_after(&self) -> &[&'static str] {
        &["FakeOutputResolver"]
    }

    fn rewrite(&self, graph: &mut Graph, found: &Match) -> GraphResult<()> {
        let pool = bound(found, "pool")?;

        if graph.require_node(pool)?.outputs().len() < 2 {
            let values = graph.output_annotation(PortRef::output(pool, 0)).cloned();
            let indices = graph.add_output_port(pool)?;
            if let Some(annotation) = values {
                graph.annotate_output(PortRef::output(pool, indices), annotation)?;
            }
        }

        set_op_type(graph, pool, "MaxPool")?;
        remove_attrs(graph, pool, &["pool_method", "exclude_pad"])?;
        terminate_disconnected_outputs(graph, pool)?;
        Ok(())
    }
}

/// `Pooling{pool_method = "avg"}` → `AvgPool`
///
/// Every disconnected output gets a `Result` terminal.
#[derive(Debug, Default)]
pub struct PoolingToAvgPool;

impl PoolingToAvgPool {
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for PoolingToAvgPool {
    fn name(&self) -> &'static str {
        "AvgPool"
    }

    fn pattern(&self) -> Pattern {
        Pattern::single("pool", "Pooling").with_predicate(AttrPredicate::Equals(
            "pool_method".to_string(),
            AttrValue::from("avg"),
        ))
    }

    fn runs_after(&self) -> &[&'static str] {
        &["FakeOutputResolver"]
    }

    fn rewrite(&self, graph: &mut Graph, found: &Match) -> GraphResult<()> {
        let pool = bound(found, "pool")?;
        set_op_type(graph, pool, "AvgPool")?;
        remove_attrs(graph, pool, &["pool_method"])?;
        terminate_disconnected_outputs(graph, pool)?;
        Ok(())
    }
}
