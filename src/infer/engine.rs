//! Graph-wide inference driver

use log::{debug, info};

use crate::error::{GraphResult, TransformError};
use crate::graph::{Annotation, Graph, NodeId, PortRef};

use super::registry::InferenceRegistry;

/// Counters reported by one inference run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InferStats {
    /// Nodes whose outputs were annotated by this run
    pub nodes_inferred: usize,
    /// Nodes whose outputs were already annotated
    pub nodes_skipped: usize,
}

/// Annotates output ports in topological order
pub struct InferenceEngine<'a> {
    registry: &'a InferenceRegistry,
}

impl<'a> InferenceEngine<'a> {
    pub fn new(registry: &'a InferenceRegistry) -> Self {
        Self { registry }
    }

    /// Annotate every output port of the graph
    ///
    /// Nodes whose outputs all carry an annotation already are skipped.
    /// Every connected input must be resolved before its consumer runs.
    pub fn run(&self, graph: &mut Graph) -> GraphResult<InferStats> {
        let mut stats = InferStats::default();
        for id in graph.topological_order()? {
            if self.infer_node(graph, id)? {
                stats.nodes_inferred += 1;
            } else {
                stats.nodes_skipped += 1;
            }
        }
        info!(
            "Inference annotated {} node(s), skipped {}",
            stats.nodes_inferred, stats.nodes_skipped
        );
        Ok(stats)
    }

    /// Infer one node; returns false if it was already annotated
    pub fn infer_node(&self, graph: &mut Graph, id: NodeId) -> GraphResult<bool> {
        let node = graph.require_node(id)?;
        let outputs = node.outputs().len();
        if outputs > 0 && node.outputs().iter().all(|p| p.annotation().is_some()) {
            return Ok(false);
        }

        let infer = self.registry.get(&node.op_type).ok_or_else(|| {
            TransformError::ShapeInferenceFailed(format!(
                "no inference function for type '{}' ({})",
                node.op_type,
                node.name()
            ))
        })?;

        let mut inputs = Vec::with_capacity(node.inputs().len());
        for port in node.inputs() {
            if port.is_disconnected() {
                inputs.push(Annotation::default());
                continue;
            }
            let annotation = graph
                .input_annotation(id, port.index)
                .filter(|a| a.is_resolved())
                .ok_or_else(|| {
                    TransformError::ShapeInferenceFailed(format!(
                        "{} is fed by an unresolved port",
                        graph.port_label(PortRef::input(id, port.index))
                    ))
                })?;
            inputs.push(annotation.clone());
        }

        let annotations = infer(node, &inputs)?;
        if annotations.len() != outputs {
            return Err(TransformError::Internal(format!(
                "inference for '{}' returned {} annotation(s) for {} output(s)",
                node.name(),
                annotations.len(),
                outputs
            )));
        }
        debug!("Inferred {} ({}): {:?}", node.name(), node.op_type, annotations);

        for (index, annotation) in annotations.into_iter().enumerate() {
            graph.annotate_output(PortRef::output(id, index), annotation)?;
        }
        Ok(true)
    }
}
