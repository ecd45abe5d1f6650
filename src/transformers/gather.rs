//! Gather normalization

use log::debug;

use crate::error::{GraphResult, TransformError};
use crate::graph::{Annotation, AttrValue, Graph, NodeDesc, PortRef};
use crate::pattern::{Match, Pattern};
use crate::traits::Transformer;

use super::common::{bound, set_op_type};

/// `AttributedGather` → `Gather` with the axis as a third input
///
/// The `axis` attribute moves into a new `Const` node connected to input
/// port 2. The constant's output is annotated with the axis value, so the
/// result is ready for a later inference run.
#[derive(Debug, Default)]
pub struct GatherNormalizer;

impl GatherNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for GatherNormalizer {
    fn name(&self) -> &'static str {
        "GatherNormalizer"
    }

    fn pattern(&self) -> Pattern {
        Pattern::single("gather", "AttributedGather")
    }

    fn runs_after(&self) -> &[&'static str] {
        &["FakeOutputResolver"]
    }

    fn rewrite(&self, graph: &mut Graph, found: &Match) -> GraphResult<()> {
        let gather = bound(found, "gather")?;

        let (name, axis, inputs) = {
            let node = graph.require_node(gather)?;
            let axis = match node.attrs.get("axis") {
                None => 0,
                Some(value) => value.as_int().ok_or(TransformError::InvalidAttribute {
                    name: "axis".to_string(),
                    expected: "int",
                    found: value.kind().name(),
                })?,
            };
            (node.name().to_string(), axis, node.inputs().len())
        };
        if inputs > 2 && graph.input_connection(gather, 2).is_some() {
            return Err(TransformError::PortOccupied(
                graph.port_label(PortRef::input(gather, 2)),
            ));
        }

        let axis_const = graph.add_node(
            NodeDesc::new("Const")
                .name(&format!("{}/axis", name))
                .attr("value", AttrValue::Ints(vec![axis]))
                .ports(0, 1),
        );
        graph.annotate_output(PortRef::output(axis_const, 0), Annotation::value(vec![axis]))?;

        for _ in inputs..3 {
            graph.add_input_port(gather)?;
        }
        graph.connect(PortRef::output(axis_const, 0), PortRef::input(gather, 2))?;

        if let Some(node) = graph.node_mut(gather) {
            node.attrs.remove("axis");
        }
        set_op_type(graph, gather, "Gather")?;
        debug!("Moved axis {} of '{}' to a Const input", axis, name);
        Ok(())
    }
}
