//! Fake output resolution
//!
//! A `FakeOutput` marks a tensor the user asked to expose as a model output.
//! It is collapsed before the other canonicalization passes run.

use log::debug;

use crate::error::{GraphResult, TransformError};
use crate::graph::{Graph, PortRef, RemoveMode};
use crate::pattern::{Match, Pattern};
use crate::traits::Transformer;

use super::common::{bound, set_op_type};

/// Remove `FakeOutput` markers
///
/// When the producer has a single used output, the marker is bypassed: its
/// consumers are fed straight from the producer, which takes over the
/// marker's name. Otherwise the marker becomes an `Identity`.
#[derive(Debug, Default)]
pub struct FakeOutputResolver;

impl FakeOutputResolver {
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for FakeOutputResolver {
    fn name(&self) -> &'static str {
        "FakeOutputResolver"
    }

    fn pattern(&self) -> Pattern {
        Pattern::single("fake", "FakeOutput")
    }

    fn rewrite(&self, graph: &mut Graph, found: &Match) -> GraphResult<()> {
        let fake = bound(found, "fake")?;
        let (name, source, feed) = {
            let node = graph.require_node(fake)?;
            let feed = graph.input_connection(fake, 0).ok_or_else(|| {
                TransformError::ValidationFailed(format!("FakeOutput '{}' has no producer", node.name()))
            })?;
            (
                node.name().to_string(),
                graph.require_connection(feed)?.source,
                feed,
            )
        };

        let used_outputs = graph
            .require_node(source.node)?
            .outputs()
            .iter()
            .filter(|p| !p.is_disconnected())
            .count();

        if used_outputs != 1 {
            debug!("FakeOutput '{}' kept as Identity ({} used producer outputs)", name, used_outputs);
            return set_op_type(graph, fake, "Identity");
        }

        let consumers: Vec<_> = graph
            .require_node(fake)?
            .outputs()
            .iter()
            .flat_map(|p| p.connections().to_vec())
            .collect();
        for conn in consumers {
            graph.rewire_source(conn, source)?;
        }
        graph.disconnect(feed)?;

        graph.rename_node(fake, &format!("{}/TBD", name))?;
        graph.rename_node(source.node, &name)?;
        graph.remove_node(fake, RemoveMode::Strict)?;
        debug!("Bypassed FakeOutput '{}' via {}", name, PortRef::output(source.node, source.index));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeDesc, NodeId};
    use crate::transform::{run_pass, TransformConfig};

    fn make_graph(extra_output: bool) -> (Graph, NodeId, NodeId, NodeId) {
        let mut graph = Graph::new();
        let pool = graph.add_node(NodeDesc::new("Pooling").name("pool").ports(1, 2));
        let fake = graph.add_node(NodeDesc::new("FakeOutput").name("out").ports(1, 1));
        let result = graph.add_node(NodeDesc::new("Result").name("out/sink").ports(1, 0));
        graph
            .connect(PortRef::output(pool, 0), PortRef::input(fake, 0))
            .unwrap();
        graph
            .connect(PortRef::output(fake, 0), PortRef::input(result, 0))
            .unwrap();
        if extra_output {
            let relu = graph.add_node(NodeDesc::new("Relu").name("relu").ports(1, 1));
            graph
                .connect(PortRef::output(pool, 1), PortRef::input(relu, 0))
                .unwrap();
        }
        (graph, pool, fake, result)
    }

    #[test]
    fn test_bypass_single_output_producer() {
        let (mut graph, pool, fake, result) = make_graph(false);
        let pass = FakeOutputResolver::new().into_pass();
        let stats = run_pass(&pass, &mut graph, &TransformConfig::default()).unwrap();

        assert_eq!(stats.transforms_applied, 1);
        assert!(!graph.has_node(fake));
        assert_eq!(graph.input_source(result, 0), Some(PortRef::output(pool, 0)));
        // Producer takes over the output name
        assert_eq!(graph.node(pool).unwrap().name(), "out");
        assert!(graph.id_of("out/TBD").is_none());
    }

    #[test]
    fn test_identity_for_multi_output_producer() {
        let (mut graph, pool, fake, result) = make_graph(true);
        let pass = FakeOutputResolver::new().into_pass();
        run_pass(&pass, &mut graph, &TransformConfig::default()).unwrap();

        let node = graph.node(fake).unwrap();
        assert_eq!(node.op_type, "Identity");
        assert_eq!(node.name(), "out");
        assert_eq!(graph.input_source(result, 0), Some(PortRef::output(fake, 0)));
        assert_eq!(graph.node(pool).unwrap().name(), "pool");
    }

    #[test]
    fn test_dangling_marker_fails() {
        let mut graph = Graph::new();
        graph.add_node(NodeDesc::new("FakeOutput").name("out").ports(1, 1));
        let pass = FakeOutputResolver::new().into_pass();
        assert!(matches!(
            run_pass(&pass, &mut graph, &TransformConfig::default()),
            Err(TransformError::ValidationFailed(_))
        ));
    }
}
