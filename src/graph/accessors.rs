//! Higher level graph queries
//!
//! Lookup helpers used by inference, passes and validation.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::error::{GraphResult, TransformError};

use super::context::Graph;
use super::maps::{Node, NodeId, PortRef};

impl Graph {
    // ========================================================================
    // Type queries
    // ========================================================================

    /// Find nodes by op type
    pub fn find_nodes_by_type(&self, op_type: &str) -> Vec<&Node> {
        self.nodes().filter(|n| n.op_type == op_type).collect()
    }

    /// Find nodes matching any of the given op types
    pub fn find_nodes_by_types(&self, op_types: &[&str]) -> Vec<&Node> {
        self.nodes()
            .filter(|n| op_types.contains(&n.op_type.as_str()))
            .collect()
    }

    // ========================================================================
    // Neighbourhood
    // ========================================================================

    /// Node producing the tensor consumed at an input port
    pub fn producer_of(&self, node: NodeId, index: usize) -> Option<&Node> {
        self.input_source(node, index)
            .and_then(|src| self.node(src.node))
    }

    /// Nodes consuming an output port
    pub fn consumers_of(&self, node: NodeId, index: usize) -> Vec<&Node> {
        self.output_destinations(node, index)
            .into_iter()
            .filter_map(|dst| self.node(dst.node))
            .collect()
    }

    /// Check if `second` consumes any output of `first`
    pub fn are_connected(&self, first: NodeId, second: NodeId) -> bool {
        self.connections()
            .any(|c| c.source.node == first && c.destination.node == second)
    }

    /// Every disconnected output port in the graph, in node order
    pub fn disconnected_output_ports(&self) -> Vec<PortRef> {
        self.nodes()
            .flat_map(|n| {
                n.disconnected_outputs()
                    .into_iter()
                    .map(move |i| PortRef::output(n.id, i))
            })
            .collect()
    }

    /// Count disconnected output ports on nodes of a given type
    pub fn count_disconnected_outputs_of_type(&self, op_type: &str) -> usize {
        self.find_nodes_by_type(op_type)
            .iter()
            .map(|n| n.disconnected_outputs().len())
            .sum()
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    /// Topological order of nodes (Kahn's algorithm)
    ///
    /// Ready nodes are taken in insertion order. Fails if the graph has a
    /// cycle.
    pub fn topological_order(&self) -> GraphResult<Vec<NodeId>> {
        let mut in_degree: FxHashMap<NodeId, usize> = FxHashMap::default();
        for node in self.nodes() {
            let preds = node.inputs().iter().filter(|p| !p.is_disconnected()).count();
            in_degree.insert(node.id, preds);
        }

        let mut queue: VecDeque<NodeId> = self
            .nodes()
            .filter(|n| in_degree.get(&n.id) == Some(&0))
            .map(|n| n.id)
            .collect();
        let mut order = Vec::with_capacity(self.node_count());

        while let Some(id) = queue.pop_front() {
            order.push(id);
            let Some(node) = self.node(id) else {
                continue;
            };
            for port in node.outputs() {
                for conn in port.connections() {
                    let Some(conn) = self.connection(*conn) else {
                        continue;
                    };
                    if let Some(count) = in_degree.get_mut(&conn.destination.node) {
                        *count = count.saturating_sub(1);
                        if *count == 0 {
                            queue.push_back(conn.destination.node);
                        }
                    }
                }
            }
        }

        if order.len() != self.node_count() {
            let stuck: Vec<&str> = self
                .nodes()
                .filter(|n| !order.contains(&n.id))
                .map(|n| n.name())
                .collect();
            return Err(TransformError::ValidationFailed(format!(
                "graph contains a cycle through: {}",
                stuck.join(", ")
            )));
        }

        Ok(order)
    }
}
