//! Common utilities for transformers
//!
//! Shared helper functions used across multiple passes.

use log::debug;

use crate::error::{GraphResult, TransformError};
use crate::graph::{Graph, NodeDesc, NodeId, PortRef};
use crate::pattern::Match;

/// Node bound to `label`, failing if the pattern did not bind it
pub fn bound(found: &Match, label: &str) -> GraphResult<NodeId> {
    found
        .get(label)
        .ok_or_else(|| TransformError::Internal(format!("pattern label '{}' is unbound", label)))
}

/// Change the type tag of a node
pub fn set_op_type(graph: &mut Graph, id: NodeId, op_type: &str) -> GraphResult<()> {
    let node = graph.require_node_mut(id)?;
    debug!("Retyping '{}' {} -> {}", node.name(), node.op_type, op_type);
    node.op_type = op_type.to_string();
    Ok(())
}

/// Remove attributes from a node, ignoring names that are absent
pub fn remove_attrs(graph: &mut Graph, id: NodeId, names: &[&str]) -> GraphResult<()> {
    let node = graph.require_node_mut(id)?;
    for name in names {
        node.attrs.remove(name);
    }
    Ok(())
}

/// Attach a `Result` terminal to every disconnected output port of a node
///
/// Returns the created terminals in port order.
pub fn terminate_disconnected_outputs(graph: &mut Graph, id: NodeId) -> GraphResult<Vec<NodeId>> {
    let ports: Vec<usize> = graph.require_node(id)?.disconnected_outputs();
    terminate_output_ports(graph, id, &ports)
}

/// Attach a `Result` terminal to each listed output port that is disconnected
///
/// The terminal of port `i` is named `<node>/Result_port_<i>/` and carries
/// `keep_output_port`, copied from the node's `remove_values_output` flag.
/// Connected ports are left alone.
pub fn terminate_output_ports(graph: &mut Graph, id: NodeId, ports: &[usize]) -> GraphResult<Vec<NodeId>> {
    let (name, keep_output_port, disconnected) = {
        let node = graph.require_node(id)?;
        for &index in ports {
            graph.check_port(PortRef::output(id, index))?;
        }
        (
            node.name().to_string(),
            node.attrs.has_and_set("remove_values_output"),
            node.disconnected_outputs(),
        )
    };

    let mut terminals = Vec::new();
    for &index in ports {
        if !disconnected.contains(&index) {
            continue;
        }
        let result = graph.add_node(
            NodeDesc::new("Result")
                .name(&format!("{}/Result_port_{}/", name, index))
                .attr("keep_output_port", keep_output_port)
                .ports(1, 0),
        );
        graph.connect(PortRef::output(id, index), PortRef::input(result, 0))?;
        debug!("Terminated {}:out{}", name, index);
        terminals.push(result);
    }
    Ok(terminals)
}
