//! Graph container
//!
//! `Graph` is the central structure of the pipeline. It owns every node and
//! connection and is the only place connection state is changed.

use crate::error::{GraphResult, TransformError};

use super::maps::{
    Annotation, Connection, ConnectionId, ConnectionMap, NameMap, Node, NodeId, NodeMap,
    PortDirection, PortRef,
};

/// Operator graph with explicit ports and connections
#[derive(Debug, Default, Clone)]
pub struct Graph {
    pub(crate) nodes: NodeMap,
    pub(crate) connections: ConnectionMap,
    pub(crate) names: NameMap,
    pub(crate) next_node: u32,
    pub(crate) next_connection: u32,
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Node accessors
    // ========================================================================

    /// Get a node by id
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Get a mutable node by id
    ///
    /// Type tag and attributes are editable this way; names, ports and
    /// annotations change only through the graph's mutation methods.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Get a node by id or fail with `NodeNotFound`
    pub fn require_node(&self, id: NodeId) -> GraphResult<&Node> {
        self.nodes
            .get(&id)
            .ok_or_else(|| TransformError::NodeNotFound(id.to_string()))
    }

    /// Mutable variant of [`Graph::require_node`]
    pub fn require_node_mut(&mut self, id: NodeId) -> GraphResult<&mut Node> {
        self.nodes
            .get_mut(&id)
            .ok_or_else(|| TransformError::NodeNotFound(id.to_string()))
    }

    /// Look up a node id by name
    pub fn id_of(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// Get a node by name
    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.id_of(name).and_then(|id| self.node(id))
    }

    /// Check if a node exists
    pub fn has_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Iterate over all nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Node ids in insertion order
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    // ========================================================================
    // Connection accessors
    // ========================================================================

    /// Get a connection by id
    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// Get a connection or fail with `ConnectionNotFound`
    pub fn require_connection(&self, id: ConnectionId) -> GraphResult<&Connection> {
        self.connections
            .get(&id)
            .ok_or_else(|| TransformError::ConnectionNotFound(id.to_string()))
    }

    /// Iterate over all connections in creation order
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Get the number of connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    // ========================================================================
    // Port accessors
    // ========================================================================

    /// Fail unless the port exists on an existing node
    pub fn check_port(&self, port: PortRef) -> GraphResult<()> {
        let node = self.require_node(port.node)?;
        let count = match port.direction {
            PortDirection::Input => node.inputs.len(),
            PortDirection::Output => node.outputs.len(),
        };
        if port.index >= count {
            return Err(TransformError::PortNotFound(format!(
                "{} on '{}' ({} ports)",
                port, node.name, count
            )));
        }
        Ok(())
    }

    /// Connection feeding an input port
    pub fn input_connection(&self, node: NodeId, index: usize) -> Option<ConnectionId> {
        self.node(node)?.in_port(index)?.connection
    }

    /// Source output port feeding an input port
    pub fn input_source(&self, node: NodeId, index: usize) -> Option<PortRef> {
        let conn = self.input_connection(node, index)?;
        self.connection(conn).map(|c| c.source)
    }

    /// Destination input ports fed by an output port
    pub fn output_destinations(&self, node: NodeId, index: usize) -> Vec<PortRef> {
        self.node(node)
            .and_then(|n| n.out_port(index))
            .map(|p| {
                p.connections
                    .iter()
                    .filter_map(|c| self.connection(*c))
                    .map(|c| c.destination)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Annotation of an output port
    pub fn output_annotation(&self, port: PortRef) -> Option<&Annotation> {
        if !port.is_output() {
            return None;
        }
        self.node(port.node)?.out_port(port.index)?.annotation.as_ref()
    }

    /// Annotation of the output port feeding an input port
    pub fn input_annotation(&self, node: NodeId, index: usize) -> Option<&Annotation> {
        let source = self.input_source(node, index)?;
        self.output_annotation(source)
    }
}
