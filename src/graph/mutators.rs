//! Graph mutation operations
//!
//! Every method validates its preconditions before touching any state, so a
//! failed call leaves the graph exactly as it was.

use log::debug;

use crate::error::{GraphResult, TransformError};

use super::attrs::Attributes;
use super::builder::NodeDesc;
use super::context::Graph;
use super::maps::{Annotation, Connection, ConnectionId, InputPort, Node, NodeId, OutputPort, PortRef};

/// How [`Graph::remove_node`] treats connections still attached to the node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemoveMode {
    /// Fail with `DanglingConnection` if any connection references the node
    #[default]
    Strict,
    /// Detach every connection first, leaving the neighbours' ports disconnected
    Cascade,
}

impl Graph {
    // ========================================================================
    // Node mutation
    // ========================================================================

    /// Create a port-less node with a generated name
    pub fn create_node(&mut self, op_type: &str, attrs: Attributes) -> NodeId {
        self.add_node(NodeDesc::new(op_type).attrs(attrs))
    }

    /// Create a node from a full description
    ///
    /// A requested name that is already taken gets a numeric suffix.
    pub fn add_node(&mut self, desc: NodeDesc) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;

        let base = desc
            .name
            .unwrap_or_else(|| format!("{}_{}", desc.op_type, id.0));
        let name = self.unique_name(&base);

        let mut node = Node::new(id, name.clone(), desc.op_type, desc.attrs);
        node.inputs.extend((0..desc.inputs).map(InputPort::new));
        node.outputs.extend((0..desc.outputs).map(OutputPort::new));

        debug!("Created node '{}' ({}) as {}", name, node.op_type, id);
        self.names.insert(name, id);
        self.nodes.insert(id, node);
        id
    }

    fn unique_name(&self, base: &str) -> String {
        if !self.names.contains_key(base) {
            return base.to_string();
        }
        let mut suffix = 1;
        loop {
            let candidate = format!("{}_{}", base, suffix);
            if !self.names.contains_key(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Append an input port, returning its index
    pub fn add_input_port(&mut self, id: NodeId) -> GraphResult<usize> {
        let node = self.require_node_mut(id)?;
        let index = node.inputs.len();
        node.inputs.push(InputPort::new(index));
        Ok(index)
    }

    /// Append an output port, returning its index
    pub fn add_output_port(&mut self, id: NodeId) -> GraphResult<usize> {
        let node = self.require_node_mut(id)?;
        let index = node.outputs.len();
        node.outputs.push(OutputPort::new(index));
        Ok(index)
    }

    /// Rename a node; the new name must be free
    pub fn rename_node(&mut self, id: NodeId, new_name: &str) -> GraphResult<()> {
        let old_name = self.require_node(id)?.name.clone();
        if old_name == new_name {
            return Ok(());
        }
        if self.names.contains_key(new_name) {
            return Err(TransformError::Internal(format!(
                "Cannot rename '{}': name '{}' is taken",
                old_name, new_name
            )));
        }

        self.names.remove(&old_name);
        self.names.insert(new_name.to_string(), id);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.name = new_name.to_string();
        }
        Ok(())
    }

    /// Remove a node from the graph
    pub fn remove_node(&mut self, id: NodeId, mode: RemoveMode) -> GraphResult<Node> {
        let (name, attached) = {
            let node = self.require_node(id)?;
            (node.name.clone(), node.connection_ids())
        };

        if !attached.is_empty() {
            match mode {
                RemoveMode::Strict => {
                    return Err(TransformError::DanglingConnection {
                        node: name,
                        connections: attached.len(),
                    });
                }
                RemoveMode::Cascade => {
                    for conn in attached {
                        self.disconnect(conn)?;
                    }
                }
            }
        }

        let node = self
            .nodes
            .shift_remove(&id)
            .ok_or_else(|| TransformError::NodeNotFound(id.to_string()))?;
        self.names.remove(&node.name);
        debug!("Removed node '{}' ({})", node.name, node.op_type);
        Ok(node)
    }

    // ========================================================================
    // Connection mutation
    // ========================================================================

    /// Connect an output port to an input port
    pub fn connect(&mut self, src: PortRef, dst: PortRef) -> GraphResult<ConnectionId> {
        if !src.is_output() {
            return Err(TransformError::IncompatiblePort(format!(
                "connection source {} is not an output port",
                self.port_label(src)
            )));
        }
        if !dst.is_input() {
            return Err(TransformError::IncompatiblePort(format!(
                "connection destination {} is not an input port",
                self.port_label(dst)
            )));
        }
        self.check_port(src)?;
        self.check_port(dst)?;
        self.ensure_input_free(dst)?;

        let id = ConnectionId(self.next_connection);
        self.next_connection += 1;

        if let Some(node) = self.nodes.get_mut(&src.node) {
            node.outputs[src.index].connections.push(id);
        }
        if let Some(node) = self.nodes.get_mut(&dst.node) {
            node.inputs[dst.index].connection = Some(id);
        }
        self.connections.insert(
            id,
            Connection {
                id,
                source: src,
                destination: dst,
            },
        );
        Ok(id)
    }

    /// Remove a connection, leaving both ends disconnected
    pub fn disconnect(&mut self, id: ConnectionId) -> GraphResult<Connection> {
        let conn = self
            .connections
            .shift_remove(&id)
            .ok_or_else(|| TransformError::ConnectionNotFound(id.to_string()))?;

        if let Some(port) = self
            .nodes
            .get_mut(&conn.source.node)
            .and_then(|n| n.outputs.get_mut(conn.source.index))
        {
            port.connections.retain(|c| *c != id);
        }
        if let Some(port) = self
            .nodes
            .get_mut(&conn.destination.node)
            .and_then(|n| n.inputs.get_mut(conn.destination.index))
        {
            port.connection = None;
        }
        Ok(conn)
    }

    /// Disconnect whatever feeds an input port
    pub fn disconnect_input(&mut self, node: NodeId, index: usize) -> GraphResult<Option<Connection>> {
        self.check_port(PortRef::input(node, index))?;
        match self.input_connection(node, index) {
            Some(conn) => self.disconnect(conn).map(Some),
            None => Ok(None),
        }
    }

    /// Atomically move the destination end of a connection
    ///
    /// The old destination is detached and the new one attached in one step.
    pub fn rewire_destination(&mut self, id: ConnectionId, new_dst: PortRef) -> GraphResult<()> {
        let old_dst = self.require_connection(id)?.destination;
        if !new_dst.is_input() {
            return Err(TransformError::IncompatiblePort(format!(
                "cannot retarget {} to {}: not an input port",
                id,
                self.port_label(new_dst)
            )));
        }
        self.check_port(new_dst)?;
        if new_dst == old_dst {
            return Ok(());
        }
        self.ensure_input_free(new_dst)?;

        if let Some(port) = self
            .nodes
            .get_mut(&old_dst.node)
            .and_then(|n| n.inputs.get_mut(old_dst.index))
        {
            port.connection = None;
        }
        if let Some(node) = self.nodes.get_mut(&new_dst.node) {
            node.inputs[new_dst.index].connection = Some(id);
        }
        if let Some(conn) = self.connections.get_mut(&id) {
            conn.destination = new_dst;
        }
        Ok(())
    }

    /// Atomically move the source end of a connection
    pub fn rewire_source(&mut self, id: ConnectionId, new_src: PortRef) -> GraphResult<()> {
        let old_src = self.require_connection(id)?.source;
        if !new_src.is_output() {
            return Err(TransformError::IncompatiblePort(format!(
                "cannot re-source {} from {}: not an output port",
                id,
                self.port_label(new_src)
            )));
        }
        self.check_port(new_src)?;
        if new_src == old_src {
            return Ok(());
        }

        if let Some(port) = self
            .nodes
            .get_mut(&old_src.node)
            .and_then(|n| n.outputs.get_mut(old_src.index))
        {
            port.connections.retain(|c| *c != id);
        }
        if let Some(node) = self.nodes.get_mut(&new_src.node) {
            node.outputs[new_src.index].connections.push(id);
        }
        if let Some(conn) = self.connections.get_mut(&id) {
            conn.source = new_src;
        }
        Ok(())
    }

    fn ensure_input_free(&self, dst: PortRef) -> GraphResult<()> {
        if let Some(existing) = self.input_connection(dst.node, dst.index) {
            return Err(TransformError::PortOccupied(format!(
                "{} already fed by {}",
                self.port_label(dst),
                existing
            )));
        }
        Ok(())
    }

    // ========================================================================
    // Annotation mutation
    // ========================================================================

    /// Set an output annotation for the first time
    pub fn annotate_output(&mut self, port: PortRef, annotation: Annotation) -> GraphResult<()> {
        if self.output_annotation(port).is_some() {
            return Err(TransformError::AnnotationAlreadySet(self.port_label(port)));
        }
        self.reannotate_output(port, annotation)
    }

    /// Overwrite an output annotation (explicit re-derivation by a pass)
    pub fn reannotate_output(&mut self, port: PortRef, annotation: Annotation) -> GraphResult<()> {
        if !port.is_output() {
            return Err(TransformError::IncompatiblePort(format!(
                "{} is not an output port",
                self.port_label(port)
            )));
        }
        self.check_port(port)?;
        if let Some(node) = self.nodes.get_mut(&port.node) {
            node.outputs[port.index].annotation = Some(annotation);
        }
        Ok(())
    }

    /// `name:in0` / `name:out1` label for messages
    pub fn port_label(&self, port: PortRef) -> String {
        match self.node(port.node) {
            Some(node) => {
                let side = if port.is_input() { "in" } else { "out" };
                format!("{}:{}{}", node.name, side, port.index)
            }
            None => port.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeDesc, PortRef};

    fn make_chain() -> (Graph, NodeId, NodeId, NodeId) {
        let mut graph = Graph::new();
        let a = graph.add_node(NodeDesc::new("Parameter").name("a").ports(0, 1));
        let b = graph.add_node(NodeDesc::new("Relu").name("b").ports(1, 1));
        let c = graph.add_node(NodeDesc::new("Relu").name("c").ports(1, 1));
        graph
            .connect(PortRef::output(a, 0), PortRef::input(b, 0))
            .unwrap();
        (graph, a, b, c)
    }

    #[test]
    fn test_create_node_unique_names() {
        let mut graph = Graph::new();
        let first = graph.add_node(NodeDesc::new("Relu").name("act"));
        let second = graph.add_node(NodeDesc::new("Relu").name("act"));
        let anon = graph.create_node("Const", Attributes::new());

        assert_eq!(graph.node(first).unwrap().name(), "act");
        assert_eq!(graph.node(second).unwrap().name(), "act_1");
        assert_eq!(graph.node(anon).unwrap().name(), "Const_2");
    }

    #[test]
    fn test_connect_port_occupied() {
        let (mut graph, a, b, _) = make_chain();
        let err = graph
            .connect(PortRef::output(a, 0), PortRef::input(b, 0))
            .unwrap_err();
        assert!(matches!(err, TransformError::PortOccupied(_)));
        assert_eq!(graph.connection_count(), 1);
    }

    #[test]
    fn test_connect_direction_mismatch() {
        let (mut graph, a, b, c) = make_chain();
        let err = graph
            .connect(PortRef::input(b, 0), PortRef::input(c, 0))
            .unwrap_err();
        assert!(matches!(err, TransformError::IncompatiblePort(_)));

        let err = graph
            .connect(PortRef::output(a, 0), PortRef::output(c, 0))
            .unwrap_err();
        assert!(matches!(err, TransformError::IncompatiblePort(_)));
    }

    #[test]
    fn test_output_fan_out() {
        let (mut graph, a, b, c) = make_chain();
        graph
            .connect(PortRef::output(a, 0), PortRef::input(c, 0))
            .unwrap();
        assert_eq!(
            graph.output_destinations(a, 0),
            vec![PortRef::input(b, 0), PortRef::input(c, 0)]
        );
    }

    #[test]
    fn test_remove_node_strict_and_cascade() {
        let (mut graph, a, b, _) = make_chain();

        let err = graph.remove_node(b, RemoveMode::Strict).unwrap_err();
        assert!(matches!(err, TransformError::DanglingConnection { connections: 1, .. }));
        assert!(graph.has_node(b));
        assert_eq!(graph.connection_count(), 1);

        let removed = graph.remove_node(b, RemoveMode::Cascade).unwrap();
        assert_eq!(removed.op_type, "Relu");
        assert!(!graph.has_node(b));
        assert_eq!(graph.connection_count(), 0);
        assert!(graph.node(a).unwrap().out_port(0).unwrap().is_disconnected());
        assert!(graph.id_of("b").is_none());
    }

    #[test]
    fn test_remove_self_loop_cascade() {
        let mut graph = Graph::new();
        let a = graph.add_node(NodeDesc::new("Relu").name("a").ports(1, 1));
        graph
            .connect(PortRef::output(a, 0), PortRef::input(a, 0))
            .unwrap();

        let err = graph.remove_node(a, RemoveMode::Strict).unwrap_err();
        assert!(matches!(err, TransformError::DanglingConnection { connections: 1, .. }));

        graph.remove_node(a, RemoveMode::Cascade).unwrap();
        assert!(!graph.has_node(a));
        assert_eq!(graph.connection_count(), 0);
    }

    #[test]
    fn test_rewire_destination_is_atomic() {
        let (mut graph, a, b, c) = make_chain();
        let conn = graph.input_connection(b, 0).unwrap();

        graph.rewire_destination(conn, PortRef::input(c, 0)).unwrap();

        assert!(graph.node(b).unwrap().in_port(0).unwrap().is_disconnected());
        assert_eq!(graph.input_source(c, 0), Some(PortRef::output(a, 0)));
        assert_eq!(graph.output_destinations(a, 0), vec![PortRef::input(c, 0)]);
    }

    #[test]
    fn test_rewire_destination_failures_leave_graph_intact() {
        let (mut graph, a, b, c) = make_chain();
        let conn = graph.input_connection(b, 0).unwrap();

        let err = graph
            .rewire_destination(conn, PortRef::output(c, 0))
            .unwrap_err();
        assert!(matches!(err, TransformError::IncompatiblePort(_)));

        graph
            .connect(PortRef::output(b, 0), PortRef::input(c, 0))
            .unwrap();
        let err = graph
            .rewire_destination(conn, PortRef::input(c, 0))
            .unwrap_err();
        assert!(matches!(err, TransformError::PortOccupied(_)));

        // Original wiring untouched
        assert_eq!(graph.input_source(b, 0), Some(PortRef::output(a, 0)));
        assert_eq!(graph.input_source(c, 0), Some(PortRef::output(b, 0)));
    }

    #[test]
    fn test_rewire_source() {
        let (mut graph, a, b, c) = make_chain();
        graph
            .connect(PortRef::output(b, 0), PortRef::input(c, 0))
            .unwrap();
        let conn = graph.input_connection(c, 0).unwrap();

        graph.rewire_source(conn, PortRef::output(a, 0)).unwrap();

        assert_eq!(graph.input_source(c, 0), Some(PortRef::output(a, 0)));
        assert!(graph.node(b).unwrap().out_port(0).unwrap().is_disconnected());
    }

    #[test]
    fn test_annotate_once() {
        let (mut graph, a, _, _) = make_chain();
        let port = PortRef::output(a, 0);

        graph.annotate_output(port, Annotation::shape(vec![1, 3])).unwrap();
        let err = graph
            .annotate_output(port, Annotation::shape(vec![1, 4]))
            .unwrap_err();
        assert!(matches!(err, TransformError::AnnotationAlreadySet(_)));

        graph
            .reannotate_output(port, Annotation::shape(vec![1, 4]))
            .unwrap();
        assert_eq!(
            graph.output_annotation(port).unwrap().shape,
            Some(vec![1, 4])
        );
    }

    #[test]
    fn test_rename_node() {
        let (mut graph, a, b, _) = make_chain();
        graph.rename_node(a, "input").unwrap();
        assert_eq!(graph.id_of("input"), Some(a));
        assert!(graph.id_of("a").is_none());
        assert!(graph.rename_node(b, "input").is_err());
    }
}
