//! Graph storage types
//!
//! Defines identifiers, ports, nodes, connections and the maps the
//! [`Graph`](super::Graph) keeps them in.

use std::fmt;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::tensor::Shape;

use super::attrs::Attributes;

/// Stable node identity; never reused within one graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Stable connection identity; never reused within one graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub(crate) u32);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// Direction of a port relative to its node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortDirection {
    /// Consumes a tensor
    Input,
    /// Produces a tensor
    Output,
}

/// Address of a port: node, direction and index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortRef {
    /// Owning node
    pub node: NodeId,
    /// Input or output side
    pub direction: PortDirection,
    /// Port index on that side
    pub index: usize,
}

impl PortRef {
    /// Input port `index` of `node`
    pub fn input(node: NodeId, index: usize) -> Self {
        Self {
            node,
            direction: PortDirection::Input,
            index,
        }
    }

    /// Output port `index` of `node`
    pub fn output(node: NodeId, index: usize) -> Self {
        Self {
            node,
            direction: PortDirection::Output,
            index,
        }
    }

    pub fn is_input(&self) -> bool {
        self.direction == PortDirection::Input
    }

    pub fn is_output(&self) -> bool {
        self.direction == PortDirection::Output
    }
}

impl fmt::Display for PortRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.direction {
            PortDirection::Input => "in",
            PortDirection::Output => "out",
        };
        write!(f, "{}:{}{}", self.node, side, self.index)
    }
}

/// Inferred shape and/or constant value of an output port
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotation {
    /// Static shape, if known
    pub shape: Option<Shape>,
    /// Constant integer content, if the tensor is a compile-time value
    pub value: Option<Vec<i64>>,
}

impl Annotation {
    /// Annotation carrying only a shape
    pub fn shape(shape: Shape) -> Self {
        Self {
            shape: Some(shape),
            value: None,
        }
    }

    /// Annotation carrying a 1-D constant value (and its shape)
    pub fn value(value: Vec<i64>) -> Self {
        Self {
            shape: Some(vec![value.len() as i64]),
            value: Some(value),
        }
    }

    /// True if either shape or value is known
    pub fn is_resolved(&self) -> bool {
        self.shape.is_some() || self.value.is_some()
    }
}

/// Input port state
#[derive(Debug, Clone)]
pub struct InputPort {
    /// Fixed index
    pub index: usize,
    pub(crate) connection: Option<ConnectionId>,
}

impl InputPort {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            connection: None,
        }
    }

    /// The single incoming connection, if any
    pub fn connection(&self) -> Option<ConnectionId> {
        self.connection
    }

    pub fn is_disconnected(&self) -> bool {
        self.connection.is_none()
    }
}

/// Output port state
#[derive(Debug, Clone)]
pub struct OutputPort {
    /// Fixed index
    pub index: usize,
    pub(crate) connections: SmallVec<[ConnectionId; 2]>,
    pub(crate) annotation: Option<Annotation>,
}

impl OutputPort {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            connections: SmallVec::new(),
            annotation: None,
        }
    }

    /// Outgoing connections, in creation order
    pub fn connections(&self) -> &[ConnectionId] {
        &self.connections
    }

    pub fn is_disconnected(&self) -> bool {
        self.connections.is_empty()
    }

    /// Inferred annotation, if inference has run on this port
    pub fn annotation(&self) -> Option<&Annotation> {
        self.annotation.as_ref()
    }
}

/// A graph operator
///
/// `op_type` and `attrs` are freely mutable by passes. Port connection state
/// is owned by the graph and changes only through its mutation methods.
#[derive(Debug, Clone)]
pub struct Node {
    /// Identity
    pub id: NodeId,
    pub(crate) name: String,
    /// Operator type tag
    pub op_type: String,
    /// Operator attributes
    pub attrs: Attributes,
    pub(crate) inputs: SmallVec<[InputPort; 4]>,
    pub(crate) outputs: SmallVec<[OutputPort; 2]>,
}

impl Node {
    pub(crate) fn new(id: NodeId, name: String, op_type: String, attrs: Attributes) -> Self {
        Self {
            id,
            name,
            op_type,
            attrs,
            inputs: SmallVec::new(),
            outputs: SmallVec::new(),
        }
    }

    /// Unique, human readable name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inputs(&self) -> &[InputPort] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[OutputPort] {
        &self.outputs
    }

    pub fn in_port(&self, index: usize) -> Option<&InputPort> {
        self.inputs.get(index)
    }

    pub fn out_port(&self, index: usize) -> Option<&OutputPort> {
        self.outputs.get(index)
    }

    /// All connection ids touching this node (inputs first)
    ///
    /// A self-loop touches both sides but is listed once.
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        let mut ids: Vec<ConnectionId> = self.inputs.iter().filter_map(|p| p.connection).collect();
        for conn in self.outputs.iter().flat_map(|p| p.connections.iter().copied()) {
            if !ids.contains(&conn) {
                ids.push(conn);
            }
        }
        ids
    }

    /// Indices of output ports with no consumer
    pub fn disconnected_outputs(&self) -> Vec<usize> {
        self.outputs
            .iter()
            .filter(|p| p.is_disconnected())
            .map(|p| p.index)
            .collect()
    }
}

/// A directed edge from one output port to one input port
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    /// Identity
    pub id: ConnectionId,
    /// Producing output port
    pub source: PortRef,
    /// Consuming input port
    pub destination: PortRef,
}

/// Node storage: id → Node (insertion order preserved)
pub type NodeMap = IndexMap<NodeId, Node>;

/// Connection storage: id → Connection (insertion order preserved)
pub type ConnectionMap = IndexMap<ConnectionId, Connection>;

/// Name index: node name → id
pub type NameMap = FxHashMap<String, NodeId>;
