//! Graph model
//!
//! This module provides the operator graph the pipeline works on:
//!
//! - [`Graph`]: owns nodes and connections, provides mutation primitives
//! - [`attrs`]: typed attribute values with explicit absence and deletion
//! - [`maps`]: identifiers, ports, nodes, connections
//!
//! # Overview
//!
//! Nodes have ordered input and output ports. An input port is fed by at most
//! one [`Connection`]; an output port may feed any number of them. Output
//! ports carry an [`Annotation`] (shape and/or constant value) once inference
//! has run.
//!
//! # Example
//!
//! ```ignore
//! use graph_canonicalizer::graph::{Graph, NodeDesc, PortRef, RemoveMode};
//!
//! let mut graph = Graph::new();
//! let data = graph.add_node(NodeDesc::new("Parameter").name("data").ports(0, 1));
//! let relu = graph.add_node(NodeDesc::new("Relu").ports(1, 1));
//! let conn = graph.connect(PortRef::output(data, 0), PortRef::input(relu, 0))?;
//!
//! // Move the consumer side somewhere else in one step
//! graph.rewire_destination(conn, PortRef::input(other, 0))?;
//! graph.remove_node(relu, RemoveMode::Strict)?;
//! ```
//!
//! # Invariants
//!
//! | Invariant | Enforced by |
//! |-----------|-------------|
//! | every connection has one existing output and one existing input end | `connect`, `remove_node` |
//! | an input port has at most one connection | `connect`, `rewire_destination` (`PortOccupied`) |
//! | failed mutations change nothing | validate-before-commit in `mutators` |
//! | annotations are set once | `annotate_output` (`AnnotationAlreadySet`) |

pub mod accessors;
pub mod attrs;
pub mod builder;
pub mod context;
pub mod maps;
pub mod mutators;

// Re-export main types
pub use attrs::{AttrKind, AttrValue, Attributes};
pub use builder::NodeDesc;
pub use context::Graph;
pub use maps::{
    Annotation, Connection, ConnectionId, InputPort, Node, NodeId, OutputPort, PortDirection,
    PortRef,
};
pub use mutators::RemoveMode;
