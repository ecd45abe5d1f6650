//! Canonical graph validation
//!
//! Checks the contract a serializer relies on once the passes have run.

use log::{debug, warn};

use crate::error::{GraphResult, TransformError};
use crate::graph::{Graph, PortDirection};

/// Validation result with detailed issues
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the graph is valid
    pub is_valid: bool,
    /// List of errors (contract violations)
    pub errors: Vec<String>,
    /// List of warnings (non-critical issues)
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
        self.is_valid = false;
    }

    /// Add a warning
    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    /// Merge with another result
    pub fn merge(&mut self, other: ValidationResult) {
        if !other.is_valid {
            self.is_valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

/// Collect every contract violation of a graph
///
/// Errors:
/// - a node with an empty type tag
/// - an output port with no consumer
/// - a connection whose ends are missing, point the wrong way, or are not
///   recorded on the ports they reference
///
/// Warnings:
/// - an output port without an annotation
pub fn validate_graph(graph: &Graph) -> ValidationResult {
    let mut result = ValidationResult::valid();
    result.merge(validate_nodes(graph));
    result.merge(validate_connections(graph));
    result
}

/// Validate a graph, failing with `ValidationFailed` on the first report
/// that contains errors
///
/// Warnings are logged and returned with the result.
pub fn check_canonical(graph: &Graph) -> GraphResult<ValidationResult> {
    let result = validate_graph(graph);
    for warning in &result.warnings {
        warn!("{}", warning);
    }
    if !result.is_valid {
        return Err(TransformError::ValidationFailed(result.errors.join("; ")));
    }
    debug!(
        "Graph is canonical: {} node(s), {} connection(s)",
        graph.node_count(),
        graph.connection_count()
    );
    Ok(result)
}

fn validate_nodes(graph: &Graph) -> ValidationResult {
    let mut result = ValidationResult::valid();

    for node in graph.nodes() {
        if node.op_type.is_empty() {
            result.add_error(format!("Node '{}' has empty type", node.name()));
        }

        for port in node.outputs() {
            if port.is_disconnected() {
                result.add_error(format!(
                    "Node '{}' ({}): output {} is neither connected nor terminated",
                    node.name(),
                    node.op_type,
                    port.index
                ));
            }
            if port.annotation().is_none() {
                result.add_warning(format!(
                    "Node '{}' ({}): output {} has no annotation",
                    node.name(),
                    node.op_type,
                    port.index
                ));
            }
        }
    }

    result
}

fn validate_connections(graph: &Graph) -> ValidationResult {
    let mut result = ValidationResult::valid();

    for conn in graph.connections() {
        if conn.source.direction != PortDirection::Output {
            result.add_error(format!("Connection {} starts at an input port", conn.id));
        }
        if conn.destination.direction != PortDirection::Input {
            result.add_error(format!("Connection {} ends at an output port", conn.id));
        }

        let source = graph
            .node(conn.source.node)
            .and_then(|n| n.out_port(conn.source.index));
        match source {
            Some(port) if port.connections().contains(&conn.id) => {}
            Some(_) => result.add_error(format!(
                "Connection {} is not recorded on its source {}",
                conn.id, conn.source
            )),
            None => result.add_error(format!(
                "Connection {} references missing source {}",
                conn.id, conn.source
            )),
        }

        let destination = graph
            .node(conn.destination.node)
            .and_then(|n| n.in_port(conn.destination.index));
        match destination {
            Some(port) if port.connection() == Some(conn.id) => {}
            Some(_) => result.add_error(format!(
                "Connection {} is not recorded on its destination {}",
                conn.id, conn.destination
            )),
            None => result.add_error(format!(
                "Connection {} references missing destination {}",
                conn.id, conn.destination
            )),
        }
    }

    result
}
