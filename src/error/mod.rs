//! Error types for graph-canonicalizer
//!
//! One enum covers every stage of the pipeline. Extraction, inference,
//! scheduling and graph-mutation failures are all fatal for the current run
//! and propagate to the caller unchanged.

use thiserror::Error;

/// Main error type for graph transformation operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    /// A required attribute is absent from a source record
    #[error("Missing required attribute: {0}")]
    MissingAttribute(String),

    /// An attribute is present but holds the wrong kind of value
    #[error("Invalid attribute '{name}': expected {expected}, got {found}")]
    InvalidAttribute {
        /// Attribute name
        name: String,
        /// Expected value kind
        expected: &'static str,
        /// Actual value kind
        found: &'static str,
    },

    /// No enabled extractor is registered for the operator
    #[error("Unsupported operator '{op}' for format {format}")]
    UnsupportedOperator {
        /// Source format name
        format: String,
        /// Operator type name in the source format
        op: String,
    },

    /// Shape inference failed
    #[error("Shape inference failed: {0}")]
    ShapeInferenceFailed(String),

    /// Inference tried to annotate an output port twice
    #[error("Output annotation already set for {0}")]
    AnnotationAlreadySet(String),

    /// Pass ordering constraints contain a cycle
    #[error("Cyclic pass dependency among: {}", .0.join(", "))]
    CyclicPassDependency(Vec<String>),

    /// An ordering constraint names a pass that was never registered
    #[error("Pass '{pass}' references unknown pass '{missing}'")]
    UnknownPass {
        /// Pass declaring the constraint
        pass: String,
        /// Name that could not be resolved
        missing: String,
    },

    /// A mutation left its node still matching the pass pattern
    #[error("Pass '{pass}' left node '{node}' matching its own pattern")]
    PassPostcondition {
        /// Pass name
        pass: String,
        /// Anchor node name
        node: String,
    },

    /// Destination input port already has a connection
    #[error("Port occupied: {0}")]
    PortOccupied(String),

    /// Port direction does not fit the requested operation
    #[error("Incompatible port: {0}")]
    IncompatiblePort(String),

    /// Node removal would leave connections referencing it
    #[error("Node '{node}' still has {connections} connection(s)")]
    DanglingConnection {
        /// Node name
        node: String,
        /// Number of live connections
        connections: usize,
    },

    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Port index out of range for the node
    #[error("Port not found: {0}")]
    PortNotFound(String),

    /// Connection not found
    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    /// Canonical graph validation failed
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for graph operations
pub type GraphResult<T> = Result<T, TransformError>;
