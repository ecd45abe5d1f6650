//! Declarative patterns
//!
//! A [`Pattern`] is plain data: labelled node constraints plus edges between
//! labels. It is evaluated by the generic matcher in [`super::matcher`].

use crate::error::{GraphResult, TransformError};
use crate::graph::{AttrKind, AttrValue, Attributes, Node};

/// Canonical pooling types
pub const POOL_OPS: &[&str] = &["Pooling", "MaxPool", "AvgPool"];

/// Condition on one attribute of a candidate node
#[derive(Debug, Clone, PartialEq)]
pub enum AttrPredicate {
    /// Attribute present and equal to the value
    Equals(String, AttrValue),
    /// Attribute present, any value
    Present(String),
    /// Attribute absent
    Absent(String),
    /// Attribute present and truthy
    IsSet(String),
    /// Attribute present with the given kind
    KindOf(String, AttrKind),
}

impl AttrPredicate {
    /// Check the predicate against an attribute set
    pub fn holds(&self, attrs: &Attributes) -> bool {
        match self {
            AttrPredicate::Equals(name, value) => attrs.get(name) == Some(value),
            AttrPredicate::Present(name) => attrs.contains(name),
            AttrPredicate::Absent(name) => !attrs.contains(name),
            AttrPredicate::IsSet(name) => attrs.has_and_set(name),
            AttrPredicate::KindOf(name, kind) => attrs.get(name).map(AttrValue::kind) == Some(*kind),
        }
    }
}

/// Constraint on one labelled node of a pattern
#[derive(Debug, Clone, PartialEq)]
pub struct NodePattern {
    /// Label used by edges and by [`super::Match::get`]
    pub label: String,
    /// Required type tag; `None` accepts any type
    pub op_type: Option<String>,
    /// Attribute predicates, all of which must hold
    pub predicates: Vec<AttrPredicate>,
}

impl NodePattern {
    /// Check a candidate node
    pub fn matches(&self, node: &Node) -> bool {
        if let Some(op_type) = &self.op_type {
            if &node.op_type != op_type {
                return false;
            }
        }
        self.predicates.iter().all(|p| p.holds(&node.attrs))
    }
}

/// Required connection between two labelled nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgePattern {
    /// Producer label
    pub from: String,
    /// Producer output port; `None` accepts any port
    pub from_port: Option<usize>,
    /// Consumer label
    pub to: String,
    /// Consumer input port; `None` accepts any port
    pub to_port: Option<usize>,
}

/// Node and edge constraints evaluated as a unit
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub(crate) nodes: Vec<NodePattern>,
    pub(crate) edges: Vec<EdgePattern>,
}

impl Pattern {
    /// Start building a pattern
    pub fn builder() -> PatternBuilder {
        PatternBuilder::new()
    }

    /// Single node of the given type
    pub fn single(label: &str, op_type: &str) -> Self {
        Self {
            nodes: vec![NodePattern {
                label: label.to_string(),
                op_type: Some(op_type.to_string()),
                predicates: Vec::new(),
            }],
            edges: Vec::new(),
        }
    }

    /// Attach a predicate to the last node
    pub fn with_predicate(mut self, predicate: AttrPredicate) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.predicates.push(predicate);
        }
        self
    }

    pub fn nodes(&self) -> &[NodePattern] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgePattern] {
        &self.edges
    }

    /// Label of the first node, which anchors every match
    pub fn anchor(&self) -> Option<&str> {
        self.nodes.first().map(|n| n.label.as_str())
    }

    pub(crate) fn position(&self, label: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.label == label)
    }
}

/// Builder for [`Pattern`]
///
/// Predicate methods apply to the most recently added node.
#[derive(Debug, Clone, Default)]
pub struct PatternBuilder {
    nodes: Vec<NodePattern>,
    edges: Vec<EdgePattern>,
}

impl PatternBuilder {
    /// Create a new pattern builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node of a given type
    pub fn node(mut self, label: &str, op_type: &str) -> Self {
        self.nodes.push(NodePattern {
            label: label.to_string(),
            op_type: Some(op_type.to_string()),
            predicates: Vec::new(),
        });
        self
    }

    /// Add a node of any type
    pub fn any_node(mut self, label: &str) -> Self {
        self.nodes.push(NodePattern {
            label: label.to_string(),
            op_type: None,
            predicates: Vec::new(),
        });
        self
    }

    /// Attach a predicate to the last node
    pub fn predicate(mut self, predicate: AttrPredicate) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.predicates.push(predicate);
        }
        self
    }

    pub fn attr_eq(self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.predicate(AttrPredicate::Equals(name.to_string(), value.into()))
    }

    pub fn attr_present(self, name: &str) -> Self {
        self.predicate(AttrPredicate::Present(name.to_string()))
    }

    pub fn attr_absent(self, name: &str) -> Self {
        self.predicate(AttrPredicate::Absent(name.to_string()))
    }

    pub fn attr_set(self, name: &str) -> Self {
        self.predicate(AttrPredicate::IsSet(name.to_string()))
    }

    pub fn attr_kind(self, name: &str, kind: AttrKind) -> Self {
        self.predicate(AttrPredicate::KindOf(name.to_string(), kind))
    }

    /// Require a connection from any output of `from` to any input of `to`
    pub fn edge(mut self, from: &str, to: &str) -> Self {
        self.edges.push(EdgePattern {
            from: from.to_string(),
            from_port: None,
            to: to.to_string(),
            to_port: None,
        });
        self
    }

    /// Require a connection between specific ports
    pub fn edge_ports(mut self, from: &str, from_port: usize, to: &str, to_port: usize) -> Self {
        self.edges.push(EdgePattern {
            from: from.to_string(),
            from_port: Some(from_port),
            to: to.to_string(),
            to_port: Some(to_port),
        });
        self
    }

    /// Finish the pattern
    ///
    /// Fails if it has no nodes, repeats a label, or has an edge naming an
    /// unknown label.
    pub fn build(self) -> GraphResult<Pattern> {
        if self.nodes.is_empty() {
            return Err(TransformError::Internal("pattern has no nodes".to_string()));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if self.nodes[..i].iter().any(|n| n.label == node.label) {
                return Err(TransformError::Internal(format!(
                    "pattern label '{}' used twice",
                    node.label
                )));
            }
        }
        for edge in &self.edges {
            for label in [&edge.from, &edge.to] {
                if !self.nodes.iter().any(|n| &n.label == label) {
                    return Err(TransformError::Internal(format!(
                        "pattern edge names unknown label '{}'",
                        label
                    )));
                }
            }
        }
        Ok(Pattern {
            nodes: self.nodes,
            edges: self.edges,
        })
    }
}

/// Check if a type is one of the canonical pooling types
pub fn is_pool_op(op_type: &str) -> bool {
    POOL_OPS.contains(&op_type)
}
