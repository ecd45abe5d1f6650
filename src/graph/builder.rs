//! Node descriptions used to create nodes

use super::attrs::{AttrValue, Attributes};

/// Everything needed to create a node: type, name, attributes, port counts
#[derive(Debug, Clone, Default)]
pub struct NodeDesc {
    /// Operator type tag
    pub op_type: String,
    /// Requested name; a unique one is derived from `op_type` when `None`
    pub name: Option<String>,
    /// Initial attributes
    pub attrs: Attributes,
    /// Number of input ports
    pub inputs: usize,
    /// Number of output ports
    pub outputs: usize,
}

impl NodeDesc {
    /// Describe a node of the given type with no ports
    pub fn new(op_type: &str) -> Self {
        Self {
            op_type: op_type.to_string(),
            ..Default::default()
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn attr(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.attrs.set(name, value);
        self
    }

    pub fn attrs(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }

    /// Set input and output port counts
    pub fn ports(mut self, inputs: usize, outputs: usize) -> Self {
        self.inputs = inputs;
        self.outputs = outputs;
        self
    }
}
