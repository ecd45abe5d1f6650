//! Inference function registry

use indexmap::IndexMap;
use log::debug;

use crate::error::GraphResult;
use crate::graph::{Annotation, Node};

use super::{ops, prior};

/// Output annotations of a node from the annotations of its input ports
///
/// `inputs` has one entry per input port; disconnected ports carry an empty
/// annotation. The result has one entry per output port.
pub type InferFn = fn(&Node, &[Annotation]) -> GraphResult<Vec<Annotation>>;

/// Inference functions keyed by canonical node type
#[derive(Debug, Clone, Default)]
pub struct InferenceRegistry {
    functions: IndexMap<String, InferFn>,
}

impl InferenceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in inference function
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register("Parameter", ops::infer_parameter)
            .register("Const", ops::infer_const)
            .register("ShapeOf", ops::infer_shape_of)
            .register("AttributedGather", ops::infer_attributed_gather)
            .register("Gather", ops::infer_gather)
            .register("Pooling", ops::infer_pooling)
            .register("MaxPool", ops::infer_pooling)
            .register("AvgPool", ops::infer_pooling)
            .register("MultiBoxPrior", prior::infer_multi_box_prior)
            .register("Result", ops::infer_result);
        for op in ops::ELEMENTWISE {
            registry.register(op, ops::infer_elementwise);
        }
        registry
    }

    /// Register (or replace) the function for a node type
    pub fn register(&mut self, op_type: &str, infer: InferFn) -> &mut Self {
        if self.functions.insert(op_type.to_string(), infer).is_some() {
            debug!("Overriding inference function for '{}'", op_type);
        }
        self
    }

    pub fn get(&self, op_type: &str) -> Option<InferFn> {
        self.functions.get(op_type).copied()
    }

    pub fn contains(&self, op_type: &str) -> bool {
        self.functions.contains_key(op_type)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let registry = InferenceRegistry::with_defaults();
        for op in ["Parameter", "Const", "Relu", "FakeOutput", "MaxPool", "MultiBoxPrior", "Result"] {
            assert!(registry.contains(op), "missing {}", op);
        }
        assert!(!registry.contains("Conv"));
    }

    #[test]
    fn test_override() {
        fn nothing(_: &Node, _: &[Annotation]) -> GraphResult<Vec<Annotation>> {
            Ok(vec![])
        }
        let mut registry = InferenceRegistry::with_defaults();
        let before = registry.len();
        registry.register("Relu", nothing);
        assert_eq!(registry.len(), before);
    }
}
