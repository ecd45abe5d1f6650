//! Core traits for graph-canonicalizer
//!
//! Defines the interface implemented by the built-in canonicalization passes.

use crate::error::GraphResult;
use crate::graph::Graph;
use crate::pattern::{Match, Pattern};
use crate::transform::Pass;

/// A canonicalization pass written as a type
///
/// Implementors describe what they match and how they rewrite one match;
/// [`Transformer::into_pass`] turns them into the [`Pass`] data the
/// scheduler works with.
///
/// # Example
///
/// ```ignore
/// struct ReluToClamp;
///
/// impl Transformer for ReluToClamp {
///     fn name(&self) -> &'static str {
///         "ReluToClamp"
///     }
///
///     fn pattern(&self) -> Pattern {
///         Pattern::single("relu", "Relu")
///     }
///
///     fn rewrite(&self, graph: &mut Graph, m: &Match) -> GraphResult<()> {
///         // ...
///         Ok(())
///     }
/// }
/// ```
pub trait Transformer {
    /// Pass name used by ordering constraints
    fn name(&self) -> &'static str;

    /// Pattern whose matches are rewritten
    fn pattern(&self) -> Pattern;

    /// Passes that must run first
    fn runs_after(&self) -> &[&'static str] {
        &[]
    }

    /// Passes that must run later
    fn runs_before(&self) -> &[&'static str] {
        &[]
    }

    /// Rewrite one match
    fn rewrite(&self, graph: &mut Graph, found: &Match) -> GraphResult<()>;

    /// Package the transformer as a schedulable pass
    fn into_pass(self) -> Pass
    where
        Self: Sized + 'static,
    {
        let name = self.name();
        let pattern = self.pattern();
        let after: Vec<&'static str> = self.runs_after().to_vec();
        let before: Vec<&'static str> = self.runs_before().to_vec();

        let mut pass = Pass::new(name, pattern, move |graph, found| self.rewrite(graph, found));
        for other in after {
            pass = pass.runs_after(other);
        }
        for other in before {
            pass = pass.runs_before(other);
        }
        pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeDesc;
    use crate::transform::{PassRegistry, TransformEngine};

    struct ReluToClamp;

    impl Transformer for ReluToClamp {
        fn name(&self) -> &'static str {
            "ReluToClamp"
        }

        fn pattern(&self) -> Pattern {
            Pattern::single("relu", "Relu")
        }

        fn runs_after(&self) -> &[&'static str] {
            &["Setup"]
        }

        fn rewrite(&self, graph: &mut Graph, found: &Match) -> GraphResult<()> {
            if let Some(node) = found.get("relu").and_then(|id| graph.node_mut(id)) {
                node.op_type = "Clamp".to_string();
            }
            Ok(())
        }
    }

    #[test]
    fn test_into_pass() {
        let pass = ReluToClamp.into_pass();
        assert_eq!(pass.name(), "ReluToClamp");
        assert_eq!(pass.after(), ["Setup".to_string()]);
    }

    #[test]
    fn test_transformer_in_engine() {
        let registry = PassRegistry::new()
            .with(ReluToClamp.into_pass())
            .with(crate::transform::Pass::new(
                "Setup",
                Pattern::single("n", "Never"),
                |_, _| Ok(()),
            ));
        let engine = TransformEngine::new(&registry).unwrap();
        assert_eq!(engine.order(), vec!["Setup", "ReluToClamp"]);

        let mut graph = Graph::new();
        graph.add_node(NodeDesc::new("Relu").name("act"));
        engine.run(&mut graph).unwrap();
        assert_eq!(graph.node_by_name("act").unwrap().op_type, "Clamp");
    }
}
