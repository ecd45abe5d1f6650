//! Pass definition
//!
//! A pass is data: a name, an enabled flag, a pattern, ordering constraints
//! and a mutation closure applied once per match.

use std::fmt;

use crate::error::GraphResult;
use crate::graph::Graph;
use crate::pattern::{Match, Pattern};

/// Mutation applied to each match of a pass
pub type Mutation = Box<dyn Fn(&mut Graph, &Match) -> GraphResult<()>>;

/// One canonicalization pass
pub struct Pass {
    name: String,
    enabled: bool,
    pattern: Pattern,
    runs_after: Vec<String>,
    runs_before: Vec<String>,
    mutation: Mutation,
}

impl Pass {
    /// Create an enabled pass without ordering constraints
    pub fn new<F>(name: &str, pattern: Pattern, mutation: F) -> Self
    where
        F: Fn(&mut Graph, &Match) -> GraphResult<()> + 'static,
    {
        Self {
            name: name.to_string(),
            enabled: true,
            pattern,
            runs_after: Vec::new(),
            runs_before: Vec::new(),
            mutation: Box::new(mutation),
        }
    }

    /// This pass must run after `other`
    pub fn runs_after(mut self, other: &str) -> Self {
        self.runs_after.push(other.to_string());
        self
    }

    /// This pass must run before `other`
    pub fn runs_before(mut self, other: &str) -> Self {
        self.runs_before.push(other.to_string());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn after(&self) -> &[String] {
        &self.runs_after
    }

    pub fn before(&self) -> &[String] {
        &self.runs_before
    }

    /// Run the mutation on one match
    pub fn apply(&self, graph: &mut Graph, found: &Match) -> GraphResult<()> {
        (self.mutation)(graph, found)
    }
}

impl fmt::Debug for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pass")
            .field("name", &self.name)
            .field("enabled", &self.enabled)
            .field("pattern", &self.pattern)
            .field("runs_after", &self.runs_after)
            .field("runs_before", &self.runs_before)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeDesc;
    use crate::pattern::matcher;

    #[test]
    fn test_pass_builder() {
        let pass = Pass::new("Rename", Pattern::single("n", "Relu"), |_, _| Ok(()))
            .runs_after("A")
            .runs_before("B")
            .enabled(false);

        assert_eq!(pass.name(), "Rename");
        assert!(!pass.is_enabled());
        assert_eq!(pass.after(), ["A".to_string()]);
        assert_eq!(pass.before(), ["B".to_string()]);
    }

    #[test]
    fn test_pass_apply() {
        let mut graph = Graph::new();
        graph.add_node(NodeDesc::new("Relu").name("act"));
        let pass = Pass::new("ToClamp", Pattern::single("n", "Relu"), |graph, m| {
            if let Some(node) = m.get("n").and_then(|id| graph.node_mut(id)) {
                node.op_type = "Clamp".to_string();
            }
            Ok(())
        });

        let found = matcher(&graph).find_all(pass.pattern());
        pass.apply(&mut graph, &found[0]).unwrap();
        assert_eq!(graph.node_by_name("act").unwrap().op_type, "Clamp");
    }
}
