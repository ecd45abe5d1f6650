//! Pass execution
//!
//! Runs scheduled passes over a graph. For each pass, matches are collected
//! up front, then each one is re-validated right before its mutation runs,
//! since an earlier mutation of the same pass may have removed or changed
//! it. After a mutation the match must no longer hold.

use log::{debug, info};

use crate::error::{GraphResult, TransformError};
use crate::graph::Graph;
use crate::pattern::PatternMatcher;

use super::pass::Pass;
use super::schedule::PassRegistry;

/// Transform configuration
#[derive(Debug, Clone)]
pub struct TransformConfig {
    /// Fail with `PassPostcondition` when a mutated match still matches
    pub verify_postconditions: bool,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            verify_postconditions: true,
        }
    }
}

/// Statistics from a transform run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransformStats {
    /// Number of passes executed
    pub passes_run: usize,
    /// Number of matches found when passes started
    pub patterns_matched: usize,
    /// Number of mutations applied
    pub transforms_applied: usize,
    /// Matches invalidated by an earlier mutation of the same pass
    pub stale_matches: usize,
    /// Anchor node names of applied mutations, in order
    pub transformed_nodes: Vec<String>,
}

impl TransformStats {
    /// Create empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful transformation
    pub fn record(&mut self, node_name: &str) {
        self.transforms_applied += 1;
        self.transformed_nodes.push(node_name.to_string());
    }

    /// Merge with another result
    pub fn merge(&mut self, other: TransformStats) {
        self.passes_run += other.passes_run;
        self.patterns_matched += other.patterns_matched;
        self.transforms_applied += other.transforms_applied;
        self.stale_matches += other.stale_matches;
        self.transformed_nodes.extend(other.transformed_nodes);
    }
}

/// Main transformation engine
///
/// The schedule is computed on construction, so ordering errors surface
/// before any graph is touched.
pub struct TransformEngine<'a> {
    registry: &'a PassRegistry,
    order: Vec<usize>,
    config: TransformConfig,
}

impl<'a> TransformEngine<'a> {
    /// Create an engine over the enabled passes of a registry
    pub fn new(registry: &'a PassRegistry) -> GraphResult<Self> {
        Ok(Self {
            registry,
            order: registry.schedule_indices()?,
            config: TransformConfig::default(),
        })
    }

    /// Configure the engine
    pub fn with_config(mut self, config: TransformConfig) -> Self {
        self.config = config;
        self
    }

    /// Pass names in execution order
    pub fn order(&self) -> Vec<&str> {
        self.order
            .iter()
            .map(|&i| self.registry.passes()[i].name())
            .collect()
    }

    /// Run every scheduled pass once, in order
    pub fn run(&self, graph: &mut Graph) -> GraphResult<TransformStats> {
        let mut total = TransformStats::new();
        for &i in &self.order {
            let pass = &self.registry.passes()[i];
            total.merge(run_pass(pass, graph, &self.config)?);
        }
        info!(
            "Ran {} pass(es): {} mutation(s), {} stale match(es)",
            total.passes_run, total.transforms_applied, total.stale_matches
        );
        Ok(total)
    }
}

/// Apply one pass to every match of its pattern
pub fn run_pass(pass: &Pass, graph: &mut Graph, config: &TransformConfig) -> GraphResult<TransformStats> {
    let mut stats = TransformStats {
        passes_run: 1,
        ..TransformStats::default()
    };

    let matches = PatternMatcher::new(graph).find_all(pass.pattern());
    stats.patterns_matched = matches.len();

    for found in matches {
        if !PatternMatcher::new(graph).still_matches(pass.pattern(), &found) {
            stats.stale_matches += 1;
            continue;
        }

        let anchor = found
            .anchor()
            .and_then(|id| graph.node(id))
            .map(|n| n.name().to_string())
            .unwrap_or_default();

        pass.apply(graph, &found)?;

        if config.verify_postconditions
            && PatternMatcher::new(graph).still_matches(pass.pattern(), &found)
        {
            return Err(TransformError::PassPostcondition {
                pass: pass.name().to_string(),
                node: anchor,
            });
        }

        debug!("Pass '{}' rewrote '{}'", pass.name(), anchor);
        stats.record(&anchor);
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeDesc, PortRef, RemoveMode};
    use crate::pattern::Pattern;

    fn make_relu_chain() -> Graph {
        let mut graph = Graph::new();
        let a = graph.add_node(NodeDesc::new("Relu").name("a").ports(1, 1));
        let b = graph.add_node(NodeDesc::new("Relu").name("b").ports(1, 1));
        graph
            .connect(PortRef::output(a, 0), PortRef::input(b, 0))
            .unwrap();
        graph
    }

    fn rename(from: &'static str, to: &'static str) -> impl Fn(&mut Graph, &crate::pattern::Match) -> GraphResult<()> {
        move |graph, m| {
            let id = m
                .get("n")
                .ok_or_else(|| TransformError::Internal("unbound".to_string()))?;
            let node = graph.require_node_mut(id)?;
            assert_eq!(node.op_type, from);
            node.op_type = to.to_string();
            Ok(())
        }
    }

    #[test]
    fn test_engine_runs_in_schedule_order() {
        let registry = PassRegistry::new()
            .with(Pass::new("Second", Pattern::single("n", "Clamp"), rename("Clamp", "Done")).runs_after("First"))
            .with(Pass::new("First", Pattern::single("n", "Relu"), rename("Relu", "Clamp")));
        let engine = TransformEngine::new(&registry).unwrap();
        assert_eq!(engine.order(), vec!["First", "Second"]);

        let mut graph = make_relu_chain();
        let stats = engine.run(&mut graph).unwrap();

        assert_eq!(stats.passes_run, 2);
        assert_eq!(stats.transforms_applied, 4);
        assert!(graph.nodes().all(|n| n.op_type == "Done"));
    }

    #[test]
    fn test_postcondition_violation() {
        let registry = PassRegistry::new().with(Pass::new(
            "Noop",
            Pattern::single("n", "Relu"),
            |_, _| Ok(()),
        ));
        let mut graph = make_relu_chain();
        let err = TransformEngine::new(&registry)
            .unwrap()
            .run(&mut graph)
            .unwrap_err();
        assert_eq!(
            err,
            TransformError::PassPostcondition {
                pass: "Noop".to_string(),
                node: "a".to_string()
            }
        );

        // Disabled check lets it through
        let stats = TransformEngine::new(&registry)
            .unwrap()
            .with_config(TransformConfig {
                verify_postconditions: false,
            })
            .run(&mut graph)
            .unwrap();
        assert_eq!(stats.transforms_applied, 2);
    }

    #[test]
    fn test_stale_match_skipped() {
        // Removing the downstream node invalidates its own pending match
        let pattern = Pattern::builder()
            .node("n", "Relu")
            .node("next", "Relu")
            .edge("n", "next")
            .build()
            .unwrap();
        let pass = Pass::new("DropConsumer", pattern, |graph, m| {
            if let Some(next) = m.get("next") {
                graph.remove_node(next, RemoveMode::Cascade)?;
            }
            Ok(())
        });

        let mut graph = make_relu_chain();
        let c = graph.add_node(NodeDesc::new("Relu").name("c").ports(1, 1));
        let b = graph.id_of("b").unwrap();
        graph
            .connect(PortRef::output(b, 0), PortRef::input(c, 0))
            .unwrap();

        let stats = run_pass(&pass, &mut graph, &TransformConfig::default()).unwrap();
        assert_eq!(stats.patterns_matched, 2);
        assert_eq!(stats.transforms_applied, 1);
        assert_eq!(stats.stale_matches, 1);
        assert!(graph.id_of("b").is_none());
    }

    #[test]
    fn test_cycle_fails_before_running() {
        let registry = PassRegistry::new()
            .with(Pass::new("A", Pattern::single("n", "Relu"), rename("Relu", "X")).runs_after("B"))
            .with(Pass::new("B", Pattern::single("n", "Relu"), rename("Relu", "Y")).runs_after("A"));
        assert!(matches!(
            TransformEngine::new(&registry),
            Err(TransformError::CyclicPassDependency(_))
        ));
    }
}
