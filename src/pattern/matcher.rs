//! Generic pattern matcher
//!
//! Enumerates every injective assignment of pattern labels to graph nodes
//! that satisfies the node and edge constraints. Labels are assigned in
//! pattern order and candidates are tried in node insertion order, so the
//! discovery order of matches is deterministic.

use smallvec::SmallVec;

use crate::graph::{Graph, NodeId};

use super::ops::{EdgePattern, Pattern};

/// One successful assignment of pattern labels to nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    bindings: SmallVec<[(String, NodeId); 4]>,
}

impl Match {
    /// Node bound to a label
    pub fn get(&self, label: &str) -> Option<NodeId> {
        self.bindings
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, id)| *id)
    }

    /// Node bound to the first pattern label
    pub fn anchor(&self) -> Option<NodeId> {
        self.bindings.first().map(|(_, id)| *id)
    }

    /// Bound nodes in pattern order
    pub fn ids(&self) -> Vec<NodeId> {
        self.bindings.iter().map(|(_, id)| *id).collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Pattern matcher over a [`Graph`]
pub struct PatternMatcher<'a> {
    graph: &'a Graph,
}

impl<'a> PatternMatcher<'a> {
    /// Create a new pattern matcher
    pub fn new(graph: &'a Graph) -> Self {
        Self { graph }
    }

    /// All matches of a pattern, in discovery order
    pub fn find_all(&self, pattern: &Pattern) -> Vec<Match> {
        let candidates: Vec<Vec<NodeId>> = pattern
            .nodes
            .iter()
            .map(|p| {
                self.graph
                    .nodes()
                    .filter(|n| p.matches(n))
                    .map(|n| n.id)
                    .collect()
            })
            .collect();

        let mut results = Vec::new();
        let mut assigned: Vec<NodeId> = Vec::with_capacity(pattern.nodes.len());
        self.search(pattern, &candidates, &mut assigned, &mut results);
        results
    }

    /// First match whose anchor is `anchor`
    pub fn match_at(&self, pattern: &Pattern, anchor: NodeId) -> Option<Match> {
        self.find_all(pattern)
            .into_iter()
            .find(|m| m.anchor() == Some(anchor))
    }

    /// Check that a previously found match still holds
    ///
    /// Every bound node must still exist and satisfy its constraints, and
    /// every edge must still be present.
    pub fn still_matches(&self, pattern: &Pattern, found: &Match) -> bool {
        if found.len() != pattern.nodes.len() {
            return false;
        }
        let ids = found.ids();
        let nodes_hold = pattern.nodes.iter().zip(&ids).all(|(p, id)| {
            self.graph
                .node(*id)
                .map(|n| p.matches(n))
                .unwrap_or(false)
        });
        nodes_hold && pattern.edges.iter().all(|e| self.edge_holds(pattern, e, &ids))
    }

    fn search(
        &self,
        pattern: &Pattern,
        candidates: &[Vec<NodeId>],
        assigned: &mut Vec<NodeId>,
        results: &mut Vec<Match>,
    ) {
        let depth = assigned.len();
        if depth == pattern.nodes.len() {
            results.push(Match {
                bindings: pattern
                    .nodes
                    .iter()
                    .map(|p| p.label.clone())
                    .zip(assigned.iter().copied())
                    .collect(),
            });
            return;
        }

        for &id in &candidates[depth] {
            if assigned.contains(&id) {
                continue;
            }
            assigned.push(id);
            if self.edges_consistent(pattern, assigned) {
                self.search(pattern, candidates, assigned, results);
            }
            assigned.pop();
        }
    }

    /// Check the edges whose endpoints are both assigned
    fn edges_consistent(&self, pattern: &Pattern, assigned: &[NodeId]) -> bool {
        pattern.edges.iter().all(|edge| {
            match (pattern.position(&edge.from), pattern.position(&edge.to)) {
                (Some(from), Some(to)) if from < assigned.len() && to < assigned.len() => {
                    self.edge_holds(pattern, edge, assigned)
                }
                _ => true,
            }
        })
    }

    fn edge_holds(&self, pattern: &Pattern, edge: &EdgePattern, assigned: &[NodeId]) -> bool {
        let (Some(from), Some(to)) = (pattern.position(&edge.from), pattern.position(&edge.to)) else {
            return false;
        };
        let (src, dst) = (assigned[from], assigned[to]);
        self.graph.connections().any(|c| {
            c.source.node == src
                && c.destination.node == dst
                && edge.from_port.map_or(true, |p| p == c.source.index)
                && edge.to_port.map_or(true, |p| p == c.destination.index)
        })
    }
}

/// Convenience function to create a pattern matcher
pub fn matcher(graph: &Graph) -> PatternMatcher<'_> {
    PatternMatcher::new(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeDesc, PortRef};

    fn make_pool_relu_graph() -> (Graph, [NodeId; 4]) {
        let mut graph = Graph::new();
        let data = graph.add_node(NodeDesc::new("Parameter").name("data").ports(0, 1));
        let pool = graph.add_node(
            NodeDesc::new("Pooling")
                .name("pool")
                .attr("pool_method", "max")
                .ports(1, 2),
        );
        let relu_a = graph.add_node(NodeDesc::new("Relu").name("relu_a").ports(1, 1));
        let relu_b = graph.add_node(NodeDesc::new("Relu").name("relu_b").ports(1, 1));
        graph
            .connect(PortRef::output(data, 0), PortRef::input(pool, 0))
            .unwrap();
        graph
            .connect(PortRef::output(pool, 0), PortRef::input(relu_a, 0))
            .unwrap();
        graph
            .connect(PortRef::output(pool, 1), PortRef::input(relu_b, 0))
            .unwrap();
        (graph, [data, pool, relu_a, relu_b])
    }

    #[test]
    fn test_single_node_pattern() {
        let (graph, [_, _, relu_a, relu_b]) = make_pool_relu_graph();
        let matches = matcher(&graph).find_all(&Pattern::single("act", "Relu"));
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].get("act"), Some(relu_a));
        assert_eq!(matches[1].get("act"), Some(relu_b));
    }

    #[test]
    fn test_edge_port_constraint() {
        let (graph, [_, pool, _, relu_b]) = make_pool_relu_graph();
        let pattern = Pattern::builder()
            .node("pool", "Pooling")
            .attr_eq("pool_method", "max")
            .node("act", "Relu")
            .edge_ports("pool", 1, "act", 0)
            .build()
            .unwrap();

        let matches = matcher(&graph).find_all(&pattern);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].anchor(), Some(pool));
        assert_eq!(matches[0].get("act"), Some(relu_b));
    }

    #[test]
    fn test_any_port_edge() {
        let (graph, _) = make_pool_relu_graph();
        let pattern = Pattern::builder()
            .node("pool", "Pooling")
            .node("act", "Relu")
            .edge("pool", "act")
            .build()
            .unwrap();
        assert_eq!(matcher(&graph).find_all(&pattern).len(), 2);
    }

    #[test]
    fn test_injective_assignment() {
        let (graph, _) = make_pool_relu_graph();
        let pattern = Pattern::builder()
            .node("a", "Relu")
            .node("b", "Relu")
            .build()
            .unwrap();
        // (relu_a, relu_b) and (relu_b, relu_a), never a node twice
        let matches = matcher(&graph).find_all(&pattern);
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.get("a") != m.get("b")));
    }

    #[test]
    fn test_predicate_failure() {
        let (graph, _) = make_pool_relu_graph();
        let pattern = Pattern::builder()
            .node("pool", "Pooling")
            .attr_eq("pool_method", "avg")
            .build()
            .unwrap();
        assert!(matcher(&graph).find_all(&pattern).is_empty());
    }

    #[test]
    fn test_still_matches_after_mutation() {
        let (mut graph, [_, pool, _, _]) = make_pool_relu_graph();
        let pattern = Pattern::builder()
            .node("pool", "Pooling")
            .attr_eq("pool_method", "max")
            .build()
            .unwrap();
        let found = matcher(&graph).match_at(&pattern, pool).unwrap();
        assert!(matcher(&graph).still_matches(&pattern, &found));

        graph.node_mut(pool).unwrap().op_type = "MaxPool".to_string();
        assert!(!matcher(&graph).still_matches(&pattern, &found));
    }
}
