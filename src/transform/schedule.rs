//! Pass registration and ordering
//!
//! Passes are registered in declaration order. [`PassRegistry::schedule`]
//! turns the `runs_after`/`runs_before` constraints of the enabled passes
//! into a total order (Kahn's algorithm, ties broken by declaration order).

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::error::{GraphResult, TransformError};

use super::pass::Pass;

/// Explicit registration table of passes
#[derive(Debug, Default)]
pub struct PassRegistry {
    passes: Vec<Pass>,
}

impl PassRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pass (builder style)
    pub fn with(mut self, pass: Pass) -> Self {
        self.passes.push(pass);
        self
    }

    /// Register a pass
    pub fn register(&mut self, pass: Pass) -> &mut Self {
        self.passes.push(pass);
        self
    }

    /// Enable or disable a pass by name; returns false if it does not exist
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.passes.iter_mut().find(|p| p.name() == name) {
            Some(pass) => {
                pass.set_enabled(enabled);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Pass> {
        self.passes.iter().find(|p| p.name() == name)
    }

    /// Passes in declaration order
    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Enabled passes in execution order
    pub fn schedule(&self) -> GraphResult<Vec<&Pass>> {
        Ok(self
            .schedule_indices()?
            .into_iter()
            .map(|i| &self.passes[i])
            .collect())
    }

    /// Names of the enabled passes in execution order
    pub fn schedule_names(&self) -> GraphResult<Vec<String>> {
        Ok(self
            .schedule()?
            .into_iter()
            .map(|p| p.name().to_string())
            .collect())
    }

    pub(crate) fn schedule_indices(&self) -> GraphResult<Vec<usize>> {
        let mut index: FxHashMap<&str, usize> = FxHashMap::default();
        for (i, pass) in self.passes.iter().enumerate() {
            if index.insert(pass.name(), i).is_some() {
                return Err(TransformError::Internal(format!(
                    "pass '{}' registered twice",
                    pass.name()
                )));
            }
        }

        // successors[i]: passes that must run after pass i
        let count = self.passes.len();
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); count];
        let mut in_degree = vec![0usize; count];

        for (i, pass) in self.passes.iter().enumerate() {
            if !pass.is_enabled() {
                continue;
            }
            let constraints = pass
                .after()
                .iter()
                .map(|other| (other, true))
                .chain(pass.before().iter().map(|other| (other, false)));

            for (other, after) in constraints {
                let j = *index.get(other.as_str()).ok_or_else(|| TransformError::UnknownPass {
                    pass: pass.name().to_string(),
                    missing: other.clone(),
                })?;
                if !self.passes[j].is_enabled() {
                    warn!(
                        "Dropping ordering constraint of '{}' on disabled pass '{}'",
                        pass.name(),
                        other
                    );
                    continue;
                }
                let (first, second) = if after { (j, i) } else { (i, j) };
                if !successors[first].contains(&second) {
                    successors[first].push(second);
                    in_degree[second] += 1;
                }
            }
        }

        let enabled: Vec<usize> = (0..count).filter(|&i| self.passes[i].is_enabled()).collect();
        let mut ready: BinaryHeap<Reverse<usize>> = enabled
            .iter()
            .filter(|&&i| in_degree[i] == 0)
            .map(|&i| Reverse(i))
            .collect();
        let mut order = Vec::with_capacity(enabled.len());

        while let Some(Reverse(i)) = ready.pop() {
            order.push(i);
            for &next in &successors[i] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.push(Reverse(next));
                }
            }
        }

        if order.len() != enabled.len() {
            let involved = self.cycle_members(&enabled, &order, &successors);
            return Err(TransformError::CyclicPassDependency(involved));
        }

        debug!(
            "Pass schedule: {}",
            order
                .iter()
                .map(|&i| self.passes[i].name())
                .collect::<Vec<_>>()
                .join(" -> ")
        );
        Ok(order)
    }

    /// Unscheduled passes that lie on a cycle
    ///
    /// Passes that only hang off a cycle are pruned by repeatedly removing
    /// unscheduled passes with no unscheduled successor.
    fn cycle_members(&self, enabled: &[usize], order: &[usize], successors: &[Vec<usize>]) -> Vec<String> {
        let mut remaining: Vec<usize> = enabled.iter().copied().filter(|i| !order.contains(i)).collect();
        loop {
            let before = remaining.len();
            let snapshot = remaining.clone();
            remaining.retain(|i| successors[*i].iter().any(|s| snapshot.contains(s)));
            if remaining.len() == before {
                break;
            }
        }
        remaining
            .into_iter()
            .map(|i| self.passes[i].name().to_string())
            .collect()
    }
}
