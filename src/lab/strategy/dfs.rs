//! Exhaustive depth-first exploration.
//!
//! The strategy keeps one [`Branch`] per decision taken in the current
//! iteration. The next iteration re-executes the program from scratch,
//! answering every point of the stack identically until the deepest branch,
//! which advances to its next alternative. Deeper points are chosen fresh
//! (first alternative) and appended. When no branch has alternatives left
//! the tree is exhausted.

use crate::error::StrategyError;
use crate::lab::config::StrategyKind;
use crate::lab::strategy::{ChoiceRequest, SchedulingPoint, Strategy};
use crate::tracing_compat::trace;
use crate::types::ActorId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Branch {
    options: u64,
    chosen: u64,
}

/// Depth-first search over all decision sequences.
#[derive(Debug, Default)]
pub struct DfsStrategy {
    stack: Vec<Branch>,
    depth: usize,
    exhausted: bool,
}

impl DfsStrategy {
    /// Creates a strategy positioned at the root of the decision tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Depth of the decision stack after the last iteration.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Returns the index to take among `options` at the current depth.
    fn pick(&mut self, options: u64) -> Result<u64, StrategyError> {
        let depth = self.depth;
        self.depth += 1;
        if let Some(branch) = self.stack.get(depth) {
            if branch.options != options {
                return Err(StrategyError::Nondeterminism {
                    depth,
                    expected: branch.options,
                    observed: options,
                });
            }
            return Ok(branch.chosen);
        }
        self.stack.push(Branch { options, chosen: 0 });
        Ok(0)
    }

    /// Advances the deepest branch that still has alternatives and drops the
    /// exhausted ones beneath it.
    fn backtrack(&mut self) {
        while let Some(branch) = self.stack.last_mut() {
            if branch.chosen + 1 < branch.options {
                branch.chosen += 1;
                return;
            }
            self.stack.pop();
        }
        self.exhausted = true;
    }
}

impl Strategy for DfsStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Dfs
    }

    fn begin_iteration(&mut self, _iteration: u64) -> bool {
        self.depth = 0;
        !self.exhausted
    }

    fn next_actor(&mut self, point: &SchedulingPoint<'_>) -> Result<ActorId, StrategyError> {
        let index = self.pick(point.enabled.len() as u64)?;
        let position = usize::try_from(index).unwrap_or(usize::MAX);
        point
            .enabled
            .get(position)
            .copied()
            .ok_or(StrategyError::Divergence {
                point: point.index,
                reason: format!(
                    "branch index {index} outside an enabled set of {}",
                    point.enabled.len()
                ),
            })
    }

    fn next_choice(&mut self, request: &ChoiceRequest) -> Result<u64, StrategyError> {
        self.pick(request.bound)
    }

    fn finish_iteration(&mut self) -> Result<(), StrategyError> {
        // Points recorded beyond where this iteration stopped were never
        // reached; they belong to a different path.
        self.stack.truncate(self.depth);
        self.backtrack();
        trace!(depth = self.stack.len(), exhausted = self.exhausted, "dfs backtracked");
        Ok(())
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}
