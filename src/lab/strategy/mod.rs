//! Scheduling strategies.
//!
//! A strategy answers two kinds of question:
//!
//! - at a scheduling point, which enabled actor steps next
//! - at a choice request, which value a `random_bool`/`random_int` returns
//!
//! Every answer must be drawn from the offered set; the executor rejects
//! anything else with a configuration error. Strategies are deterministic
//! given their own state, so identical answers reproduce identical runs.

mod dfs;
mod random;
mod replay;

pub use dfs::DfsStrategy;
pub use random::RandomStrategy;
pub use replay::ReplayStrategy;

use crate::error::StrategyError;
use crate::lab::config::StrategyKind;
use crate::types::ActorId;

/// A point where the next actor to step must be chosen.
#[derive(Debug, Clone, Copy)]
pub struct SchedulingPoint<'a> {
    /// Index of the point within the iteration.
    pub index: u64,
    /// Enabled actors in ascending id order; never empty.
    pub enabled: &'a [ActorId],
}

impl<'a> SchedulingPoint<'a> {
    /// Creates a scheduling point.
    #[must_use]
    pub const fn new(index: u64, enabled: &'a [ActorId]) -> Self {
        Self { index, enabled }
    }
}

/// A nondeterministic choice requested by handler code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChoiceRequest {
    /// Index of the scheduling point this choice occupies.
    pub point: u64,
    /// The requesting actor.
    pub actor: ActorId,
    /// Exclusive upper bound on the returned value (2 for booleans).
    pub bound: u64,
    /// True for `random_bool`.
    pub boolean: bool,
}

/// Decides scheduling points and choices for one iteration at a time.
///
/// The engine calls [`begin_iteration`](Strategy::begin_iteration) before an
/// iteration and [`finish_iteration`](Strategy::finish_iteration) after it.
pub trait Strategy: Send {
    /// Which strategy this is.
    fn kind(&self) -> StrategyKind;

    /// Prepares iteration `iteration`. Returns `false` if the strategy has
    /// nothing left to explore.
    fn begin_iteration(&mut self, iteration: u64) -> bool;

    /// Seed of the current iteration, for randomized strategies.
    fn iteration_seed(&self) -> Option<u64> {
        None
    }

    /// Picks the next actor from `point.enabled`.
    fn next_actor(&mut self, point: &SchedulingPoint<'_>) -> Result<ActorId, StrategyError>;

    /// Picks a value in `0..request.bound`.
    fn next_choice(&mut self, request: &ChoiceRequest) -> Result<u64, StrategyError>;

    /// Called once the iteration has ended.
    fn finish_iteration(&mut self) -> Result<(), StrategyError>;

    /// True once no further iteration would explore anything new.
    fn is_exhausted(&self) -> bool;
}
