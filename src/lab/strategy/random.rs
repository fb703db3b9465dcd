//! Seeded random exploration.
//!
//! Iteration `i` draws from a generator seeded with `base + i`, so any single
//! iteration can be reproduced from the seed stored in its trace metadata.

use crate::error::StrategyError;
use crate::lab::config::StrategyKind;
use crate::lab::strategy::{ChoiceRequest, SchedulingPoint, Strategy};
use crate::types::ActorId;
use crate::util::DetRng;

/// Uniform random selection among the offered options.
#[derive(Debug, Clone)]
pub struct RandomStrategy {
    base_seed: u64,
    seed: u64,
    rng: DetRng,
}

impl RandomStrategy {
    /// Creates a strategy whose iteration `i` uses seed `base_seed + i`.
    #[must_use]
    pub const fn new(base_seed: u64) -> Self {
        Self {
            base_seed,
            seed: base_seed,
            rng: DetRng::from_mixed_seed(base_seed),
        }
    }

    /// Seed used by iteration `iteration`.
    #[must_use]
    pub const fn seed_for(&self, iteration: u64) -> u64 {
        self.base_seed.wrapping_add(iteration)
    }

    fn draw(&mut self, point: u64, options: u64) -> Result<u64, StrategyError> {
        if options == 0 {
            return Err(StrategyError::Divergence {
                point,
                reason: "no options offered".to_string(),
            });
        }
        Ok(self.rng.next_below(options))
    }
}

impl Strategy for RandomStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Random
    }

    fn begin_iteration(&mut self, iteration: u64) -> bool {
        self.seed = self.seed_for(iteration);
        self.rng = DetRng::from_mixed_seed(self.seed);
        true
    }

    fn iteration_seed(&self) -> Option<u64> {
        Some(self.seed)
    }

    fn next_actor(&mut self, point: &SchedulingPoint<'_>) -> Result<ActorId, StrategyError> {
        let index = self.draw(point.index, point.enabled.len() as u64)?;
        let position = usize::try_from(index).unwrap_or(usize::MAX);
        point
            .enabled
            .get(position)
            .copied()
            .ok_or(StrategyError::Divergence {
                point: point.index,
                reason: "random index outside the enabled set".to_string(),
            })
    }

    fn next_choice(&mut self, request: &ChoiceRequest) -> Result<u64, StrategyError> {
        self.draw(request.point, request.bound)
    }

    fn finish_iteration(&mut self) -> Result<(), StrategyError> {
        Ok(())
    }

    fn is_exhausted(&self) -> bool {
        false
    }
}
