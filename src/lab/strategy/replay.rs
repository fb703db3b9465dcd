//! Trace replay.
//!
//! Answers every point with the recorded decision, after checking that the
//! execution still looks the way it did when the trace was captured: same
//! point index, same enabled set, same kind of decision.

use crate::error::StrategyError;
use crate::lab::config::StrategyKind;
use crate::lab::strategy::{ChoiceRequest, SchedulingPoint, Strategy};
use crate::trace::{ChoiceValue, Decision, ScheduleDecision, Trace};
use crate::types::ActorId;

/// Re-executes a recorded trace.
#[derive(Debug, Clone)]
pub struct ReplayStrategy {
    trace: Trace,
    cursor: usize,
    done: bool,
}

impl ReplayStrategy {
    /// Creates a strategy that replays `trace` once.
    #[must_use]
    pub const fn new(trace: Trace) -> Self {
        Self {
            trace,
            cursor: 0,
            done: false,
        }
    }

    /// The trace being replayed.
    #[must_use]
    pub const fn trace(&self) -> &Trace {
        &self.trace
    }

    fn next_record(&mut self, point: u64) -> Result<&ScheduleDecision, StrategyError> {
        let record = self
            .trace
            .decisions()
            .get(self.cursor)
            .ok_or(StrategyError::TraceExhausted { point })?;
        self.cursor += 1;
        if record.point != point {
            return Err(StrategyError::Divergence {
                point,
                reason: format!("recorded decision belongs to point {}", record.point),
            });
        }
        Ok(record)
    }
}

impl Strategy for ReplayStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Replay
    }

    fn begin_iteration(&mut self, _iteration: u64) -> bool {
        if self.done {
            return false;
        }
        self.cursor = 0;
        true
    }

    fn iteration_seed(&self) -> Option<u64> {
        self.trace.metadata().seed
    }

    fn next_actor(&mut self, point: &SchedulingPoint<'_>) -> Result<ActorId, StrategyError> {
        let record = self.next_record(point.index)?;
        let Decision::NextActor { actor } = record.decision else {
            return Err(StrategyError::Divergence {
                point: point.index,
                reason: "expected a choice, got an actor scheduling point".to_string(),
            });
        };
        if record.enabled != point.enabled {
            return Err(StrategyError::Divergence {
                point: point.index,
                reason: format!(
                    "enabled set {:?} differs from recorded {:?}",
                    point.enabled, record.enabled
                ),
            });
        }
        Ok(actor)
    }

    fn next_choice(&mut self, request: &ChoiceRequest) -> Result<u64, StrategyError> {
        let record = self.next_record(request.point)?;
        let Decision::Choice { actor, value } = record.decision else {
            return Err(StrategyError::Divergence {
                point: request.point,
                reason: "expected an actor scheduling point, got a choice".to_string(),
            });
        };
        if actor != request.actor {
            return Err(StrategyError::Divergence {
                point: request.point,
                reason: format!("choice requested by {}, recorded for {actor}", request.actor),
            });
        }
        match value {
            ChoiceValue::Bool(flag) if request.boolean => Ok(u64::from(flag)),
            ChoiceValue::Int { value, bound } if !request.boolean && bound == request.bound => {
                Ok(value)
            }
            recorded => Err(StrategyError::Divergence {
                point: request.point,
                reason: format!(
                    "recorded choice {recorded:?} does not fit a request with bound {}",
                    request.bound
                ),
            }),
        }
    }

    fn finish_iteration(&mut self) -> Result<(), StrategyError> {
        self.done = true;
        let remaining = self.trace.len().saturating_sub(self.cursor);
        if remaining > 0 {
            return Err(StrategyError::TraceNotConsumed { remaining });
        }
        Ok(())
    }

    fn is_exhausted(&self) -> bool {
        self.done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::TraceMetadata;

    fn recorded() -> Trace {
        let a = ActorId::new_for_test(0);
        let b = ActorId::new_for_test(1);
        let mut trace = Trace::new(TraceMetadata::new(StrategyKind::Random, Some(4), 0));
        trace.push(ScheduleDecision::new(
            0,
            Decision::NextActor { actor: b },
            vec![a, b],
        ));
        trace.push(ScheduleDecision::new(
            1,
            Decision::Choice {
                actor: b,
                value: ChoiceValue::Bool(true),
            },
            vec![b],
        ));
        trace
    }

    #[test]
    fn replays_recorded_decisions() {
        let ids = [ActorId::new_for_test(0), ActorId::new_for_test(1)];
        let mut strategy = ReplayStrategy::new(recorded());
        assert!(strategy.begin_iteration(0));
        assert_eq!(strategy.iteration_seed(), Some(4));
        let actor = strategy
            .next_actor(&SchedulingPoint::new(0, &ids))
            .expect("actor");
        assert_eq!(actor, ids[1]);
        let value = strategy
            .next_choice(&ChoiceRequest {
                point: 1,
                actor: ids[1],
                bound: 2,
                boolean: true,
            })
            .expect("choice");
        assert_eq!(value, 1);
        strategy.finish_iteration().expect("consumed");
        assert!(strategy.is_exhausted());
        assert!(!strategy.begin_iteration(1));
    }

    #[test]
    fn enabled_set_mismatch_diverges() {
        let only_a = [ActorId::new_for_test(0)];
        let mut strategy = ReplayStrategy::new(recorded());
        strategy.begin_iteration(0);
        let err = strategy
            .next_actor(&SchedulingPoint::new(0, &only_a))
            .expect_err("diverged");
        assert!(matches!(err, StrategyError::Divergence { point: 0, .. }));
    }

    #[test]
    fn leftover_and_missing_decisions() {
        let ids = [ActorId::new_for_test(0), ActorId::new_for_test(1)];
        let mut strategy = ReplayStrategy::new(recorded());
        strategy.begin_iteration(0);
        strategy
            .next_actor(&SchedulingPoint::new(0, &ids))
            .expect("actor");
        assert!(matches!(
            strategy.finish_iteration(),
            Err(StrategyError::TraceNotConsumed { remaining: 1 })
        ));

        let mut empty = ReplayStrategy::new(Trace::new(TraceMetadata::new(
            StrategyKind::Dfs,
            None,
            0,
        )));
        empty.begin_iteration(0);
        assert!(matches!(
            empty.next_actor(&SchedulingPoint::new(0, &ids)),
            Err(StrategyError::TraceExhausted { point: 0 })
        ));
    }
}
