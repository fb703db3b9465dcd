//! Scheduling decision records.

use serde::{Deserialize, Serialize};

use crate::types::ActorId;

/// The value returned for a nondeterministic choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceValue {
    /// Result of `random_bool`.
    Bool(bool),
    /// Result of `random_int(bound)`.
    Int {
        /// Chosen value, `< bound`.
        value: u64,
        /// Exclusive upper bound that was requested.
        bound: u64,
    },
}

impl ChoiceValue {
    /// The value as the integer the strategy returned.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        match self {
            Self::Bool(value) => value as u64,
            Self::Int { value, .. } => value,
        }
    }
}

/// What was decided at a scheduling point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// The given actor dequeued and processed one event.
    NextActor {
        /// The actor that stepped.
        actor: ActorId,
    },
    /// A choice requested by `actor` resolved to `value`.
    Choice {
        /// The requesting actor.
        actor: ActorId,
        /// The returned value.
        value: ChoiceValue,
    },
}

impl Decision {
    /// The actor this decision concerns.
    #[must_use]
    pub const fn actor(&self) -> ActorId {
        match self {
            Self::NextActor { actor } | Self::Choice { actor, .. } => *actor,
        }
    }
}

/// One record per scheduling point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleDecision {
    /// Index of the scheduling point within the iteration, starting at 0.
    pub point: u64,
    /// The decision taken.
    pub decision: Decision,
    /// Actors that were enabled at the point, in ascending id order. For a
    /// choice this is the requesting actor only.
    pub enabled: Vec<ActorId>,
}

impl ScheduleDecision {
    /// Creates a record.
    #[must_use]
    pub fn new(point: u64, decision: Decision, enabled: Vec<ActorId>) -> Self {
        Self {
            point,
            decision,
            enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_value_as_u64() {
        assert_eq!(ChoiceValue::Bool(true).as_u64(), 1);
        assert_eq!(ChoiceValue::Bool(false).as_u64(), 0);
        assert_eq!(ChoiceValue::Int { value: 4, bound: 9 }.as_u64(), 4);
    }

    #[test]
    fn decision_json_shape() {
        let decision = Decision::NextActor {
            actor: ActorId::new_for_test(2),
        };
        let json = serde_json::to_string(&decision).expect("serialize");
        assert_eq!(json, r#"{"next_actor":{"actor":2}}"#);
    }

    #[test]
    fn decision_actor() {
        let a = ActorId::new_for_test(3);
        let choice = Decision::Choice {
            actor: a,
            value: ChoiceValue::Bool(true),
        };
        assert_eq!(choice.actor(), a);
    }
}
