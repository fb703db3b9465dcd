//! Configuration for exploration runs.
//!
//! The configuration controls how a program is explored:
//! - Which strategy picks decisions (DFS, random, replay)
//! - How many iterations run and how long each may take
//! - The seed for randomized exploration
//! - How handler failures and sends to halted actors are treated

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::lab::strategy::{DfsStrategy, RandomStrategy, ReplayStrategy, Strategy};
use crate::trace::Trace;

/// Exploration strategy selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Exhaustive depth-first search over the decision tree.
    #[default]
    Dfs,
    /// Seeded uniform random selection.
    Random,
    /// Re-executes a recorded trace.
    Replay,
}

impl StrategyKind {
    /// Returns the strategy name as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dfs => "dfs",
            Self::Random => "random",
            Self::Replay => "replay",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens when a handler fails with something other than an assertion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// End the iteration with an assertion violation.
    #[default]
    TreatAsViolation,
    /// Halt the failing actor and keep going.
    HaltActor,
}

/// What happens when an actor receives an event no state on its stack handles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnhandledEventPolicy {
    /// End the iteration with an unhandled-event violation.
    #[default]
    Violation,
    /// Log a warning and halt the receiving actor.
    HaltActor,
}

/// What happens to events sent to a halted actor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltedSendPolicy {
    /// Drop silently.
    #[default]
    Drop,
    /// Drop, count and log a warning.
    Report,
}

/// Configuration for an exploration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Strategy used to decide scheduling points.
    pub strategy: StrategyKind,
    /// Maximum number of iterations. Replay always runs exactly one.
    pub iterations: u64,
    /// Maximum number of actor steps per iteration before it is reported as
    /// budget exceeded.
    pub max_steps_per_iteration: u64,
    /// Base seed for the random strategy. Iteration `i` uses `seed + i`.
    pub seed: u64,
    /// Trace driving the replay strategy.
    #[serde(skip)]
    pub trace_to_replay: Option<Trace>,
    /// Keep exploring after the first bug.
    pub continue_after_bug_found: bool,
    /// 0 quiet, 1 bugs, 2 steps, 3 or more everything.
    pub verbosity: u8,
    /// Treatment of non-assertion handler failures.
    pub failure_policy: FailurePolicy,
    /// Treatment of sends to halted actors.
    pub halted_send_policy: HaltedSendPolicy,
    /// Treatment of events no state handles.
    pub unhandled_event_policy: UnhandledEventPolicy,
    /// Maximum number of transitions, raises and choices within one step.
    pub max_transitions_per_step: u64,
}

impl Configuration {
    /// Creates the default configuration for `strategy`.
    #[must_use]
    pub const fn new(strategy: StrategyKind) -> Self {
        Self {
            strategy,
            iterations: 1000,
            max_steps_per_iteration: 10_000,
            seed: 0,
            trace_to_replay: None,
            continue_after_bug_found: false,
            verbosity: 0,
            failure_policy: FailurePolicy::TreatAsViolation,
            halted_send_policy: HaltedSendPolicy::Drop,
            unhandled_event_policy: UnhandledEventPolicy::Violation,
            max_transitions_per_step: 10_000,
        }
    }

    /// Exhaustive depth-first exploration.
    #[must_use]
    pub const fn dfs() -> Self {
        Self::new(StrategyKind::Dfs)
    }

    /// Random exploration from `seed`.
    #[must_use]
    pub const fn random(seed: u64) -> Self {
        Self::new(StrategyKind::Random).seed(seed)
    }

    /// Replay of `trace`.
    #[must_use]
    pub fn replay(trace: Trace) -> Self {
        let mut config = Self::new(StrategyKind::Replay).iterations(1);
        config.trace_to_replay = Some(trace);
        config
    }

    /// Sets the iteration count.
    #[must_use]
    pub const fn iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the per-iteration step budget.
    #[must_use]
    pub const fn max_steps(mut self, steps: u64) -> Self {
        self.max_steps_per_iteration = steps;
        self
    }

    /// Sets the random seed.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets whether exploration continues after a bug.
    #[must_use]
    pub const fn continue_after_bug(mut self, value: bool) -> Self {
        self.continue_after_bug_found = value;
        self
    }

    /// Sets the verbosity level.
    #[must_use]
    pub const fn verbosity(mut self, level: u8) -> Self {
        self.verbosity = level;
        self
    }

    /// Sets the handler failure policy.
    #[must_use]
    pub const fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Sets the policy for sends to halted actors.
    #[must_use]
    pub const fn halted_send_policy(mut self, policy: HaltedSendPolicy) -> Self {
        self.halted_send_policy = policy;
        self
    }

    /// Sets the policy for unhandled events.
    #[must_use]
    pub const fn unhandled_event_policy(mut self, policy: UnhandledEventPolicy) -> Self {
        self.unhandled_event_policy = policy;
        self
    }

    /// Sets the per-step transition budget.
    #[must_use]
    pub const fn max_transitions_per_step(mut self, transitions: u64) -> Self {
        self.max_transitions_per_step = transitions;
        self
    }

    /// Checks value ranges and strategy prerequisites.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.iterations == 0 {
            return Err(ConfigurationError::InvalidIterations);
        }
        if self.max_steps_per_iteration == 0 {
            return Err(ConfigurationError::InvalidStepBudget {
                name: "max_steps_per_iteration",
            });
        }
        if self.max_transitions_per_step == 0 {
            return Err(ConfigurationError::InvalidStepBudget {
                name: "max_transitions_per_step",
            });
        }
        if self.strategy == StrategyKind::Replay {
            let trace = self
                .trace_to_replay
                .as_ref()
                .ok_or(ConfigurationError::MissingReplayTrace)?;
            if !trace.metadata().is_compatible() {
                return Err(crate::error::TraceFormatError::IncompatibleVersion {
                    expected: crate::trace::TRACE_SCHEMA_VERSION,
                    found: trace.metadata().version,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Number of iterations the run will attempt.
    #[must_use]
    pub const fn effective_iterations(&self) -> u64 {
        match self.strategy {
            StrategyKind::Replay => 1,
            StrategyKind::Dfs | StrategyKind::Random => self.iterations,
        }
    }

    /// Instantiates the configured strategy.
    pub fn make_strategy(&self) -> Result<Box<dyn Strategy>, ConfigurationError> {
        Ok(match self.strategy {
            StrategyKind::Dfs => Box::new(DfsStrategy::new()),
            StrategyKind::Random => Box::new(RandomStrategy::new(self.seed)),
            StrategyKind::Replay => {
                let trace = self
                    .trace_to_replay
                    .clone()
                    .ok_or(ConfigurationError::MissingReplayTrace)?;
                Box::new(ReplayStrategy::new(trace))
            }
        })
    }

    /// Parses a configuration from TOML. Missing keys take their defaults.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigurationError> {
        let config: Self =
            toml::from_str(text).map_err(|err| ConfigurationError::ConfigFile(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::dfs()
    }
}
