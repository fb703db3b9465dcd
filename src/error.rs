//! Error types for program construction, exploration and trace persistence.
//!
//! Failures are split by how far they propagate:
//!
//! - [`HandlerError`]: returned by user handlers. Resolved inside the current
//!   iteration and turned into an iteration outcome, never escapes a run.
//! - [`StrategyError`]: a strategy could not produce a decision (replay
//!   divergence, nondeterministic re-execution under DFS).
//! - [`TraceFormatError`]: a trace could not be encoded, decoded or stored.
//! - [`ConfigurationError`]: malformed declarations, invalid configuration,
//!   out-of-set decisions. The only error that escapes an exploration run.

use thiserror::Error;

/// Error returned from handler code (entry, exit and event actions).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// A user invariant failed. Always fatal to the iteration.
    #[error("assertion failed: {0}")]
    Assertion(String),
    /// Any other handler failure. Handled according to the failure policy.
    #[error("handler failure: {0}")]
    Failure(String),
    /// A nested runtime operation hit a fatal condition that is already
    /// recorded; propagate it with `?`.
    #[error("interrupted by a fatal runtime condition")]
    Interrupted,
}

/// Result type for handler code.
pub type HandlerResult = Result<(), HandlerError>;

/// Error raised by a strategy while deciding a scheduling point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyError {
    /// The replayed execution no longer matches the recorded trace.
    #[error("replay diverged at scheduling point {point}: {reason}")]
    Divergence {
        /// Scheduling point index where the mismatch was observed.
        point: u64,
        /// Human-readable description of the mismatch.
        reason: String,
    },
    /// The execution requested more decisions than the trace holds.
    #[error("replay trace exhausted at scheduling point {point}")]
    TraceExhausted {
        /// Scheduling point index with no recorded decision.
        point: u64,
    },
    /// The execution ended before consuming every recorded decision.
    #[error("replay ended with {remaining} unconsumed decision(s)")]
    TraceNotConsumed {
        /// Number of decisions left over.
        remaining: usize,
    },
    /// Re-executing a recorded decision prefix saw a different branching factor.
    #[error(
        "nondeterministic re-execution at depth {depth}: expected {expected} option(s), observed {observed}"
    )]
    Nondeterminism {
        /// Depth in the decision stack.
        depth: usize,
        /// Option count recorded on the first visit.
        expected: u64,
        /// Option count observed now.
        observed: u64,
    },
}

/// Error encoding, decoding or storing a trace.
#[derive(Debug, Error)]
pub enum TraceFormatError {
    /// Filesystem failure.
    #[error("trace I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON encoding/decoding failure.
    #[error("trace JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// MessagePack encoding failure.
    #[error("trace encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    /// MessagePack decoding failure.
    #[error("trace decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    /// The stored schema version is not supported.
    #[error("incompatible trace schema version: expected {expected}, found {found}")]
    IncompatibleVersion {
        /// Version this build understands.
        expected: u32,
        /// Version found in the trace.
        found: u32,
    },
}

/// Fatal error for a whole exploration run.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// An actor kind declares no start state.
    #[error("actor kind `{kind}` declares no start state")]
    MissingStartState {
        /// Actor kind name.
        kind: String,
    },
    /// An actor kind declares more than one start state.
    #[error("actor kind `{kind}` declares more than one start state: {states:?}")]
    MultipleStartStates {
        /// Actor kind name.
        kind: String,
        /// The states marked as start.
        states: Vec<String>,
    },
    /// Two states of one kind share a name.
    #[error("actor kind `{kind}` declares state `{state}` twice")]
    DuplicateState {
        /// Actor kind name.
        kind: String,
        /// Duplicated state name.
        state: String,
    },
    /// A transition or goto names a state the kind does not declare.
    #[error("actor kind `{kind}` has no state named `{state}`")]
    UnknownState {
        /// Actor kind name.
        kind: String,
        /// Missing state name.
        state: String,
    },
    /// A state declares two rules (transition, deferral or ignore) for one event kind.
    #[error("state `{kind}::{state}` declares more than one rule for event `{event}`")]
    ConflictingRule {
        /// Actor kind name.
        kind: String,
        /// State name.
        state: String,
        /// Event kind name.
        event: String,
    },
    /// Two actor kinds share a name.
    #[error("actor kind `{kind}` is registered twice")]
    DuplicateKind {
        /// Actor kind name.
        kind: String,
    },
    /// An actor kind was requested that the program does not declare.
    #[error("unknown actor kind `{kind}`")]
    UnknownKind {
        /// Requested kind name.
        kind: String,
    },
    /// The program has no entry action.
    #[error("program declares no entry action")]
    NoEntryPoint,
    /// `iterations` must be at least 1.
    #[error("iterations must be at least 1")]
    InvalidIterations,
    /// A step budget must be at least 1.
    #[error("{name} must be at least 1")]
    InvalidStepBudget {
        /// Name of the offending budget.
        name: &'static str,
    },
    /// Replay was requested without a trace.
    #[error("replay strategy requires a trace to replay")]
    MissingReplayTrace,
    /// A strategy proposed a decision outside the offered set.
    #[error("strategy proposed an out-of-set decision at scheduling point {point}: {detail}")]
    OutOfSetDecision {
        /// Scheduling point index.
        point: u64,
        /// What was proposed and what was offered.
        detail: String,
    },
    /// The strategy itself failed.
    #[error(transparent)]
    Strategy(#[from] StrategyError),
    /// A trace could not be loaded or stored.
    #[error(transparent)]
    TraceFormat(#[from] TraceFormatError),
    /// A configuration file could not be parsed.
    #[error("invalid configuration file: {0}")]
    ConfigFile(String),
}
