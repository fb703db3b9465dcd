//! Iteration outcomes and exploration reports.

use std::collections::BTreeSet;
use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};

use crate::lab::config::StrategyKind;
use crate::trace::Trace;
use crate::types::ActorId;

/// Classification of a detected bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BugKind {
    /// A user assertion failed, or a handler failed under the violation policy.
    AssertionViolation,
    /// An event reached an actor with no applicable rule on its state stack.
    UnhandledEvent,
    /// No actor can make progress while at least one is still waiting.
    Deadlock,
}

impl BugKind {
    /// Returns the kind name as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AssertionViolation => "assertion_violation",
            Self::UnhandledEvent => "unhandled_event",
            Self::Deadlock => "deadlock",
        }
    }
}

impl fmt::Display for BugKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bug found in one iteration, with the trace that reproduces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BugReport {
    /// What kind of bug.
    pub kind: BugKind,
    /// The offending actor, if the bug is attributable to one.
    pub actor: Option<ActorId>,
    /// The actor's top state when the bug was detected.
    pub state: Option<String>,
    /// Human-readable description.
    pub message: String,
    /// Iteration index.
    pub iteration: u64,
    /// Actor steps taken before the bug.
    pub steps: u64,
    /// Sends to halted actors counted under the report policy before the bug.
    #[serde(default)]
    pub dropped_sends: u64,
    /// Decisions up to and including the last point before the bug.
    pub trace: Trace,
}

impl fmt::Display for BugReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in iteration {}", self.kind, self.iteration)?;
        if let Some(actor) = self.actor {
            write!(f, " (actor {actor}")?;
            if let Some(state) = &self.state {
                write!(f, ", state `{state}`")?;
            }
            f.write_str(")")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Statistics of an iteration that did not find a bug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationSummary {
    /// Iteration index.
    pub iteration: u64,
    /// Actor steps taken.
    pub steps: u64,
    /// Actors created.
    pub actors: usize,
    /// Sends to halted actors counted under the report policy.
    pub dropped_sends: u64,
    /// Decisions taken.
    pub trace: Trace,
}

/// Outcome of one iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationResult {
    /// Every actor halted or idles in a state that takes no further input.
    Completed(IterationSummary),
    /// An assertion failed or an event went unhandled.
    Violation(BugReport),
    /// No actor can make progress while one is still waiting.
    Deadlock(BugReport),
    /// A step budget ran out; neither a pass nor a bug.
    BudgetExceeded(IterationSummary),
}

impl IterationResult {
    /// True for `Violation` and `Deadlock`.
    #[must_use]
    pub const fn is_bug(&self) -> bool {
        matches!(self, Self::Violation(_) | Self::Deadlock(_))
    }

    /// The bug report, if any.
    #[must_use]
    pub const fn bug(&self) -> Option<&BugReport> {
        match self {
            Self::Violation(report) | Self::Deadlock(report) => Some(report),
            Self::Completed(_) | Self::BudgetExceeded(_) => None,
        }
    }

    /// The iteration's trace.
    #[must_use]
    pub const fn trace(&self) -> &Trace {
        match self {
            Self::Violation(report) | Self::Deadlock(report) => &report.trace,
            Self::Completed(summary) | Self::BudgetExceeded(summary) => &summary.trace,
        }
    }

    /// Iteration index.
    #[must_use]
    pub const fn iteration(&self) -> u64 {
        match self {
            Self::Violation(report) | Self::Deadlock(report) => report.iteration,
            Self::Completed(summary) | Self::BudgetExceeded(summary) => summary.iteration,
        }
    }

    /// Actor steps taken.
    #[must_use]
    pub const fn steps(&self) -> u64 {
        match self {
            Self::Violation(report) | Self::Deadlock(report) => report.steps,
            Self::Completed(summary) | Self::BudgetExceeded(summary) => summary.steps,
        }
    }

    /// Short outcome label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Completed(_) => "completed",
            Self::Violation(_) => "violation",
            Self::Deadlock(_) => "deadlock",
            Self::BudgetExceeded(_) => "budget_exceeded",
        }
    }
}

/// Bug reports kept in [`ExplorationReport::bugs`]; later bugs are only counted.
pub const MAX_RETAINED_BUGS: usize = 100;

/// Distinct trace fingerprints remembered for [`ExplorationReport::unique_paths`].
pub const MAX_TRACKED_PATHS: usize = 1 << 20;

/// Summary of an exploration run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorationReport {
    /// Strategy that ran.
    pub strategy: StrategyKind,
    /// Iterations executed.
    pub iterations_run: u64,
    /// Iterations that found a bug.
    pub bugs_found: u64,
    /// Iterations that completed cleanly.
    pub completed: u64,
    /// Assertion and unhandled-event violations.
    pub violations: u64,
    /// Deadlocks.
    pub deadlocks: u64,
    /// Iterations cut off by a step budget.
    pub budget_exceeded: u64,
    /// Sends to halted actors counted under the report policy.
    pub dropped_sends: u64,
    /// Distinct decision sequences executed. Saturates once
    /// [`MAX_TRACKED_PATHS`] fingerprints are remembered.
    pub unique_paths: u64,
    /// The strategy ran out of new paths before the iteration limit.
    pub exhausted: bool,
    /// The first [`MAX_RETAINED_BUGS`] bugs in iteration order; the first is
    /// the one to replay.
    pub bugs: Vec<BugReport>,
    #[serde(skip)]
    fingerprints: BTreeSet<u64>,
}

impl ExplorationReport {
    /// Creates an empty report for `strategy`.
    #[must_use]
    pub fn new(strategy: StrategyKind) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Folds one iteration result into the totals.
    pub fn record(&mut self, result: IterationResult) {
        self.iterations_run += 1;
        if self.fingerprints.len() < MAX_TRACKED_PATHS
            && self.fingerprints.insert(result.trace().fingerprint())
        {
            self.unique_paths += 1;
        }
        match result {
            IterationResult::Completed(summary) => {
                self.completed += 1;
                self.dropped_sends += summary.dropped_sends;
            }
            IterationResult::BudgetExceeded(summary) => {
                self.budget_exceeded += 1;
                self.dropped_sends += summary.dropped_sends;
            }
            IterationResult::Violation(report) => {
                self.violations += 1;
                self.record_bug(report);
            }
            IterationResult::Deadlock(report) => {
                self.deadlocks += 1;
                self.record_bug(report);
            }
        }
    }

    fn record_bug(&mut self, report: BugReport) {
        self.bugs_found += 1;
        self.dropped_sends += report.dropped_sends;
        if self.bugs.len() < MAX_RETAINED_BUGS {
            self.bugs.push(report);
        }
    }

    /// The first bug found, if any.
    #[must_use]
    pub fn first_bug(&self) -> Option<&BugReport> {
        self.bugs.first()
    }

    /// True if any bug was found.
    #[must_use]
    pub const fn has_bugs(&self) -> bool {
        self.bugs_found > 0
    }

    /// Process exit code: 0 clean, 1 bugs found, 2 only budget overruns.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        if self.bugs_found > 0 {
            1
        } else if self.budget_exceeded > 0 {
            2
        } else {
            0
        }
    }

    /// Machine-readable summary. Traces are summarized by length and
    /// fingerprint; persist them with [`Trace::save`] for replay.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let bugs: Vec<serde_json::Value> = self
            .bugs
            .iter()
            .map(|bug| {
                serde_json::json!({
                    "kind": bug.kind,
                    "actor": bug.actor,
                    "state": bug.state,
                    "message": bug.message,
                    "iteration": bug.iteration,
                    "steps": bug.steps,
                    "dropped_sends": bug.dropped_sends,
                    "trace_len": bug.trace.len(),
                    "trace_fingerprint": format!("{:016x}", bug.trace.fingerprint()),
                })
            })
            .collect();
        serde_json::json!({
            "strategy": self.strategy,
            "iterations_run": self.iterations_run,
            "bugs_found": self.bugs_found,
            "completed": self.completed,
            "violations": self.violations,
            "deadlocks": self.deadlocks,
            "budget_exceeded": self.budget_exceeded,
            "dropped_sends": self.dropped_sends,
            "unique_paths": self.unique_paths,
            "exhausted": self.exhausted,
            "bugs": bugs,
        })
    }

    /// Human-readable summary.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "strategy {}: {} iteration(s), {} bug(s) found",
            self.strategy, self.iterations_run, self.bugs_found
        );
        let _ = writeln!(
            out,
            "  completed {}, violations {}, deadlocks {}, budget exceeded {}",
            self.completed, self.violations, self.deadlocks, self.budget_exceeded
        );
        let _ = writeln!(out, "  unique paths {}", self.unique_paths);
        if self.exhausted {
            let _ = writeln!(out, "  search space exhausted");
        }
        if self.dropped_sends > 0 {
            let _ = writeln!(out, "  dropped sends {}", self.dropped_sends);
        }
        if self.bugs_found > self.bugs.len() as u64 {
            let _ = writeln!(out, "  first {} bug report(s) kept", self.bugs.len());
        }
        if let Some(bug) = self.first_bug() {
            let _ = writeln!(out, "first bug: {bug}");
            let _ = writeln!(out, "  trace: {} decision(s)", bug.trace.len());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{Decision, ScheduleDecision, TraceMetadata};

    fn trace(actors: &[u64]) -> Trace {
        let mut trace = Trace::new(TraceMetadata::new(StrategyKind::Dfs, None, 0));
        for (point, &raw) in actors.iter().enumerate() {
            let actor = ActorId::new_for_test(raw);
            trace.push(ScheduleDecision::new(
                point as u64,
                Decision::NextActor { actor },
                vec![actor],
            ));
        }
        trace
    }

    fn summary(iteration: u64, path: &[u64]) -> IterationSummary {
        IterationSummary {
            iteration,
            steps: path.len() as u64,
            actors: 1,
            dropped_sends: 0,
            trace: trace(path),
        }
    }

    fn bug(kind: BugKind, iteration: u64) -> BugReport {
        BugReport {
            kind,
            actor: Some(ActorId::new_for_test(1)),
            state: Some("Idle".into()),
            message: "boom".into(),
            iteration,
            steps: 3,
            dropped_sends: 0,
            trace: trace(&[0, 1, 1]),
        }
    }

    #[test]
    fn record_counts_outcomes() {
        let mut report = ExplorationReport::new(StrategyKind::Dfs);
        report.record(IterationResult::Completed(summary(0, &[0])));
        report.record(IterationResult::Completed(summary(1, &[0])));
        report.record(IterationResult::BudgetExceeded(summary(2, &[1])));
        report.record(IterationResult::Violation(bug(BugKind::UnhandledEvent, 3)));
        report.record(IterationResult::Deadlock(bug(BugKind::Deadlock, 4)));
        assert_eq!(report.iterations_run, 5);
        assert_eq!(report.bugs_found, 2);
        assert_eq!(report.completed, 2);
        assert_eq!(report.violations, 1);
        assert_eq!(report.deadlocks, 1);
        assert_eq!(report.unique_paths, 3);
        assert_eq!(report.first_bug().map(|b| b.iteration), Some(3));
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn bug_outcomes_keep_their_dropped_sends() {
        let mut report = ExplorationReport::new(StrategyKind::Random);
        let mut violation = bug(BugKind::AssertionViolation, 0);
        violation.dropped_sends = 2;
        let mut summary = summary(1, &[0]);
        summary.dropped_sends = 1;
        report.record(IterationResult::Violation(violation));
        report.record(IterationResult::Completed(summary));
        assert_eq!(report.dropped_sends, 3);
        assert_eq!(report.to_json()["bugs"][0]["dropped_sends"], 2);
    }

    #[test]
    fn retained_bugs_are_capped() {
        let mut report = ExplorationReport::new(StrategyKind::Random);
        let total = MAX_RETAINED_BUGS as u64 + 5;
        for iteration in 0..total {
            report.record(IterationResult::Deadlock(bug(BugKind::Deadlock, iteration)));
        }
        assert_eq!(report.bugs_found, total);
        assert_eq!(report.deadlocks, total);
        assert_eq!(report.bugs.len(), MAX_RETAINED_BUGS);
        assert_eq!(report.first_bug().map(|b| b.iteration), Some(0));
        assert_eq!(
            report.bugs.last().map(|b| b.iteration),
            Some(MAX_RETAINED_BUGS as u64 - 1)
        );
        let text = report.to_text();
        assert!(text.contains("first 100 bug report(s) kept"), "{text}");
    }

    #[test]
    fn exit_codes() {
        let mut report = ExplorationReport::new(StrategyKind::Random);
        assert_eq!(report.exit_code(), 0);
        report.record(IterationResult::BudgetExceeded(summary(0, &[0])));
        assert_eq!(report.exit_code(), 2);
    }

    #[test]
    fn bug_report_display() {
        let text = bug(BugKind::AssertionViolation, 7).to_string();
        assert_eq!(
            text,
            "assertion_violation in iteration 7 (actor A1, state `Idle`): boom"
        );
    }

    #[test]
    fn renders_json_and_text() {
        let mut report = ExplorationReport::new(StrategyKind::Dfs);
        report.record(IterationResult::Violation(bug(BugKind::AssertionViolation, 0)));
        let json = report.to_json();
        assert_eq!(json["bugs_found"], 1);
        assert_eq!(json["strategy"], "dfs");
        assert_eq!(json["bugs"][0]["kind"], "assertion_violation");
        assert_eq!(json["bugs"][0]["trace_len"], 3);
        let text = report.to_text();
        assert!(text.contains("1 bug(s) found"), "{text}");
        assert!(text.contains("first bug: assertion_violation"), "{text}");
    }
}
