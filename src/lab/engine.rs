//! Single-iteration driver.
//!
//! [`run_iteration`] executes a program once from a fresh registry:
//!
//! 1. run the entry action, which creates the initial actors
//! 2. loop: compute the enabled set; stop if it is empty (deadlock or
//!    completion) or the step budget is spent; otherwise ask the strategy
//!    which actor steps and run that step to completion
//! 3. classify the outcome
//!
//! The caller owns the strategy's iteration lifecycle
//! (`begin_iteration`/`finish_iteration`).

use std::fmt::Write as _;

use crate::actor::Program;
use crate::error::ConfigurationError;
use crate::lab::config::Configuration;
use crate::lab::report::{BugKind, BugReport, IterationResult, IterationSummary};
use crate::lab::strategy::Strategy;
use crate::observability::Observer;
use crate::runtime::executor::{Abort, ExecutionRecord, Executor, StepLimits};
use crate::trace::{Trace, TraceMetadata};
use crate::tracing_compat::debug;
use crate::types::ActorId;

enum Stop {
    Completed,
    Deadlock(Vec<(ActorId, &'static str)>),
    Budget(String),
    Abort(Abort),
}

/// Runs iteration `iteration` of `program` under `strategy`.
///
/// Only configuration errors (including strategy failures such as replay
/// divergence) are returned as `Err`; every bug is an `Ok` outcome.
pub fn run_iteration(
    program: &Program,
    config: &Configuration,
    strategy: &mut dyn Strategy,
    observer: &mut dyn Observer,
    iteration: u64,
) -> Result<IterationResult, ConfigurationError> {
    let metadata = TraceMetadata::new(strategy.kind(), strategy.iteration_seed(), iteration);
    observer.on_iteration_start(iteration);

    let limits = StepLimits::from(config);
    let mut exec = Executor::new(program, limits, strategy, observer, Trace::new(metadata));
    exec.run_entry();

    let stop = loop {
        if let Some(abort) = exec.take_abort() {
            break Stop::Abort(abort);
        }
        let enabled = exec.enabled();
        if enabled.is_empty() {
            let waiting = exec.waiting();
            break if waiting.is_empty() {
                Stop::Completed
            } else {
                Stop::Deadlock(waiting)
            };
        }
        if exec.steps() >= config.max_steps_per_iteration {
            break Stop::Budget(format!(
                "step budget of {} exhausted",
                config.max_steps_per_iteration
            ));
        }
        let actor = exec.schedule(&enabled)?;
        exec.step(actor);
    };

    let record = exec.finish();
    let result = classify(stop, record, iteration)?;
    debug!(
        iteration,
        outcome = result.label(),
        steps = result.steps(),
        decisions = result.trace().len(),
        "iteration finished"
    );
    observer.on_iteration_end(iteration, &result);
    Ok(result)
}

fn classify(
    stop: Stop,
    record: ExecutionRecord,
    iteration: u64,
) -> Result<IterationResult, ConfigurationError> {
    let summary = |record: ExecutionRecord| IterationSummary {
        iteration,
        steps: record.steps,
        actors: record.actors,
        dropped_sends: record.dropped_sends,
        trace: record.trace,
    };
    Ok(match stop {
        Stop::Completed => IterationResult::Completed(summary(record)),
        Stop::Deadlock(waiting) => {
            let mut message = String::from("deadlock: no actor can make progress; waiting:");
            for (index, (actor, state)) in waiting.iter().enumerate() {
                let sep = if index == 0 { " " } else { ", " };
                let _ = write!(message, "{sep}{actor} in `{state}`");
            }
            let (actor, state) = waiting[0];
            IterationResult::Deadlock(BugReport {
                kind: BugKind::Deadlock,
                actor: Some(actor),
                state: Some(state.to_string()),
                message,
                iteration,
                steps: record.steps,
                dropped_sends: record.dropped_sends,
                trace: record.trace,
            })
        }
        Stop::Budget(reason) | Stop::Abort(Abort::Budget(reason)) => {
            debug!(iteration, %reason, "budget exceeded");
            IterationResult::BudgetExceeded(summary(record))
        }
        Stop::Abort(Abort::Config(error)) => return Err(error),
        Stop::Abort(Abort::Violation {
            kind,
            actor,
            state,
            message,
        }) => IterationResult::Violation(BugReport {
            kind,
            actor,
            state: state.map(str::to_string),
            message,
            iteration,
            steps: record.steps,
            dropped_sends: record.dropped_sends,
            trace: record.trace,
        }),
    })
}
