//! Exploration driver.
//!
//! An [`Explorer`] runs a program for up to `iterations` iterations under the
//! configured strategy and aggregates the outcomes into an
//! [`ExplorationReport`]:
//!
//! 1. For each iteration the strategy is asked whether anything is left to
//!    explore (DFS stops when its decision tree is exhausted)
//! 2. The iteration runs from a fresh registry ([`run_iteration`])
//! 3. The first bug stops the run unless `continue_after_bug_found` is set
//!
//! Random exploration can be spread over worker threads with
//! [`Explorer::run_parallel`]; the resulting report is the one a sequential
//! run with the same seed would produce.

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use parking_lot::Mutex;

use crate::actor::Program;
use crate::error::{ConfigurationError, TraceFormatError};
use crate::lab::config::{Configuration, StrategyKind};
use crate::lab::engine::run_iteration;
use crate::lab::report::{ExplorationReport, IterationResult};
use crate::lab::strategy::{RandomStrategy, ReplayStrategy, Strategy};
use crate::observability::{LogObserver, Observer, Verbosity};
use crate::trace::{TRACE_SCHEMA_VERSION, Trace};
use crate::tracing_compat::info;

/// Runs a program under a configuration.
#[derive(Debug)]
pub struct Explorer {
    program: Program,
    config: Configuration,
}

impl Explorer {
    /// Validates `config` and creates an explorer.
    pub fn new(program: Program, config: Configuration) -> Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self { program, config })
    }

    /// The program under test.
    #[must_use]
    pub const fn program(&self) -> &Program {
        &self.program
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &Configuration {
        &self.config
    }

    fn log_observer(&self) -> LogObserver {
        LogObserver::new(Verbosity::from_level(self.config.verbosity))
    }

    /// Runs the exploration, logging through `tracing` at the configured verbosity.
    pub fn run(&self) -> Result<ExplorationReport, ConfigurationError> {
        let mut observer = self.log_observer();
        self.run_with_observer(&mut observer)
    }

    /// Runs the exploration, reporting execution callbacks to `observer`.
    pub fn run_with_observer(
        &self,
        observer: &mut dyn Observer,
    ) -> Result<ExplorationReport, ConfigurationError> {
        let mut strategy = self.config.make_strategy()?;
        let mut report = ExplorationReport::new(self.config.strategy);
        // A replayed run keeps the index of the iteration that recorded the trace.
        let first = self
            .config
            .trace_to_replay
            .as_ref()
            .filter(|_| self.config.strategy == StrategyKind::Replay)
            .map_or(0, |trace| trace.metadata().iteration);
        for iteration in first..first + self.config.effective_iterations() {
            if !strategy.begin_iteration(iteration) {
                break;
            }
            let result = run_iteration(
                &self.program,
                &self.config,
                strategy.as_mut(),
                observer,
                iteration,
            )?;
            strategy.finish_iteration()?;
            let stop = result.is_bug() && !self.config.continue_after_bug_found;
            report.record(result);
            if stop {
                break;
            }
        }
        report.exhausted = self.config.strategy == StrategyKind::Dfs && strategy.is_exhausted();
        log_summary(&report);
        Ok(report)
    }

    /// Re-executes `trace` once and returns its outcome.
    ///
    /// Fails with a strategy error if the execution diverges from the trace.
    pub fn replay(&self, trace: Trace) -> Result<IterationResult, ConfigurationError> {
        if !trace.metadata().is_compatible() {
            return Err(TraceFormatError::IncompatibleVersion {
                expected: TRACE_SCHEMA_VERSION,
                found: trace.metadata().version,
            }
            .into());
        }
        let iteration = trace.metadata().iteration;
        let mut strategy = ReplayStrategy::new(trace);
        let mut observer = self.log_observer();
        strategy.begin_iteration(iteration);
        let result = run_iteration(
            &self.program,
            &self.config,
            &mut strategy,
            &mut observer,
            iteration,
        )?;
        strategy.finish_iteration()?;
        Ok(result)
    }

    /// Runs random exploration on `workers` threads.
    ///
    /// Iterations are handed out in index order and every worker stops once an
    /// iteration at or beyond the lowest-indexed bug would be next, so the
    /// report matches [`Explorer::run`]. Other strategies, and a single
    /// worker, fall back to the sequential run.
    pub fn run_parallel(&self, workers: usize) -> Result<ExplorationReport, ConfigurationError> {
        if self.config.strategy != StrategyKind::Random || workers <= 1 {
            return self.run();
        }
        let iterations = self.config.iterations;
        let next = AtomicU64::new(0);
        // Lowest iteration index that found a bug (or failed).
        let cutoff = AtomicU64::new(u64::MAX);
        let results: Mutex<Vec<IterationResult>> = Mutex::new(Vec::new());
        let failure: Mutex<Option<(u64, ConfigurationError)>> = Mutex::new(None);
        let stop_on_bug = !self.config.continue_after_bug_found;

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| {
                    let mut strategy = RandomStrategy::new(self.config.seed);
                    let mut observer = self.log_observer();
                    loop {
                        let iteration = next.fetch_add(1, Ordering::Relaxed);
                        if iteration >= iterations || iteration > cutoff.load(Ordering::Acquire) {
                            break;
                        }
                        strategy.begin_iteration(iteration);
                        match run_iteration(
                            &self.program,
                            &self.config,
                            &mut strategy,
                            &mut observer,
                            iteration,
                        ) {
                            Ok(result) => {
                                if stop_on_bug && result.is_bug() {
                                    cutoff.fetch_min(iteration, Ordering::AcqRel);
                                }
                                results.lock().push(result);
                            }
                            Err(error) => {
                                cutoff.fetch_min(iteration, Ordering::AcqRel);
                                let mut slot = failure.lock();
                                if slot.as_ref().is_none_or(|(first, _)| iteration < *first) {
                                    *slot = Some((iteration, error));
                                }
                            }
                        }
                    }
                });
            }
        });

        let mut results = results.into_inner();
        results.sort_by_key(IterationResult::iteration);
        let cutoff = cutoff.into_inner();
        if let Some((iteration, error)) = failure.into_inner() {
            // A failure only escapes if no earlier bug would have ended the run.
            let earlier_bug = stop_on_bug
                && results
                    .iter()
                    .any(|result| result.is_bug() && result.iteration() < iteration);
            if !earlier_bug {
                return Err(error);
            }
        }

        let mut report = ExplorationReport::new(StrategyKind::Random);
        for result in results {
            if result.iteration() > cutoff {
                break;
            }
            report.record(result);
        }
        log_summary(&report);
        Ok(report)
    }
}

fn log_summary(report: &ExplorationReport) {
    info!(
        strategy = %report.strategy,
        iterations = report.iterations_run,
        bugs = report.bugs_found,
        budget_exceeded = report.budget_exceeded,
        unique_paths = report.unique_paths,
        exhausted = report.exhausted,
        "exploration finished"
    );
}
