#![allow(missing_docs)]
//! E2E Trace Replay Suite.
//!
//! End-to-end tests for the trace replay pipeline:
//! - Explore → capture failing trace → replay → identical bug report
//! - Same-strategy determinism across runs
//! - File persistence roundtrip (JSON and MessagePack)
//! - Divergence diagnostics when the program changed

#[macro_use]
mod common;

use actorlab::error::StrategyError;
use actorlab::lab::{
    BugReport, Configuration, DfsStrategy, Explorer, IterationResult, Strategy, run_iteration,
};
use actorlab::observability::NullObserver;
use actorlab::trace::{Decision, Trace};
use actorlab::{ConfigurationError, TraceFormatError};
use common::*;
use tempfile::tempdir;

fn init_test(test_name: &str) {
    init_test_logging();
    test_phase!(test_name);
}

/// Explore the racy program and return the first bug.
fn first_race_bug(config: Configuration) -> BugReport {
    let explorer = Explorer::new(race_program(false), config).expect("explorer");
    let report = explorer.run().expect("exploration");
    report.first_bug().cloned().expect("race found")
}

fn assert_same_bug(original: &BugReport, replayed: &IterationResult) {
    let replayed = replayed.bug().expect("replay reproduces a bug");
    assert_eq!(replayed.kind, original.kind);
    assert_eq!(replayed.actor, original.actor);
    assert_eq!(replayed.state, original.state);
    assert_eq!(replayed.message, original.message);
    assert_eq!(replayed.steps, original.steps);
    assert_eq!(replayed.trace.decisions(), original.trace.decisions());
    assert_eq!(replayed.trace.fingerprint(), original.trace.fingerprint());
}

// =========================================================================
// Record → Replay Determinism
// =========================================================================

/// Verify that two explorations with the same configuration produce identical traces.
#[test]
fn same_configuration_produces_identical_traces() {
    init_test("same_configuration_produces_identical_traces");

    test_section!("dfs");
    let first = first_race_bug(Configuration::dfs());
    let second = first_race_bug(Configuration::dfs());
    assert_with_log!(
        first == second,
        "dfs bug reports match",
        first.trace.len(),
        second.trace.len()
    );

    test_section!("random");
    let first = first_race_bug(Configuration::random(0xCAFE_BABE).iterations(500));
    let second = first_race_bug(Configuration::random(0xCAFE_BABE).iterations(500));
    assert_eq!(first, second);

    test_complete!("same_configuration_produces_identical_traces");
}

#[test]
fn replay_reproduces_dfs_bug_exactly() {
    init_test("replay_reproduces_dfs_bug_exactly");

    let bug = first_race_bug(Configuration::dfs());
    let explorer = Explorer::new(race_program(false), Configuration::dfs()).expect("explorer");
    let replayed = explorer.replay(bug.trace.clone()).expect("replay");
    assert_same_bug(&bug, &replayed);

    test_complete!("replay_reproduces_dfs_bug_exactly", decisions = bug.trace.len());
}

#[test]
fn replay_reproduces_random_bug_exactly() {
    init_test("replay_reproduces_random_bug_exactly");

    let bug = first_race_bug(Configuration::random(99).iterations(500));
    let explorer = Explorer::new(race_program(false), Configuration::replay(bug.trace.clone()))
        .expect("explorer");
    let report = explorer.run().expect("replay run");
    assert_eq!(report.iterations_run, 1);
    assert_eq!(report.bugs_found, 1);
    let replayed = report.first_bug().expect("bug");
    assert_eq!(replayed.message, bug.message);
    assert_eq!(replayed.trace.decisions(), bug.trace.decisions());
    assert_eq!(replayed.trace.metadata().seed, bug.trace.metadata().seed);

    test_complete!("replay_reproduces_random_bug_exactly");
}

#[test]
fn replay_run_reports_the_recorded_iteration() {
    init_test("replay_run_reports_the_recorded_iteration");

    let bug = first_race_bug(Configuration::random(99).iterations(500));
    assert_eq!(bug.trace.metadata().iteration, bug.iteration);

    test_section!("explorer run");
    let explorer = Explorer::new(race_program(false), Configuration::replay(bug.trace.clone()))
        .expect("explorer");
    let report = explorer.run().expect("replay run");
    let from_run = report.first_bug().expect("bug").iteration;
    assert_with_log!(
        from_run == bug.iteration,
        "run keeps the recorded iteration",
        bug.iteration,
        from_run
    );

    test_section!("direct replay");
    let replayed = explorer.replay(bug.trace.clone()).expect("replay");
    assert_eq!(replayed.iteration(), from_run);

    test_complete!("replay_run_reports_the_recorded_iteration", iteration = from_run);
}

#[test]
fn replay_reproduces_choice_decisions() {
    init_test("replay_reproduces_choice_decisions");

    let explorer = Explorer::new(
        choice_program(vec![3, 2]),
        Configuration::dfs().continue_after_bug(true),
    )
    .expect("explorer");
    let report = explorer.run().expect("run");
    assert_eq!(report.iterations_run, 6);

    // Rebuild the last path from a fresh DFS pass and replay it.
    let mut last = None;
    let mut strategy = DfsStrategy::new();
    let mut observer = NullObserver;
    let mut iteration = 0;
    while strategy.begin_iteration(iteration) {
        let result = run_iteration(
            explorer.program(),
            explorer.config(),
            &mut strategy,
            &mut observer,
            iteration,
        )
        .expect("iteration");
        strategy.finish_iteration().expect("finish");
        last = Some(result);
        iteration += 1;
    }
    let last = last.expect("at least one iteration");
    let values: Vec<u64> = last
        .trace()
        .decisions()
        .iter()
        .filter_map(|record| match record.decision {
            Decision::Choice { value, .. } => Some(value.as_u64()),
            Decision::NextActor { .. } => None,
        })
        .collect();
    assert_eq!(values, vec![2, 1]);

    let replayed = explorer.replay(last.trace().clone()).expect("replay");
    assert!(matches!(replayed, IterationResult::Completed(_)));
    assert_eq!(replayed.trace().decisions(), last.trace().decisions());

    test_complete!("replay_reproduces_choice_decisions");
}

// =========================================================================
// File persistence
// =========================================================================

#[test]
fn trace_file_roundtrip_json_and_msgpack() {
    init_test("trace_file_roundtrip_json_and_msgpack");

    let bug = first_race_bug(Configuration::dfs());
    let dir = tempdir().expect("tempdir");

    test_section!("json");
    let json_path = dir.path().join("bug.json");
    bug.trace.save(&json_path).expect("save json");
    let text = std::fs::read_to_string(&json_path).expect("read json");
    assert!(text.contains("next_actor"), "{text}");
    let loaded = Trace::load(&json_path).expect("load json");
    assert_eq!(loaded, bug.trace);

    test_section!("msgpack");
    let bin_path = dir.path().join("bug.trace");
    bug.trace.save(&bin_path).expect("save msgpack");
    let loaded = Trace::load(&bin_path).expect("load msgpack");
    assert_eq!(loaded, bug.trace);
    let size = std::fs::metadata(&bin_path).expect("metadata").len();
    assert!(size < text.len() as u64, "msgpack {size} vs json {}", text.len());

    test_section!("replay from file");
    let explorer = Explorer::new(race_program(false), Configuration::dfs()).expect("explorer");
    let replayed = explorer.replay(loaded).expect("replay");
    assert_same_bug(&bug, &replayed);

    test_complete!("trace_file_roundtrip_json_and_msgpack");
}

#[test]
fn corrupt_trace_file_is_a_format_error() {
    init_test("corrupt_trace_file_is_a_format_error");

    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not a trace").expect("write");
    let err = Trace::load(&path).expect_err("corrupt");
    assert!(matches!(err, TraceFormatError::Json(_)), "{err}");

    let missing = dir.path().join("missing.trace");
    let err = Trace::load(&missing).expect_err("missing");
    assert!(matches!(err, TraceFormatError::Io(_)), "{err}");

    test_complete!("corrupt_trace_file_is_a_format_error");
}

// =========================================================================
// Divergence
// =========================================================================

/// A trace captured against the racy server no longer fits the fixed one:
/// the fixed server defers `USE`, so the enabled set differs.
#[test]
fn replay_against_changed_program_diverges() {
    init_test("replay_against_changed_program_diverges");

    let bug = first_race_bug(Configuration::dfs());
    let fixed = Explorer::new(race_program(true), Configuration::dfs()).expect("explorer");
    let err = fixed.replay(bug.trace).expect_err("divergence");
    tracing::info!(%err, "divergence detected");
    assert!(
        matches!(
            err,
            ConfigurationError::Strategy(StrategyError::Divergence { point: 1, .. })
        ),
        "{err:?}"
    );

    test_complete!("replay_against_changed_program_diverges");
}

#[test]
fn truncated_trace_is_exhausted() {
    init_test("truncated_trace_is_exhausted");

    let explorer = Explorer::new(handoff_program(), Configuration::dfs()).expect("explorer");
    let report = explorer.run().expect("run");
    assert_eq!(report.completed, 1);

    let bug = first_race_bug(Configuration::dfs());
    let mut json: serde_json::Value =
        serde_json::from_str(&bug.trace.to_json().expect("json")).expect("value");
    json["decisions"]
        .as_array_mut()
        .expect("decisions array")
        .truncate(1);
    let truncated = Trace::from_json(&json.to_string()).expect("truncated trace");
    let racy = Explorer::new(race_program(false), Configuration::dfs()).expect("explorer");
    let err = racy.replay(truncated).expect_err("exhausted");
    assert!(
        matches!(
            err,
            ConfigurationError::Strategy(StrategyError::TraceExhausted { point: 1 })
        ),
        "{err:?}"
    );

    test_complete!("truncated_trace_is_exhausted");
}
