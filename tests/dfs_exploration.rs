#![allow(missing_docs)]
//! DFS completeness on finite decision trees.
//!
//! For programs whose decision tree is finite, exhaustive DFS must visit every
//! leaf exactly once: the iteration count equals the number of distinct
//! decision paths and no two iterations share a trace.

#[macro_use]
mod common;

use actorlab::lab::{Configuration, Explorer};
use common::*;
use proptest::prelude::*;

fn factorial(n: u64) -> u64 {
    (1..=n).product()
}

/// Number of interleavings of `actors` sequences of `events` steps each.
fn interleavings(actors: u64, events: u64) -> u64 {
    factorial(actors * events) / factorial(events).pow(actors as u32)
}

fn explore_all(program: actorlab::Program) -> actorlab::ExplorationReport {
    Explorer::new(program, Configuration::dfs().iterations(100_000))
        .expect("explorer")
        .run()
        .expect("exploration")
}

#[test]
fn two_actors_two_events_interleave_six_ways() {
    init_test_logging();
    test_phase!("two_actors_two_events_interleave_six_ways");

    let report = explore_all(interleaving_program(2, 2));
    assert_with_log!(
        report.iterations_run == 6,
        "C(4,2) interleavings",
        6,
        report.iterations_run
    );
    assert_eq!(report.unique_paths, 6);
    assert_eq!(report.completed, 6);
    assert!(report.exhausted);

    test_complete!("two_actors_two_events_interleave_six_ways");
}

#[test]
fn iteration_limit_stops_before_exhaustion() {
    init_test_logging();
    test_phase!("iteration_limit_stops_before_exhaustion");

    let report = Explorer::new(interleaving_program(3, 2), Configuration::dfs().iterations(10))
        .expect("explorer")
        .run()
        .expect("exploration");
    assert_eq!(report.iterations_run, 10);
    assert_eq!(report.unique_paths, 10);
    assert!(!report.exhausted);

    test_complete!("iteration_limit_stops_before_exhaustion");
}

#[test]
fn binary_choices_multiply_the_paths() {
    init_test_logging();
    test_phase!("binary_choices_multiply_the_paths");

    let report = explore_all(choice_program(vec![2, 2, 2]));
    assert_eq!(report.iterations_run, 8);
    assert_eq!(report.unique_paths, 8);

    test_complete!("binary_choices_multiply_the_paths");
}

proptest! {
    #![proptest_config(test_proptest_config(24))]

    #[test]
    fn dfs_visits_every_choice_path_once(widths in prop::collection::vec(1u64..=3, 1..=4)) {
        init_test_logging();
        let expected: u64 = widths.iter().product();
        let report = explore_all(choice_program(widths));
        prop_assert_eq!(report.iterations_run, expected);
        prop_assert_eq!(report.unique_paths, expected);
        prop_assert_eq!(report.completed, expected);
        prop_assert!(report.exhausted);
    }

    #[test]
    fn dfs_visits_every_interleaving_once(actors in 1usize..=3, events in 1usize..=3) {
        init_test_logging();
        let expected = interleavings(actors as u64, events as u64);
        let report = explore_all(interleaving_program(actors, events));
        prop_assert_eq!(report.iterations_run, expected);
        prop_assert_eq!(report.unique_paths, expected);
        prop_assert!(report.exhausted);
    }
}
