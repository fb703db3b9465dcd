//! Test utilities for actorlab.
//!
//! This module provides shared helpers for unit tests:
//! - Consistent tracing-based logging initialization
//! - Phase/section macros for readable test output
//! - Configuration and program helpers
//!
//! # Example
//! ```ignore
//! use actorlab::test_utils::{init_test_logging, quick_dfs};
//!
//! init_test_logging();
//! let report = Explorer::new(program, quick_dfs())?.run()?;
//! ```

use std::sync::Once;

use tracing_subscriber::fmt::format::FmtSpan;

use crate::actor::{ActorKind, ActorKindBuilder, StateBuilder};
use crate::lab::Configuration;

static INIT_LOGGING: Once = Once::new();

/// Default seed used by random-strategy test helpers.
pub const DEFAULT_TEST_SEED: u64 = 0xDEAD_BEEF;

/// Initialize test logging with trace-level output.
///
/// Safe to call multiple times; only initializes once.
pub fn init_test_logging() {
    init_test_logging_with_level(tracing::Level::TRACE);
}

/// Initialize test logging with a custom level.
///
/// The first call wins; later calls are no-ops.
pub fn init_test_logging_with_level(level: tracing::Level) {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_test_writer()
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .try_init();
    });
}

/// DFS configuration with a small step budget, for tests.
#[must_use]
pub fn quick_dfs() -> Configuration {
    Configuration::dfs().iterations(10_000).max_steps(1_000)
}

/// Random configuration seeded with [`DEFAULT_TEST_SEED`].
#[must_use]
pub fn quick_random(iterations: u64) -> Configuration {
    Configuration::random(DEFAULT_TEST_SEED)
        .iterations(iterations)
        .max_steps(1_000)
}

/// An actor kind with a single start state and no rules.
#[must_use]
pub fn inert_kind(name: &'static str) -> ActorKind {
    match ActorKindBuilder::<()>::new(name)
        .state(StateBuilder::new("Init").start())
        .build()
    {
        Ok(kind) => kind,
        Err(err) => unreachable!("inert kind is always valid: {err}"),
    }
}

/// Log a test phase transition with a visual separator.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(phase = %$name, "========================================");
        tracing::info!(phase = %$name, "TEST PHASE: {}", $name);
        tracing::info!(phase = %$name, "========================================");
    };
}

/// Log a section within a test phase.
#[macro_export]
macro_rules! test_section {
    ($name:expr) => {
        tracing::debug!(section = %$name, "--- {} ---", $name);
    };
}

/// Log test completion with summary.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "test completed successfully: {}", $name);
    };
    ($name:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info!(
            test = %$name,
            $($key = %$value,)*
            "test completed successfully: {}",
            $name
        );
    };
}

/// Log before assertions for context.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {
        tracing::debug!(
            expected = ?$expected,
            actual = ?$actual,
            "Asserting: {}",
            $msg
        );
        assert!($cond, "{}: expected {:?}, got {:?}", $msg, $expected, $actual);
    };
}
