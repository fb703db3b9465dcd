//! Systematic exploration lab.
//!
//! The lab provides:
//!
//! - Pluggable strategies (exhaustive DFS, seeded random, trace replay)
//! - Single-iteration execution with deadlock and budget detection
//! - Bug classification and exploration reports
//! - Exact replay of a recorded trace
//! - Parallel random exploration
//!
//! # Quick Start
//!
//! ```ignore
//! use actorlab::lab::{Configuration, Explorer};
//!
//! let explorer = Explorer::new(program, Configuration::dfs().iterations(10_000))?;
//! let report = explorer.run()?;
//! if let Some(bug) = report.first_bug() {
//!     bug.trace.save("bug.trace")?;
//!     let again = explorer.replay(bug.trace.clone())?;
//!     assert_eq!(again.bug(), Some(bug));
//! }
//! ```

pub mod config;
pub mod engine;
pub mod explorer;
pub mod report;
pub mod strategy;

pub use config::{
    Configuration, FailurePolicy, HaltedSendPolicy, StrategyKind, UnhandledEventPolicy,
};
pub use engine::run_iteration;
pub use explorer::Explorer;
pub use report::{
    BugKind, BugReport, ExplorationReport, IterationResult, IterationSummary, MAX_RETAINED_BUGS,
    MAX_TRACKED_PATHS,
};
pub use strategy::{
    ChoiceRequest, DfsStrategy, RandomStrategy, ReplayStrategy, SchedulingPoint, Strategy,
};
