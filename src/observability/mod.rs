//! Observability for exploration runs.
//!
//! - [`Verbosity`]: how much a run reports
//! - [`Observer`]: injected callbacks for actor lifecycle and scheduling events
//! - [`LogObserver`], [`RecordingObserver`], [`NullObserver`]: the built-in observers
//!
//! Structured logging goes through `tracing` (see `tracing_compat`); observers
//! are the hook for anything that needs to inspect an execution in-process.

pub mod observer;
pub mod verbosity;

pub use observer::{LogObserver, NullObserver, Observation, Observer, RecordingObserver};
pub use verbosity::Verbosity;
