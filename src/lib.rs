//! Actorlab: an actor state-machine runtime with systematic schedule exploration.
//!
//! # Overview
//!
//! Programs are built from actor kinds: hierarchical state machines that
//! exchange events through per-actor mailboxes. The exploration engine runs a
//! program many times, and every point where behavior is nondeterministic (which
//! actor dequeues next, what value a choice returns) is decided by a pluggable
//! strategy. Every decision is recorded, so a failing execution can be
//! replayed exactly.
//!
//! # Core Guarantees
//!
//! - **Cooperative, deterministic steps**: one actor step is in flight at a time;
//!   control is only yielded at scheduling points
//! - **Exhaustive search**: depth-first exploration visits every distinct decision
//!   path of a finite program exactly once
//! - **Exact replay**: a recorded trace reproduces the same bug report
//! - **Typed failure taxonomy**: assertion violations, unhandled events, deadlocks
//!   and budget exhaustion are iteration outcomes; only configuration errors
//!   escape a run
//!
//! # Module Structure
//!
//! - [`types`]: Identifiers and events
//! - [`actor`]: Actor kind declarations, states, handler context, programs
//! - [`runtime`]: Mailboxes, the actor registry and the step executor
//! - [`lab`]: Strategies, configuration, the exploration engine and reports
//! - [`trace`](mod@trace): Scheduling decisions, traces and their persistence
//! - [`observability`]: Injected observers and verbosity levels
//! - [`util`]: Deterministic hashing and RNG
//! - [`error`](mod@error): Error types
//! - [`tracing_compat`]: Optional tracing integration (requires `tracing-integration` feature)
//!
//! # Example
//!
//! ```
//! use actorlab::actor::{ActorKindBuilder, Program, StateBuilder};
//! use actorlab::lab::{Configuration, Explorer};
//! use actorlab::types::{Event, EventKind};
//!
//! const PING: EventKind = EventKind::new("ping");
//!
//! let server = ActorKindBuilder::<()>::new("Server")
//!     .state(StateBuilder::new("Idle").start().on_event_do(PING, |_, ctx| ctx.halt()))
//!     .build()
//!     .unwrap();
//!
//! let program = Program::builder()
//!     .kind(server)
//!     .entry(|setup| {
//!         let server = setup.create("Server")?;
//!         setup.send(server, Event::new(PING));
//!         Ok(())
//!     })
//!     .build()
//!     .unwrap();
//!
//! let report = Explorer::new(program, Configuration::default())
//!     .unwrap()
//!     .run()
//!     .unwrap();
//! assert_eq!(report.bugs_found, 0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_inception)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]

pub mod actor;
pub mod error;
pub mod lab;
pub mod observability;
pub mod runtime;
pub mod trace;
pub mod tracing_compat;
pub mod types;
pub mod util;

#[cfg(any(test, feature = "test-internals"))]
pub mod test_utils;

pub use actor::{ActorKind, ActorKindBuilder, Ctx, Program, ProgramBuilder, Setup, StateBuilder};
pub use error::{ConfigurationError, HandlerError, HandlerResult, StrategyError, TraceFormatError};
pub use lab::{
    BugKind, BugReport, Configuration, ExplorationReport, Explorer, IterationResult, StrategyKind,
};
pub use trace::Trace;
pub use types::{ActorId, Event, EventKind, Priority};
