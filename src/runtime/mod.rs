//! Actor runtime.
//!
//! - [`mailbox`]: Per-actor event queue with priority and deferral
//! - `registry`: The per-iteration actor table
//! - `executor`: Runs one actor step and applies state transitions
//!
//! The registry and executor are internal; the exploration engine in
//! [`lab`](crate::lab) drives them.

pub(crate) mod executor;
pub mod mailbox;
pub(crate) mod registry;

pub use mailbox::Mailbox;
pub use registry::ActorStatus;
