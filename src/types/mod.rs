//! Core types shared by the runtime and the exploration engine.
//!
//! - [`id`]: Actor identifiers
//! - [`event`]: Event kinds, priorities and event values

pub mod event;
pub mod id;

pub use event::{Event, EventKind, Priority};
pub use id::ActorId;
