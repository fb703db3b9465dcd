//! Actor declarations.
//!
//! An actor kind is a hierarchical state machine: named states with entry and
//! exit actions and, per state, at most one rule for each event kind:
//!
//! - `on_event_goto`: leave the state stack and enter another state
//! - `on_event_push`: enter another state on top of the current one
//! - `on_event_do`: run an action, stay in the state
//! - `defer`: leave the event queued until a state that does not defer it
//! - `ignore`: drop the event
//!
//! Declarations are compiled once into lookup tables keyed by
//! `(state, event kind)`; nothing is dispatched by name at run time.

pub mod context;
pub mod kind;
pub mod program;
pub mod state;

pub use context::Ctx;
pub use kind::{ActorKind, ActorKindBuilder};
pub use program::{Program, ProgramBuilder, Setup};
pub use state::StateBuilder;
