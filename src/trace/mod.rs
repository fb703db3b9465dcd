//! Scheduling traces.
//!
//! Every scheduling point of an iteration appends one [`ScheduleDecision`]:
//! which actor stepped, or which value a choice returned, together with the
//! set of alternatives that were available. The resulting [`Trace`] is enough
//! to drive the replay strategy through the identical execution.

pub mod decision;
pub mod schedule;

pub use decision::{ChoiceValue, Decision, ScheduleDecision};
pub use schedule::{TRACE_SCHEMA_VERSION, Trace, TraceMetadata};
