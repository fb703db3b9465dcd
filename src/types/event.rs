//! Events exchanged between actors.

use core::fmt;
use std::any::Any;
use std::sync::Arc;

/// The kind of an event, used to look up transitions.
///
/// Kinds are compared by name, so two kinds built from the same string are
/// the same kind.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKind(&'static str);

impl EventKind {
    /// The built-in halt event. When no state on the receiver's stack handles
    /// it, the receiver halts instead of reporting an unhandled event.
    pub const HALT: Self = Self("halt");

    /// Creates an event kind.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the kind's name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Debug for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventKind({})", self.0)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Delivery priority of an event.
///
/// Higher values are dequeued first; `major` is compared before `minor`.
/// Events of equal priority are dequeued in send order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Priority {
    /// Primary priority.
    pub major: i32,
    /// Tie-breaker for equal `major`.
    pub minor: i32,
}

impl Priority {
    /// The default priority `(0, 0)`.
    pub const NORMAL: Self = Self::new(0, 0);

    /// Creates a priority.
    #[must_use]
    pub const fn new(major: i32, minor: i32) -> Self {
        Self { major, minor }
    }
}

/// An immutable message with a kind, an optional payload and a priority.
///
/// Cloning an event is cheap: the payload is shared.
#[derive(Clone)]
pub struct Event {
    kind: EventKind,
    payload: Option<Arc<dyn Any + Send + Sync>>,
    priority: Priority,
}

impl Event {
    /// Creates an event without payload at normal priority.
    #[must_use]
    pub const fn new(kind: EventKind) -> Self {
        Self {
            kind,
            payload: None,
            priority: Priority::NORMAL,
        }
    }

    /// Attaches a payload.
    #[must_use]
    pub fn with_payload<T: Any + Send + Sync>(mut self, payload: T) -> Self {
        self.payload = Some(Arc::new(payload));
        self
    }

    /// Sets the delivery priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Returns the event kind.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the payload if it has type `T`.
    #[must_use]
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref()?.downcast_ref::<T>()
    }

    /// Returns true if the event carries a payload of any type.
    #[must_use]
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("kind", &self.kind.name())
            .field("has_payload", &self.payload.is_some())
            .field("priority", &self.priority)
            .finish()
    }
}

impl From<EventKind> for Event {
    fn from(kind: EventKind) -> Self {
        Self::new(kind)
    }
}
