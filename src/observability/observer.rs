//! Execution observers.
//!
//! The executor reports every actor lifecycle change to an injected
//! [`Observer`] instead of writing to a shared output sink. Tests use
//! [`RecordingObserver`] to assert on what happened; [`LogObserver`] turns the
//! same callbacks into `tracing` events filtered by [`Verbosity`].

use crate::lab::report::IterationResult;
use crate::observability::Verbosity;
use crate::trace::ChoiceValue;
use crate::tracing_compat::{debug, info, trace};
use crate::types::{ActorId, EventKind};

/// Receives execution callbacks. Every hook defaults to doing nothing.
#[allow(unused_variables)]
pub trait Observer {
    /// An iteration is about to run the program's entry action.
    fn on_iteration_start(&mut self, iteration: u64) {}

    /// An actor was created. `creator` is `None` for the entry action.
    fn on_actor_created(&mut self, actor: ActorId, kind: &str, creator: Option<ActorId>) {}

    /// An event was sent; `delivered` is false if the target had halted.
    fn on_send(&mut self, from: Option<ActorId>, to: ActorId, event: EventKind, delivered: bool) {}

    /// An actor dequeued an event while in `state`.
    fn on_dequeue(&mut self, actor: ActorId, event: EventKind, state: &str) {}

    /// An actor raised an event for itself.
    fn on_raise(&mut self, actor: ActorId, event: EventKind) {}

    /// A state was pushed onto an actor's stack.
    fn on_state_push(&mut self, actor: ActorId, state: &str) {}

    /// A state was popped off an actor's stack.
    fn on_state_pop(&mut self, actor: ActorId, state: &str) {}

    /// An actor halted.
    fn on_halt(&mut self, actor: ActorId) {}

    /// A choice was resolved.
    fn on_choice(&mut self, actor: ActorId, value: ChoiceValue) {}

    /// An iteration ended.
    fn on_iteration_end(&mut self, iteration: u64, result: &IterationResult) {}
}

/// Ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl Observer for NullObserver {}

/// Emits `tracing` events for callbacks at or below its verbosity.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver {
    verbosity: Verbosity,
}

impl LogObserver {
    /// Creates an observer logging at `verbosity`.
    #[must_use]
    pub const fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    /// The configured verbosity.
    #[must_use]
    pub const fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    const fn shows(&self, level: Verbosity) -> bool {
        self.verbosity.is_at_least(level)
    }
}

impl Observer for LogObserver {
    fn on_iteration_start(&mut self, iteration: u64) {
        if self.shows(Verbosity::Steps) {
            debug!(iteration, "iteration started");
        }
    }

    fn on_actor_created(&mut self, actor: ActorId, kind: &str, creator: Option<ActorId>) {
        if self.shows(Verbosity::Steps) {
            debug!(actor = %actor, kind, creator = ?creator, "created actor");
        }
    }

    fn on_send(&mut self, from: Option<ActorId>, to: ActorId, event: EventKind, delivered: bool) {
        if self.shows(Verbosity::Full) {
            trace!(from = ?from, to = %to, event = %event, delivered, "send");
        }
    }

    fn on_dequeue(&mut self, actor: ActorId, event: EventKind, state: &str) {
        if self.shows(Verbosity::Steps) {
            debug!(actor = %actor, event = %event, state, "dequeue");
        }
    }

    fn on_raise(&mut self, actor: ActorId, event: EventKind) {
        if self.shows(Verbosity::Full) {
            trace!(actor = %actor, event = %event, "raise");
        }
    }

    fn on_state_push(&mut self, actor: ActorId, state: &str) {
        if self.shows(Verbosity::Full) {
            trace!(actor = %actor, state, "push state");
        }
    }

    fn on_state_pop(&mut self, actor: ActorId, state: &str) {
        if self.shows(Verbosity::Full) {
            trace!(actor = %actor, state, "pop state");
        }
    }

    fn on_halt(&mut self, actor: ActorId) {
        if self.shows(Verbosity::Steps) {
            debug!(actor = %actor, "halted");
        }
    }

    fn on_choice(&mut self, actor: ActorId, value: ChoiceValue) {
        if self.shows(Verbosity::Steps) {
            debug!(actor = %actor, ?value, "choice");
        }
    }

    fn on_iteration_end(&mut self, iteration: u64, result: &IterationResult) {
        if let Some(bug) = result.bug() {
            if self.shows(Verbosity::Bugs) {
                info!(iteration, kind = %bug.kind, message = %bug.message, "bug found");
            }
        } else if self.shows(Verbosity::Steps) {
            debug!(iteration, outcome = result.label(), steps = result.steps(), "iteration finished");
        }
    }
}

/// One recorded callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// See [`Observer::on_iteration_start`].
    IterationStart(u64),
    /// See [`Observer::on_actor_created`].
    Created {
        /// New actor.
        actor: ActorId,
        /// Its kind.
        kind: String,
        /// Creating actor.
        creator: Option<ActorId>,
    },
    /// See [`Observer::on_send`].
    Send {
        /// Sender, `None` for the entry action.
        from: Option<ActorId>,
        /// Target.
        to: ActorId,
        /// Event kind.
        event: EventKind,
        /// False if the target had halted.
        delivered: bool,
    },
    /// See [`Observer::on_dequeue`].
    Dequeue {
        /// Receiving actor.
        actor: ActorId,
        /// Event kind.
        event: EventKind,
        /// Top state at dequeue time.
        state: String,
    },
    /// See [`Observer::on_raise`].
    Raise(ActorId, EventKind),
    /// See [`Observer::on_state_push`].
    Push(ActorId, String),
    /// See [`Observer::on_state_pop`].
    Pop(ActorId, String),
    /// See [`Observer::on_halt`].
    Halt(ActorId),
    /// See [`Observer::on_choice`].
    Choice(ActorId, ChoiceValue),
    /// See [`Observer::on_iteration_end`].
    IterationEnd {
        /// Iteration index.
        iteration: u64,
        /// Outcome label.
        outcome: &'static str,
    },
}

/// Records every callback in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    events: Vec<Observation>,
}

impl RecordingObserver {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    #[must_use]
    pub fn events(&self) -> &[Observation] {
        &self.events
    }

    /// Discards the recording.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Names of the states `actor` entered, in order.
    #[must_use]
    pub fn pushes(&self, actor: ActorId) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Observation::Push(id, state) if *id == actor => Some(state.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Names of the states `actor` left, in order.
    #[must_use]
    pub fn pops(&self, actor: ActorId) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Observation::Pop(id, state) if *id == actor => Some(state.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Event kinds `actor` dequeued, in order.
    #[must_use]
    pub fn dequeued(&self, actor: ActorId) -> Vec<EventKind> {
        self.events
            .iter()
            .filter_map(|event| match event {
                Observation::Dequeue { actor: id, event, .. } if *id == actor => Some(*event),
                _ => None,
            })
            .collect()
    }
}

impl Observer for RecordingObserver {
    fn on_iteration_start(&mut self, iteration: u64) {
        self.events.push(Observation::IterationStart(iteration));
    }

    fn on_actor_created(&mut self, actor: ActorId, kind: &str, creator: Option<ActorId>) {
        self.events.push(Observation::Created {
            actor,
            kind: kind.to_string(),
            creator,
        });
    }

    fn on_send(&mut self, from: Option<ActorId>, to: ActorId, event: EventKind, delivered: bool) {
        self.events.push(Observation::Send {
            from,
            to,
            event,
            delivered,
        });
    }

    fn on_dequeue(&mut self, actor: ActorId, event: EventKind, state: &str) {
        self.events.push(Observation::Dequeue {
            actor,
            event,
            state: state.to_string(),
        });
    }

    fn on_raise(&mut self, actor: ActorId, event: EventKind) {
        self.events.push(Observation::Raise(actor, event));
    }

    fn on_state_push(&mut self, actor: ActorId, state: &str) {
        self.events.push(Observation::Push(actor, state.to_string()));
    }

    fn on_state_pop(&mut self, actor: ActorId, state: &str) {
        self.events.push(Observation::Pop(actor, state.to_string()));
    }

    fn on_halt(&mut self, actor: ActorId) {
        self.events.push(Observation::Halt(actor));
    }

    fn on_choice(&mut self, actor: ActorId, value: ChoiceValue) {
        self.events.push(Observation::Choice(actor, value));
    }

    fn on_iteration_end(&mut self, iteration: u64, result: &IterationResult) {
        self.events.push(Observation::IterationEnd {
            iteration,
            outcome: result.label(),
        });
    }
}
