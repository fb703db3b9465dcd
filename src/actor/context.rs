//! Handler context.
//!
//! Every entry, exit and event action receives a [`Ctx`]. It is the only way
//! handler code talks to the runtime: sending events, creating actors,
//! requesting nondeterministic choices and requesting one control operation
//! (raise, goto, pop or halt) that the runtime applies after the handler
//! returns.

use std::any::Any;

use crate::actor::state::StateId;
use crate::error::{HandlerError, HandlerResult};
use crate::types::{ActorId, Event};

/// Operations the runtime exposes to handler code.
pub(crate) trait RuntimeOps {
    fn create_actor(
        &mut self,
        creator: Option<ActorId>,
        kind: &str,
        init: Option<Event>,
    ) -> Result<ActorId, HandlerError>;

    fn send_event(&mut self, from: Option<ActorId>, target: ActorId, event: Event);

    fn choose(&mut self, actor: ActorId, bound: u64, boolean: bool) -> Result<u64, HandlerError>;

    fn resolve_state(&mut self, actor: ActorId, name: &str) -> Result<StateId, HandlerError>;

    fn current_state(&self, actor: ActorId) -> Option<&'static str>;
}

/// Which kind of handler is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Entry,
    Exit,
    Action,
}

/// A control operation requested by a handler.
#[derive(Debug, Clone)]
pub(crate) enum ControlOp {
    Raise(Event),
    Goto {
        target: StateId,
        received: Option<Event>,
    },
    Pop,
    Halt,
}

impl ControlOp {
    const fn name(&self) -> &'static str {
        match self {
            Self::Raise(_) => "raise",
            Self::Goto { .. } => "goto",
            Self::Pop => "pop",
            Self::Halt => "halt",
        }
    }
}

/// Context passed to handler code for one invocation.
pub struct Ctx<'a> {
    rt: &'a mut (dyn RuntimeOps + 'a),
    me: ActorId,
    phase: Phase,
    received: Option<Event>,
    control: Option<ControlOp>,
}

impl<'a> Ctx<'a> {
    pub(crate) fn new(
        rt: &'a mut (dyn RuntimeOps + 'a),
        me: ActorId,
        phase: Phase,
        received: Option<Event>,
    ) -> Self {
        Self {
            rt,
            me,
            phase,
            received,
            control: None,
        }
    }

    pub(crate) fn take_control(&mut self) -> Option<ControlOp> {
        self.control.take()
    }

    /// The running actor's id.
    #[must_use]
    pub fn id(&self) -> ActorId {
        self.me
    }

    /// The event being handled.
    ///
    /// In an entry action this is the event that caused the transition, or the
    /// init event passed to `create_with` for a start state.
    #[must_use]
    pub fn received(&self) -> Option<&Event> {
        self.received.as_ref()
    }

    /// The received event's payload, if present and of type `T`.
    #[must_use]
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.received.as_ref()?.payload::<T>()
    }

    /// Name of the running actor's current (top) state.
    #[must_use]
    pub fn current_state(&self) -> &'static str {
        self.rt.current_state(self.me).unwrap_or("<halted>")
    }

    /// Enqueues `event` on `target`'s mailbox. Never blocks.
    ///
    /// Sending to a halted actor is dropped, or reported under
    /// [`HaltedSendPolicy::Report`](crate::lab::HaltedSendPolicy::Report).
    pub fn send(&mut self, target: ActorId, event: impl Into<Event>) {
        self.rt.send_event(Some(self.me), target, event.into());
    }

    /// Creates an actor of `kind`. Its start state's entry action runs before
    /// this returns.
    pub fn create(&mut self, kind: &str) -> Result<ActorId, HandlerError> {
        self.rt.create_actor(Some(self.me), kind, None)
    }

    /// Creates an actor of `kind`, handing `init` to its start state's entry action.
    pub fn create_with(
        &mut self,
        kind: &str,
        init: impl Into<Event>,
    ) -> Result<ActorId, HandlerError> {
        self.rt.create_actor(Some(self.me), kind, Some(init.into()))
    }

    /// Nondeterministic boolean, decided by the active strategy.
    pub fn random_bool(&mut self) -> Result<bool, HandlerError> {
        Ok(self.rt.choose(self.me, 2, true)? == 1)
    }

    /// Nondeterministic integer in `[0, bound)`, decided by the active strategy.
    pub fn random_int(&mut self, bound: u64) -> Result<u64, HandlerError> {
        if bound == 0 {
            return Err(HandlerError::Assertion(
                "random_int requires a non-zero bound".to_string(),
            ));
        }
        self.rt.choose(self.me, bound, false)
    }

    /// Handles `event` immediately after this handler returns, before any
    /// other actor runs.
    pub fn raise(&mut self, event: impl Into<Event>) -> HandlerResult {
        self.request(ControlOp::Raise(event.into()))
    }

    /// Leaves the current state stack and enters `state` after this handler returns.
    pub fn goto(&mut self, state: &str) -> HandlerResult {
        let target = self.rt.resolve_state(self.me, state)?;
        let received = self.received.clone();
        self.request(ControlOp::Goto { target, received })
    }

    /// Pops the current state after this handler returns.
    pub fn pop(&mut self) -> HandlerResult {
        self.request(ControlOp::Pop)
    }

    /// Halts this actor after this handler returns.
    pub fn halt(&mut self) -> HandlerResult {
        self.request(ControlOp::Halt)
    }

    /// Fails the iteration with an assertion violation unless `condition` holds.
    pub fn assert(&self, condition: bool, message: impl Into<String>) -> HandlerResult {
        if condition {
            Ok(())
        } else {
            Err(HandlerError::Assertion(message.into()))
        }
    }

    fn request(&mut self, op: ControlOp) -> HandlerResult {
        if self.phase == Phase::Exit {
            return Err(HandlerError::Assertion(format!(
                "`{}` is not permitted in an exit action",
                op.name()
            )));
        }
        if let Some(previous) = &self.control {
            return Err(HandlerError::Assertion(format!(
                "handler requested `{}` after `{}`; at most one control operation per handler",
                op.name(),
                previous.name()
            )));
        }
        self.control = Some(op);
        Ok(())
    }
}

impl std::fmt::Debug for Ctx<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ctx")
            .field("me", &self.me)
            .field("phase", &self.phase)
            .field("received", &self.received)
            .field("control", &self.control)
            .finish()
    }
}
