//! Step executor.
//!
//! One [`Executor`] owns everything mutable about a single iteration: the
//! actor registry, the trace being recorded and the scheduling point counter.
//! It runs one actor step at a time to completion. Within a step it resolves
//! events against the actor's state stack, runs handlers, and applies the
//! control operations they request. It exposes the runtime operations
//! (create, send, choose) to handler code through [`RuntimeOps`].
//!
//! Failures are never returned from a step. The first fatal condition is
//! stored as an [`Abort`] and the exploration engine classifies it once the
//! step has unwound.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::actor::context::{ControlOp, Ctx, Phase, RuntimeOps};
use crate::actor::kind::ActorKind;
use crate::actor::program::{Program, Setup};
use crate::actor::state::{Handler, Rule, StateId};
use crate::error::{ConfigurationError, HandlerError};
use crate::lab::config::{
    Configuration, FailurePolicy, HaltedSendPolicy, UnhandledEventPolicy,
};
use crate::lab::report::BugKind;
use crate::lab::strategy::{ChoiceRequest, SchedulingPoint, Strategy};
use crate::observability::Observer;
use crate::runtime::registry::{ActorRegistry, ActorSlot};
use crate::trace::{ChoiceValue, Decision, ScheduleDecision, Trace};
use crate::tracing_compat::{debug, trace, warn};
use crate::types::{ActorId, Event, EventKind};

/// Limits and policies the executor applies while stepping.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StepLimits {
    pub(crate) failure_policy: FailurePolicy,
    pub(crate) halted_send_policy: HaltedSendPolicy,
    pub(crate) unhandled_event_policy: UnhandledEventPolicy,
    pub(crate) max_transitions_per_step: u64,
}

impl From<&Configuration> for StepLimits {
    fn from(config: &Configuration) -> Self {
        Self {
            failure_policy: config.failure_policy,
            halted_send_policy: config.halted_send_policy,
            unhandled_event_policy: config.unhandled_event_policy,
            max_transitions_per_step: config.max_transitions_per_step,
        }
    }
}

/// The first fatal condition of an iteration.
#[derive(Debug)]
pub(crate) enum Abort {
    Violation {
        kind: BugKind,
        actor: Option<ActorId>,
        state: Option<&'static str>,
        message: String,
    },
    Budget(String),
    Config(ConfigurationError),
}

/// What remains of an executor once the iteration is over.
#[derive(Debug)]
pub(crate) struct ExecutionRecord {
    pub(crate) trace: Trace,
    pub(crate) steps: u64,
    pub(crate) actors: usize,
    pub(crate) dropped_sends: u64,
}

/// True if `event` is deferred by the first state (top down) that mentions it.
fn defers(kind: &ActorKind, stack: &[StateId], event: EventKind) -> bool {
    for &state in stack.iter().rev() {
        match kind.state(state).rule(event) {
            Some(Rule::Defer) => return true,
            Some(_) => return false,
            None => {}
        }
    }
    false
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

pub(crate) struct Executor<'a> {
    program: &'a Program,
    limits: StepLimits,
    strategy: &'a mut dyn Strategy,
    observer: &'a mut dyn Observer,
    registry: ActorRegistry,
    trace: Trace,
    next_point: u64,
    steps: u64,
    transitions: u64,
    dropped_sends: u64,
    abort: Option<Abort>,
}

impl<'a> Executor<'a> {
    pub(crate) fn new(
        program: &'a Program,
        limits: StepLimits,
        strategy: &'a mut dyn Strategy,
        observer: &'a mut dyn Observer,
        trace: Trace,
    ) -> Self {
        Self {
            program,
            limits,
            strategy,
            observer,
            registry: ActorRegistry::new(),
            trace,
            next_point: 0,
            steps: 0,
            transitions: 0,
            dropped_sends: 0,
            abort: None,
        }
    }

    pub(crate) const fn steps(&self) -> u64 {
        self.steps
    }

    pub(crate) fn take_abort(&mut self) -> Option<Abort> {
        self.abort.take()
    }

    pub(crate) fn finish(self) -> ExecutionRecord {
        ExecutionRecord {
            trace: self.trace,
            steps: self.steps,
            actors: self.registry.len(),
            dropped_sends: self.dropped_sends,
        }
    }

    /// Runs the program's entry action, which creates the initial actors.
    pub(crate) fn run_entry(&mut self) {
        let program = self.program;
        let outcome = {
            let mut setup = Setup::new(&mut *self);
            panic::catch_unwind(AssertUnwindSafe(|| program.run_entry(&mut setup)))
        };
        let error = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(error)) => error,
            Err(payload) => {
                HandlerError::Failure(format!("panicked: {}", panic_message(payload.as_ref())))
            }
        };
        match error {
            HandlerError::Assertion(message) => {
                self.violation(BugKind::AssertionViolation, None, message);
            }
            HandlerError::Failure(message) => self.violation(
                BugKind::AssertionViolation,
                None,
                format!("handler failure: {message}"),
            ),
            HandlerError::Interrupted => self.unexplained_interrupt(None),
        }
    }

    /// Actors with at least one deliverable event, in ascending id order.
    pub(crate) fn enabled(&self) -> Vec<ActorId> {
        let program = self.program;
        self.registry
            .iter()
            .filter(|(_, slot)| {
                let kind = program.kind_at(slot.kind);
                slot.is_active() && slot.has_deliverable(|stack, event| defers(kind, stack, event))
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Active actors that could still consume input: they hold deferred
    /// events or some state on their stack declares a reaction.
    pub(crate) fn waiting(&self) -> Vec<(ActorId, &'static str)> {
        let program = self.program;
        self.registry
            .iter()
            .filter(|(_, slot)| slot.is_active())
            .filter_map(|(id, slot)| {
                let kind = program.kind_at(slot.kind);
                let reactive = slot
                    .stack
                    .iter()
                    .any(|&state| kind.state(state).has_reactions());
                let top = kind.state(slot.top()?).name;
                (reactive || !slot.mailbox.is_empty()).then_some((id, top))
            })
            .collect()
    }

    /// Asks the strategy which enabled actor steps next and records the decision.
    pub(crate) fn schedule(&mut self, enabled: &[ActorId]) -> Result<ActorId, ConfigurationError> {
        let point = self.next_point;
        self.next_point += 1;
        let actor = self
            .strategy
            .next_actor(&SchedulingPoint::new(point, enabled))?;
        if enabled.binary_search(&actor).is_err() {
            return Err(ConfigurationError::OutOfSetDecision {
                point,
                detail: format!("actor {actor} is not in the enabled set {enabled:?}"),
            });
        }
        self.trace.push(ScheduleDecision::new(
            point,
            Decision::NextActor { actor },
            enabled.to_vec(),
        ));
        trace!(point, actor = %actor, enabled = enabled.len(), "scheduled actor");
        Ok(actor)
    }

    /// Dequeues one event for `id` and processes it to completion.
    pub(crate) fn step(&mut self, id: ActorId) {
        self.steps += 1;
        self.transitions = 0;
        let program = self.program;
        let Some(slot) = self.registry.get_mut(id) else {
            return;
        };
        let kind = program.kind_at(slot.kind);
        let Some(event) = slot.dequeue(|stack, event| defers(kind, stack, event)) else {
            return;
        };
        let state = slot.top().map_or("<none>", |top| kind.state(top).name);
        self.observer.on_dequeue(id, event.kind(), state);
        trace!(actor = %id, event = %event.kind(), state, "dequeued event");
        self.process(id, event);
    }

    /// Handles `event` and every event raised while handling it.
    fn process(&mut self, id: ActorId, event: Event) {
        let mut next = Some(event);
        while let Some(event) = next.take() {
            if self.abort.is_some() || !self.registry.is_active(id) || !self.charge() {
                return;
            }
            let op = self.dispatch(id, event);
            next = self.settle(id, op);
        }
    }

    /// Resolves one event against the state stack, top state first.
    fn dispatch(&mut self, id: ActorId, event: Event) -> Option<ControlOp> {
        let program = self.program;
        let slot = self.registry.get(id)?;
        let kind = program.kind_at(slot.kind);
        let top = slot.top().map(|state| kind.state(state).name);
        let found = slot
            .stack
            .iter()
            .rev()
            .enumerate()
            .find_map(|(depth, &state)| {
                kind.state(state)
                    .rule(event.kind())
                    .map(|rule| (depth, rule))
            });

        match found {
            Some((_, Rule::Ignore)) => {
                trace!(actor = %id, event = %event.kind(), "ignored event");
                None
            }
            Some((_, Rule::Defer)) => {
                // Only raised events get here; dequeue already skips deferred kinds.
                if let Some(slot) = self.registry.get_mut(id) {
                    slot.mailbox.push_front(event);
                }
                None
            }
            Some((depth, rule)) => {
                // A rule inherited from an enclosing state first pops the
                // states pushed above it.
                for _ in 0..depth {
                    self.exit_and_pop(id);
                    if self.abort.is_some() || !self.registry.is_active(id) {
                        return None;
                    }
                }
                match rule {
                    Rule::Goto(target) => self.goto_state(id, *target, Some(event)),
                    Rule::Push(target) => self.push_state(id, *target, Some(event)),
                    Rule::Action(handler) => self.invoke(id, handler, Phase::Action, Some(event)),
                    Rule::Defer | Rule::Ignore => None,
                }
            }
            None if event.kind() == EventKind::HALT => {
                self.halt_actor(id);
                None
            }
            None => {
                let state = top.unwrap_or("<none>");
                match self.limits.unhandled_event_policy {
                    UnhandledEventPolicy::Violation => self.violation(
                        BugKind::UnhandledEvent,
                        Some(id),
                        format!(
                            "actor {id} received unhandled event `{}` in state `{state}`",
                            event.kind()
                        ),
                    ),
                    UnhandledEventPolicy::HaltActor => {
                        warn!(
                            actor = %id,
                            event = %event.kind(),
                            state,
                            "unhandled event, halting actor"
                        );
                        self.halt_actor(id);
                    }
                }
                None
            }
        }
    }

    /// Applies a chain of control operations. Returns a raised event, if any,
    /// for the caller to process next.
    fn settle(&mut self, id: ActorId, mut op: Option<ControlOp>) -> Option<Event> {
        while let Some(current) = op.take() {
            if self.abort.is_some() || !self.registry.is_active(id) {
                return None;
            }
            match current {
                ControlOp::Raise(event) => {
                    self.observer.on_raise(id, event.kind());
                    trace!(actor = %id, event = %event.kind(), "raised event");
                    return Some(event);
                }
                ControlOp::Goto { target, received } => {
                    if !self.charge() {
                        return None;
                    }
                    op = self.goto_state(id, target, received);
                }
                ControlOp::Pop => {
                    if !self.charge() {
                        return None;
                    }
                    self.pop_explicit(id);
                }
                ControlOp::Halt => self.halt_actor(id),
            }
        }
        None
    }

    /// Applies control operations requested outside a step (start-state entry
    /// of a freshly created actor) and processes any raised events.
    fn run_control(&mut self, id: ActorId, op: Option<ControlOp>) {
        if let Some(event) = self.settle(id, op) {
            self.process(id, event);
        }
    }

    fn charge(&mut self) -> bool {
        self.transitions += 1;
        if self.transitions > self.limits.max_transitions_per_step {
            self.abort_with(Abort::Budget(format!(
                "more than {} transitions within a single step",
                self.limits.max_transitions_per_step
            )));
            return false;
        }
        true
    }

    /// Runs the top state's exit action, clears the stack and enters `target`.
    fn goto_state(
        &mut self,
        id: ActorId,
        target: StateId,
        received: Option<Event>,
    ) -> Option<ControlOp> {
        self.exit_and_pop(id);
        if self.abort.is_some() || !self.registry.is_active(id) {
            return None;
        }
        let program = self.program;
        let slot = self.registry.get_mut(id)?;
        let kind = program.kind_at(slot.kind);
        while let Some(state) = slot.stack.pop() {
            self.observer.on_state_pop(id, kind.state(state).name);
        }
        self.push_state(id, target, received)
    }

    /// Pushes `target` and runs its entry action.
    fn push_state(
        &mut self,
        id: ActorId,
        target: StateId,
        received: Option<Event>,
    ) -> Option<ControlOp> {
        let program = self.program;
        let slot = self.registry.get_mut(id)?;
        if !slot.is_active() {
            return None;
        }
        slot.stack.push(target);
        let decl = program.kind_at(slot.kind).state(target);
        self.observer.on_state_push(id, decl.name);
        trace!(actor = %id, state = decl.name, "entered state");
        let entry = decl.entry.as_ref()?;
        self.invoke(id, entry, Phase::Entry, received)
    }

    /// Runs the top state's exit action and pops it.
    ///
    /// A failing exit action still pops its state before the failure is
    /// handled, so a halt triggered by the failure never runs it again.
    fn exit_and_pop(&mut self, id: ActorId) {
        let program = self.program;
        let Some(slot) = self.registry.get(id) else {
            return;
        };
        let Some(top) = slot.top() else {
            return;
        };
        let decl = program.kind_at(slot.kind).state(top);
        let failure = match &decl.exit {
            Some(exit) => self.call_handler(id, exit, Phase::Exit, None).err(),
            None => None,
        };
        if failure.is_none() && !self.registry.is_active(id) {
            return;
        }
        if let Some(slot) = self.registry.get_mut(id) {
            slot.stack.pop();
        }
        self.observer.on_state_pop(id, decl.name);
        if let Some(error) = failure {
            self.handler_error(id, Some(decl.name), error);
        }
    }

    fn pop_explicit(&mut self, id: ActorId) {
        let depth = self.registry.get(id).map_or(0, |slot| slot.stack.len());
        if depth <= 1 {
            self.violation(
                BugKind::AssertionViolation,
                Some(id),
                format!("actor {id} popped its base state"),
            );
            return;
        }
        self.exit_and_pop(id);
    }

    /// Halts `id`: exit actions run top to bottom, the mailbox is discarded.
    /// Halting a halted actor does nothing.
    pub(crate) fn halt_actor(&mut self, id: ActorId) {
        let program = self.program;
        let Some(slot) = self.registry.get_mut(id) else {
            return;
        };
        if !slot.is_active() {
            return;
        }
        slot.status = crate::runtime::ActorStatus::Halted;
        let kind = program.kind_at(slot.kind);

        while let Some(top) = self.registry.get(id).and_then(ActorSlot::top) {
            let decl = kind.state(top);
            if self.abort.is_none() {
                if let Some(exit) = &decl.exit {
                    self.invoke(id, exit, Phase::Exit, None);
                }
            }
            if let Some(slot) = self.registry.get_mut(id) {
                slot.stack.pop();
            }
            self.observer.on_state_pop(id, decl.name);
        }

        let discarded = self
            .registry
            .get_mut(id)
            .map_or(0, |slot| slot.mailbox.clear());
        self.observer.on_halt(id);
        debug!(actor = %id, discarded, "actor halted");
    }

    /// Runs one handler and handles its failure in the current state.
    fn invoke(
        &mut self,
        id: ActorId,
        handler: &Handler,
        phase: Phase,
        received: Option<Event>,
    ) -> Option<ControlOp> {
        match self.call_handler(id, handler, phase, received) {
            Ok(op) => op,
            Err(error) => {
                self.handler_error(id, None, error);
                None
            }
        }
    }

    /// Runs one handler with the actor's state lent out of the registry.
    /// Panics come back as [`HandlerError::Failure`].
    fn call_handler(
        &mut self,
        id: ActorId,
        handler: &Handler,
        phase: Phase,
        received: Option<Event>,
    ) -> Result<Option<ControlOp>, HandlerError> {
        let Some(mut state) = self.registry.take_state(id) else {
            self.violation(
                BugKind::AssertionViolation,
                Some(id),
                format!("re-entrant handler invocation on actor {id}"),
            );
            return Ok(None);
        };
        let (outcome, op) = {
            let mut ctx = Ctx::new(&mut *self, id, phase, received);
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| handler.call(&mut *state, &mut ctx)));
            (outcome, ctx.take_control())
        };
        self.registry.restore_state(id, state);

        match outcome {
            Ok(Ok(())) => Ok(op),
            Ok(Err(error)) => Err(error),
            Err(payload) => Err(HandlerError::Failure(format!(
                "panicked: {}",
                panic_message(payload.as_ref())
            ))),
        }
    }

    /// Applies the failure policy to a handler error. `state` names the state
    /// the handler ran in when it is no longer on top of the stack.
    fn handler_error(&mut self, id: ActorId, state: Option<&'static str>, error: HandlerError) {
        let state = state.or_else(|| self.current_state(id));
        match error {
            HandlerError::Assertion(message) => {
                self.violation_at(BugKind::AssertionViolation, Some(id), state, message);
            }
            HandlerError::Failure(message) => match self.limits.failure_policy {
                FailurePolicy::TreatAsViolation => self.violation_at(
                    BugKind::AssertionViolation,
                    Some(id),
                    state,
                    format!("handler failure: {message}"),
                ),
                FailurePolicy::HaltActor => {
                    warn!(actor = %id, %message, "handler failed, halting actor");
                    self.halt_actor(id);
                }
            },
            HandlerError::Interrupted => self.unexplained_interrupt(Some(id)),
        }
    }

    fn unexplained_interrupt(&mut self, actor: Option<ActorId>) {
        if self.abort.is_none() {
            self.violation(
                BugKind::AssertionViolation,
                actor,
                "handler returned `Interrupted` without a runtime fault".to_string(),
            );
        }
    }

    fn violation(&mut self, kind: BugKind, actor: Option<ActorId>, message: String) {
        let state = actor.and_then(|id| self.current_state(id));
        self.violation_at(kind, actor, state, message);
    }

    fn violation_at(
        &mut self,
        kind: BugKind,
        actor: Option<ActorId>,
        state: Option<&'static str>,
        message: String,
    ) {
        self.abort_with(Abort::Violation {
            kind,
            actor,
            state,
            message,
        });
    }

    fn abort_with(&mut self, abort: Abort) {
        if self.abort.is_none() {
            debug!(?abort, "iteration aborted");
            self.abort = Some(abort);
        }
    }

    fn fail_config(&mut self, error: ConfigurationError) -> HandlerError {
        self.abort_with(Abort::Config(error));
        HandlerError::Interrupted
    }
}

impl RuntimeOps for Executor<'_> {
    fn create_actor(
        &mut self,
        creator: Option<ActorId>,
        kind: &str,
        init: Option<Event>,
    ) -> Result<ActorId, HandlerError> {
        let program = self.program;
        let Some(index) = program.kind_index(kind) else {
            return Err(self.fail_config(ConfigurationError::UnknownKind {
                kind: kind.to_string(),
            }));
        };
        let decl = program.kind_at(index);
        let id = self.registry.allocate(index, decl.instantiate());
        self.observer.on_actor_created(id, decl.name(), creator);
        debug!(actor = %id, kind = decl.name(), creator = ?creator, "actor created");

        let op = self.push_state(id, decl.start(), init);
        self.run_control(id, op);
        if self.abort.is_some() {
            return Err(HandlerError::Interrupted);
        }
        Ok(id)
    }

    fn send_event(&mut self, from: Option<ActorId>, target: ActorId, event: Event) {
        let kind = event.kind();
        if let Some(slot) = self.registry.get_mut(target).filter(|slot| slot.is_active()) {
            slot.mailbox.push_back(event);
            self.observer.on_send(from, target, kind, true);
            trace!(from = ?from, to = %target, event = %kind, "sent event");
            return;
        }
        self.observer.on_send(from, target, kind, false);
        match self.limits.halted_send_policy {
            HaltedSendPolicy::Drop => {
                trace!(to = %target, event = %kind, "dropped send to halted actor");
            }
            HaltedSendPolicy::Report => {
                self.dropped_sends += 1;
                warn!(from = ?from, to = %target, event = %kind, "send to halted actor dropped");
            }
        }
    }

    fn choose(&mut self, actor: ActorId, bound: u64, boolean: bool) -> Result<u64, HandlerError> {
        if !self.charge() {
            return Err(HandlerError::Interrupted);
        }
        let point = self.next_point;
        self.next_point += 1;
        let request = ChoiceRequest {
            point,
            actor,
            bound,
            boolean,
        };
        let value = match self.strategy.next_choice(&request) {
            Ok(value) => value,
            Err(error) => return Err(self.fail_config(error.into())),
        };
        if value >= bound {
            return Err(self.fail_config(ConfigurationError::OutOfSetDecision {
                point,
                detail: format!("choice {value} is outside [0, {bound})"),
            }));
        }
        let recorded = if boolean {
            ChoiceValue::Bool(value == 1)
        } else {
            ChoiceValue::Int { value, bound }
        };
        self.trace.push(ScheduleDecision::new(
            point,
            Decision::Choice {
                actor,
                value: recorded,
            },
            vec![actor],
        ));
        self.observer.on_choice(actor, recorded);
        trace!(point, actor = %actor, ?recorded, "resolved choice");
        Ok(value)
    }

    fn resolve_state(&mut self, actor: ActorId, name: &str) -> Result<StateId, HandlerError> {
        let program = self.program;
        let Some(slot) = self.registry.get(actor) else {
            return Err(HandlerError::Interrupted);
        };
        let kind = program.kind_at(slot.kind);
        match kind.state_id(name) {
            Some(state) => Ok(state),
            None => Err(self.fail_config(ConfigurationError::UnknownState {
                kind: kind.name().to_string(),
                state: name.to_string(),
            })),
        }
    }

    fn current_state(&self, actor: ActorId) -> Option<&'static str> {
        let slot = self.registry.get(actor)?;
        Some(self.program.kind_at(slot.kind).state(slot.top()?).name)
    }
}
