//! Actor registry: the per-iteration table of actors.
//!
//! A registry is created fresh for every iteration and dropped at its end.
//! Ids are allocated from a counter and never reused; halted actors keep
//! their slot so their id remains a valid (dropping) send target.

use std::any::Any;
use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::actor::state::StateId;
use crate::runtime::mailbox::Mailbox;
use crate::types::{ActorId, Event, EventKind};

/// Lifecycle status of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActorStatus {
    /// Participates in scheduling.
    Active,
    /// Halted; irreversibly removed from scheduling.
    Halted,
}

/// One actor's runtime record.
pub(crate) struct ActorSlot {
    pub(crate) kind: usize,
    pub(crate) stack: SmallVec<[StateId; 4]>,
    pub(crate) mailbox: Mailbox,
    pub(crate) status: ActorStatus,
    /// User state; `None` while one of the actor's handlers is running.
    state: Option<Box<dyn Any>>,
}

impl ActorSlot {
    pub(crate) fn top(&self) -> Option<StateId> {
        self.stack.last().copied()
    }

    pub(crate) fn is_active(&self) -> bool {
        self.status == ActorStatus::Active
    }

    /// Dequeues the next event that `deferred` does not hold back, given the
    /// current state stack.
    pub(crate) fn dequeue(
        &mut self,
        deferred: impl Fn(&[StateId], EventKind) -> bool,
    ) -> Option<Event> {
        let stack = self.stack.as_slice();
        self.mailbox.dequeue(|kind| deferred(stack, kind))
    }

    pub(crate) fn has_deliverable(&self, deferred: impl Fn(&[StateId], EventKind) -> bool) -> bool {
        let stack = self.stack.as_slice();
        self.mailbox.has_deliverable(|kind| deferred(stack, kind))
    }
}

/// Mapping from actor id to actor, ordered by id.
#[derive(Default)]
pub(crate) struct ActorRegistry {
    actors: BTreeMap<ActorId, ActorSlot>,
    next_id: u64,
}

impl ActorRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh id with an empty stack and mailbox.
    pub(crate) fn allocate(&mut self, kind: usize, state: Box<dyn Any>) -> ActorId {
        let id = ActorId::from_raw(self.next_id);
        self.next_id += 1;
        self.actors.insert(
            id,
            ActorSlot {
                kind,
                stack: SmallVec::new(),
                mailbox: Mailbox::new(),
                status: ActorStatus::Active,
                state: Some(state),
            },
        );
        id
    }

    pub(crate) fn get(&self, id: ActorId) -> Option<&ActorSlot> {
        self.actors.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: ActorId) -> Option<&mut ActorSlot> {
        self.actors.get_mut(&id)
    }

    pub(crate) fn is_active(&self, id: ActorId) -> bool {
        self.get(id).is_some_and(ActorSlot::is_active)
    }

    pub(crate) fn len(&self) -> usize {
        self.actors.len()
    }

    /// Actors in ascending id order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (ActorId, &ActorSlot)> + '_ {
        self.actors.iter().map(|(id, slot)| (*id, slot))
    }

    pub(crate) fn take_state(&mut self, id: ActorId) -> Option<Box<dyn Any>> {
        self.get_mut(id)?.state.take()
    }

    pub(crate) fn restore_state(&mut self, id: ActorId, state: Box<dyn Any>) {
        if let Some(slot) = self.get_mut(id) {
            slot.state = Some(state);
        }
    }
}
