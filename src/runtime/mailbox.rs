//! Per-actor event queue.
//!
//! Dequeue order: events whose kind is currently deferred are skipped (and
//! stay queued); among the rest the highest [`Priority`] wins, and equal
//! priorities are served in send order.
//!
//! [`Priority`]: crate::types::Priority

use std::collections::VecDeque;

use crate::types::{Event, EventKind};

/// FIFO event queue with priority and deferral-aware dequeue.
#[derive(Debug, Default)]
pub struct Mailbox {
    queue: VecDeque<Event>,
}

impl Mailbox {
    /// Creates an empty mailbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued events, deferred ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// True if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Appends an event.
    pub fn push_back(&mut self, event: Event) {
        self.queue.push_back(event);
    }

    /// Places an event ahead of everything queued.
    pub fn push_front(&mut self, event: Event) {
        self.queue.push_front(event);
    }

    /// True if at least one event is not deferred.
    pub fn has_deliverable(&self, deferred: impl Fn(EventKind) -> bool) -> bool {
        self.queue.iter().any(|event| !deferred(event.kind()))
    }

    /// Removes and returns the next deliverable event.
    pub fn dequeue(&mut self, deferred: impl Fn(EventKind) -> bool) -> Option<Event> {
        let mut best: Option<(usize, crate::types::Priority)> = None;
        for (position, event) in self.queue.iter().enumerate() {
            if deferred(event.kind()) {
                continue;
            }
            match best {
                Some((_, priority)) if event.priority() <= priority => {}
                _ => best = Some((position, event.priority())),
            }
        }
        best.and_then(|(position, _)| self.queue.remove(position))
    }

    /// Discards every queued event, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        dropped
    }

    /// Kinds of the queued events in queue order.
    pub fn kinds(&self) -> impl Iterator<Item = EventKind> + '_ {
        self.queue.iter().map(Event::kind)
    }
}
