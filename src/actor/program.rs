//! Programs: a set of actor kinds plus an entry action.
//!
//! A [`Program`] is the boundary between whatever front end declares actors and
//! the exploration engine. It is immutable once built and shared by every
//! iteration (and every worker thread in parallel exploration).

use std::fmt;
use std::sync::Arc;

use crate::actor::context::RuntimeOps;
use crate::actor::kind::ActorKind;
use crate::error::{ConfigurationError, HandlerError, HandlerResult};
use crate::types::{ActorId, Event};
use crate::util::DetHashMap;

type EntryFn = Arc<dyn Fn(&mut Setup<'_>) -> HandlerResult + Send + Sync>;

/// Handle given to a program's entry action to create the initial actors.
pub struct Setup<'a> {
    rt: &'a mut (dyn RuntimeOps + 'a),
}

impl<'a> Setup<'a> {
    pub(crate) fn new(rt: &'a mut (dyn RuntimeOps + 'a)) -> Self {
        Self { rt }
    }

    /// Creates an actor of `kind` and runs its start state's entry action.
    pub fn create(&mut self, kind: &str) -> Result<ActorId, HandlerError> {
        self.rt.create_actor(None, kind, None)
    }

    /// Creates an actor of `kind`, handing `init` to its start state's entry action.
    pub fn create_with(
        &mut self,
        kind: &str,
        init: impl Into<Event>,
    ) -> Result<ActorId, HandlerError> {
        self.rt.create_actor(None, kind, Some(init.into()))
    }

    /// Enqueues `event` on `target`'s mailbox.
    pub fn send(&mut self, target: ActorId, event: impl Into<Event>) {
        self.rt.send_event(None, target, event.into());
    }
}

impl fmt::Debug for Setup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setup").finish_non_exhaustive()
    }
}

/// A validated set of actor kinds and the entry action that creates the
/// initial actors of every iteration.
pub struct Program {
    kinds: Vec<ActorKind>,
    index: DetHashMap<&'static str, usize>,
    entry: EntryFn,
}

impl Program {
    /// Starts building a program.
    #[must_use]
    pub fn builder() -> ProgramBuilder {
        ProgramBuilder::default()
    }

    /// Looks up a kind by name.
    #[must_use]
    pub fn kind(&self, name: &str) -> Option<&ActorKind> {
        self.kind_index(name).map(|index| &self.kinds[index])
    }

    /// Iterates the declared kinds in registration order.
    pub fn kinds(&self) -> impl Iterator<Item = &ActorKind> + '_ {
        self.kinds.iter()
    }

    pub(crate) fn kind_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub(crate) fn kind_at(&self, index: usize) -> &ActorKind {
        &self.kinds[index]
    }

    pub(crate) fn run_entry(&self, setup: &mut Setup<'_>) -> HandlerResult {
        (self.entry)(setup)
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("kinds", &self.kinds)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Program`].
#[derive(Default)]
pub struct ProgramBuilder {
    kinds: Vec<ActorKind>,
    entry: Option<EntryFn>,
}

impl ProgramBuilder {
    /// Registers an actor kind.
    #[must_use]
    pub fn kind(mut self, kind: ActorKind) -> Self {
        self.kinds.push(kind);
        self
    }

    /// Sets the entry action.
    #[must_use]
    pub fn entry<F>(mut self, entry: F) -> Self
    where
        F: Fn(&mut Setup<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.entry = Some(Arc::new(entry));
        self
    }

    /// Validates kind names and the presence of an entry action.
    pub fn build(self) -> Result<Program, ConfigurationError> {
        let entry = self.entry.ok_or(ConfigurationError::NoEntryPoint)?;
        let mut index = DetHashMap::default();
        for (position, kind) in self.kinds.iter().enumerate() {
            if index.insert(kind.name(), position).is_some() {
                return Err(ConfigurationError::DuplicateKind {
                    kind: kind.name().to_string(),
                });
            }
        }
        Ok(Program {
            kinds: self.kinds,
            index,
            entry,
        })
    }
}

impl fmt::Debug for ProgramBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgramBuilder")
            .field("kinds", &self.kinds)
            .field("has_entry", &self.entry.is_some())
            .finish()
    }
}
