//! Actor kind declarations.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::actor::state::{StateBuilder, StateDecl, StateId};
use crate::error::ConfigurationError;
use crate::util::DetHashMap;

type Factory = Arc<dyn Fn() -> Box<dyn Any> + Send + Sync>;

/// Builder for an [`ActorKind`] whose instances carry user state `S`.
///
/// Each created actor gets a fresh `S` from the factory; handlers receive it
/// as `&mut S`.
pub struct ActorKindBuilder<S> {
    name: &'static str,
    factory: Arc<dyn Fn() -> S + Send + Sync>,
    states: Vec<StateBuilder<S>>,
}

impl<S: Any + Default> ActorKindBuilder<S> {
    /// Starts a kind whose instances start from `S::default()`.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self::with_factory(name, S::default)
    }
}

impl<S: Any> ActorKindBuilder<S> {
    /// Starts a kind whose instances are produced by `factory`.
    #[must_use]
    pub fn with_factory<F>(name: &'static str, factory: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
    {
        Self {
            name,
            factory: Arc::new(factory),
            states: Vec::new(),
        }
    }

    /// Adds a state.
    #[must_use]
    pub fn state(mut self, state: StateBuilder<S>) -> Self {
        self.states.push(state);
        self
    }

    /// Validates the declaration and compiles it.
    ///
    /// Fails if state names repeat, no or several states are marked start,
    /// a transition targets an undeclared state, or a state declares two
    /// rules for one event kind.
    pub fn build(self) -> Result<ActorKind, ConfigurationError> {
        let kind = self.name;

        let mut lookup: DetHashMap<&'static str, StateId> = DetHashMap::default();
        for (index, state) in self.states.iter().enumerate() {
            if lookup.insert(state.name(), index).is_some() {
                return Err(ConfigurationError::DuplicateState {
                    kind: kind.to_string(),
                    state: state.name().to_string(),
                });
            }
        }

        let starts: Vec<StateId> = self
            .states
            .iter()
            .enumerate()
            .filter(|(_, state)| state.is_start())
            .map(|(index, _)| index)
            .collect();
        let start = match starts.as_slice() {
            [] => {
                return Err(ConfigurationError::MissingStartState {
                    kind: kind.to_string(),
                });
            }
            [only] => *only,
            many => {
                return Err(ConfigurationError::MultipleStartStates {
                    kind: kind.to_string(),
                    states: many
                        .iter()
                        .map(|&i| self.states[i].name().to_string())
                        .collect(),
                });
            }
        };

        let states = self
            .states
            .into_iter()
            .map(|state| state.compile(kind, &lookup))
            .collect::<Result<Vec<_>, _>>()?;

        let factory = self.factory;
        Ok(ActorKind {
            name: kind,
            factory: Arc::new(move || Box::new(factory()) as Box<dyn Any>),
            states,
            start,
        })
    }
}

impl<S> fmt::Debug for ActorKindBuilder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorKindBuilder")
            .field("name", &self.name)
            .field("states", &self.states)
            .finish()
    }
}

/// A validated, compiled actor kind: the transition table
/// `(state, event kind) -> rule` plus a factory for instance state.
pub struct ActorKind {
    name: &'static str,
    factory: Factory,
    states: Vec<StateDecl>,
    start: StateId,
}

impl ActorKind {
    /// Returns the kind name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the start state's name.
    #[must_use]
    pub fn start_state(&self) -> &'static str {
        self.states[self.start].name
    }

    /// Returns the declared state names in declaration order.
    pub fn state_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.states.iter().map(|state| state.name)
    }

    pub(crate) const fn start(&self) -> StateId {
        self.start
    }

    pub(crate) fn state(&self, id: StateId) -> &StateDecl {
        &self.states[id]
    }

    pub(crate) fn state_id(&self, name: &str) -> Option<StateId> {
        self.states.iter().position(|state| state.name == name)
    }

    pub(crate) fn instantiate(&self) -> Box<dyn Any> {
        (self.factory)()
    }
}

impl fmt::Debug for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorKind")
            .field("name", &self.name)
            .field("states", &self.states.len())
            .field("start", &self.start_state())
            .finish()
    }
}
