//! State declarations.
//!
//! A [`StateBuilder`] is the user-facing declaration of one state: entry and
//! exit actions plus one rule per event kind. [`ActorKindBuilder::build`]
//! compiles builders into [`StateDecl`]s with state names resolved to
//! indices, so the runtime never looks anything up by name while stepping.
//!
//! [`ActorKindBuilder::build`]: super::ActorKindBuilder::build

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::actor::context::Ctx;
use crate::error::{HandlerError, HandlerResult};
use crate::types::EventKind;
use crate::util::DetHashMap;

/// Index of a state inside its actor kind.
pub(crate) type StateId = usize;

type ErasedFn = dyn Fn(&mut dyn Any, &mut Ctx<'_>) -> HandlerResult + Send + Sync;

/// A type-erased handler closure.
#[derive(Clone)]
pub(crate) struct Handler(Arc<ErasedFn>);

impl Handler {
    pub(crate) fn new<S, F>(f: F) -> Self
    where
        S: Any,
        F: Fn(&mut S, &mut Ctx<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        Self(erase(move |state, ctx| match state.downcast_mut::<S>() {
            Some(state) => f(state, ctx),
            None => Err(HandlerError::Failure(
                "actor state has an unexpected type".to_string(),
            )),
        }))
    }

    pub(crate) fn call(&self, state: &mut dyn Any, ctx: &mut Ctx<'_>) -> HandlerResult {
        (self.0)(state, ctx)
    }
}

fn erase<F>(f: F) -> Arc<ErasedFn>
where
    F: Fn(&mut dyn Any, &mut Ctx<'_>) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(f)
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Handler(..)")
    }
}

/// How a state reacts to one event kind.
#[derive(Debug, Clone)]
pub(crate) enum Rule {
    Goto(StateId),
    Push(StateId),
    Action(Handler),
    Defer,
    Ignore,
}

impl Rule {
    /// Rules that consume the event and run user code or change state.
    pub(crate) const fn is_reaction(&self) -> bool {
        matches!(self, Self::Goto(_) | Self::Push(_) | Self::Action(_))
    }
}

/// Declared rule before state names are resolved.
enum RuleDecl {
    Goto(&'static str),
    Push(&'static str),
    Action(Handler),
    Defer,
    Ignore,
}

/// Compiled state.
#[derive(Debug)]
pub(crate) struct StateDecl {
    pub(crate) name: &'static str,
    pub(crate) entry: Option<Handler>,
    pub(crate) exit: Option<Handler>,
    pub(crate) rules: DetHashMap<EventKind, Rule>,
}

impl StateDecl {
    pub(crate) fn rule(&self, kind: EventKind) -> Option<&Rule> {
        self.rules.get(&kind)
    }

    /// True if the state can consume at least one event kind.
    pub(crate) fn has_reactions(&self) -> bool {
        self.rules.values().any(Rule::is_reaction)
    }
}

/// Declaration of one state of an actor kind with user state `S`.
///
/// ```
/// use actorlab::actor::StateBuilder;
/// use actorlab::types::EventKind;
///
/// const DONE: EventKind = EventKind::new("done");
/// const RETRY: EventKind = EventKind::new("retry");
///
/// let idle = StateBuilder::<u32>::new("Idle")
///     .start()
///     .on_entry(|count, _ctx| {
///         *count += 1;
///         Ok(())
///     })
///     .on_event_goto(DONE, "Finished")
///     .defer(RETRY);
/// assert_eq!(idle.name(), "Idle");
/// ```
pub struct StateBuilder<S> {
    name: &'static str,
    start: bool,
    entry: Option<Handler>,
    exit: Option<Handler>,
    rules: Vec<(EventKind, RuleDecl)>,
    _state: PhantomData<fn(&mut S)>,
}

impl<S: Any> StateBuilder<S> {
    /// Starts declaring a state.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: false,
            entry: None,
            exit: None,
            rules: Vec::new(),
            _state: PhantomData,
        }
    }

    /// Returns the state name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Marks this state as the kind's start state.
    #[must_use]
    pub fn start(mut self) -> Self {
        self.start = true;
        self
    }

    /// Sets the entry action, run whenever the state is entered.
    #[must_use]
    pub fn on_entry<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut S, &mut Ctx<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.entry = Some(Handler::new(f));
        self
    }

    /// Sets the exit action, run whenever the state is left by goto, pop or halt.
    ///
    /// Exit actions may not request control operations.
    #[must_use]
    pub fn on_exit<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut S, &mut Ctx<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.exit = Some(Handler::new(f));
        self
    }

    /// On `kind`, leave the whole state stack and enter `target`.
    #[must_use]
    pub fn on_event_goto(mut self, kind: EventKind, target: &'static str) -> Self {
        self.rules.push((kind, RuleDecl::Goto(target)));
        self
    }

    /// On `kind`, push `target` on top of this state.
    #[must_use]
    pub fn on_event_push(mut self, kind: EventKind, target: &'static str) -> Self {
        self.rules.push((kind, RuleDecl::Push(target)));
        self
    }

    /// On `kind`, run `f` without changing state.
    #[must_use]
    pub fn on_event_do<F>(mut self, kind: EventKind, f: F) -> Self
    where
        F: Fn(&mut S, &mut Ctx<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.rules.push((kind, RuleDecl::Action(Handler::new(f))));
        self
    }

    /// Leave events of `kind` in the mailbox while this state is active.
    #[must_use]
    pub fn defer(mut self, kind: EventKind) -> Self {
        self.rules.push((kind, RuleDecl::Defer));
        self
    }

    /// Drop events of `kind` while this state is active.
    #[must_use]
    pub fn ignore(mut self, kind: EventKind) -> Self {
        self.rules.push((kind, RuleDecl::Ignore));
        self
    }

    pub(crate) const fn is_start(&self) -> bool {
        self.start
    }

    /// Resolves target names against `lookup` and checks that each event kind
    /// has at most one rule.
    pub(crate) fn compile(
        self,
        kind_name: &'static str,
        lookup: &DetHashMap<&'static str, StateId>,
    ) -> Result<StateDecl, crate::error::ConfigurationError> {
        use crate::error::ConfigurationError;

        let resolve = |target: &'static str| {
            lookup
                .get(target)
                .copied()
                .ok_or_else(|| ConfigurationError::UnknownState {
                    kind: kind_name.to_string(),
                    state: target.to_string(),
                })
        };

        let mut rules = DetHashMap::default();
        for (event, decl) in self.rules {
            let rule = match decl {
                RuleDecl::Goto(target) => Rule::Goto(resolve(target)?),
                RuleDecl::Push(target) => Rule::Push(resolve(target)?),
                RuleDecl::Action(handler) => Rule::Action(handler),
                RuleDecl::Defer => Rule::Defer,
                RuleDecl::Ignore => Rule::Ignore,
            };
            if rules.insert(event, rule).is_some() {
                return Err(ConfigurationError::ConflictingRule {
                    kind: kind_name.to_string(),
                    state: self.name.to_string(),
                    event: event.name().to_string(),
                });
            }
        }

        Ok(StateDecl {
            name: self.name,
            entry: self.entry,
            exit: self.exit,
            rules,
        })
    }
}

impl<S> fmt::Debug for StateBuilder<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateBuilder")
            .field("name", &self.name)
            .field("start", &self.start)
            .field("rules", &self.rules.len())
            .finish()
    }
}
