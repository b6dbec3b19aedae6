//! Fluent per-state configuration.

use crate::builder::error::ConfigurationError;
use crate::core::{
    display_name, Action, BehaviorModel, EntryAction, Guard, GuardSet, Selector, StateId,
    TriggerBehavior, TriggerId,
};

/// Configures one state. Obtained from
/// [`StateMachineBuilder::configure`](crate::builder::StateMachineBuilder::configure).
///
/// Every method consumes and returns the configuration so calls chain.
/// Problems such as a permit back to the same state are recorded and
/// reported together by `build()`.
pub struct StateConfiguration<'a, S: StateId, T: TriggerId> {
    model: &'a mut BehaviorModel<S, T>,
    problems: &'a mut Vec<ConfigurationError>,
    index: usize,
    state: S,
}

impl<'a, S: StateId, T: TriggerId> StateConfiguration<'a, S, T> {
    pub(crate) fn new(
        model: &'a mut BehaviorModel<S, T>,
        problems: &'a mut Vec<ConfigurationError>,
        state: S,
    ) -> Self {
        let index = model.intern(state.clone());
        Self {
            model,
            problems,
            index,
            state,
        }
    }

    /// The state being configured.
    pub fn state(&self) -> &S {
        &self.state
    }

    fn add(self, trigger: T, behavior: TriggerBehavior<S, T>) -> Self {
        self.model.record_mut(self.index).add_behavior(trigger, behavior);
        self
    }

    /// Transition to `destination` on `trigger`.
    pub fn permit(self, trigger: T, destination: S) -> Self {
        self.permit_if(trigger, destination, [])
    }

    /// Transition to `destination` when every guard holds.
    pub fn permit_if(
        self,
        trigger: T,
        destination: S,
        guards: impl IntoIterator<Item = Guard>,
    ) -> Self {
        if destination == self.state {
            self.problems.push(ConfigurationError::PermitToSelf {
                state: display_name(&self.state),
                trigger: display_name(&trigger),
            });
            return self;
        }
        self.model.intern(destination.clone());
        self.add(
            trigger,
            TriggerBehavior::Fixed {
                destination,
                guards: GuardSet::new(guards),
            },
        )
    }

    /// Exit and re-enter this state on `trigger`.
    pub fn permit_reentry(self, trigger: T) -> Self {
        self.permit_reentry_if(trigger, [])
    }

    pub fn permit_reentry_if(self, trigger: T, guards: impl IntoIterator<Item = Guard>) -> Self {
        self.add(
            trigger,
            TriggerBehavior::Reentrant {
                guards: GuardSet::new(guards),
            },
        )
    }

    /// Accept `trigger` without transitioning or running actions.
    pub fn ignore(self, trigger: T) -> Self {
        self.ignore_if(trigger, [])
    }

    /// Ignore `trigger` while the guards hold; otherwise later behaviors
    /// for the same trigger are tried.
    pub fn ignore_if(self, trigger: T, guards: impl IntoIterator<Item = Guard>) -> Self {
        self.add(
            trigger,
            TriggerBehavior::Ignored {
                guards: GuardSet::new(guards),
            },
        )
    }

    /// Run `action` on `trigger` without leaving the state.
    pub fn internal_transition(self, trigger: T, action: Action<S, T>) -> Self {
        self.internal_transition_if(trigger, action, [])
    }

    pub fn internal_transition_if(
        self,
        trigger: T,
        action: Action<S, T>,
        guards: impl IntoIterator<Item = Guard>,
    ) -> Self {
        self.add(
            trigger,
            TriggerBehavior::Internal {
                action,
                guards: GuardSet::new(guards),
            },
        )
    }

    /// Transition to whatever `selector` returns for the fired arguments.
    pub fn dynamic(self, trigger: T, selector: Selector<S>) -> Self {
        self.dynamic_if(trigger, selector, [])
    }

    pub fn dynamic_if(
        self,
        trigger: T,
        selector: Selector<S>,
        guards: impl IntoIterator<Item = Guard>,
    ) -> Self {
        self.add(
            trigger,
            TriggerBehavior::Dynamic {
                selector,
                guards: GuardSet::new(guards),
            },
        )
    }

    pub fn on_entry(self, action: Action<S, T>) -> Self {
        self.model
            .record_mut(self.index)
            .entry_actions
            .push(EntryAction {
                action,
                from_trigger: None,
            });
        self
    }

    /// Entry action that only runs when entered by `trigger`.
    pub fn on_entry_from(self, trigger: T, action: Action<S, T>) -> Self {
        self.model
            .record_mut(self.index)
            .entry_actions
            .push(EntryAction {
                action,
                from_trigger: Some(trigger),
            });
        self
    }

    pub fn on_exit(self, action: Action<S, T>) -> Self {
        self.model.record_mut(self.index).exit_actions.push(action);
        self
    }

    pub fn on_activate(self, action: Action<S, T>) -> Self {
        self.model
            .record_mut(self.index)
            .activate_actions
            .push(action);
        self
    }

    pub fn on_deactivate(self, action: Action<S, T>) -> Self {
        self.model
            .record_mut(self.index)
            .deactivate_actions
            .push(action);
        self
    }

    /// Make this state a substate of `superstate`.
    ///
    /// A state has at most one superstate; naming a different one later is
    /// a configuration error.
    pub fn substate_of(self, superstate: S) -> Self {
        if superstate == self.state {
            self.problems.push(ConfigurationError::CyclicHierarchy {
                state: display_name(&self.state),
            });
            return self;
        }
        let parent = self.model.intern(superstate.clone());
        let existing = self.model.superstate(&self.state).cloned();
        match existing {
            Some(existing) if existing != superstate => {
                self.problems.push(ConfigurationError::ConflictingSuperstate {
                    state: display_name(&self.state),
                    existing: display_name(&existing),
                    requested: display_name(&superstate),
                });
            }
            _ => self.model.link(self.index, parent),
        }
        self
    }

    /// Enter `target` automatically whenever this state is entered directly.
    ///
    /// `target` must end up below this state; that is checked by `build()`
    /// so `substate_of` may be declared in any order.
    pub fn initial_transition(self, target: S) -> Self {
        self.model.intern(target.clone());
        let record = self.model.record_mut(self.index);
        if record.initial_transition_target.is_some() {
            self.problems
                .push(ConfigurationError::DuplicateInitialTransition {
                    state: display_name(&self.state),
                });
        } else {
            record.initial_transition_target = Some(target);
        }
        self
    }
}
