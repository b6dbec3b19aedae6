//! Hierarchical execution of a resolved behavior.
//!
//! For a state-changing behavior the executor computes the exit path (from
//! the source up to the boundary ancestor) and the entry path (from the
//! boundary down to the destination), then any chain of initial substates.
//! It then runs, in order:
//!
//! 1. `on_transitioned` callbacks
//! 2. exit and deactivate actions, deepest state first
//! 3. the state mutation
//! 4. entry and activate actions, shallowest state first
//! 5. entry and activate actions for each initial substate
//! 6. `on_transition_completed` callbacks
//!
//! The mutation stores the innermost state of the initial chain, so readers
//! never observe a superstate as the current state.
//!
//! On the blocking path every callable in the plan is checked before the
//! first one runs, so a suspension-capable callable is reported before any
//! state mutation.

use crate::builder::ConfigurationError;
use crate::core::{
    display_name, Action, Args, BehaviorModel, EntryAction, StateId, Suspension, Transition,
    TriggerBehavior, TriggerId, UnhandledTriggerHandler,
};
use crate::engine::error::{FireError, UsageError};
use crate::engine::storage::StateStorage;
use std::iter;
use tracing::{debug, trace};

/// Machine-wide callbacks.
pub(crate) struct Hooks<S, T> {
    pub(crate) unhandled: Option<UnhandledTriggerHandler<S, T>>,
    pub(crate) on_transitioned: Vec<Action<S, T>>,
    pub(crate) on_transition_completed: Vec<Action<S, T>>,
}

impl<S, T> Default for Hooks<S, T> {
    fn default() -> Self {
        Self {
            unhandled: None,
            on_transitioned: Vec::new(),
            on_transition_completed: Vec::new(),
        }
    }
}

/// One exit/mutate/entry step.
struct Step<S, T> {
    transition: Transition<S, T>,
    exit: Vec<S>,
    entry: Vec<S>,
}

/// The requested transition followed by its initial-substate steps.
struct Plan<S, T> {
    main: Step<S, T>,
    initial: Vec<Step<S, T>>,
}

impl<S: StateId, T: TriggerId> Plan<S, T> {
    fn steps(&self) -> impl Iterator<Item = &Step<S, T>> {
        iter::once(&self.main).chain(self.initial.iter())
    }

    fn final_state(&self) -> &S {
        &self
            .initial
            .last()
            .unwrap_or(&self.main)
            .transition
            .destination
    }
}

pub(crate) struct Executor<'a, S, T> {
    model: &'a BehaviorModel<S, T>,
    storage: &'a StateStorage<S>,
    hooks: &'a Hooks<S, T>,
    suspension: Suspension,
}

impl<'a, S: StateId, T: TriggerId> Executor<'a, S, T> {
    pub(crate) fn new(
        model: &'a BehaviorModel<S, T>,
        storage: &'a StateStorage<S>,
        hooks: &'a Hooks<S, T>,
        suspension: Suspension,
    ) -> Self {
        Self {
            model,
            storage,
            hooks,
            suspension,
        }
    }

    /// Run `behavior`, declared on `owner`, for a trigger fired in `source`.
    /// Returns the state the machine ends up in.
    pub(crate) async fn execute(
        &self,
        owner: &S,
        behavior: &TriggerBehavior<S, T>,
        source: S,
        trigger: T,
        args: Args,
    ) -> Result<S, FireError> {
        behavior
            .ensure_allowed(self.suspension)
            .map_err(|cause| UsageError::suspension(&trigger, cause))?;

        match behavior {
            TriggerBehavior::Ignored { .. } => {
                debug!(state = ?source, trigger = ?trigger, "trigger ignored");
                Ok(source)
            }
            TriggerBehavior::Internal { action, .. } => {
                let transition = Transition::new(source.clone(), source.clone(), trigger, args);
                self.ensure_allowed(&transition.trigger, self.callbacks())?;
                self.run_all(&self.hooks.on_transitioned, &transition).await?;
                self.run(action, &transition).await?;
                self.run_all(&self.hooks.on_transition_completed, &transition)
                    .await?;
                debug!(state = ?source, trigger = ?transition.trigger, "internal transition completed");
                Ok(source)
            }
            TriggerBehavior::Fixed { destination, .. } => {
                // Reached through a superstate, a fixed target may be the
                // current state itself.
                let is_reentry = destination == &source;
                let transition = Transition::new(source, destination.clone(), trigger, args)
                    .with_reentry(is_reentry);
                self.transition(transition).await
            }
            TriggerBehavior::Reentrant { .. } => {
                let transition =
                    Transition::new(source, owner.clone(), trigger, args).with_reentry(true);
                self.transition(transition).await
            }
            TriggerBehavior::Dynamic { selector, .. } => {
                let destination = selector
                    .select(&args, self.suspension)
                    .await
                    .map_err(|cause| UsageError::suspension(&trigger, cause))?;
                trace!(selector = selector.description(), destination = ?destination, "dynamic destination selected");
                let is_reentry = destination == source;
                let transition =
                    Transition::new(source, destination, trigger, args).with_reentry(is_reentry);
                self.transition(transition).await
            }
        }
    }

    async fn transition(&self, transition: Transition<S, T>) -> Result<S, FireError> {
        let plan = self.plan(transition)?;
        let trigger = &plan.main.transition.trigger;
        self.ensure_allowed(trigger, self.callbacks().chain(self.plan_actions(&plan)))?;

        self.run_all(&self.hooks.on_transitioned, &plan.main.transition)
            .await?;

        let destination = plan.final_state().clone();
        for state in &plan.main.exit {
            self.exit(state, &plan.main.transition).await?;
        }
        self.storage.write(destination.clone());
        debug!(
            from = ?plan.main.transition.source,
            to = ?destination,
            trigger = ?plan.main.transition.trigger,
            reentry = plan.main.transition.is_reentry,
            "state committed"
        );

        for step in plan.steps() {
            if step.transition.is_initial {
                trace!(
                    superstate = ?step.transition.source,
                    substate = ?step.transition.destination,
                    "entering initial substate"
                );
            }
            for state in &step.entry {
                self.enter(state, &step.transition).await?;
            }
        }

        let completed = plan.main.transition.completed_at(destination.clone());
        self.run_all(&self.hooks.on_transition_completed, &completed)
            .await?;
        Ok(destination)
    }

    fn plan(&self, transition: Transition<S, T>) -> Result<Plan<S, T>, FireError> {
        let boundary = if transition.is_reentry {
            self.model.superstate(&transition.destination).cloned()
        } else {
            self.model
                .common_ancestor(&transition.source, &transition.destination)
        };
        let exit = self.path_up(&transition.source, boundary.as_ref());
        let mut entry = self.path_up(&transition.destination, boundary.as_ref());
        entry.reverse();

        let mut initial = Vec::new();
        let mut current = transition.destination.clone();
        while let Some(target) = self
            .model
            .representation(&current)
            .and_then(|record| record.initial_transition_target())
            .cloned()
        {
            if target == current || !self.model.is_included_in(&target, &current) {
                return Err(ConfigurationError::InitialTargetNotSubstate {
                    state: display_name(&current),
                    target: display_name(&target),
                }
                .into());
            }
            let mut path = self.path_up(&target, Some(&current));
            path.reverse();
            initial.push(Step {
                transition: transition.initial_step(current.clone(), target.clone()),
                exit: Vec::new(),
                entry: path,
            });
            current = target;
        }

        Ok(Plan {
            main: Step {
                transition,
                exit,
                entry,
            },
            initial,
        })
    }

    /// `from` and its ancestors, stopping below `boundary`.
    fn path_up(&self, from: &S, boundary: Option<&S>) -> Vec<S> {
        self.model
            .ancestry(from)
            .into_iter()
            .take_while(|state| Some(state) != boundary)
            .collect()
    }

    fn callbacks(&self) -> impl Iterator<Item = &'a Action<S, T>> {
        let hooks = self.hooks;
        hooks
            .on_transitioned
            .iter()
            .chain(hooks.on_transition_completed.iter())
    }

    /// Every state action the plan will run.
    fn plan_actions(&self, plan: &Plan<S, T>) -> Vec<&'a Action<S, T>> {
        let trigger = &plan.main.transition.trigger;
        let mut actions = Vec::new();
        for step in plan.steps() {
            for record in step.exit.iter().filter_map(|s| self.model.representation(s)) {
                actions.extend(record.exit_actions());
                actions.extend(record.deactivate_actions());
            }
            for record in step.entry.iter().filter_map(|s| self.model.representation(s)) {
                actions.extend(
                    record
                        .entry_actions()
                        .iter()
                        .filter(|entry| entry.applies_to(trigger))
                        .map(EntryAction::action),
                );
                actions.extend(record.activate_actions());
            }
        }
        actions
    }

    fn ensure_allowed<'x>(
        &self,
        trigger: &T,
        actions: impl IntoIterator<Item = &'x Action<S, T>>,
    ) -> Result<(), FireError>
    where
        S: 'x,
        T: 'x,
    {
        actions
            .into_iter()
            .try_for_each(|action| action.ensure_allowed(self.suspension))
            .map_err(|cause| UsageError::suspension(trigger, cause).into())
    }

    async fn exit(&self, state: &S, transition: &Transition<S, T>) -> Result<(), FireError> {
        let Some(record) = self.model.representation(state) else {
            return Ok(());
        };
        self.run_all(record.exit_actions(), transition).await?;
        self.run_all(record.deactivate_actions(), transition).await
    }

    async fn enter(&self, state: &S, transition: &Transition<S, T>) -> Result<(), FireError> {
        let Some(record) = self.model.representation(state) else {
            return Ok(());
        };
        for entry in record.entry_actions() {
            if entry.applies_to(&transition.trigger) {
                self.run(entry.action(), transition).await?;
            }
        }
        self.run_all(record.activate_actions(), transition).await
    }

    async fn run_all(
        &self,
        actions: &[Action<S, T>],
        transition: &Transition<S, T>,
    ) -> Result<(), FireError> {
        for action in actions {
            self.run(action, transition).await?;
        }
        Ok(())
    }

    async fn run(&self, action: &Action<S, T>, transition: &Transition<S, T>) -> Result<(), FireError> {
        trace!(action = action.description(), trigger = ?transition.trigger, "invoking action");
        action
            .invoke(transition, self.suspension)
            .await
            .map_err(|cause| UsageError::suspension(&transition.trigger, cause))?
            .map_err(|error| FireError::action_failed(action.description(), error))
    }
}
