//! Builder for constructing state machines.

use crate::builder::configuration::StateConfiguration;
use crate::builder::error::ConfigurationError;
use crate::builder::validation;
use crate::core::{
    Action, ActionResult, Args, BehaviorModel, ParameterTypes, StateId, TriggerId,
    UnhandledTriggerHandler,
};
use crate::engine::{FiringMode, Hooks, MachineOptions, MachineParts, StateMachine, StateStorage};
use std::collections::HashMap;
use std::future::Future;

/// Builder for constructing state machines with a fluent API.
///
/// Machine-wide options consume and return the builder; per-state
/// configuration borrows it through [`configure`](Self::configure).
pub struct StateMachineBuilder<S: StateId, T: TriggerId> {
    initial: S,
    model: BehaviorModel<S, T>,
    problems: Vec<ConfigurationError>,
    options: MachineOptions,
    storage: Option<StateStorage<S>>,
    hooks: Hooks<S, T>,
    parameters: HashMap<T, Vec<&'static str>>,
}

impl<S: StateId, T: TriggerId> StateMachineBuilder<S, T> {
    /// Create a builder whose machine starts in `initial`.
    pub fn new(initial: S) -> Self {
        let mut model = BehaviorModel::new();
        model.intern(initial.clone());
        Self {
            initial,
            model,
            problems: Vec::new(),
            options: MachineOptions::default(),
            storage: None,
            hooks: Hooks::default(),
            parameters: HashMap::new(),
        }
    }

    /// Configure `state`, creating it if this is its first mention.
    pub fn configure(&mut self, state: S) -> StateConfiguration<'_, S, T> {
        StateConfiguration::new(&mut self.model, &mut self.problems, state)
    }

    pub fn firing_mode(mut self, mode: FiringMode) -> Self {
        self.options.firing_mode = mode;
        self
    }

    /// Apply options loaded from configuration.
    pub fn options(mut self, options: MachineOptions) -> Self {
        self.options = options;
        self
    }

    /// Delegate current-state storage to the host.
    ///
    /// The accessor is authoritative from construction on; the initial
    /// state passed to the builder only matters when it is used as the
    /// entry point for reflection.
    pub fn external_state<A, M>(mut self, accessor: A, mutator: M) -> Self
    where
        A: Fn() -> S + Send + Sync + 'static,
        M: Fn(S) + Send + Sync + 'static,
    {
        self.storage = Some(StateStorage::external(accessor, mutator));
        self
    }

    /// Called instead of failing when no behavior accepts a trigger.
    pub fn on_unhandled_trigger<F>(mut self, handler: F) -> Self
    where
        F: Fn(&S, &T, &Args) -> ActionResult + Send + Sync + 'static,
    {
        self.hooks.unhandled = Some(UnhandledTriggerHandler::new(handler));
        self
    }

    pub fn on_unhandled_trigger_async<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(S, T, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        self.hooks.unhandled = Some(UnhandledTriggerHandler::suspending(handler));
        self
    }

    /// Runs once the destination is known, before any exit action.
    pub fn on_transitioned(mut self, callback: Action<S, T>) -> Self {
        self.hooks.on_transitioned.push(callback);
        self
    }

    /// Runs after the whole exit, entry and initial-substate sequence.
    pub fn on_transition_completed(mut self, callback: Action<S, T>) -> Self {
        self.hooks.on_transition_completed.push(callback);
        self
    }

    /// Record the parameter types of `trigger` for reflection.
    pub fn trigger_parameters<P: ParameterTypes>(mut self, trigger: T) -> Self {
        self.parameters.insert(trigger, P::type_names());
        self
    }

    /// Validate the configuration and build the machine.
    /// Returns every configuration problem found, not just the first.
    pub fn build(self) -> Result<StateMachine<S, T>, ConfigurationError> {
        validation::into_result(validation::validate(&self.model, &self.problems))?;

        let storage = self
            .storage
            .unwrap_or_else(|| StateStorage::internal(self.initial.clone()));

        Ok(StateMachine::from_parts(MachineParts {
            initial_state: self.initial,
            model: self.model,
            storage,
            hooks: self.hooks,
            parameters: self.parameters,
            options: self.options,
        }))
    }
}
