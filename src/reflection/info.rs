//! Descriptive report of a machine's configuration.
//!
//! Built from the behavior model's read-only traversal surface. Every
//! callable appears as its description plus suspension flag; nothing in
//! the report can run or mutate anything.

use crate::core::{
    display_name, BehaviorModel, InvocationInfo, StateId, StateRepresentation, TriggerBehavior,
    TriggerId,
};
use serde::Serialize;
use std::collections::HashMap;

/// The whole machine.
#[derive(Debug, Clone, Serialize)]
pub struct MachineInfo<S, T> {
    pub initial_state: S,
    /// Every state, in first-referenced order.
    pub states: Vec<StateInfo<S, T>>,
}

/// One state and everything configured on it.
#[derive(Debug, Clone, Serialize)]
pub struct StateInfo<S, T> {
    pub state: S,
    pub superstate: Option<S>,
    pub substates: Vec<S>,
    pub initial_transition_target: Option<S>,
    pub entry_actions: Vec<ActionInfo<T>>,
    pub exit_actions: Vec<InvocationInfo>,
    pub activate_actions: Vec<InvocationInfo>,
    pub deactivate_actions: Vec<InvocationInfo>,
    pub transitions: Vec<TransitionInfo<S, T>>,
}

/// Entry action with its originating-trigger filter.
#[derive(Debug, Clone, Serialize)]
pub struct ActionInfo<T> {
    pub action: InvocationInfo,
    pub from_trigger: Option<T>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TriggerInfo<T> {
    pub trigger: T,
    /// Type names registered with `trigger_parameters`, if any.
    pub parameter_types: Option<Vec<String>>,
}

/// One configured trigger behavior.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransitionInfo<S, T> {
    Fixed {
        trigger: TriggerInfo<T>,
        destination: S,
        guards: Vec<InvocationInfo>,
    },
    Reentry {
        trigger: TriggerInfo<T>,
        guards: Vec<InvocationInfo>,
    },
    Internal {
        trigger: TriggerInfo<T>,
        action: InvocationInfo,
        guards: Vec<InvocationInfo>,
    },
    Ignored {
        trigger: TriggerInfo<T>,
        guards: Vec<InvocationInfo>,
    },
    Dynamic {
        trigger: TriggerInfo<T>,
        selector: InvocationInfo,
        guards: Vec<InvocationInfo>,
    },
}

impl<S, T> TransitionInfo<S, T> {
    pub fn trigger(&self) -> &TriggerInfo<T> {
        match self {
            Self::Fixed { trigger, .. }
            | Self::Reentry { trigger, .. }
            | Self::Internal { trigger, .. }
            | Self::Ignored { trigger, .. }
            | Self::Dynamic { trigger, .. } => trigger,
        }
    }

    pub fn guards(&self) -> &[InvocationInfo] {
        match self {
            Self::Fixed { guards, .. }
            | Self::Reentry { guards, .. }
            | Self::Internal { guards, .. }
            | Self::Ignored { guards, .. }
            | Self::Dynamic { guards, .. } => guards,
        }
    }
}

impl<S: StateId, T: TriggerId> MachineInfo<S, T> {
    pub(crate) fn from_model(
        initial_state: &S,
        model: &BehaviorModel<S, T>,
        parameters: &HashMap<T, Vec<&'static str>>,
    ) -> Self {
        Self {
            initial_state: initial_state.clone(),
            states: model
                .states()
                .map(|record| StateInfo::from_record(record, model, parameters))
                .collect(),
        }
    }

    pub fn state(&self, state: &S) -> Option<&StateInfo<S, T>> {
        self.states.iter().find(|info| &info.state == state)
    }

    /// States without a superstate.
    pub fn roots(&self) -> impl Iterator<Item = &StateInfo<S, T>> {
        self.states.iter().filter(|info| info.superstate.is_none())
    }
}

impl<S: StateId, T: TriggerId> StateInfo<S, T> {
    fn from_record(
        record: &StateRepresentation<S, T>,
        model: &BehaviorModel<S, T>,
        parameters: &HashMap<T, Vec<&'static str>>,
    ) -> Self {
        let state = record.state();
        let transitions = record
            .trigger_behaviors()
            .flat_map(|(trigger, behaviors)| {
                behaviors
                    .iter()
                    .map(move |behavior| describe(trigger, behavior, parameters))
            })
            .collect();

        Self {
            state: state.clone(),
            superstate: model.superstate(state).cloned(),
            substates: model.substates(state).into_iter().cloned().collect(),
            initial_transition_target: record.initial_transition_target().cloned(),
            entry_actions: record
                .entry_actions()
                .iter()
                .map(|entry| ActionInfo {
                    action: entry.action().info(),
                    from_trigger: entry.from_trigger().cloned(),
                })
                .collect(),
            exit_actions: record.exit_actions().iter().map(|a| a.info()).collect(),
            activate_actions: record.activate_actions().iter().map(|a| a.info()).collect(),
            deactivate_actions: record
                .deactivate_actions()
                .iter()
                .map(|a| a.info())
                .collect(),
            transitions,
        }
    }

    pub fn name(&self) -> String {
        display_name(&self.state)
    }
}

fn describe<S: StateId, T: TriggerId>(
    trigger: &T,
    behavior: &TriggerBehavior<S, T>,
    parameters: &HashMap<T, Vec<&'static str>>,
) -> TransitionInfo<S, T> {
    let trigger = TriggerInfo {
        trigger: trigger.clone(),
        parameter_types: parameters
            .get(trigger)
            .map(|names| names.iter().map(|name| name.to_string()).collect()),
    };
    let guards = behavior.guards().infos();
    match behavior {
        TriggerBehavior::Fixed { destination, .. } => TransitionInfo::Fixed {
            trigger,
            destination: destination.clone(),
            guards,
        },
        TriggerBehavior::Reentrant { .. } => TransitionInfo::Reentry { trigger, guards },
        TriggerBehavior::Internal { action, .. } => TransitionInfo::Internal {
            trigger,
            action: action.info(),
            guards,
        },
        TriggerBehavior::Ignored { .. } => TransitionInfo::Ignored { trigger, guards },
        TriggerBehavior::Dynamic { selector, .. } => TransitionInfo::Dynamic {
            trigger,
            selector: selector.info(),
            guards,
        },
    }
}
