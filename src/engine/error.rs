//! Errors raised while firing triggers.

use crate::builder::ConfigurationError;
use crate::core::{display_name, ActionError, SuspensionRequired};
use std::any::Any;
use std::fmt::Debug;
use thiserror::Error;

/// The machine was used in a way its configuration or mode does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("trigger '{trigger}' needs suspension-capable '{description}'; use fire_async")]
    SuspensionRequired { trigger: String, description: String },

    #[error("machine uses queued firing; use fire_async or enqueue")]
    SyncFireInQueuedMode,

    #[error("enqueue requires queued firing mode")]
    NotQueued,

    #[error("trigger '{trigger}' fired from inside a transition of the same machine")]
    ReentrantFire { trigger: String },

    #[error("trigger '{trigger}' fired synchronously on a runtime thread while another transition is in progress; use fire_async")]
    Busy { trigger: String },

    #[error("state machine has been closed")]
    Closed,

    #[error("queued firing requires a running tokio runtime")]
    NoRuntime,
}

impl UsageError {
    pub(crate) fn suspension<T: Debug>(trigger: &T, cause: SuspensionRequired) -> Self {
        Self::SuspensionRequired {
            trigger: display_name(trigger),
            description: cause.description,
        }
    }

    pub(crate) fn busy<T: Debug>(trigger: &T) -> Self {
        Self::Busy {
            trigger: display_name(trigger),
        }
    }

    pub(crate) fn reentrant<T: Debug>(trigger: &T) -> Self {
        Self::ReentrantFire {
            trigger: display_name(trigger),
        }
    }
}

/// Why a fire did not complete.
#[derive(Debug, Clone, Error)]
pub enum FireError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("no valid transitions are permitted from state '{state}' for trigger '{trigger}'")]
    Unhandled { trigger: String, state: String },

    #[error("trigger '{trigger}' is valid for state '{state}' but guard conditions are not met: {}", .unmet.join(", "))]
    GuardsUnmet {
        trigger: String,
        state: String,
        unmet: Vec<String>,
    },

    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error("action '{action}' failed: {source}")]
    ActionFailed {
        action: String,
        #[source]
        source: ActionError,
    },

    #[error("transition for trigger '{trigger}' panicked: {message}")]
    Panicked { trigger: String, message: String },
}

impl FireError {
    pub(crate) fn unhandled<S: Debug, T: Debug>(trigger: &T, state: &S) -> Self {
        Self::Unhandled {
            trigger: display_name(trigger),
            state: display_name(state),
        }
    }

    pub(crate) fn guards_unmet<S: Debug, T: Debug>(
        trigger: &T,
        state: &S,
        unmet: Vec<String>,
    ) -> Self {
        Self::GuardsUnmet {
            trigger: display_name(trigger),
            state: display_name(state),
            unmet,
        }
    }

    pub(crate) fn action_failed(action: &str, source: ActionError) -> Self {
        Self::ActionFailed {
            action: action.to_string(),
            source,
        }
    }

    pub(crate) fn panicked<T: Debug>(trigger: &T, payload: Box<dyn Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic payload".to_string());
        Self::Panicked {
            trigger: display_name(trigger),
            message,
        }
    }

    /// True for "no behavior accepted the trigger", whether because none is
    /// configured or because every candidate's guards failed.
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::Unhandled { .. } | Self::GuardsUnmet { .. })
    }

    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }

    /// Unmet guard descriptions, when guards were the reason.
    pub fn unmet_guards(&self) -> &[String] {
        match self {
            Self::GuardsUnmet { unmet, .. } => unmet,
            _ => &[],
        }
    }
}
