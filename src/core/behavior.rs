//! Trigger behaviors: how a state responds to a trigger.

use super::action::{Action, Selector, Suspension, SuspensionRequired};
use super::guard::GuardSet;
use std::fmt;

/// A configured response to a trigger in a given state.
///
/// Several behaviors may be configured for the same trigger; the first one
/// whose guards are met wins.
pub enum TriggerBehavior<S, T> {
    /// Transition to a different state.
    Fixed { destination: S, guards: GuardSet },
    /// Leave and re-enter the configuring state.
    Reentrant { guards: GuardSet },
    /// Run `action` with no exit, entry or state change.
    Internal {
        action: Action<S, T>,
        guards: GuardSet,
    },
    /// Accept the trigger and do nothing.
    Ignored { guards: GuardSet },
    /// Destination chosen at fire time from the arguments.
    Dynamic {
        selector: Selector<S>,
        guards: GuardSet,
    },
}

/// Discriminant of a [`TriggerBehavior`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorKind {
    Fixed,
    Reentrant,
    Internal,
    Ignored,
    Dynamic,
}

impl<S, T> TriggerBehavior<S, T> {
    pub fn guards(&self) -> &GuardSet {
        match self {
            Self::Fixed { guards, .. }
            | Self::Reentrant { guards }
            | Self::Internal { guards, .. }
            | Self::Ignored { guards }
            | Self::Dynamic { guards, .. } => guards,
        }
    }

    pub fn kind(&self) -> BehaviorKind {
        match self {
            Self::Fixed { .. } => BehaviorKind::Fixed,
            Self::Reentrant { .. } => BehaviorKind::Reentrant,
            Self::Internal { .. } => BehaviorKind::Internal,
            Self::Ignored { .. } => BehaviorKind::Ignored,
            Self::Dynamic { .. } => BehaviorKind::Dynamic,
        }
    }

    /// Reject a suspension-capable internal action or selector up front.
    pub(crate) fn ensure_allowed(&self, suspension: Suspension) -> Result<(), SuspensionRequired> {
        match self {
            Self::Internal { action, .. } => action.ensure_allowed(suspension),
            Self::Dynamic { selector, .. }
                if suspension == Suspension::Forbidden && selector.is_suspending() =>
            {
                Err(SuspensionRequired {
                    description: selector.description().to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

impl<S: fmt::Debug, T> fmt::Debug for TriggerBehavior<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("TriggerBehavior");
        out.field("kind", &self.kind());
        match self {
            Self::Fixed { destination, .. } => out.field("destination", destination),
            Self::Internal { action, .. } => out.field("action", &action.description()),
            Self::Dynamic { selector, .. } => out.field("selector", &selector.description()),
            Self::Reentrant { .. } | Self::Ignored { .. } => &mut out,
        };
        out.field("guards", self.guards()).finish()
    }
}
