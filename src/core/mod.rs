//! Core state machine types.
//!
//! This module holds the data the engine consumes:
//! - State and trigger identity via the `StateId` / `TriggerId` traits
//! - Type-erased trigger arguments
//! - Capability-tagged guards, actions and selectors
//! - Trigger behaviors and the per-state behavior model
//!
//! Nothing here performs a transition; the `engine` module drives these
//! types and owns all state mutation.

mod action;
mod args;
mod behavior;
mod guard;
mod model;
mod state;
mod transition;

pub use action::{
    Action, ActionError, ActionResult, InvocationInfo, Selector, SuspensionRequired,
    UnhandledTriggerHandler,
};
pub(crate) use action::Suspension;
pub use args::{Args, ParameterTypes};
pub use behavior::{BehaviorKind, TriggerBehavior};
pub use guard::{Guard, GuardOutcome, GuardSet};
pub use model::{BehaviorModel, EntryAction, StateRepresentation};
pub use state::{display_name, StateId, TriggerId};
pub use transition::Transition;
