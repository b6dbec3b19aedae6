//! The transition context handed to actions and callbacks.

use super::args::Args;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// One transition in progress.
///
/// Created by the executor for each fire and passed by reference to every
/// action and callback involved. Initial-substate steps get their own
/// record with `is_initial` set, carrying the original trigger and
/// arguments.
#[derive(Clone, Debug)]
pub struct Transition<S, T> {
    pub source: S,
    pub destination: S,
    pub trigger: T,
    pub parameters: Args,
    /// Destination equals source on purpose (reentry behavior).
    pub is_reentry: bool,
    pub is_initial: bool,
    pub started_at: DateTime<Utc>,
}

impl<S, T> Transition<S, T> {
    pub fn new(source: S, destination: S, trigger: T, parameters: Args) -> Self {
        Self {
            source,
            destination,
            trigger,
            parameters,
            is_reentry: false,
            is_initial: false,
            started_at: Utc::now(),
        }
    }

    pub fn with_reentry(mut self, is_reentry: bool) -> Self {
        self.is_reentry = is_reentry;
        self
    }

    /// Time since the transition started.
    pub fn elapsed(&self) -> Duration {
        Utc::now()
            .signed_duration_since(self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

impl<S: Clone, T: Clone> Transition<S, T> {
    /// Nested step entering `destination`'s initial substate.
    pub(crate) fn initial_step(&self, source: S, destination: S) -> Self {
        Self {
            source,
            destination,
            trigger: self.trigger.clone(),
            parameters: self.parameters.clone(),
            is_reentry: false,
            is_initial: true,
            started_at: self.started_at,
        }
    }

    /// Same transition, reporting `destination` as where it ended up.
    pub(crate) fn completed_at(&self, destination: S) -> Self {
        Self {
            destination,
            ..self.clone()
        }
    }
}
