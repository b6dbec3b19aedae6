//! Guard predicates and their conjunction.
//!
//! A guard decides whether a behavior is eligible for the fired arguments.
//! A behavior's guards form a [`GuardSet`] evaluated as a logical AND, left
//! to right, stopping at the first failure.

use super::action::{Invocation, InvocationInfo, Suspension, SuspensionRequired};
use super::args::Args;
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

type ImmediatePredicate = dyn Fn(&Args) -> bool + Send + Sync;
type SuspendingPredicate = dyn Fn(Args) -> BoxFuture<'static, bool> + Send + Sync;

/// Predicate that must hold for a behavior to be eligible.
///
/// # Example
///
/// ```rust
/// use stately::core::{Args, Guard};
///
/// let has_credit = Guard::new("balance covers price", |args: &Args| {
///     args.get::<u32>(0).copied().unwrap_or(0) >= 10
/// });
///
/// assert_eq!(has_credit.check(&Args::from((25u32,))), Ok(true));
/// assert_eq!(has_credit.check(&Args::from((5u32,))), Ok(false));
/// assert_eq!(has_credit.description(), "balance covers price");
/// ```
#[derive(Clone)]
pub struct Guard {
    invocation: Invocation<ImmediatePredicate, SuspendingPredicate>,
    description: String,
}

impl Guard {
    /// Guard that evaluates without suspending.
    pub fn new<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Args) -> bool + Send + Sync + 'static,
    {
        Self {
            invocation: Invocation::Immediate(Arc::new(predicate)),
            description: description.into(),
        }
    }

    /// Guard whose predicate must be awaited.
    ///
    /// Behaviors carrying one can only be resolved by the suspension-capable
    /// entry points; the blocking ones report a usage error instead.
    pub fn suspending<F, Fut>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Self {
            invocation: Invocation::Suspending(Arc::new(move |args| predicate(args).boxed())),
            description: description.into(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_suspending(&self) -> bool {
        self.invocation.is_suspending()
    }

    pub fn info(&self) -> InvocationInfo {
        InvocationInfo {
            description: self.description.clone(),
            is_suspending: self.is_suspending(),
        }
    }

    /// Evaluate without suspending.
    ///
    /// Fails for suspension-capable guards instead of blocking on them.
    pub fn check(&self, args: &Args) -> Result<bool, SuspensionRequired> {
        match &self.invocation {
            Invocation::Immediate(predicate) => Ok(predicate(args)),
            Invocation::Suspending(_) => Err(SuspensionRequired {
                description: self.description.clone(),
            }),
        }
    }

    async fn evaluate(&self, args: &Args) -> bool {
        match &self.invocation {
            Invocation::Immediate(predicate) => predicate(args),
            Invocation::Suspending(predicate) => predicate(args.clone()).await,
        }
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("description", &self.description)
            .field("is_suspending", &self.is_suspending())
            .finish()
    }
}

/// Result of evaluating a [`GuardSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Met,
    /// Carries the description of the first guard that failed.
    Unmet { description: String },
}

impl GuardOutcome {
    pub fn is_met(&self) -> bool {
        matches!(self, Self::Met)
    }
}

/// Ordered conjunction of guards. An empty set is always met.
#[derive(Debug, Clone, Default)]
pub struct GuardSet {
    guards: Vec<Guard>,
}

impl GuardSet {
    pub fn new(guards: impl IntoIterator<Item = Guard>) -> Self {
        Self {
            guards: guards.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Guard> {
        self.guards.iter()
    }

    /// True when any member must be awaited.
    pub fn requires_suspension(&self) -> bool {
        self.guards.iter().any(Guard::is_suspending)
    }

    pub fn infos(&self) -> Vec<InvocationInfo> {
        self.guards.iter().map(Guard::info).collect()
    }

    /// Evaluate left to right, awaiting suspension-capable guards one at a
    /// time. With suspension forbidden, a set containing any
    /// suspension-capable guard is rejected before any guard runs.
    pub(crate) async fn evaluate(
        &self,
        args: &Args,
        suspension: Suspension,
    ) -> Result<GuardOutcome, SuspensionRequired> {
        if suspension == Suspension::Forbidden {
            if let Some(guard) = self.guards.iter().find(|g| g.is_suspending()) {
                return Err(SuspensionRequired {
                    description: guard.description.clone(),
                });
            }
        }

        for guard in &self.guards {
            if !guard.evaluate(args).await {
                return Ok(GuardOutcome::Unmet {
                    description: guard.description.clone(),
                });
            }
        }
        Ok(GuardOutcome::Met)
    }
}

impl FromIterator<Guard> for GuardSet {
    fn from_iter<I: IntoIterator<Item = Guard>>(iter: I) -> Self {
        Self::new(iter)
    }
}
