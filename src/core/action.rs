//! Capability-tagged callables: actions, selectors and the unhandled-trigger
//! handler.
//!
//! Every callable is registered either as an immediate closure or as a
//! suspension-capable one returning a future. The tag is fixed at
//! registration time and is all the engine needs to decide whether the
//! blocking `fire` path may run it.

use super::args::Args;
use super::transition::Transition;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a user-supplied action or handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ActionError {
    message: String,
}

impl ActionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for ActionError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ActionError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

pub type ActionResult = Result<(), ActionError>;

/// A suspension-capable callable was reached on the blocking path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{description}' is suspension-capable and cannot run on the blocking path")]
pub struct SuspensionRequired {
    pub description: String,
}

/// Whether the current evaluation may await suspension-capable callables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Suspension {
    Forbidden,
    Allowed,
}

/// Description plus capability tag of a registered callable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationInfo {
    pub description: String,
    pub is_suspending: bool,
}

pub(crate) enum Invocation<F: ?Sized, A: ?Sized> {
    Immediate(Arc<F>),
    Suspending(Arc<A>),
}

impl<F: ?Sized, A: ?Sized> Clone for Invocation<F, A> {
    fn clone(&self) -> Self {
        match self {
            Self::Immediate(f) => Self::Immediate(Arc::clone(f)),
            Self::Suspending(a) => Self::Suspending(Arc::clone(a)),
        }
    }
}

impl<F: ?Sized, A: ?Sized> Invocation<F, A> {
    pub(crate) fn is_suspending(&self) -> bool {
        matches!(self, Self::Suspending(_))
    }
}

type ImmediateAction<S, T> = dyn Fn(&Transition<S, T>) -> ActionResult + Send + Sync;
type SuspendingAction<S, T> =
    dyn Fn(Transition<S, T>) -> BoxFuture<'static, ActionResult> + Send + Sync;

/// Action run with the transition context: entry, exit, activate,
/// deactivate, internal-transition actions and transition callbacks.
///
/// # Example
///
/// ```rust
/// use stately::core::{Action, ActionError};
///
/// let log: Action<&str, &str> = Action::new("log entry", |t| {
///     println!("{:?} -> {:?}", t.source, t.destination);
///     Ok(())
/// });
/// assert!(!log.is_suspending());
///
/// let remote: Action<&str, &str> = Action::suspending("notify remote", |_t| async {
///     Err(ActionError::new("remote unreachable"))
/// });
/// assert!(remote.is_suspending());
/// assert_eq!(remote.info().description, "notify remote");
/// ```
pub struct Action<S, T> {
    invocation: Invocation<ImmediateAction<S, T>, SuspendingAction<S, T>>,
    description: String,
}

impl<S, T> Clone for Action<S, T> {
    fn clone(&self) -> Self {
        Self {
            invocation: self.invocation.clone(),
            description: self.description.clone(),
        }
    }
}

impl<S, T> Action<S, T> {
    /// Action that completes without suspending.
    pub fn new<F>(description: impl Into<String>, action: F) -> Self
    where
        F: Fn(&Transition<S, T>) -> ActionResult + Send + Sync + 'static,
    {
        Self {
            invocation: Invocation::Immediate(Arc::new(action)),
            description: description.into(),
        }
    }

    /// Action returning a future; only runs on the suspension-capable path.
    pub fn suspending<F, Fut>(description: impl Into<String>, action: F) -> Self
    where
        F: Fn(Transition<S, T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        Self {
            invocation: Invocation::Suspending(Arc::new(move |transition| {
                action(transition).boxed()
            })),
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

    pub(crate) fn ensure_allowed(&self, suspension: Suspension) -> Result<(), SuspensionRequired> {
        if suspension == Suspension::Forbidden && self.is_suspending() {
            return Err(SuspensionRequired {
                description: self.description.clone(),
            });
        }
        Ok(())
    }
}

impl<S: Clone, T: Clone> Action<S, T> {
    pub(crate) async fn invoke(
        &self,
        transition: &Transition<S, T>,
        suspension: Suspension,
    ) -> Result<ActionResult, SuspensionRequired> {
        self.ensure_allowed(suspension)?;
        Ok(match &self.invocation {
            Invocation::Immediate(action) => action(transition),
            Invocation::Suspending(action) => action(transition.clone()).await,
        })
    }
}

type ImmediateSelector<S> = dyn Fn(&Args) -> S + Send + Sync;
type SuspendingSelector<S> = dyn Fn(Args) -> BoxFuture<'static, S> + Send + Sync;

/// Computes the destination of a dynamic transition from the fired arguments.
pub struct Selector<S> {
    invocation: Invocation<ImmediateSelector<S>, SuspendingSelector<S>>,
    description: String,
}

impl<S> Selector<S> {
    pub fn new<F>(description: impl Into<String>, selector: F) -> Self
    where
        F: Fn(&Args) -> S + Send + Sync + 'static,
    {
        Self {
            invocation: Invocation::Immediate(Arc::new(selector)),
            description: description.into(),
        }
    }

    pub fn suspending<F, Fut>(description: impl Into<String>, selector: F) -> Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = S> + Send + 'static,
    {
        Self {
            invocation: Invocation::Suspending(Arc::new(move |args| selector(args).boxed())),
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

    pub(crate) async fn select(
        &self,
        args: &Args,
        suspension: Suspension,
    ) -> Result<S, SuspensionRequired> {
        match &self.invocation {
            Invocation::Immediate(selector) => Ok(selector(args)),
            Invocation::Suspending(_) if suspension == Suspension::Forbidden => {
                Err(SuspensionRequired {
                    description: self.description.clone(),
                })
            }
            Invocation::Suspending(selector) => Ok(selector(args.clone()).await),
        }
    }
}

type ImmediateHandler<S, T> = dyn Fn(&S, &T, &Args) -> ActionResult + Send + Sync;
type SuspendingHandler<S, T> = dyn Fn(S, T, Args) -> BoxFuture<'static, ActionResult> + Send + Sync;

/// Receives `(state, trigger, args)` for triggers no behavior accepted.
pub struct UnhandledTriggerHandler<S, T> {
    invocation: Invocation<ImmediateHandler<S, T>, SuspendingHandler<S, T>>,
}

impl<S, T> UnhandledTriggerHandler<S, T> {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&S, &T, &Args) -> ActionResult + Send + Sync + 'static,
    {
        Self {
            invocation: Invocation::Immediate(Arc::new(handler)),
        }
    }

    pub fn suspending<F, Fut>(handler: F) -> Self
    where
        F: Fn(S, T, Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ActionResult> + Send + 'static,
    {
        Self {
            invocation: Invocation::Suspending(Arc::new(move |state, trigger, args| {
                handler(state, trigger, args).boxed()
            })),
        }
    }

    pub fn is_suspending(&self) -> bool {
        self.invocation.is_suspending()
    }
}

impl<S: Clone, T: Clone> UnhandledTriggerHandler<S, T> {
    pub(crate) async fn handle(
        &self,
        state: &S,
        trigger: &T,
        args: &Args,
        suspension: Suspension,
    ) -> Result<ActionResult, SuspensionRequired> {
        match &self.invocation {
            Invocation::Immediate(handler) => Ok(handler(state, trigger, args)),
            Invocation::Suspending(_) if suspension == Suspension::Forbidden => {
                Err(SuspensionRequired {
                    description: "unhandled trigger handler".to_string(),
                })
            }
            Invocation::Suspending(handler) => {
                Ok(handler(state.clone(), trigger.clone(), args.clone()).await)
            }
        }
    }
}
