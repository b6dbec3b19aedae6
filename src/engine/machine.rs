//! The state machine facade.
//!
//! A built machine shares its behavior model, current-state cell and hooks
//! behind an `Arc` so the queued worker can run transitions on its own
//! task. Every transition, whatever the entry point, runs while holding the
//! machine's transition lock, so exit, mutation and entry sequences of two
//! transitions never interleave.

use crate::builder::StateMachineBuilder;
use crate::core::{Args, BehaviorModel, StateId, Suspension, SuspensionRequired, TriggerId};
use crate::engine::error::{FireError, UsageError};
use crate::engine::executor::{Executor, Hooks};
use crate::engine::firing::{FireHandle, FiringMode, MachineOptions, QueueDispatcher, QueueStatus, QueuedFire};
use crate::engine::resolver::{self, Resolution};
use crate::engine::storage::StateStorage;
use crate::reflection::{self, Direction, MachineInfo};
use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::debug;
use uuid::Uuid;

tokio::task_local! {
    /// Machines with a transition in progress on the current task.
    static ACTIVE_MACHINES: Vec<Uuid>;
}

/// Everything the builder hands over.
pub(crate) struct MachineParts<S, T> {
    pub(crate) initial_state: S,
    pub(crate) model: BehaviorModel<S, T>,
    pub(crate) storage: StateStorage<S>,
    pub(crate) hooks: Hooks<S, T>,
    pub(crate) parameters: HashMap<T, Vec<&'static str>>,
    pub(crate) options: MachineOptions,
}

/// Shared part of a machine, reachable from the queued worker.
pub(crate) struct MachineCore<S, T> {
    id: Uuid,
    initial_state: S,
    model: BehaviorModel<S, T>,
    storage: StateStorage<S>,
    hooks: Hooks<S, T>,
    parameters: HashMap<T, Vec<&'static str>>,
    firing_mode: FiringMode,
    transition_lock: tokio::sync::Mutex<()>,
    closed: AtomicBool,
}

impl<S: StateId, T: TriggerId> MachineCore<S, T> {
    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    fn ensure_open(&self) -> Result<(), UsageError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(UsageError::Closed);
        }
        Ok(())
    }

    fn in_transition(&self) -> bool {
        ACTIVE_MACHINES
            .try_with(|active| active.contains(&self.id))
            .unwrap_or(false)
    }

    /// Run `future` marked as a transition of this machine.
    async fn scoped<F: Future>(&self, future: F) -> F::Output {
        let mut active = ACTIVE_MACHINES
            .try_with(|active| active.clone())
            .unwrap_or_default();
        active.push(self.id);
        ACTIVE_MACHINES.scope(active, future).await
    }

    /// Acquire the transition lock, then resolve and execute.
    pub(crate) async fn fire_locked(
        &self,
        trigger: T,
        args: Args,
        suspension: Suspension,
    ) -> Result<(), FireError> {
        let _guard = self.transition_lock.lock().await;
        self.scoped(self.process(trigger, args, suspension)).await
    }

    async fn process(&self, trigger: T, args: Args, suspension: Suspension) -> Result<(), FireError> {
        let source = self.storage.read();
        debug!(machine = %self.id, state = ?source, trigger = ?trigger, "firing trigger");

        let resolution = resolver::resolve(&self.model, &source, &trigger, &args, suspension)
            .await
            .map_err(|cause| UsageError::suspension(&trigger, cause))?;

        match resolution {
            Resolution::Handled { owner, behavior } => {
                let executor = Executor::new(&self.model, &self.storage, &self.hooks, suspension);
                let destination = executor
                    .execute(owner, behavior, source, trigger, args)
                    .await?;
                debug!(machine = %self.id, state = ?destination, "fire completed");
                Ok(())
            }
            Resolution::GuardsUnmet { unmet } => {
                self.unhandled(source, trigger, args, Some(unmet), suspension)
                    .await
            }
            Resolution::Unhandled => self.unhandled(source, trigger, args, None, suspension).await,
        }
    }

    async fn unhandled(
        &self,
        state: S,
        trigger: T,
        args: Args,
        unmet: Option<Vec<String>>,
        suspension: Suspension,
    ) -> Result<(), FireError> {
        let Some(handler) = &self.hooks.unhandled else {
            return Err(match unmet {
                Some(unmet) => FireError::guards_unmet(&trigger, &state, unmet),
                None => FireError::unhandled(&trigger, &state),
            });
        };

        debug!(machine = %self.id, state = ?state, trigger = ?trigger, "trigger passed to unhandled handler");
        handler
            .handle(&state, &trigger, &args, suspension)
            .await
            .map_err(|cause| UsageError::suspension(&trigger, cause))?
            .map_err(|error| FireError::action_failed("unhandled trigger handler", error))
    }
}

/// A hierarchical state machine.
///
/// Built with [`StateMachine::builder`]. Cheap to share: wrap it in an
/// `Arc` to fire from several tasks.
///
/// # Example
///
/// ```rust
/// use stately::StateMachine;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Call { OffHook, Ringing, Connected }
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Event { Dial, Answer, HangUp }
///
/// let mut builder = StateMachine::builder(Call::OffHook);
/// builder.configure(Call::OffHook).permit(Event::Dial, Call::Ringing);
/// builder.configure(Call::Ringing)
///     .permit(Event::Answer, Call::Connected)
///     .permit(Event::HangUp, Call::OffHook);
/// builder.configure(Call::Connected).permit(Event::HangUp, Call::OffHook);
/// let phone = builder.build().unwrap();
///
/// phone.fire(Event::Dial, ()).unwrap();
/// assert_eq!(phone.state(), Call::Ringing);
/// assert!(phone.can_fire(Event::Answer, ()));
/// assert!(phone.fire(Event::Dial, ()).unwrap_err().is_invalid_transition());
/// ```
pub struct StateMachine<S: StateId, T: TriggerId> {
    core: Arc<MachineCore<S, T>>,
    queue: QueueDispatcher<T>,
}

impl<S: StateId, T: TriggerId> StateMachine<S, T> {
    /// Start configuring a machine whose initial state is `initial`.
    pub fn builder(initial: S) -> StateMachineBuilder<S, T> {
        StateMachineBuilder::new(initial)
    }

    pub(crate) fn from_parts(parts: MachineParts<S, T>) -> Self {
        let core = MachineCore {
            id: Uuid::new_v4(),
            initial_state: parts.initial_state,
            model: parts.model,
            storage: parts.storage,
            hooks: parts.hooks,
            parameters: parts.parameters,
            firing_mode: parts.options.firing_mode,
            transition_lock: tokio::sync::Mutex::new(()),
            closed: AtomicBool::new(false),
        };
        debug!(
            machine = %core.id,
            states = core.model.len(),
            mode = ?core.firing_mode,
            external_state = core.storage.is_external(),
            "state machine built"
        );
        Self {
            core: Arc::new(core),
            queue: QueueDispatcher::new(),
        }
    }

    /// Fire `trigger` without suspending.
    ///
    /// Fails with a usage error when the machine is queued, when called from
    /// inside one of its own transitions, or when the resolved behavior
    /// needs a suspension-capable callable. In the last case nothing has
    /// run and the state is unchanged.
    ///
    /// While another transition of this machine is in progress, a caller
    /// outside any tokio runtime blocks until it finishes; a caller on a
    /// runtime thread gets [`UsageError::Busy`] instead.
    pub fn fire(&self, trigger: T, args: impl Into<Args>) -> Result<(), FireError> {
        let core = &self.core;
        core.ensure_open()?;
        if core.firing_mode == FiringMode::Queued {
            return Err(UsageError::SyncFireInQueuedMode.into());
        }
        if core.in_transition() {
            return Err(UsageError::reentrant(&trigger).into());
        }

        let args = args.into();
        let _guard = match core.transition_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) if Handle::try_current().is_ok() => {
                return Err(UsageError::busy(&trigger).into());
            }
            Err(_) => futures::executor::block_on(core.transition_lock.lock()),
        };
        let fired = trigger.clone();
        core.scoped(core.process(trigger, args, Suspension::Forbidden))
            .now_or_never()
            .unwrap_or_else(|| {
                let cause = SuspensionRequired {
                    description: "transition".to_string(),
                };
                Err(UsageError::suspension(&fired, cause).into())
            })
    }

    /// Fire `trigger`, awaiting suspension-capable callables.
    ///
    /// In queued mode this returns once the trigger is enqueued; a failure
    /// of that item is logged. Use [`enqueue`](Self::enqueue) to observe it.
    pub async fn fire_async(&self, trigger: T, args: impl Into<Args>) -> Result<(), FireError> {
        self.core.ensure_open()?;
        let args = args.into();
        match self.core.firing_mode {
            FiringMode::Immediate => {
                if self.core.in_transition() {
                    return Err(UsageError::reentrant(&trigger).into());
                }
                self.core
                    .fire_locked(trigger, args, Suspension::Allowed)
                    .await
            }
            FiringMode::Queued => {
                self.queue
                    .submit(&self.core, QueuedFire::detached(trigger, args))?;
                Ok(())
            }
        }
    }

    /// Queue `trigger` and get a handle resolving to its outcome.
    pub fn enqueue(&self, trigger: T, args: impl Into<Args>) -> Result<FireHandle, FireError> {
        self.core.ensure_open()?;
        if self.core.firing_mode != FiringMode::Queued {
            return Err(UsageError::NotQueued.into());
        }
        let (item, handle) = QueuedFire::awaited(trigger, args.into());
        self.queue.submit(&self.core, item)?;
        Ok(handle)
    }

    /// Whether firing `trigger` would be accepted by some behavior.
    ///
    /// Ignored triggers count as fireable. Guards that need suspension are
    /// not evaluated and make the trigger count as not fireable.
    pub fn can_fire(&self, trigger: T, args: impl Into<Args>) -> bool {
        let state = self.state();
        let args = args.into();
        matches!(
            resolver::resolve(&self.core.model, &state, &trigger, &args, Suspension::Forbidden)
                .now_or_never(),
            Some(Ok(Resolution::Handled { .. }))
        )
    }

    pub async fn can_fire_async(&self, trigger: T, args: impl Into<Args>) -> bool {
        let state = self.state();
        let args = args.into();
        matches!(
            resolver::resolve(&self.core.model, &state, &trigger, &args, Suspension::Allowed).await,
            Ok(Resolution::Handled { .. })
        )
    }

    /// Triggers accepted from the current state, including ones inherited
    /// from superstates. Ignored triggers are left out.
    pub fn permitted_triggers(&self, args: impl Into<Args>) -> Vec<T> {
        let state = self.state();
        resolver::permitted_triggers(&self.core.model, &state, &args.into(), Suspension::Forbidden)
            .now_or_never()
            .unwrap_or_default()
    }

    pub async fn permitted_triggers_async(&self, args: impl Into<Args>) -> Vec<T> {
        let state = self.state();
        resolver::permitted_triggers(&self.core.model, &state, &args.into(), Suspension::Allowed)
            .await
    }

    /// Current state; with external storage this asks the accessor.
    pub fn state(&self) -> S {
        self.core.storage.read()
    }

    /// True when the current state is `state` or lies below it.
    pub fn is_in_state(&self, state: &S) -> bool {
        self.core.model.is_included_in(&self.state(), state)
    }

    pub fn initial_state(&self) -> &S {
        &self.core.initial_state
    }

    pub fn firing_mode(&self) -> FiringMode {
        self.core.firing_mode
    }

    pub fn queue_status(&self) -> QueueStatus {
        self.queue.status()
    }

    /// Read-only view of the configured behaviors.
    pub fn model(&self) -> &BehaviorModel<S, T> {
        &self.core.model
    }

    pub fn info(&self) -> MachineInfo<S, T> {
        MachineInfo::from_model(
            &self.core.initial_state,
            &self.core.model,
            &self.core.parameters,
        )
    }

    /// Graphviz DOT rendering of [`info`](Self::info).
    pub fn dot_graph(&self) -> String {
        reflection::dot_graph(&self.info())
    }

    /// Mermaid state diagram rendering of [`info`](Self::info).
    pub fn mermaid_graph(&self, direction: Direction) -> String {
        reflection::mermaid_graph(&self.info(), direction)
    }

    /// Stop accepting fires. In queued mode, items already queued are still
    /// processed; this returns once the worker has finished them.
    pub async fn close(&self) {
        if !self.core.closed.swap(true, Ordering::SeqCst) {
            debug!(machine = %self.core.id, "closing state machine");
        }
        self.queue.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.core.closed.load(Ordering::SeqCst)
    }
}
