//! Firing strategies and the queued worker.
//!
//! In immediate mode a fire runs to completion before returning. In queued
//! mode fires are pushed onto an unbounded channel drained by a single
//! worker task, so transitions run one at a time in FIFO order. The worker
//! starts lazily on the first enqueue and keeps going when an item fails.

use crate::core::{Args, StateId, Suspension, TriggerId};
use crate::engine::error::{FireError, UsageError};
use crate::engine::machine::MachineCore;
use futures::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// How fired triggers are executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FiringMode {
    /// Run the transition on the caller's path.
    #[default]
    Immediate,
    /// Serialize transitions through a background worker.
    Queued,
}

/// Machine-wide options that hosts may load from configuration files.
///
/// # Example
///
/// ```rust
/// use stately::engine::{FiringMode, MachineOptions};
///
/// let options: MachineOptions = serde_json::from_str(r#"{ "firing_mode": "queued" }"#).unwrap();
/// assert_eq!(options.firing_mode, FiringMode::Queued);
///
/// let defaults: MachineOptions = serde_json::from_str("{}").unwrap();
/// assert_eq!(defaults.firing_mode, FiringMode::Immediate);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineOptions {
    pub firing_mode: FiringMode,
}

/// Observable state of the queued worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueStatus {
    /// No worker yet, or the worker is waiting on an empty queue.
    Idle,
    /// Items are queued or being executed.
    Processing,
    /// Closed; enqueues fail.
    Stopped,
}

/// Completion signal of one enqueued trigger.
pub struct FireHandle {
    receiver: oneshot::Receiver<Result<(), FireError>>,
}

impl FireHandle {
    /// Wait for the queued trigger to be processed.
    pub async fn outcome(self) -> Result<(), FireError> {
        self.receiver
            .await
            .unwrap_or_else(|_| Err(UsageError::Closed.into()))
    }
}

pub(crate) struct QueuedFire<T> {
    trigger: T,
    args: Args,
    reply: Option<oneshot::Sender<Result<(), FireError>>>,
}

impl<T> QueuedFire<T> {
    /// Item nobody awaits; failures are logged.
    pub(crate) fn detached(trigger: T, args: Args) -> Self {
        Self {
            trigger,
            args,
            reply: None,
        }
    }

    /// Item paired with the handle that receives its outcome.
    pub(crate) fn awaited(trigger: T, args: Args) -> (Self, FireHandle) {
        let (sender, receiver) = oneshot::channel();
        let item = Self {
            trigger,
            args,
            reply: Some(sender),
        };
        (item, FireHandle { receiver })
    }
}

enum WorkerSlot<T> {
    Unstarted,
    Running {
        sender: mpsc::UnboundedSender<QueuedFire<T>>,
        worker: JoinHandle<()>,
    },
    Stopped,
}

/// Owns the queued worker's lifecycle.
pub(crate) struct QueueDispatcher<T> {
    slot: Mutex<WorkerSlot<T>>,
    pending: Arc<AtomicUsize>,
}

impl<T: TriggerId> QueueDispatcher<T> {
    pub(crate) fn new() -> Self {
        Self {
            slot: Mutex::new(WorkerSlot::Unstarted),
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Hand `item` to the worker, starting it on first use.
    pub(crate) fn submit<S: StateId>(
        &self,
        core: &Arc<MachineCore<S, T>>,
        item: QueuedFire<T>,
    ) -> Result<(), UsageError> {
        let mut slot = self.slot.lock();
        if matches!(*slot, WorkerSlot::Unstarted) {
            let runtime = Handle::try_current().map_err(|_| UsageError::NoRuntime)?;
            let (sender, receiver) = mpsc::unbounded_channel();
            let worker = runtime.spawn(process_queue(
                Arc::clone(core),
                receiver,
                Arc::clone(&self.pending),
            ));
            *slot = WorkerSlot::Running { sender, worker };
        }

        match &*slot {
            WorkerSlot::Running { sender, .. } => {
                self.pending.fetch_add(1, Ordering::SeqCst);
                sender.send(item).map_err(|_| {
                    self.pending.fetch_sub(1, Ordering::SeqCst);
                    UsageError::Closed
                })
            }
            WorkerSlot::Unstarted | WorkerSlot::Stopped => Err(UsageError::Closed),
        }
    }

    pub(crate) fn status(&self) -> QueueStatus {
        match &*self.slot.lock() {
            WorkerSlot::Stopped => QueueStatus::Stopped,
            _ if self.pending.load(Ordering::SeqCst) > 0 => QueueStatus::Processing,
            _ => QueueStatus::Idle,
        }
    }

    /// Stop accepting items, let the worker drain what is queued and wait
    /// for it to finish.
    pub(crate) async fn close(&self) {
        let previous = std::mem::replace(&mut *self.slot.lock(), WorkerSlot::Stopped);
        if let WorkerSlot::Running { sender, worker } = previous {
            drop(sender);
            if let Err(error) = worker.await {
                warn!(%error, "queue processor ended abnormally");
            }
        }
    }
}

async fn process_queue<S: StateId, T: TriggerId>(
    core: Arc<MachineCore<S, T>>,
    mut receiver: mpsc::UnboundedReceiver<QueuedFire<T>>,
    pending: Arc<AtomicUsize>,
) {
    info!(machine = %core.id(), "queue processor started");

    while let Some(QueuedFire {
        trigger,
        args,
        reply,
    }) = receiver.recv().await
    {
        let outcome = AssertUnwindSafe(core.fire_locked(trigger.clone(), args, Suspension::Allowed))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(FireError::panicked(&trigger, payload)));
        pending.fetch_sub(1, Ordering::SeqCst);

        match reply {
            Some(reply) => {
                let _ = reply.send(outcome);
            }
            None => {
                if let Err(error) = outcome {
                    warn!(machine = %core.id(), trigger = ?trigger, %error, "queued trigger failed");
                }
            }
        }
    }

    info!(machine = %core.id(), "queue processor stopped");
}
