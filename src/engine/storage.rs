//! Current-state cell: owned by the machine or delegated to the host.

use parking_lot::RwLock;
use std::sync::Arc;

type Accessor<S> = Arc<dyn Fn() -> S + Send + Sync>;
type Mutator<S> = Arc<dyn Fn(S) + Send + Sync>;

/// Where the current state lives.
///
/// Only the executor writes, and only while holding the transition lock.
/// External accessors are consulted on every read; nothing is cached.
pub(crate) enum StateStorage<S> {
    Internal(RwLock<S>),
    External {
        accessor: Accessor<S>,
        mutator: Mutator<S>,
    },
}

impl<S: Clone> StateStorage<S> {
    pub fn internal(initial: S) -> Self {
        Self::Internal(RwLock::new(initial))
    }

    pub fn external<A, M>(accessor: A, mutator: M) -> Self
    where
        A: Fn() -> S + Send + Sync + 'static,
        M: Fn(S) + Send + Sync + 'static,
    {
        Self::External {
            accessor: Arc::new(accessor),
            mutator: Arc::new(mutator),
        }
    }

    pub fn read(&self) -> S {
        match self {
            Self::Internal(cell) => cell.read().clone(),
            Self::External { accessor, .. } => accessor(),
        }
    }

    pub(crate) fn write(&self, state: S) {
        match self {
            Self::Internal(cell) => *cell.write() = state,
            Self::External { mutator, .. } => mutator(state),
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Self::External { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn internal_storage_round_trips() {
        let storage = StateStorage::internal("idle");
        storage.write("busy");
        assert_eq!(storage.read(), "busy");
        assert!(!storage.is_external());
    }

    #[test]
    fn external_storage_delegates_every_access() {
        let cell = Arc::new(Mutex::new(1u32));
        let reader = Arc::clone(&cell);
        let writer = Arc::clone(&cell);
        let storage = StateStorage::external(move || *reader.lock(), move |s| *writer.lock() = s);

        assert_eq!(storage.read(), 1);
        *cell.lock() = 5;
        assert_eq!(storage.read(), 5);
        storage.write(9);
        assert_eq!(*cell.lock(), 9);
        assert!(storage.is_external());
    }
}
