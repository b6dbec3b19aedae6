//! The runtime around the core model.
//!
//! Where `core` describes what a machine may do, this module does it:
//!
//! - **Resolution**: find the behavior accepting a trigger, climbing superstates
//! - **Execution**: run exit, mutation and entry sequences in hierarchical order
//! - **Firing**: immediate or queued execution under the transition lock
//! - **Facade**: [`StateMachine`] with fire, trigger queries and reflection shortcuts
//!
//! All state mutation happens here, on the executor's path, while the
//! machine's transition lock is held.

pub mod error;
mod executor;
pub mod firing;
pub mod machine;
mod resolver;
mod storage;

pub use error::{FireError, UsageError};
pub(crate) use executor::Hooks;
pub use firing::{FireHandle, FiringMode, MachineOptions, QueueStatus};
pub(crate) use machine::MachineParts;
pub use machine::StateMachine;
pub(crate) use storage::StateStorage;
