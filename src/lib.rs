//! Stately: an embeddable hierarchical state machine runtime
//!
//! Stately separates a machine's static description from the runtime that
//! drives it. Configuration builds a pure behavior model; the engine resolves
//! triggers against it and runs transitions with well-defined ordering.
//!
//! # Core Concepts
//!
//! - **States and triggers**: any `Clone + Eq + Hash + Debug` value
//! - **Hierarchy**: substates inherit their superstates' behaviors; exits run
//!   innermost first and entries outermost first
//! - **Guards**: described predicates selecting between behaviors
//! - **Suspension**: guards and actions may be async; only the async entry
//!   points run them, the blocking ones report a usage error up front
//! - **Firing modes**: immediate, or queued through a single worker task
//! - **Reflection**: a serializable report plus DOT and Mermaid rendering
//!
//! # Example
//!
//! ```rust
//! use stately::{Action, Args, Guard, StateMachine, Transition};
//!
//! #[derive(Clone, PartialEq, Eq, Hash, Debug)]
//! enum Call {
//!     OffHook,
//!     Ringing,
//!     Connected,
//!     OnHold,
//! }
//!
//! #[derive(Clone, PartialEq, Eq, Hash, Debug)]
//! enum Signal {
//!     Dial,
//!     Answer,
//!     Hold,
//!     HangUp,
//! }
//!
//! let mut builder = StateMachine::builder(Call::OffHook);
//! builder
//!     .configure(Call::OffHook)
//!     .permit(Signal::Dial, Call::Ringing);
//! builder
//!     .configure(Call::Ringing)
//!     .permit_if(
//!         Signal::Answer,
//!         Call::Connected,
//!         [Guard::new("line is free", |_: &Args| true)],
//!     );
//! builder
//!     .configure(Call::Connected)
//!     .permit(Signal::Hold, Call::OnHold)
//!     .permit(Signal::HangUp, Call::OffHook)
//!     .on_exit(Action::new("stop timer", |_t: &Transition<Call, Signal>| Ok(())));
//! builder.configure(Call::OnHold).substate_of(Call::Connected);
//!
//! let phone = builder.build().unwrap();
//! phone.fire(Signal::Dial, ()).unwrap();
//! phone.fire(Signal::Answer, ()).unwrap();
//! phone.fire(Signal::Hold, ()).unwrap();
//! assert!(phone.is_in_state(&Call::Connected));
//!
//! // HangUp is inherited from Connected.
//! phone.fire(Signal::HangUp, ()).unwrap();
//! assert_eq!(phone.state(), Call::OffHook);
//! ```

pub mod builder;
pub mod core;
pub mod engine;
pub mod reflection;

// Re-export commonly used types
pub use builder::{ConfigurationError, StateConfiguration, StateMachineBuilder};
pub use core::{
    Action, ActionError, ActionResult, Args, Guard, Selector, StateId, Transition, TriggerId,
    UnhandledTriggerHandler,
};
pub use engine::{FireError, FireHandle, FiringMode, MachineOptions, QueueStatus, StateMachine, UsageError};
pub use reflection::{Direction, MachineInfo};
