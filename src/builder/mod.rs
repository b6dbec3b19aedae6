//! Builder API for constructing state machines.
//!
//! Provides a fluent configuration surface: machine-wide options on
//! [`StateMachineBuilder`], per-state behaviors on [`StateConfiguration`].
//! `build()` validates the hierarchy and reports every problem at once.

pub mod configuration;
pub mod error;
pub mod machine;
mod validation;

pub use configuration::StateConfiguration;
pub use error::ConfigurationError;
pub use machine::StateMachineBuilder;
