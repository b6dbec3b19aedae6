//! Read-only description of a configured machine.
//!
//! [`MachineInfo`] captures states, hierarchy, actions and transitions as
//! plain serializable data. The graph functions render it as DOT or Mermaid
//! text.

pub mod graph;
pub mod info;

pub use graph::{dot_graph, mermaid_graph, Direction};
pub use info::{ActionInfo, MachineInfo, StateInfo, TransitionInfo, TriggerInfo};
