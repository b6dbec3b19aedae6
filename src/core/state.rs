//! Identity traits for states and triggers.
//!
//! A state or trigger is any value usable as a map key. Both traits are
//! blanket-implemented, so plain enums, strings and integers work without
//! any ceremony.

use std::fmt::Debug;
use std::hash::Hash;

/// Identity of a state in a machine.
///
/// States exist implicitly: a value becomes a state the first time the
/// configuration or a transition target refers to it.
///
/// # Required Traits
///
/// - `Clone`: the current state is copied out of storage for every fire
/// - `Eq` + `Hash`: states key the behavior model
/// - `Debug`: states appear in errors, logs and diagrams
/// - `Send` + `Sync`: machines are shared across tasks
///
/// # Example
///
/// ```rust
/// use stately::core::StateId;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Phone {
///     OffHook,
///     Ringing,
///     Connected,
/// }
///
/// fn assert_state<S: StateId>(_: &S) {}
/// assert_state(&Phone::Ringing);
/// assert_state(&"any string works too");
/// ```
pub trait StateId: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> StateId for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Identity of a trigger (an event that may cause a transition).
pub trait TriggerId: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> TriggerId for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Human readable name of a state or trigger, derived from its `Debug` form.
///
/// String identities lose their surrounding quotes so `"Idle"` renders as
/// `Idle` in diagrams and messages.
pub fn display_name<V: Debug>(value: &V) -> String {
    let rendered = format!("{value:?}");
    match rendered
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
    {
        Some(inner) => inner.to_string(),
        None => rendered,
    }
}
