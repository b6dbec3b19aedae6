//! The behavior model: one record per state, held in an index-addressed
//! arena.
//!
//! Hierarchy links are arena indices, so ancestor walks and descendant
//! checks are plain lookups. After a machine is built the model is only
//! ever read; this module's public surface is the read-only traversal used
//! by reflection and diagram generation.

use super::action::Action;
use super::behavior::TriggerBehavior;
use super::state::{StateId, TriggerId};
use std::collections::HashMap;

/// Entry action with an optional originating-trigger filter.
pub struct EntryAction<S, T> {
    pub(crate) action: Action<S, T>,
    pub(crate) from_trigger: Option<T>,
}

impl<S, T: PartialEq> EntryAction<S, T> {
    pub fn action(&self) -> &Action<S, T> {
        &self.action
    }

    pub fn from_trigger(&self) -> Option<&T> {
        self.from_trigger.as_ref()
    }

    /// Runs for `trigger` unless filtered to a different one.
    pub fn applies_to(&self, trigger: &T) -> bool {
        self.from_trigger.as_ref().map_or(true, |only| only == trigger)
    }
}

/// Everything configured for one state.
pub struct StateRepresentation<S, T> {
    pub(crate) state: S,
    pub(crate) superstate: Option<usize>,
    pub(crate) substates: Vec<usize>,
    pub(crate) initial_transition_target: Option<S>,
    pub(crate) entry_actions: Vec<EntryAction<S, T>>,
    pub(crate) exit_actions: Vec<Action<S, T>>,
    pub(crate) activate_actions: Vec<Action<S, T>>,
    pub(crate) deactivate_actions: Vec<Action<S, T>>,
    pub(crate) trigger_behaviors: Vec<(T, Vec<TriggerBehavior<S, T>>)>,
}

impl<S: StateId, T: TriggerId> StateRepresentation<S, T> {
    fn new(state: S) -> Self {
        Self {
            state,
            superstate: None,
            substates: Vec::new(),
            initial_transition_target: None,
            entry_actions: Vec::new(),
            exit_actions: Vec::new(),
            activate_actions: Vec::new(),
            deactivate_actions: Vec::new(),
            trigger_behaviors: Vec::new(),
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn initial_transition_target(&self) -> Option<&S> {
        self.initial_transition_target.as_ref()
    }

    pub fn entry_actions(&self) -> &[EntryAction<S, T>] {
        &self.entry_actions
    }

    pub fn exit_actions(&self) -> &[Action<S, T>] {
        &self.exit_actions
    }

    pub fn activate_actions(&self) -> &[Action<S, T>] {
        &self.activate_actions
    }

    pub fn deactivate_actions(&self) -> &[Action<S, T>] {
        &self.deactivate_actions
    }

    /// Triggers in first-configured order, each with its behaviors in
    /// configured order.
    pub fn trigger_behaviors(&self) -> impl Iterator<Item = (&T, &[TriggerBehavior<S, T>])> {
        self.trigger_behaviors
            .iter()
            .map(|(trigger, behaviors)| (trigger, behaviors.as_slice()))
    }

    /// Behaviors configured for `trigger` at this level only.
    pub fn behaviors_for(&self, trigger: &T) -> &[TriggerBehavior<S, T>] {
        self.trigger_behaviors
            .iter()
            .find(|(configured, _)| configured == trigger)
            .map(|(_, behaviors)| behaviors.as_slice())
            .unwrap_or(&[])
    }

    pub(crate) fn add_behavior(&mut self, trigger: T, behavior: TriggerBehavior<S, T>) {
        match self
            .trigger_behaviors
            .iter_mut()
            .find(|(configured, _)| *configured == trigger)
        {
            Some((_, behaviors)) => behaviors.push(behavior),
            None => self.trigger_behaviors.push((trigger, vec![behavior])),
        }
    }
}

/// All state records of a machine.
pub struct BehaviorModel<S, T> {
    records: Vec<StateRepresentation<S, T>>,
    index: HashMap<S, usize>,
}

impl<S: StateId, T: TriggerId> Default for BehaviorModel<S, T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<S: StateId, T: TriggerId> BehaviorModel<S, T> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Index of `state`, creating an empty record on first reference.
    pub(crate) fn intern(&mut self, state: S) -> usize {
        if let Some(&index) = self.index.get(&state) {
            return index;
        }
        let index = self.records.len();
        self.index.insert(state.clone(), index);
        self.records.push(StateRepresentation::new(state));
        index
    }

    pub(crate) fn index_of(&self, state: &S) -> Option<usize> {
        self.index.get(state).copied()
    }

    pub(crate) fn record(&self, index: usize) -> &StateRepresentation<S, T> {
        &self.records[index]
    }

    pub(crate) fn record_mut(&mut self, index: usize) -> &mut StateRepresentation<S, T> {
        &mut self.records[index]
    }

    /// Attach `child` below `parent`. The caller has already rejected
    /// conflicting or self links.
    pub(crate) fn link(&mut self, child: usize, parent: usize) {
        self.records[child].superstate = Some(parent);
        if !self.records[parent].substates.contains(&child) {
            self.records[parent].substates.push(child);
        }
    }

    /// Arena indices from `index` up to its root. Stops early on a cycle so
    /// an unvalidated model cannot hang the walk.
    pub(crate) fn chain(&self, index: usize) -> Vec<usize> {
        let mut chain = vec![index];
        let mut current = self.records[index].superstate;
        while let Some(parent) = current {
            if chain.contains(&parent) {
                break;
            }
            chain.push(parent);
            current = self.records[parent].superstate;
        }
        chain
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every state record in first-referenced order.
    pub fn states(&self) -> impl Iterator<Item = &StateRepresentation<S, T>> {
        self.records.iter()
    }

    pub fn representation(&self, state: &S) -> Option<&StateRepresentation<S, T>> {
        self.index_of(state).map(|index| &self.records[index])
    }

    pub fn superstate(&self, state: &S) -> Option<&S> {
        let parent = self.records[self.index_of(state)?].superstate?;
        Some(&self.records[parent].state)
    }

    pub fn substates(&self, state: &S) -> Vec<&S> {
        self.representation(state)
            .map(|record| {
                record
                    .substates
                    .iter()
                    .map(|&child| &self.records[child].state)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Records from `state` up to its root; empty for unknown states.
    pub fn lineage(&self, state: &S) -> Vec<&StateRepresentation<S, T>> {
        self.index_of(state)
            .map(|index| {
                self.chain(index)
                    .into_iter()
                    .map(|i| &self.records[i])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `state` followed by its ancestors, innermost first. A state the
    /// model has never seen is its own root.
    pub fn ancestry(&self, state: &S) -> Vec<S> {
        match self.index_of(state) {
            Some(index) => self
                .chain(index)
                .into_iter()
                .map(|i| self.records[i].state.clone())
                .collect(),
            None => vec![state.clone()],
        }
    }

    /// True when `state` equals `ancestor` or lies below it.
    pub fn is_included_in(&self, state: &S, ancestor: &S) -> bool {
        self.ancestry(state).iter().any(|s| s == ancestor)
    }

    /// Deepest state present in both ancestor chains; `None` when the two
    /// only meet at the forest root.
    pub fn common_ancestor(&self, a: &S, b: &S) -> Option<S> {
        let others = self.ancestry(b);
        self.ancestry(a).into_iter().find(|s| others.contains(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GuardSet;

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum Room {
        House,
        Kitchen,
        Pantry,
        Bedroom,
        Garden,
    }

    fn house() -> BehaviorModel<Room, &'static str> {
        let mut model = BehaviorModel::new();
        let house = model.intern(Room::House);
        let kitchen = model.intern(Room::Kitchen);
        let pantry = model.intern(Room::Pantry);
        let bedroom = model.intern(Room::Bedroom);
        model.intern(Room::Garden);
        model.link(kitchen, house);
        model.link(pantry, kitchen);
        model.link(bedroom, house);
        model
    }

    #[test]
    fn intern_is_idempotent() {
        let mut model: BehaviorModel<Room, &str> = BehaviorModel::new();
        let first = model.intern(Room::House);
        let second = model.intern(Room::House);
        assert_eq!(first, second);
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn ancestry_walks_innermost_first() {
        let model = house();
        assert_eq!(
            model.ancestry(&Room::Pantry),
            vec![Room::Pantry, Room::Kitchen, Room::House]
        );
        assert_eq!(model.ancestry(&Room::Garden), vec![Room::Garden]);
    }

    #[test]
    fn superstate_and_substates_are_linked_both_ways() {
        let model = house();
        assert_eq!(model.superstate(&Room::Kitchen), Some(&Room::House));
        assert_eq!(model.superstate(&Room::House), None);
        assert_eq!(
            model.substates(&Room::House),
            vec![&Room::Kitchen, &Room::Bedroom]
        );
    }

    #[test]
    fn common_ancestor_is_deepest_shared_state() {
        let model = house();
        assert_eq!(
            model.common_ancestor(&Room::Pantry, &Room::Bedroom),
            Some(Room::House)
        );
        assert_eq!(
            model.common_ancestor(&Room::Pantry, &Room::Kitchen),
            Some(Room::Kitchen)
        );
        assert_eq!(model.common_ancestor(&Room::Pantry, &Room::Garden), None);
    }

    #[test]
    fn inclusion_covers_self_and_ancestors() {
        let model = house();
        assert!(model.is_included_in(&Room::Pantry, &Room::House));
        assert!(model.is_included_in(&Room::Pantry, &Room::Pantry));
        assert!(!model.is_included_in(&Room::House, &Room::Pantry));
        assert!(!model.is_included_in(&Room::Garden, &Room::House));
    }

    #[test]
    fn chain_stops_on_cycle() {
        let mut model: BehaviorModel<Room, &str> = BehaviorModel::new();
        let a = model.intern(Room::Kitchen);
        let b = model.intern(Room::Pantry);
        model.link(a, b);
        model.link(b, a);
        assert_eq!(model.chain(a), vec![a, b]);
    }

    #[test]
    fn behaviors_keep_trigger_and_declaration_order() {
        let mut model: BehaviorModel<Room, &str> = BehaviorModel::new();
        let kitchen = model.intern(Room::Kitchen);
        let record = model.record_mut(kitchen);
        record.add_behavior(
            "leave",
            TriggerBehavior::Fixed {
                destination: Room::Garden,
                guards: GuardSet::default(),
            },
        );
        record.add_behavior(
            "nap",
            TriggerBehavior::Ignored {
                guards: GuardSet::default(),
            },
        );
        record.add_behavior(
            "leave",
            TriggerBehavior::Fixed {
                destination: Room::Bedroom,
                guards: GuardSet::default(),
            },
        );

        let record = model.record(kitchen);
        let triggers: Vec<_> = record.trigger_behaviors().map(|(t, b)| (*t, b.len())).collect();
        assert_eq!(triggers, vec![("leave", 2), ("nap", 1)]);
        assert!(record.behaviors_for(&"dance").is_empty());
    }
}
