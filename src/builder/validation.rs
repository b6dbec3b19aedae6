//! Hierarchy validation using Validation.
//!
//! Every check runs; all problems are accumulated so a single `build()`
//! reports the whole configuration at once.

use crate::builder::error::ConfigurationError;
use crate::core::{display_name, BehaviorModel, StateId, TriggerId};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Type alias for one validation check's result.
pub(crate) type Check = Validation<(), NonEmptyVec<ConfigurationError>>;

/// Validate the model, folding in problems the configuration surface
/// already recorded.
pub(crate) fn validate<S: StateId, T: TriggerId>(
    model: &BehaviorModel<S, T>,
    recorded: &[ConfigurationError],
) -> Check {
    let mut checks: Vec<Check> = recorded.iter().cloned().map(Validation::fail).collect();

    checks.extend(acyclic_hierarchy(model));
    checks.extend(initial_targets_are_substates(model));

    Validation::all_vec(checks).map(|_| ())
}

/// Convert an accumulated failure into the builder's error.
pub(crate) fn into_result(check: Check) -> Result<(), ConfigurationError> {
    match check {
        Validation::Success(_) => Ok(()),
        Validation::Failure(errors) => Err(ConfigurationError::from_all(
            errors.iter().cloned().collect(),
        )),
    }
}

/// One failure per cycle, reported at the cycle member with the lowest
/// arena index.
fn acyclic_hierarchy<S: StateId, T: TriggerId>(model: &BehaviorModel<S, T>) -> Vec<Check> {
    (0..model.len())
        .filter_map(|start| {
            let members = cycle_through(model, start)?;
            let lowest = members.iter().min().copied()?;
            (lowest == start).then(|| {
                Validation::fail(ConfigurationError::CyclicHierarchy {
                    state: display_name(model.record(start).state()),
                })
            })
        })
        .collect()
}

/// Members of the superstate cycle passing through `start`, if any.
fn cycle_through<S: StateId, T: TriggerId>(
    model: &BehaviorModel<S, T>,
    start: usize,
) -> Option<Vec<usize>> {
    let mut members = vec![start];
    let mut current = model.record(start).superstate;
    while let Some(parent) = current {
        if parent == start {
            return Some(members);
        }
        if members.contains(&parent) {
            return None;
        }
        members.push(parent);
        current = model.record(parent).superstate;
    }
    None
}

fn initial_targets_are_substates<S: StateId, T: TriggerId>(
    model: &BehaviorModel<S, T>,
) -> Vec<Check> {
    model
        .states()
        .filter_map(|record| {
            let target = record.initial_transition_target()?;
            let state = record.state();
            let below = target != state && model.is_included_in(target, state);
            (!below).then(|| {
                Validation::fail(ConfigurationError::InitialTargetNotSubstate {
                    state: display_name(state),
                    target: display_name(target),
                })
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum TestState {
        Root,
        Middle,
        Leaf,
        Other,
    }

    fn model() -> BehaviorModel<TestState, &'static str> {
        let mut model = BehaviorModel::new();
        let root = model.intern(TestState::Root);
        let middle = model.intern(TestState::Middle);
        let leaf = model.intern(TestState::Leaf);
        model.intern(TestState::Other);
        model.link(middle, root);
        model.link(leaf, middle);
        model
    }

    #[test]
    fn well_formed_hierarchy_passes() {
        let mut model = model();
        let root = model.intern(TestState::Root);
        model.record_mut(root).initial_transition_target = Some(TestState::Leaf);

        assert!(validate(&model, &[]).is_success());
    }

    #[test]
    fn cycle_is_reported_once() {
        let mut model = model();
        let root = model.intern(TestState::Root);
        let leaf = model.intern(TestState::Leaf);
        model.link(root, leaf);

        match validate(&model, &[]) {
            Validation::Failure(errors) => {
                assert_eq!(errors.len(), 1);
                assert!(errors
                    .iter()
                    .all(|e| matches!(e, ConfigurationError::CyclicHierarchy { .. })));
            }
            Validation::Success(_) => panic!("Expected a cycle, got success"),
        }
    }

    #[test]
    fn initial_target_outside_subtree_fails() {
        let mut model = model();
        let middle = model.intern(TestState::Middle);
        model.record_mut(middle).initial_transition_target = Some(TestState::Other);

        let result = into_result(validate(&model, &[]));
        assert_eq!(
            result,
            Err(ConfigurationError::InitialTargetNotSubstate {
                state: "Middle".to_string(),
                target: "Other".to_string(),
            })
        );
    }

    #[test]
    fn initial_target_equal_to_state_fails() {
        let mut model = model();
        let leaf = model.intern(TestState::Leaf);
        model.record_mut(leaf).initial_transition_target = Some(TestState::Leaf);

        assert!(validate(&model, &[]).is_failure());
    }

    #[test]
    fn recorded_and_structural_problems_accumulate() {
        let mut model = model();
        let other = model.intern(TestState::Other);
        model.record_mut(other).initial_transition_target = Some(TestState::Root);
        let recorded = vec![ConfigurationError::PermitToSelf {
            state: "Leaf".to_string(),
            trigger: "go".to_string(),
        }];

        let error = into_result(validate(&model, &recorded)).unwrap_err();
        assert_eq!(error.problems().len(), 2);
        assert!(matches!(error, ConfigurationError::Multiple(_)));
    }
}
