//! Transition resolution: find the behavior that accepts a trigger.
//!
//! The search starts at the current state and climbs the superstate chain.
//! At each level the behaviors for the trigger are tried in declaration
//! order and the first whose guards are met wins. Resolution never mutates
//! anything; it only evaluates guards.

use crate::core::{
    Args, BehaviorKind, BehaviorModel, GuardOutcome, StateId, Suspension, SuspensionRequired,
    TriggerBehavior, TriggerId,
};
use std::collections::HashSet;
use tracing::trace;

/// Outcome of resolving one trigger.
pub(crate) enum Resolution<'m, S, T> {
    /// `owner` is the state, possibly an ancestor, that declared `behavior`.
    Handled {
        owner: &'m S,
        behavior: &'m TriggerBehavior<S, T>,
    },
    /// Some level defines the trigger but no guard set was met. Carries the
    /// failing descriptions from the innermost such level.
    GuardsUnmet { unmet: Vec<String> },
    /// No level defines the trigger.
    Unhandled,
}

pub(crate) async fn resolve<'m, S: StateId, T: TriggerId>(
    model: &'m BehaviorModel<S, T>,
    current: &S,
    trigger: &T,
    args: &Args,
    suspension: Suspension,
) -> Result<Resolution<'m, S, T>, SuspensionRequired> {
    let mut innermost_unmet: Option<Vec<String>> = None;

    for record in model.lineage(current) {
        let behaviors = record.behaviors_for(trigger);
        if behaviors.is_empty() {
            continue;
        }

        let mut unmet = Vec::new();
        for behavior in behaviors {
            match behavior.guards().evaluate(args, suspension).await? {
                GuardOutcome::Met => {
                    trace!(state = ?record.state(), trigger = ?trigger, kind = ?behavior.kind(), "behavior selected");
                    return Ok(Resolution::Handled {
                        owner: record.state(),
                        behavior,
                    });
                }
                GuardOutcome::Unmet { description } => unmet.push(description),
            }
        }

        if innermost_unmet.is_none() {
            innermost_unmet = Some(unmet);
        }
    }

    Ok(match innermost_unmet {
        Some(unmet) => Resolution::GuardsUnmet { unmet },
        None => Resolution::Unhandled,
    })
}

/// Triggers that would cause a transition or run an internal action from
/// `current`, innermost definitions first. Ignored triggers are excluded, as
/// are triggers whose guards cannot be evaluated without suspension when
/// suspension is forbidden.
pub(crate) async fn permitted_triggers<S: StateId, T: TriggerId>(
    model: &BehaviorModel<S, T>,
    current: &S,
    args: &Args,
    suspension: Suspension,
) -> Vec<T> {
    let mut decided: HashSet<&T> = HashSet::new();
    let mut permitted = Vec::new();

    for record in model.lineage(current) {
        for (trigger, behaviors) in record.trigger_behaviors() {
            if decided.contains(trigger) {
                continue;
            }
            for behavior in behaviors {
                match behavior.guards().evaluate(args, suspension).await {
                    Ok(GuardOutcome::Met) => {
                        decided.insert(trigger);
                        if behavior.kind() != BehaviorKind::Ignored {
                            permitted.push(trigger.clone());
                        }
                        break;
                    }
                    Ok(GuardOutcome::Unmet { .. }) => {}
                    Err(_) => {
                        decided.insert(trigger);
                        break;
                    }
                }
            }
        }
    }
    permitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Guard, GuardSet};
    use futures::executor::block_on;

    #[derive(Clone, PartialEq, Eq, Hash, Debug)]
    enum TestState {
        Parent,
        Child,
        Other,
        Elsewhere,
    }

    fn guard(description: &str, result: bool) -> Guard {
        Guard::new(description, move |_: &Args| result)
    }

    fn fixed(destination: TestState, guards: Vec<Guard>) -> TriggerBehavior<TestState, &'static str> {
        TriggerBehavior::Fixed {
            destination,
            guards: GuardSet::new(guards),
        }
    }

    fn model() -> BehaviorModel<TestState, &'static str> {
        let mut model = BehaviorModel::new();
        let parent = model.intern(TestState::Parent);
        let child = model.intern(TestState::Child);
        model.intern(TestState::Other);
        model.intern(TestState::Elsewhere);
        model.link(child, parent);
        model
    }

    fn destination_of(resolution: &Resolution<'_, TestState, &'static str>) -> Option<TestState> {
        match resolution {
            Resolution::Handled {
                behavior: TriggerBehavior::Fixed { destination, .. },
                ..
            } => Some(destination.clone()),
            _ => None,
        }
    }

    #[test]
    fn first_behavior_with_met_guards_wins() {
        let mut model = model();
        let child = model.intern(TestState::Child);
        let record = model.record_mut(child);
        record.add_behavior("go", fixed(TestState::Other, vec![guard("closed", false)]));
        record.add_behavior("go", fixed(TestState::Elsewhere, vec![]));

        let resolution = block_on(resolve(
            &model,
            &TestState::Child,
            &"go",
            &Args::empty(),
            Suspension::Forbidden,
        ))
        .unwrap();
        assert_eq!(destination_of(&resolution), Some(TestState::Elsewhere));
    }

    #[test]
    fn unhandled_trigger_bubbles_to_superstate() {
        let mut model = model();
        let parent = model.intern(TestState::Parent);
        model
            .record_mut(parent)
            .add_behavior("go", fixed(TestState::Other, vec![]));

        let resolution = block_on(resolve(
            &model,
            &TestState::Child,
            &"go",
            &Args::empty(),
            Suspension::Forbidden,
        ))
        .unwrap();
        match resolution {
            Resolution::Handled { owner, .. } => assert_eq!(owner, &TestState::Parent),
            _ => panic!("expected the parent to handle the trigger"),
        }
    }

    #[test]
    fn guard_failure_keeps_searching_ancestors() {
        let mut model = model();
        let child = model.intern(TestState::Child);
        let parent = model.intern(TestState::Parent);
        model
            .record_mut(child)
            .add_behavior("go", fixed(TestState::Other, vec![guard("child guard", false)]));
        model
            .record_mut(parent)
            .add_behavior("go", fixed(TestState::Elsewhere, vec![]));

        let resolution = block_on(resolve(
            &model,
            &TestState::Child,
            &"go",
            &Args::empty(),
            Suspension::Forbidden,
        ))
        .unwrap();
        assert_eq!(destination_of(&resolution), Some(TestState::Elsewhere));
    }

    #[test]
    fn innermost_unmet_guards_are_reported() {
        let mut model = model();
        let child = model.intern(TestState::Child);
        let parent = model.intern(TestState::Parent);
        model
            .record_mut(child)
            .add_behavior("go", fixed(TestState::Other, vec![guard("child guard", false)]));
        model.record_mut(parent).add_behavior(
            "go",
            fixed(TestState::Elsewhere, vec![guard("parent guard", false)]),
        );

        let resolution = block_on(resolve(
            &model,
            &TestState::Child,
            &"go",
            &Args::empty(),
            Suspension::Forbidden,
        ))
        .unwrap();
        match resolution {
            Resolution::GuardsUnmet { unmet } => assert_eq!(unmet, vec!["child guard"]),
            _ => panic!("expected unmet guards"),
        }
    }

    #[test]
    fn undefined_trigger_is_unhandled() {
        let model = model();
        let resolution = block_on(resolve(
            &model,
            &TestState::Child,
            &"go",
            &Args::empty(),
            Suspension::Forbidden,
        ))
        .unwrap();
        assert!(matches!(resolution, Resolution::Unhandled));
    }

    #[test]
    fn suspending_guard_is_a_usage_problem_when_forbidden() {
        let mut model = model();
        let child = model.intern(TestState::Child);
        model.record_mut(child).add_behavior(
            "go",
            fixed(
                TestState::Other,
                vec![Guard::suspending("remote", |_| async { true })],
            ),
        );

        let result = block_on(resolve(
            &model,
            &TestState::Child,
            &"go",
            &Args::empty(),
            Suspension::Forbidden,
        ));
        assert!(result.is_err());
    }

    #[test]
    fn permitted_triggers_include_inherited_and_skip_ignored() {
        let mut model = model();
        let child = model.intern(TestState::Child);
        let parent = model.intern(TestState::Parent);
        model
            .record_mut(child)
            .add_behavior("go", fixed(TestState::Other, vec![]));
        model.record_mut(child).add_behavior(
            "blocked",
            fixed(TestState::Other, vec![guard("never", false)]),
        );
        model.record_mut(child).add_behavior(
            "hush",
            TriggerBehavior::Ignored {
                guards: GuardSet::default(),
            },
        );
        model
            .record_mut(parent)
            .add_behavior("hush", fixed(TestState::Elsewhere, vec![]));
        model
            .record_mut(parent)
            .add_behavior("leave", fixed(TestState::Elsewhere, vec![]));
        model.record_mut(parent).add_behavior(
            "slow",
            fixed(
                TestState::Elsewhere,
                vec![Guard::suspending("remote", |_| async { true })],
            ),
        );

        let sync = block_on(permitted_triggers(
            &model,
            &TestState::Child,
            &Args::empty(),
            Suspension::Forbidden,
        ));
        assert_eq!(sync, vec!["go", "leave"]);

        let with_suspension = block_on(permitted_triggers(
            &model,
            &TestState::Child,
            &Args::empty(),
            Suspension::Allowed,
        ));
        assert_eq!(with_suspension, vec!["go", "leave", "slow"]);
    }
}
