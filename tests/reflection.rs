//! Reflection through the machine facade.

use serde::Serialize;
use stately::reflection::TransitionInfo;
use stately::{Action, Args, Direction, Guard, Selector, StateMachine, Transition};

#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize)]
enum Ticket {
    Open,
    Triage,
    Assigned,
    Resolved,
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize)]
enum Event {
    Accept,
    Assign,
    Escalate,
    Resolve,
    Comment,
}

fn tracker() -> StateMachine<Ticket, Event> {
    let mut builder = StateMachine::builder(Ticket::Open)
        .trigger_parameters::<(String, u32)>(Event::Assign);
    builder
        .configure(Ticket::Open)
        .permit(Event::Accept, Ticket::Triage)
        .internal_transition(
            Event::Comment,
            Action::new("append comment", |_t: &Transition<Ticket, Event>| Ok(())),
        );
    builder
        .configure(Ticket::Triage)
        .initial_transition(Ticket::Assigned)
        .permit_if(
            Event::Resolve,
            Ticket::Resolved,
            [Guard::new("has fix", |_: &Args| true)],
        )
        .on_activate(Action::new("start sla clock", |_t: &Transition<Ticket, Event>| Ok(())));
    builder
        .configure(Ticket::Assigned)
        .substate_of(Ticket::Triage)
        .dynamic(
            Event::Escalate,
            Selector::suspending("on-call lookup", |_args: Args| async { Ticket::Assigned }),
        )
        .permit_reentry(Event::Assign);
    builder.build().unwrap()
}

#[test]
fn info_reports_the_configuration() {
    let info = tracker().info();

    assert_eq!(info.initial_state, Ticket::Open);
    assert_eq!(info.states.len(), 4);

    let triage = info.state(&Ticket::Triage).unwrap();
    assert_eq!(triage.initial_transition_target, Some(Ticket::Assigned));
    assert_eq!(triage.substates, vec![Ticket::Assigned]);
    assert_eq!(triage.activate_actions[0].description, "start sla clock");

    let assigned = info.state(&Ticket::Assigned).unwrap();
    match &assigned.transitions[0] {
        TransitionInfo::Dynamic { selector, .. } => {
            assert_eq!(selector.description, "on-call lookup");
            assert!(selector.is_suspending);
        }
        other => panic!("expected dynamic transition, got {other:?}"),
    }
    assert_eq!(
        assigned.transitions[1].trigger().parameter_types,
        Some(vec![
            std::any::type_name::<String>().to_string(),
            "u32".to_string()
        ])
    );
}

#[test]
fn info_serializes_to_json() {
    let json = serde_json::to_value(tracker().info()).unwrap();

    let open = &json["states"][0];
    assert_eq!(open["state"], "Open");
    assert_eq!(open["transitions"][1]["kind"], "internal");
    assert_eq!(open["transitions"][1]["action"]["description"], "append comment");
    assert_eq!(open["transitions"][1]["action"]["is_suspending"], false);
    assert_eq!(json["states"][1]["transitions"][0]["destination"], "Resolved");
}

#[test]
fn graphs_render_from_the_facade() {
    let machine = tracker();

    let dot = machine.dot_graph();
    assert!(dot.contains("subgraph \"cluster_Triage\" {"));
    assert!(dot.contains("\"Triage\" -> \"Resolved\" [label=\"Resolve [has fix]\", ltail=\"cluster_Triage\"];"));
    assert!(dot.contains("\"Assigned\" -> \"Assigned\" [label=\"Escalate -> (on-call lookup)\", style=dashed];"));
    assert!(dot.contains("__start -> \"Open\";"));

    let mermaid = machine.mermaid_graph(Direction::TopToBottom);
    assert!(mermaid.contains("    direction TB"));
    assert!(mermaid.contains("    state Triage {"));
    assert!(mermaid.contains("        [*] --> Assigned"));
    assert!(mermaid.contains("    Assigned --> Assigned : Assign (reentry)"));
    assert!(mermaid.contains("    Open --> Open : Comment (internal)"));
}

#[test]
fn reflection_does_not_touch_runtime_state() {
    let machine = tracker();
    machine.fire(Event::Accept, ()).unwrap();

    let info = machine.info();

    assert_eq!(info.initial_state, Ticket::Open);
    assert_eq!(machine.state(), Ticket::Assigned);
}
