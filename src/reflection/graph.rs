//! Text diagrams rendered from a [`MachineInfo`].
//!
//! Two dialects are supported: Graphviz DOT, where superstates become
//! clusters, and Mermaid `stateDiagram-v2`, where they become composite
//! states. Both render states first and transitions after.

use crate::core::{display_name, InvocationInfo, StateId, TriggerId};
use crate::reflection::info::{MachineInfo, StateInfo, TransitionInfo};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Layout direction of a Mermaid diagram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    TopToBottom,
    BottomToTop,
    LeftToRight,
    RightToLeft,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopToBottom => "TB",
            Self::BottomToTop => "BT",
            Self::LeftToRight => "LR",
            Self::RightToLeft => "RL",
        }
    }
}

/// Label pieces shared by both dialects.
struct Edge {
    from: String,
    to: String,
    label: String,
    kind: EdgeKind,
}

#[derive(PartialEq)]
enum EdgeKind {
    Plain,
    Internal,
    Dynamic,
}

fn guard_suffix(guards: &[InvocationInfo]) -> String {
    if guards.is_empty() {
        return String::new();
    }
    let names: Vec<&str> = guards.iter().map(|g| g.description.as_str()).collect();
    format!(" [{}]", names.join(", "))
}

fn edges<S: StateId, T: TriggerId>(state: &StateInfo<S, T>) -> Vec<Edge> {
    let from = state.name();
    state
        .transitions
        .iter()
        .map(|transition| {
            let label = format!(
                "{}{}",
                display_name(&transition.trigger().trigger),
                guard_suffix(transition.guards())
            );
            let (to, label, kind) = match transition {
                TransitionInfo::Fixed { destination, .. } => {
                    (display_name(destination), label, EdgeKind::Plain)
                }
                TransitionInfo::Reentry { .. } => {
                    (from.clone(), format!("{label} (reentry)"), EdgeKind::Plain)
                }
                TransitionInfo::Internal { .. } => {
                    (from.clone(), format!("{label} (internal)"), EdgeKind::Internal)
                }
                TransitionInfo::Ignored { .. } => {
                    (from.clone(), format!("{label} (ignored)"), EdgeKind::Plain)
                }
                TransitionInfo::Dynamic { selector, .. } => (
                    from.clone(),
                    format!("{label} -> ({})", selector.description),
                    EdgeKind::Dynamic,
                ),
            };
            Edge {
                from: from.clone(),
                to,
                label,
                kind,
            }
        })
        .collect()
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Render `info` as a Graphviz digraph.
pub fn dot_graph<S: StateId, T: TriggerId>(info: &MachineInfo<S, T>) -> String {
    let clusters: HashSet<String> = info
        .states
        .iter()
        .filter(|state| !state.substates.is_empty())
        .map(StateInfo::name)
        .collect();

    let mut lines = vec!["digraph StateMachine {".to_string(), "  compound=true;".to_string()];
    for root in info.roots() {
        dot_node(info, root, 1, &mut lines);
    }

    let cluster_of = |name: &str| {
        clusters
            .contains(name)
            .then(|| quote(&format!("cluster_{name}")))
    };

    for state in &info.states {
        for edge in edges(state) {
            let mut attrs = vec![format!("label={}", quote(&edge.label))];
            if edge.from != edge.to {
                if let Some(cluster) = cluster_of(&edge.from) {
                    attrs.push(format!("ltail={cluster}"));
                }
                if let Some(cluster) = cluster_of(&edge.to) {
                    attrs.push(format!("lhead={cluster}"));
                }
            }
            match edge.kind {
                EdgeKind::Plain => {}
                EdgeKind::Internal => attrs.push("style=dotted".to_string()),
                EdgeKind::Dynamic => attrs.push("style=dashed".to_string()),
            }
            lines.push(format!(
                "  {} -> {} [{}];",
                quote(&edge.from),
                quote(&edge.to),
                attrs.join(", ")
            ));
        }

        if let Some(target) = &state.initial_transition_target {
            let name = state.name();
            let target = display_name(target);
            let mut attrs = vec!["label=\"initial\"".to_string()];
            if let Some(cluster) = cluster_of(&target) {
                attrs.push(format!("lhead={cluster}"));
            }
            lines.push(format!(
                "  {} -> {} [{}];",
                quote(&format!("cluster_{name}_entry")),
                quote(&target),
                attrs.join(", ")
            ));
        }
    }

    let initial = display_name(&info.initial_state);
    lines.push(
        "  __start [label=\"\", shape=circle, fillcolor=black, width=0.2, height=0.2, style=filled];"
            .to_string(),
    );
    match cluster_of(&initial) {
        Some(cluster) => lines.push(format!("  __start -> {} [lhead={cluster}];", quote(&initial))),
        None => lines.push(format!("  __start -> {};", quote(&initial))),
    }
    lines.push("}".to_string());
    lines.join("\n")
}

fn dot_node<S: StateId, T: TriggerId>(
    info: &MachineInfo<S, T>,
    state: &StateInfo<S, T>,
    depth: usize,
    lines: &mut Vec<String>,
) {
    let indent = "  ".repeat(depth);
    let name = state.name();
    if state.substates.is_empty() {
        lines.push(format!("{indent}{} [label={}];", quote(&name), quote(&name)));
        return;
    }

    lines.push(format!("{indent}subgraph {} {{", quote(&format!("cluster_{name}"))));
    lines.push(format!("{indent}  label={};", quote(&name)));
    // Anchor for edges that start or end on the cluster itself.
    lines.push(format!(
        "{indent}  {} [label=\"\", shape=point, width=0.1, height=0.1, style=invis];",
        quote(&name)
    ));
    if state.initial_transition_target.is_some() {
        lines.push(format!(
            "{indent}  {} [label=\"\", shape=point, width=0.1, height=0.1, style=invis];",
            quote(&format!("cluster_{name}_entry"))
        ));
    }
    for child in state.substates.iter().filter_map(|s| info.state(s)) {
        dot_node(info, child, depth + 1, lines);
    }
    lines.push(format!("{indent}}}"));
}

/// Mermaid identifiers allow neither spaces nor punctuation.
fn mermaid_id(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Render `info` as a Mermaid state diagram.
pub fn mermaid_graph<S: StateId, T: TriggerId>(
    info: &MachineInfo<S, T>,
    direction: Direction,
) -> String {
    let mut lines = vec![
        "stateDiagram-v2".to_string(),
        format!("    direction {}", direction.as_str()),
        format!("    [*] --> {}", mermaid_id(&display_name(&info.initial_state))),
    ];
    for root in info.roots() {
        mermaid_state(info, root, 1, &mut lines);
    }

    for state in &info.states {
        for edge in edges(state) {
            lines.push(format!(
                "    {} --> {} : {}",
                mermaid_id(&edge.from),
                mermaid_id(&edge.to),
                edge.label
            ));
        }
    }
    lines.join("\n")
}

fn mermaid_state<S: StateId, T: TriggerId>(
    info: &MachineInfo<S, T>,
    state: &StateInfo<S, T>,
    depth: usize,
    lines: &mut Vec<String>,
) {
    let indent = "    ".repeat(depth);
    let name = state.name();
    let id = mermaid_id(&name);
    if state.substates.is_empty() {
        if id == name {
            lines.push(format!("{indent}{id}"));
        } else {
            lines.push(format!("{indent}state \"{name}\" as {id}"));
        }
        return;
    }

    lines.push(format!("{indent}state {id} {{"));
    if let Some(target) = &state.initial_transition_target {
        lines.push(format!("{indent}    [*] --> {}", mermaid_id(&display_name(target))));
    }
    for child in state.substates.iter().filter_map(|s| info.state(s)) {
        mermaid_state(info, child, depth + 1, lines);
    }
    lines.push(format!("{indent}}}"));
}
