//! Link editing.
//!
//! Keeps the link set free of self-loops, duplicates, cross-tree edges and
//! opposite edges between the same pair of quests. Creating `a -> b` while
//! `b -> a` exists replaces the reverse edge.

use serde::Serialize;

use crate::model::{QuestGraph, QuestLink};

/// Why a link was refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum LinkRejection {
    SelfLoop,
    UnknownQuest { quest_id: String },
    CrossTree { quest_id: String },
}

impl std::fmt::Display for LinkRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkRejection::SelfLoop => write!(f, "a quest cannot depend on itself"),
            LinkRejection::UnknownQuest { quest_id } => {
                write!(f, "quest {quest_id} is not in the loaded tree")
            }
            LinkRejection::CrossTree { quest_id } => {
                write!(f, "quest {quest_id} belongs to another tree")
            }
        }
    }
}

/// Result of [`create_link`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum LinkOutcome {
    /// Link inserted. `evicted` holds the reverse edge removed first, if any.
    Created {
        link: QuestLink,
        #[serde(skip_serializing_if = "Option::is_none")]
        evicted: Option<QuestLink>,
    },
    AlreadyExists { link: QuestLink },
    Rejected { rejection: LinkRejection },
}

impl LinkOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, LinkOutcome::Created { .. })
    }
}

/// Insert `parent_id -> child_id`, evicting the reverse edge if present
pub fn create_link(graph: &mut QuestGraph, parent_id: &str, child_id: &str) -> LinkOutcome {
    if let Some(rejection) = check_link(graph, parent_id, child_id) {
        tracing::warn!(parent_id, child_id, %rejection, "link rejected");
        return LinkOutcome::Rejected { rejection };
    }

    let link = QuestLink::new(parent_id, child_id);
    if graph.has_link(parent_id, child_id) {
        return LinkOutcome::AlreadyExists { link };
    }

    let evicted = graph
        .remove_link(child_id, parent_id)
        .then(|| QuestLink::new(child_id, parent_id));
    graph.push_link(link.clone());
    tracing::info!(parent_id, child_id, reversed = evicted.is_some(), "link created");

    LinkOutcome::Created { link, evicted }
}

/// Remove `parent_id -> child_id`. Absent links are not an error.
pub fn remove_link(graph: &mut QuestGraph, parent_id: &str, child_id: &str) -> bool {
    let removed = graph.remove_link(parent_id, child_id);
    if removed {
        tracing::info!(parent_id, child_id, "link removed");
    }
    removed
}

fn check_link(graph: &QuestGraph, parent_id: &str, child_id: &str) -> Option<LinkRejection> {
    if parent_id == child_id {
        return Some(LinkRejection::SelfLoop);
    }
    for id in [parent_id, child_id] {
        match graph.quest(id) {
            None => {
                return Some(LinkRejection::UnknownQuest {
                    quest_id: id.to_string(),
                })
            }
            Some(quest) if quest.tree_id != graph.tree_id() => {
                return Some(LinkRejection::CrossTree {
                    quest_id: id.to_string(),
                })
            }
            Some(_) => {}
        }
    }
    None
}

/// Two-step link selection: first click picks the parent, second picks the
/// child.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "quest_id", rename_all = "snake_case")]
pub enum LinkSelection {
    #[default]
    Idle,
    ParentSelected(String),
}

/// What a click did to the selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionStep {
    /// Quest designated as the pending parent
    Selected(String),
    /// Same quest clicked twice; selection cleared
    Cancelled,
    /// Pair ready to be linked; selection cleared
    Commit { parent_id: String, child_id: String },
}

impl LinkSelection {
    pub fn source(&self) -> Option<&str> {
        match self {
            LinkSelection::Idle => None,
            LinkSelection::ParentSelected(id) => Some(id),
        }
    }

    pub fn is_source(&self, quest_id: &str) -> bool {
        self.source() == Some(quest_id)
    }

    pub fn clear(&mut self) {
        *self = LinkSelection::Idle;
    }

    pub fn click(&mut self, quest_id: &str) -> SelectionStep {
        match std::mem::take(self) {
            LinkSelection::Idle => {
                *self = LinkSelection::ParentSelected(quest_id.to_string());
                SelectionStep::Selected(quest_id.to_string())
            }
            LinkSelection::ParentSelected(parent_id) if parent_id == quest_id => {
                SelectionStep::Cancelled
            }
            LinkSelection::ParentSelected(parent_id) => SelectionStep::Commit {
                parent_id,
                child_id: quest_id.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::*;
    use crate::model::StoredStatus::*;

    fn pairs(graph: &QuestGraph) -> Vec<(String, String)> {
        graph
            .links()
            .iter()
            .map(|l| (l.parent_id.clone(), l.child_id.clone()))
            .collect()
    }

    #[test]
    fn reverse_edge_is_evicted() {
        let mut graph = graph(&[("a", Available), ("b", Available)], &[]);

        assert!(create_link(&mut graph, "a", "b").is_created());
        let outcome = create_link(&mut graph, "b", "a");
        assert_eq!(
            outcome,
            LinkOutcome::Created {
                link: QuestLink::new("b", "a"),
                evicted: Some(QuestLink::new("a", "b")),
            }
        );
        assert!(graph.has_link("b", "a"));
        assert!(!graph.has_link("a", "b"));
    }

    #[test]
    fn create_is_idempotent() {
        let mut graph = graph(&[("a", Available), ("b", Available)], &[]);
        create_link(&mut graph, "a", "b");
        let before = pairs(&graph);

        let outcome = create_link(&mut graph, "a", "b");
        assert!(matches!(outcome, LinkOutcome::AlreadyExists { .. }));
        assert_eq!(pairs(&graph), before);
    }

    #[test]
    fn self_loop_and_unknown_rejected() {
        let mut graph = graph(&[("a", Available)], &[]);

        assert_eq!(
            create_link(&mut graph, "a", "a"),
            LinkOutcome::Rejected {
                rejection: LinkRejection::SelfLoop
            }
        );
        assert!(matches!(
            create_link(&mut graph, "a", "nope"),
            LinkOutcome::Rejected {
                rejection: LinkRejection::UnknownQuest { .. }
            }
        ));
        assert!(graph.links().is_empty());
    }

    #[test]
    fn cross_tree_rejected() {
        let mut graph = graph(&[("a", Available), ("b", Available)], &[]);
        graph.quest_mut("b").expect("b").tree_id = "other".to_string();

        assert!(matches!(
            create_link(&mut graph, "a", "b"),
            LinkOutcome::Rejected {
                rejection: LinkRejection::CrossTree { .. }
            }
        ));
    }

    #[test]
    fn remove_absent_link_is_noop() {
        let mut graph = graph(&[("a", Available), ("b", Available)], &[("a", "b")]);
        assert!(!remove_link(&mut graph, "b", "a"));
        assert_eq!(graph.links().len(), 1);
        assert!(remove_link(&mut graph, "a", "b"));
        assert!(!remove_link(&mut graph, "a", "b"));
    }

    #[test]
    fn selection_state_machine() {
        let mut selection = LinkSelection::default();
        assert_eq!(selection.click("a"), SelectionStep::Selected("a".to_string()));
        assert!(selection.is_source("a"));

        assert_eq!(selection.click("a"), SelectionStep::Cancelled);
        assert_eq!(selection, LinkSelection::Idle);

        selection.click("a");
        assert_eq!(
            selection.click("b"),
            SelectionStep::Commit {
                parent_id: "a".to_string(),
                child_id: "b".to_string(),
            }
        );
        assert_eq!(selection.source(), None);
    }
}
