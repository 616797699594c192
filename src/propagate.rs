//! Completion toggling with cascading un-completion.
//!
//! Completing a quest requires every direct parent to be completed and only
//! touches that quest. Un-completing a quest resets it and every transitive
//! descendant to `available`, so no completed quest is left behind an
//! incomplete parent.

use std::collections::HashSet;

use serde::Serialize;

use crate::model::{QuestGraph, StoredStatus};
use crate::status::incomplete_parents;

/// Result of a toggle request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToggleOutcome {
    pub quest_id: String,
    pub new_status: StoredStatus,
    /// Quests whose stored status changes, starting with the toggled quest.
    /// Empty when the toggle was rejected.
    pub updated_ids: Vec<String>,
    /// Incomplete parents that blocked a completion
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocked_by: Vec<String>,
}

impl ToggleOutcome {
    pub fn is_applied(&self) -> bool {
        !self.updated_ids.is_empty()
    }
}

/// Every quest reachable from `quest_id` along parent -> child links, in
/// depth-first discovery order. The start quest is never included, even
/// when a cycle leads back to it. Each quest is expanded at most once.
pub fn descendants(graph: &QuestGraph, quest_id: &str) -> Vec<String> {
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(quest_id);

    let mut order = Vec::new();
    let mut stack: Vec<&str> = graph.children_of(quest_id).into_iter().rev().collect();
    while let Some(current) = stack.pop() {
        if !visited.insert(current) {
            continue;
        }
        order.push(current.to_string());
        stack.extend(graph.children_of(current).into_iter().rev());
    }
    order
}

/// Work out what toggling `quest_id` would change, without mutating.
/// Returns `None` when the quest is not in the graph.
pub fn plan_toggle(graph: &QuestGraph, quest_id: &str) -> Option<ToggleOutcome> {
    let quest = graph.quest(quest_id)?;
    let new_status = quest.status.toggled();

    let mut outcome = ToggleOutcome {
        quest_id: quest.id.clone(),
        new_status,
        updated_ids: Vec::new(),
        blocked_by: Vec::new(),
    };

    match new_status {
        StoredStatus::Completed => {
            let blocked_by = incomplete_parents(&quest.id, graph.quests(), graph.links());
            if blocked_by.is_empty() {
                outcome.updated_ids.push(quest.id.clone());
            } else {
                outcome.blocked_by = blocked_by;
            }
        }
        StoredStatus::Available => {
            outcome.updated_ids.push(quest.id.clone());
            outcome.updated_ids.extend(descendants(graph, &quest.id));
        }
    }

    Some(outcome)
}

/// Toggle a quest's stored status in place. Rejected completions leave the
/// graph untouched.
pub fn toggle_status(graph: &mut QuestGraph, quest_id: &str) -> Option<ToggleOutcome> {
    let outcome = plan_toggle(graph, quest_id)?;
    if outcome.is_applied() {
        graph.set_status(&outcome.updated_ids, outcome.new_status);
        tracing::info!(
            quest_id = %outcome.quest_id,
            status = %outcome.new_status,
            affected = outcome.updated_ids.len(),
            "toggled quest status"
        );
    } else {
        tracing::warn!(
            quest_id = %outcome.quest_id,
            blocked_by = ?outcome.blocked_by,
            "completion rejected: parents incomplete"
        );
    }
    Some(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::*;
    use crate::status::resolve_all;
    use crate::model::VisualStatus;
    use StoredStatus::*;

    fn status_of(graph: &QuestGraph, id: &str) -> StoredStatus {
        graph.quest(id).expect("quest").status
    }

    #[test]
    fn completion_rejected_with_incomplete_parent() {
        let mut graph = graph(&[("p", Available), ("c", Available)], &[("p", "c")]);

        let outcome = toggle_status(&mut graph, "c").expect("quest");
        assert!(!outcome.is_applied());
        assert_eq!(outcome.blocked_by, vec!["p".to_string()]);
        assert_eq!(status_of(&graph, "c"), Available);
    }

    #[test]
    fn completion_only_touches_target() {
        let mut graph = graph(
            &[("p", Completed), ("c", Available), ("d", Available)],
            &[("p", "c"), ("c", "d")],
        );

        let outcome = toggle_status(&mut graph, "c").expect("quest");
        assert_eq!(outcome.updated_ids, vec!["c".to_string()]);
        assert_eq!(outcome.new_status, Completed);
        assert_eq!(status_of(&graph, "d"), Available);
    }

    #[test]
    fn scenario_parent_child_chain() {
        let mut graph = graph(&[("p", Available), ("c", Available)], &[("p", "c")]);
        let visual = resolve_all(&graph);
        assert_eq!(visual["p"], VisualStatus::Available);
        assert_eq!(visual["c"], VisualStatus::Locked);

        toggle_status(&mut graph, "p").expect("p");
        assert_eq!(resolve_all(&graph)["c"], VisualStatus::Available);

        toggle_status(&mut graph, "c").expect("c");
        assert_eq!(resolve_all(&graph)["c"], VisualStatus::Completed);

        let outcome = toggle_status(&mut graph, "p").expect("p");
        assert_eq!(outcome.updated_ids, vec!["p".to_string(), "c".to_string()]);
        assert_eq!(status_of(&graph, "p"), Available);
        assert_eq!(status_of(&graph, "c"), Available);
    }

    #[test]
    fn diamond_cascade_visits_each_once() {
        let mut graph = graph(
            &[("p", Completed), ("c1", Completed), ("c2", Completed), ("d", Completed)],
            &[("p", "c1"), ("p", "c2"), ("c1", "d"), ("c2", "d")],
        );

        let outcome = toggle_status(&mut graph, "p").expect("quest");
        let mut ids = outcome.updated_ids.clone();
        ids.sort();
        assert_eq!(ids, vec!["c1", "c2", "d", "p"]);
        assert_eq!(outcome.updated_ids.len(), 4);
        assert!(graph.quests().iter().all(|q| q.status == Available));
    }

    #[test]
    fn cascade_leaves_unreachable_quests_alone() {
        let mut graph = graph(
            &[("a", Completed), ("b", Completed), ("x", Completed), ("y", Completed)],
            &[("a", "b"), ("x", "y"), ("x", "b")],
        );

        toggle_status(&mut graph, "a").expect("quest");
        assert_eq!(status_of(&graph, "a"), Available);
        assert_eq!(status_of(&graph, "b"), Available);
        assert_eq!(status_of(&graph, "x"), Completed);
        assert_eq!(status_of(&graph, "y"), Completed);
    }

    #[test]
    fn descendants_terminate_on_cycles() {
        let graph = graph(
            &[("a", Completed), ("b", Completed), ("c", Completed)],
            &[("a", "b"), ("b", "c"), ("c", "a"), ("c", "b")],
        );

        assert_eq!(descendants(&graph, "a"), vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn unknown_quest_yields_none() {
        let mut graph = graph(&[("a", Available)], &[]);
        assert!(toggle_status(&mut graph, "missing").is_none());
    }
}
