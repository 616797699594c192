//! Visual status derivation.
//!
//! A quest with at least one parent is `locked` until every parent is stored
//! as completed; otherwise its visual status is its stored status. The result
//! is a pure projection of the graph and is recomputed on every read.

use std::collections::HashMap;

use crate::model::{Quest, QuestGraph, QuestLink, StoredStatus, VisualStatus};

/// Compute the visual status of one quest from the full quest and link sets
pub fn resolve_status(quest: &Quest, quests: &[Quest], links: &[QuestLink]) -> VisualStatus {
    if parents_completed(&quest.id, quests, links) {
        quest.status.into()
    } else {
        VisualStatus::Locked
    }
}

/// True when every direct parent of `quest_id` is stored as completed.
/// Quests without parents trivially satisfy this. A parent id that does not
/// resolve to a loaded quest counts as not completed.
pub fn parents_completed(quest_id: &str, quests: &[Quest], links: &[QuestLink]) -> bool {
    incomplete_parents(quest_id, quests, links).is_empty()
}

/// Direct parents of `quest_id` that are not stored as completed, in link order
pub fn incomplete_parents(quest_id: &str, quests: &[Quest], links: &[QuestLink]) -> Vec<String> {
    links
        .iter()
        .filter(|link| link.child_id == quest_id)
        .filter(|link| {
            quests
                .iter()
                .find(|quest| quest.id == link.parent_id)
                .map(|parent| parent.status != StoredStatus::Completed)
                .unwrap_or(true)
        })
        .map(|link| link.parent_id.clone())
        .collect()
}

/// Visual status of every quest in the graph
pub fn resolve_all(graph: &QuestGraph) -> HashMap<String, VisualStatus> {
    let statuses: HashMap<String, VisualStatus> = graph
        .quests()
        .iter()
        .map(|quest| {
            (
                quest.id.clone(),
                resolve_status(quest, graph.quests(), graph.links()),
            )
        })
        .collect();
    tracing::debug!(
        tree_id = graph.tree_id(),
        quests = statuses.len(),
        locked = statuses.values().filter(|s| **s == VisualStatus::Locked).count(),
        "resolved visual statuses"
    );
    statuses
}
