//! Graph model for a single quest tree.
//!
//! Quests are nodes, links are directed prerequisite edges (parent -> child).
//! A [`QuestGraph`] holds the quests of exactly one tree and the links among
//! them; links whose endpoints are not both in the tree are dropped on load.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Minimum prefix length accepted when resolving an id from user input
pub(crate) const MIN_ID_PREFIX_LEN: usize = 4;

/// Persisted completion state of a quest
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StoredStatus {
    #[default]
    Available,
    Completed,
}

impl StoredStatus {
    /// The status a toggle moves to
    pub fn toggled(self) -> Self {
        match self {
            StoredStatus::Available => StoredStatus::Completed,
            StoredStatus::Completed => StoredStatus::Available,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StoredStatus::Available => "available",
            StoredStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for StoredStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived gating state shown to the user. Never persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VisualStatus {
    Locked,
    Available,
    Completed,
}

impl VisualStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VisualStatus::Locked => "locked",
            VisualStatus::Available => "available",
            VisualStatus::Completed => "completed",
        }
    }
}

impl From<StoredStatus> for VisualStatus {
    fn from(status: StoredStatus) -> Self {
        match status {
            StoredStatus::Available => VisualStatus::Available,
            StoredStatus::Completed => VisualStatus::Completed,
        }
    }
}

impl std::fmt::Display for VisualStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point on the editor canvas
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl std::str::FromStr for Position {
    type Err = Error;

    /// Parse `x,y`
    fn from_str(raw: &str) -> Result<Self> {
        let (x, y) = raw.split_once(',').ok_or_else(|| {
            Error::InvalidArgument(format!("position must be 'x,y', got '{raw}'"))
        })?;
        let parse = |value: &str| {
            value.trim().parse::<f64>().ok().filter(|v| v.is_finite()).ok_or_else(|| {
                Error::InvalidArgument(format!("invalid coordinate '{}'", value.trim()))
            })
        };
        Ok(Position::new(parse(x)?, parse(y)?))
    }
}

/// A goal node in a quest tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quest {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub status: StoredStatus,
    pub position: Position,
    pub tree_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Directed prerequisite edge: `parent_id` must be completed before `child_id`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct QuestLink {
    pub parent_id: String,
    pub child_id: String,
}

impl QuestLink {
    pub fn new(parent_id: impl Into<String>, child_id: impl Into<String>) -> Self {
        Self {
            parent_id: parent_id.into(),
            child_id: child_id.into(),
        }
    }

    pub fn touches(&self, quest_id: &str) -> bool {
        self.parent_id == quest_id || self.child_id == quest_id
    }
}

/// Named, ordered container of quests
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestTree {
    pub id: String,
    pub name: String,
    pub category_id: String,
    pub order_index: i64,
    pub created_at: DateTime<Utc>,
}

/// Named, ordered container of trees
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestCategory {
    pub id: String,
    pub name: String,
    pub order_index: i64,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating a quest
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewQuest {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub status: StoredStatus,
    pub position: Position,
}

/// Partial edit of a quest's descriptive fields.
///
/// `description` and `icon` use a nested option: `Some(None)` clears the field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QuestPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Option<String>>,
}

impl QuestPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.icon.is_none()
    }

    pub fn apply_to(&self, quest: &mut Quest) {
        if let Some(title) = &self.title {
            quest.title = title.clone();
        }
        if let Some(description) = &self.description {
            quest.description = description.clone();
        }
        if let Some(icon) = &self.icon {
            quest.icon = icon.clone();
        }
    }
}

/// In-memory quests and links of one loaded tree
#[derive(Debug, Clone, Default)]
pub struct QuestGraph {
    tree_id: String,
    quests: Vec<Quest>,
    links: Vec<QuestLink>,
}

impl QuestGraph {
    /// Build a graph for `tree_id`, keeping only quests of that tree and links
    /// whose endpoints are both present. Duplicate links and self-loops are
    /// dropped.
    pub fn new(tree_id: impl Into<String>, quests: Vec<Quest>, links: Vec<QuestLink>) -> Self {
        let tree_id = tree_id.into();
        let quests: Vec<Quest> = quests
            .into_iter()
            .filter(|quest| quest.tree_id == tree_id)
            .collect();
        let ids: HashSet<&str> = quests.iter().map(|quest| quest.id.as_str()).collect();

        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(links.len());
        for link in links {
            let in_tree =
                ids.contains(link.parent_id.as_str()) && ids.contains(link.child_id.as_str());
            if !in_tree || link.parent_id == link.child_id {
                tracing::debug!(
                    parent_id = %link.parent_id,
                    child_id = %link.child_id,
                    "dropping link outside tree"
                );
                continue;
            }
            if seen.insert(link.clone()) {
                kept.push(link);
            }
        }

        Self {
            tree_id,
            quests,
            links: kept,
        }
    }

    pub fn tree_id(&self) -> &str {
        &self.tree_id
    }

    pub fn quests(&self) -> &[Quest] {
        &self.quests
    }

    pub fn links(&self) -> &[QuestLink] {
        &self.links
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }

    pub fn quest(&self, id: &str) -> Option<&Quest> {
        self.quests.iter().find(|quest| quest.id == id)
    }

    pub fn quest_mut(&mut self, id: &str) -> Option<&mut Quest> {
        self.quests.iter_mut().find(|quest| quest.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.quest(id).is_some()
    }

    pub fn has_link(&self, parent_id: &str, child_id: &str) -> bool {
        self.links
            .iter()
            .any(|link| link.parent_id == parent_id && link.child_id == child_id)
    }

    /// Direct parents of a quest, in link order
    pub fn parents_of(&self, id: &str) -> Vec<&str> {
        self.links
            .iter()
            .filter(|link| link.child_id == id)
            .map(|link| link.parent_id.as_str())
            .collect()
    }

    /// Direct children of a quest, in link order
    pub fn children_of(&self, id: &str) -> Vec<&str> {
        self.links
            .iter()
            .filter(|link| link.parent_id == id)
            .map(|link| link.child_id.as_str())
            .collect()
    }

    pub fn insert_quest(&mut self, quest: Quest) {
        match self.quest_mut(&quest.id) {
            Some(existing) => *existing = quest,
            None => self.quests.push(quest),
        }
    }

    /// Remove a quest and every incident link. Returns the quest and the
    /// removed links in their previous order.
    pub fn remove_quest(&mut self, id: &str) -> Option<(Quest, Vec<QuestLink>)> {
        let index = self.quests.iter().position(|quest| quest.id == id)?;
        let quest = self.quests.remove(index);
        let (removed, kept): (Vec<_>, Vec<_>) =
            self.links.drain(..).partition(|link| link.touches(id));
        self.links = kept;
        Some((quest, removed))
    }

    /// Append a link without invariant checks; see [`crate::links`]
    pub(crate) fn push_link(&mut self, link: QuestLink) {
        self.links.push(link);
    }

    /// Remove a link if present
    pub fn remove_link(&mut self, parent_id: &str, child_id: &str) -> bool {
        let before = self.links.len();
        self.links
            .retain(|link| !(link.parent_id == parent_id && link.child_id == child_id));
        self.links.len() != before
    }

    /// Set the stored status of every listed quest
    pub fn set_status(&mut self, ids: &[String], status: StoredStatus) {
        let now = Utc::now();
        for quest in self.quests.iter_mut() {
            if ids.iter().any(|id| *id == quest.id) {
                quest.status = status;
                quest.updated_at = now;
            }
        }
    }

    pub fn set_position(&mut self, id: &str, position: Position) -> bool {
        match self.quest_mut(id) {
            Some(quest) => {
                quest.position = position;
                quest.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Resolve user input to a quest id: exact id, or a unique prefix
    pub fn resolve_id(&self, input: &str) -> Result<String> {
        let needle = input.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return Err(Error::InvalidArgument("quest id cannot be empty".to_string()));
        }
        if let Some(quest) = self.quests.iter().find(|quest| quest.id == needle) {
            return Ok(quest.id.clone());
        }
        if needle.len() < MIN_ID_PREFIX_LEN {
            return Err(Error::QuestNotFound(input.to_string()));
        }

        let matches: Vec<&Quest> = self
            .quests
            .iter()
            .filter(|quest| quest.id.starts_with(&needle))
            .collect();
        match matches.as_slice() {
            [] => Err(Error::QuestNotFound(input.to_string())),
            [quest] => Ok(quest.id.clone()),
            _ => Err(Error::InvalidArgument(format!(
                "quest id '{input}' is ambiguous ({} matches)",
                matches.len()
            ))),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    use StoredStatus::*;

    #[test]
    fn load_drops_foreign_links_and_duplicates() {
        let mut foreign = quest("x", Available);
        foreign.tree_id = "other".to_string();
        let graph = QuestGraph::new(
            TREE,
            vec![quest("a", Available), quest("b", Available), foreign],
            vec![
                QuestLink::new("a", "b"),
                QuestLink::new("a", "b"),
                QuestLink::new("a", "x"),
                QuestLink::new("a", "a"),
            ],
        );

        assert_eq!(graph.quests().len(), 2);
        assert_eq!(graph.links(), &[QuestLink::new("a", "b")]);
    }

    #[test]
    fn remove_quest_cascades_links() {
        let mut graph = graph(
            &[("a", Available), ("b", Available), ("c", Available)],
            &[("a", "b"), ("b", "c"), ("a", "c")],
        );

        let (removed, links) = graph.remove_quest("b").expect("quest");
        assert_eq!(removed.id, "b");
        assert_eq!(links, vec![QuestLink::new("a", "b"), QuestLink::new("b", "c")]);
        assert_eq!(graph.links(), &[QuestLink::new("a", "c")]);
        assert!(graph.remove_quest("b").is_none());
    }

    #[test]
    fn resolve_id_accepts_unique_prefix() {
        let graph = graph(&[("abcd1111", Available), ("abcd2222", Available)], &[]);

        assert_eq!(graph.resolve_id("abcd1111").unwrap(), "abcd1111");
        assert_eq!(graph.resolve_id("ABCD2").unwrap(), "abcd2222");
        assert!(matches!(graph.resolve_id("abcd"), Err(Error::InvalidArgument(_))));
        assert!(matches!(graph.resolve_id("ab"), Err(Error::QuestNotFound(_))));
        assert!(matches!(graph.resolve_id("zzzz"), Err(Error::QuestNotFound(_))));
    }

    #[test]
    fn position_parses_pairs() {
        let pos: Position = "12.5, -3".parse().unwrap();
        assert_eq!(pos, Position::new(12.5, -3.0));
        assert!("12".parse::<Position>().is_err());
        assert!("a,b".parse::<Position>().is_err());
    }

    #[test]
    fn patch_clears_nested_options() {
        let mut q = quest("a", Available);
        q.description = Some("old".to_string());
        let patch = QuestPatch {
            title: Some("New".to_string()),
            description: Some(None),
            icon: Some(Some("*".to_string())),
        };
        patch.apply_to(&mut q);
        assert_eq!(q.title, "New");
        assert_eq!(q.description, None);
        assert_eq!(q.icon.as_deref(), Some("*"));
    }
}
