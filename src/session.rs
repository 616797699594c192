//! Editor session over one loaded quest tree.
//!
//! The session owns the in-memory graph and the interaction state (linking
//! mode, pending link parent, open quest, pending deletion). Every change is
//! applied to the graph first and then submitted to the session's
//! [`MutationSink`]; the session never waits on or rolls back a write.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::gateway::{Mutation, MutationSink, QuestStore};
use crate::layout::{resolve_overlaps, LayoutParams, NodePosition, OverlapResolution};
use crate::links::{self, LinkOutcome, LinkRejection, LinkSelection, SelectionStep};
use crate::model::{
    NewQuest, Position, Quest, QuestGraph, QuestLink, QuestPatch, StoredStatus, VisualStatus,
};
use crate::propagate::{self, ToggleOutcome};
use crate::status;

/// Destructive action awaiting confirmation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PendingDeletion {
    Quest { quest_id: String },
    Link { parent_id: String, child_id: String },
}

/// Result of clicking a quest node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClickOutcome {
    /// Normal mode: the quest's detail view opened
    Opened { quest_id: String },
    /// Linking mode: quest chosen as parent
    ParentSelected { quest_id: String },
    /// Linking mode: parent clicked again
    SelectionCancelled,
    /// Linking mode: second quest clicked
    Linked { outcome: LinkOutcome },
}

/// Edge appearance derived from endpoint completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeState {
    /// Parent not completed yet
    Pending,
    /// Parent completed, child not
    Active,
    /// Both completed
    Done,
}

impl EdgeState {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeState::Pending => "pending",
            EdgeState::Active => "active",
            EdgeState::Done => "done",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub status: VisualStatus,
    pub position: Position,
    pub is_source: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeView {
    pub parent_id: String,
    pub child_id: String,
    pub state: EdgeState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphView {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
}

/// Defaults applied by [`EditorSession::add_quest`]
#[derive(Debug, Clone)]
pub struct QuestDefaults {
    pub title: String,
    pub position: Position,
}

impl Default for QuestDefaults {
    fn default() -> Self {
        Self {
            title: "New Quest".to_string(),
            position: Position::default(),
        }
    }
}

pub struct EditorSession<S: MutationSink> {
    store: Arc<dyn QuestStore>,
    sink: S,
    graph: QuestGraph,
    layout: LayoutParams,
    defaults: QuestDefaults,
    linking_mode: bool,
    selection: LinkSelection,
    pending: Option<PendingDeletion>,
    detail: Option<String>,
}

impl<S: MutationSink> EditorSession<S> {
    /// Load `tree_id` from `store`
    pub fn open(store: Arc<dyn QuestStore>, tree_id: &str, sink: S) -> Result<Self> {
        let snapshot = store.load_tree(tree_id)?;
        let graph = QuestGraph::new(tree_id, snapshot.quests, snapshot.links);
        tracing::debug!(
            tree_id,
            quests = graph.quests().len(),
            links = graph.links().len(),
            "opened tree"
        );
        Ok(Self {
            store,
            sink,
            graph,
            layout: LayoutParams::default(),
            defaults: QuestDefaults::default(),
            linking_mode: false,
            selection: LinkSelection::Idle,
            pending: None,
            detail: None,
        })
    }

    /// Apply layout and quest defaults from configuration
    pub fn with_config(mut self, config: &Config) -> Self {
        self.layout = config.layout.params();
        self.defaults = QuestDefaults {
            title: config.quests.default_title.clone(),
            position: config.quests.default_position(),
        };
        self
    }

    pub fn graph(&self) -> &QuestGraph {
        &self.graph
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Finish the session, handing back the sink (e.g. to drain it)
    pub fn into_sink(self) -> S {
        self.sink
    }

    fn require(&self, quest_id: &str) -> Result<&Quest> {
        self.graph
            .quest(quest_id)
            .ok_or_else(|| Error::QuestNotFound(quest_id.to_string()))
    }

    // =========================================================================
    // Derived state
    // =========================================================================

    pub fn visual_status(&self, quest_id: &str) -> Option<VisualStatus> {
        let quest = self.graph.quest(quest_id)?;
        Some(status::resolve_status(quest, self.graph.quests(), self.graph.links()))
    }

    /// Whether the "complete" affordance is enabled for a quest
    pub fn can_complete(&self, quest_id: &str) -> bool {
        self.graph.contains(quest_id)
            && status::parents_completed(quest_id, self.graph.quests(), self.graph.links())
    }

    /// Nodes and edges as the canvas would draw them
    pub fn views(&self) -> GraphView {
        let statuses = status::resolve_all(&self.graph);
        let stored: HashMap<&str, StoredStatus> = self
            .graph
            .quests()
            .iter()
            .map(|quest| (quest.id.as_str(), quest.status))
            .collect();

        let nodes = self
            .graph
            .quests()
            .iter()
            .map(|quest| NodeView {
                id: quest.id.clone(),
                title: quest.title.clone(),
                icon: quest.icon.clone(),
                status: statuses
                    .get(&quest.id)
                    .copied()
                    .unwrap_or(VisualStatus::Available),
                position: quest.position,
                is_source: self.selection.is_source(&quest.id),
            })
            .collect();

        let completed = |id: &str| stored.get(id) == Some(&StoredStatus::Completed);
        let edges = self
            .graph
            .links()
            .iter()
            .map(|link| EdgeView {
                parent_id: link.parent_id.clone(),
                child_id: link.child_id.clone(),
                state: match (completed(&link.parent_id), completed(&link.child_id)) {
                    (false, _) => EdgeState::Pending,
                    (true, false) => EdgeState::Active,
                    (true, true) => EdgeState::Done,
                },
            })
            .collect();

        GraphView { nodes, edges }
    }

    // =========================================================================
    // Detail view
    // =========================================================================

    /// The quest whose detail view is open. Always read from the graph, so it
    /// reflects every applied change.
    pub fn detail(&self) -> Option<&Quest> {
        self.detail.as_deref().and_then(|id| self.graph.quest(id))
    }

    pub fn open_detail(&mut self, quest_id: &str) -> Result<()> {
        self.require(quest_id)?;
        self.detail = Some(quest_id.to_string());
        Ok(())
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    // =========================================================================
    // Quest edits
    // =========================================================================

    /// Create a quest with the configured defaults for missing fields
    pub fn add_quest(
        &mut self,
        title: Option<String>,
        position: Option<Position>,
    ) -> Result<Quest> {
        let fields = NewQuest {
            title: title.unwrap_or_else(|| self.defaults.title.clone()),
            description: None,
            icon: None,
            status: StoredStatus::Available,
            position: position.unwrap_or(self.defaults.position),
        };
        // Creation waits for the store: the id comes from there.
        let quest = self.store.create_quest(self.graph.tree_id(), fields)?;
        tracing::info!(quest_id = %quest.id, tree_id = %quest.tree_id, "quest created");
        self.graph.insert_quest(quest.clone());
        Ok(quest)
    }

    pub fn update_quest(&mut self, quest_id: &str, patch: QuestPatch) -> Result<()> {
        let quest = self
            .graph
            .quest_mut(quest_id)
            .ok_or_else(|| Error::QuestNotFound(quest_id.to_string()))?;
        if patch.is_empty() {
            return Ok(());
        }
        patch.apply_to(quest);
        quest.updated_at = chrono::Utc::now();
        self.sink.submit(Mutation::UpdateQuest {
            id: quest_id.to_string(),
            patch,
        });
        Ok(())
    }

    /// Toggle completion. Rejected completions return an outcome with no
    /// updated ids and submit nothing.
    pub fn toggle_status(&mut self, quest_id: &str) -> Result<ToggleOutcome> {
        let outcome = propagate::toggle_status(&mut self.graph, quest_id)
            .ok_or_else(|| Error::QuestNotFound(quest_id.to_string()))?;
        if outcome.is_applied() {
            self.sink.submit(Mutation::UpdateQuestsStatus {
                ids: outcome.updated_ids.clone(),
                status: outcome.new_status,
            });
        }
        Ok(outcome)
    }

    // =========================================================================
    // Linking
    // =========================================================================

    pub fn linking_mode(&self) -> bool {
        self.linking_mode
    }

    pub fn selection(&self) -> &LinkSelection {
        &self.selection
    }

    /// Toggling linking mode abandons any pending parent selection
    pub fn set_linking_mode(&mut self, enabled: bool) {
        self.linking_mode = enabled;
        self.selection.clear();
    }

    /// Route a node click: two-step linking in linking mode, otherwise open
    /// the detail view
    pub fn click_quest(&mut self, quest_id: &str) -> Result<ClickOutcome> {
        self.require(quest_id)?;

        if !self.linking_mode {
            self.detail = Some(quest_id.to_string());
            return Ok(ClickOutcome::Opened {
                quest_id: quest_id.to_string(),
            });
        }

        Ok(match self.selection.click(quest_id) {
            SelectionStep::Selected(quest_id) => ClickOutcome::ParentSelected { quest_id },
            SelectionStep::Cancelled => ClickOutcome::SelectionCancelled,
            SelectionStep::Commit {
                parent_id,
                child_id,
            } => ClickOutcome::Linked {
                outcome: self.create_link(&parent_id, &child_id),
            },
        })
    }

    /// Drag-connect gesture between two node handles
    pub fn connect(&mut self, source_id: &str, target_id: &str) -> LinkOutcome {
        self.create_link(source_id, target_id)
    }

    /// Create a link. When the reverse edge is evicted its deletion is
    /// submitted before the insert.
    pub fn create_link(&mut self, parent_id: &str, child_id: &str) -> LinkOutcome {
        if let Some(quest_id) = self.foreign_endpoint(parent_id, child_id) {
            let rejection = LinkRejection::CrossTree { quest_id };
            tracing::warn!(parent_id, child_id, %rejection, "link rejected");
            return LinkOutcome::Rejected { rejection };
        }
        let outcome = links::create_link(&mut self.graph, parent_id, child_id);
        if let LinkOutcome::Created { link, evicted } = &outcome {
            if let Some(reverse) = evicted {
                self.sink.submit(Mutation::DeleteLink {
                    parent_id: reverse.parent_id.clone(),
                    child_id: reverse.child_id.clone(),
                });
            }
            self.sink.submit(Mutation::CreateLink {
                parent_id: link.parent_id.clone(),
                child_id: link.child_id.clone(),
            });
        }
        outcome
    }

    /// First endpoint that is not loaded but exists in another tree
    fn foreign_endpoint(&self, parent_id: &str, child_id: &str) -> Option<String> {
        if parent_id == child_id {
            return None;
        }
        [parent_id, child_id]
            .into_iter()
            .filter(|id| !self.graph.contains(id))
            .find_map(|id| match self.store.get_quest(id) {
                Ok(Some(quest)) if quest.tree_id != self.graph.tree_id() => Some(quest.id),
                Ok(_) => None,
                Err(err) => {
                    tracing::warn!(quest_id = id, error = %err, "quest lookup failed");
                    None
                }
            })
    }

    /// Resolve user input to a quest id: a quest of the loaded tree by id or
    /// unique prefix, else any stored quest by exact id
    pub fn resolve_quest(&self, input: &str) -> Result<String> {
        match self.graph.resolve_id(input) {
            Err(Error::QuestNotFound(missing)) => match self.store.get_quest(input.trim())? {
                Some(quest) => Ok(quest.id),
                None => Err(Error::QuestNotFound(missing)),
            },
            resolved => resolved,
        }
    }

    /// Remove a link without confirmation. Absent links are a no-op.
    pub fn remove_link(&mut self, parent_id: &str, child_id: &str) -> bool {
        let removed = links::remove_link(&mut self.graph, parent_id, child_id);
        if removed {
            self.sink.submit(Mutation::DeleteLink {
                parent_id: parent_id.to_string(),
                child_id: child_id.to_string(),
            });
        }
        removed
    }

    // =========================================================================
    // Confirmed deletions
    // =========================================================================

    pub fn pending_deletion(&self) -> Option<&PendingDeletion> {
        self.pending.as_ref()
    }

    pub fn request_delete_quest(&mut self, quest_id: &str) -> Result<()> {
        self.require(quest_id)?;
        self.pending = Some(PendingDeletion::Quest {
            quest_id: quest_id.to_string(),
        });
        Ok(())
    }

    /// Ask to delete a rendered edge
    pub fn request_delete_link(&mut self, parent_id: &str, child_id: &str) {
        self.pending = Some(PendingDeletion::Link {
            parent_id: parent_id.to_string(),
            child_id: child_id.to_string(),
        });
    }

    pub fn cancel_deletion(&mut self) -> Option<PendingDeletion> {
        self.pending.take()
    }

    /// Carry out the pending deletion, if any
    pub fn confirm_deletion(&mut self) -> Option<PendingDeletion> {
        let pending = self.pending.take()?;
        match &pending {
            PendingDeletion::Quest { quest_id } => {
                self.delete_quest(quest_id);
            }
            PendingDeletion::Link {
                parent_id,
                child_id,
            } => {
                self.remove_link(parent_id, child_id);
            }
        }
        Some(pending)
    }

    /// Delete a quest and its incident links; returns the removed links
    fn delete_quest(&mut self, quest_id: &str) -> Vec<QuestLink> {
        let Some((quest, removed_links)) = self.graph.remove_quest(quest_id) else {
            return Vec::new();
        };
        if self.detail.as_deref() == Some(quest_id) {
            self.detail = None;
        }
        if self.selection.is_source(quest_id) {
            self.selection.clear();
        }

        for link in &removed_links {
            self.sink.submit(Mutation::DeleteLink {
                parent_id: link.parent_id.clone(),
                child_id: link.child_id.clone(),
            });
        }
        self.sink.submit(Mutation::DeleteQuest {
            id: quest.id.clone(),
        });
        tracing::info!(quest_id, links = removed_links.len(), "quest deleted");
        removed_links
    }

    // =========================================================================
    // Dragging
    // =========================================================================

    /// Record where a dragged quest was dropped, then push overlapping
    /// neighbours away. The dropped quest and every moved quest are persisted.
    pub fn end_drag(&mut self, quest_id: &str, position: Position) -> Result<OverlapResolution> {
        self.require(quest_id)?;
        self.graph.set_position(quest_id, position);

        let nodes: Vec<NodePosition> = self
            .graph
            .quests()
            .iter()
            .map(|quest| NodePosition::new(quest.id.clone(), quest.position))
            .collect();
        let resolution = resolve_overlaps(&nodes, Some(quest_id), &self.layout);

        self.sink.submit(Mutation::UpdateQuestPosition {
            id: quest_id.to_string(),
            position,
        });
        for id in &resolution.moved {
            if let Some(new_position) = resolution.position_of(id) {
                self.graph.set_position(id, new_position);
                self.sink.submit(Mutation::UpdateQuestPosition {
                    id: id.clone(),
                    position: new_position,
                });
            }
        }
        Ok(resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryStore;
    use crate::gateway::recording::RecordingSink;

    struct Fixture {
        session: EditorSession<RecordingSink>,
    }

    impl Fixture {
        fn new(titles: &[&str]) -> (Self, Vec<String>) {
            let store = Arc::new(MemoryStore::default());
            let category = store.create_category("Main").unwrap();
            let tree = store.create_tree(&category.id, "Tree").unwrap();
            let ids = titles
                .iter()
                .enumerate()
                .map(|(i, title)| {
                    store
                        .create_quest(
                            &tree.id,
                            NewQuest {
                                title: title.to_string(),
                                position: Position::new(i as f64 * 500.0, 0.0),
                                ..NewQuest::default()
                            },
                        )
                        .unwrap()
                        .id
                })
                .collect();
            let session = EditorSession::open(store, &tree.id, RecordingSink::default()).unwrap();
            (Self { session }, ids)
        }

        fn take(&self) -> Vec<Mutation> {
            self.session.sink().take()
        }
    }

    #[test]
    fn add_quest_uses_defaults() {
        let (mut fx, _) = Fixture::new(&[]);
        let quest = fx.session.add_quest(None, None).unwrap();
        assert_eq!(quest.title, "New Quest");
        assert_eq!(quest.status, StoredStatus::Available);
        assert_eq!(quest.position, Position::default());
        assert!(fx.session.graph().contains(&quest.id));
    }

    #[test]
    fn two_click_linking() {
        let (mut fx, ids) = Fixture::new(&["a", "b"]);
        fx.session.set_linking_mode(true);

        let first = fx.session.click_quest(&ids[0]).unwrap();
        assert_eq!(
            first,
            ClickOutcome::ParentSelected {
                quest_id: ids[0].clone(),
            }
        );
        assert!(fx.session.views().nodes[0].is_source);

        let second = fx.session.click_quest(&ids[1]).unwrap();
        assert!(matches!(second, ClickOutcome::Linked { outcome } if outcome.is_created()));
        assert_eq!(fx.session.selection(), &LinkSelection::Idle);
        assert!(fx.session.graph().has_link(&ids[0], &ids[1]));
        assert_eq!(
            fx.take(),
            vec![Mutation::CreateLink {
                parent_id: ids[0].clone(),
                child_id: ids[1].clone(),
            }]
        );
    }

    #[test]
    fn reclick_cancels_and_mode_toggle_clears() {
        let (mut fx, ids) = Fixture::new(&["a", "b"]);
        fx.session.set_linking_mode(true);
        fx.session.click_quest(&ids[0]).unwrap();
        assert_eq!(fx.session.click_quest(&ids[0]).unwrap(), ClickOutcome::SelectionCancelled);

        fx.session.click_quest(&ids[0]).unwrap();
        fx.session.set_linking_mode(false);
        assert_eq!(fx.session.selection(), &LinkSelection::Idle);
        assert_eq!(
            fx.session.click_quest(&ids[1]).unwrap(),
            ClickOutcome::Opened {
                quest_id: ids[1].clone(),
            }
        );
        assert_eq!(fx.session.detail().map(|q| q.id.clone()), Some(ids[1].clone()));
        assert!(fx.take().is_empty());
    }

    #[test]
    fn connect_evicts_reverse_before_insert() {
        let (mut fx, ids) = Fixture::new(&["a", "b"]);
        fx.session.connect(&ids[0], &ids[1]);
        fx.take();

        fx.session.connect(&ids[1], &ids[0]);
        assert_eq!(
            fx.take(),
            vec![
                Mutation::DeleteLink {
                    parent_id: ids[0].clone(),
                    child_id: ids[1].clone(),
                },
                Mutation::CreateLink {
                    parent_id: ids[1].clone(),
                    child_id: ids[0].clone(),
                },
            ]
        );
        assert_eq!(
            fx.session.graph().links(),
            &[QuestLink::new(ids[1].clone(), ids[0].clone())]
        );
    }

    #[test]
    fn link_to_another_tree_is_rejected() {
        let (mut fx, ids) = Fixture::new(&["a"]);
        let store = fx.session.store.clone();
        let category = store.create_category("Side").unwrap();
        let other = store.create_tree(&category.id, "Other").unwrap();
        let fields = NewQuest {
            title: "elsewhere".to_string(),
            ..NewQuest::default()
        };
        let foreign = store.create_quest(&other.id, fields).unwrap();

        assert_eq!(fx.session.resolve_quest(&foreign.id).unwrap(), foreign.id);
        assert!(matches!(
            fx.session.resolve_quest("ffffffff-0000"),
            Err(Error::QuestNotFound(_))
        ));

        let outcome = fx.session.connect(&ids[0], &foreign.id);
        assert_eq!(
            outcome,
            LinkOutcome::Rejected {
                rejection: LinkRejection::CrossTree {
                    quest_id: foreign.id.clone(),
                },
            }
        );
        assert!(fx.session.graph().links().is_empty());
        assert!(fx.take().is_empty());
    }

    #[test]
    fn toggle_submits_batch_and_refreshes_detail() {
        let (mut fx, ids) = Fixture::new(&["p", "c"]);
        fx.session.connect(&ids[0], &ids[1]);
        fx.session.toggle_status(&ids[0]).unwrap();
        fx.session.toggle_status(&ids[1]).unwrap();
        fx.session.open_detail(&ids[1]).unwrap();
        fx.take();

        let outcome = fx.session.toggle_status(&ids[0]).unwrap();
        assert_eq!(outcome.updated_ids, vec![ids[0].clone(), ids[1].clone()]);
        assert_eq!(fx.session.detail().unwrap().status, StoredStatus::Available);
        assert_eq!(
            fx.take(),
            vec![Mutation::UpdateQuestsStatus {
                ids: vec![ids[0].clone(), ids[1].clone()],
                status: StoredStatus::Available,
            }]
        );
    }

    #[test]
    fn rejected_completion_submits_nothing() {
        let (mut fx, ids) = Fixture::new(&["p", "c"]);
        fx.session.connect(&ids[0], &ids[1]);
        fx.take();

        assert!(!fx.session.can_complete(&ids[1]));
        let outcome = fx.session.toggle_status(&ids[1]).unwrap();
        assert!(!outcome.is_applied());
        assert!(fx.take().is_empty());
        assert_eq!(fx.session.visual_status(&ids[1]), Some(VisualStatus::Locked));
    }

    #[test]
    fn quest_deletion_needs_confirmation() {
        let (mut fx, ids) = Fixture::new(&["a", "b", "c"]);
        fx.session.connect(&ids[0], &ids[1]);
        fx.session.connect(&ids[1], &ids[2]);
        fx.session.open_detail(&ids[1]).unwrap();
        fx.take();

        fx.session.request_delete_quest(&ids[1]).unwrap();
        assert!(fx.session.graph().contains(&ids[1]));
        assert!(fx.session.cancel_deletion().is_some());
        assert!(fx.session.confirm_deletion().is_none());

        fx.session.request_delete_quest(&ids[1]).unwrap();
        fx.session.confirm_deletion().expect("pending");
        assert!(!fx.session.graph().contains(&ids[1]));
        assert!(fx.session.graph().links().is_empty());
        assert!(fx.session.detail().is_none());
        assert_eq!(
            fx.take(),
            vec![
                Mutation::DeleteLink {
                    parent_id: ids[0].clone(),
                    child_id: ids[1].clone(),
                },
                Mutation::DeleteLink {
                    parent_id: ids[1].clone(),
                    child_id: ids[2].clone(),
                },
                Mutation::DeleteQuest { id: ids[1].clone() },
            ]
        );
    }

    #[test]
    fn link_deletion_needs_confirmation() {
        let (mut fx, ids) = Fixture::new(&["a", "b"]);
        fx.session.connect(&ids[0], &ids[1]);
        fx.take();

        fx.session.request_delete_link(&ids[0], &ids[1]);
        assert!(fx.session.graph().has_link(&ids[0], &ids[1]));
        fx.session.confirm_deletion();
        assert!(!fx.session.graph().has_link(&ids[0], &ids[1]));

        fx.session.request_delete_link(&ids[0], &ids[1]);
        fx.session.confirm_deletion();
        assert_eq!(
            fx.take(),
            vec![Mutation::DeleteLink {
                parent_id: ids[0].clone(),
                child_id: ids[1].clone(),
            }]
        );
    }

    #[test]
    fn end_drag_pushes_neighbours_and_persists_them() {
        let (mut fx, ids) = Fixture::new(&["a", "b", "c"]);

        let resolution = fx.session.end_drag(&ids[0], Position::new(460.0, 0.0)).unwrap();
        assert_eq!(resolution.moved, vec![ids[1].clone()]);

        let a = fx.session.graph().quest(&ids[0]).unwrap().position;
        let b = fx.session.graph().quest(&ids[1]).unwrap().position;
        assert_eq!(a, Position::new(460.0, 0.0));
        assert!((b.x - 580.0).abs() < 1e-9);

        let mutations = fx.take();
        assert_eq!(mutations.len(), 2);
        assert_eq!(
            mutations[0],
            Mutation::UpdateQuestPosition {
                id: ids[0].clone(),
                position: Position::new(460.0, 0.0),
            }
        );
        assert!(matches!(&mutations[1], Mutation::UpdateQuestPosition { id, .. } if *id == ids[1]));
    }

    #[test]
    fn edge_states_follow_completion() {
        let (mut fx, ids) = Fixture::new(&["a", "b", "c"]);
        fx.session.connect(&ids[0], &ids[1]);
        fx.session.connect(&ids[1], &ids[2]);
        fx.session.toggle_status(&ids[0]).unwrap();
        fx.session.toggle_status(&ids[1]).unwrap();

        let view = fx.session.views();
        let states: Vec<EdgeState> = view.edges.iter().map(|e| e.state).collect();
        assert_eq!(states, vec![EdgeState::Done, EdgeState::Active]);
        assert_eq!(view.nodes[2].status, VisualStatus::Available);
    }

    #[test]
    fn unknown_quest_is_user_error() {
        let (mut fx, _) = Fixture::new(&["a"]);
        assert!(matches!(fx.session.toggle_status("missing"), Err(Error::QuestNotFound(_))));
        assert!(matches!(fx.session.click_quest("missing"), Err(Error::QuestNotFound(_))));
    }
}
