//! Persistence gateway.
//!
//! [`QuestStore`] is the contract the editor needs from a backing store.
//! Local state is always mutated first; the matching [`Mutation`] is then
//! handed to a [`MutationSink`], which writes it out without the caller
//! waiting on the result. Failed writes are logged, never retried and never
//! rolled back.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use ulid::Ulid;

use crate::error::Result;
use crate::model::{
    NewQuest, Position, Quest, QuestCategory, QuestLink, QuestPatch, QuestTree, StoredStatus,
};

/// Quests of one tree plus the links among them
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeSnapshot {
    pub quests: Vec<Quest>,
    pub links: Vec<QuestLink>,
}

/// Backing store for quest trees
pub trait QuestStore: Send + Sync {
    /// All quests of `tree_id` and every link whose endpoints are both in it
    fn load_tree(&self, tree_id: &str) -> Result<TreeSnapshot>;
    fn get_quest(&self, id: &str) -> Result<Option<Quest>>;
    /// Persist a new quest, assigning its id
    fn create_quest(&self, tree_id: &str, fields: NewQuest) -> Result<Quest>;
    fn update_quest(&self, id: &str, patch: &QuestPatch) -> Result<()>;
    fn update_quests_status(&self, ids: &[String], status: StoredStatus) -> Result<()>;
    fn update_quest_position(&self, id: &str, position: Position) -> Result<()>;
    /// Delete a quest and any link touching it
    fn delete_quest(&self, id: &str) -> Result<()>;
    /// Insert a link; inserting an existing link is a no-op
    fn create_link(&self, parent_id: &str, child_id: &str) -> Result<()>;
    /// Delete a link; deleting an absent link is a no-op
    fn delete_link(&self, parent_id: &str, child_id: &str) -> Result<()>;

    /// Categories sorted by order index
    fn list_categories(&self) -> Result<Vec<QuestCategory>>;
    fn create_category(&self, name: &str) -> Result<QuestCategory>;
    /// Delete a category with its trees, their quests and links
    fn delete_category(&self, id: &str) -> Result<()>;
    /// Trees sorted by order index
    fn list_trees(&self) -> Result<Vec<QuestTree>>;
    fn create_tree(&self, category_id: &str, name: &str) -> Result<QuestTree>;
    /// Delete a tree with its quests and their links
    fn delete_tree(&self, id: &str) -> Result<()>;
}

/// A single write against a [`QuestStore`]. Replaying a mutation leaves the
/// store in the same state as applying it once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    UpdateQuest { id: String, patch: QuestPatch },
    UpdateQuestsStatus { ids: Vec<String>, status: StoredStatus },
    UpdateQuestPosition { id: String, position: Position },
    DeleteQuest { id: String },
    CreateLink { parent_id: String, child_id: String },
    DeleteLink { parent_id: String, child_id: String },
}

impl Mutation {
    pub fn kind(&self) -> &'static str {
        match self {
            Mutation::UpdateQuest { .. } => "update_quest",
            Mutation::UpdateQuestsStatus { .. } => "update_quests_status",
            Mutation::UpdateQuestPosition { .. } => "update_quest_position",
            Mutation::DeleteQuest { .. } => "delete_quest",
            Mutation::CreateLink { .. } => "create_link",
            Mutation::DeleteLink { .. } => "delete_link",
        }
    }

    pub fn apply(&self, store: &dyn QuestStore) -> Result<()> {
        match self {
            Mutation::UpdateQuest { id, patch } => store.update_quest(id, patch),
            Mutation::UpdateQuestsStatus { ids, status } => {
                store.update_quests_status(ids, *status)
            }
            Mutation::UpdateQuestPosition { id, position } => {
                store.update_quest_position(id, *position)
            }
            Mutation::DeleteQuest { id } => store.delete_quest(id),
            Mutation::CreateLink {
                parent_id,
                child_id,
            } => store.create_link(parent_id, child_id),
            Mutation::DeleteLink {
                parent_id,
                child_id,
            } => store.delete_link(parent_id, child_id),
        }
    }
}

/// Receives mutations after they have been applied locally
pub trait MutationSink {
    fn submit(&self, mutation: Mutation);
}

/// Counts from a drained [`WriteBehind`] queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteReport {
    pub applied: usize,
    pub failed: usize,
}

fn apply_logged(store: &dyn QuestStore, id: Ulid, mutation: &Mutation) -> bool {
    match mutation.apply(store) {
        Ok(()) => {
            tracing::debug!(mutation_id = %id, op = mutation.kind(), "mutation written");
            true
        }
        Err(err) => {
            tracing::warn!(
                mutation_id = %id,
                op = mutation.kind(),
                error = %err,
                "mutation write failed; local state kept"
            );
            false
        }
    }
}

/// Applies each mutation synchronously as it is submitted
pub struct ImmediateSink {
    store: Arc<dyn QuestStore>,
}

impl ImmediateSink {
    pub fn new(store: Arc<dyn QuestStore>) -> Self {
        Self { store }
    }
}

impl MutationSink for ImmediateSink {
    fn submit(&self, mutation: Mutation) {
        apply_logged(self.store.as_ref(), Ulid::new(), &mutation);
    }
}

struct Envelope {
    id: Ulid,
    mutation: Mutation,
}

/// Background writer. Mutations are applied one at a time in submission
/// order on a blocking worker, so a reverse-link delete always lands before
/// the insert that replaces it.
pub struct WriteBehind {
    tx: Option<mpsc::UnboundedSender<Envelope>>,
    worker: Option<JoinHandle<WriteReport>>,
}

impl WriteBehind {
    /// Start the worker on `runtime`
    pub fn spawn(store: Arc<dyn QuestStore>, runtime: &tokio::runtime::Handle) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();
        let worker = runtime.spawn_blocking(move || {
            let mut report = WriteReport::default();
            while let Some(envelope) = rx.blocking_recv() {
                if apply_logged(store.as_ref(), envelope.id, &envelope.mutation) {
                    report.applied += 1;
                } else {
                    report.failed += 1;
                }
            }
            report
        });

        Self {
            tx: Some(tx),
            worker: Some(worker),
        }
    }

    /// Close the queue and wait for every submitted mutation to be written
    pub async fn drain(mut self) -> WriteReport {
        drop(self.tx.take());
        match self.worker.take() {
            Some(worker) => worker.await.unwrap_or_else(|err| {
                tracing::warn!(error = %err, "write-behind worker stopped abnormally");
                WriteReport::default()
            }),
            None => WriteReport::default(),
        }
    }
}

impl MutationSink for WriteBehind {
    fn submit(&self, mutation: Mutation) {
        let Some(tx) = &self.tx else {
            return;
        };
        let envelope = Envelope {
            id: Ulid::new(),
            mutation,
        };
        tracing::debug!(
            mutation_id = %envelope.id,
            op = envelope.mutation.kind(),
            "mutation queued"
        );
        if let Err(err) = tx.send(envelope) {
            tracing::warn!(
                op = err.0.mutation.kind(),
                "write-behind queue closed; mutation dropped"
            );
        }
    }
}
