//! Store document shared by the in-memory and file-backed stores.
//!
//! The whole store is one serializable document: categories, trees, quests
//! and links. Both [`MemoryStore`] and [`crate::storage::FileStore`] apply
//! operations to it; they differ only in where the document lives.

use std::collections::HashSet;
use std::sync::Mutex;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::gateway::{QuestStore, TreeSnapshot};
use crate::model::{
    NewQuest, Position, Quest, QuestCategory, QuestLink, QuestPatch, QuestTree, StoredStatus,
};

pub const STORE_SCHEMA_VERSION: &str = "qtree.store.v1";

fn default_schema_version() -> String {
    STORE_SCHEMA_VERSION.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default)]
    pub categories: Vec<QuestCategory>,
    #[serde(default)]
    pub trees: Vec<QuestTree>,
    #[serde(default)]
    pub quests: Vec<Quest>,
    #[serde(default)]
    pub links: Vec<QuestLink>,
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            categories: Vec::new(),
            trees: Vec::new(),
            quests: Vec::new(),
            links: Vec::new(),
        }
    }
}

/// Next order index within a scope: one past the current maximum, 1 if empty
fn next_order_index(existing: impl Iterator<Item = i64>) -> i64 {
    existing.max().map(|max| max + 1).unwrap_or(1)
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn clean_name(name: &str, what: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument(format!("{what} name cannot be empty")));
    }
    Ok(trimmed.to_string())
}

impl StoreDocument {
    pub fn load_tree(&self, tree_id: &str) -> TreeSnapshot {
        let quests: Vec<Quest> = self
            .quests
            .iter()
            .filter(|quest| quest.tree_id == tree_id)
            .cloned()
            .collect();
        let ids: HashSet<&str> = quests.iter().map(|quest| quest.id.as_str()).collect();
        let links = self
            .links
            .iter()
            .filter(|link| {
                ids.contains(link.parent_id.as_str()) && ids.contains(link.child_id.as_str())
            })
            .cloned()
            .collect();
        TreeSnapshot { quests, links }
    }

    pub fn get_quest(&self, id: &str) -> Option<&Quest> {
        self.quests.iter().find(|quest| quest.id == id)
    }

    fn quest_mut(&mut self, id: &str) -> Result<&mut Quest> {
        self.quests
            .iter_mut()
            .find(|quest| quest.id == id)
            .ok_or_else(|| Error::QuestNotFound(id.to_string()))
    }

    pub fn create_quest(&mut self, tree_id: &str, fields: NewQuest) -> Result<Quest> {
        if !self.trees.iter().any(|tree| tree.id == tree_id) {
            return Err(Error::TreeNotFound(tree_id.to_string()));
        }
        let title = clean_name(&fields.title, "quest")?;
        let now = Utc::now();
        let quest = Quest {
            id: new_id(),
            title,
            description: fields.description,
            icon: fields.icon,
            status: fields.status,
            position: fields.position,
            tree_id: tree_id.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.quests.push(quest.clone());
        Ok(quest)
    }

    pub fn update_quest(&mut self, id: &str, patch: &QuestPatch) -> Result<()> {
        let quest = self.quest_mut(id)?;
        patch.apply_to(quest);
        quest.updated_at = Utc::now();
        Ok(())
    }

    /// Ids that are not present are skipped
    pub fn update_quests_status(&mut self, ids: &[String], status: StoredStatus) {
        let now = Utc::now();
        for quest in self.quests.iter_mut().filter(|quest| ids.contains(&quest.id)) {
            quest.status = status;
            quest.updated_at = now;
        }
    }

    pub fn update_quest_position(&mut self, id: &str, position: Position) -> Result<()> {
        let quest = self.quest_mut(id)?;
        quest.position = position;
        quest.updated_at = Utc::now();
        Ok(())
    }

    pub fn delete_quest(&mut self, id: &str) {
        self.quests.retain(|quest| quest.id != id);
        self.links.retain(|link| !link.touches(id));
    }

    pub fn create_link(&mut self, parent_id: &str, child_id: &str) -> Result<()> {
        if parent_id == child_id {
            return Err(Error::InvalidArgument(format!(
                "quest {parent_id} cannot link to itself"
            )));
        }
        let parent = self
            .get_quest(parent_id)
            .ok_or_else(|| Error::QuestNotFound(parent_id.to_string()))?;
        let child = self
            .get_quest(child_id)
            .ok_or_else(|| Error::QuestNotFound(child_id.to_string()))?;
        if parent.tree_id != child.tree_id {
            return Err(Error::InvalidArgument(format!(
                "quests {parent_id} and {child_id} belong to different trees"
            )));
        }

        let link = QuestLink::new(parent_id, child_id);
        if !self.links.contains(&link) {
            self.links.push(link);
        }
        Ok(())
    }

    pub fn delete_link(&mut self, parent_id: &str, child_id: &str) {
        self.links
            .retain(|link| !(link.parent_id == parent_id && link.child_id == child_id));
    }

    pub fn list_categories(&self) -> Vec<QuestCategory> {
        let mut categories = self.categories.clone();
        categories.sort_by(|a, b| {
            a.order_index
                .cmp(&b.order_index)
                .then_with(|| a.name.cmp(&b.name))
        });
        categories
    }

    pub fn create_category(&mut self, name: &str) -> Result<QuestCategory> {
        let category = QuestCategory {
            id: new_id(),
            name: clean_name(name, "category")?,
            order_index: next_order_index(self.categories.iter().map(|c| c.order_index)),
            created_at: Utc::now(),
        };
        self.categories.push(category.clone());
        Ok(category)
    }

    pub fn delete_category(&mut self, id: &str) -> Result<()> {
        if !self.categories.iter().any(|category| category.id == id) {
            return Err(Error::CategoryNotFound(id.to_string()));
        }
        let tree_ids: Vec<String> = self
            .trees
            .iter()
            .filter(|tree| tree.category_id == id)
            .map(|tree| tree.id.clone())
            .collect();
        for tree_id in &tree_ids {
            self.delete_tree(tree_id)?;
        }
        self.categories.retain(|category| category.id != id);
        Ok(())
    }

    pub fn list_trees(&self) -> Vec<QuestTree> {
        let mut trees = self.trees.clone();
        trees.sort_by(|a, b| a.order_index.cmp(&b.order_index).then_with(|| a.name.cmp(&b.name)));
        trees
    }

    pub fn create_tree(&mut self, category_id: &str, name: &str) -> Result<QuestTree> {
        if !self.categories.iter().any(|category| category.id == category_id) {
            return Err(Error::CategoryNotFound(category_id.to_string()));
        }
        let tree = QuestTree {
            id: new_id(),
            name: clean_name(name, "tree")?,
            category_id: category_id.to_string(),
            order_index: next_order_index(
                self.trees
                    .iter()
                    .filter(|tree| tree.category_id == category_id)
                    .map(|tree| tree.order_index),
            ),
            created_at: Utc::now(),
        };
        self.trees.push(tree.clone());
        Ok(tree)
    }

    pub fn delete_tree(&mut self, id: &str) -> Result<()> {
        if !self.trees.iter().any(|tree| tree.id == id) {
            return Err(Error::TreeNotFound(id.to_string()));
        }
        let quest_ids: HashSet<String> = self
            .quests
            .iter()
            .filter(|quest| quest.tree_id == id)
            .map(|quest| quest.id.clone())
            .collect();
        self.links.retain(|link| {
            !quest_ids.contains(&link.parent_id) && !quest_ids.contains(&link.child_id)
        });
        self.quests.retain(|quest| quest.tree_id != id);
        self.trees.retain(|tree| tree.id != id);
        Ok(())
    }
}

/// Store kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: Mutex<StoreDocument>,
}

impl MemoryStore {
    pub fn new(document: StoreDocument) -> Self {
        Self {
            document: Mutex::new(document),
        }
    }

    fn with<T>(&self, f: impl FnOnce(&mut StoreDocument) -> Result<T>) -> Result<T> {
        let mut document = self
            .document
            .lock()
            .map_err(|_| Error::Store("memory store lock poisoned".to_string()))?;
        f(&mut document)
    }
}

impl QuestStore for MemoryStore {
    fn load_tree(&self, tree_id: &str) -> Result<TreeSnapshot> {
        self.with(|doc| Ok(doc.load_tree(tree_id)))
    }

    fn get_quest(&self, id: &str) -> Result<Option<Quest>> {
        self.with(|doc| Ok(doc.get_quest(id).cloned()))
    }

    fn create_quest(&self, tree_id: &str, fields: NewQuest) -> Result<Quest> {
        self.with(|doc| doc.create_quest(tree_id, fields))
    }

    fn update_quest(&self, id: &str, patch: &QuestPatch) -> Result<()> {
        self.with(|doc| doc.update_quest(id, patch))
    }

    fn update_quests_status(&self, ids: &[String], status: StoredStatus) -> Result<()> {
        self.with(|doc| {
            doc.update_quests_status(ids, status);
            Ok(())
        })
    }

    fn update_quest_position(&self, id: &str, position: Position) -> Result<()> {
        self.with(|doc| doc.update_quest_position(id, position))
    }

    fn delete_quest(&self, id: &str) -> Result<()> {
        self.with(|doc| {
            doc.delete_quest(id);
            Ok(())
        })
    }

    fn create_link(&self, parent_id: &str, child_id: &str) -> Result<()> {
        self.with(|doc| doc.create_link(parent_id, child_id))
    }

    fn delete_link(&self, parent_id: &str, child_id: &str) -> Result<()> {
        self.with(|doc| {
            doc.delete_link(parent_id, child_id);
            Ok(())
        })
    }

    fn list_categories(&self) -> Result<Vec<QuestCategory>> {
        self.with(|doc| Ok(doc.list_categories()))
    }

    fn create_category(&self, name: &str) -> Result<QuestCategory> {
        self.with(|doc| doc.create_category(name))
    }

    fn delete_category(&self, id: &str) -> Result<()> {
        self.with(|doc| doc.delete_category(id))
    }

    fn list_trees(&self) -> Result<Vec<QuestTree>> {
        self.with(|doc| Ok(doc.list_trees()))
    }

    fn create_tree(&self, category_id: &str, name: &str) -> Result<QuestTree> {
        self.with(|doc| doc.create_tree(category_id, name))
    }

    fn delete_tree(&self, id: &str) -> Result<()> {
        self.with(|doc| doc.delete_tree(id))
    }
}
