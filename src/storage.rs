//! File-backed store
//!
//! Layout of the data directory (default `<root>/.qtree/`):
//!
//! ```text
//! .qtree/
//!   store.json         # StoreDocument: categories, trees, quests, links
//!   store.json.lock    # Advisory lock guarding read-modify-write cycles
//! ```
//!
//! Every operation takes the lock, reads the document, applies the change
//! and replaces the file atomically.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::config::Config;
use crate::document::StoreDocument;
use crate::error::{Error, Result};
use crate::gateway::{QuestStore, TreeSnapshot};
use crate::lock::{self, FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::model::{NewQuest, Position, Quest, QuestCategory, QuestPatch, QuestTree, StoredStatus};

/// Name of the per-root data directory
pub const DATA_DIR: &str = ".qtree";

const STORE_FILE: &str = "store.json";

/// Paths of a qtree data directory
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
}

impl Storage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Data directory for `root`: the configured `store.dir` (relative paths
    /// resolve against `root`), or `<root>/.qtree`
    pub fn for_root(root: &Path, config: &Config) -> Self {
        let data_dir = match &config.store.dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => root.join(dir),
            None => root.join(DATA_DIR),
        };
        Self::new(data_dir)
    }

    /// Per-user data directory from the platform conventions
    pub fn global() -> Result<Self> {
        let dirs = ProjectDirs::from("dev", "qtree", "qtree").ok_or_else(|| {
            Error::OperationFailed("cannot determine a home directory".to_string())
        })?;
        Ok(Self::new(dirs.data_dir().to_path_buf()))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn store_file(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE)
    }

    pub fn lock_file(&self) -> PathBuf {
        self.data_dir.join(format!("{STORE_FILE}.lock"))
    }

    pub fn is_initialized(&self) -> bool {
        self.store_file().exists()
    }

    /// Create the data directory and an empty store. Returns false when the
    /// store already existed.
    pub fn init(&self) -> Result<bool> {
        fs::create_dir_all(&self.data_dir)?;
        let _lock = FileLock::acquire(self.lock_file(), DEFAULT_LOCK_TIMEOUT_MS)?;
        if self.is_initialized() {
            return Ok(false);
        }
        self.write_document(&StoreDocument::default())?;
        tracing::info!(path = %self.store_file().display(), "initialized store");
        Ok(true)
    }

    fn read_document(&self) -> Result<StoreDocument> {
        let content = fs::read_to_string(self.store_file())?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write_document(&self, document: &StoreDocument) -> Result<()> {
        let json = serde_json::to_string_pretty(document)?;
        lock::write_atomic(self.store_file(), json.as_bytes())
    }
}

/// [`QuestStore`] persisted as a JSON document on disk
#[derive(Debug, Clone)]
pub struct FileStore {
    storage: Storage,
}

impl FileStore {
    /// Open an initialized store
    pub fn open(storage: Storage) -> Result<Self> {
        if !storage.is_initialized() {
            return Err(Error::NotInitialized(storage.data_dir().to_path_buf()));
        }
        Ok(Self { storage })
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    fn read<T>(&self, f: impl FnOnce(&StoreDocument) -> T) -> Result<T> {
        let _lock = FileLock::acquire(self.storage.lock_file(), DEFAULT_LOCK_TIMEOUT_MS)?;
        let document = self.storage.read_document()?;
        Ok(f(&document))
    }

    fn update<T>(&self, f: impl FnOnce(&mut StoreDocument) -> Result<T>) -> Result<T> {
        let _lock = FileLock::acquire(self.storage.lock_file(), DEFAULT_LOCK_TIMEOUT_MS)?;
        let mut document = self.storage.read_document()?;
        let result = f(&mut document)?;
        self.storage.write_document(&document)?;
        Ok(result)
    }
}

impl QuestStore for FileStore {
    fn load_tree(&self, tree_id: &str) -> Result<TreeSnapshot> {
        self.read(|doc| doc.load_tree(tree_id))
    }

    fn get_quest(&self, id: &str) -> Result<Option<Quest>> {
        self.read(|doc| doc.get_quest(id).cloned())
    }

    fn create_quest(&self, tree_id: &str, fields: NewQuest) -> Result<Quest> {
        self.update(|doc| doc.create_quest(tree_id, fields))
    }

    fn update_quest(&self, id: &str, patch: &QuestPatch) -> Result<()> {
        self.update(|doc| doc.update_quest(id, patch))
    }

    fn update_quests_status(&self, ids: &[String], status: StoredStatus) -> Result<()> {
        self.update(|doc| {
            doc.update_quests_status(ids, status);
            Ok(())
        })
    }

    fn update_quest_position(&self, id: &str, position: Position) -> Result<()> {
        self.update(|doc| doc.update_quest_position(id, position))
    }

    fn delete_quest(&self, id: &str) -> Result<()> {
        self.update(|doc| {
            doc.delete_quest(id);
            Ok(())
        })
    }

    fn create_link(&self, parent_id: &str, child_id: &str) -> Result<()> {
        self.update(|doc| doc.create_link(parent_id, child_id))
    }

    fn delete_link(&self, parent_id: &str, child_id: &str) -> Result<()> {
        self.update(|doc| {
            doc.delete_link(parent_id, child_id);
            Ok(())
        })
    }

    fn list_categories(&self) -> Result<Vec<QuestCategory>> {
        self.read(|doc| doc.list_categories())
    }

    fn create_category(&self, name: &str) -> Result<QuestCategory> {
        self.update(|doc| doc.create_category(name))
    }

    fn delete_category(&self, id: &str) -> Result<()> {
        self.update(|doc| doc.delete_category(id))
    }

    fn list_trees(&self) -> Result<Vec<QuestTree>> {
        self.read(|doc| doc.list_trees())
    }

    fn create_tree(&self, category_id: &str, name: &str) -> Result<QuestTree> {
        self.update(|doc| doc.create_tree(category_id, name))
    }

    fn delete_tree(&self, id: &str) -> Result<()> {
        self.update(|doc| doc.delete_tree(id))
    }
}
