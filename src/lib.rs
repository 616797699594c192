//! qtree - quest trees with prerequisite gating
//!
//! Quests are goal nodes inside a tree, linked by directed prerequisite
//! edges. A quest is locked until all of its parents are completed, and
//! reopening a quest reopens everything downstream of it.
//!
//! # Module Organization
//!
//! - `model`: quests, links, trees, categories and the per-tree graph
//! - `status`: visual status derivation (locked / available / completed)
//! - `propagate`: completion toggling with cascading un-completion
//! - `links`: link creation rules and the two-click link selection
//! - `layout`: pushing overlapping nodes apart after a drag
//! - `session`: editor session tying the above to a store
//! - `gateway`: store contract, mutations and the write-behind queue
//! - `document`, `storage`, `lock`: in-memory and file-backed stores
//! - `catalog`: categories and trees in sidebar order
//! - `config`: `.qtree.toml` loading
//! - `cli`, `output`: command-line interface

pub mod catalog;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod gateway;
pub mod layout;
pub mod links;
pub mod lock;
pub mod model;
pub mod output;
pub mod propagate;
pub mod session;
pub mod status;
pub mod storage;

pub use error::{Error, Result};
