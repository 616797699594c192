#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// Scratch root with an initialized qtree store
pub struct TestRoot {
    dir: TempDir,
}

impl TestRoot {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn init() -> Self {
        let root = Self::new();
        root.qtree(&["init"]).assert().success();
        root
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// `qtree --root <tmp> <args>` with logging disabled
    pub fn qtree(&self, args: &[&str]) -> Command {
        let mut cmd = Command::cargo_bin("qtree").expect("binary");
        cmd.env_remove("RUST_LOG")
            .env_remove("QTREE_ROOT")
            .arg("--root")
            .arg(self.path())
            .args(args);
        cmd
    }

    /// Run with `--json` and return the parsed envelope; the command must succeed
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .qtree(args)
            .arg("--json")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&output).expect("json envelope")
    }

    /// Category "Main" with tree "Quests"; returns the tree id
    pub fn seed_tree(&self) -> String {
        self.json(&["category", "add", "Main"]);
        let tree = self.json(&["tree", "add", "Quests", "--category", "Main"]);
        tree["data"]["id"].as_str().expect("tree id").to_string()
    }

    /// Add a quest and return its id
    pub fn add_quest(&self, title: &str, at: &str) -> String {
        let quest = self.json(&["quest", "add", title, &format!("--at={at}")]);
        quest["data"]["id"].as_str().expect("quest id").to_string()
    }
}
