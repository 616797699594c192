//! qtree init command implementation
//!
//! Creates the data directory with an empty store and, for root-local
//! stores, a default `.qtree.toml`.

use std::path::{Path, PathBuf};

use crate::cli::{GlobalOptions, Target};
use crate::config::{Config, CONFIG_FILE};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};

#[derive(serde::Serialize)]
struct InitReport {
    root: PathBuf,
    data_dir: PathBuf,
    created: InitCreated,
}

#[derive(serde::Serialize)]
struct InitCreated {
    config: bool,
    store: bool,
}

pub fn run(options: GlobalOptions) -> Result<()> {
    let target = Target::resolve(&options)?;

    let created_store = target.storage.init()?;
    let created_config = if options.global {
        false
    } else {
        ensure_config(&target.root, &target.config)?
    };

    let report = InitReport {
        root: target.root.clone(),
        data_dir: target.storage.data_dir().to_path_buf(),
        created: InitCreated {
            config: created_config,
            store: created_store,
        },
    };

    let mut created_items = Vec::new();
    if created_config {
        created_items.push(CONFIG_FILE.to_string());
    }
    if created_store {
        created_items.push(target.storage.store_file().display().to_string());
    }

    let header = if created_items.is_empty() {
        "qtree init: nothing to do".to_string()
    } else {
        "qtree init: initialized store".to_string()
    };

    let mut human = HumanOutput::new(header);
    human.push_summary("root", target.root.display().to_string());
    human.push_summary("data", target.storage.data_dir().display().to_string());
    human.push_summary(
        "created",
        if created_items.is_empty() {
            "none".to_string()
        } else {
            created_items.join(", ")
        },
    );
    human.push_next_step("qtree category add <name>");
    human.push_next_step("qtree tree add <name> --category <category>");

    emit_success(options.output(), "init", &report, Some(&human))
}

fn ensure_config(root: &Path, config: &Config) -> Result<bool> {
    let path = root.join(CONFIG_FILE);
    if path.exists() {
        return Ok(false);
    }
    std::fs::create_dir_all(root)?;
    config.save(&path)?;
    Ok(true)
}
