//! qtree category / tree command implementations

use crate::catalog::Catalog;
use crate::cli::{GlobalOptions, Target};
use crate::error::{Error, Result};
use crate::gateway::QuestStore;
use crate::model::{QuestCategory, QuestTree};
use crate::output::{emit_success, HumanOutput};

/// Options for `qtree category add`
pub struct CategoryAddOptions {
    pub name: String,
    pub global: GlobalOptions,
}

/// Options for `qtree category rm`
pub struct CategoryRmOptions {
    pub category: String,
    pub yes: bool,
    pub global: GlobalOptions,
}

/// Options for `qtree tree add`
pub struct TreeAddOptions {
    pub name: String,
    pub category: String,
    pub global: GlobalOptions,
}

/// Options for `qtree tree rm`
pub struct TreeRmOptions {
    pub tree: String,
    pub yes: bool,
    pub global: GlobalOptions,
}

#[derive(serde::Serialize)]
struct TreeRow<'a> {
    #[serde(flatten)]
    tree: &'a QuestTree,
    category: &'a str,
}

#[derive(serde::Serialize)]
struct DeleteReport<'a, T: serde::Serialize> {
    deleted: &'a T,
    #[serde(skip_serializing_if = "Option::is_none")]
    trees: Option<usize>,
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

pub fn run_category_add(options: CategoryAddOptions) -> Result<()> {
    let store = Target::resolve(&options.global)?.open_store()?;
    let category = store.create_category(&options.name)?;

    let mut human = HumanOutput::new(format!("qtree category add: {}", category.name));
    human.push_summary("id", category.id.clone());
    human.push_summary("order", category.order_index.to_string());
    human.push_next_step(format!("qtree tree add <name> --category \"{}\"", category.name));

    emit_success(options.global.output(), "category add", &category, Some(&human))
}

pub fn run_category_ls(global: GlobalOptions) -> Result<()> {
    let store = Target::resolve(&global)?.open_store()?;
    let catalog = Catalog::load(store.as_ref())?;

    let mut human = HumanOutput::new(format!(
        "qtree category ls: {} categories",
        catalog.categories.len()
    ));
    for entry in &catalog.categories {
        human.push_detail(format!(
            "{} ({}) - {} trees",
            entry.category.name,
            short_id(&entry.category.id),
            entry.trees.len()
        ));
    }
    if catalog.categories.is_empty() {
        human.push_next_step("qtree category add <name>");
    }

    emit_success(global.output(), "category ls", &catalog, Some(&human))
}

pub fn run_category_rm(options: CategoryRmOptions) -> Result<()> {
    let store = Target::resolve(&options.global)?.open_store()?;
    let catalog = Catalog::load(store.as_ref())?;
    let category: QuestCategory = catalog.resolve_category(&options.category)?.clone();
    let trees = catalog
        .categories
        .iter()
        .find(|entry| entry.category.id == category.id)
        .map(|entry| entry.trees.len())
        .unwrap_or(0);

    if !options.yes {
        return Err(Error::ConfirmationRequired(format!(
            "delete category '{}' and its {} trees",
            category.name, trees
        )));
    }
    store.delete_category(&category.id)?;

    let mut human = HumanOutput::new(format!("qtree category rm: {}", category.name));
    human.push_summary("trees deleted", trees.to_string());

    emit_success(
        options.global.output(),
        "category rm",
        &DeleteReport {
            deleted: &category,
            trees: Some(trees),
        },
        Some(&human),
    )
}

pub fn run_tree_add(options: TreeAddOptions) -> Result<()> {
    let store = Target::resolve(&options.global)?.open_store()?;
    let catalog = Catalog::load(store.as_ref())?;
    let category = catalog.resolve_category(&options.category)?;
    let tree = store.create_tree(&category.id, &options.name)?;

    let mut human = HumanOutput::new(format!("qtree tree add: {}", tree.name));
    human.push_summary("id", tree.id.clone());
    human.push_summary("category", category.name.clone());
    human.push_next_step(format!("qtree quest add <title> --tree \"{}\"", tree.name));

    emit_success(options.global.output(), "tree add", &tree, Some(&human))
}

pub fn run_tree_ls(global: GlobalOptions) -> Result<()> {
    let store = Target::resolve(&global)?.open_store()?;
    let catalog = Catalog::load(store.as_ref())?;

    let rows: Vec<TreeRow<'_>> = catalog
        .trees()
        .map(|tree| TreeRow {
            tree,
            category: catalog
                .category_of(tree)
                .map(|category| category.name.as_str())
                .unwrap_or(""),
        })
        .collect();

    let mut human = HumanOutput::new(format!("qtree tree ls: {} trees", rows.len()));
    for row in &rows {
        human.push_detail(format!(
            "{} / {} ({})",
            row.category,
            row.tree.name,
            short_id(&row.tree.id)
        ));
    }
    if rows.is_empty() {
        human.push_next_step("qtree tree add <name> --category <category>");
    }

    emit_success(global.output(), "tree ls", &rows, Some(&human))
}

pub fn run_tree_rm(options: TreeRmOptions) -> Result<()> {
    let store = Target::resolve(&options.global)?.open_store()?;
    let catalog = Catalog::load(store.as_ref())?;
    let tree = catalog.resolve_tree(&options.tree)?.clone();

    if !options.yes {
        return Err(Error::ConfirmationRequired(format!(
            "delete tree '{}' and all of its quests",
            tree.name
        )));
    }
    store.delete_tree(&tree.id)?;

    let human = HumanOutput::new(format!("qtree tree rm: {}", tree.name));
    emit_success(
        options.global.output(),
        "tree rm",
        &DeleteReport {
            deleted: &tree,
            trees: None,
        },
        Some(&human),
    )
}
