//! Categories and the trees they group, in sidebar order.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::gateway::QuestStore;
use crate::model::{QuestCategory, QuestTree, MIN_ID_PREFIX_LEN};

#[derive(Debug, Clone, Serialize)]
pub struct CategoryEntry {
    #[serde(flatten)]
    pub category: QuestCategory,
    pub trees: Vec<QuestTree>,
}

/// Snapshot of all categories with their trees, both sorted by order index
#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    pub categories: Vec<CategoryEntry>,
}

impl Catalog {
    pub fn load(store: &dyn QuestStore) -> Result<Self> {
        let categories = store.list_categories()?;
        let trees = store.list_trees()?;
        Ok(Self::from_parts(categories, trees))
    }

    /// Group `trees` under `categories`. Trees whose category is missing are
    /// left out.
    pub fn from_parts(mut categories: Vec<QuestCategory>, mut trees: Vec<QuestTree>) -> Self {
        categories.sort_by_key(|category| category.order_index);
        trees.sort_by_key(|tree| tree.order_index);
        let categories = categories
            .into_iter()
            .map(|category| {
                let trees = trees
                    .iter()
                    .filter(|tree| tree.category_id == category.id)
                    .cloned()
                    .collect();
                CategoryEntry { category, trees }
            })
            .collect();
        Self { categories }
    }

    pub fn trees(&self) -> impl Iterator<Item = &QuestTree> {
        self.categories.iter().flat_map(|entry| entry.trees.iter())
    }

    /// Tree opened when none is requested: the first one in sidebar order
    pub fn default_tree(&self) -> Option<&QuestTree> {
        self.trees().next()
    }

    pub fn category_of(&self, tree: &QuestTree) -> Option<&QuestCategory> {
        self.categories
            .iter()
            .map(|entry| &entry.category)
            .find(|category| category.id == tree.category_id)
    }

    /// Resolve a tree by id, unique id prefix, or case-insensitive name
    pub fn resolve_tree(&self, input: &str) -> Result<&QuestTree> {
        resolve(
            self.trees().map(|tree| (tree.id.as_str(), tree.name.as_str(), tree)),
            input,
            "tree",
        )?
        .ok_or_else(|| Error::TreeNotFound(input.to_string()))
    }

    /// Resolve a category by id, unique id prefix, or case-insensitive name
    pub fn resolve_category(&self, input: &str) -> Result<&QuestCategory> {
        let candidates = self.categories.iter().map(|entry| {
            let category = &entry.category;
            (category.id.as_str(), category.name.as_str(), category)
        });
        resolve(
            candidates,
            input,
            "category",
        )?
        .ok_or_else(|| Error::CategoryNotFound(input.to_string()))
    }
}

fn resolve<'a, T>(
    candidates: impl Iterator<Item = (&'a str, &'a str, &'a T)>,
    input: &str,
    what: &str,
) -> Result<Option<&'a T>> {
    let needle = input.trim();
    if needle.is_empty() {
        return Err(Error::InvalidArgument(format!("{what} cannot be empty")));
    }
    let candidates: Vec<_> = candidates.collect();

    if let Some((_, _, item)) = candidates.iter().find(|(id, _, _)| *id == needle) {
        return Ok(Some(*item));
    }

    let by_name: Vec<&T> = candidates
        .iter()
        .filter(|(_, name, _)| name.eq_ignore_ascii_case(needle))
        .map(|(_, _, item)| *item)
        .collect();
    let prefix = needle.to_ascii_lowercase();
    let by_prefix: Vec<&T> = if prefix.len() < MIN_ID_PREFIX_LEN {
        Vec::new()
    } else {
        candidates
            .iter()
            .filter(|(id, _, _)| id.starts_with(&prefix))
            .map(|(_, _, item)| *item)
            .collect()
    };

    for matches in [by_name, by_prefix] {
        match matches.as_slice() {
            [] => continue,
            [item] => return Ok(Some(*item)),
            _ => {
                return Err(Error::InvalidArgument(format!(
                    "{what} '{needle}' is ambiguous ({} matches)",
                    matches.len()
                )))
            }
        }
    }
    Ok(None)
}
