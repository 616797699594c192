//! Command-line interface for qtree
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::gateway::{QuestStore, WriteBehind, WriteReport};
use crate::model::QuestTree;
use crate::output::{HumanOutput, OutputOptions};
use crate::session::EditorSession;
use crate::storage::{FileStore, Storage};

mod catalog;
mod init;
mod link;
mod quest;

/// qtree - quest trees with prerequisite gating
///
/// Organise goals as quests linked by prerequisites. A quest stays locked
/// until every parent quest is completed.
#[derive(Parser, Debug)]
#[command(name = "qtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding `.qtree.toml` and the `.qtree/` store (defaults to current directory)
    #[arg(long, global = true, env = "QTREE_ROOT")]
    pub root: Option<PathBuf>,

    /// Use the per-user store instead of the one under the root
    #[arg(long, global = true)]
    pub global: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the store and a default `.qtree.toml`
    Init,

    /// Manage categories
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Manage quest trees
    #[command(subcommand)]
    Tree(TreeCommands),

    /// Create, edit and complete quests
    #[command(subcommand)]
    Quest(QuestCommands),

    /// Manage prerequisite links between quests
    #[command(subcommand)]
    Link(LinkCommands),
}

/// Category subcommands
#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// Add a category
    Add {
        /// Category name
        name: String,
    },

    /// List categories with their trees
    Ls,

    /// Delete a category with all of its trees
    Rm {
        /// Category id, id prefix, or name
        category: String,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

/// Tree subcommands
#[derive(Subcommand, Debug)]
pub enum TreeCommands {
    /// Add a tree to a category
    Add {
        /// Tree name
        name: String,

        /// Category id, id prefix, or name
        #[arg(short, long)]
        category: String,
    },

    /// List trees in sidebar order
    Ls,

    /// Delete a tree with its quests and links
    Rm {
        /// Tree id, id prefix, or name
        tree: String,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

/// Quest subcommands
#[derive(Subcommand, Debug)]
pub enum QuestCommands {
    /// Add a quest
    Add {
        /// Title (defaults to `quests.default_title`)
        title: Option<String>,

        /// Tree id, id prefix, or name (defaults to the first tree)
        #[arg(short, long)]
        tree: Option<String>,

        /// Canvas position as "x,y"
        #[arg(long, allow_hyphen_values = true)]
        at: Option<String>,

        /// Description text
        #[arg(short, long)]
        description: Option<String>,

        /// Icon name
        #[arg(long)]
        icon: Option<String>,
    },

    /// List quests with their derived status
    Ls {
        #[arg(short, long)]
        tree: Option<String>,
    },

    /// Show one quest with its parents and children
    Show {
        /// Quest id or unique id prefix
        quest: String,

        #[arg(short, long)]
        tree: Option<String>,
    },

    /// Edit a quest's title, description or icon
    Edit {
        quest: String,

        #[arg(short, long)]
        tree: Option<String>,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long, conflicts_with = "clear_description")]
        description: Option<String>,

        #[arg(long, conflicts_with = "clear_icon")]
        icon: Option<String>,

        /// Remove the description
        #[arg(long)]
        clear_description: bool,

        /// Remove the icon
        #[arg(long)]
        clear_icon: bool,
    },

    /// Complete a quest, or reopen it together with everything after it
    Toggle {
        quest: String,

        #[arg(short, long)]
        tree: Option<String>,
    },

    /// Delete a quest and its links
    Rm {
        quest: String,

        #[arg(short, long)]
        tree: Option<String>,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Drop a quest at a new position, pushing overlapping quests aside
    Move {
        quest: String,

        /// New position as "x,y"
        #[arg(allow_hyphen_values = true)]
        position: String,

        #[arg(short, long)]
        tree: Option<String>,
    },
}

/// Link subcommands
#[derive(Subcommand, Debug)]
pub enum LinkCommands {
    /// Make PARENT a prerequisite of CHILD
    Add {
        parent: String,
        child: String,

        #[arg(short, long)]
        tree: Option<String>,
    },

    /// Remove a prerequisite link
    Rm {
        parent: String,
        child: String,

        #[arg(short, long)]
        tree: Option<String>,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
}

/// Flags shared by every command
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub root: Option<PathBuf>,
    pub global: bool,
    pub json: bool,
    pub quiet: bool,
}

impl GlobalOptions {
    pub fn output(&self) -> OutputOptions {
        OutputOptions {
            json: self.json,
            quiet: self.quiet,
        }
    }

    fn root_dir(&self) -> Result<PathBuf> {
        match &self.root {
            Some(path) => Ok(path.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }
}

/// Root directory, configuration and store location for one invocation
pub(crate) struct Target {
    pub root: PathBuf,
    pub config: Config,
    pub storage: Storage,
}

impl Target {
    pub fn resolve(options: &GlobalOptions) -> Result<Self> {
        let root = options.root_dir()?;
        let config = Config::load_from_root(&root);
        let storage = if options.global {
            Storage::global()?
        } else {
            Storage::for_root(&root, &config)
        };
        tracing::debug!(
            root = %root.display(),
            data_dir = %storage.data_dir().display(),
            "resolved store"
        );
        Ok(Self {
            root,
            config,
            storage,
        })
    }

    pub fn open_store(&self) -> Result<Arc<FileStore>> {
        Ok(Arc::new(FileStore::open(self.storage.clone())?))
    }
}

/// Pick the tree a quest command works on: the named one, or the first tree
/// in sidebar order
pub(crate) fn select_tree(store: &dyn QuestStore, input: Option<&str>) -> Result<QuestTree> {
    let catalog = Catalog::load(store)?;
    match input {
        Some(input) => Ok(catalog.resolve_tree(input)?.clone()),
        None => catalog.default_tree().cloned().ok_or_else(|| {
            Error::InvalidArgument(
                "no quest trees exist yet; add one with `qtree tree add`".to_string(),
            )
        }),
    }
}

/// Run `f` against an editor session on the selected tree. Writes go through
/// a write-behind queue that is drained before returning.
pub(crate) fn with_session<T>(
    options: &GlobalOptions,
    tree: Option<&str>,
    f: impl FnOnce(&mut EditorSession<WriteBehind>) -> Result<T>,
) -> Result<(T, WriteReport)> {
    let target = Target::resolve(options)?;
    let store = target.open_store()?;
    let tree = select_tree(store.as_ref(), tree)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let sink = WriteBehind::spawn(store.clone(), runtime.handle());
    let mut session = EditorSession::open(store, &tree.id, sink)?.with_config(&target.config);

    let result = f(&mut session);
    let report = runtime.block_on(session.into_sink().drain());
    Ok((result?, report))
}

/// Surface failed background writes to the user
pub(crate) fn push_write_warnings(human: &mut HumanOutput, report: &WriteReport) {
    if report.failed > 0 {
        human.push_warning(format!(
            "{} of {} store writes failed; local changes may not be saved \
             (run with RUST_LOG=warn for details)",
            report.failed,
            report.failed + report.applied
        ));
    }
}

impl Cli {
    fn global_options(&self) -> GlobalOptions {
        GlobalOptions {
            root: self.root.clone(),
            global: self.global,
            json: self.json,
            quiet: self.quiet,
        }
    }

    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let global = self.global_options();
        match self.command {
            Commands::Init => init::run(global),
            Commands::Category(cmd) => match cmd {
                CategoryCommands::Add { name } => {
                    catalog::run_category_add(catalog::CategoryAddOptions { name, global })
                }
                CategoryCommands::Ls => catalog::run_category_ls(global),
                CategoryCommands::Rm { category, yes } => {
                    catalog::run_category_rm(catalog::CategoryRmOptions {
                        category,
                        yes,
                        global,
                    })
                }
            },
            Commands::Tree(cmd) => match cmd {
                TreeCommands::Add { name, category } => {
                    catalog::run_tree_add(catalog::TreeAddOptions {
                        name,
                        category,
                        global,
                    })
                }
                TreeCommands::Ls => catalog::run_tree_ls(global),
                TreeCommands::Rm { tree, yes } => {
                    catalog::run_tree_rm(catalog::TreeRmOptions { tree, yes, global })
                }
            },
            Commands::Quest(cmd) => match cmd {
                QuestCommands::Add {
                    title,
                    tree,
                    at,
                    description,
                    icon,
                } => quest::run_add(quest::AddOptions {
                    title,
                    tree,
                    at,
                    description,
                    icon,
                    global,
                }),
                QuestCommands::Ls { tree } => quest::run_ls(quest::LsOptions { tree, global }),
                QuestCommands::Show { quest, tree } => {
                    quest::run_show(quest::ShowOptions { quest, tree, global })
                }
                QuestCommands::Edit {
                    quest,
                    tree,
                    title,
                    description,
                    icon,
                    clear_description,
                    clear_icon,
                } => quest::run_edit(quest::EditOptions {
                    quest,
                    tree,
                    title,
                    description,
                    icon,
                    clear_description,
                    clear_icon,
                    global,
                }),
                QuestCommands::Toggle { quest, tree } => {
                    quest::run_toggle(quest::ToggleOptions { quest, tree, global })
                }
                QuestCommands::Rm { quest, tree, yes } => quest::run_rm(quest::RmOptions {
                    quest,
                    tree,
                    yes,
                    global,
                }),
                QuestCommands::Move {
                    quest,
                    position,
                    tree,
                } => quest::run_move(quest::MoveOptions {
                    quest,
                    position,
                    tree,
                    global,
                }),
            },
            Commands::Link(cmd) => match cmd {
                LinkCommands::Add {
                    parent,
                    child,
                    tree,
                } => link::run_add(link::AddOptions {
                    parent,
                    child,
                    tree,
                    global,
                }),
                LinkCommands::Rm {
                    parent,
                    child,
                    tree,
                    yes,
                } => link::run_rm(link::RmOptions {
                    parent,
                    child,
                    tree,
                    yes,
                    global,
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn negative_positions_parse() {
        let cli = Cli::try_parse_from(["qtree", "quest", "move", "abcd", "-40,12.5"]).unwrap();
        match cli.command {
            Commands::Quest(QuestCommands::Move { position, .. }) => {
                assert_eq!(position, "-40,12.5")
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
