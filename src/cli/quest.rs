//! qtree quest command implementations
//!
//! Each command opens an editor session on one tree, performs its edit, and
//! drains the session's write-behind queue before reporting.

use serde::Serialize;

use crate::cli::{push_write_warnings, with_session, GlobalOptions};
use crate::error::{Error, Result};
use crate::gateway::{MutationSink, WriteReport};
use crate::layout::OverlapResolution;
use crate::model::{Position, Quest, QuestPatch, StoredStatus, VisualStatus};
use crate::output::{emit_success, HumanOutput};
use crate::propagate::ToggleOutcome;
use crate::session::{EditorSession, GraphView};

/// Options for `qtree quest add`
pub struct AddOptions {
    pub title: Option<String>,
    pub tree: Option<String>,
    pub at: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub global: GlobalOptions,
}

/// Options for `qtree quest ls`
pub struct LsOptions {
    pub tree: Option<String>,
    pub global: GlobalOptions,
}

/// Options for `qtree quest show`
pub struct ShowOptions {
    pub quest: String,
    pub tree: Option<String>,
    pub global: GlobalOptions,
}

/// Options for `qtree quest edit`
pub struct EditOptions {
    pub quest: String,
    pub tree: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub clear_description: bool,
    pub clear_icon: bool,
    pub global: GlobalOptions,
}

/// Options for `qtree quest toggle`
pub struct ToggleOptions {
    pub quest: String,
    pub tree: Option<String>,
    pub global: GlobalOptions,
}

/// Options for `qtree quest rm`
pub struct RmOptions {
    pub quest: String,
    pub tree: Option<String>,
    pub yes: bool,
    pub global: GlobalOptions,
}

/// Options for `qtree quest move`
pub struct MoveOptions {
    pub quest: String,
    pub position: String,
    pub tree: Option<String>,
    pub global: GlobalOptions,
}

#[derive(Serialize)]
struct QuestReport {
    #[serde(flatten)]
    quest: Quest,
    visual_status: VisualStatus,
}

#[derive(Serialize)]
struct ShowReport {
    #[serde(flatten)]
    quest: Quest,
    visual_status: VisualStatus,
    can_complete: bool,
    parents: Vec<String>,
    children: Vec<String>,
}

#[derive(Serialize)]
struct RemoveReport {
    quest: Quest,
    links_removed: usize,
}

#[derive(Serialize)]
struct MoveReport {
    quest_id: String,
    position: Position,
    #[serde(flatten)]
    resolution: OverlapResolution,
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn title_of<S: MutationSink>(session: &EditorSession<S>, id: &str) -> String {
    session
        .graph()
        .quest(id)
        .map(|quest| quest.title.clone())
        .unwrap_or_else(|| id.to_string())
}

fn quest_report<S: MutationSink>(session: &EditorSession<S>, id: &str) -> Result<QuestReport> {
    let quest = session
        .graph()
        .quest(id)
        .cloned()
        .ok_or_else(|| Error::QuestNotFound(id.to_string()))?;
    let visual_status = session
        .visual_status(id)
        .unwrap_or(VisualStatus::Available);
    Ok(QuestReport {
        quest,
        visual_status,
    })
}

fn push_quest_summary(human: &mut HumanOutput, report: &QuestReport) {
    human.push_summary("id", report.quest.id.clone());
    human.push_summary("status", report.visual_status.to_string());
    human.push_summary(
        "position",
        format!("{}, {}", report.quest.position.x, report.quest.position.y),
    );
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let position = options
        .at
        .as_deref()
        .map(str::parse::<Position>)
        .transpose()?;

    let (report, writes): (QuestReport, WriteReport) =
        with_session(&options.global, options.tree.as_deref(), |session| {
            let quest = session.add_quest(options.title.clone(), position)?;
            let patch = QuestPatch {
                title: None,
                description: options.description.clone().map(Some),
                icon: options.icon.clone().map(Some),
            };
            session.update_quest(&quest.id, patch)?;
            quest_report(session, &quest.id)
        })?;

    let mut human = HumanOutput::new(format!("qtree quest add: {}", report.quest.title));
    push_quest_summary(&mut human, &report);
    push_write_warnings(&mut human, &writes);
    human.push_next_step(format!("qtree link add <parent> {}", short_id(&report.quest.id)));

    emit_success(options.global.output(), "quest add", &report, Some(&human))
}

pub fn run_ls(options: LsOptions) -> Result<()> {
    let (view, writes): (GraphView, WriteReport) =
        with_session(&options.global, options.tree.as_deref(), |session| Ok(session.views()))?;

    let mut human = HumanOutput::new(format!("qtree quest ls: {} quests", view.nodes.len()));
    for node in &view.nodes {
        human.push_detail(format!(
            "[{}] {} ({})",
            node.status,
            node.title,
            short_id(&node.id)
        ));
    }
    let title = |id: &str| {
        view.nodes
            .iter()
            .find(|node| node.id == id)
            .map(|node| node.title.clone())
            .unwrap_or_else(|| id.to_string())
    };
    for edge in &view.edges {
        human.push_detail(format!(
            "{} -> {} ({})",
            title(&edge.parent_id),
            title(&edge.child_id),
            edge.state.as_str()
        ));
    }
    push_write_warnings(&mut human, &writes);
    if view.nodes.is_empty() {
        human.push_next_step("qtree quest add <title>");
    }

    emit_success(options.global.output(), "quest ls", &view, Some(&human))
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let (report, _): (ShowReport, WriteReport) =
        with_session(&options.global, options.tree.as_deref(), |session| {
            let id = session.graph().resolve_id(&options.quest)?;
            session.open_detail(&id)?;
            let quest = session
                .detail()
                .cloned()
                .ok_or_else(|| Error::QuestNotFound(id.clone()))?;
            Ok(ShowReport {
                visual_status: session
                    .visual_status(&id)
                    .unwrap_or(VisualStatus::Available),
                can_complete: session.can_complete(&id),
                parents: session.graph().parents_of(&id).into_iter().map(String::from).collect(),
                children: session.graph().children_of(&id).into_iter().map(String::from).collect(),
                quest,
            })
        })?;

    let mut human = HumanOutput::new(format!("qtree quest show: {}", report.quest.title));
    human.push_summary("id", report.quest.id.clone());
    human.push_summary("status", report.visual_status.to_string());
    if let Some(description) = &report.quest.description {
        human.push_summary("description", description.clone());
    }
    if let Some(icon) = &report.quest.icon {
        human.push_summary("icon", icon.clone());
    }
    for parent in &report.parents {
        human.push_detail(format!("requires {}", short_id(parent)));
    }
    for child in &report.children {
        human.push_detail(format!("unlocks {}", short_id(child)));
    }
    if report.quest.status == StoredStatus::Available && report.can_complete {
        human.push_next_step(format!("qtree quest toggle {}", short_id(&report.quest.id)));
    }

    emit_success(options.global.output(), "quest show", &report, Some(&human))
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let patch = QuestPatch {
        title: options.title.clone(),
        description: if options.clear_description {
            Some(None)
        } else {
            options.description.clone().map(Some)
        },
        icon: if options.clear_icon {
            Some(None)
        } else {
            options.icon.clone().map(Some)
        },
    };
    if patch.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to edit; pass --title, --description or --icon".to_string(),
        ));
    }
    if matches!(&patch.title, Some(title) if title.trim().is_empty()) {
        return Err(Error::InvalidArgument("title cannot be empty".to_string()));
    }

    let (report, writes) = with_session(&options.global, options.tree.as_deref(), |session| {
        let id = session.graph().resolve_id(&options.quest)?;
        session.update_quest(&id, patch)?;
        quest_report(session, &id)
    })?;

    let mut human = HumanOutput::new(format!("qtree quest edit: {}", report.quest.title));
    push_quest_summary(&mut human, &report);
    push_write_warnings(&mut human, &writes);

    emit_success(options.global.output(), "quest edit", &report, Some(&human))
}

pub fn run_toggle(options: ToggleOptions) -> Result<()> {
    let ((outcome, titles), writes): ((ToggleOutcome, Vec<String>), WriteReport) =
        with_session(&options.global, options.tree.as_deref(), |session| {
            let id = session.graph().resolve_id(&options.quest)?;
            let outcome = session.toggle_status(&id)?;
            if !outcome.is_applied() {
                let blockers: Vec<String> = outcome
                    .blocked_by
                    .iter()
                    .map(|parent| title_of(session, parent))
                    .collect();
                return Err(Error::Rejected(format!(
                    "'{}' is locked; complete {} first",
                    title_of(session, &id),
                    blockers.join(", ")
                )));
            }
            let titles = outcome
                .updated_ids
                .iter()
                .map(|updated| title_of(session, updated))
                .collect();
            Ok((outcome, titles))
        })?;

    let mut human = HumanOutput::new(format!(
        "qtree quest toggle: {} -> {}",
        titles.first().map(String::as_str).unwrap_or(&outcome.quest_id),
        outcome.new_status
    ));
    human.push_summary("updated", outcome.updated_ids.len().to_string());
    for title in titles.iter().skip(1) {
        human.push_detail(format!("reset {title}"));
    }
    push_write_warnings(&mut human, &writes);

    emit_success(options.global.output(), "quest toggle", &outcome, Some(&human))
}

pub fn run_rm(options: RmOptions) -> Result<()> {
    let (report, writes) = with_session(&options.global, options.tree.as_deref(), |session| {
        let id = session.graph().resolve_id(&options.quest)?;
        session.request_delete_quest(&id)?;
        let quest = session
            .graph()
            .quest(&id)
            .cloned()
            .ok_or_else(|| Error::QuestNotFound(id.clone()))?;
        let links_removed = session
            .graph()
            .links()
            .iter()
            .filter(|link| link.touches(&id))
            .count();

        if !options.yes {
            session.cancel_deletion();
            return Err(Error::ConfirmationRequired(format!(
                "delete quest '{}' and its {} links",
                quest.title, links_removed
            )));
        }
        session.confirm_deletion();
        Ok(RemoveReport {
            quest,
            links_removed,
        })
    })?;

    let mut human = HumanOutput::new(format!("qtree quest rm: {}", report.quest.title));
    human.push_summary("links removed", report.links_removed.to_string());
    push_write_warnings(&mut human, &writes);

    emit_success(options.global.output(), "quest rm", &report, Some(&human))
}

pub fn run_move(options: MoveOptions) -> Result<()> {
    let position: Position = options.position.parse()?;

    let (report, writes) = with_session(&options.global, options.tree.as_deref(), |session| {
        let id = session.graph().resolve_id(&options.quest)?;
        let resolution = session.end_drag(&id, position)?;
        Ok(MoveReport {
            quest_id: id,
            position,
            resolution,
        })
    })?;

    let mut human = HumanOutput::new(format!(
        "qtree quest move: {} -> {}, {}",
        short_id(&report.quest_id),
        position.x,
        position.y
    ));
    human.push_summary("pushed", report.resolution.moved.len().to_string());
    for id in &report.resolution.moved {
        if let Some(moved) = report.resolution.position_of(id) {
            human.push_detail(format!("{} -> {:.1}, {:.1}", short_id(id), moved.x, moved.y));
        }
    }
    if !report.resolution.converged {
        human.push_warning("some quests still overlap; move again to spread them further");
    }
    push_write_warnings(&mut human, &writes);

    emit_success(options.global.output(), "quest move", &report, Some(&human))
}
