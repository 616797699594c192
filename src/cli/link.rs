//! qtree link command implementations

use serde::Serialize;

use crate::cli::{push_write_warnings, with_session, GlobalOptions};
use crate::error::{Error, Result};
use crate::links::LinkOutcome;
use crate::model::QuestLink;
use crate::output::{emit_success, HumanOutput};

/// Options for `qtree link add`
pub struct AddOptions {
    pub parent: String,
    pub child: String,
    pub tree: Option<String>,
    pub global: GlobalOptions,
}

/// Options for `qtree link rm`
pub struct RmOptions {
    pub parent: String,
    pub child: String,
    pub tree: Option<String>,
    pub yes: bool,
    pub global: GlobalOptions,
}

#[derive(Serialize)]
struct RemoveReport {
    link: QuestLink,
    removed: bool,
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let (outcome, writes) = with_session(&options.global, options.tree.as_deref(), |session| {
        let parent_id = session.resolve_quest(&options.parent)?;
        let child_id = session.resolve_quest(&options.child)?;
        Ok(session.connect(&parent_id, &child_id))
    })?;

    let mut human = match &outcome {
        LinkOutcome::Created { link, evicted } => {
            let mut human = HumanOutput::new("qtree link add: linked");
            human.push_summary("parent", link.parent_id.clone());
            human.push_summary("child", link.child_id.clone());
            if let Some(reverse) = evicted {
                human.push_warning(format!(
                    "replaced reverse link {} -> {}",
                    reverse.parent_id, reverse.child_id
                ));
            }
            human
        }
        LinkOutcome::AlreadyExists { link } => {
            let mut human = HumanOutput::new("qtree link add: nothing to do");
            human.push_summary("parent", link.parent_id.clone());
            human.push_summary("child", link.child_id.clone());
            human.push_warning("link already exists");
            human
        }
        LinkOutcome::Rejected { rejection } => {
            return Err(Error::Rejected(rejection.to_string()));
        }
    };
    push_write_warnings(&mut human, &writes);
    human.push_next_step("qtree quest ls");

    emit_success(options.global.output(), "link add", &outcome, Some(&human))
}

pub fn run_rm(options: RmOptions) -> Result<()> {
    let (report, writes) = with_session(&options.global, options.tree.as_deref(), |session| {
        let parent_id = session.graph().resolve_id(&options.parent)?;
        let child_id = session.graph().resolve_id(&options.child)?;
        let exists = session.graph().has_link(&parent_id, &child_id);

        session.request_delete_link(&parent_id, &child_id);
        if !options.yes {
            session.cancel_deletion();
            return Err(Error::ConfirmationRequired(format!(
                "delete link {parent_id} -> {child_id}"
            )));
        }
        session.confirm_deletion();
        Ok(RemoveReport {
            link: QuestLink::new(parent_id, child_id),
            removed: exists,
        })
    })?;

    let header = if report.removed {
        "qtree link rm: removed"
    } else {
        "qtree link rm: nothing to do"
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("parent", report.link.parent_id.clone());
    human.push_summary("child", report.link.child_id.clone());
    push_write_warnings(&mut human, &writes);

    emit_success(options.global.output(), "link rm", &report, Some(&human))
}
