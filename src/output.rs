//! Output shared by every qtree command: human text or a JSON envelope.

use serde::Serialize;

use crate::error::{Error, JsonError, Result};

pub const SCHEMA_VERSION: &str = "qtree.v1";

/// Flags whose value is a separate argument
const VALUE_FLAGS: &[&str] = &["--root", "--tree", "-t", "--category", "-c", "--at"];

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            summary: Vec::new(),
            details: Vec::new(),
            warnings: Vec::new(),
            next_steps: Vec::new(),
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        #[derive(Serialize)]
        struct Envelope<'a, T: Serialize> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            data: &'a T,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            warnings: Vec<String>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data,
            warnings: human.map(|h| h.warnings.clone()).unwrap_or_default(),
            next_steps: human.map(|h| h.next_steps.clone()).unwrap_or_default(),
        };

        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if options.quiet {
        return Ok(());
    }

    if let Some(human) = human {
        println!("{}", format_human(human));
    }

    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    if json {
        #[derive(Serialize)]
        struct ErrorBody {
            #[serde(flatten)]
            error: JsonError,
            kind: &'static str,
        }

        #[derive(Serialize)]
        struct Envelope<'a> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            error: ErrorBody,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "error",
            error: ErrorBody {
                error: JsonError::from(err),
                kind: error_kind(err),
            },
            next_steps,
        };

        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    if let Some(hint) = next_steps.first() {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

pub fn format_human(output: &HumanOutput) -> String {
    let mut lines = vec![output.header.clone()];

    push_summary(&mut lines, &output.summary);
    push_section(&mut lines, "Details", &output.details);
    push_section(&mut lines, "Warnings", &output.warnings);
    push_section(&mut lines, "Next steps", &output.next_steps);

    lines.join("\n")
}

pub fn infer_command_name_from_args() -> String {
    infer_command_name(std::env::args().skip(1))
}

fn next_word(args: &mut impl Iterator<Item = String>) -> Option<String> {
    while let Some(arg) = args.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            args.next();
            continue;
        }
        if arg.starts_with('-') {
            continue;
        }
        return Some(arg);
    }
    None
}

fn infer_command_name(args: impl IntoIterator<Item = String>) -> String {
    let mut args = args.into_iter();

    let command = match next_word(&mut args) {
        Some(cmd) => cmd,
        None => return "qtree".to_string(),
    };

    if matches!(command.as_str(), "category" | "tree" | "quest" | "link") {
        if let Some(sub) = next_word(&mut args) {
            return format!("{command} {sub}");
        }
    }
    command
}

fn error_kind(err: &Error) -> &'static str {
    match err.exit_code() {
        2 => "user_error",
        3 => "rejected",
        _ => "operation_failed",
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    match err {
        Error::NotInitialized(_) => vec!["qtree init".to_string()],
        Error::InvalidConfig(_) => vec!["fix .qtree.toml then retry".to_string()],
        Error::ConfirmationRequired(_) => vec!["re-run with --yes".to_string()],
        Error::QuestNotFound(_) => vec!["qtree quest ls".to_string()],
        Error::TreeNotFound(_) => vec!["qtree tree ls".to_string()],
        Error::CategoryNotFound(_) => vec!["qtree category ls".to_string()],
        Error::LockFailed(_) => vec!["retry once the other qtree process finishes".to_string()],
        _ => Vec::new(),
    }
}

fn push_summary(lines: &mut Vec<String>, summary: &[(String, String)]) {
    if summary.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push("Summary:".to_string());
    for (key, value) in summary {
        if value.is_empty() {
            lines.push(format!("- {key}"));
        } else {
            lines.push(format!("- {key}: {value}"));
        }
    }
}

fn push_section(lines: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push(format!("{title}:"));
    for item in items {
        lines.push(format!("- {item}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_sections_skip_empty() {
        let mut human = HumanOutput::new("qtree quest toggle: completed");
        human.push_summary("quest", "Chop wood");
        human.push_detail("unlocked: Build shed");
        human.push_next_step("qtree quest ls");

        assert_eq!(
            format_human(&human),
            "qtree quest toggle: completed\n\nSummary:\n- quest: Chop wood\n\n\
             Details:\n- unlocked: Build shed\n\nNext steps:\n- qtree quest ls"
        );
        assert_eq!(
            format_human(&HumanOutput::new("qtree init: nothing to do")),
            "qtree init: nothing to do"
        );
    }

    #[test]
    fn command_name_skips_flag_values() {
        let args = |raw: &[&str]| raw.iter().map(|arg| arg.to_string()).collect::<Vec<_>>();
        assert_eq!(infer_command_name(args(&["--root", "/tmp/q", "init"])), "init");
        assert_eq!(
            infer_command_name(args(&["--json", "quest", "--tree", "Main", "toggle", "abcd"])),
            "quest toggle"
        );
        assert_eq!(infer_command_name(args(&[])), "qtree");
    }

    #[test]
    fn error_kinds_follow_exit_codes() {
        assert_eq!(error_kind(&Error::QuestNotFound("q".into())), "user_error");
        assert_eq!(error_kind(&Error::Rejected("no".into())), "rejected");
        assert_eq!(error_kind(&Error::Store("boom".into())), "operation_failed");
        assert_eq!(
            error_next_steps(&Error::NotInitialized(".qtree".into())),
            vec!["qtree init".to_string()]
        );
    }
}
