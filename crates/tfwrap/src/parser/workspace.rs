//! `terraform workspace` output.

use std::sync::LazyLock;

use regex::Regex;

use tfwrap_runner::ExecutionResult;

use super::{raw_output, strip_ansi};
use crate::command::{PreparedCommand, Subcommand};
use crate::error::TerraformResult;
use crate::result::{ResultSource, WorkspaceAction, WorkspaceListResult, WorkspaceResult};

struct TextPatterns {
    created: Regex,
    selected: Regex,
    deleted: Regex,
}

static PATTERNS: LazyLock<TextPatterns> = LazyLock::new(|| TextPatterns {
    created: Regex::new(r#"Created and switched to workspace "(?P<name>[^"]+)"!"#)
        .expect("Invalid workspace created regex"),
    selected: Regex::new(r#"Switched to workspace "(?P<name>[^"]+)"\."#)
        .expect("Invalid workspace selected regex"),
    deleted: Regex::new(r#"Deleted workspace "(?P<name>[^"]+)"!"#).expect("Invalid workspace deleted regex"),
});

/// `workspace list` marks the current workspace with `*`.
pub fn parse_list(execution: &ExecutionResult, _prepared: &PreparedCommand) -> TerraformResult<WorkspaceListResult> {
    let text = strip_ansi(&execution.stdout);
    let mut result = WorkspaceListResult {
        source: ResultSource::Text,
        raw: raw_output(execution),
        ..Default::default()
    };

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let name = match line.strip_prefix('*') {
            Some(current) => {
                let current = current.trim();
                result.current = Some(current.to_string());
                current
            }
            None => line,
        };
        result.workspaces.push(name.to_string());
    }
    Ok(result)
}

pub fn parse_show(execution: &ExecutionResult, _prepared: &PreparedCommand) -> TerraformResult<WorkspaceResult> {
    let text = strip_ansi(&execution.stdout);
    let name = text.trim();
    Ok(WorkspaceResult {
        name: name.to_string(),
        action: WorkspaceAction::Current,
        source: if name.is_empty() || name.contains('\n') {
            ResultSource::Raw
        } else {
            ResultSource::Text
        },
        raw: raw_output(execution),
    })
}

/// `workspace new`, `select` (including `-or-create`) and `delete`.
pub fn parse_change(execution: &ExecutionResult, prepared: &PreparedCommand) -> TerraformResult<WorkspaceResult> {
    let text = strip_ansi(&execution.stdout);
    let patterns = &*PATTERNS;
    let requested = prepared.args().last().cloned().unwrap_or_default();

    let candidates: Vec<(&Regex, WorkspaceAction)> = match prepared.subcommand {
        Subcommand::WorkspaceNew => vec![(&patterns.created, WorkspaceAction::Created)],
        Subcommand::WorkspaceDelete => vec![(&patterns.deleted, WorkspaceAction::Deleted)],
        _ => vec![
            (&patterns.created, WorkspaceAction::Created),
            (&patterns.selected, WorkspaceAction::Selected),
        ],
    };

    for (pattern, action) in candidates {
        if let Some(caps) = pattern.captures(&text) {
            return Ok(WorkspaceResult {
                name: caps["name"].to_string(),
                action,
                source: ResultSource::Text,
                raw: raw_output(execution),
            });
        }
    }

    let action = match prepared.subcommand {
        Subcommand::WorkspaceNew => WorkspaceAction::Created,
        Subcommand::WorkspaceDelete => WorkspaceAction::Deleted,
        _ => WorkspaceAction::Selected,
    };
    Ok(WorkspaceResult {
        name: requested,
        action,
        source: ResultSource::Raw,
        raw: raw_output(execution),
    })
}
