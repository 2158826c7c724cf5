//! `terraform plan` output.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use tfwrap_runner::ExecutionResult;

use super::json_ui::{UiStream, PLANNED_CHANGE};
use super::{diagnostics, parse_error, raw_output, strip_ansi};
use crate::command::{ParseStrategy, PreparedCommand};
use crate::error::TerraformResult;
use crate::result::{ChangeAction, PlanResult, ResourceChange, ResultSource};

/// Compiled patterns for human-readable plan output.
struct TextPatterns {
    resource: Regex,
    summary: Regex,
    no_changes: Regex,
}

static PATTERNS: LazyLock<TextPatterns> = LazyLock::new(|| TextPatterns {
    resource: Regex::new(
        r"^\s*#\s+(?P<addr>.+?)(?:\s+\(deposed object \w+\))?\s+(?P<tainted>is tainted, so\s+)?(?:will|must) be\s+(?P<action>created|updated|destroyed|replaced|read)",
    )
    .expect("Invalid plan resource regex"),
    summary: Regex::new(
        r"Plan: (?:(?P<import>\d+) to import, )?(?P<add>\d+) to add, (?P<change>\d+) to change, (?P<destroy>\d+) to destroy(?:, (?P<forget>\d+) to forget)?",
    )
    .expect("Invalid plan summary regex"),
    no_changes: Regex::new(r"(?m)^\s*No changes\.").expect("Invalid no-changes regex"),
});

/// Parse plan output produced with an expected exit code.
pub fn parse(execution: &ExecutionResult, prepared: &PreparedCommand) -> TerraformResult<PlanResult> {
    let mut result = match prepared.strategy {
        ParseStrategy::Json => {
            let stream = UiStream::parse(&execution.stdout);
            if stream.is_empty() {
                return Err(parse_error(execution, prepared, "no JSON messages in plan output"));
            }
            from_stream(&stream)
        }
        ParseStrategy::Text => from_text(execution),
    };

    // With -detailed-exitcode the exit code is authoritative.
    if prepared.expects(2) {
        result.has_changes = execution.exit_code == 2;
    }
    result.raw = raw_output(execution);
    Ok(result)
}

fn from_stream(stream: &UiStream) -> PlanResult {
    let mut changes = Vec::new();
    for message in stream.of_kind(PLANNED_CHANGE) {
        let Some(change) = &message.change else {
            continue;
        };
        match ChangeAction::from_ui_action(&change.action) {
            Some(action) => {
                let mut resource = ResourceChange::new(change.resource.addr.clone(), action);
                resource.reason = change.reason.clone();
                changes.push(resource);
            }
            None => warn!(
                "Ignoring planned change for {} with unknown action '{}'",
                change.resource.addr, change.action
            ),
        }
    }

    let mut result = PlanResult {
        changes,
        diagnostics: diagnostics::from_ui_stream(stream),
        source: ResultSource::Json,
        ..Default::default()
    };
    match stream.change_summary() {
        Some(summary) => {
            result.resources_added = summary.add;
            result.resources_changed = summary.change;
            result.resources_destroyed = summary.remove;
            result.resources_imported = summary.import;
            result.resources_forgotten = summary.forget;
        }
        None => count_changes(&mut result),
    }
    result.has_changes =
        result.changes.iter().any(|c| c.action.is_change()) || counted_changes(&result) > 0;
    result
}

/// Import and forget change the state, so Terraform counts them as changes.
fn counted_changes(result: &PlanResult) -> u64 {
    result.resources_added
        + result.resources_changed
        + result.resources_destroyed
        + result.resources_imported
        + result.resources_forgotten
}

fn count_changes(result: &mut PlanResult) {
    for change in &result.changes {
        match change.action {
            ChangeAction::Create => result.resources_added += 1,
            ChangeAction::Update => result.resources_changed += 1,
            ChangeAction::Destroy => result.resources_destroyed += 1,
            ChangeAction::Replace => {
                result.resources_added += 1;
                result.resources_destroyed += 1;
            }
            ChangeAction::Import => result.resources_imported += 1,
            ChangeAction::Forget => result.resources_forgotten += 1,
            _ => {}
        }
    }
}

fn from_text(execution: &ExecutionResult) -> PlanResult {
    let text = strip_ansi(&execution.stdout);
    let patterns = &*PATTERNS;

    let no_changes = patterns.no_changes.is_match(&text);
    let summary = patterns.summary.captures(&text);
    if summary.is_none() && !no_changes {
        return PlanResult::default();
    }

    let mut changes = Vec::new();
    for line in text.lines() {
        let Some(caps) = patterns.resource.captures(line) else {
            continue;
        };
        if let Some(action) = ChangeAction::from_text(&caps["action"]) {
            let mut change = ResourceChange::new(&caps["addr"], action);
            if caps.name("tainted").is_some() {
                change.reason = Some("tainted".to_string());
            }
            changes.push(change);
        }
    }

    let count = |name: &str| -> u64 {
        summary
            .as_ref()
            .and_then(|caps| caps.name(name))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    let mut diagnostics = diagnostics::from_text(&execution.stdout);
    diagnostics.extend(diagnostics::from_text(&execution.stderr));

    let mut result = PlanResult {
        resources_added: count("add"),
        resources_changed: count("change"),
        resources_destroyed: count("destroy"),
        resources_imported: count("import"),
        resources_forgotten: count("forget"),
        changes,
        diagnostics,
        source: ResultSource::Text,
        ..Default::default()
    };
    result.has_changes = !no_changes
        && (counted_changes(&result) > 0 || result.changes.iter().any(|c| c.action.is_change()));
    result
}
