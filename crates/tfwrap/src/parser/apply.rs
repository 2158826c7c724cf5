//! `terraform apply` and `terraform destroy` output.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use tfwrap_runner::ExecutionResult;

use super::json_ui::{UiStream, APPLY_COMPLETE, OUTPUTS};
use super::{diagnostics, outputs, parse_error, raw_output, strip_ansi};
use crate::command::{ParseStrategy, PreparedCommand};
use crate::error::TerraformResult;
use crate::result::{AppliedChange, ApplyResult, ChangeAction, ResultSource};

struct TextPatterns {
    apply_summary: Regex,
    destroy_summary: Regex,
    completed: Regex,
}

static PATTERNS: LazyLock<TextPatterns> = LazyLock::new(|| TextPatterns {
    apply_summary: Regex::new(
        r"Apply complete! Resources: (?:(?P<import>\d+) imported, )?(?P<add>\d+) added, (?P<change>\d+) changed, (?P<destroy>\d+) destroyed",
    )
    .expect("Invalid apply summary regex"),
    destroy_summary: Regex::new(r"Destroy complete! Resources: (?P<destroy>\d+) destroyed")
        .expect("Invalid destroy summary regex"),
    completed: Regex::new(
        r"^(?P<addr>.+?): (?P<verb>Creation|Modifications|Destruction) complete after \S+(?: \[[^=\]]+=(?P<id>[^\]]*)\])?",
    )
    .expect("Invalid completion line regex"),
});

/// Parse apply or destroy output produced with exit code 0.
pub fn parse(execution: &ExecutionResult, prepared: &PreparedCommand) -> TerraformResult<ApplyResult> {
    let mut result = match prepared.strategy {
        ParseStrategy::Json => {
            let stream = UiStream::parse(&execution.stdout);
            if stream.is_empty() {
                return Err(parse_error(execution, prepared, "no JSON messages in apply output"));
            }
            from_stream(&stream)
        }
        ParseStrategy::Text => from_text(execution),
    };
    result.raw = raw_output(execution);
    Ok(result)
}

/// Whatever completed before a failed apply or destroy. `None` when no
/// resource finished.
pub fn partial(execution: &ExecutionResult, prepared: &PreparedCommand) -> Option<ApplyResult> {
    partial_from_output(&execution.stdout, raw_output(execution), prepared)
}

/// Same as [`partial`] for output captured without an exit, e.g. from a
/// call that was killed on timeout.
pub fn partial_from_output(stdout: &str, raw: String, prepared: &PreparedCommand) -> Option<ApplyResult> {
    let (applied, source) = match prepared.strategy {
        ParseStrategy::Json => (applied_from_stream(&UiStream::parse(stdout)), ResultSource::Json),
        ParseStrategy::Text => (applied_from_text(&strip_ansi(stdout)), ResultSource::Text),
    };
    if applied.is_empty() {
        return None;
    }
    debug!("{} resource(s) completed before the failure", applied.len());

    let mut result = ApplyResult {
        applied,
        source,
        raw,
        ..Default::default()
    };
    count_applied(&mut result);
    Some(result)
}

fn count_applied(result: &mut ApplyResult) {
    for change in &result.applied {
        match change.action {
            ChangeAction::Create => result.resources_added += 1,
            ChangeAction::Update => result.resources_changed += 1,
            ChangeAction::Destroy => result.resources_destroyed += 1,
            ChangeAction::Replace => {
                result.resources_added += 1;
                result.resources_destroyed += 1;
            }
            ChangeAction::Import => result.resources_imported += 1,
            _ => {}
        }
    }
}

fn applied_from_stream(stream: &UiStream) -> Vec<AppliedChange> {
    let mut applied = Vec::new();
    for message in stream.of_kind(APPLY_COMPLETE) {
        let Some(hook) = &message.hook else {
            continue;
        };
        let (Some(resource), Some(action)) = (&hook.resource, &hook.action) else {
            continue;
        };
        match ChangeAction::from_ui_action(action) {
            Some(action) => applied.push(AppliedChange {
                address: resource.addr.clone(),
                action,
                id: hook.id_value.clone(),
            }),
            None => warn!("Ignoring completed {} with unknown action '{}'", resource.addr, action),
        }
    }
    applied
}

fn from_stream(stream: &UiStream) -> ApplyResult {
    let mut result = ApplyResult {
        applied: applied_from_stream(stream),
        diagnostics: diagnostics::from_ui_stream(stream),
        source: ResultSource::Json,
        ..Default::default()
    };

    if let Some(outputs) = stream.of_kind(OUTPUTS).filter_map(|m| m.outputs.as_ref()).last() {
        result.outputs = outputs::from_ui(outputs);
    }

    // apply without a plan file also reports the plan's own summary first.
    let summary = stream
        .messages
        .iter()
        .filter_map(|m| m.changes.as_ref())
        .filter(|s| s.operation.as_deref() != Some("plan"))
        .last();
    match summary {
        Some(summary) => {
            result.resources_added = summary.add;
            result.resources_changed = summary.change;
            result.resources_destroyed = summary.remove;
            result.resources_imported = summary.import;
        }
        None => count_applied(&mut result),
    }
    result
}

fn applied_from_text(text: &str) -> Vec<AppliedChange> {
    text.lines()
        .filter_map(|line| PATTERNS.completed.captures(line))
        .map(|caps| AppliedChange {
            address: caps["addr"].to_string(),
            action: match &caps["verb"] {
                "Creation" => ChangeAction::Create,
                "Modifications" => ChangeAction::Update,
                _ => ChangeAction::Destroy,
            },
            id: caps.name("id").map(|m| m.as_str().to_string()),
        })
        .collect()
}

fn from_text(execution: &ExecutionResult) -> ApplyResult {
    let text = strip_ansi(&execution.stdout);
    let patterns = &*PATTERNS;

    let count = |caps: &regex::Captures<'_>, name: &str| -> u64 {
        caps.name(name)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };

    let mut result = if let Some(caps) = patterns.apply_summary.captures(&text) {
        ApplyResult {
            resources_added: count(&caps, "add"),
            resources_changed: count(&caps, "change"),
            resources_destroyed: count(&caps, "destroy"),
            resources_imported: count(&caps, "import"),
            ..Default::default()
        }
    } else if let Some(caps) = patterns.destroy_summary.captures(&text) {
        ApplyResult {
            resources_destroyed: count(&caps, "destroy"),
            ..Default::default()
        }
    } else {
        return ApplyResult::default();
    };

    result.applied = applied_from_text(&text);
    if let Some(index) = text.lines().position(|line| line.trim() == "Outputs:") {
        let section: Vec<&str> = text.lines().skip(index + 1).collect();
        result.outputs = outputs::from_text(&section.join("\n"));
    }
    result.diagnostics = diagnostics::from_text(&execution.stdout);
    result.diagnostics.extend(diagnostics::from_text(&execution.stderr));
    result.source = ResultSource::Text;
    result
}
