//! `terraform show` output: JSON state and plan representations.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use tfwrap_runner::ExecutionResult;

use super::{outputs, parse_error, raw_output, strip_ansi};
use crate::command::{ParseStrategy, PreparedCommand};
use crate::error::TerraformResult;
use crate::result::{ChangeAction, ResourceChange, ResultSource, ShowKind, ShowResult, StateResource};

#[derive(Deserialize)]
struct ShowDocument {
    #[serde(default)]
    format_version: Option<String>,
    #[serde(default)]
    terraform_version: Option<String>,
    #[serde(default)]
    values: Option<ValuesDocument>,
    #[serde(default)]
    planned_values: Option<ValuesDocument>,
    #[serde(default)]
    resource_changes: Option<Vec<JsonResourceChange>>,
}

#[derive(Deserialize)]
struct ValuesDocument {
    #[serde(default)]
    outputs: Option<Value>,
    #[serde(default)]
    root_module: Option<ModuleDocument>,
}

#[derive(Deserialize)]
struct ModuleDocument {
    #[serde(default)]
    resources: Vec<JsonResource>,
    #[serde(default)]
    child_modules: Vec<ModuleDocument>,
}

#[derive(Deserialize)]
struct JsonResource {
    address: String,
    #[serde(default)]
    mode: String,
    #[serde(rename = "type", default)]
    resource_type: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    provider_name: Option<String>,
    #[serde(default)]
    index: Option<Value>,
    #[serde(default)]
    values: Option<Value>,
}

#[derive(Deserialize)]
struct JsonResourceChange {
    address: String,
    change: JsonChange,
    #[serde(default)]
    action_reason: Option<String>,
    #[serde(default)]
    previous_address: Option<String>,
}

#[derive(Deserialize)]
struct JsonChange {
    actions: Vec<String>,
    #[serde(default)]
    importing: Option<Value>,
    #[serde(default)]
    before: Option<Value>,
    #[serde(default)]
    after: Option<Value>,
}

/// Parse show output produced with exit code 0.
pub fn parse(execution: &ExecutionResult, prepared: &PreparedCommand) -> TerraformResult<ShowResult> {
    let mut result = match prepared.strategy {
        ParseStrategy::Json => {
            let doc: ShowDocument = serde_json::from_str(execution.stdout.trim())
                .map_err(|e| parse_error(execution, prepared, format!("invalid show document: {}", e)))?;
            from_document(doc)
        }
        ParseStrategy::Text => from_text(&execution.stdout),
    };
    result.raw = raw_output(execution);
    Ok(result)
}

fn flatten(module: ModuleDocument, into: &mut Vec<StateResource>) {
    for resource in module.resources {
        into.push(StateResource {
            address: resource.address,
            mode: resource.mode,
            resource_type: resource.resource_type,
            name: resource.name,
            provider_name: resource.provider_name,
            index: resource.index,
            values: resource.values,
        });
    }
    for child in module.child_modules {
        flatten(child, into);
    }
}

fn from_document(doc: ShowDocument) -> ShowResult {
    let is_plan = doc.resource_changes.is_some() || doc.planned_values.is_some();
    let (kind, values) = if is_plan {
        (ShowKind::Plan, doc.planned_values)
    } else if doc.values.is_some() {
        (ShowKind::State, doc.values)
    } else {
        (ShowKind::Empty, None)
    };

    let mut result = ShowResult {
        kind,
        format_version: doc.format_version,
        terraform_version: doc.terraform_version,
        source: ResultSource::Json,
        ..Default::default()
    };

    if let Some(values) = values {
        if let Some(outputs) = &values.outputs {
            result.outputs = outputs::from_json_value(outputs);
        }
        if let Some(root) = values.root_module {
            flatten(root, &mut result.resources);
        }
    }

    for change in doc.resource_changes.unwrap_or_default() {
        let action = match ChangeAction::from_actions(&change.change.actions) {
            Some(ChangeAction::NoOp) if change.change.importing.is_some() => Some(ChangeAction::Import),
            Some(ChangeAction::NoOp) if change.previous_address.is_some() => Some(ChangeAction::Move),
            other => other,
        };
        match action {
            Some(action) => result.resource_changes.push(ResourceChange {
                address: change.address,
                action,
                reason: change.action_reason,
                before: change.change.before,
                after: change.change.after,
            }),
            None => warn!(
                "Ignoring resource change for {} with unknown actions {:?}",
                change.address, change.change.actions
            ),
        }
    }
    result
}

fn from_text(stdout: &str) -> ShowResult {
    let text = strip_ansi(stdout);
    if text.trim() == "No state." {
        return ShowResult {
            kind: ShowKind::Empty,
            source: ResultSource::Text,
            ..Default::default()
        };
    }
    ShowResult::default()
}
