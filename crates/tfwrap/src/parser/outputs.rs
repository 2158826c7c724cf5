//! Root module outputs from `output -json`, the UI stream and text listings.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use tfwrap_runner::ExecutionResult;

use super::json_ui::UiOutput;
use super::{parse_error, strip_ansi};
use crate::command::{ParseStrategy, PreparedCommand};
use crate::error::{FailureContext, TerraformError, TerraformResult};
use crate::result::{OutputMap, OutputValue};

static OUTPUT_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[A-Za-z_][A-Za-z0-9_-]*)\s*=\s*(?P<value>.*)$")
        .expect("Invalid output line regex")
});

#[derive(Deserialize)]
struct JsonOutput {
    #[serde(default)]
    sensitive: bool,
    #[serde(rename = "type", default)]
    value_type: Option<Value>,
    #[serde(default)]
    value: Value,
}

impl From<JsonOutput> for OutputValue {
    fn from(output: JsonOutput) -> Self {
        Self {
            value: output.value,
            sensitive: output.sensitive,
            value_type: output.value_type,
        }
    }
}

/// Parse `terraform output` produced with an expected exit code.
pub fn parse(execution: &ExecutionResult, prepared: &PreparedCommand) -> TerraformResult<OutputMap> {
    match prepared.strategy {
        ParseStrategy::Json => from_json(&execution.stdout)
            .ok_or_else(|| parse_error(execution, prepared, "output is not a JSON object")),
        ParseStrategy::Text => Ok(from_text(&execution.stdout)),
    }
}

/// Keep only the output called `name`.
pub fn select(
    mut outputs: OutputMap,
    name: &str,
    execution: &ExecutionResult,
) -> TerraformResult<OutputMap> {
    match outputs.remove_entry(name) {
        Some((key, value)) => Ok(BTreeMap::from([(key, value)])),
        None => Err(TerraformError::OutputNotFound {
            name: name.to_string(),
            context: Box::new(FailureContext::from_execution(execution)),
        }),
    }
}

/// `output -json` and `show -json` output maps.
pub fn from_json(stdout: &str) -> Option<OutputMap> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Some(OutputMap::new());
    }
    let outputs: BTreeMap<String, JsonOutput> = serde_json::from_str(trimmed).ok()?;
    Some(outputs.into_iter().map(|(k, v)| (k, v.into())).collect())
}

pub(crate) fn from_json_value(value: &Value) -> OutputMap {
    serde_json::from_value::<BTreeMap<String, JsonOutput>>(value.clone())
        .map(|outputs| outputs.into_iter().map(|(k, v)| (k, v.into())).collect())
        .unwrap_or_default()
}

/// Outputs of an `outputs` UI message. Sensitive values arrive withheld.
pub(crate) fn from_ui(outputs: &BTreeMap<String, UiOutput>) -> OutputMap {
    outputs
        .iter()
        .map(|(name, output)| {
            let value = OutputValue {
                value: output.value.clone().unwrap_or(Value::Null),
                sensitive: output.sensitive,
                value_type: output.value_type.clone(),
            };
            (name.clone(), value)
        })
        .collect()
}

/// Interpret a single-line HCL value. `None` when it opens a multi-line
/// collection or heredoc.
fn scalar(value: &str) -> Option<OutputValue> {
    let value = value.trim();
    if value == "<sensitive>" {
        return Some(OutputValue::sensitive(Value::Null));
    }
    if value.starts_with("<<") || value.ends_with(['[', '{', '(']) {
        return None;
    }
    let parsed = match value {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        quoted if quoted.starts_with('"') => serde_json::from_str(quoted)
            .unwrap_or_else(|_| Value::String(quoted.trim_matches('"').to_string())),
        other => match serde_json::from_str::<serde_json::Number>(other) {
            Ok(number) => Value::Number(number),
            Err(_) => Value::String(other.to_string()),
        },
    };
    Some(OutputValue::new(parsed))
}

enum Skip {
    None,
    Block,
    Heredoc(String),
}

/// Single-line scalar `name = value` lines. Multi-line values are skipped;
/// their text stays available in the raw output.
pub fn from_text(text: &str) -> OutputMap {
    let text = strip_ansi(text);
    let mut outputs = OutputMap::new();
    let mut skip = Skip::None;

    for line in text.lines() {
        match &skip {
            Skip::Block => {
                if line.starts_with([']', '}', ')']) {
                    skip = Skip::None;
                }
                continue;
            }
            Skip::Heredoc(marker) => {
                if line.trim() == marker.as_str() {
                    skip = Skip::None;
                }
                continue;
            }
            Skip::None => {}
        }

        let Some(caps) = OUTPUT_LINE_RE.captures(line) else {
            continue;
        };
        let value = caps["value"].trim();
        match scalar(value) {
            Some(output) => {
                outputs.insert(caps["name"].to_string(), output);
            }
            None => {
                skip = match value.strip_prefix("<<") {
                    Some(marker) => Skip::Heredoc(marker.trim_start_matches('-').to_string()),
                    None => Skip::Block,
                };
            }
        }
    }
    outputs
}
