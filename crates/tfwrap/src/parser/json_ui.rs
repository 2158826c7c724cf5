//! Terraform's machine-readable UI stream.
//!
//! With `-json`, `plan`, `apply`, `destroy`, `refresh` and (1.9+) `init` print one JSON
//! object per line. Only the fields this crate reads are modeled; unknown
//! fields and message types are ignored so newer Terraform releases keep
//! parsing.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::diagnostics::JsonDiagnostic;

pub const PLANNED_CHANGE: &str = "planned_change";
pub const CHANGE_SUMMARY: &str = "change_summary";
pub const OUTPUTS: &str = "outputs";
pub const DIAGNOSTIC: &str = "diagnostic";
pub const APPLY_COMPLETE: &str = "apply_complete";
pub const APPLY_ERRORED: &str = "apply_errored";
pub const REFRESH_COMPLETE: &str = "refresh_complete";

/// One line of the UI stream.
#[derive(Debug, Clone, Deserialize)]
pub struct UiMessage {
    #[serde(rename = "@level", default)]
    pub level: String,
    #[serde(rename = "@message", default)]
    pub message: String,
    #[serde(rename = "@module", default)]
    pub module: Option<String>,
    #[serde(rename = "@timestamp", default)]
    pub timestamp: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub change: Option<UiChange>,
    #[serde(default)]
    pub changes: Option<UiChangeSummary>,
    #[serde(default)]
    pub outputs: Option<BTreeMap<String, UiOutput>>,
    #[serde(default)]
    pub diagnostic: Option<JsonDiagnostic>,
    #[serde(default)]
    pub hook: Option<UiHook>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiResource {
    pub addr: String,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub resource_type: Option<String>,
    #[serde(default)]
    pub resource_name: Option<String>,
    #[serde(default)]
    pub resource_key: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiChange {
    pub resource: UiResource,
    pub action: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub previous_resource: Option<UiResource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UiChangeSummary {
    #[serde(default)]
    pub add: u64,
    #[serde(default)]
    pub change: u64,
    #[serde(default)]
    pub remove: u64,
    #[serde(default)]
    pub import: u64,
    #[serde(default)]
    pub forget: u64,
    /// `plan`, `apply` or `destroy`.
    #[serde(default)]
    pub operation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiOutput {
    #[serde(default)]
    pub sensitive: bool,
    #[serde(rename = "type", default)]
    pub value_type: Option<Value>,
    #[serde(default)]
    pub value: Option<Value>,
    /// Planned action on the output (plan only).
    #[serde(default)]
    pub action: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiHook {
    #[serde(default)]
    pub resource: Option<UiResource>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub id_key: Option<String>,
    #[serde(default)]
    pub id_value: Option<String>,
    #[serde(default)]
    pub elapsed_seconds: Option<f64>,
}

impl UiMessage {
    /// Parse one line; `None` for blank or non-JSON lines.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if !line.starts_with('{') {
            return None;
        }
        serde_json::from_str(line).ok()
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }
}

/// All messages of one captured stream.
#[derive(Debug, Clone, Default)]
pub struct UiStream {
    pub messages: Vec<UiMessage>,
    /// Non-empty lines that were not valid UI messages.
    pub skipped: usize,
}

impl UiStream {
    pub fn parse(stdout: &str) -> Self {
        let mut stream = Self::default();
        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            match UiMessage::parse_line(line) {
                Some(message) => stream.messages.push(message),
                None => stream.skipped += 1,
            }
        }
        if stream.skipped > 0 {
            warn!("Skipped {} unparseable line(s) in JSON output", stream.skipped);
        }
        stream
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a UiMessage> + 'a {
        self.messages.iter().filter(move |m| m.is(kind))
    }

    /// The last `change_summary` message, if any.
    pub fn change_summary(&self) -> Option<&UiChangeSummary> {
        self.of_kind(CHANGE_SUMMARY)
            .filter_map(|m| m.changes.as_ref())
            .last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_planned_change() {
        let line = r#"{"@level":"info","@message":"null_resource.a: Plan to create","@module":"terraform.ui","@timestamp":"2023-08-01T10:00:00.000000Z","change":{"resource":{"addr":"null_resource.a","module":"","resource":"null_resource.a","implied_provider":"null","resource_type":"null_resource","resource_name":"a","resource_key":null},"action":"create"},"type":"planned_change"}"#;

        let message = UiMessage::parse_line(line).unwrap();

        assert!(message.is(PLANNED_CHANGE));
        let change = message.change.unwrap();
        assert_eq!(change.resource.addr, "null_resource.a");
        assert_eq!(change.action, "create");
        assert_eq!(change.resource.resource_type.as_deref(), Some("null_resource"));
    }

    #[test]
    fn test_unknown_fields_and_types_are_kept_generic() {
        let message =
            UiMessage::parse_line(r#"{"@level":"info","@message":"hi","type":"future_thing","extra":{"x":1}}"#)
                .unwrap();
        assert_eq!(message.kind, "future_thing");
        assert!(message.change.is_none());
    }

    #[test]
    fn test_stream_skips_noise() {
        let stream = UiStream::parse(
            "{\"type\":\"version\",\"terraform\":\"1.5.7\"}\nnot json\n\n{\"type\":\"change_summary\",\"changes\":{\"add\":2,\"change\":0,\"remove\":1,\"operation\":\"plan\"}}\n",
        );

        assert_eq!(stream.messages.len(), 2);
        assert_eq!(stream.skipped, 1);
        let summary = stream.change_summary().unwrap();
        assert_eq!(summary.add, 2);
        assert_eq!(summary.remove, 1);
        assert_eq!(summary.operation.as_deref(), Some("plan"));
    }
}
