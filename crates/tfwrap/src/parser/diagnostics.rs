//! Diagnostics from JSON messages and from human-readable error blocks.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::json_ui::{UiStream, DIAGNOSTIC};
use super::strip_ansi;
use crate::result::{Diagnostic, Severity, SourcePosition, SourceRange};

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(Error|Warning): (.*)$").expect("Invalid diagnostic header regex")
});

static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+on (?P<file>.+?) line (?P<line>\d+)(?:, in .+)?:$")
        .expect("Invalid diagnostic range regex")
});

#[derive(Debug, Clone, Deserialize)]
pub struct JsonPosition {
    pub line: u32,
    #[serde(default)]
    pub column: u32,
    #[serde(default)]
    pub byte: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonRange {
    pub filename: String,
    pub start: JsonPosition,
    #[serde(default)]
    pub end: Option<JsonPosition>,
}

/// A diagnostic as Terraform serializes it in JSON output.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonDiagnostic {
    pub severity: String,
    pub summary: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub range: Option<JsonRange>,
}

impl From<&JsonPosition> for SourcePosition {
    fn from(pos: &JsonPosition) -> Self {
        Self {
            line: pos.line,
            column: pos.column,
        }
    }
}

impl From<JsonDiagnostic> for Diagnostic {
    fn from(diag: JsonDiagnostic) -> Self {
        // Anything that is not an explicit error is reported as a warning.
        let severity = if diag.severity == "error" {
            Severity::Error
        } else {
            Severity::Warning
        };
        Self {
            severity,
            summary: diag.summary,
            detail: diag.detail,
            range: diag.range.map(|range| SourceRange {
                filename: range.filename,
                start: SourcePosition::from(&range.start),
                end: range.end.as_ref().map(SourcePosition::from),
            }),
        }
    }
}

/// Diagnostics carried by `diagnostic` messages of a UI stream.
pub fn from_json_stream(stdout: &str) -> Vec<Diagnostic> {
    from_ui_stream(&UiStream::parse(stdout))
}

pub fn from_ui_stream(stream: &UiStream) -> Vec<Diagnostic> {
    stream
        .of_kind(DIAGNOSTIC)
        .filter_map(|m| m.diagnostic.clone())
        .map(Diagnostic::from)
        .collect()
}

#[derive(Deserialize)]
struct DiagnosticsDocument {
    #[serde(default)]
    diagnostics: Vec<JsonDiagnostic>,
}

/// Diagnostics of a single JSON document such as `validate -json` output.
pub fn from_json_document(stdout: &str) -> Vec<Diagnostic> {
    serde_json::from_str::<DiagnosticsDocument>(stdout.trim())
        .map(|doc| doc.diagnostics.into_iter().map(Diagnostic::from).collect())
        .unwrap_or_default()
}

struct Pending {
    severity: Severity,
    summary: String,
    range: Option<SourceRange>,
    detail: Vec<String>,
}

impl Pending {
    fn finish(self) -> Diagnostic {
        Diagnostic {
            severity: self.severity,
            summary: self.summary,
            detail: self.detail.join("\n").trim().to_string(),
            range: self.range,
        }
    }
}

/// Strip the box drawing Terraform 1.x puts around diagnostics.
/// Returns `None` for the box's opening and closing lines.
fn unbox(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with('╷') || trimmed.starts_with('╵') {
        return None;
    }
    match trimmed.strip_prefix('│') {
        Some(rest) => Some(rest.strip_prefix(' ').unwrap_or(rest)),
        None => Some(line),
    }
}

/// Parse `Error: …` / `Warning: …` blocks from human-readable output.
pub fn from_text(text: &str) -> Vec<Diagnostic> {
    let text = strip_ansi(text);
    let mut diagnostics = Vec::new();
    let mut current: Option<Pending> = None;

    for raw_line in text.lines() {
        let Some(line) = unbox(raw_line) else {
            diagnostics.extend(current.take().map(Pending::finish));
            continue;
        };

        if let Some(caps) = HEADER_RE.captures(line) {
            diagnostics.extend(current.take().map(Pending::finish));
            current = Some(Pending {
                severity: if &caps[1] == "Error" {
                    Severity::Error
                } else {
                    Severity::Warning
                },
                summary: caps[2].trim().to_string(),
                range: None,
                detail: Vec::new(),
            });
            continue;
        }

        let Some(pending) = current.as_mut() else {
            continue;
        };

        if line.starts_with('─') {
            diagnostics.extend(current.take().map(Pending::finish));
        } else if let Some(caps) = RANGE_RE.captures(line) {
            if pending.range.is_none() {
                pending.range = Some(SourceRange {
                    filename: caps["file"].to_string(),
                    start: SourcePosition {
                        line: caps["line"].parse().unwrap_or(0),
                        column: 0,
                    },
                    end: None,
                });
            }
        } else if !line.starts_with(char::is_whitespace) {
            // Indented lines are source snippets and expression values.
            pending.detail.push(line.trim_end().to_string());
        } else if line.trim().is_empty() {
            pending.detail.push(String::new());
        }
    }
    diagnostics.extend(current.take().map(Pending::finish));
    diagnostics
}
