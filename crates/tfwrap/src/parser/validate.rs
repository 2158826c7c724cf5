//! `terraform validate` output.

use serde::Deserialize;

use tfwrap_runner::ExecutionResult;

use super::diagnostics::{self, JsonDiagnostic};
use super::{operation_error, parse_error, raw_output, strip_ansi};
use crate::command::{ParseStrategy, PreparedCommand};
use crate::error::TerraformResult;
use crate::result::{Diagnostic, ResultSource, Severity, ValidateResult};

#[derive(Deserialize)]
struct ValidateDocument {
    valid: bool,
    #[serde(default)]
    error_count: u64,
    #[serde(default)]
    warning_count: u64,
    #[serde(default)]
    diagnostics: Vec<JsonDiagnostic>,
}

/// Parse validate output. Exit code 1 is an invalid configuration, not a
/// failure, as long as the output explains why.
pub fn parse(execution: &ExecutionResult, prepared: &PreparedCommand) -> TerraformResult<ValidateResult> {
    match prepared.strategy {
        ParseStrategy::Json => from_json(execution, prepared),
        ParseStrategy::Text => from_text(execution, prepared),
    }
}

fn from_json(execution: &ExecutionResult, prepared: &PreparedCommand) -> TerraformResult<ValidateResult> {
    let doc: ValidateDocument = match serde_json::from_str(execution.stdout.trim()) {
        Ok(doc) => doc,
        // Exit 1 without a document means validate itself failed (e.g. no init).
        Err(_) if execution.exit_code != 0 => return Err(operation_error(execution, prepared, None)),
        Err(e) => return Err(parse_error(execution, prepared, format!("invalid validate document: {}", e))),
    };

    Ok(ValidateResult {
        valid: doc.valid,
        error_count: doc.error_count,
        warning_count: doc.warning_count,
        diagnostics: doc.diagnostics.into_iter().map(Diagnostic::from).collect(),
        source: ResultSource::Json,
        raw: raw_output(execution),
    })
}

fn from_text(execution: &ExecutionResult, prepared: &PreparedCommand) -> TerraformResult<ValidateResult> {
    let mut found: Vec<Diagnostic> = diagnostics::from_text(&execution.stdout);
    found.extend(diagnostics::from_text(&execution.stderr));

    let count = |severity: Severity| found.iter().filter(|d| d.severity == severity).count() as u64;
    let error_count = count(Severity::Error);
    let warning_count = count(Severity::Warning);

    if execution.exit_code != 0 && error_count == 0 {
        return Err(operation_error(execution, prepared, None));
    }

    let success = strip_ansi(&execution.stdout).contains("Success!");
    let source = if success || !found.is_empty() {
        ResultSource::Text
    } else {
        ResultSource::Raw
    };

    Ok(ValidateResult {
        valid: execution.exit_code == 0,
        error_count,
        warning_count,
        diagnostics: found,
        source,
        raw: raw_output(execution),
    })
}
