//! Parsers turning captured Terraform output into typed results.
//!
//! Each submodule handles one family of subcommands and exposes functions
//! of the shape `fn(&ExecutionResult, &PreparedCommand) -> TerraformResult<T>`
//! for output produced with an expected exit code.

pub mod apply;
pub mod diagnostics;
pub mod init;
pub mod json_ui;
pub mod misc;
pub mod outputs;
pub mod plan;
pub mod refresh;
pub mod show;
pub mod state;
pub mod validate;
pub mod workspace;

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

use tfwrap_runner::ExecutionResult;

use crate::command::{ParseStrategy, PreparedCommand};
use crate::error::{FailureContext, TerraformError};
use crate::result::{Diagnostic, OperationResult};

static ANSI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("Invalid ANSI escape regex")
});

/// Remove ANSI color and cursor sequences.
pub fn strip_ansi(text: &str) -> Cow<'_, str> {
    ANSI_RE.replace_all(text, "")
}

/// Everything Terraform printed, stdout first.
pub(crate) fn raw_output(execution: &ExecutionResult) -> String {
    execution.combined_output()
}

pub(crate) fn parse_error(
    execution: &ExecutionResult,
    prepared: &PreparedCommand,
    message: impl Into<String>,
) -> TerraformError {
    TerraformError::Parse {
        subcommand: prepared.subcommand.to_string(),
        message: message.into(),
        context: Box::new(FailureContext::from_execution(execution)),
    }
}

/// Error for an exit code the subcommand does not expect.
pub(crate) fn operation_error(
    execution: &ExecutionResult,
    prepared: &PreparedCommand,
    partial: Option<OperationResult>,
) -> TerraformError {
    TerraformError::Operation {
        subcommand: prepared.subcommand.to_string(),
        exit_code: execution.exit_code,
        diagnostics: failure_diagnostics(execution, prepared.strategy),
        partial: partial.map(Box::new),
        context: Box::new(FailureContext::from_execution(execution)),
    }
}

/// Diagnostics of a failed run: JSON messages from stdout when the JSON
/// strategy was used, plus text blocks from stderr (or stdout if stderr
/// has none).
pub(crate) fn failure_diagnostics(
    execution: &ExecutionResult,
    strategy: ParseStrategy,
) -> Vec<Diagnostic> {
    let mut found = Vec::new();
    if strategy == ParseStrategy::Json {
        found.extend(diagnostics::from_json_stream(&execution.stdout));
        if found.is_empty() {
            found.extend(diagnostics::from_json_document(&execution.stdout));
        }
    }

    let stderr = diagnostics::from_text(&execution.stderr);
    if !stderr.is_empty() {
        found.extend(stderr);
    } else if found.is_empty() {
        found.extend(diagnostics::from_text(&execution.stdout));
    }
    found
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::Utc;
    use std::time::Duration;

    use tfwrap_runner::{ExecutionResult, Invocation};

    use crate::command::{ParseStrategy, PreparedCommand, Subcommand};

    pub fn execution(exit_code: i64, stdout: &str, stderr: &str) -> ExecutionResult {
        let now = Utc::now();
        ExecutionResult {
            invocation: Invocation::builder("terraform").build(),
            exit_code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            started_at: now,
            finished_at: now,
            duration: Duration::from_millis(10),
        }
    }

    pub fn prepared(subcommand: Subcommand, strategy: ParseStrategy, expected: &[i64]) -> PreparedCommand {
        PreparedCommand {
            subcommand,
            invocation: Invocation::builder("terraform").args(subcommand.tokens().iter().copied()).build(),
            strategy,
            expected_exit_codes: expected.to_vec(),
        }
    }
}
