//! Error types for the Terraform wrapper.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use tfwrap_runner::{ExecutionResult, Invocation, RunnerError};

use crate::result::{Diagnostic, OperationResult};
use crate::version::TerraformVersion;

/// Result type alias for Terraform operations.
pub type TerraformResult<T> = Result<T, TerraformError>;

/// Everything needed to reproduce a failed call: the exact invocation and
/// whatever the process printed before it failed.
#[derive(Debug, Clone, Serialize)]
pub struct FailureContext {
    pub command_line: String,
    pub invocation: Invocation,
    pub exit_code: Option<i64>,
    pub stdout: String,
    pub stderr: String,
}

impl FailureContext {
    pub fn from_execution(execution: &ExecutionResult) -> Self {
        Self {
            command_line: execution.invocation.command_line(),
            invocation: execution.invocation.clone(),
            exit_code: Some(execution.exit_code),
            stdout: execution.stdout.clone(),
            stderr: execution.stderr.clone(),
        }
    }

    pub fn from_invocation(
        invocation: &Invocation,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            command_line: invocation.command_line(),
            invocation: invocation.clone(),
            exit_code: None,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Stdout and stderr joined the way results keep their `raw` output.
    pub fn combined_output(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (true, _) => self.stderr.clone(),
            (false, true) => self.stdout.clone(),
            (false, false) => format!("{}\n{}", self.stdout, self.stderr),
        }
    }
}

/// Errors that can occur while driving Terraform.
#[derive(Error, Debug)]
pub enum TerraformError {
    /// The binary could not be launched (not found, permission denied).
    #[error("Failed to launch {program}: {source}")]
    Invocation {
        program: String,
        invocation: Box<Invocation>,
        #[source]
        source: std::io::Error,
    },

    /// The process was killed after exceeding its timeout. An apply or
    /// destroy keeps what completed before the kill in `partial`.
    #[error("Terraform timed out after {timeout:?}: {}", .context.command_line)]
    ExecutionTimeout {
        timeout: Duration,
        partial: Option<Box<OperationResult>>,
        context: Box<FailureContext>,
    },

    /// An option needs a newer Terraform than the one detected.
    #[error("Option '{option}' ({flag}) requires Terraform {required} or newer, detected {detected}")]
    UnsupportedOption {
        option: &'static str,
        flag: &'static str,
        required: TerraformVersion,
        detected: TerraformVersion,
    },

    /// An option value or combination Terraform would reject.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// Output of an expected exit could not be interpreted.
    #[error("Failed to parse terraform {subcommand} output: {message}")]
    Parse {
        subcommand: String,
        message: String,
        context: Box<FailureContext>,
    },

    #[error("Terraform version detection failed: {message}")]
    VersionDetection {
        message: String,
        context: Option<Box<FailureContext>>,
    },

    /// Terraform ran and exited with a code the subcommand does not expect.
    #[error("terraform {subcommand} exited with code {exit_code}{}", first_error(.diagnostics))]
    Operation {
        subcommand: String,
        exit_code: i64,
        diagnostics: Vec<Diagnostic>,
        partial: Option<Box<OperationResult>>,
        context: Box<FailureContext>,
    },

    #[error("Output '{name}' not found")]
    OutputNotFound {
        name: String,
        context: Box<FailureContext>,
    },

    #[error("Runner error: {0}")]
    Runner(RunnerError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn first_error(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .find(|d| d.is_error())
        .map(|d| format!(": {}", d.summary))
        .unwrap_or_default()
}

impl TerraformError {
    /// Invocation and captured output attached to this error, if any.
    pub fn context(&self) -> Option<&FailureContext> {
        match self {
            Self::ExecutionTimeout { context, .. }
            | Self::Parse { context, .. }
            | Self::Operation { context, .. }
            | Self::OutputNotFound { context, .. } => Some(context),
            Self::VersionDetection { context, .. } => context.as_deref(),
            _ => None,
        }
    }

    /// Partial result of an operation that failed midway (e.g. apply).
    pub fn partial(&self) -> Option<&OperationResult> {
        match self {
            Self::Operation { partial, .. } | Self::ExecutionTimeout { partial, .. } => {
                partial.as_deref()
            }
            _ => None,
        }
    }

    /// Diagnostics reported by Terraform for a failed operation.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Operation { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}

impl From<RunnerError> for TerraformError {
    fn from(err: RunnerError) -> Self {
        match err {
            RunnerError::Spawn {
                program,
                invocation,
                source,
            } => Self::Invocation {
                program,
                invocation,
                source,
            },
            RunnerError::Timeout {
                timeout,
                invocation,
                stdout,
                stderr,
            } => Self::ExecutionTimeout {
                timeout,
                partial: None,
                context: Box::new(FailureContext::from_invocation(&invocation, stdout, stderr)),
            },
            other => Self::Runner(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::Severity;

    #[test]
    fn test_timeout_maps_to_execution_timeout() {
        let invocation = Invocation::builder("terraform").arg("apply").build();
        let err = TerraformError::from(RunnerError::Timeout {
            timeout: Duration::from_secs(1),
            invocation: Box::new(invocation),
            stdout: "partial".to_string(),
            stderr: String::new(),
        });

        assert!(matches!(err, TerraformError::ExecutionTimeout { .. }));
        let context = err.context().unwrap();
        assert_eq!(context.stdout, "partial");
        assert_eq!(context.command_line, "terraform apply");
        assert!(err.partial().is_none());
    }

    #[test]
    fn test_context_combined_output() {
        let invocation = Invocation::builder("terraform").build();
        assert_eq!(FailureContext::from_invocation(&invocation, "out", "").combined_output(), "out");
        assert_eq!(FailureContext::from_invocation(&invocation, "", "err").combined_output(), "err");
        assert_eq!(
            FailureContext::from_invocation(&invocation, "out", "err").combined_output(),
            "out\nerr"
        );
    }

    #[test]
    fn test_spawn_maps_to_invocation() {
        let err = TerraformError::from(RunnerError::Spawn {
            program: "terraform".to_string(),
            invocation: Box::new(Invocation::builder("terraform").build()),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        });

        assert!(matches!(err, TerraformError::Invocation { .. }));
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_operation_message_includes_first_error() {
        let invocation = Invocation::builder("terraform").arg("plan").build();
        let err = TerraformError::Operation {
            subcommand: "plan".to_string(),
            exit_code: 1,
            diagnostics: vec![
                Diagnostic::new(Severity::Warning, "Deprecated", ""),
                Diagnostic::new(Severity::Error, "Missing required argument", ""),
            ],
            partial: None,
            context: Box::new(FailureContext::from_invocation(&invocation, "", "")),
        };

        assert_eq!(
            err.to_string(),
            "terraform plan exited with code 1: Missing required argument"
        );
        assert_eq!(err.diagnostics().len(), 2);
    }
}
