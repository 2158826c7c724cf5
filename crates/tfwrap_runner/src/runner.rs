//! Process runner trait and types.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::RunnerResult;
use crate::invocation::Invocation;

/// Result of one subprocess execution.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    /// The invocation that produced this result
    pub invocation: Invocation,
    /// Exit code (-1 when the process was ended by a signal)
    pub exit_code: i64,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
    /// Execution start time
    pub started_at: DateTime<Utc>,
    /// Execution end time
    pub finished_at: DateTime<Utc>,
    /// Wall-clock duration
    pub duration: Duration,
}

impl ExecutionResult {
    /// Check if execution was successful (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Get combined output (stdout + stderr).
    pub fn combined_output(&self) -> String {
        if self.stdout.is_empty() {
            self.stderr.clone()
        } else if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Output stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    Stdout,
    Stderr,
}

impl std::fmt::Display for LogStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdout => write!(f, "stdout"),
            Self::Stderr => write!(f, "stderr"),
        }
    }
}

/// One line of process output, delivered as it arrives.
#[derive(Debug, Clone, Serialize)]
pub struct LogLine {
    pub timestamp: DateTime<Utc>,
    pub stream: LogStream,
    pub message: String,
}

impl LogLine {
    pub fn new(stream: LogStream, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            stream,
            message: message.into(),
        }
    }
}

/// Shareable log handler callback type.
pub type LogHandler = Arc<dyn Fn(&LogLine) + Send + Sync>;

/// Process runner trait.
///
/// Implementations execute exactly one process per call and return only
/// after it has exited and been reaped. The optional `on_line` callback is
/// invoked synchronously, on the calling thread, once per output line.
pub trait ProcessRunner: Send + Sync {
    /// Run the invocation to completion (or timeout).
    fn run(
        &self,
        invocation: &Invocation,
        on_line: Option<&mut dyn FnMut(&LogLine)>,
    ) -> RunnerResult<ExecutionResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(stdout: &str, stderr: &str, exit_code: i64) -> ExecutionResult {
        let now = Utc::now();
        ExecutionResult {
            invocation: Invocation::builder("terraform").build(),
            exit_code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            started_at: now,
            finished_at: now,
            duration: Duration::ZERO,
        }
    }

    #[test]
    fn test_combined_output() {
        assert_eq!(result("out", "", 0).combined_output(), "out");
        assert_eq!(result("", "err", 1).combined_output(), "err");
        assert_eq!(result("out", "err", 1).combined_output(), "out\nerr");
    }

    #[test]
    fn test_success() {
        assert!(result("", "", 0).success());
        assert!(!result("", "", 2).success());
    }
}
