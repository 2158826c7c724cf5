//! Error types for the runner module.

use std::time::Duration;

use thiserror::Error;

use crate::invocation::Invocation;
use crate::runner::LogStream;

/// Result type alias for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;

/// Errors that can occur while running a subprocess.
#[derive(Error, Debug)]
pub enum RunnerError {
    /// The program could not be started (not found, permission denied, bad cwd).
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        invocation: Box<Invocation>,
        #[source]
        source: std::io::Error,
    },

    /// The process outlived its timeout and was killed.
    #[error("Process timed out after {timeout:?}: {}", invocation.command_line())]
    Timeout {
        timeout: Duration,
        invocation: Box<Invocation>,
        stdout: String,
        stderr: String,
    },

    /// Reading a pipe failed. The child was killed; output read so far is kept.
    #[error("Failed reading {stream} of {}: {source}", invocation.command_line())]
    Read {
        stream: LogStream,
        invocation: Box<Invocation>,
        stdout: String,
        stderr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Child process has no {0} pipe")]
    MissingPipe(&'static str),

    #[error("Failed to start I/O runtime: {0}")]
    Runtime(std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunnerError {
    /// The invocation that failed, when the error carries one.
    pub fn invocation(&self) -> Option<&Invocation> {
        match self {
            Self::Spawn { invocation, .. }
            | Self::Timeout { invocation, .. }
            | Self::Read { invocation, .. } => Some(invocation),
            _ => None,
        }
    }
}
