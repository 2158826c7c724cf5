//! Mock process runner for testing.
//!
//! Provides a configurable implementation of the [`ProcessRunner`] trait
//! for unit tests that must not launch real processes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;

use crate::error::{RunnerError, RunnerResult};
use crate::invocation::Invocation;
use crate::runner::{ExecutionResult, LogLine, LogStream, ProcessRunner};

/// Predefined mock response for a process execution.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub exit_code: i64,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
    /// Report a timeout instead of an exit, carrying stdout/stderr as partial output.
    pub timed_out: bool,
}

impl MockResponse {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            duration_ms: 100,
            timed_out: false,
        }
    }

    pub fn failure(exit_code: i64, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
            duration_ms: 100,
            timed_out: false,
        }
    }

    /// A response with an arbitrary exit code and both streams.
    pub fn exit(exit_code: i64, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            duration_ms: 100,
            timed_out: false,
        }
    }

    pub fn timeout(partial_stdout: impl Into<String>) -> Self {
        Self {
            exit_code: -1,
            stdout: partial_stdout.into(),
            stderr: String::new(),
            duration_ms: 0,
            timed_out: true,
        }
    }

    pub fn with_duration(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }
}

/// Mock process runner for testing.
///
/// Captures every invocation and returns predefined responses in order,
/// wrapping around when the list is exhausted. Stdout lines, then stderr
/// lines, are replayed through the line callback.
#[derive(Clone)]
pub struct MockRunner {
    /// Predefined responses for run calls.
    responses: Arc<RwLock<Vec<MockResponse>>>,
    /// Index of next response to return.
    response_index: Arc<AtomicUsize>,
    /// Captured invocations for verification.
    captured_calls: Arc<RwLock<Vec<Invocation>>>,
    /// Simulated spawn failure message.
    simulate_failure: Arc<RwLock<Option<String>>>,
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRunner {
    /// Create a new mock runner.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(RwLock::new(Vec::new())),
            response_index: Arc::new(AtomicUsize::new(0)),
            captured_calls: Arc::new(RwLock::new(Vec::new())),
            simulate_failure: Arc::new(RwLock::new(None)),
        }
    }

    /// Add a mock response for the next run call.
    pub fn add_response(self, response: MockResponse) -> Self {
        self.responses.write().push(response);
        self
    }

    /// Set multiple responses.
    pub fn with_responses(self, responses: Vec<MockResponse>) -> Self {
        *self.responses.write() = responses;
        self
    }

    /// Make every run fail as if the program could not be spawned.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    /// Clear all captured calls.
    pub fn clear_calls(&self) {
        self.captured_calls.write().clear();
    }

    /// Get all captured invocations.
    pub fn get_calls(&self) -> Vec<Invocation> {
        self.captured_calls.read().clone()
    }

    /// Get the number of calls made.
    pub fn call_count(&self) -> usize {
        self.captured_calls.read().len()
    }

    /// Arguments of the most recent call.
    pub fn last_args(&self) -> Option<Vec<String>> {
        self.captured_calls
            .read()
            .last()
            .map(|invocation| invocation.args().to_vec())
    }

    /// Get the next response.
    fn next_response(&self) -> MockResponse {
        let responses = self.responses.read();
        if responses.is_empty() {
            return MockResponse::success("");
        }
        let index = self.response_index.fetch_add(1, Ordering::SeqCst);
        responses
            .get(index % responses.len())
            .cloned()
            .unwrap_or_else(|| MockResponse::success(""))
    }

    fn replay(response: &MockResponse, on_line: &mut Option<&mut dyn FnMut(&LogLine)>) {
        if let Some(handler) = on_line.as_deref_mut() {
            for line in response.stdout.lines() {
                handler(&LogLine::new(LogStream::Stdout, line));
            }
            for line in response.stderr.lines() {
                handler(&LogLine::new(LogStream::Stderr, line));
            }
        }
    }
}

impl ProcessRunner for MockRunner {
    fn run(
        &self,
        invocation: &Invocation,
        mut on_line: Option<&mut dyn FnMut(&LogLine)>,
    ) -> RunnerResult<ExecutionResult> {
        self.captured_calls.write().push(invocation.clone());

        if let Some(msg) = self.simulate_failure.read().clone() {
            return Err(RunnerError::Spawn {
                program: invocation.program().display().to_string(),
                invocation: Box::new(invocation.clone()),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, msg),
            });
        }

        let response = self.next_response();
        Self::replay(&response, &mut on_line);

        if response.timed_out {
            return Err(RunnerError::Timeout {
                timeout: invocation.timeout().unwrap_or_default(),
                invocation: Box::new(invocation.clone()),
                stdout: response.stdout,
                stderr: response.stderr,
            });
        }

        let started_at = Utc::now();
        let finished_at = started_at + chrono::Duration::milliseconds(response.duration_ms as i64);

        Ok(ExecutionResult {
            invocation: invocation.clone(),
            exit_code: response.exit_code,
            stdout: response.stdout,
            stderr: response.stderr,
            started_at,
            finished_at,
            duration: Duration::from_millis(response.duration_ms),
        })
    }
}
