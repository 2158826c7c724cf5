//! Subprocess runner backed by real child processes.
//!
//! Each call owns a current-thread tokio runtime that multiplexes the
//! stdout pipe, the stderr pipe, the child's exit and the deadline in one
//! `select!` loop. Line callbacks therefore fire on the caller's thread and
//! no background threads are created.

use std::process::Stdio;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::error::{RunnerError, RunnerResult};
use crate::invocation::Invocation;
use crate::runner::{ExecutionResult, LogLine, LogStream, ProcessRunner};

/// Runner that launches real child processes.
///
/// On Unix the child leads its own process group, so a timeout kills the
/// plugin processes Terraform started along with Terraform itself. The
/// group also means a terminal Ctrl-C no longer reaches the child directly.
#[derive(Debug, Clone, Default)]
pub struct SubprocessRunner;

impl SubprocessRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(invocation: &Invocation) -> Command {
        let mut cmd = std::process::Command::new(invocation.program());
        cmd.args(invocation.args())
            .current_dir(invocation.working_dir())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        if invocation.isolate_env() {
            cmd.env_clear();
        }
        cmd.envs(invocation.env());

        let mut cmd = Command::from(cmd);
        cmd.kill_on_drop(true);
        cmd
    }

    /// Decode one raw line, append it to its buffer and hand it to the
    /// callback. Invalid UTF-8 is replaced, never dropped.
    fn capture(
        stream: LogStream,
        pending: &mut Vec<u8>,
        buffer: &mut String,
        on_line: &mut Option<&mut dyn FnMut(&LogLine)>,
    ) {
        if pending.last() == Some(&b'\n') {
            pending.pop();
            if pending.last() == Some(&b'\r') {
                pending.pop();
            }
        }
        let line = String::from_utf8_lossy(pending).into_owned();
        pending.clear();

        buffer.push_str(&line);
        buffer.push('\n');
        if let Some(handler) = on_line.as_deref_mut() {
            handler(&LogLine::new(stream, line));
        }
    }

    /// Kill the child and everything in its process group, then reap it.
    /// `pid` is taken at spawn because `Child::id` is gone once the child
    /// has been reaped, while plugins in its group may still hold the pipes.
    async fn terminate(child: &mut Child, pid: Option<u32>) {
        #[cfg(unix)]
        {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = pid {
                match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                    Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
                    Err(e) => warn!("Failed to kill process group {}: {}", pid, e),
                }
            }
        }
        #[cfg(not(unix))]
        let _ = pid;

        if let Ok(Some(_)) = child.try_wait() {
            return;
        }
        // kill() waits after signalling, so the child is reaped here.
        if let Err(e) = child.kill().await {
            error!("Failed to kill process: {}", e);
        }
    }

    async fn execute(
        &self,
        invocation: &Invocation,
        mut on_line: Option<&mut dyn FnMut(&LogLine)>,
    ) -> RunnerResult<ExecutionResult> {
        debug!("Executing: {}", invocation.command_line());

        let started_at = Utc::now();
        let start = Instant::now();

        let mut child = Self::command(invocation)
            .spawn()
            .map_err(|source| RunnerError::Spawn {
                program: invocation.program().display().to_string(),
                invocation: Box::new(invocation.clone()),
                source,
            })?;
        let pid = child.id();

        let stdout = child.stdout.take().ok_or(RunnerError::MissingPipe("stdout"))?;
        let stderr = child.stderr.take().ok_or(RunnerError::MissingPipe("stderr"))?;
        let mut stdout = BufReader::new(stdout);
        let mut stderr = BufReader::new(stderr);

        // read_until keeps partial bytes in these across select! iterations.
        let mut stdout_pending = Vec::new();
        let mut stderr_pending = Vec::new();
        let mut stdout_buf = String::new();
        let mut stderr_buf = String::new();
        let mut stdout_open = true;
        let mut stderr_open = true;
        let mut exit_status = None;

        let deadline = invocation.timeout().map(|timeout| start + timeout);
        let timer = async move {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(timer);

        let status = loop {
            if let Some(status) = exit_status {
                if !stdout_open && !stderr_open {
                    break status;
                }
            }

            let read = tokio::select! {
                read = stdout.read_until(b'\n', &mut stdout_pending), if stdout_open => {
                    (LogStream::Stdout, read)
                },
                read = stderr.read_until(b'\n', &mut stderr_pending), if stderr_open => {
                    (LogStream::Stderr, read)
                },
                status = child.wait(), if exit_status.is_none() => {
                    exit_status = Some(status?);
                    continue;
                },
                _ = &mut timer => {
                    let timeout = invocation.timeout().unwrap_or_default();
                    warn!(
                        "Process exceeded timeout of {:?}, killing: {}",
                        timeout,
                        invocation.command_line()
                    );
                    Self::terminate(&mut child, pid).await;
                    return Err(RunnerError::Timeout {
                        timeout,
                        invocation: Box::new(invocation.clone()),
                        stdout: stdout_buf,
                        stderr: stderr_buf,
                    });
                }
            };

            let (pending, buffer, open) = match read.0 {
                LogStream::Stdout => (&mut stdout_pending, &mut stdout_buf, &mut stdout_open),
                LogStream::Stderr => (&mut stderr_pending, &mut stderr_buf, &mut stderr_open),
            };
            match read.1 {
                Ok(0) => *open = false,
                Ok(_) => Self::capture(read.0, pending, buffer, &mut on_line),
                Err(source) => {
                    error!("Failed reading {}: {}", read.0, source);
                    Self::terminate(&mut child, pid).await;
                    return Err(RunnerError::Read {
                        stream: read.0,
                        invocation: Box::new(invocation.clone()),
                        stdout: stdout_buf,
                        stderr: stderr_buf,
                        source,
                    });
                }
            }
        };

        let finished_at = Utc::now();
        let duration = start.elapsed();
        let exit_code = status.code().map(i64::from).unwrap_or(-1);

        debug!(
            "Process exited with code {} after {}ms",
            exit_code,
            duration.as_millis()
        );

        Ok(ExecutionResult {
            invocation: invocation.clone(),
            exit_code,
            stdout: stdout_buf,
            stderr: stderr_buf,
            started_at,
            finished_at,
            duration,
        })
    }
}

impl ProcessRunner for SubprocessRunner {
    fn run(
        &self,
        invocation: &Invocation,
        on_line: Option<&mut dyn FnMut(&LogLine)>,
    ) -> RunnerResult<ExecutionResult> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(RunnerError::Runtime)?;

        runtime.block_on(self.execute(invocation, on_line))
    }
}
