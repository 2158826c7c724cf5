//! # tfwrap_runner
//!
//! Subprocess execution layer for tfwrap.
//!
//! This crate launches one child process per [`Invocation`], captures its
//! stdout and stderr independently, enforces an optional timeout and hands
//! each output line to an optional callback as it arrives. It knows nothing
//! about Terraform; the `tfwrap` crate builds the invocations.
//!
//! # Features
//!
//! - **Immutable invocations**: built once through [`InvocationBuilder`]
//! - **Environment overlay**: merged over the inherited environment, or isolated
//! - **Inline streaming**: the line callback runs on the caller's thread
//! - **Timeouts**: the child is killed and reaped, partial output is kept
//! - **Mock Runner**: scripted responses for tests without real processes
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use tfwrap_runner::{Invocation, ProcessRunner, SubprocessRunner};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let invocation = Invocation::builder("terraform")
//!         .arg("version")
//!         .working_dir("./infra")
//!         .env("TF_IN_AUTOMATION", "1")
//!         .timeout(Duration::from_secs(30))
//!         .build();
//!
//!     let mut on_line = |line: &tfwrap_runner::LogLine| println!("[{}] {}", line.stream, line.message);
//!     let result = SubprocessRunner::new().run(&invocation, Some(&mut on_line))?;
//!     println!("Exit code: {}", result.exit_code);
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod invocation;
pub mod mock;
pub mod runner;
pub mod subprocess;

pub use error::{RunnerError, RunnerResult};
pub use invocation::{Invocation, InvocationBuilder};
pub use mock::{MockResponse, MockRunner};
pub use runner::{ExecutionResult, LogHandler, LogLine, LogStream, ProcessRunner};
pub use subprocess::SubprocessRunner;
