//! # tfwrap
//!
//! Typed wrapper around the Terraform CLI.
//!
//! This crate turns option structs into exact `terraform` command lines,
//! runs them through a [`ProcessRunner`] and parses what Terraform prints
//! into one result type per subcommand. It prefers Terraform's `-json`
//! output where the detected version offers it and falls back to the
//! human-readable text otherwise.
//!
//! # Features
//!
//! - **Version aware**: detects the Terraform version once and rejects
//!   options it does not support before anything runs
//! - **Deterministic commands**: the same options always give the same argv
//! - **Typed results**: plans, applies, state, outputs and diagnostics
//! - **Streaming**: output lines reach a callback while Terraform runs
//! - **Failure context**: every error carries the invocation and output
//! - **Mock Runner**: scripted Terraform output for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use tfwrap::{ApplyOptions, OutputOptions, PlanOptions, Terraform, TerraformConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = TerraformConfig::new("./infra")
//!         .env("TF_LOG", "WARN")
//!         .timeout_seconds(1800);
//!     let terraform = Terraform::new(config)?;
//!
//!     terraform.init(&Default::default())?;
//!
//!     let plan = terraform.plan(&PlanOptions::new().out("tfplan").detailed_exitcode(true))?;
//!     if plan.has_changes {
//!         let applied = terraform.apply_streaming(
//!             &ApplyOptions::new().plan_file("tfplan"),
//!             &mut |line: &tfwrap::LogLine| println!("{}", line.message),
//!         )?;
//!         println!("{} added, {} changed", applied.resources_added, applied.resources_changed);
//!     }
//!
//!     let outputs = terraform.output(&OutputOptions::new().name("endpoint"))?;
//!     println!("{:?}", outputs["endpoint"].value);
//!
//!     Ok(())
//! }
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod options;
pub mod parser;
pub mod result;
pub mod state;
pub mod terraform;
pub mod version;
pub mod workspace;

pub use command::{CommandBuilder, ParseStrategy, PreparedCommand, Subcommand};
pub use config::TerraformConfig;
pub use error::{FailureContext, TerraformError, TerraformResult};
pub use options::{
    ApplyOptions, DestroyOptions, FmtOptions, GetOptions, GraphOptions, GraphType, ImportOptions,
    InitOptions, OutputOptions, PlanOptions, RefreshOptions, ShowOptions, StateListOptions,
    StateMvOptions, StateReplaceProviderOptions, StateRmOptions, StateShowOptions, TaintOptions,
    Vars,
};
pub use result::{
    AppliedChange, ApplyResult, ChangeAction, Diagnostic, FmtResult, GetResult, GraphResult,
    ImportResult, InitResult, OperationResult, OutputMap, OutputValue, PlanResult,
    ProviderInstall, RefreshResult, ResourceChange, ResultSource, Severity, ShowKind, ShowResult,
    SourcePosition, SourceRange, StateListResult, StateMove, StateMvResult, StatePullResult,
    StateReplaceProviderResult, StateResource, StateRmResult, StateShowResult, TaintResult,
    ValidateResult, WorkspaceAction, WorkspaceListResult, WorkspaceResult,
};
pub use state::StateCommands;
pub use terraform::Terraform;
pub use version::{Feature, TerraformVersion, VersionAdapter, VersionInfo};
pub use workspace::WorkspaceCommands;

pub use tfwrap_runner::{
    ExecutionResult, Invocation, LogHandler, LogLine, LogStream, MockResponse, MockRunner,
    ProcessRunner, SubprocessRunner,
};
