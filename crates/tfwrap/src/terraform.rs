//! The operation facade.
//!
//! Every call follows the same path: detect (or reuse) the Terraform
//! version, build the command, run it to completion, classify the exit code
//! and parse the output. Nothing is retried.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use tfwrap_runner::{
    ExecutionResult, LogHandler, LogLine, ProcessRunner, RunnerError, SubprocessRunner,
};

use crate::command::{CommandBuilder, PreparedCommand, Subcommand};
use crate::config::TerraformConfig;
use crate::error::{TerraformError, TerraformResult};
use crate::options::{
    ApplyOptions, DestroyOptions, FmtOptions, GetOptions, GraphOptions, ImportOptions,
    InitOptions, OutputOptions, PlanOptions, RefreshOptions, ShowOptions, TaintOptions,
};
use crate::parser;
use crate::result::{
    ApplyResult, FmtResult, GetResult, GraphResult, ImportResult, InitResult, OperationResult,
    OutputMap, PlanResult, RefreshResult, ShowResult, TaintResult, ValidateResult,
};
use crate::state::StateCommands;
use crate::version::{Feature, TerraformVersion, VersionAdapter, VersionInfo};
use crate::workspace::WorkspaceCommands;

/// Output parser for one subcommand.
pub(crate) type Parser<T> = fn(&ExecutionResult, &PreparedCommand) -> TerraformResult<T>;

/// Terraform bound to one working directory.
///
/// Calls block until Terraform exits. `Terraform` is `Send + Sync`, so a
/// host may share it across its own threads; from inside an async runtime,
/// call it through `tokio::task::spawn_blocking` because the subprocess
/// runner drives its own current-thread runtime. Two operations running
/// against the same working directory at once is the caller's problem:
/// no lock is held across calls.
///
/// # Example
///
/// ```no_run
/// use tfwrap::{PlanOptions, Terraform, TerraformConfig};
///
/// # fn main() -> tfwrap::TerraformResult<()> {
/// let terraform = Terraform::new(TerraformConfig::new("./infra"))?;
/// terraform.init(&Default::default())?;
///
/// let plan = terraform.plan(&PlanOptions::new().detailed_exitcode(true))?;
/// println!("{} to add, {} to destroy", plan.resources_added, plan.resources_destroyed);
/// # Ok(())
/// # }
/// ```
pub struct Terraform {
    config: TerraformConfig,
    runner: Arc<dyn ProcessRunner>,
    version: VersionAdapter,
    log_handler: Option<LogHandler>,
}

impl std::fmt::Debug for Terraform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Terraform")
            .field("config", &self.config)
            .field("version", &self.version)
            .field("log_handler", &self.log_handler.is_some())
            .finish_non_exhaustive()
    }
}

impl Terraform {
    /// Wrapper that launches real `terraform` processes.
    pub fn new(config: TerraformConfig) -> TerraformResult<Self> {
        Self::with_runner(config, Arc::new(SubprocessRunner::new()))
    }

    /// Wrapper over any runner, typically a `MockRunner` in tests.
    pub fn with_runner(config: TerraformConfig, runner: Arc<dyn ProcessRunner>) -> TerraformResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            runner,
            version: VersionAdapter::new(),
            log_handler: None,
        })
    }

    /// Pin the Terraform version instead of running `terraform version`.
    pub fn with_version(mut self, version: TerraformVersion) -> Self {
        self.version = VersionAdapter::pinned(version);
        self
    }

    /// Receive every output line of every call, before any per-call callback.
    pub fn with_log_handler(mut self, handler: LogHandler) -> Self {
        self.log_handler = Some(handler);
        self
    }

    pub fn config(&self) -> &TerraformConfig {
        &self.config
    }

    /// Detected (or pinned) Terraform version.
    pub fn version(&self) -> TerraformResult<&TerraformVersion> {
        Ok(&self.version_info()?.version)
    }

    pub fn version_info(&self) -> TerraformResult<&VersionInfo> {
        self.version.detect(self.runner.as_ref(), &self.config)
    }

    pub fn supports(&self, feature: Feature) -> TerraformResult<bool> {
        Ok(self.version()?.supports(feature))
    }

    pub fn init(&self, options: &InitOptions) -> TerraformResult<InitResult> {
        let prepared = self.builder()?.init(options)?;
        self.run_parsed(&prepared, None, parser::init::parse)
    }

    pub fn init_streaming(
        &self,
        options: &InitOptions,
        on_line: &mut dyn FnMut(&LogLine),
    ) -> TerraformResult<InitResult> {
        let prepared = self.builder()?.init(options)?;
        self.run_parsed(&prepared, Some(on_line), parser::init::parse)
    }

    pub fn plan(&self, options: &PlanOptions) -> TerraformResult<PlanResult> {
        let prepared = self.builder()?.plan(options)?;
        self.run_parsed(&prepared, None, parser::plan::parse)
    }

    pub fn plan_streaming(
        &self,
        options: &PlanOptions,
        on_line: &mut dyn FnMut(&LogLine),
    ) -> TerraformResult<PlanResult> {
        let prepared = self.builder()?.plan(options)?;
        self.run_parsed(&prepared, Some(on_line), parser::plan::parse)
    }

    /// Apply changes. On failure the error carries whatever was applied
    /// before Terraform stopped, see [`crate::TerraformError::partial`].
    pub fn apply(&self, options: &ApplyOptions) -> TerraformResult<ApplyResult> {
        let prepared = self.builder()?.apply(options)?;
        self.run_parsed(&prepared, None, parser::apply::parse)
    }

    pub fn apply_streaming(
        &self,
        options: &ApplyOptions,
        on_line: &mut dyn FnMut(&LogLine),
    ) -> TerraformResult<ApplyResult> {
        let prepared = self.builder()?.apply(options)?;
        self.run_parsed(&prepared, Some(on_line), parser::apply::parse)
    }

    pub fn destroy(&self, options: &DestroyOptions) -> TerraformResult<ApplyResult> {
        let prepared = self.builder()?.destroy(options)?;
        self.run_parsed(&prepared, None, parser::apply::parse)
    }

    pub fn destroy_streaming(
        &self,
        options: &DestroyOptions,
        on_line: &mut dyn FnMut(&LogLine),
    ) -> TerraformResult<ApplyResult> {
        let prepared = self.builder()?.destroy(options)?;
        self.run_parsed(&prepared, Some(on_line), parser::apply::parse)
    }

    /// Validate the configuration. An invalid configuration is a normal
    /// result with `valid == false`, not an error.
    pub fn validate(&self) -> TerraformResult<ValidateResult> {
        let prepared = self.builder()?.validate()?;
        self.run_parsed(&prepared, None, parser::validate::parse)
    }

    /// Root module outputs. With a name, the map holds just that output.
    pub fn output(&self, options: &OutputOptions) -> TerraformResult<OutputMap> {
        let prepared = self.builder()?.output(options)?;
        let execution = self.execute(&prepared, None)?;
        self.ensure_expected(&execution, &prepared)?;

        let outputs = parser::outputs::parse(&execution, &prepared)?;
        match &options.name {
            Some(name) => parser::outputs::select(outputs, name, &execution),
            None => Ok(outputs),
        }
    }

    pub fn show(&self, options: &ShowOptions) -> TerraformResult<ShowResult> {
        let prepared = self.builder()?.show(options)?;
        self.run_parsed(&prepared, None, parser::show::parse)
    }

    pub fn import(&self, options: &ImportOptions) -> TerraformResult<ImportResult> {
        let prepared = self.builder()?.import(options)?;
        self.run_parsed(&prepared, None, parser::misc::parse_import)
    }

    pub fn fmt(&self, options: &FmtOptions) -> TerraformResult<FmtResult> {
        let prepared = self.builder()?.fmt(options)?;
        self.run_parsed(&prepared, None, parser::misc::parse_fmt)
    }

    pub fn get(&self, options: &GetOptions) -> TerraformResult<GetResult> {
        let prepared = self.builder()?.get(options)?;
        self.run_parsed(&prepared, None, parser::misc::parse_get)
    }

    /// Dependency graph in DOT format.
    pub fn graph(&self, options: &GraphOptions) -> TerraformResult<GraphResult> {
        let prepared = self.builder()?.graph(options)?;
        self.run_parsed(&prepared, None, parser::misc::parse_graph)
    }

    /// Update state from real infrastructure without changing it.
    pub fn refresh(&self, options: &RefreshOptions) -> TerraformResult<RefreshResult> {
        let prepared = self.refresh_command(options)?;
        self.run_parsed(&prepared, None, parser::refresh::parse)
    }

    pub fn refresh_streaming(
        &self,
        options: &RefreshOptions,
        on_line: &mut dyn FnMut(&LogLine),
    ) -> TerraformResult<RefreshResult> {
        let prepared = self.refresh_command(options)?;
        self.run_parsed(&prepared, Some(on_line), parser::refresh::parse)
    }

    fn refresh_command(&self, options: &RefreshOptions) -> TerraformResult<PreparedCommand> {
        let prepared = self.builder()?.refresh(options)?;
        if self.supports(Feature::RefreshOnly)? {
            warn!("terraform refresh is deprecated since 0.15.4; apply with refresh_only instead");
        }
        Ok(prepared)
    }

    /// Mark a resource instance for replacement.
    pub fn taint(&self, options: &TaintOptions) -> TerraformResult<TaintResult> {
        let builder = self.builder()?;
        let prepared = builder.taint(options)?;
        if self.supports(Feature::ReplaceAddress)? {
            warn!(
                "terraform taint is deprecated since 0.15.2; plan or apply with replace({}) instead",
                options.address
            );
        }
        self.run_parsed(&prepared, None, parser::state::parse_taint)
    }

    pub fn untaint(&self, options: &TaintOptions) -> TerraformResult<TaintResult> {
        let prepared = self.builder()?.untaint(options)?;
        self.run_parsed(&prepared, None, parser::state::parse_taint)
    }

    /// `terraform state` subcommands.
    pub fn state(&self) -> StateCommands<'_> {
        StateCommands { terraform: self }
    }

    /// `terraform workspace` subcommands.
    pub fn workspace(&self) -> WorkspaceCommands<'_> {
        WorkspaceCommands { terraform: self }
    }

    /// Command builder for the detected version. Detection runs here, so
    /// option checks never reach the runner for an unsupported flag.
    pub(crate) fn builder(&self) -> TerraformResult<CommandBuilder<'_>> {
        let info = self.version_info()?;
        Ok(CommandBuilder::new(&self.config, &info.version))
    }

    pub(crate) fn run_parsed<T>(
        &self,
        prepared: &PreparedCommand,
        on_line: Option<&mut dyn FnMut(&LogLine)>,
        parse: Parser<T>,
    ) -> TerraformResult<T> {
        let execution = self.execute(prepared, on_line)?;
        self.ensure_expected(&execution, prepared)?;
        parse(&execution, prepared)
    }

    fn execute(
        &self,
        prepared: &PreparedCommand,
        mut on_line: Option<&mut dyn FnMut(&LogLine)>,
    ) -> TerraformResult<ExecutionResult> {
        info!(
            "Running terraform {} in {}",
            prepared.subcommand,
            self.config.working_dir.display()
        );
        debug!("Command: {}", prepared.invocation.command_line());

        let execution = if self.log_handler.is_none() && on_line.is_none() {
            self.runner.run(&prepared.invocation, None)
        } else {
            let handler = self.log_handler.as_deref();
            let mut forward = |line: &LogLine| {
                if let Some(handler) = handler {
                    handler(line);
                }
                if let Some(callback) = on_line.as_deref_mut() {
                    callback(line);
                }
            };
            self.runner.run(&prepared.invocation, Some(&mut forward))
        };
        let execution = execution.map_err(|err| Self::runner_failure(prepared, err))?;

        if prepared.expects(execution.exit_code) {
            info!(
                "terraform {} completed in {}ms (exit code {})",
                prepared.subcommand,
                execution.duration.as_millis(),
                execution.exit_code
            );
        }
        Ok(execution)
    }

    /// Convert a runner failure, keeping what an apply or destroy finished
    /// before it was killed on timeout.
    fn runner_failure(prepared: &PreparedCommand, err: RunnerError) -> TerraformError {
        let mut err = TerraformError::from(err);
        if let TerraformError::ExecutionTimeout {
            timeout,
            partial,
            context,
        } = &mut err
        {
            error!("terraform {} timed out after {:?}", prepared.subcommand, timeout);
            if matches!(prepared.subcommand, Subcommand::Apply | Subcommand::Destroy) {
                *partial = parser::apply::partial_from_output(
                    &context.stdout,
                    context.combined_output(),
                    prepared,
                )
                .map(|result| Box::new(OperationResult::Apply(result)));
            }
        }
        err
    }

    fn ensure_expected(&self, execution: &ExecutionResult, prepared: &PreparedCommand) -> TerraformResult<()> {
        if prepared.expects(execution.exit_code) {
            return Ok(());
        }
        error!(
            "terraform {} failed with exit code {} after {}ms",
            prepared.subcommand,
            execution.exit_code,
            execution.duration.as_millis()
        );

        let partial = match prepared.subcommand {
            Subcommand::Apply | Subcommand::Destroy => {
                parser::apply::partial(execution, prepared).map(OperationResult::Apply)
            }
            _ => None,
        };
        Err(parser::operation_error(execution, prepared, partial))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tfwrap_runner::{MockResponse, MockRunner};

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_terraform_is_send_sync() {
        assert_send_sync::<Terraform>();
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = TerraformConfig::new(".").parallelism(0);
        let runner = Arc::new(MockRunner::new());
        assert!(matches!(
            Terraform::with_runner(config, runner),
            Err(TerraformError::Config(_))
        ));
    }

    #[test]
    fn test_pinned_version_skips_detection() {
        let runner = Arc::new(MockRunner::new().add_response(MockResponse::success("")));
        let terraform = Terraform::with_runner(TerraformConfig::new("."), runner.clone())
            .unwrap()
            .with_version(TerraformVersion::new(1, 5, 7));

        assert_eq!(terraform.version().unwrap(), &TerraformVersion::new(1, 5, 7));
        assert!(terraform.supports(Feature::GenerateConfigOut).unwrap());
        assert_eq!(runner.call_count(), 0);
    }
}
