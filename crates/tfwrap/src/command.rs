//! Command line construction.
//!
//! [`CommandBuilder`] is pure: the same config, version and options always
//! produce the same argument vector. Arguments are laid out as subcommand
//! tokens, `-json` when the JSON strategy is selected, common flags,
//! subcommand flags in a fixed order and finally positional arguments.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use tfwrap_runner::Invocation;

use crate::config::TerraformConfig;
use crate::error::{TerraformError, TerraformResult};
use crate::options::{
    ApplyOptions, DestroyOptions, FmtOptions, GetOptions, GraphOptions, ImportOptions,
    InitOptions, OutputOptions, PlanOptions, RefreshOptions, ShowOptions, StateListOptions,
    StateMvOptions, StateReplaceProviderOptions, StateRmOptions, StateShowOptions, TaintOptions,
    Vars,
};
use crate::version::{Feature, TerraformVersion};

/// How the output of a prepared command is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseStrategy {
    Json,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Subcommand {
    Version,
    Init,
    Plan,
    Apply,
    Destroy,
    Validate,
    Output,
    Show,
    StateList,
    StateShow,
    StateRm,
    StateMv,
    StatePull,
    StateReplaceProvider,
    WorkspaceNew,
    WorkspaceSelect,
    WorkspaceList,
    WorkspaceShow,
    WorkspaceDelete,
    Import,
    Fmt,
    Get,
    Taint,
    Untaint,
    Graph,
    Refresh,
}

impl Subcommand {
    pub fn tokens(&self) -> &'static [&'static str] {
        match self {
            Self::Version => &["version"],
            Self::Init => &["init"],
            Self::Plan => &["plan"],
            Self::Apply => &["apply"],
            Self::Destroy => &["destroy"],
            Self::Validate => &["validate"],
            Self::Output => &["output"],
            Self::Show => &["show"],
            Self::StateList => &["state", "list"],
            Self::StateShow => &["state", "show"],
            Self::StateRm => &["state", "rm"],
            Self::StateMv => &["state", "mv"],
            Self::StatePull => &["state", "pull"],
            Self::StateReplaceProvider => &["state", "replace-provider"],
            Self::WorkspaceNew => &["workspace", "new"],
            Self::WorkspaceSelect => &["workspace", "select"],
            Self::WorkspaceList => &["workspace", "list"],
            Self::WorkspaceShow => &["workspace", "show"],
            Self::WorkspaceDelete => &["workspace", "delete"],
            Self::Import => &["import"],
            Self::Fmt => &["fmt"],
            Self::Get => &["get"],
            Self::Taint => &["taint"],
            Self::Untaint => &["untaint"],
            Self::Graph => &["graph"],
            Self::Refresh => &["refresh"],
        }
    }
}

impl fmt::Display for Subcommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens().join(" "))
    }
}

/// A command ready to run, with everything needed to interpret its exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCommand {
    pub subcommand: Subcommand,
    pub invocation: Invocation,
    pub strategy: ParseStrategy,
    /// Exit codes after which the output is parsed into a result.
    pub expected_exit_codes: Vec<i64>,
}

impl PreparedCommand {
    pub fn expects(&self, exit_code: i64) -> bool {
        self.expected_exit_codes.contains(&exit_code)
    }

    pub fn args(&self) -> &[String] {
        self.invocation.args()
    }
}

/// Which global flags a subcommand accepts.
#[derive(Debug, Clone, Copy)]
struct CommonFlags {
    color: bool,
    input: bool,
    lock: bool,
    parallelism: bool,
}

impl CommonFlags {
    const ALL: Self = Self {
        color: true,
        input: true,
        lock: true,
        parallelism: true,
    };
    const INIT: Self = Self {
        color: true,
        input: true,
        lock: true,
        parallelism: false,
    };
    const COLOR: Self = Self {
        color: true,
        input: false,
        lock: false,
        parallelism: false,
    };
    const LOCK: Self = Self {
        color: false,
        input: false,
        lock: true,
        parallelism: false,
    };
    const NONE: Self = Self {
        color: false,
        input: false,
        lock: false,
        parallelism: false,
    };
}

/// Ordered argument vector under construction.
#[derive(Debug, Default)]
struct Args(Vec<String>);

impl Args {
    fn flag(&mut self, flag: &str) {
        self.0.push(flag.to_string());
    }

    fn flag_if(&mut self, condition: bool, flag: &str) {
        if condition {
            self.flag(flag);
        }
    }

    fn value(&mut self, flag: &str, value: impl fmt::Display) {
        self.0.push(format!("{}={}", flag, value));
    }

    fn path(&mut self, flag: &str, path: Option<&Path>) {
        if let Some(path) = path {
            self.value(flag, path.display());
        }
    }

    fn each<I>(&mut self, flag: &str, values: I)
    where
        I: IntoIterator,
        I::Item: fmt::Display,
    {
        for value in values {
            self.value(flag, value);
        }
    }

    fn var_files(&mut self, files: &[std::path::PathBuf]) {
        for file in files {
            self.value("-var-file", file.display());
        }
    }

    fn vars(&mut self, vars: &Vars) {
        for (name, value) in vars {
            self.value("-var", render_var(name, value));
        }
    }

    fn positional(&mut self, value: impl Into<String>) {
        self.0.push(value.into());
    }
}

/// Render `name=value`. Strings pass verbatim; anything else becomes JSON
/// text, which Terraform reads as an HCL expression.
fn render_var(name: &str, value: &Value) -> String {
    match value {
        Value::String(s) => format!("{}={}", name, s),
        other => format!("{}={}", name, other),
    }
}

fn require_non_empty(what: &str, value: &str) -> TerraformResult<()> {
    if value.trim().is_empty() {
        return Err(TerraformError::InvalidOption(format!(
            "{} must not be empty",
            what
        )));
    }
    Ok(())
}

fn check_vars(vars: &Vars) -> TerraformResult<()> {
    for name in vars.keys() {
        require_non_empty("variable name", name)?;
    }
    Ok(())
}

/// Builds [`PreparedCommand`]s for one config and Terraform version.
#[derive(Debug, Clone, Copy)]
pub struct CommandBuilder<'a> {
    config: &'a TerraformConfig,
    version: &'a TerraformVersion,
}

impl<'a> CommandBuilder<'a> {
    pub fn new(config: &'a TerraformConfig, version: &'a TerraformVersion) -> Self {
        Self { config, version }
    }

    /// The `terraform version -json` invocation used for detection.
    pub fn version(config: &TerraformConfig) -> Invocation {
        Self::invocation(config, vec!["version".to_string(), "-json".to_string()])
    }

    fn invocation(config: &TerraformConfig, args: Vec<String>) -> Invocation {
        Invocation::builder(config.binary.clone())
            .args(args)
            .working_dir(config.working_dir.clone())
            .env("TF_IN_AUTOMATION", "1")
            .envs(config.env.clone())
            .isolate_env(config.isolate_env)
            .timeout(config.timeout().unwrap_or_default())
            .build()
    }

    fn require(&self, feature: Feature, option: &'static str, flag: &'static str) -> TerraformResult<()> {
        if self.version.supports(feature) {
            return Ok(());
        }
        Err(TerraformError::UnsupportedOption {
            option,
            flag,
            required: feature.min_version(),
            detected: self.version.clone(),
        })
    }

    fn strategy(&self, feature: Feature) -> ParseStrategy {
        if self.version.supports(feature) {
            ParseStrategy::Json
        } else {
            ParseStrategy::Text
        }
    }

    fn start(&self, subcommand: Subcommand, strategy: ParseStrategy, common: CommonFlags) -> Args {
        let mut args = Args::default();
        for token in subcommand.tokens() {
            args.flag(token);
        }
        args.flag_if(strategy == ParseStrategy::Json, "-json");

        args.flag_if(common.color && !self.config.color, "-no-color");
        args.flag_if(common.input && !self.config.input, "-input=false");
        if common.lock {
            args.flag_if(!self.config.lock, "-lock=false");
            if let Some(timeout) = &self.config.lock_timeout {
                args.value("-lock-timeout", timeout);
            }
        }
        if common.parallelism {
            if let Some(parallelism) = self.config.parallelism {
                args.value("-parallelism", parallelism);
            }
        }
        args
    }

    fn finish(
        &self,
        subcommand: Subcommand,
        args: Args,
        strategy: ParseStrategy,
        expected_exit_codes: Vec<i64>,
    ) -> PreparedCommand {
        let invocation = Self::invocation(self.config, args.0);
        debug!(
            "Prepared terraform {} ({:?} strategy): {}",
            subcommand,
            strategy,
            invocation.command_line()
        );
        PreparedCommand {
            subcommand,
            invocation,
            strategy,
            expected_exit_codes,
        }
    }

    /// Build `terraform init`.
    ///
    /// Flag order: `-upgrade`, `-reconfigure`, `-migrate-state`,
    /// `-force-copy`, `-backend=false`, `-backend-config`, `-get=false`,
    /// `-plugin-dir`, `-lockfile=readonly`, `-from-module`.
    pub fn init(&self, options: &InitOptions) -> TerraformResult<PreparedCommand> {
        if options.lockfile_readonly {
            self.require(Feature::LockfileReadonly, "lockfile_readonly", "-lockfile=readonly")?;
        }
        if options.reconfigure && options.migrate_state {
            return Err(TerraformError::InvalidOption(
                "reconfigure and migrate_state are mutually exclusive".to_string(),
            ));
        }

        let strategy = self.strategy(Feature::JsonInitOutput);
        let mut args = self.start(Subcommand::Init, strategy, CommonFlags::INIT);
        args.flag_if(options.upgrade, "-upgrade");
        args.flag_if(options.reconfigure, "-reconfigure");
        args.flag_if(options.migrate_state, "-migrate-state");
        args.flag_if(options.force_copy, "-force-copy");
        args.flag_if(!options.backend, "-backend=false");
        args.each("-backend-config", &options.backend_config);
        args.flag_if(!options.get, "-get=false");
        for dir in &options.plugin_dirs {
            args.value("-plugin-dir", dir.display());
        }
        args.flag_if(options.lockfile_readonly, "-lockfile=readonly");
        if let Some(source) = &options.from_module {
            args.value("-from-module", source);
        }

        Ok(self.finish(Subcommand::Init, args, strategy, vec![0]))
    }

    /// Build `terraform plan`.
    ///
    /// Flag order: `-destroy`, `-refresh-only`, `-refresh=false`,
    /// `-detailed-exitcode`, `-out`, `-generate-config-out`,
    /// `-compact-warnings`, `-var-file`, `-var`, `-target`, `-replace`.
    pub fn plan(&self, options: &PlanOptions) -> TerraformResult<PreparedCommand> {
        if options.refresh_only {
            self.require(Feature::RefreshOnly, "refresh_only", "-refresh-only")?;
        }
        if !options.replace.is_empty() {
            self.require(Feature::ReplaceAddress, "replace", "-replace")?;
        }
        if options.generate_config_out.is_some() {
            self.require(Feature::GenerateConfigOut, "generate_config_out", "-generate-config-out")?;
        }
        if options.detailed_exitcode {
            self.require(Feature::DetailedExitcode, "detailed_exitcode", "-detailed-exitcode")?;
        }
        if options.destroy && options.refresh_only {
            return Err(TerraformError::InvalidOption(
                "destroy and refresh_only cannot be combined".to_string(),
            ));
        }
        check_vars(&options.vars)?;

        let strategy = self.strategy(Feature::JsonPlanOutput);
        let mut args = self.start(Subcommand::Plan, strategy, CommonFlags::ALL);
        args.flag_if(options.destroy, "-destroy");
        args.flag_if(options.refresh_only, "-refresh-only");
        args.flag_if(options.refresh == Some(false), "-refresh=false");
        args.flag_if(options.detailed_exitcode, "-detailed-exitcode");
        args.path("-out", options.out.as_deref());
        args.path("-generate-config-out", options.generate_config_out.as_deref());
        args.flag_if(options.compact_warnings, "-compact-warnings");
        args.var_files(&options.var_files);
        args.vars(&options.vars);
        args.each("-target", &options.targets);
        args.each("-replace", &options.replace);

        let expected = if options.detailed_exitcode {
            vec![0, 2]
        } else {
            vec![0]
        };
        Ok(self.finish(Subcommand::Plan, args, strategy, expected))
    }

    /// Build `terraform apply`.
    ///
    /// Flag order: `-auto-approve`, `-refresh-only`, `-refresh=false`,
    /// `-compact-warnings`, `-state`, `-state-out`, `-backup`, `-var-file`,
    /// `-var`, `-target`, `-replace`, then the plan file.
    pub fn apply(&self, options: &ApplyOptions) -> TerraformResult<PreparedCommand> {
        if options.refresh_only {
            self.require(Feature::RefreshOnly, "refresh_only", "-refresh-only")?;
        }
        if !options.replace.is_empty() {
            self.require(Feature::ReplaceAddress, "replace", "-replace")?;
        }
        check_vars(&options.vars)?;

        let strategy = self.strategy(Feature::JsonApplyOutput);
        if options.plan_file.is_some() {
            if !options.vars.is_empty()
                || !options.var_files.is_empty()
                || !options.targets.is_empty()
                || !options.replace.is_empty()
                || options.refresh_only
            {
                return Err(TerraformError::InvalidOption(
                    "a saved plan file cannot be combined with vars, targets, replace or refresh_only"
                        .to_string(),
                ));
            }
        } else {
            require_approval(options.auto_approve, "apply")?;
        }

        let mut args = self.start(Subcommand::Apply, strategy, CommonFlags::ALL);
        args.flag_if(options.auto_approve, "-auto-approve");
        args.flag_if(options.refresh_only, "-refresh-only");
        args.flag_if(options.refresh == Some(false), "-refresh=false");
        args.flag_if(options.compact_warnings, "-compact-warnings");
        args.path("-state", options.state.as_deref());
        args.path("-state-out", options.state_out.as_deref());
        args.path("-backup", options.backup.as_deref());
        args.var_files(&options.var_files);
        args.vars(&options.vars);
        args.each("-target", &options.targets);
        args.each("-replace", &options.replace);
        if let Some(plan) = &options.plan_file {
            args.positional(plan.display().to_string());
        }

        Ok(self.finish(Subcommand::Apply, args, strategy, vec![0]))
    }

    /// Build `terraform destroy`.
    ///
    /// Flag order: `-auto-approve`, `-refresh=false`, `-compact-warnings`,
    /// `-var-file`, `-var`, `-target`.
    pub fn destroy(&self, options: &DestroyOptions) -> TerraformResult<PreparedCommand> {
        check_vars(&options.vars)?;
        let strategy = self.strategy(Feature::JsonApplyOutput);
        require_approval(options.auto_approve, "destroy")?;

        let mut args = self.start(Subcommand::Destroy, strategy, CommonFlags::ALL);
        args.flag_if(options.auto_approve, "-auto-approve");
        args.flag_if(options.refresh == Some(false), "-refresh=false");
        args.flag_if(options.compact_warnings, "-compact-warnings");
        args.var_files(&options.var_files);
        args.vars(&options.vars);
        args.each("-target", &options.targets);

        Ok(self.finish(Subcommand::Destroy, args, strategy, vec![0]))
    }


    /// Build `terraform validate`. Exit codes 0 and 1 are both parsed.
    pub fn validate(&self) -> TerraformResult<PreparedCommand> {
        let strategy = self.strategy(Feature::JsonValidateOutput);
        let args = self.start(Subcommand::Validate, strategy, CommonFlags::COLOR);
        Ok(self.finish(Subcommand::Validate, args, strategy, vec![0, 1]))
    }

    /// Build `terraform output`. A named output is filtered after parsing,
    /// so the full map is always requested.
    pub fn output(&self, options: &OutputOptions) -> TerraformResult<PreparedCommand> {
        if let Some(name) = &options.name {
            require_non_empty("output name", name)?;
        }
        let strategy = self.strategy(Feature::JsonOutputCommand);
        let mut args = self.start(Subcommand::Output, strategy, CommonFlags::COLOR);
        args.path("-state", options.state.as_deref());
        Ok(self.finish(Subcommand::Output, args, strategy, vec![0]))
    }

    pub fn show(&self, options: &ShowOptions) -> TerraformResult<PreparedCommand> {
        let strategy = self.strategy(Feature::JsonShowOutput);
        let mut args = self.start(Subcommand::Show, strategy, CommonFlags::COLOR);
        if let Some(plan) = &options.plan_file {
            args.positional(plan.display().to_string());
        }
        Ok(self.finish(Subcommand::Show, args, strategy, vec![0]))
    }

    pub fn state_list(&self, options: &StateListOptions) -> TerraformResult<PreparedCommand> {
        if let Some(id) = &options.id {
            require_non_empty("id", id)?;
        }
        let mut args = self.start(Subcommand::StateList, ParseStrategy::Text, CommonFlags::NONE);
        args.path("-state", options.state.as_deref());
        if let Some(id) = &options.id {
            args.value("-id", id);
        }
        for address in &options.addresses {
            args.positional(address.clone());
        }
        Ok(self.finish(Subcommand::StateList, args, ParseStrategy::Text, vec![0]))
    }

    pub fn state_show(&self, options: &StateShowOptions) -> TerraformResult<PreparedCommand> {
        require_non_empty("address", &options.address)?;
        let mut args = self.start(Subcommand::StateShow, ParseStrategy::Text, CommonFlags::NONE);
        args.path("-state", options.state.as_deref());
        args.positional(options.address.clone());
        Ok(self.finish(Subcommand::StateShow, args, ParseStrategy::Text, vec![0]))
    }

    /// Build `terraform state rm`.
    ///
    /// Flag order: `-dry-run`, `-backup`, `-state`, `-ignore-remote-version`.
    pub fn state_rm(&self, options: &StateRmOptions) -> TerraformResult<PreparedCommand> {
        if options.addresses.is_empty() {
            return Err(TerraformError::InvalidOption(
                "state rm needs at least one address".to_string(),
            ));
        }
        for address in &options.addresses {
            require_non_empty("address", address)?;
        }

        let mut args = self.start(Subcommand::StateRm, ParseStrategy::Text, CommonFlags::LOCK);
        args.flag_if(options.dry_run, "-dry-run");
        args.path("-backup", options.backup.as_deref());
        args.path("-state", options.state.as_deref());
        args.flag_if(options.ignore_remote_version, "-ignore-remote-version");
        for address in &options.addresses {
            args.positional(address.clone());
        }
        Ok(self.finish(Subcommand::StateRm, args, ParseStrategy::Text, vec![0]))
    }

    /// Build `terraform state mv`.
    ///
    /// Flag order: `-dry-run`, `-backup`, `-backup-out`, `-state`,
    /// `-state-out`, `-ignore-remote-version`.
    pub fn state_mv(&self, options: &StateMvOptions) -> TerraformResult<PreparedCommand> {
        require_non_empty("source address", &options.source)?;
        require_non_empty("destination address", &options.destination)?;

        let mut args = self.start(Subcommand::StateMv, ParseStrategy::Text, CommonFlags::LOCK);
        args.flag_if(options.dry_run, "-dry-run");
        args.path("-backup", options.backup.as_deref());
        args.path("-backup-out", options.backup_out.as_deref());
        args.path("-state", options.state.as_deref());
        args.path("-state-out", options.state_out.as_deref());
        args.flag_if(options.ignore_remote_version, "-ignore-remote-version");
        args.positional(options.source.clone());
        args.positional(options.destination.clone());
        Ok(self.finish(Subcommand::StateMv, args, ParseStrategy::Text, vec![0]))
    }

    /// Build `terraform state pull`, which always prints the state as JSON.
    pub fn state_pull(&self) -> TerraformResult<PreparedCommand> {
        let args = self.start(Subcommand::StatePull, ParseStrategy::Text, CommonFlags::NONE);
        Ok(self.finish(Subcommand::StatePull, args, ParseStrategy::Text, vec![0]))
    }

    /// Build `terraform state replace-provider`.
    ///
    /// Flag order: `-auto-approve`, `-backup`, `-state`, `-state-out`,
    /// `-ignore-remote-version`, then the two provider addresses.
    pub fn state_replace_provider(
        &self,
        options: &StateReplaceProviderOptions,
    ) -> TerraformResult<PreparedCommand> {
        require_non_empty("source provider", &options.from)?;
        require_non_empty("destination provider", &options.to)?;
        require_approval(options.auto_approve, "state replace-provider")?;

        let subcommand = Subcommand::StateReplaceProvider;
        let mut args = self.start(subcommand, ParseStrategy::Text, CommonFlags::LOCK);
        args.flag("-auto-approve");
        args.path("-backup", options.backup.as_deref());
        args.path("-state", options.state.as_deref());
        args.path("-state-out", options.state_out.as_deref());
        args.flag_if(options.ignore_remote_version, "-ignore-remote-version");
        args.positional(options.from.clone());
        args.positional(options.to.clone());
        Ok(self.finish(subcommand, args, ParseStrategy::Text, vec![0]))
    }

    pub fn workspace_new(&self, name: &str) -> TerraformResult<PreparedCommand> {
        require_non_empty("workspace name", name)?;
        let mut args = self.start(Subcommand::WorkspaceNew, ParseStrategy::Text, CommonFlags::LOCK);
        args.positional(name);
        Ok(self.finish(Subcommand::WorkspaceNew, args, ParseStrategy::Text, vec![0]))
    }

    pub fn workspace_select(&self, name: &str, or_create: bool) -> TerraformResult<PreparedCommand> {
        require_non_empty("workspace name", name)?;
        if or_create {
            self.require(Feature::WorkspaceSelectOrCreate, "or_create", "-or-create")?;
        }
        let mut args = self.start(Subcommand::WorkspaceSelect, ParseStrategy::Text, CommonFlags::NONE);
        args.flag_if(or_create, "-or-create");
        args.positional(name);
        Ok(self.finish(Subcommand::WorkspaceSelect, args, ParseStrategy::Text, vec![0]))
    }

    pub fn workspace_list(&self) -> TerraformResult<PreparedCommand> {
        let args = self.start(Subcommand::WorkspaceList, ParseStrategy::Text, CommonFlags::NONE);
        Ok(self.finish(Subcommand::WorkspaceList, args, ParseStrategy::Text, vec![0]))
    }

    pub fn workspace_show(&self) -> TerraformResult<PreparedCommand> {
        self.require(Feature::WorkspaceShow, "workspace show", "workspace show")?;
        let args = self.start(Subcommand::WorkspaceShow, ParseStrategy::Text, CommonFlags::NONE);
        Ok(self.finish(Subcommand::WorkspaceShow, args, ParseStrategy::Text, vec![0]))
    }

    pub fn workspace_delete(&self, name: &str, force: bool) -> TerraformResult<PreparedCommand> {
        require_non_empty("workspace name", name)?;
        let mut args = self.start(Subcommand::WorkspaceDelete, ParseStrategy::Text, CommonFlags::LOCK);
        args.flag_if(force, "-force");
        args.positional(name);
        Ok(self.finish(Subcommand::WorkspaceDelete, args, ParseStrategy::Text, vec![0]))
    }

    /// Build `terraform import`. Flags: `-var-file`, `-var`, then address and ID.
    pub fn import(&self, options: &ImportOptions) -> TerraformResult<PreparedCommand> {
        require_non_empty("address", &options.address)?;
        require_non_empty("id", &options.id)?;
        check_vars(&options.vars)?;

        let mut args = self.start(Subcommand::Import, ParseStrategy::Text, CommonFlags::ALL);
        args.var_files(&options.var_files);
        args.vars(&options.vars);
        args.positional(options.address.clone());
        args.positional(options.id.clone());
        Ok(self.finish(Subcommand::Import, args, ParseStrategy::Text, vec![0]))
    }

    /// Build `terraform fmt`. With `check`, exit code 3 reports unformatted
    /// files and is parsed like a success.
    pub fn fmt(&self, options: &FmtOptions) -> TerraformResult<PreparedCommand> {
        let mut args = self.start(Subcommand::Fmt, ParseStrategy::Text, CommonFlags::COLOR);
        args.flag_if(options.check, "-check");
        args.flag_if(options.recursive, "-recursive");
        args.flag_if(options.diff, "-diff");
        for path in &options.paths {
            args.positional(path.display().to_string());
        }
        let expected = if options.check { vec![0, 3] } else { vec![0] };
        Ok(self.finish(Subcommand::Fmt, args, ParseStrategy::Text, expected))
    }

    pub fn get(&self, options: &GetOptions) -> TerraformResult<PreparedCommand> {
        let mut args = self.start(Subcommand::Get, ParseStrategy::Text, CommonFlags::COLOR);
        args.flag_if(options.update, "-update");
        Ok(self.finish(Subcommand::Get, args, ParseStrategy::Text, vec![0]))
    }

    /// Build `terraform graph`.
    ///
    /// Flag order: `-type`, `-plan`, `-draw-cycles`, `-module-depth`.
    pub fn graph(&self, options: &GraphOptions) -> TerraformResult<PreparedCommand> {
        let mut args = self.start(Subcommand::Graph, ParseStrategy::Text, CommonFlags::NONE);
        if let Some(graph_type) = options.graph_type {
            args.value("-type", graph_type);
        }
        args.path("-plan", options.plan_file.as_deref());
        args.flag_if(options.draw_cycles, "-draw-cycles");
        if let Some(depth) = options.module_depth {
            args.value("-module-depth", depth);
        }
        Ok(self.finish(Subcommand::Graph, args, ParseStrategy::Text, vec![0]))
    }

    /// Build `terraform refresh`.
    ///
    /// Flag order: `-compact-warnings`, `-state`, `-state-out`, `-backup`,
    /// `-var-file`, `-var`, `-target`.
    pub fn refresh(&self, options: &RefreshOptions) -> TerraformResult<PreparedCommand> {
        check_vars(&options.vars)?;

        let strategy = self.strategy(Feature::JsonApplyOutput);
        let mut args = self.start(Subcommand::Refresh, strategy, CommonFlags::ALL);
        args.flag_if(options.compact_warnings, "-compact-warnings");
        args.path("-state", options.state.as_deref());
        args.path("-state-out", options.state_out.as_deref());
        args.path("-backup", options.backup.as_deref());
        args.var_files(&options.var_files);
        args.vars(&options.vars);
        args.each("-target", &options.targets);
        Ok(self.finish(Subcommand::Refresh, args, strategy, vec![0]))
    }

    pub fn taint(&self, options: &TaintOptions) -> TerraformResult<PreparedCommand> {
        self.taint_command(Subcommand::Taint, options)
    }

    pub fn untaint(&self, options: &TaintOptions) -> TerraformResult<PreparedCommand> {
        self.taint_command(Subcommand::Untaint, options)
    }

    fn taint_command(
        &self,
        subcommand: Subcommand,
        options: &TaintOptions,
    ) -> TerraformResult<PreparedCommand> {
        require_non_empty("address", &options.address)?;
        let mut args = self.start(subcommand, ParseStrategy::Text, CommonFlags::LOCK);
        args.flag_if(options.allow_missing, "-allow-missing");
        args.positional(options.address.clone());
        Ok(self.finish(subcommand, args, ParseStrategy::Text, vec![0]))
    }
}

/// Runners never attach stdin, so Terraform's confirmation prompt would
/// read EOF and abort. Approval must be explicit.
fn require_approval(auto_approve: bool, operation: &str) -> TerraformResult<()> {
    if auto_approve {
        return Ok(());
    }
    Err(TerraformError::InvalidOption(format!(
        "{} needs auto_approve; the confirmation prompt cannot be answered",
        operation
    )))
}
