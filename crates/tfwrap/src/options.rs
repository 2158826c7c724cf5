//! Typed options for each Terraform subcommand.
//!
//! Every struct implements `Default` and exposes chained setters, so callers
//! only name what they change:
//!
//! ```
//! use tfwrap::PlanOptions;
//!
//! let options = PlanOptions::new()
//!     .out("tfplan")
//!     .var("region", "eu-west-1")
//!     .var("instance_count", 3)
//!     .target("module.network");
//! assert_eq!(options.vars.len(), 2);
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Input variables, rendered as `-var=name=value` in key order.
pub type Vars = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitOptions {
    pub upgrade: bool,
    pub reconfigure: bool,
    pub migrate_state: bool,
    pub force_copy: bool,
    pub backend: bool,
    pub backend_config: Vec<String>,
    pub get: bool,
    pub plugin_dirs: Vec<PathBuf>,
    pub lockfile_readonly: bool,
    pub from_module: Option<String>,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            upgrade: false,
            reconfigure: false,
            migrate_state: false,
            force_copy: false,
            backend: true,
            backend_config: Vec::new(),
            get: true,
            plugin_dirs: Vec::new(),
            lockfile_readonly: false,
            from_module: None,
        }
    }
}

impl InitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upgrade(mut self, upgrade: bool) -> Self {
        self.upgrade = upgrade;
        self
    }

    pub fn reconfigure(mut self, reconfigure: bool) -> Self {
        self.reconfigure = reconfigure;
        self
    }

    pub fn migrate_state(mut self, migrate: bool) -> Self {
        self.migrate_state = migrate;
        self
    }

    pub fn force_copy(mut self, force: bool) -> Self {
        self.force_copy = force;
        self
    }

    pub fn backend(mut self, backend: bool) -> Self {
        self.backend = backend;
        self
    }

    /// A `key=value` pair or a path to a backend config file.
    pub fn backend_config(mut self, config: impl Into<String>) -> Self {
        self.backend_config.push(config.into());
        self
    }

    pub fn get(mut self, get: bool) -> Self {
        self.get = get;
        self
    }

    pub fn plugin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.plugin_dirs.push(dir.into());
        self
    }

    pub fn lockfile_readonly(mut self, readonly: bool) -> Self {
        self.lockfile_readonly = readonly;
        self
    }

    pub fn from_module(mut self, source: impl Into<String>) -> Self {
        self.from_module = Some(source.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanOptions {
    pub out: Option<PathBuf>,
    pub detailed_exitcode: bool,
    pub vars: Vars,
    pub var_files: Vec<PathBuf>,
    pub targets: Vec<String>,
    pub replace: Vec<String>,
    pub destroy: bool,
    pub refresh_only: bool,
    /// `Some(false)` passes `-refresh=false`.
    pub refresh: Option<bool>,
    pub compact_warnings: bool,
    pub generate_config_out: Option<PathBuf>,
}

impl PlanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn out(mut self, path: impl Into<PathBuf>) -> Self {
        self.out = Some(path.into());
        self
    }

    pub fn detailed_exitcode(mut self, detailed: bool) -> Self {
        self.detailed_exitcode = detailed;
        self
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn var_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.var_files.push(path.into());
        self
    }

    pub fn target(mut self, address: impl Into<String>) -> Self {
        self.targets.push(address.into());
        self
    }

    pub fn replace(mut self, address: impl Into<String>) -> Self {
        self.replace.push(address.into());
        self
    }

    pub fn destroy(mut self, destroy: bool) -> Self {
        self.destroy = destroy;
        self
    }

    pub fn refresh_only(mut self, refresh_only: bool) -> Self {
        self.refresh_only = refresh_only;
        self
    }

    pub fn refresh(mut self, refresh: bool) -> Self {
        self.refresh = Some(refresh);
        self
    }

    pub fn compact_warnings(mut self, compact: bool) -> Self {
        self.compact_warnings = compact;
        self
    }

    pub fn generate_config_out(mut self, path: impl Into<PathBuf>) -> Self {
        self.generate_config_out = Some(path.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyOptions {
    /// Saved plan to apply; excludes vars, targets and replace.
    pub plan_file: Option<PathBuf>,
    pub auto_approve: bool,
    pub vars: Vars,
    pub var_files: Vec<PathBuf>,
    pub targets: Vec<String>,
    pub replace: Vec<String>,
    pub refresh_only: bool,
    pub refresh: Option<bool>,
    pub compact_warnings: bool,
    pub state: Option<PathBuf>,
    pub state_out: Option<PathBuf>,
    pub backup: Option<PathBuf>,
}

impl ApplyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plan_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.plan_file = Some(path.into());
        self
    }

    pub fn auto_approve(mut self, auto_approve: bool) -> Self {
        self.auto_approve = auto_approve;
        self
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn var_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.var_files.push(path.into());
        self
    }

    pub fn target(mut self, address: impl Into<String>) -> Self {
        self.targets.push(address.into());
        self
    }

    pub fn replace(mut self, address: impl Into<String>) -> Self {
        self.replace.push(address.into());
        self
    }

    pub fn refresh_only(mut self, refresh_only: bool) -> Self {
        self.refresh_only = refresh_only;
        self
    }

    pub fn refresh(mut self, refresh: bool) -> Self {
        self.refresh = Some(refresh);
        self
    }

    pub fn compact_warnings(mut self, compact: bool) -> Self {
        self.compact_warnings = compact;
        self
    }

    pub fn state(mut self, path: impl Into<PathBuf>) -> Self {
        self.state = Some(path.into());
        self
    }

    pub fn state_out(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_out = Some(path.into());
        self
    }

    pub fn backup(mut self, path: impl Into<PathBuf>) -> Self {
        self.backup = Some(path.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DestroyOptions {
    pub auto_approve: bool,
    pub vars: Vars,
    pub var_files: Vec<PathBuf>,
    pub targets: Vec<String>,
    pub refresh: Option<bool>,
    pub compact_warnings: bool,
}

impl DestroyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auto_approve(mut self, auto_approve: bool) -> Self {
        self.auto_approve = auto_approve;
        self
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn var_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.var_files.push(path.into());
        self
    }

    pub fn target(mut self, address: impl Into<String>) -> Self {
        self.targets.push(address.into());
        self
    }

    pub fn refresh(mut self, refresh: bool) -> Self {
        self.refresh = Some(refresh);
        self
    }

    pub fn compact_warnings(mut self, compact: bool) -> Self {
        self.compact_warnings = compact;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputOptions {
    /// Single output to return; all outputs when `None`.
    pub name: Option<String>,
    pub state: Option<PathBuf>,
}

impl OutputOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn state(mut self, path: impl Into<PathBuf>) -> Self {
        self.state = Some(path.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowOptions {
    /// Saved plan (or state file) to show; current state when `None`.
    pub plan_file: Option<PathBuf>,
}

impl ShowOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plan_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.plan_file = Some(path.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateListOptions {
    /// Address prefixes to filter by.
    pub addresses: Vec<String>,
    pub state: Option<PathBuf>,
    /// Only list resources with this ID.
    pub id: Option<String>,
}

impl StateListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.addresses.push(address.into());
        self
    }

    pub fn state(mut self, path: impl Into<PathBuf>) -> Self {
        self.state = Some(path.into());
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateShowOptions {
    pub address: String,
    pub state: Option<PathBuf>,
}

impl StateShowOptions {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            state: None,
        }
    }

    pub fn state(mut self, path: impl Into<PathBuf>) -> Self {
        self.state = Some(path.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateRmOptions {
    pub addresses: Vec<String>,
    pub dry_run: bool,
    pub state: Option<PathBuf>,
    pub backup: Option<PathBuf>,
    pub ignore_remote_version: bool,
}

impl StateRmOptions {
    pub fn new<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            addresses: addresses.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn state(mut self, path: impl Into<PathBuf>) -> Self {
        self.state = Some(path.into());
        self
    }

    pub fn backup(mut self, path: impl Into<PathBuf>) -> Self {
        self.backup = Some(path.into());
        self
    }

    pub fn ignore_remote_version(mut self, ignore: bool) -> Self {
        self.ignore_remote_version = ignore;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateMvOptions {
    pub source: String,
    pub destination: String,
    pub dry_run: bool,
    pub state: Option<PathBuf>,
    pub state_out: Option<PathBuf>,
    pub backup: Option<PathBuf>,
    pub backup_out: Option<PathBuf>,
    pub ignore_remote_version: bool,
}

impl StateMvOptions {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            ..Default::default()
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn state(mut self, path: impl Into<PathBuf>) -> Self {
        self.state = Some(path.into());
        self
    }

    pub fn state_out(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_out = Some(path.into());
        self
    }

    pub fn backup(mut self, path: impl Into<PathBuf>) -> Self {
        self.backup = Some(path.into());
        self
    }

    pub fn backup_out(mut self, path: impl Into<PathBuf>) -> Self {
        self.backup_out = Some(path.into());
        self
    }

    pub fn ignore_remote_version(mut self, ignore: bool) -> Self {
        self.ignore_remote_version = ignore;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    pub address: String,
    pub id: String,
    pub vars: Vars,
    pub var_files: Vec<PathBuf>,
}

impl ImportOptions {
    pub fn new(address: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn var_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.var_files.push(path.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FmtOptions {
    /// Report unformatted files without rewriting them (exit code 3).
    pub check: bool,
    pub recursive: bool,
    pub diff: bool,
    pub paths: Vec<PathBuf>,
}

impl FmtOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(mut self, check: bool) -> Self {
        self.check = check;
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn diff(mut self, diff: bool) -> Self {
        self.diff = diff;
        self
    }

    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.push(path.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetOptions {
    pub update: bool,
}

impl GetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(mut self, update: bool) -> Self {
        self.update = update;
        self
    }
}

/// Options for `taint` and `untaint`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaintOptions {
    pub address: String,
    /// Succeed even if the resource instance is missing.
    pub allow_missing: bool,
}

impl TaintOptions {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            allow_missing: false,
        }
    }

    pub fn allow_missing(mut self, allow: bool) -> Self {
        self.allow_missing = allow;
        self
    }
}

/// Options for `state replace-provider`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateReplaceProviderOptions {
    /// Provider address to replace, e.g. `registry.terraform.io/-/aws`.
    pub from: String,
    pub to: String,
    /// Required: the confirmation prompt cannot be answered.
    pub auto_approve: bool,
    pub state: Option<PathBuf>,
    pub state_out: Option<PathBuf>,
    pub backup: Option<PathBuf>,
    pub ignore_remote_version: bool,
}

impl StateReplaceProviderOptions {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            ..Default::default()
        }
    }

    pub fn auto_approve(mut self, auto_approve: bool) -> Self {
        self.auto_approve = auto_approve;
        self
    }

    pub fn state(mut self, path: impl Into<PathBuf>) -> Self {
        self.state = Some(path.into());
        self
    }

    pub fn state_out(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_out = Some(path.into());
        self
    }

    pub fn backup(mut self, path: impl Into<PathBuf>) -> Self {
        self.backup = Some(path.into());
        self
    }

    pub fn ignore_remote_version(mut self, ignore: bool) -> Self {
        self.ignore_remote_version = ignore;
        self
    }
}

/// Graph flavors accepted by `terraform graph -type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GraphType {
    Plan,
    PlanRefreshOnly,
    PlanDestroy,
    Apply,
    /// Legacy type, like `Input` and `Refresh`; newer releases reject it.
    Validate,
    Input,
    Refresh,
}

impl GraphType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::PlanRefreshOnly => "plan-refresh-only",
            Self::PlanDestroy => "plan-destroy",
            Self::Apply => "apply",
            Self::Validate => "validate",
            Self::Input => "input",
            Self::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for GraphType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphOptions {
    pub graph_type: Option<GraphType>,
    /// Render the graph of a saved plan.
    pub plan_file: Option<PathBuf>,
    pub draw_cycles: bool,
    pub module_depth: Option<u32>,
}

impl GraphOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph_type(mut self, graph_type: GraphType) -> Self {
        self.graph_type = Some(graph_type);
        self
    }

    pub fn plan_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.plan_file = Some(path.into());
        self
    }

    pub fn draw_cycles(mut self, draw: bool) -> Self {
        self.draw_cycles = draw;
        self
    }

    pub fn module_depth(mut self, depth: u32) -> Self {
        self.module_depth = Some(depth);
        self
    }
}

/// Options for `terraform refresh`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshOptions {
    pub vars: Vars,
    pub var_files: Vec<PathBuf>,
    pub targets: Vec<String>,
    pub compact_warnings: bool,
    pub state: Option<PathBuf>,
    pub state_out: Option<PathBuf>,
    pub backup: Option<PathBuf>,
}

impl RefreshOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn var_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.var_files.push(path.into());
        self
    }

    pub fn target(mut self, address: impl Into<String>) -> Self {
        self.targets.push(address.into());
        self
    }

    pub fn compact_warnings(mut self, compact: bool) -> Self {
        self.compact_warnings = compact;
        self
    }

    pub fn state(mut self, path: impl Into<PathBuf>) -> Self {
        self.state = Some(path.into());
        self
    }

    pub fn state_out(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_out = Some(path.into());
        self
    }

    pub fn backup(mut self, path: impl Into<PathBuf>) -> Self {
        self.backup = Some(path.into());
        self
    }
}
