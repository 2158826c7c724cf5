//! Typed results of Terraform operations.
//!
//! Every result keeps the captured output in `raw` and records in `source`
//! how its structured fields were derived. `raw` is always the source of
//! truth; structured fields are a convenience.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How the structured fields of a result were derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    /// Terraform's machine-readable `-json` output.
    Json,
    /// Best-effort pattern extraction from human-readable output.
    Text,
    /// Nothing could be derived confidently; fields hold their defaults.
    #[default]
    Raw,
}

/// Action Terraform takes (or took) on a resource instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeAction {
    Create,
    Update,
    Destroy,
    Replace,
    /// Data source read.
    Read,
    NoOp,
    /// Existing object brought under management (`import` blocks).
    Import,
    /// Address change only (`moved` blocks).
    Move,
    /// Removed from state without destroying (`removed` blocks).
    Forget,
}

impl ChangeAction {
    /// Action names used by the JSON UI stream (`planned_change`, hooks).
    pub fn from_ui_action(action: &str) -> Option<Self> {
        match action {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Destroy),
            "replace" => Some(Self::Replace),
            "read" => Some(Self::Read),
            "noop" => Some(Self::NoOp),
            "import" => Some(Self::Import),
            "move" => Some(Self::Move),
            "remove" | "forget" => Some(Self::Forget),
            _ => None,
        }
    }

    /// Action lists used by the JSON plan representation (`resource_changes`).
    pub fn from_actions<S: AsRef<str>>(actions: &[S]) -> Option<Self> {
        let actions: Vec<&str> = actions.iter().map(AsRef::as_ref).collect();
        match actions.as_slice() {
            ["create"] => Some(Self::Create),
            ["update"] => Some(Self::Update),
            ["delete"] => Some(Self::Destroy),
            ["delete", "create"] | ["create", "delete"] => Some(Self::Replace),
            ["read"] => Some(Self::Read),
            ["no-op"] => Some(Self::NoOp),
            ["forget"] => Some(Self::Forget),
            _ => None,
        }
    }

    /// Verbs used by human-readable plan output (`will be created`).
    pub fn from_text(verb: &str) -> Option<Self> {
        match verb {
            "created" => Some(Self::Create),
            "updated" => Some(Self::Update),
            "destroyed" => Some(Self::Destroy),
            "replaced" => Some(Self::Replace),
            "read" => Some(Self::Read),
            _ => None,
        }
    }

    /// Whether this action modifies managed infrastructure or the state.
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::Read | Self::NoOp)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Destroy => "destroy",
            Self::Replace => "replace",
            Self::Read => "read",
            Self::NoOp => "no-op",
            Self::Import => "import",
            Self::Move => "move",
            Self::Forget => "forget",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A planned change to one resource instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceChange {
    pub address: String,
    pub action: ChangeAction,
    pub reason: Option<String>,
    /// Attribute snapshot before the change, when the output carried one.
    pub before: Option<Value>,
    /// Attribute snapshot after the change, when the output carried one.
    pub after: Option<Value>,
}

impl ResourceChange {
    pub fn new(address: impl Into<String>, action: ChangeAction) -> Self {
        Self {
            address: address.into(),
            action,
            reason: None,
            before: None,
            after: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePosition {
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
    pub filename: String,
    pub start: SourcePosition,
    pub end: Option<SourcePosition>,
}

/// An error or warning reported by Terraform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    pub range: Option<SourceRange>,
}

impl Diagnostic {
    pub fn new(severity: Severity, summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity,
            summary: summary.into(),
            detail: detail.into(),
            range: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// One root module output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputValue {
    /// `Null` when Terraform withheld a sensitive value.
    pub value: Value,
    pub sensitive: bool,
    /// Terraform type constraint, e.g. `"string"` or `["list","string"]`.
    pub value_type: Option<Value>,
}

impl OutputValue {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            sensitive: false,
            value_type: None,
        }
    }

    pub fn sensitive(value: Value) -> Self {
        Self {
            value,
            sensitive: true,
            value_type: None,
        }
    }
}

pub type OutputMap = BTreeMap<String, OutputValue>;

/// A provider that `init` installed or reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInstall {
    pub source: String,
    pub version: String,
    /// Already present in the plugin cache.
    pub reused: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitResult {
    pub initialized: bool,
    pub providers: Vec<ProviderInstall>,
    pub modules: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
    pub source: ResultSource,
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    pub changes: Vec<ResourceChange>,
    pub has_changes: bool,
    pub resources_added: u64,
    pub resources_changed: u64,
    pub resources_destroyed: u64,
    pub resources_imported: u64,
    /// Instances dropped from state without being destroyed.
    pub resources_forgotten: u64,
    pub diagnostics: Vec<Diagnostic>,
    pub source: ResultSource,
    pub raw: String,
}

impl PlanResult {
    /// Number of planned changes with the given action.
    pub fn count(&self, action: ChangeAction) -> usize {
        self.changes.iter().filter(|c| c.action == action).count()
    }
}

/// A resource instance that finished applying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedChange {
    pub address: String,
    pub action: ChangeAction,
    /// Identifier reported by the provider, e.g. `id=i-0abc`.
    pub id: Option<String>,
}

/// Result of `apply` and `destroy`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplyResult {
    pub resources_added: u64,
    pub resources_changed: u64,
    pub resources_destroyed: u64,
    pub resources_imported: u64,
    pub outputs: OutputMap,
    pub applied: Vec<AppliedChange>,
    pub diagnostics: Vec<Diagnostic>,
    pub source: ResultSource,
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidateResult {
    pub valid: bool,
    pub error_count: u64,
    pub warning_count: u64,
    pub diagnostics: Vec<Diagnostic>,
    pub source: ResultSource,
    pub raw: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowKind {
    State,
    Plan,
    #[default]
    Empty,
}

/// A resource instance from a state or planned-values representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateResource {
    pub address: String,
    /// `managed` or `data`.
    pub mode: String,
    pub resource_type: String,
    pub name: String,
    pub provider_name: Option<String>,
    pub index: Option<Value>,
    pub values: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShowResult {
    pub kind: ShowKind,
    pub format_version: Option<String>,
    pub terraform_version: Option<String>,
    pub resources: Vec<StateResource>,
    pub resource_changes: Vec<ResourceChange>,
    pub outputs: OutputMap,
    pub source: ResultSource,
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateListResult {
    pub addresses: Vec<String>,
    pub source: ResultSource,
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateShowResult {
    pub address: String,
    /// Top-level scalar attributes, values kept as their literal HCL text.
    pub attributes: BTreeMap<String, String>,
    pub source: ResultSource,
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRmResult {
    pub removed: Vec<String>,
    pub dry_run: bool,
    pub source: ResultSource,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMove {
    pub source: String,
    pub destination: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMvResult {
    pub moved: Vec<StateMove>,
    pub dry_run: bool,
    pub source: ResultSource,
    pub raw: String,
}

/// Result of `state pull`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatePullResult {
    /// The state document, `None` when there is no state yet.
    pub state: Option<Value>,
    pub serial: Option<u64>,
    pub lineage: Option<String>,
    pub terraform_version: Option<String>,
    pub source: ResultSource,
    pub raw: String,
}

/// Result of `state replace-provider`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateReplaceProviderResult {
    /// Resources whose provider was rewritten.
    pub resources: Vec<String>,
    pub replaced: u64,
    pub source: ResultSource,
    pub raw: String,
}

/// Result of `terraform graph`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphResult {
    /// The graph in DOT format.
    pub dot: String,
    pub source: ResultSource,
    pub raw: String,
}

/// Result of `terraform refresh`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefreshResult {
    /// Resource instances whose state was read back.
    pub refreshed: Vec<String>,
    pub outputs: OutputMap,
    pub diagnostics: Vec<Diagnostic>,
    pub source: ResultSource,
    pub raw: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceAction {
    Created,
    Selected,
    Deleted,
    Current,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceResult {
    pub name: String,
    pub action: WorkspaceAction,
    pub source: ResultSource,
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceListResult {
    pub workspaces: Vec<String>,
    pub current: Option<String>,
    pub source: ResultSource,
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    pub address: String,
    pub id: String,
    pub imported: bool,
    /// Resource types Terraform prepared for import.
    pub prepared: Vec<String>,
    pub source: ResultSource,
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FmtResult {
    /// Files that were (or, with `check`, would be) rewritten.
    pub files: Vec<String>,
    /// True when every input file was already canonically formatted.
    pub formatted: bool,
    pub source: ResultSource,
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetResult {
    pub modules: Vec<String>,
    pub source: ResultSource,
    pub raw: String,
}

/// Result of `taint` and `untaint`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaintResult {
    pub address: String,
    /// Whether the resource instance's taint status changed.
    pub changed: bool,
    pub source: ResultSource,
    pub raw: String,
}

/// Any operation result, e.g. the partial result attached to a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", content = "result", rename_all = "snake_case")]
pub enum OperationResult {
    Init(InitResult),
    Plan(PlanResult),
    Apply(ApplyResult),
    Validate(ValidateResult),
    Output(OutputMap),
    Show(ShowResult),
    StateList(StateListResult),
    StateShow(StateShowResult),
    StateRm(StateRmResult),
    StateMv(StateMvResult),
    StatePull(StatePullResult),
    StateReplaceProvider(StateReplaceProviderResult),
    Graph(GraphResult),
    Refresh(RefreshResult),
    Workspace(WorkspaceResult),
    WorkspaceList(WorkspaceListResult),
    Import(ImportResult),
    Fmt(FmtResult),
    Get(GetResult),
    Taint(TaintResult),
}

impl OperationResult {
    pub fn as_apply(&self) -> Option<&ApplyResult> {
        match self {
            Self::Apply(result) => Some(result),
            _ => None,
        }
    }
}
