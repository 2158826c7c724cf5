//! Terraform version detection and the feature table.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{LazyLock, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use tfwrap_runner::ProcessRunner;

use crate::command::CommandBuilder;
use crate::config::TerraformConfig;
use crate::error::{FailureContext, TerraformError, TerraformResult};

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v?(\d+)\.(\d+)\.(\d+)(?:-([0-9A-Za-z.-]+))?$").expect("Invalid version regex")
});

static TEXT_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Terraform v(\d+\.\d+\.\d+(?:-[0-9A-Za-z.-]+)?)").expect("Invalid version text regex")
});

static TEXT_PROVIDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+ provider (\S+) v(\S+)$").expect("Invalid provider regex")
});

/// A Terraform release number.
///
/// Ordered by `major.minor.patch`; a prerelease sorts before its release.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TerraformVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
}

impl TerraformVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            prerelease: None,
        }
    }

    /// Parse `1.5.7`, `v1.5.7` or `1.6.0-beta1`.
    pub fn parse(input: &str) -> Option<Self> {
        let caps = VERSION_RE.captures(input.trim())?;
        Some(Self {
            major: caps[1].parse().ok()?,
            minor: caps[2].parse().ok()?,
            patch: caps[3].parse().ok()?,
            prerelease: caps.get(4).map(|m| m.as_str().to_string()),
        })
    }

    /// Whether this release has `feature`. Prereleases count as their release.
    pub fn supports(&self, feature: Feature) -> bool {
        let min = feature.min_version();
        (self.major, self.minor, self.patch) >= (min.major, min.minor, min.patch)
    }
}

impl Ord for TerraformVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for TerraformVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TerraformVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.prerelease {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

impl FromStr for TerraformVersion {
    type Err = TerraformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| TerraformError::VersionDetection {
            message: format!("'{}' is not a Terraform version", s),
            context: None,
        })
    }
}

/// Version-dependent Terraform capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    DetailedExitcode,
    WorkspaceShow,
    JsonValidateOutput,
    JsonShowOutput,
    JsonOutputCommand,
    VersionJson,
    LockfileReadonly,
    ReplaceAddress,
    JsonPlanOutput,
    JsonApplyOutput,
    RefreshOnly,
    WorkspaceSelectOrCreate,
    GenerateConfigOut,
    JsonInitOutput,
}

impl Feature {
    pub const ALL: [Feature; 14] = [
        Feature::DetailedExitcode,
        Feature::WorkspaceShow,
        Feature::JsonValidateOutput,
        Feature::JsonShowOutput,
        Feature::JsonOutputCommand,
        Feature::VersionJson,
        Feature::LockfileReadonly,
        Feature::ReplaceAddress,
        Feature::JsonPlanOutput,
        Feature::JsonApplyOutput,
        Feature::RefreshOnly,
        Feature::WorkspaceSelectOrCreate,
        Feature::GenerateConfigOut,
        Feature::JsonInitOutput,
    ];

    /// First Terraform release with this feature.
    pub fn min_version(&self) -> TerraformVersion {
        match self {
            Self::DetailedExitcode => TerraformVersion::new(0, 6, 0),
            Self::WorkspaceShow => TerraformVersion::new(0, 11, 0),
            Self::JsonValidateOutput | Self::JsonShowOutput | Self::JsonOutputCommand => {
                TerraformVersion::new(0, 12, 0)
            }
            Self::VersionJson => TerraformVersion::new(0, 13, 0),
            Self::LockfileReadonly => TerraformVersion::new(0, 14, 0),
            Self::ReplaceAddress => TerraformVersion::new(0, 15, 2),
            Self::JsonPlanOutput | Self::JsonApplyOutput => TerraformVersion::new(0, 15, 3),
            Self::RefreshOnly => TerraformVersion::new(0, 15, 4),
            Self::WorkspaceSelectOrCreate => TerraformVersion::new(1, 4, 0),
            Self::GenerateConfigOut => TerraformVersion::new(1, 5, 0),
            Self::JsonInitOutput => TerraformVersion::new(1, 9, 0),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::DetailedExitcode => "detailed-exitcode",
            Self::WorkspaceShow => "workspace-show",
            Self::JsonValidateOutput => "json-validate-output",
            Self::JsonShowOutput => "json-show-output",
            Self::JsonOutputCommand => "json-output-command",
            Self::VersionJson => "version-json",
            Self::LockfileReadonly => "lockfile-readonly",
            Self::ReplaceAddress => "replace-address",
            Self::JsonPlanOutput => "json-plan-output",
            Self::JsonApplyOutput => "json-apply-output",
            Self::RefreshOnly => "refresh-only",
            Self::WorkspaceSelectOrCreate => "workspace-select-or-create",
            Self::GenerateConfigOut => "generate-config-out",
            Self::JsonInitOutput => "json-init-output",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Feature {
    type Err = TerraformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|feature| feature.name() == s)
            .ok_or_else(|| TerraformError::InvalidOption(format!("unknown feature '{}'", s)))
    }
}

/// What `terraform version` reports about the installed binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: TerraformVersion,
    pub platform: Option<String>,
    /// Whether Terraform considers itself out of date; `None` if unknown.
    pub outdated: Option<bool>,
    /// Provider versions selected in the working directory.
    pub provider_selections: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct VersionDocument {
    terraform_version: String,
    #[serde(default)]
    platform: Option<String>,
    #[serde(default)]
    provider_selections: BTreeMap<String, String>,
    #[serde(default)]
    terraform_outdated: Option<bool>,
}

impl VersionInfo {
    pub fn new(version: TerraformVersion) -> Self {
        Self {
            version,
            platform: None,
            outdated: None,
            provider_selections: BTreeMap::new(),
        }
    }

    /// Parse `terraform version -json` output, falling back to the text form.
    pub fn parse_output(stdout: &str) -> Option<Self> {
        Self::parse_json(stdout).or_else(|| Self::parse_text(stdout))
    }

    fn parse_json(stdout: &str) -> Option<Self> {
        let doc: VersionDocument = serde_json::from_str(stdout.trim()).ok()?;
        Some(Self {
            version: TerraformVersion::parse(&doc.terraform_version)?,
            platform: doc.platform,
            outdated: doc.terraform_outdated,
            provider_selections: doc.provider_selections,
        })
    }

    fn parse_text(stdout: &str) -> Option<Self> {
        let caps = TEXT_VERSION_RE.captures(stdout)?;
        let mut info = Self::new(TerraformVersion::parse(&caps[1])?);

        for line in stdout.lines().map(str::trim) {
            if let Some(platform) = line.strip_prefix("on ") {
                info.platform = Some(platform.to_string());
            } else if let Some(caps) = TEXT_PROVIDER_RE.captures(line) {
                info.provider_selections
                    .insert(caps[1].to_string(), caps[2].to_string());
            }
        }
        info.outdated = Some(stdout.contains("is out of date"));
        Some(info)
    }
}

#[derive(Debug, Clone)]
struct DetectionFailure {
    message: String,
    context: Option<FailureContext>,
}

impl DetectionFailure {
    fn to_error(&self) -> TerraformError {
        TerraformError::VersionDetection {
            message: self.message.clone(),
            context: self.context.clone().map(Box::new),
        }
    }
}

/// Detects the Terraform version once and caches the outcome.
///
/// A failed detection is cached too, so every later operation of the same
/// wrapper fails fast with the same error instead of re-running Terraform.
#[derive(Debug, Default)]
pub struct VersionAdapter {
    detected: OnceLock<Result<VersionInfo, DetectionFailure>>,
}

impl VersionAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// An adapter that never runs detection.
    pub fn pinned(version: TerraformVersion) -> Self {
        let detected = OnceLock::new();
        let _ = detected.set(Ok(VersionInfo::new(version)));
        Self { detected }
    }

    /// Cached version info, if detection already ran and succeeded.
    pub fn cached(&self) -> Option<&VersionInfo> {
        self.detected.get().and_then(|outcome| outcome.as_ref().ok())
    }

    /// Detected version info, running `terraform version` on first use.
    pub fn detect(
        &self,
        runner: &dyn ProcessRunner,
        config: &TerraformConfig,
    ) -> TerraformResult<&VersionInfo> {
        self.detected
            .get_or_init(|| Self::run_detection(runner, config))
            .as_ref()
            .map_err(DetectionFailure::to_error)
    }

    fn run_detection(
        runner: &dyn ProcessRunner,
        config: &TerraformConfig,
    ) -> Result<VersionInfo, DetectionFailure> {
        let invocation = CommandBuilder::version(config);
        info!("Detecting Terraform version using {:?}", config.binary);

        let execution = runner.run(&invocation, None).map_err(|e| DetectionFailure {
            message: e.to_string(),
            context: Some(FailureContext::from_invocation(&invocation, "", "")),
        })?;

        if !execution.success() {
            return Err(DetectionFailure {
                message: format!("terraform version exited with code {}", execution.exit_code),
                context: Some(FailureContext::from_execution(&execution)),
            });
        }

        let info = VersionInfo::parse_output(&execution.stdout).ok_or_else(|| DetectionFailure {
            message: "unrecognized terraform version output".to_string(),
            context: Some(FailureContext::from_execution(&execution)),
        })?;

        debug!("Detected Terraform {} ({:?})", info.version, info.platform);
        if info.outdated == Some(true) {
            warn!("Terraform {} is out of date", info.version);
        }
        Ok(info)
    }
}
