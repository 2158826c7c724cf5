//! Wrapper configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{TerraformError, TerraformResult};

/// Configuration shared by every command a [`crate::Terraform`] runs.
///
/// Can be built in code:
///
/// ```
/// use tfwrap::TerraformConfig;
///
/// let config = TerraformConfig::new("./infra")
///     .env("TF_LOG", "WARN")
///     .timeout_seconds(1800)
///     .parallelism(4);
/// assert_eq!(config.parallelism, Some(4));
/// ```
///
/// or loaded from YAML:
///
/// ```yaml
/// binary: /usr/local/bin/terraform
/// working_dir: ./infra
/// timeout_seconds: 1800
/// env:
///   TF_LOG: WARN
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerraformConfig {
    /// Terraform executable, resolved through `PATH` when not absolute.
    pub binary: PathBuf,
    /// Directory holding the root module.
    pub working_dir: PathBuf,
    /// Variables added on top of the inherited environment.
    pub env: BTreeMap<String, String>,
    /// Pass only `env` to Terraform, dropping the inherited environment.
    pub isolate_env: bool,
    /// Per-call timeout in seconds; 0 disables it.
    ///
    /// A timed out process is killed. For `apply` and `destroy` this can
    /// leave infrastructure partially changed and the state locked.
    pub timeout_seconds: u64,
    /// Keep Terraform's colored output (`-no-color` is passed otherwise).
    pub color: bool,
    /// Allow interactive input (`-input=false` is passed otherwise).
    pub input: bool,
    /// Hold the state lock during operations (`-lock=false` otherwise).
    pub lock: bool,
    /// Duration to retry a state lock, e.g. `"30s"`.
    pub lock_timeout: Option<String>,
    /// Limit on concurrent operations as Terraform walks the graph.
    pub parallelism: Option<u32>,
}

impl Default for TerraformConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("terraform"),
            working_dir: PathBuf::from("."),
            env: BTreeMap::new(),
            isolate_env: false,
            timeout_seconds: 0,
            color: false,
            input: false,
            lock: true,
            lock_timeout: None,
            parallelism: None,
        }
    }
}

impl TerraformConfig {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            ..Default::default()
        }
    }

    pub fn binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn isolate_env(mut self, isolate: bool) -> Self {
        self.isolate_env = isolate;
        self
    }

    pub fn timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn input(mut self, input: bool) -> Self {
        self.input = input;
        self
    }

    pub fn lock(mut self, lock: bool) -> Self {
        self.lock = lock;
        self
    }

    pub fn lock_timeout(mut self, timeout: impl Into<String>) -> Self {
        self.lock_timeout = Some(timeout.into());
        self
    }

    pub fn parallelism(mut self, parallelism: u32) -> Self {
        self.parallelism = Some(parallelism);
        self
    }

    /// Per-call timeout, `None` when disabled.
    ///
    /// A timed-out call kills Terraform mid-run. An interrupted apply or
    /// destroy can leave infrastructure partially changed and the state
    /// locked.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }

    /// Parse a configuration from YAML.
    pub fn from_yaml_str(yaml: &str) -> TerraformResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file. A relative `working_dir` is resolved
    /// against the directory containing the file.
    pub fn load(path: impl AsRef<Path>) -> TerraformResult<Self> {
        let path = path.as_ref();
        debug!("Loading Terraform configuration from {:?}", path);

        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml_str(&content)?;

        if config.working_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.working_dir = parent.join(&config.working_dir);
            }
        }
        Ok(config)
    }

    /// Reject values Terraform would refuse before anything runs.
    pub fn validate(&self) -> TerraformResult<()> {
        if self.binary.as_os_str().is_empty() {
            return Err(TerraformError::Config("binary must not be empty".to_string()));
        }
        if self.parallelism == Some(0) {
            return Err(TerraformError::Config(
                "parallelism must be at least 1".to_string(),
            ));
        }
        if let Some(timeout) = &self.lock_timeout {
            if timeout.trim().is_empty() {
                return Err(TerraformError::Config(
                    "lock_timeout must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}
