//! Invocation description types.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

/// A fully specified, immutable description of one subprocess launch.
///
/// Built through [`Invocation::builder`]; there are no setters, so an
/// invocation handed to a runner is exactly the one that gets executed and
/// reported in errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<String>,
    working_dir: PathBuf,
    env: BTreeMap<String, String>,
    isolate_env: bool,
    timeout: Option<Duration>,
}

impl Invocation {
    /// Start building an invocation of `program`.
    pub fn builder(program: impl Into<PathBuf>) -> InvocationBuilder {
        InvocationBuilder {
            program: program.into(),
            args: Vec::new(),
            working_dir: PathBuf::from("."),
            env: BTreeMap::new(),
            isolate_env: false,
            timeout: None,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Environment overlay applied on top of (or instead of) the inherited one.
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Whether the inherited environment is dropped before applying the overlay.
    pub fn isolate_env(&self) -> bool {
        self.isolate_env
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Format the command line for logging.
    pub fn command_line(&self) -> String {
        let mut cmd = self.program.to_string_lossy().to_string();
        for arg in &self.args {
            if arg.is_empty() || arg.contains(' ') || arg.contains('"') {
                cmd.push_str(&format!(" '{}'", arg));
            } else {
                cmd.push_str(&format!(" {}", arg));
            }
        }
        cmd
    }
}

/// Builder for [`Invocation`].
#[derive(Debug, Clone)]
pub struct InvocationBuilder {
    program: PathBuf,
    args: Vec<String>,
    working_dir: PathBuf,
    env: BTreeMap<String, String>,
    isolate_env: bool,
    timeout: Option<Duration>,
}

impl InvocationBuilder {
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Drop the inherited environment; only the overlay reaches the child.
    pub fn isolate_env(mut self, isolate: bool) -> Self {
        self.isolate_env = isolate;
        self
    }

    /// Set the timeout. A zero duration means no timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = if timeout.is_zero() { None } else { Some(timeout) };
        self
    }

    pub fn build(self) -> Invocation {
        Invocation {
            program: self.program,
            args: self.args,
            working_dir: self.working_dir,
            env: self.env,
            isolate_env: self.isolate_env,
            timeout: self.timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_builder() {
        let invocation = Invocation::builder("terraform")
            .arg("plan")
            .args(["-input=false", "-no-color"])
            .working_dir("/work")
            .env("TF_IN_AUTOMATION", "1")
            .timeout(Duration::from_secs(60))
            .build();

        assert_eq!(invocation.program(), Path::new("terraform"));
        assert_eq!(invocation.args(), ["plan", "-input=false", "-no-color"]);
        assert_eq!(invocation.working_dir(), Path::new("/work"));
        assert_eq!(invocation.env().get("TF_IN_AUTOMATION"), Some(&"1".to_string()));
        assert_eq!(invocation.timeout(), Some(Duration::from_secs(60)));
        assert!(!invocation.isolate_env());
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let invocation = Invocation::builder("terraform")
            .timeout(Duration::ZERO)
            .build();
        assert_eq!(invocation.timeout(), None);
    }

    #[test]
    fn test_command_line_quotes_spaces() {
        let invocation = Invocation::builder("terraform")
            .args(["plan", "-var=name=hello world"])
            .build();
        assert_eq!(invocation.command_line(), "terraform plan '-var=name=hello world'");
    }
}
