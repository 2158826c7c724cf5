//! `terraform init` output.
//!
//! Terraform 1.9+ can emit init progress as JSON; its `@message` texts carry
//! the same lines as the human-readable form, so both go through one line
//! matcher.

use std::sync::LazyLock;

use regex::Regex;

use tfwrap_runner::ExecutionResult;

use super::json_ui::UiStream;
use super::{diagnostics, parse_error, raw_output, strip_ansi};
use crate::command::{ParseStrategy, PreparedCommand};
use crate::error::TerraformResult;
use crate::result::{Diagnostic, InitResult, ProviderInstall, ResultSource};

struct TextPatterns {
    provider: Regex,
    module: Regex,
    initialized: Regex,
}

static PATTERNS: LazyLock<TextPatterns> = LazyLock::new(|| TextPatterns {
    provider: Regex::new(
        r"^-\s+(?P<kind>Installed|Using previously-installed) (?P<src>\S+) v(?P<ver>\d+\.\d+\.\d+(?:-[0-9A-Za-z.]+?)?)(?:\.\.\.|\s|$)",
    )
    .expect("Invalid provider install regex"),
    module: Regex::new(r"^-\s+(?P<name>[\w.-]+) in (?P<path>.+)$").expect("Invalid module regex"),
    initialized: Regex::new(
        r"Terraform has been successfully initialized!|Terraform initialized in an empty directory!",
    )
    .expect("Invalid init success regex"),
});

/// Parse init output produced with exit code 0.
pub fn parse(execution: &ExecutionResult, prepared: &PreparedCommand) -> TerraformResult<InitResult> {
    let mut result = match prepared.strategy {
        ParseStrategy::Json => {
            let stream = UiStream::parse(&execution.stdout);
            if stream.is_empty() {
                return Err(parse_error(execution, prepared, "no JSON messages in init output"));
            }
            let lines: Vec<&str> = stream.messages.iter().map(|m| m.message.as_str()).collect();
            let mut result = from_lines(&lines, ResultSource::Json);
            result.diagnostics = diagnostics::from_ui_stream(&stream);
            result
        }
        ParseStrategy::Text => {
            let text = strip_ansi(&execution.stdout);
            let lines: Vec<&str> = text.lines().collect();
            let mut result = from_lines(&lines, ResultSource::Text);
            result.diagnostics = text_diagnostics(execution);
            result
        }
    };
    result.raw = raw_output(execution);
    Ok(result)
}

fn text_diagnostics(execution: &ExecutionResult) -> Vec<Diagnostic> {
    let mut found = diagnostics::from_text(&execution.stdout);
    found.extend(diagnostics::from_text(&execution.stderr));
    found
}

/// Module names from `- name in path` progress lines. Also used by `get`.
pub(crate) fn modules(lines: &[&str]) -> Vec<String> {
    let mut modules: Vec<String> = Vec::new();
    for line in lines {
        if let Some(caps) = PATTERNS.module.captures(line.trim()) {
            let name = caps["name"].to_string();
            if !modules.contains(&name) {
                modules.push(name);
            }
        }
    }
    modules
}

fn from_lines(lines: &[&str], source: ResultSource) -> InitResult {
    let patterns = &*PATTERNS;
    let initialized = lines.iter().any(|line| patterns.initialized.is_match(line));
    if !initialized {
        return InitResult::default();
    }

    let providers = lines
        .iter()
        .filter_map(|line| patterns.provider.captures(line.trim()))
        .map(|caps| ProviderInstall {
            source: caps["src"].to_string(),
            version: caps["ver"].to_string(),
            reused: &caps["kind"] == "Using previously-installed",
        })
        .collect();

    InitResult {
        initialized,
        providers,
        modules: modules(lines),
        source,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Subcommand;
    use crate::parser::testing::{execution, prepared};
    use pretty_assertions::assert_eq;

    const INIT_TEXT: &str = "\nInitializing modules...\n- vpc in modules/vpc\n\nInitializing the backend...\n\nInitializing provider plugins...\n- Finding hashicorp/null versions matching \"~> 3.0\"...\n- Installing hashicorp/null v3.2.1...\n- Installed hashicorp/null v3.2.1 (signed by HashiCorp)\n- Using previously-installed hashicorp/random v3.5.1\n\nTerraform has been successfully initialized!\n";

    #[test]
    fn test_text_init() {
        let exec = execution(0, INIT_TEXT, "");
        let result = parse(&exec, &prepared(Subcommand::Init, ParseStrategy::Text, &[0])).unwrap();

        assert!(result.initialized);
        assert_eq!(result.source, ResultSource::Text);
        assert_eq!(
            result.providers,
            vec![
                ProviderInstall {
                    source: "hashicorp/null".to_string(),
                    version: "3.2.1".to_string(),
                    reused: false,
                },
                ProviderInstall {
                    source: "hashicorp/random".to_string(),
                    version: "3.5.1".to_string(),
                    reused: true,
                },
            ]
        );
        assert_eq!(result.modules, vec!["vpc"]);
    }

    #[test]
    fn test_json_init() {
        let stdout = [
            r#"{"@level":"info","@message":"Initializing provider plugins...","type":"init_output","message_code":"initializing_provider_plugin_message"}"#,
            r#"{"@level":"info","@message":"- Installed hashicorp/null v3.2.1 (signed by HashiCorp)","type":"log"}"#,
            r#"{"@level":"info","@message":"Terraform has been successfully initialized!","type":"init_output"}"#,
        ]
        .join("\n");
        let exec = execution(0, &stdout, "");

        let result = parse(&exec, &prepared(Subcommand::Init, ParseStrategy::Json, &[0])).unwrap();

        assert!(result.initialized);
        assert_eq!(result.source, ResultSource::Json);
        assert_eq!(result.providers.len(), 1);
    }

    #[test]
    fn test_missing_marker_is_raw() {
        let exec = execution(0, "Initializing the backend...\n", "");
        let result = parse(&exec, &prepared(Subcommand::Init, ParseStrategy::Text, &[0])).unwrap();

        assert!(!result.initialized);
        assert_eq!(result.source, ResultSource::Raw);
        assert!(result.providers.is_empty());
    }
}
