//! `terraform refresh` output.

use std::sync::LazyLock;

use regex::Regex;

use tfwrap_runner::ExecutionResult;

use super::json_ui::{UiStream, OUTPUTS, REFRESH_COMPLETE};
use super::{diagnostics, outputs, parse_error, raw_output, strip_ansi};
use crate::command::{ParseStrategy, PreparedCommand};
use crate::error::TerraformResult;
use crate::result::{RefreshResult, ResultSource};

static REFRESHING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<addr>\S+): Refreshing state\.\.\.").expect("Invalid refresh line regex")
});

pub fn parse(execution: &ExecutionResult, prepared: &PreparedCommand) -> TerraformResult<RefreshResult> {
    let mut result = match prepared.strategy {
        ParseStrategy::Json => {
            let stream = UiStream::parse(&execution.stdout);
            if stream.is_empty() {
                return Err(parse_error(execution, prepared, "no JSON messages in refresh output"));
            }
            from_stream(&stream)
        }
        ParseStrategy::Text => from_text(execution),
    };
    result.raw = raw_output(execution);
    Ok(result)
}

fn from_stream(stream: &UiStream) -> RefreshResult {
    let refreshed = stream
        .of_kind(REFRESH_COMPLETE)
        .filter_map(|m| m.hook.as_ref()?.resource.as_ref())
        .map(|resource| resource.addr.clone())
        .collect();

    let mut result = RefreshResult {
        refreshed,
        diagnostics: diagnostics::from_ui_stream(stream),
        source: ResultSource::Json,
        ..Default::default()
    };
    if let Some(outputs) = stream.of_kind(OUTPUTS).filter_map(|m| m.outputs.as_ref()).last() {
        result.outputs = outputs::from_ui(outputs);
    }
    result
}

fn from_text(execution: &ExecutionResult) -> RefreshResult {
    let text = strip_ansi(&execution.stdout);

    let mut diagnostics = diagnostics::from_text(&execution.stdout);
    diagnostics.extend(diagnostics::from_text(&execution.stderr));
    let mut result = RefreshResult {
        refreshed: text
            .lines()
            .filter_map(|line| REFRESHING_RE.captures(line))
            .map(|caps| caps["addr"].to_string())
            .collect(),
        diagnostics,
        ..Default::default()
    };

    let outputs_at = text.lines().position(|line| line.trim() == "Outputs:");
    if let Some(index) = outputs_at {
        let section: Vec<&str> = text.lines().skip(index + 1).collect();
        result.outputs = outputs::from_text(&section.join("\n"));
    }
    if !result.refreshed.is_empty() || outputs_at.is_some() {
        result.source = ResultSource::Text;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Subcommand;
    use crate::parser::testing::{execution, prepared};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_text_refresh() {
        let stdout = "null_resource.a: Refreshing state... [id=1]\nmodule.net.aws_vpc.main: Refreshing state... [id=vpc-1]\n\nOutputs:\n\nvpc_id = \"vpc-1\"\n";
        let exec = execution(0, stdout, "");

        let result = parse(&exec, &prepared(Subcommand::Refresh, ParseStrategy::Text, &[0])).unwrap();

        assert_eq!(result.source, ResultSource::Text);
        assert_eq!(result.refreshed, vec!["null_resource.a", "module.net.aws_vpc.main"]);
        assert_eq!(result.outputs["vpc_id"].value, json!("vpc-1"));
    }

    #[test]
    fn test_json_refresh() {
        let stdout = [
            r#"{"@level":"info","@message":"Terraform 1.5.7","type":"version","terraform":"1.5.7","ui":"1.1"}"#,
            r#"{"@level":"info","@message":"null_resource.a: Refreshing state... [id=1]","type":"refresh_start","hook":{"resource":{"addr":"null_resource.a"},"id_key":"id","id_value":"1"}}"#,
            r#"{"@level":"info","@message":"null_resource.a: Refresh complete [id=1]","type":"refresh_complete","hook":{"resource":{"addr":"null_resource.a"},"id_key":"id","id_value":"1"}}"#,
            r#"{"@level":"info","@message":"Outputs: 1","type":"outputs","outputs":{"id":{"sensitive":false,"type":"string","value":"1"}}}"#,
        ]
        .join("\n");
        let exec = execution(0, &stdout, "");

        let result = parse(&exec, &prepared(Subcommand::Refresh, ParseStrategy::Json, &[0])).unwrap();

        assert_eq!(result.source, ResultSource::Json);
        assert_eq!(result.refreshed, vec!["null_resource.a"]);
        assert_eq!(result.outputs["id"].value, json!("1"));
    }

    #[test]
    fn test_text_without_markers_is_raw() {
        let exec = execution(0, "\n", "");
        let result = parse(&exec, &prepared(Subcommand::Refresh, ParseStrategy::Text, &[0])).unwrap();
        assert_eq!(result.source, ResultSource::Raw);
        assert!(result.refreshed.is_empty());
    }
}
