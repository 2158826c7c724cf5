//! `import`, `fmt`, `get` and `graph` output.

use std::sync::LazyLock;

use regex::Regex;

use tfwrap_runner::ExecutionResult;

use super::{init, raw_output, strip_ansi};
use crate::command::PreparedCommand;
use crate::error::TerraformResult;
use crate::result::{FmtResult, GetResult, GraphResult, ImportResult, ResultSource};

static PREPARED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Prepared (?P<type>\S+) for import").expect("Invalid import prepared regex")
});

pub fn parse_import(execution: &ExecutionResult, prepared: &PreparedCommand) -> TerraformResult<ImportResult> {
    let text = strip_ansi(&execution.stdout);
    let args = prepared.args();
    let (address, id) = match args {
        [.., address, id] => (address.clone(), id.clone()),
        _ => (String::new(), String::new()),
    };

    let mut result = ImportResult {
        address,
        id,
        raw: raw_output(execution),
        ..Default::default()
    };
    if text.contains("Import successful!") {
        result.imported = true;
        result.prepared = PREPARED_RE
            .captures_iter(&text)
            .map(|caps| caps["type"].to_string())
            .collect();
        result.source = ResultSource::Text;
    }
    Ok(result)
}

/// `fmt` lists each file it rewrote (or, with `-check`, would rewrite).
/// With `-check`, exit code 3 means some files are not formatted.
pub fn parse_fmt(execution: &ExecutionResult, _prepared: &PreparedCommand) -> TerraformResult<FmtResult> {
    let text = strip_ansi(&execution.stdout);
    let files: Vec<String> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        // -diff interleaves unified diffs with the file names.
        .filter(|line| !line.starts_with(['+', '-', '@', ' ', '\\']) && !line.starts_with("diff "))
        .map(|line| line.trim_end().to_string())
        .collect();

    Ok(FmtResult {
        formatted: execution.exit_code == 0 && files.is_empty(),
        files,
        source: ResultSource::Text,
        raw: raw_output(execution),
    })
}

pub fn parse_get(execution: &ExecutionResult, _prepared: &PreparedCommand) -> TerraformResult<GetResult> {
    let text = strip_ansi(&execution.stdout);
    let lines: Vec<&str> = text.lines().collect();
    Ok(GetResult {
        modules: init::modules(&lines),
        source: ResultSource::Text,
        raw: raw_output(execution),
    })
}

/// `graph` prints a DOT document; anything else is left raw.
pub fn parse_graph(execution: &ExecutionResult, _prepared: &PreparedCommand) -> TerraformResult<GraphResult> {
    let mut result = GraphResult {
        raw: raw_output(execution),
        ..Default::default()
    };
    if execution.stdout.contains("digraph") {
        result.dot = execution.stdout.trim().to_string();
        result.source = ResultSource::Text;
    }
    Ok(result)
}
