//! `terraform state` subcommands and `taint`/`untaint`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use tfwrap_runner::ExecutionResult;

use super::{raw_output, strip_ansi};
use crate::command::{PreparedCommand, Subcommand};
use crate::error::TerraformResult;
use crate::result::{
    ResultSource, StateListResult, StateMove, StateMvResult, StatePullResult,
    StateReplaceProviderResult, StateRmResult, StateShowResult, TaintResult,
};

struct TextPatterns {
    show_header: Regex,
    show_attribute: Regex,
    removed: Regex,
    moved: Regex,
    rm_done: Regex,
    mv_done: Regex,
    tainted: Regex,
    untainted: Regex,
    replaced: Regex,
}

static PATTERNS: LazyLock<TextPatterns> = LazyLock::new(|| TextPatterns {
    show_header: Regex::new(r"^#\s+(?P<addr>\S.*?):\s*$").expect("Invalid state show header regex"),
    show_attribute: Regex::new(r"^    (?P<key>[A-Za-z0-9_-]+)\s+= (?P<value>.+)$")
        .expect("Invalid state show attribute regex"),
    removed: Regex::new(r"^(?P<verb>Removed|Would remove) (?P<addr>.+)$").expect("Invalid state rm regex"),
    moved: Regex::new(r#"^(?P<verb>Move|Would move) "(?P<src>.+)" to "(?P<dst>.+)"$"#)
        .expect("Invalid state mv regex"),
    rm_done: Regex::new(r"(?m)^(?:Successfully removed|Would have removed) \d+ resource instance")
        .expect("Invalid state rm summary regex"),
    mv_done: Regex::new(r"(?m)^(?:Successfully moved|Would have moved) \d+ object")
        .expect("Invalid state mv summary regex"),
    tainted: Regex::new(r"Resource instance (?P<addr>.+) has been marked as tainted")
        .expect("Invalid taint regex"),
    untainted: Regex::new(r"Resource instance (?P<addr>.+) has been successfully untainted")
        .expect("Invalid untaint regex"),
    replaced: Regex::new(r"Successfully replaced provider for (?P<count>\d+) resources?")
        .expect("Invalid replace-provider regex"),
});

/// `state list` prints one address per line.
pub fn parse_list(execution: &ExecutionResult, _prepared: &PreparedCommand) -> TerraformResult<StateListResult> {
    let text = strip_ansi(&execution.stdout);
    Ok(StateListResult {
        addresses: text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect(),
        source: ResultSource::Text,
        raw: raw_output(execution),
    })
}

pub fn parse_show(execution: &ExecutionResult, prepared: &PreparedCommand) -> TerraformResult<StateShowResult> {
    let text = strip_ansi(&execution.stdout);
    let patterns = &*PATTERNS;

    let Some(address) = text
        .lines()
        .find_map(|line| patterns.show_header.captures(line))
        .map(|caps| caps["addr"].to_string())
    else {
        return Ok(StateShowResult {
            address: prepared.args().last().cloned().unwrap_or_default(),
            raw: raw_output(execution),
            ..Default::default()
        });
    };

    let mut attributes = BTreeMap::new();
    for caps in text.lines().filter_map(|line| patterns.show_attribute.captures(line)) {
        let value = caps["value"].trim();
        // Nested blocks and collections span several lines.
        if value.ends_with(['[', '{', '(']) || value.starts_with("<<") {
            continue;
        }
        attributes.insert(caps["key"].to_string(), value.to_string());
    }

    Ok(StateShowResult {
        address,
        attributes,
        source: ResultSource::Text,
        raw: raw_output(execution),
    })
}

pub fn parse_rm(execution: &ExecutionResult, _prepared: &PreparedCommand) -> TerraformResult<StateRmResult> {
    let text = strip_ansi(&execution.stdout);
    let patterns = &*PATTERNS;

    let mut result = StateRmResult {
        raw: raw_output(execution),
        ..Default::default()
    };
    if !patterns.rm_done.is_match(&text) {
        return Ok(result);
    }
    for caps in text.lines().filter_map(|line| patterns.removed.captures(line)) {
        result.dry_run = &caps["verb"] == "Would remove";
        result.removed.push(caps["addr"].to_string());
    }
    result.source = ResultSource::Text;
    Ok(result)
}

pub fn parse_mv(execution: &ExecutionResult, _prepared: &PreparedCommand) -> TerraformResult<StateMvResult> {
    let text = strip_ansi(&execution.stdout);
    let patterns = &*PATTERNS;

    let mut result = StateMvResult {
        raw: raw_output(execution),
        ..Default::default()
    };
    if !patterns.mv_done.is_match(&text) {
        return Ok(result);
    }
    for caps in text.lines().filter_map(|line| patterns.moved.captures(line)) {
        result.dry_run = &caps["verb"] == "Would move";
        result.moved.push(StateMove {
            source: caps["src"].to_string(),
            destination: caps["dst"].to_string(),
        });
    }
    result.source = ResultSource::Text;
    Ok(result)
}

/// `state pull` prints the raw state document, or nothing when the
/// workspace has no state yet.
pub fn parse_pull(execution: &ExecutionResult, _prepared: &PreparedCommand) -> TerraformResult<StatePullResult> {
    let mut result = StatePullResult {
        raw: raw_output(execution),
        ..Default::default()
    };
    let Ok(state) = serde_json::from_str::<Value>(execution.stdout.trim()) else {
        return Ok(result);
    };
    result.serial = state.get("serial").and_then(Value::as_u64);
    result.lineage = state.get("lineage").and_then(Value::as_str).map(String::from);
    result.terraform_version = state
        .get("terraform_version")
        .and_then(Value::as_str)
        .map(String::from);
    result.state = Some(state);
    result.source = ResultSource::Json;
    Ok(result)
}

/// `state replace-provider` lists the affected resources under a
/// "Changing N resources:" header before the summary line.
pub fn parse_replace_provider(
    execution: &ExecutionResult,
    _prepared: &PreparedCommand,
) -> TerraformResult<StateReplaceProviderResult> {
    let text = strip_ansi(&execution.stdout);
    let mut result = StateReplaceProviderResult {
        raw: raw_output(execution),
        ..Default::default()
    };

    if let Some(caps) = PATTERNS.replaced.captures(&text) {
        result.replaced = caps["count"].parse().unwrap_or_default();
        result.resources = text
            .lines()
            .skip_while(|line| !line.starts_with("Changing "))
            .skip(1)
            .map(str::trim)
            .skip_while(|line| line.is_empty())
            .take_while(|line| !line.is_empty())
            .map(String::from)
            .collect();
        result.source = ResultSource::Text;
    } else if text.contains("No matching resources found.") {
        result.source = ResultSource::Text;
    }
    Ok(result)
}

/// `taint` and `untaint`. With `-allow-missing` a missing instance exits 0
/// without the confirmation line, which leaves `changed` false.
pub fn parse_taint(execution: &ExecutionResult, prepared: &PreparedCommand) -> TerraformResult<TaintResult> {
    let text = strip_ansi(&execution.stdout);
    let pattern = match prepared.subcommand {
        Subcommand::Untaint => &PATTERNS.untainted,
        _ => &PATTERNS.tainted,
    };

    let mut result = TaintResult {
        address: prepared.args().last().cloned().unwrap_or_default(),
        raw: raw_output(execution),
        ..Default::default()
    };
    if let Some(caps) = pattern.captures(&text) {
        result.address = caps["addr"].to_string();
        result.changed = true;
        result.source = ResultSource::Text;
    } else if text.contains("No such resource instance") || execution.stderr.contains("No such resource instance") {
        result.source = ResultSource::Text;
    }
    Ok(result)
}
