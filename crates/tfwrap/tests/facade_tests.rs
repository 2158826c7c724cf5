//! Operation facade scenarios against scripted Terraform output.
//!
//! Every test drives `Terraform` through a `MockRunner`, covering both the
//! human-readable output of Terraform 0.14 and the JSON output of 1.x.

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use serde_json::json;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tfwrap::{
    ApplyOptions, ChangeAction, DestroyOptions, Feature, FmtOptions, GetOptions, GraphOptions,
    GraphType, ImportOptions, InitOptions, LogLine, LogStream, MockResponse, MockRunner,
    OperationResult, OutputOptions, PlanOptions, RefreshOptions, ResultSource, Severity, ShowKind,
    ShowOptions, StateListOptions, StateMvOptions, StateReplaceProviderOptions, StateRmOptions,
    StateShowOptions, TaintOptions, Terraform, TerraformConfig, TerraformError, TerraformVersion,
    WorkspaceAction,
};

const VERSION_014: &str = r#"{"terraform_version":"0.14.11","platform":"linux_amd64","provider_selections":{},"terraform_outdated":true}"#;
const VERSION_15: &str = r#"{"terraform_version":"1.5.7","platform":"linux_amd64","provider_selections":{"registry.terraform.io/hashicorp/null":"3.2.1"},"terraform_outdated":false}"#;

/// Log to the test writer; `RUST_LOG=tfwrap=debug` shows the command lines.
fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_test_writer())
        .with(EnvFilter::from_default_env().add_directive("warn".parse().unwrap()))
        .try_init();
}

/// Wrapper whose first call answers `terraform version`, followed by `responses`.
fn terraform(version: &str, responses: Vec<MockResponse>) -> (Terraform, Arc<MockRunner>) {
    let mut all = vec![MockResponse::success(version)];
    all.extend(responses);
    let runner = Arc::new(MockRunner::new().with_responses(all));
    let terraform = Terraform::with_runner(TerraformConfig::new("/infra"), runner.clone()).unwrap();
    (terraform, runner)
}

fn pinned(version: TerraformVersion, responses: Vec<MockResponse>) -> (Terraform, Arc<MockRunner>) {
    let runner = Arc::new(MockRunner::new().with_responses(responses));
    let terraform = Terraform::with_runner(TerraformConfig::new("/infra"), runner.clone())
        .unwrap()
        .with_version(version);
    (terraform, runner)
}

fn stream(lines: &[serde_json::Value]) -> String {
    lines
        .iter()
        .map(|line| line.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

fn ui_version() -> serde_json::Value {
    json!({"@level": "info", "@message": "Terraform 1.5.7", "type": "version", "terraform": "1.5.7", "ui": "1.1"})
}

fn planned(addr: &str, action: &str) -> serde_json::Value {
    json!({
        "@level": "info",
        "@message": format!("{}: Plan to {}", addr, action),
        "type": "planned_change",
        "change": {
            "resource": {"addr": addr, "module": "", "resource_type": "null_resource", "resource_name": "x"},
            "action": action
        }
    })
}

fn summary(add: u64, change: u64, remove: u64, operation: &str) -> serde_json::Value {
    json!({
        "@level": "info",
        "@message": format!("{}: {} to add, {} to change, {} to destroy.", operation, add, change, remove),
        "type": "change_summary",
        "changes": {"add": add, "change": change, "import": 0, "remove": remove, "operation": operation}
    })
}

#[test]
fn test_version_detected_once() {
    let (terraform, runner) = terraform(
        VERSION_15,
        vec![MockResponse::success("default\n"), MockResponse::success("default\n")],
    );

    let info = terraform.version_info().unwrap();
    assert_eq!(info.version, TerraformVersion::new(1, 5, 7));
    assert_eq!(info.platform.as_deref(), Some("linux_amd64"));
    assert_eq!(info.outdated, Some(false));
    assert!(terraform.supports(Feature::GenerateConfigOut).unwrap());
    assert!(!terraform.supports(Feature::JsonInitOutput).unwrap());

    terraform.workspace().show().unwrap();
    terraform.workspace().show().unwrap();

    let calls = runner.get_calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].args(), ["version", "-json"]);
    assert_eq!(calls[1].args(), ["workspace", "show"]);
}

#[test]
fn test_version_text_fallback() {
    let (terraform, _) = terraform("Terraform v0.12.31\non linux_amd64\n", vec![]);
    let info = terraform.version_info().unwrap();
    assert_eq!(info.version, TerraformVersion::new(0, 12, 31));
    assert_eq!(info.platform.as_deref(), Some("linux_amd64"));
}

#[test]
fn test_detection_failure_is_cached() {
    let runner = Arc::new(MockRunner::new().add_response(MockResponse::failure(1, "segfault")));
    let terraform = Terraform::with_runner(TerraformConfig::new("/infra"), runner.clone()).unwrap();

    let first = terraform.plan(&PlanOptions::new()).unwrap_err();
    let second = terraform.validate().unwrap_err();

    assert!(matches!(first, TerraformError::VersionDetection { .. }));
    assert!(matches!(second, TerraformError::VersionDetection { .. }));
    assert_eq!(second.context().map(|c| c.stderr.as_str()), Some("segfault"));
    assert_eq!(runner.call_count(), 1);
}

#[test]
fn test_unsupported_option_never_runs() {
    let (terraform, runner) = pinned(TerraformVersion::new(0, 14, 11), vec![]);

    let err = terraform
        .plan(&PlanOptions::new().refresh_only(true))
        .unwrap_err();

    match err {
        TerraformError::UnsupportedOption { option, required, .. } => {
            assert_eq!(option, "refresh_only");
            assert_eq!(required, TerraformVersion::new(0, 15, 4));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(runner.call_count(), 0);
}

#[test]
fn test_unsupported_option_after_detection() {
    let (terraform, runner) = terraform(VERSION_014, vec![]);

    let err = terraform
        .apply(&ApplyOptions::new().auto_approve(true).replace("null_resource.a"))
        .unwrap_err();

    assert!(matches!(err, TerraformError::UnsupportedOption { flag: "-replace", .. }));
    assert_eq!(runner.call_count(), 1);
}

#[test]
fn test_plan_is_deterministic() {
    let no_changes = stream(&[ui_version(), summary(0, 0, 0, "plan")]);
    let (terraform, runner) = terraform(
        VERSION_15,
        vec![MockResponse::success(no_changes.clone()), MockResponse::success(no_changes)],
    );
    let options = PlanOptions::new()
        .var("tags", json!({"team": "infra"}))
        .var("region", "eu-west-1")
        .target("module.net");

    let first = terraform.plan(&options).unwrap();
    let second = terraform.plan(&options).unwrap();

    let calls = runner.get_calls();
    assert_eq!(calls[1], calls[2]);
    assert_eq!(first.changes, second.changes);
}

#[test]
fn test_json_plan_with_creates_and_destroys() {
    let stdout = stream(&[
        ui_version(),
        planned("null_resource.a[0]", "create"),
        planned("null_resource.a[1]", "create"),
        planned("null_resource.a[2]", "create"),
        planned("null_resource.old[0]", "delete"),
        planned("null_resource.old[1]", "delete"),
        summary(3, 0, 2, "plan"),
    ]);
    let (terraform, runner) = terraform(VERSION_15, vec![MockResponse::exit(2, stdout, "")]);

    let plan = terraform
        .plan(&PlanOptions::new().detailed_exitcode(true))
        .unwrap();

    assert_eq!(plan.source, ResultSource::Json);
    assert!(plan.has_changes);
    assert_eq!(plan.resources_added, 3);
    assert_eq!(plan.resources_destroyed, 2);
    assert_eq!(plan.resources_changed, 0);
    assert_eq!(plan.changes.len(), 5);
    assert_eq!(plan.count(ChangeAction::Create), 3);
    assert_eq!(plan.count(ChangeAction::Destroy), 2);
    assert_eq!(plan.changes[3].address, "null_resource.old[0]");
    assert_eq!(
        runner.last_args().unwrap(),
        ["plan", "-json", "-no-color", "-input=false", "-detailed-exitcode"]
    );
}

#[test]
fn test_no_change_plan_json() {
    let stdout = stream(&[ui_version(), summary(0, 0, 0, "plan")]);
    let (terraform, _) = terraform(VERSION_15, vec![MockResponse::success(stdout)]);

    let plan = terraform
        .plan(&PlanOptions::new().detailed_exitcode(true))
        .unwrap();

    assert!(!plan.has_changes);
    assert!(plan.changes.is_empty());
    assert_eq!(plan.resources_added, 0);
}

#[test]
fn test_no_change_plan_text() {
    let stdout = "\nNo changes. Infrastructure is up-to-date.\n\nThis means that Terraform did not detect any differences between your\nconfiguration and real physical resources that exist.\n";
    let (terraform, runner) = terraform(VERSION_014, vec![MockResponse::success(stdout)]);

    let plan = terraform
        .plan(&PlanOptions::new().detailed_exitcode(true))
        .unwrap();

    assert_eq!(plan.source, ResultSource::Text);
    assert!(!plan.has_changes);
    assert!(plan.changes.is_empty());
    assert_eq!(
        runner.last_args().unwrap(),
        ["plan", "-no-color", "-input=false", "-detailed-exitcode"]
    );
}

#[test]
fn test_text_plan_with_changes() {
    let stdout = "\nAn execution plan has been generated and is shown below.\n\nTerraform will perform the following actions:\n\n  # null_resource.a will be created\n  + resource \"null_resource\" \"a\" {\n      + id = (known after apply)\n    }\n\n  # null_resource.b is tainted, so must be replaced\n-/+ resource \"null_resource\" \"b\" {\n      ~ id = \"1\" -> (known after apply)\n    }\n\nPlan: 2 to add, 0 to change, 1 to destroy.\n";
    let (terraform, _) = terraform(VERSION_014, vec![MockResponse::exit(2, stdout, "")]);

    let plan = terraform
        .plan(&PlanOptions::new().detailed_exitcode(true))
        .unwrap();

    assert!(plan.has_changes);
    assert_eq!(plan.resources_added, 2);
    assert_eq!(plan.resources_destroyed, 1);
    assert_eq!(plan.changes[0].action, ChangeAction::Create);
    assert_eq!(plan.changes[1].action, ChangeAction::Replace);
    assert_eq!(plan.changes[1].reason.as_deref(), Some("tainted"));
}

#[test]
fn test_plan_failure_is_operation_error() {
    let stderr = "\nError: Invalid reference\n\n  on main.tf line 4, in resource \"null_resource\" \"a\":\n   4:   triggers = { x = var.nope }\n\nA reference to a resource type must be followed by at least one attribute\naccess.\n";
    let (terraform, _) = terraform(VERSION_014, vec![MockResponse::failure(1, stderr)]);

    let err = terraform.plan(&PlanOptions::new()).unwrap_err();

    match &err {
        TerraformError::Operation { subcommand, exit_code, diagnostics, .. } => {
            assert_eq!(subcommand, "plan");
            assert_eq!(*exit_code, 1);
            assert_eq!(diagnostics[0].summary, "Invalid reference");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(err.to_string(), "terraform plan exited with code 1: Invalid reference");
    assert!(err.context().unwrap().command_line.contains("plan"));
}

#[test]
fn test_invalid_configuration_validates_false() {
    let stdout = json!({
        "format_version": "1.0",
        "valid": false,
        "error_count": 1,
        "warning_count": 0,
        "diagnostics": [{
            "severity": "error",
            "summary": "Unsupported block type",
            "detail": "Blocks of type \"resourcee\" are not expected here.",
            "range": {
                "filename": "main.tf",
                "start": {"line": 1, "column": 1, "byte": 0},
                "end": {"line": 1, "column": 10, "byte": 9}
            }
        }]
    })
    .to_string();
    let (terraform, _) = terraform(VERSION_15, vec![MockResponse::exit(1, stdout, "")]);

    let result = terraform.validate().unwrap();

    assert!(!result.valid);
    assert_eq!(result.error_count, 1);
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].severity, Severity::Error);
    assert_eq!(result.diagnostics[0].range.as_ref().unwrap().filename, "main.tf");
}

#[test]
fn test_zero_change_apply() {
    let stdout = stream(&[
        ui_version(),
        summary(0, 0, 0, "plan"),
        summary(0, 0, 0, "apply"),
        json!({"@level": "info", "@message": "Outputs: 0", "type": "outputs", "outputs": {}}),
    ]);
    let (terraform, runner) = terraform(VERSION_15, vec![MockResponse::success(stdout)]);

    let result = terraform.apply(&ApplyOptions::new().auto_approve(true)).unwrap();

    assert_eq!(result.source, ResultSource::Json);
    assert_eq!(result.resources_added, 0);
    assert_eq!(result.resources_changed, 0);
    assert_eq!(result.resources_destroyed, 0);
    assert!(result.applied.is_empty());
    assert!(result.outputs.is_empty());
    assert_eq!(
        runner.last_args().unwrap(),
        ["apply", "-json", "-no-color", "-input=false", "-auto-approve"]
    );
}

#[test]
fn test_text_apply_with_outputs() {
    let stdout = "null_resource.a: Creating...\nnull_resource.a: Creation complete after 0s [id=6543]\n\nApply complete! Resources: 1 added, 0 changed, 0 destroyed.\n\nOutputs:\n\nip = \"10.0.0.1\"\nport = 8080\n";
    let (terraform, _) = terraform(VERSION_014, vec![MockResponse::success(stdout)]);

    let result = terraform.apply(&ApplyOptions::new().auto_approve(true)).unwrap();

    assert_eq!(result.source, ResultSource::Text);
    assert_eq!(result.resources_added, 1);
    assert_eq!(result.applied[0].id.as_deref(), Some("6543"));
    assert_eq!(result.outputs["ip"].value, json!("10.0.0.1"));
    assert_eq!(result.outputs["port"].value, json!(8080));
}

#[test]
fn test_failed_apply_keeps_partial_result() {
    init_tracing();
    let stdout = stream(&[
        ui_version(),
        json!({
            "@level": "info",
            "@message": "null_resource.a: Creation complete after 0s [id=1]",
            "type": "apply_complete",
            "hook": {
                "resource": {"addr": "null_resource.a", "resource_type": "null_resource", "resource_name": "a"},
                "action": "create",
                "id_key": "id",
                "id_value": "1",
                "elapsed_seconds": 0
            }
        }),
        json!({
            "@level": "error",
            "@message": "null_resource.b: Creation errored after 0s",
            "type": "apply_errored",
            "hook": {
                "resource": {"addr": "null_resource.b", "resource_type": "null_resource", "resource_name": "b"},
                "action": "create",
                "elapsed_seconds": 0
            }
        }),
        json!({
            "@level": "error",
            "@message": "Error: local-exec provisioner error",
            "type": "diagnostic",
            "diagnostic": {"severity": "error", "summary": "local-exec provisioner error", "detail": "exit status 1"}
        }),
    ]);
    let (terraform, _) = terraform(VERSION_15, vec![MockResponse::exit(1, stdout, "")]);

    let err = terraform.apply(&ApplyOptions::new().auto_approve(true)).unwrap_err();

    assert_eq!(err.diagnostics()[0].summary, "local-exec provisioner error");
    let partial = err.partial().and_then(OperationResult::as_apply).unwrap();
    assert_eq!(partial.resources_added, 1);
    assert_eq!(partial.applied[0].address, "null_resource.a");
    assert_eq!(partial.applied[0].id.as_deref(), Some("1"));
}

#[test]
fn test_destroy_text() {
    let stdout = "null_resource.a: Destroying... [id=1]\nnull_resource.a: Destruction complete after 0s\n\nDestroy complete! Resources: 1 destroyed.\n";
    let (terraform, runner) = terraform(VERSION_014, vec![MockResponse::success(stdout)]);

    let result = terraform.destroy(&DestroyOptions::new().auto_approve(true)).unwrap();

    assert_eq!(result.resources_destroyed, 1);
    assert_eq!(result.applied[0].action, ChangeAction::Destroy);
    assert_eq!(runner.last_args().unwrap()[0], "destroy");
}

#[test]
fn test_timeout_maps_to_execution_timeout() {
    init_tracing();
    let runner = Arc::new(MockRunner::new().add_response(MockResponse::timeout("null_resource.a: Creating...\n")));
    let config = TerraformConfig::new("/infra").timeout_seconds(5);
    let terraform = Terraform::with_runner(config, runner)
        .unwrap()
        .with_version(TerraformVersion::new(1, 5, 7));

    let err = terraform.apply(&ApplyOptions::new().auto_approve(true)).unwrap_err();

    match err {
        TerraformError::ExecutionTimeout { timeout, context, .. } => {
            assert_eq!(timeout, std::time::Duration::from_secs(5));
            assert_eq!(context.stdout, "null_resource.a: Creating...\n");
            assert!(context.command_line.contains("apply"));
            assert_eq!(context.exit_code, None);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_apply_timeout_keeps_completed_resources() {
    init_tracing();
    let stdout = stream(&[
        ui_version(),
        json!({
            "@level": "info",
            "@message": "null_resource.a: Creation complete after 1s [id=7]",
            "type": "apply_complete",
            "hook": {
                "resource": {"addr": "null_resource.a"},
                "action": "create",
                "id_key": "id",
                "id_value": "7",
                "elapsed_seconds": 1
            }
        }),
        json!({"@level": "info", "@message": "null_resource.b: Creating...", "type": "apply_start",
               "hook": {"resource": {"addr": "null_resource.b"}, "action": "create"}}),
    ]);
    let runner = Arc::new(MockRunner::new().add_response(MockResponse::timeout(stdout)));
    let terraform = Terraform::with_runner(TerraformConfig::new("/infra").timeout_seconds(5), runner)
        .unwrap()
        .with_version(TerraformVersion::new(1, 5, 7));

    let err = terraform.apply(&ApplyOptions::new().auto_approve(true)).unwrap_err();

    assert!(matches!(err, TerraformError::ExecutionTimeout { .. }));
    let partial = err.partial().and_then(OperationResult::as_apply).unwrap();
    assert_eq!(partial.resources_added, 1);
    assert_eq!(partial.applied[0].address, "null_resource.a");
    assert_eq!(partial.applied[0].id.as_deref(), Some("7"));
    assert_eq!(partial.source, ResultSource::Json);
}

#[test]
fn test_destroy_timeout_text_partial() {
    let stdout = "null_resource.a: Destroying... [id=1]\nnull_resource.a: Destruction complete after 0s\nnull_resource.b: Destroying... [id=2]\n";
    let (terraform, _) = pinned(TerraformVersion::new(0, 14, 11), vec![MockResponse::timeout(stdout)]);

    let err = terraform.destroy(&DestroyOptions::new().auto_approve(true)).unwrap_err();

    let partial = err.partial().and_then(OperationResult::as_apply).unwrap();
    assert_eq!(partial.resources_destroyed, 1);
    assert_eq!(partial.source, ResultSource::Text);
}

#[test]
fn test_plan_timeout_has_no_partial() {
    let (terraform, _) = pinned(TerraformVersion::new(1, 5, 7), vec![MockResponse::timeout("")]);

    let err = terraform.plan(&PlanOptions::new()).unwrap_err();

    assert!(matches!(err, TerraformError::ExecutionTimeout { .. }));
    assert!(err.partial().is_none());
}

#[test]
fn test_import_only_plan_reports_changes() {
    let stdout = stream(&[
        ui_version(),
        planned("aws_s3_bucket.logs", "import"),
        json!({
            "@level": "info",
            "@message": "Plan: 1 to import, 0 to add, 0 to change, 0 to destroy.",
            "type": "change_summary",
            "changes": {"add": 0, "change": 0, "import": 1, "remove": 0, "operation": "plan"}
        }),
    ]);
    let (terraform, _) = terraform(VERSION_15, vec![MockResponse::success(stdout)]);

    let plan = terraform.plan(&PlanOptions::new()).unwrap();

    assert!(plan.has_changes);
    assert_eq!(plan.resources_imported, 1);
    assert_eq!(plan.count(ChangeAction::Import), 1);
}

#[test]
fn test_forget_only_text_plan_reports_changes() {
    let stdout = "\nTerraform will perform the following actions:\n\n # null_resource.old will no longer be managed by Terraform\n\nPlan: 0 to add, 0 to change, 0 to destroy, 1 to forget.\n";
    let (terraform, _) = pinned(TerraformVersion::new(0, 14, 11), vec![MockResponse::success(stdout)]);

    let plan = terraform.plan(&PlanOptions::new()).unwrap();

    assert!(plan.has_changes);
    assert_eq!(plan.resources_forgotten, 1);
}

#[test]
fn test_missing_binary_is_invocation_error() {
    let runner = Arc::new(MockRunner::new().simulate_failure("No such file or directory"));
    let terraform = Terraform::with_runner(TerraformConfig::new("/infra"), runner)
        .unwrap()
        .with_version(TerraformVersion::new(1, 5, 7));

    let err = terraform.validate().unwrap_err();
    assert!(matches!(err, TerraformError::Invocation { .. }));
}

#[test]
fn test_output_by_name() {
    let stdout = json!({
        "ip": {"sensitive": false, "type": "string", "value": "10.0.0.1"},
        "password": {"sensitive": true, "type": "string", "value": "hunter2"}
    })
    .to_string();
    let (terraform, runner) = terraform(
        VERSION_15,
        vec![MockResponse::success(stdout.clone()), MockResponse::success(stdout)],
    );

    let all = terraform.output(&OutputOptions::new()).unwrap();
    assert_eq!(all.len(), 2);
    assert!(all["password"].sensitive);

    let ip = terraform.output(&OutputOptions::new().name("ip")).unwrap();
    assert_eq!(ip.len(), 1);
    assert_eq!(ip["ip"].value, json!("10.0.0.1"));
    assert_eq!(runner.last_args().unwrap(), ["output", "-json", "-no-color"]);
}

#[test]
fn test_missing_output_is_not_found() {
    let (terraform, _) = terraform(VERSION_15, vec![MockResponse::success("{}")]);

    let err = terraform.output(&OutputOptions::new().name("endpoint")).unwrap_err();

    match err {
        TerraformError::OutputNotFound { name, .. } => assert_eq!(name, "endpoint"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_show_state() {
    let stdout = json!({
        "format_version": "1.0",
        "terraform_version": "1.5.7",
        "values": {"root_module": {"resources": [
            {"address": "null_resource.a", "mode": "managed", "type": "null_resource", "name": "a", "values": {"id": "1"}}
        ]}}
    })
    .to_string();
    let (terraform, _) = terraform(VERSION_15, vec![MockResponse::success(stdout)]);

    let result = terraform.show(&ShowOptions::new()).unwrap();

    assert_eq!(result.kind, ShowKind::State);
    assert_eq!(result.resources[0].resource_type, "null_resource");
}

#[test]
fn test_init_text() {
    let stdout = "\nInitializing the backend...\n\nInitializing provider plugins...\n- Finding latest version of hashicorp/null...\n- Installing hashicorp/null v3.2.1...\n- Installed hashicorp/null v3.2.1 (signed by HashiCorp)\n\nTerraform has been successfully initialized!\n";
    let (terraform, runner) = terraform(VERSION_014, vec![MockResponse::success(stdout)]);

    let result = terraform.init(&InitOptions::new().upgrade(true)).unwrap();

    assert!(result.initialized);
    assert_eq!(result.providers[0].source, "hashicorp/null");
    assert_eq!(result.providers[0].version, "3.2.1");
    assert_eq!(
        runner.last_args().unwrap(),
        ["init", "-no-color", "-input=false", "-upgrade"]
    );
}

#[test]
fn test_streaming_callback_and_log_handler() {
    let stdout = "Initializing the backend...\nTerraform has been successfully initialized!\n";
    let runner = Arc::new(MockRunner::new().add_response(MockResponse::exit(0, stdout, "a warning\n")));
    let handled: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = handled.clone();
    let terraform = Terraform::with_runner(TerraformConfig::new("/infra"), runner)
        .unwrap()
        .with_version(TerraformVersion::new(0, 14, 11))
        .with_log_handler(Arc::new(move |line: &LogLine| {
            sink.lock().unwrap().push(line.message.clone());
        }));

    let mut streamed: Vec<(LogStream, String)> = Vec::new();
    let result = terraform
        .init_streaming(&InitOptions::new(), &mut |line: &LogLine| {
            streamed.push((line.stream, line.message.clone()));
        })
        .unwrap();

    assert!(result.initialized);
    assert_eq!(
        streamed,
        vec![
            (LogStream::Stdout, "Initializing the backend...".to_string()),
            (LogStream::Stdout, "Terraform has been successfully initialized!".to_string()),
            (LogStream::Stderr, "a warning".to_string()),
        ]
    );
    assert_eq!(handled.lock().unwrap().len(), 3);
}

#[test]
fn test_state_commands() {
    let (terraform, runner) = terraform(
        VERSION_15,
        vec![
            MockResponse::success("null_resource.a\nnull_resource.b\n"),
            MockResponse::success("# null_resource.a:\nresource \"null_resource\" \"a\" {\n    id = \"1\"\n}\n"),
            MockResponse::success("Removed null_resource.b\nSuccessfully removed 1 resource instance(s).\n"),
            MockResponse::success("Move \"null_resource.a\" to \"null_resource.c\"\nSuccessfully moved 1 object(s).\n"),
        ],
    );
    let state = terraform.state();

    let list = state.list(&StateListOptions::new()).unwrap();
    assert_eq!(list.addresses, vec!["null_resource.a", "null_resource.b"]);

    let shown = state.show(&StateShowOptions::new("null_resource.a")).unwrap();
    assert_eq!(shown.attributes.get("id").map(String::as_str), Some("\"1\""));

    let removed = state.rm(&StateRmOptions::new(["null_resource.b"])).unwrap();
    assert_eq!(removed.removed, vec!["null_resource.b"]);
    assert!(!removed.dry_run);

    let moved = state
        .mv(&StateMvOptions::new("null_resource.a", "null_resource.c"))
        .unwrap();
    assert_eq!(moved.moved[0].destination, "null_resource.c");
    assert_eq!(
        runner.last_args().unwrap(),
        ["state", "mv", "null_resource.a", "null_resource.c"]
    );
}

#[test]
fn test_state_pull_and_replace_provider() {
    let (terraform, runner) = terraform(
        VERSION_15,
        vec![
            MockResponse::success(r#"{"version":4,"terraform_version":"1.5.7","serial":3,"lineage":"a1b2","resources":[]}"#),
            MockResponse::success("Changing 1 resources:\n\n  null_resource.a\n\nSuccessfully replaced provider for 1 resource.\n"),
        ],
    );
    let state = terraform.state();

    let pulled = state.pull().unwrap();
    assert_eq!(pulled.source, ResultSource::Json);
    assert_eq!(pulled.serial, Some(3));
    assert_eq!(runner.last_args().unwrap(), ["state", "pull"]);

    let options = StateReplaceProviderOptions::new("hashicorp/null", "acme/null").auto_approve(true);
    let replaced = state.replace_provider(&options).unwrap();
    assert_eq!(replaced.replaced, 1);
    assert_eq!(replaced.resources, vec!["null_resource.a"]);
    assert_eq!(
        runner.last_args().unwrap(),
        ["state", "replace-provider", "-auto-approve", "hashicorp/null", "acme/null"]
    );
}

#[test]
fn test_replace_provider_requires_approval() {
    let (terraform, runner) = pinned(TerraformVersion::new(1, 5, 7), vec![]);
    let options = StateReplaceProviderOptions::new("hashicorp/null", "acme/null");
    let err = terraform.state().replace_provider(&options).unwrap_err();
    assert!(matches!(err, TerraformError::InvalidOption(_)), "{err:?}");
    assert_eq!(runner.call_count(), 0);
}

#[test]
fn test_graph() {
    let (terraform, runner) = terraform(
        VERSION_15,
        vec![MockResponse::success("digraph {\n\t\"[root] null_resource.a\"\n}\n")],
    );

    let graph = terraform
        .graph(&GraphOptions::new().graph_type(GraphType::PlanDestroy))
        .unwrap();

    assert_eq!(graph.source, ResultSource::Text);
    assert!(graph.dot.contains("null_resource.a"));
    assert_eq!(runner.last_args().unwrap(), ["graph", "-type=plan-destroy"]);
}

#[test]
fn test_refresh_json() {
    init_tracing();
    let output = stream(&[
        ui_version(),
        json!({
            "@level": "info",
            "@message": "null_resource.a: Refresh complete [id=1]",
            "type": "refresh_complete",
            "hook": {"resource": {"addr": "null_resource.a"}, "id_key": "id", "id_value": "1"}
        }),
        json!({
            "@level": "info",
            "@message": "Outputs: 1",
            "type": "outputs",
            "outputs": {"id": {"sensitive": false, "type": "string", "value": "1"}}
        }),
    ]);
    let (terraform, runner) = terraform(VERSION_15, vec![MockResponse::success(&output)]);

    let refreshed = terraform.refresh(&RefreshOptions::new()).unwrap();

    assert_eq!(refreshed.source, ResultSource::Json);
    assert_eq!(refreshed.refreshed, vec!["null_resource.a"]);
    assert_eq!(refreshed.outputs["id"].value, json!("1"));
    let args = runner.last_args().unwrap();
    assert_eq!(args[0], "refresh");
    assert!(args.contains(&"-json".to_string()));
}

#[test]
fn test_refresh_text() {
    let (terraform, runner) = pinned(
        TerraformVersion::new(0, 14, 11),
        vec![MockResponse::success("null_resource.a: Refreshing state... [id=1]\n")],
    );

    let refreshed = terraform.refresh(&RefreshOptions::new().target("null_resource.a")).unwrap();

    assert_eq!(refreshed.source, ResultSource::Text);
    assert_eq!(refreshed.refreshed, vec!["null_resource.a"]);
    assert!(!runner.last_args().unwrap().contains(&"-json".to_string()));
}

#[test]
fn test_workspace_commands() {
    let (terraform, runner) = terraform(
        VERSION_15,
        vec![
            MockResponse::success("Created and switched to workspace \"staging\"!\n"),
            MockResponse::success("Switched to workspace \"default\".\n"),
            MockResponse::success("Created and switched to workspace \"dev\"!\n"),
            MockResponse::success("* default\n  dev\n  staging\n"),
            MockResponse::success("Deleted workspace \"dev\"!\n"),
        ],
    );
    let workspace = terraform.workspace();

    assert_eq!(workspace.new("staging").unwrap().action, WorkspaceAction::Created);
    assert_eq!(workspace.select("default").unwrap().action, WorkspaceAction::Selected);

    let created = workspace.select_or_create("dev").unwrap();
    assert_eq!(created.name, "dev");
    assert_eq!(created.action, WorkspaceAction::Created);

    let list = workspace.list().unwrap();
    assert_eq!(list.current.as_deref(), Some("default"));
    assert_eq!(list.workspaces.len(), 3);

    let deleted = workspace.delete("dev", true).unwrap();
    assert_eq!(deleted.action, WorkspaceAction::Deleted);
    assert_eq!(runner.last_args().unwrap(), ["workspace", "delete", "-force", "dev"]);
}

#[test]
fn test_select_or_create_needs_14() {
    let (terraform, runner) = pinned(TerraformVersion::new(1, 3, 9), vec![]);
    let err = terraform.workspace().select_or_create("dev").unwrap_err();
    assert!(matches!(err, TerraformError::UnsupportedOption { .. }));
    assert_eq!(runner.call_count(), 0);
}

#[test]
fn test_import_fmt_get() {
    let (terraform, _) = terraform(
        VERSION_15,
        vec![
            MockResponse::success("null_resource.a: Importing from ID \"1\"...\nnull_resource.a: Import prepared!\n  Prepared null_resource for import\n\nImport successful!\n"),
            MockResponse::exit(3, "main.tf\n", ""),
            MockResponse::success("- vpc in modules/vpc\n"),
        ],
    );

    let imported = terraform.import(&ImportOptions::new("null_resource.a", "1")).unwrap();
    assert!(imported.imported);
    assert_eq!(imported.address, "null_resource.a");

    let fmt = terraform.fmt(&FmtOptions::new().check(true)).unwrap();
    assert!(!fmt.formatted);
    assert_eq!(fmt.files, vec!["main.tf"]);

    let get = terraform.get(&GetOptions::new()).unwrap();
    assert_eq!(get.modules, vec!["vpc"]);
}

#[test]
fn test_fmt_write_failure() {
    let (terraform, _) = terraform(VERSION_15, vec![MockResponse::failure(2, "Error: Invalid character\n")]);
    let err = terraform.fmt(&FmtOptions::new()).unwrap_err();
    assert!(matches!(err, TerraformError::Operation { exit_code: 2, .. }));
}

#[test]
fn test_taint_and_untaint() {
    init_tracing();
    let (terraform, runner) = terraform(
        VERSION_15,
        vec![
            MockResponse::success("Resource instance null_resource.a has been marked as tainted.\n"),
            MockResponse::success("Resource instance null_resource.a has been successfully untainted.\n"),
        ],
    );

    let tainted = terraform.taint(&TaintOptions::new("null_resource.a")).unwrap();
    assert!(tainted.changed);
    assert_eq!(runner.last_args().unwrap(), ["taint", "null_resource.a"]);

    let untainted = terraform.untaint(&TaintOptions::new("null_resource.a")).unwrap();
    assert!(untainted.changed);
}
