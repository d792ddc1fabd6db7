mod common;

use common::Workspace;
use serde_json::Value;

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|err| {
        panic!(
            "stdout is not JSON ({err}): {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

#[test]
fn init_writes_config_and_refuses_to_overwrite() {
    let fixture = Workspace::empty();
    let first = fixture.ctint(&["init"]);
    assert!(first.status.success(), "{}", String::from_utf8_lossy(&first.stderr));
    let config: Value =
        serde_json::from_str(&fixture.read("contracts.config.json")).expect("config JSON");
    assert_eq!(config["schema_version"], 1);
    assert!(config["spec_patterns"]
        .as_array()
        .is_some_and(|patterns| !patterns.is_empty()));

    let second = fixture.ctint(&["init"]);
    assert!(!second.status.success());
    assert!(String::from_utf8_lossy(&second.stderr).contains("--force"));

    let forced = fixture.ctint(&["init", "--force"]);
    assert!(forced.status.success());
}

#[test]
fn check_exits_nonzero_when_unhealthy() {
    let fixture = Workspace::billing();
    let output = fixture.ctint(&["check", "--json"]);
    assert_eq!(output.status.code(), Some(1));
    let result = stdout_json(&output);
    assert_eq!(result["healthy"], false);
    let issues = result["issues"].as_array().expect("issues array");
    assert!(issues
        .iter()
        .any(|issue| issue["type"] == "unresolved-ref" && issue["spec_key"] == "billing.refund"));
    assert_eq!(result["coverage"]["operation"]["orphaned"], 1);

    let text = fixture.ctint(&["check"]);
    let stdout = String::from_utf8_lossy(&text.stdout);
    assert!(stdout.contains("unresolved-ref"));
    assert!(stdout.contains("unhealthy"));
}

#[test]
fn fix_then_check_is_healthy() {
    let fixture = Workspace::billing();
    let dry = fixture.ctint(&["fix", "--strategy", "implement-skeleton", "--dry-run", "--json"]);
    assert!(dry.status.success());
    let batch = stdout_json(&dry);
    assert_eq!(batch["total"], 2);
    assert!(!fixture
        .path("contracts/operations/billing-refund.operation.ts")
        .exists());

    let applied = fixture.ctint(&["fix", "--strategy", "implement-skeleton"]);
    assert!(applied.status.success(), "{}", String::from_utf8_lossy(&applied.stdout));
    assert!(fixture
        .path("contracts/operations/billing-refund.operation.ts")
        .is_file());

    let check = fixture.ctint(&["check"]);
    assert_eq!(check.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&check.stdout).contains("healthy"));
}

#[test]
fn remove_reference_fix_edits_feature() {
    let fixture = Workspace::billing();
    let output = fixture.ctint(&["fix", "--feature", "billing", "--strategy", "remove-reference"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stdout));
    let feature = fixture.read("contracts/billing.feature.ts");
    assert!(!feature.contains("billing.refund"));
    assert!(!feature.contains("payments"));
    assert!(feature.contains("{ key: 'billing.charge', version: '1' },"));
}

#[test]
fn impls_reports_summary() {
    let fixture = Workspace::billing();
    let output = fixture.ctint(&["impls", "--json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let report = stdout_json(&output);
    assert_eq!(report["summary"]["total"], 4);
    assert_eq!(report["summary"]["implemented"], 1);

    let single = fixture.ctint(&["impls", "--spec", "contracts/billing.command.ts", "--json"]);
    assert!(single.status.success());
    let report = stdout_json(&single);
    assert_eq!(report["results"][0]["spec_key"], "billing.charge");
    assert_eq!(report["results"][0]["status"], "implemented");

    let missing = fixture.ctint(&["impls", "--spec", "contracts/nope.command.ts"]);
    assert!(!missing.status.success());
}

#[test]
fn unknown_strategy_is_rejected() {
    let fixture = Workspace::billing();
    let output = fixture.ctint(&["fix", "--strategy", "rewrite-everything"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown strategy"));
}
