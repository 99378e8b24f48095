//! The `aznaming` binary.

use assert_cmd::Command;
use aznaming::constants::{CONFIG_PATH_ENV, CONFIG_URI_ENV};
use aznaming::test_utils::{sample_config, write_config};
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;

/// Project directory with `naming.json` and an isolated (absent) global config.
fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    write_config(temp.path(), "naming.json", &sample_config());
    temp
}

fn aznaming(temp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("aznaming").unwrap();
    cmd.current_dir(temp.path())
        .env(CONFIG_PATH_ENV, temp.path().join("global.toml"))
        .env_remove(CONFIG_URI_ENV)
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_get_prints_name() {
    let temp = project();
    aznaming(&temp)
        .args(["--config", "naming.json", "get", "rg", "--value", "app=Web", "--value", "region=east us"])
        .assert()
        .success()
        .stdout("rg-web-d-eus\n");
}

#[test]
fn test_get_with_values_file_and_json_output() {
    let temp = project();
    fs::write(temp.path().join("values.json"), r#"{"app": "db", "instance": 3}"#).unwrap();

    let output = aznaming(&temp)
        .args(["get", "vm", "--values", "values.json", "--format", "json", "--config", "naming.json"])
        .assert()
        .success();
    let envelope: Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(envelope, json!({"result": "VM-DB-003", "errors": []}));
}

#[test]
fn test_get_failure_exits_non_zero() {
    let temp = project();
    aznaming(&temp)
        .args(["--config", "naming.json", "get", "rg", "--value", "app=web", "--value", "region=mars"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Value 'mars' for 'region' is not found"));
}

#[test]
fn test_suppressed_errors_become_warnings() {
    let temp = project();
    aznaming(&temp)
        .args(["--config", "naming.json", "--suppress-error", "get", "rg", "--value", "region=east us"])
        .assert()
        .success()
        .stderr(predicate::str::contains("warning").and(predicate::str::contains("Value for 'app' is required")));
}

#[test]
fn test_evaluate_prints_report() {
    let temp = project();
    let output = aznaming(&temp)
        .args(["--config", "naming.json", "evaluate", "kv", "--value", "app=vault"])
        .assert()
        .success();
    let report: Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    assert_eq!(report["result"], "kv-vault-d");
    assert_eq!(report["success"], true);
    assert_eq!(report["template"]["lengthMax"], 24);
}

#[test]
fn test_get_json_writes_output_file() {
    let temp = project();
    fs::write(
        temp.path().join("deployment.json"),
        json!({"values": {"app": "shop"}, "vault": {"template": "kv"}, "sku": "standard"}).to_string(),
    )
    .unwrap();

    aznaming(&temp)
        .args(["--config", "naming.json", "get-json", "deployment.json", "-o", "named.json"])
        .assert()
        .success()
        .stdout("");

    let named: Value = serde_json::from_str(&fs::read_to_string(temp.path().join("named.json")).unwrap()).unwrap();
    assert_eq!(named, json!({"vault": "kv-shop-d", "sku": "standard"}));
}

#[test]
fn test_test_command_fails_on_broken_template() {
    let temp = project();
    aznaming(&temp)
        .args(["--config", "naming.json", "test", "--key", "kv", "--value", "app=x"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"success\": true"));

    aznaming(&temp)
        .args(["--config", "naming.json", "test", "--key", "kv", "--key", "rg", "--value", "app=x"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"success\": false"));
}

#[test]
fn test_global_config_supplies_sources_and_defaults() {
    let temp = project();
    fs::write(
        temp.path().join("global.toml"),
        "config_uris = [\"naming.json\"]\nallow_truncation = true\n",
    )
    .unwrap();

    let long_app = "a".repeat(30);
    aznaming(&temp)
        .args(["get", "kv", "--value", &format!("app={long_app}")])
        .assert()
        .success()
        .stdout(format!("kv-{}\n", "a".repeat(21)));
}

#[test]
fn test_invalid_global_config_is_reported() {
    let temp = project();
    fs::write(temp.path().join("global.toml"), "config_uris = [").unwrap();

    aznaming(&temp)
        .args(["get", "kv", "--value", "app=x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Check the TOML syntax"));
}
