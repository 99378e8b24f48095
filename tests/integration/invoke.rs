//! String-in, string-out invocations.

use aznaming::config::NamingOptions;
use aznaming::constants::CONFIG_URI_ENV;
use aznaming::invoke::{NamingInvoker, read_options};
use aznaming::test_utils::{sample_config, write_config};
use serde_json::{Value, json};
use serial_test::serial;
use tempfile::TempDir;

struct ConfigUriEnv;

impl ConfigUriEnv {
    fn set(value: &str) -> Self {
        unsafe { std::env::set_var(CONFIG_URI_ENV, value) };
        Self
    }

    fn unset() -> Self {
        unsafe { std::env::remove_var(CONFIG_URI_ENV) };
        Self
    }
}

impl Drop for ConfigUriEnv {
    fn drop(&mut self) {
        unsafe { std::env::remove_var(CONFIG_URI_ENV) };
    }
}

fn invoker(temp: &TempDir) -> NamingInvoker {
    let path = write_config(temp.path(), "naming.json", &sample_config());
    NamingInvoker::new([path.to_string_lossy().into_owned()]).with_base_dir(temp.path().to_path_buf())
}

#[test]
#[serial]
fn test_environment_sources_are_split_and_layered() {
    let temp = TempDir::new().unwrap();
    write_config(temp.path(), "one.json", &json!({"templates": {"kv": {"template": "one-{app}"}}}));
    write_config(temp.path(), "two.json", &json!({"templates": {"kv": {"template": "two-{app}"}}}));
    let _env = ConfigUriEnv::set("one.json;two.json");

    let result = invoker(&temp)
        .get_name("kv", Some(r#"{"app": "x"}"#), &NamingOptions::default())
        .unwrap();
    assert_eq!(result.result, "two-x");
}

#[test]
#[serial]
fn test_evaluate_name_json_maps_paths_to_reports() {
    let _env = ConfigUriEnv::unset();
    let temp = TempDir::new().unwrap();
    let graph = temp.path().join("graph.json");
    std::fs::write(
        &graph,
        json!({"values": {"app": "web"}, "rg": {"template": "rg", "values": {"region": "east us"}}}).to_string(),
    )
    .unwrap();

    let result = invoker(&temp)
        .evaluate_name_json(&graph.to_string_lossy(), None, None, &NamingOptions::default())
        .unwrap();
    assert!(result.is_success());

    let reports: Value = serde_json::from_str(&result.result).unwrap();
    assert_eq!(reports.as_object().map(|r| r.len()), Some(1));
    assert_eq!(reports["$.rg"]["result"], "rg-web-d-eus");
    assert_eq!(reports["$.rg"]["template"]["key"], "rg");
}

#[test]
#[serial]
fn test_default_template_for_unlabelled_nodes() {
    let _env = ConfigUriEnv::unset();
    let temp = TempDir::new().unwrap();
    let graph = r#"{"a": {"values": {"app": "one"}}, "b": {"values": {"app": "two"}}}"#;

    let result = invoker(&temp)
        .get_name_json(graph, None, Some("kv"), &NamingOptions::default())
        .unwrap();
    let document: Value = serde_json::from_str(&result.result).unwrap();
    assert_eq!(document, json!({"a": "kv-one-d", "b": "kv-two-d"}));
}

#[test]
#[serial]
fn test_options_document_from_file() {
    let _env = ConfigUriEnv::unset();
    let temp = TempDir::new().unwrap();
    let options_path = temp.path().join("options.json");
    std::fs::write(&options_path, r#"{"suppressError": true, "noAdditionalValues": true}"#).unwrap();
    let options = read_options(Some(&options_path.to_string_lossy())).unwrap();

    let result = invoker(&temp)
        .get_name("kv", Some(r#"{"app": "x", "extra": 1}"#), &options)
        .unwrap();
    assert_eq!(result.errors, vec!["Additional values not allowed. Additional values found: extra"]);
}

#[test]
fn test_unreadable_values_file() {
    let temp = TempDir::new().unwrap();
    let err = invoker(&temp)
        .get_name("kv", Some("does-not-exist.json"), &NamingOptions::default())
        .unwrap_err();
    assert!(err.to_string().contains("Failed to read values file"), "{err}");
}
