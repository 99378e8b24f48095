//! Configuration sources on disk: manifests, mounts, shadowing and references.

use aznaming::config::NamingOptions;
use aznaming::core::NamingError;
use aznaming::naming::{NamingService, Values};
use aznaming::sections::ConfigResolver;
use aznaming::test_utils::{sample_config, write_config};
use serde_json::{Value, json};
use tempfile::TempDir;

fn values(value: Value) -> Values {
    value.as_object().cloned().unwrap_or_default()
}

#[test]
fn test_manifest_expands_relative_sources() {
    let temp = TempDir::new().unwrap();
    write_config(temp.path(), "base/naming.json", &sample_config());
    write_config(
        temp.path(),
        "base/extra.json",
        &json!({"web": {"template": "app-{app}-{env}"}}),
    );
    write_config(
        temp.path(),
        "manifest.json",
        &json!({"sections": [
            {"uri": "base/extra.json", "path": "$.templates"},
            {"uri": "base/naming.json"}
        ]}),
    );

    let resolver = ConfigResolver::with_base_dir(temp.path().to_path_buf());
    assert!(resolver.add_section("manifest.json", None));
    let service = NamingService::new(resolver);

    let (name, _) = service.get_name("web", &values(json!({"app": "Shop"}))).unwrap();
    assert_eq!(name, "app-shop-d");
}

#[test]
fn test_nested_manifest_sources_resolve_against_their_own_directory() {
    let temp = TempDir::new().unwrap();
    write_config(temp.path(), "conf/parts/naming.json", &sample_config());
    write_config(
        temp.path(),
        "conf/manifest.json",
        &json!({"sections": [{"uri": "parts/naming.json"}]}),
    );
    write_config(temp.path(), "root.json", &json!({"sections": [{"uri": "conf/manifest.json"}]}));

    let resolver = ConfigResolver::with_base_dir(temp.path().to_path_buf());
    resolver.add_section("root.json", None);
    let service = NamingService::new(resolver);

    let (name, _) = service.get_name("kv", &values(json!({"app": "vault"}))).unwrap();
    assert_eq!(name, "kv-vault-d");
}

#[test]
fn test_added_config_shadows_files() {
    let temp = TempDir::new().unwrap();
    let path = write_config(temp.path(), "naming.json", &sample_config());

    let resolver = ConfigResolver::with_base_dir(temp.path().to_path_buf());
    resolver.add_section(&path.to_string_lossy(), None);
    let service = NamingService::new(resolver);

    let before = service.get_name("kv", &values(json!({"app": "a"}))).unwrap().0;
    assert_eq!(before, "kv-a-d");

    service.add_config(r#"{"templates": {"kv": {"template": "vault-{app}"}}}"#, None);
    let after = service.get_name("kv", &values(json!({"app": "a"}))).unwrap().0;
    assert_eq!(after, "vault-a");
}

#[test]
fn test_references_across_files() {
    let temp = TempDir::new().unwrap();
    write_config(temp.path(), "naming.json", &sample_config());
    write_config(
        temp.path(),
        "team.json",
        &json!({"templates": {"teamRg": {"$ref": "#sample['templates']['rg']", "lengthMax": 10}}}),
    );

    let resolver = ConfigResolver::with_base_dir(temp.path().to_path_buf());
    resolver.add_section("team.json", None);
    resolver.add_section("naming.json", None);
    let service = NamingService::new(resolver).with_options(NamingOptions {
        suppress_error: true,
        ..NamingOptions::default()
    });

    let info = service.evaluate_name("teamRg", &values(json!({"app": "web", "region": "east us"})));
    assert!(!info.success);
    assert_eq!(info.full_result, "rg-web-d-eus");
    assert_eq!(
        info.error.as_deref(),
        Some("Max length exceeded for 'rg-web-d-eus'. Max length: 10, Result length: 12")
    );
}

#[test]
fn test_missing_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    let resolver = ConfigResolver::with_base_dir(temp.path().to_path_buf());
    resolver.add_section("missing.json", None);
    let service = NamingService::new(resolver);

    let err = service.get_name("rg", &Values::new()).unwrap_err();
    assert!(matches!(err, NamingError::Io { .. }), "{err:?}");
}

#[test]
fn test_circular_manifest_is_reported() {
    let temp = TempDir::new().unwrap();
    write_config(temp.path(), "a.json", &json!({"sections": [{"uri": "b.json"}]}));
    write_config(temp.path(), "b.json", &json!({"sections": [{"uri": "a.json"}]}));

    let resolver = ConfigResolver::with_base_dir(temp.path().to_path_buf());
    resolver.add_section("a.json", None);
    let service = NamingService::new(resolver);

    let err = service.get_name("rg", &Values::new()).unwrap_err();
    assert!(matches!(err, NamingError::CircularReference { .. }), "{err:?}");
}
