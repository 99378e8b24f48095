//! Name synthesis over the sample configuration.

use aznaming::config::NamingOptions;
use aznaming::naming::{NamingService, Values, unique_hash};
use aznaming::rest::RestResponse;
use aznaming::sections::ConfigResolver;
use aznaming::test_utils::{RecordingTransport, init_test_logging, sample_config};
use serde_json::{Value, json};

fn service(options: NamingOptions) -> NamingService {
    init_test_logging(None);
    let resolver = ConfigResolver::with_base_dir(std::env::temp_dir());
    resolver.add_section(&sample_config().to_string(), None);
    NamingService::new(resolver).with_options(options)
}

fn suppressed() -> NamingOptions {
    NamingOptions {
        suppress_error: true,
        ..NamingOptions::default()
    }
}

fn values(value: Value) -> Values {
    value.as_object().cloned().unwrap_or_default()
}

#[test]
fn test_dictionary_and_free_text_values() {
    let service = service(NamingOptions::default());
    let (name, error) = service
        .get_name("rg", &values(json!({"app": "Web", "env": "prod", "region": "East US"})))
        .unwrap();
    assert_eq!(name, "rg-web-p-eus");
    assert_eq!(error, None);
}

#[test]
fn test_default_template_values_fill_gaps() {
    let service = service(NamingOptions::default());
    let (name, _) = service
        .get_name("rg", &values(json!({"app": "web", "region": "west europe"})))
        .unwrap();
    assert_eq!(name, "rg-web-d-weu");
}

#[test]
fn test_component_and_template_aliases() {
    let service = service(NamingOptions::default());
    let (name, _) = service
        .get_name(
            "resourceGroup",
            &values(json!({"app": "x", "environment": "prod", "location": "east us"})),
        )
        .unwrap();
    assert_eq!(name, "rg-x-p-eus");
}

#[test]
fn test_optional_group_needs_every_value() {
    let service = service(NamingOptions::default());
    let (with, _) = service.get_name("vm", &values(json!({"app": "db", "instance": 7}))).unwrap();
    let (without, _) = service.get_name("vm", &values(json!({"app": "db"}))).unwrap();
    assert_eq!(with, "VM-DB-007");
    assert_eq!(without, "VM-DB");
}

#[test]
fn test_out_of_range_instance() {
    let service = service(suppressed());
    let info = service.evaluate_name("vm", &values(json!({"app": "db", "instance": 1000})));
    assert!(!info.success);
    assert_eq!(info.error.as_deref(), Some("Value '1000' for 'instance' is out of range"));

    let strict = self::service(NamingOptions::default());
    let err = strict.get_name("vm", &values(json!({"app": "db", "instance": "x"}))).unwrap_err();
    assert_eq!(err.to_string(), "Value 'x' for 'instance' is not a valid integer");
}

#[test]
fn test_unique_hash_seeded_from_other_values() {
    let service = service(NamingOptions::default());
    let (name, _) = service
        .get_name("st", &values(json!({"app": "data", "unique": "true"})))
        .unwrap();
    assert_eq!(name, format!("stdatad{}", unique_hash("datadev", 6)));

    let (again, _) = service
        .get_name("st", &values(json!({"app": "data", "unique": "true"})))
        .unwrap();
    assert_eq!(name, again);
}

#[test]
fn test_max_length_and_truncation() {
    let app = "a".repeat(36);
    let strict = service(NamingOptions::default());
    let err = strict
        .get_name("rg", &values(json!({"app": app, "region": "east us"})))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("Max length exceeded for 'rg-{app}-d-eus'. Max length: 40, Result length: 45")
    );

    let lenient = service(NamingOptions {
        allow_truncation: true,
        ..NamingOptions::default()
    });
    let info = lenient.evaluate_name("rg", &values(json!({"app": app, "region": "east us"})));
    assert!(info.success);
    assert_eq!(info.result, format!("rg-{app}"));
    assert_eq!(info.full_result, format!("rg-{app}-d-eus"));
}

#[test]
fn test_regex_violation_is_reported() {
    let service = service(suppressed());
    let info = service.evaluate_name("st", &values(json!({"app": "Data_Lake", "unique": "true"})));
    assert!(!info.success);
    let error = info.error.unwrap_or_default();
    assert!(error.starts_with("Result 'stdata_lake"), "{error}");
    assert!(error.contains("does not match regex '^[a-z0-9]{3,24}$'"), "{error}");
}

#[test]
fn test_name_info_serializes_camel_case() {
    let service = service(NamingOptions::default());
    let info = service.evaluate_name("rg", &values(json!({"app": "web", "region": "east us", "owner": "me"})));
    assert!(info.success);
    assert_eq!(info.template.key.as_deref(), Some("rg"));
    assert_eq!(info.values.additional_values_keys, vec!["owner"]);

    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["result"], "rg-web-d-eus");
    assert_eq!(json["fullResult"], "rg-web-d-eus");
    assert_eq!(json["success"], true);
    assert_eq!(json["values"]["additionalValuesKeys"], json!(["owner"]));
}

#[test]
fn test_additional_values_can_be_disallowed() {
    let service = service(NamingOptions {
        no_additional_values: true,
        suppress_error: true,
        ..NamingOptions::default()
    });
    let info = service.evaluate_name("rg", &values(json!({"app": "web", "region": "east us", "owner": "me"})));
    assert!(!info.success);
    assert_eq!(
        info.error.as_deref(),
        Some("Additional values not allowed. Additional values found: owner")
    );
}

#[test]
fn test_name_document() {
    let service = service(NamingOptions::default());
    let graph = json!({
        "values": {"app": "shop", "region": "east us"},
        "resourceGroup": {"template": "rg"},
        "tiers": [
            {"values": {"app": "web"}, "vm": {"template": "vm", "values": {"instance": 1}}},
            {"values": {"app": "api"}, "vm": {"template": "vm", "values": {"instance": 2}}}
        ]
    });

    let named = service.get_name_json(&graph, &Values::new(), None).unwrap();
    assert!(named.errors.is_empty());
    assert_eq!(
        named.document,
        json!({
            "resourceGroup": "rg-shop-d-eus",
            "tiers": [{"vm": "VM-WEB-001"}, {"vm": "VM-API-002"}]
        })
    );
}

#[test]
fn test_test_name_over_every_template() {
    let service = service(NamingOptions::default());
    let report = service.test_name(
        &values(json!({"app": "web", "region": "east us", "instance": 1, "unique": "true"})),
        &[],
    );
    assert!(report.success, "{:?}", report.errors);

    let report = service.test_name(&values(json!({"region": "east us", "unique": "true"})), &[]);
    assert!(!report.success);
    assert_eq!(report.errors.len(), 4);
}

#[test]
fn test_unique_name_check_uses_template_resource_type() {
    let transport = RecordingTransport::new([RestResponse::new(
        200,
        r#"{"nameAvailable": false, "message": "The name is already taken."}"#,
    )]);
    let service = service(NamingOptions {
        check_unique_name: true,
        suppress_error: true,
        subscription_id: Some("sub".into()),
        ..NamingOptions::default()
    })
    .with_transport(transport.clone());
    service.add_config(
        &json!({"restApis": {"Storage/storageAccounts": {"properties": {
            "requests": {"checkName": {"uri": "/subscriptions/{0}/check", "body": {"name": "{NAME}"}}}
        }}}})
        .to_string(),
        None,
    );

    let info = service.evaluate_name("st", &values(json!({"app": "data", "unique": "true"})));
    assert_eq!(info.error.as_deref(), Some("The name is already taken."));

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, "POST");
    assert_eq!(calls[0].body, Some(json!({"name": info.result})));
}
