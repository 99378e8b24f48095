//! Asking Azure whether a generated name is still free.
//!
//! The requests come from `$.restApis.<resource type>`:
//!
//! ```json
//! "restApis": {
//!   "storage/storageaccounts": {
//!     "properties": {
//!       "apiVersion": "2023-01-01",
//!       "requests": {
//!         "exist": {"uri": "/subscriptions/{0}/resourceGroups/{1}/providers/Microsoft.Storage/storageAccounts/{2}?api-version=2023-01-01"},
//!         "checkName": {
//!           "uri": "/subscriptions/{0}/providers/Microsoft.Storage/checkNameAvailability?api-version=2023-01-01",
//!           "body": {"name": "{NAME}", "type": "Microsoft.Storage/storageAccounts"}
//!         }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! A resource type without a descriptor is always available.

use super::NamingService;
use crate::core::NamingError;
use crate::node::{get_ignore_case, quote_member};
use crate::sections::is_inline_json;
use serde_json::Value;
use tracing::debug;

const KEY_VAULT_TYPE: &str = "KeyVault/vaults";
const DELETED_VAULT_URI: &str =
    "https://management.azure.com/subscriptions/{0}/providers/Microsoft.KeyVault/locations/{1}/deletedVaults/{2}?api-version={3}";

/// Replace `{0}`, `{1}`, ... with `args`.
fn format_indexed(template: &str, args: &[&str]) -> String {
    args.iter()
        .enumerate()
        .fold(template.to_string(), |text, (index, arg)| text.replace(&format!("{{{index}}}"), arg))
}

fn text_at<'a>(node: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(node, |current, name| current.as_object().and_then(|map| get_ignore_case(map, name)))
        .and_then(Value::as_str)
}

impl NamingService {
    /// `Ok(None)` when `name` can be used, `Ok(Some(message))` when Azure says
    /// it cannot.
    ///
    /// # Errors
    ///
    /// [`NamingError::RemoteCheck`] when a request fails or returns an unexpected
    /// status, and configuration errors for incomplete descriptors.
    pub(crate) fn check_name_availability(
        &self,
        name: &str,
        resource_type: Option<&str>,
        subscription_id: &str,
    ) -> Result<Option<String>, NamingError> {
        let Some(resource_type) = resource_type.filter(|t| !t.is_empty()) else {
            return Ok(None);
        };
        let service = resource_type.to_lowercase();
        let Some(descriptor) = self.resolver.try_get_node(&format!("$.restApis{}", quote_member(&service)))? else {
            debug!(resource_type, "no REST descriptor, skipping availability check");
            return Ok(None);
        };
        let request = descriptor
            .node
            .as_object()
            .and_then(|map| get_ignore_case(map, "properties"))
            .unwrap_or(descriptor.node.as_ref());

        let failed = || {
            NamingError::remote_check(format!(
                "Error in CheckNameAvailability for resource type '{resource_type}' with name '{name}'"
            ))
        };
        let incomplete =
            |what: &str| NamingError::configuration(format!("REST descriptor for '{resource_type}' is missing '{what}'"));

        if let Some(resource_group) = self.options.resource_group() {
            let exist_uri = text_at(request, &["requests", "exist", "uri"]).ok_or_else(|| incomplete("requests.exist.uri"))?;
            let uri = format_indexed(exist_uri, &[subscription_id, resource_group, name]);
            let response = self.transport.get(&uri).map_err(|e| {
                debug!(error = %e, "exist request failed");
                failed()
            })?;

            match response.status {
                200 => return Ok(None),
                404 => {}
                status => {
                    debug!(status, body = %response.body, "unexpected exist request status");
                    return Err(failed());
                }
            }

            if resource_type == KEY_VAULT_TYPE
                && let Some(location) = self.options.location()
                && self.deleted_vault_reusable(request, subscription_id, resource_group, location, name)?
            {
                return Ok(None);
            }
        }

        let check_uri =
            text_at(request, &["requests", "checkName", "uri"]).ok_or_else(|| incomplete("requests.checkName.uri"))?;
        let body = request
            .as_object()
            .and_then(|map| get_ignore_case(map, "requests"))
            .and_then(Value::as_object)
            .and_then(|map| get_ignore_case(map, "checkName"))
            .and_then(Value::as_object)
            .and_then(|map| get_ignore_case(map, "body"))
            .ok_or_else(|| incomplete("requests.checkName.body"))?;
        let body = serde_json::to_string(body)
            .map_err(|e| NamingError::configuration(e.to_string()))?
            .replace("{NAME}", name);
        let body: Value = if is_inline_json(&body) {
            serde_json::from_str(&body).map_err(|e| NamingError::configuration(e.to_string()))?
        } else {
            Value::String(body)
        };

        let uri = format_indexed(check_uri, &[subscription_id]);
        let response = self
            .transport
            .post(&uri, &body)
            .and_then(|response| response.error_for_status(&uri))
            .map_err(|e| {
                debug!(error = %e, "checkName request failed");
                failed()
            })?;

        let Some(answer) = response.json().map_err(|_| failed())? else {
            return Ok(None);
        };
        let available = answer
            .get("nameAvailable")
            .or_else(|| answer.get("isAvailiable"))
            .and_then(Value::as_bool)
            .ok_or_else(failed)?;

        if available {
            Ok(None)
        } else {
            let message = answer
                .get("message")
                .and_then(Value::as_str)
                .map_or_else(|| format!("Name '{name}' is not available"), str::to_string);
            debug!(name, message = %message, "name is taken");
            Ok(Some(message))
        }
    }

    /// Whether a soft-deleted vault with this name is ours and can be recovered.
    fn deleted_vault_reusable(
        &self,
        request: &Value,
        subscription_id: &str,
        resource_group: &str,
        location: &str,
        name: &str,
    ) -> Result<bool, NamingError> {
        let api_version = text_at(request, &["apiVersion"]).unwrap_or_default();
        let uri = format_indexed(DELETED_VAULT_URI, &[subscription_id, location, name, api_version]);
        let response = self.transport.get(&uri)?;
        if response.status != 200 {
            return Ok(false);
        }

        let Some(deleted) = response.json()? else {
            return Ok(false);
        };
        let properties = deleted.get("properties");
        let vault_id = properties.and_then(|p| p.get("vaultId")).and_then(Value::as_str);
        let expected =
            format!("/subscriptions/{subscription_id}/resourceGroups/{resource_group}/providers/Microsoft.KeyVault/vaults/{name}");
        let purge_protected = properties
            .and_then(|p| p.get("purgeProtectionEnabled"))
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Ok(vault_id == Some(expected.as_str()) && !purge_protected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NamingOptions;
    use crate::rest::RestResponse;
    use crate::sections::ConfigResolver;
    use crate::test_utils::RecordingTransport;
    use serde_json::json;
    use std::sync::Arc;

    fn service(transport: Arc<RecordingTransport>, options: NamingOptions) -> NamingService {
        let config = json!({"restApis": {"storage/storageaccounts": {"properties": {
            "apiVersion": "2023-01-01",
            "requests": {
                "exist": {"uri": "/subscriptions/{0}/resourceGroups/{1}/sa/{2}"},
                "checkName": {"uri": "/subscriptions/{0}/check", "body": {"name": "{NAME}"}}
            }
        }}, "keyvault/vaults": {"properties": {
            "apiVersion": "2022-07-01",
            "requests": {
                "exist": {"uri": "/subscriptions/{0}/resourceGroups/{1}/kv/{2}"},
                "checkName": {"uri": "/subscriptions/{0}/kvcheck", "body": {"name": "{NAME}"}}
            }
        }}}});
        let resolver = ConfigResolver::with_base_dir(std::env::temp_dir());
        resolver.add_section(&config.to_string(), None);
        NamingService::new(resolver).with_options(options).with_transport(transport)
    }

    #[test]
    fn test_format_indexed() {
        assert_eq!(format_indexed("/a/{0}/b/{1}/{0}", &["x", "y"]), "/a/x/b/y/x");
    }

    #[test]
    fn test_unknown_resource_type_is_available() {
        let transport = RecordingTransport::new(vec![]);
        let service = service(Arc::clone(&transport), NamingOptions::default());
        assert_eq!(service.check_name_availability("n", Some("Web/sites"), "sub").unwrap(), None);
        assert_eq!(service.check_name_availability("n", None, "sub").unwrap(), None);
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn test_check_name_posts_body() {
        let transport = RecordingTransport::new(vec![RestResponse::new(
            200,
            r#"{"nameAvailable": false, "message": "The storage account named st1 is already taken."}"#,
        )]);
        let service = service(Arc::clone(&transport), NamingOptions::default());
        let answer = service.check_name_availability("st1", Some("Storage/storageAccounts"), "sub").unwrap();
        assert_eq!(answer.as_deref(), Some("The storage account named st1 is already taken."));

        let calls = transport.calls();
        assert_eq!(calls[0].uri, "/subscriptions/sub/check");
        assert_eq!(calls[0].body, Some(json!({"name": "st1"})));
    }

    #[test]
    fn test_empty_response_is_available() {
        let transport = RecordingTransport::new(vec![RestResponse::new(200, "")]);
        let service = service(transport, NamingOptions::default());
        assert_eq!(service.check_name_availability("st1", Some("storage/storageaccounts"), "s").unwrap(), None);
    }

    #[test]
    fn test_existing_own_resource_is_available() {
        let transport = RecordingTransport::new(vec![RestResponse::new(200, "{}")]);
        let options = NamingOptions {
            resource_group_name: Some("rg".into()),
            ..NamingOptions::default()
        };
        let service = service(Arc::clone(&transport), options);
        assert_eq!(service.check_name_availability("st1", Some("Storage/storageAccounts"), "s").unwrap(), None);
        assert_eq!(transport.calls()[0].uri, "/subscriptions/s/resourceGroups/rg/sa/st1");
    }

    #[test]
    fn test_unexpected_exist_status_fails() {
        let transport = RecordingTransport::new(vec![RestResponse::new(403, "denied")]);
        let options = NamingOptions {
            resource_group_name: Some("rg".into()),
            ..NamingOptions::default()
        };
        let service = service(transport, options);
        let err = service
            .check_name_availability("st1", Some("Storage/storageAccounts"), "s")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error in CheckNameAvailability for resource type 'Storage/storageAccounts' with name 'st1'"
        );
    }

    #[test]
    fn test_failed_check_name_call() {
        let transport = RecordingTransport::new(vec![RestResponse::new(500, "boom")]);
        let service = service(transport, NamingOptions::default());
        let err = service.check_name_availability("st1", Some("Storage/storageAccounts"), "s").unwrap_err();
        assert!(matches!(err, NamingError::RemoteCheck { .. }));
    }

    #[test]
    fn test_recoverable_deleted_vault() {
        let deleted = json!({"properties": {
            "vaultId": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.KeyVault/vaults/kv1",
            "purgeProtectionEnabled": false
        }});
        let transport = RecordingTransport::new(vec![
            RestResponse::new(404, ""),
            RestResponse::new(200, deleted.to_string()),
        ]);
        let options = NamingOptions {
            resource_group_name: Some("rg".into()),
            location: Some("westeurope".into()),
            ..NamingOptions::default()
        };
        let service = service(Arc::clone(&transport), options);
        assert_eq!(service.check_name_availability("kv1", Some("KeyVault/vaults"), "s").unwrap(), None);

        let calls = transport.calls();
        assert_eq!(
            calls[1].uri,
            "https://management.azure.com/subscriptions/s/providers/Microsoft.KeyVault/locations/westeurope/deletedVaults/kv1?api-version=2022-07-01"
        );
    }

    #[test]
    fn test_purge_protected_vault_falls_through_to_check_name() {
        let deleted = json!({"properties": {
            "vaultId": "/subscriptions/s/resourceGroups/rg/providers/Microsoft.KeyVault/vaults/kv1",
            "purgeProtectionEnabled": true
        }});
        let transport = RecordingTransport::new(vec![
            RestResponse::new(404, ""),
            RestResponse::new(200, deleted.to_string()),
            RestResponse::new(200, r#"{"nameAvailable": false, "message": "taken"}"#),
        ]);
        let options = NamingOptions {
            resource_group_name: Some("rg".into()),
            location: Some("westeurope".into()),
            ..NamingOptions::default()
        };
        let service = service(transport, options);
        let answer = service.check_name_availability("kv1", Some("KeyVault/vaults"), "s").unwrap();
        assert_eq!(answer.as_deref(), Some("taken"));
    }
}
