//! Per-invocation evaluation options.

use serde::{Deserialize, Deserializer, Serialize};

/// Switches that shape one evaluation, as accepted in an options JSON document.
///
/// ```json
/// {
///   "allowTruncation": true,
///   "configUri": ["./naming.json"],
///   "subscriptionId": "00000000-0000-0000-0000-000000000000"
/// }
/// ```
///
/// `configUri` may also be a single string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NamingOptions {
    /// Supplied values that match no placeholder are an error
    pub no_additional_values: bool,
    /// Ask Azure whether the generated name is still free
    pub check_unique_name: bool,
    /// Cut names longer than `lengthMax` instead of failing
    pub allow_truncation: bool,
    /// Drop previously loaded configuration before adding `config_uri`
    pub clear_config: bool,
    /// Record the first error in the result instead of failing
    pub suppress_error: bool,
    #[serde(deserialize_with = "one_or_many")]
    pub config_uri: Vec<String>,
    pub subscription_id: Option<String>,
    pub resource_group_name: Option<String>,
    pub location: Option<String>,
}

impl NamingOptions {
    /// Subscription id, when set and non-empty.
    pub fn subscription(&self) -> Option<&str> {
        non_empty(self.subscription_id.as_deref())
    }

    pub fn resource_group(&self) -> Option<&str> {
        non_empty(self.resource_group_name.as_deref())
    }

    pub fn location(&self) -> Option<&str> {
        non_empty(self.location.as_deref())
    }
}

fn non_empty(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Null(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(uri) if uri.is_empty() => Vec::new(),
        OneOrMany::One(uri) => vec![uri],
        OneOrMany::Many(uris) => uris,
        OneOrMany::Null(()) => Vec::new(),
    })
}
