//! Evaluation reports.
//!
//! Every evaluation produces a [`NameInfo`]: the synthesized name together with a
//! snapshot of the template it came from and a classification of the supplied
//! values. All report types serialize to camelCase JSON.

use super::template::TemplateConfig;
use crate::components::{Casing, Component};
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;

/// Values keyed by placeholder name, as supplied by callers.
pub type Values = serde_json::Map<String, serde_json::Value>;

/// One `{name}` reference in a template, bound to its component.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentPlaceholder {
    pub name: String,
    /// Only appears inside `[...]` groups
    pub is_optional: bool,
    pub component: Arc<Component>,
}

/// Snapshot of the template configuration used for an evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInfo {
    /// The requested key, when it named a template
    pub key: Option<String>,
    pub actual_key: Option<String>,
    pub template: String,
    pub casing: Casing,
    pub length_max: Option<usize>,
    pub length_min: Option<usize>,
    pub placeholders: Vec<ComponentPlaceholder>,
    pub allow_truncation: bool,
    pub invalid_characters: Option<String>,
    pub invalid_characters_start: Option<String>,
    pub invalid_characters_end: Option<String>,
    pub invalid_characters_consecutive: Option<String>,
    pub invalid_text: Option<String>,
    pub valid_text: Option<String>,
    pub regex: Option<String>,
    pub static_value: Option<String>,
}

impl TemplateInfo {
    pub(crate) fn new(
        key: Option<String>,
        config: &TemplateConfig,
        placeholders: Vec<ComponentPlaceholder>,
        allow_truncation: bool,
    ) -> Self {
        Self {
            key,
            actual_key: config.key.clone(),
            template: config.template.clone().unwrap_or_default(),
            casing: config.casing.unwrap_or_default(),
            length_max: config.length_max,
            length_min: config.length_min,
            placeholders,
            allow_truncation,
            invalid_characters: config.invalid_characters.clone(),
            invalid_characters_start: config.invalid_characters_start.clone(),
            invalid_characters_end: config.invalid_characters_end.clone(),
            invalid_characters_consecutive: config.invalid_characters_consecutive.clone(),
            invalid_text: config.invalid_text.clone(),
            valid_text: config.valid_text.clone(),
            regex: config.regex.clone(),
            static_value: config.static_value.clone(),
        }
    }
}

/// Resolved values and how the supplied keys were classified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuesInfo {
    /// Resolved value per lowercase placeholder name
    pub values: IndexMap<String, Option<String>>,
    /// Supplied keys that matched a placeholder
    pub valid_values_keys: Vec<String>,
    /// Required placeholders nobody supplied
    pub invalid_values_keys: Vec<String>,
    /// Supplied keys that matched no placeholder
    pub additional_values_keys: Vec<String>,
}

/// Full result of one name evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NameInfo {
    pub template: TemplateInfo,
    pub values: ValuesInfo,
    /// Name after casing and truncation
    pub result: String,
    /// Name before truncation
    pub full_result: String,
    pub additional_values_disallowed: bool,
    pub success: bool,
    /// First error message recorded during evaluation
    pub error: Option<String>,
}

impl NameInfo {
    pub(crate) fn new(
        template: TemplateInfo,
        values: ValuesInfo,
        result: String,
        full_result: String,
        additional_values_disallowed: bool,
        error: Option<String>,
    ) -> Self {
        Self {
            template,
            values,
            result,
            full_result,
            additional_values_disallowed,
            success: error.is_none(),
            error,
        }
    }

    /// A report for an evaluation that could not get as far as a template.
    pub(crate) fn failed(key_or_template: &str, error: String) -> Self {
        Self {
            template: TemplateInfo {
                key: Some(key_or_template.to_string()),
                ..TemplateInfo::default()
            },
            success: false,
            error: Some(error),
            ..Self::default()
        }
    }
}
