//! Template configuration records and their cache.
//!
//! A template lives under `$.templates.<key>` either as `{"properties": {...}}` or
//! with its properties inlined. Property names are case-insensitive. Properties a
//! template omits are inherited from the template named `default`.
//!
//! A key that is wrapped in quotes, or that contains both `{` and `}`, is an
//! inline template string rather than a key. A key that names no template is
//! also used literally.

use super::aliases::{AliasIndex, AliasKind};
use crate::components::Casing;
use crate::constants::{DEFAULT_TEMPLATE_KEY, TEMPLATES_PATH};
use crate::core::{ErrorSink, NamingError};
use crate::node::{get_ignore_case, lowercase_keys, quote_member};
use crate::sections::ConfigResolver;
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Properties inherited from the `default` template, as (lowercase, display) names.
const INHERITED_PROPERTIES: [(&str, &str); 13] = [
    ("casing", "Casing"),
    ("template", "Template"),
    ("lengthmax", "LengthMax"),
    ("lengthmin", "LengthMin"),
    ("invalidcharacters", "InvalidCharacters"),
    ("invalidcharactersconsecutive", "InvalidCharactersConsecutive"),
    ("invalidcharactersend", "InvalidCharactersEnd"),
    ("invalidcharactersstart", "InvalidCharactersStart"),
    ("invalidtext", "InvalidText"),
    ("validtext", "ValidText"),
    ("regex", "Regex"),
    ("staticvalue", "StaticValue"),
    ("values", "Values"),
];

/// Inherited properties the `default` template may leave unset.
const OPTIONAL_DEFAULTS: [&str; 1] = ["values"];

/// Declarative record for one template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateConfig {
    /// Member name the template was found under; `None` for inline templates
    pub key: Option<String>,
    /// Resource type, used by the remote availability check
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub template: Option<String>,
    /// Default placeholder values
    pub values: Map<String, Value>,
    pub length_max: Option<usize>,
    pub length_min: Option<usize>,
    pub casing: Option<Casing>,
    pub valid_text: Option<String>,
    pub invalid_text: Option<String>,
    pub invalid_characters: Option<String>,
    pub invalid_characters_start: Option<String>,
    pub invalid_characters_end: Option<String>,
    pub invalid_characters_consecutive: Option<String>,
    pub regex: Option<String>,
    pub static_value: Option<String>,
}

impl TemplateConfig {
    /// A keyless template with only a template string.
    pub fn inline(template: &str) -> Self {
        Self {
            template: Some(template.to_string()),
            ..Self::default()
        }
    }

    /// Read a template from its property map (any key casing).
    ///
    /// # Errors
    ///
    /// Fails when `casing` is not `none`, `lower` or `upper`.
    pub fn from_properties(properties: &Map<String, Value>) -> Result<Self, NamingError> {
        let text = |name: &str| get_ignore_case(properties, name).and_then(Value::as_str).map(str::to_string);
        let length = |name: &str| {
            get_ignore_case(properties, name)
                .and_then(Value::as_u64)
                .and_then(|n| usize::try_from(n).ok())
        };
        let casing = match text("casing") {
            None => None,
            Some(casing) => Some(
                Casing::parse(&casing)
                    .ok_or_else(|| NamingError::configuration(format!("Invalid casing '{casing}'")))?,
            ),
        };

        Ok(Self {
            key: None,
            name: text("name"),
            short_name: text("shortName"),
            template: text("template"),
            values: get_ignore_case(properties, "values")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
            length_max: length("lengthMax"),
            length_min: length("lengthMin"),
            casing,
            valid_text: text("validText"),
            invalid_text: text("invalidText"),
            invalid_characters: text("invalidCharacters"),
            invalid_characters_start: text("invalidCharactersStart"),
            invalid_characters_end: text("invalidCharactersEnd"),
            invalid_characters_consecutive: text("invalidCharactersConsecutive"),
            regex: text("regex"),
            static_value: text("staticValue"),
        })
    }
}

/// Whether `key` is an inline template string rather than a template key.
pub fn is_inline_template(key: &str) -> bool {
    let quoted = key.len() >= 2
        && ((key.starts_with('\'') && key.ends_with('\'')) || (key.starts_with('"') && key.ends_with('"')));
    quoted || (key.contains('{') && key.contains('}'))
}

/// Per-service cache of template configurations.
#[derive(Debug, Default)]
pub struct TemplateStore {
    cache: DashMap<String, Arc<TemplateConfig>>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Template configuration for `key_or_template`.
    ///
    /// Missing default values are reported through `sink`; evaluation carries on
    /// with whatever the template itself declares.
    ///
    /// # Errors
    ///
    /// Any error `sink` does not suppress, and resolver failures.
    pub fn get(
        &self,
        resolver: &ConfigResolver,
        aliases: &AliasIndex,
        key_or_template: &str,
        sink: &mut ErrorSink,
    ) -> Result<Arc<TemplateConfig>, NamingError> {
        if key_or_template.is_empty() {
            sink.report(NamingError::configuration("Template key or value is required"))?;
            return Ok(Arc::new(TemplateConfig::inline("")));
        }

        let key = aliases.resolve(resolver, AliasKind::Template, key_or_template)?;
        let cache_key = key.to_lowercase();
        if let Some(cached) = self.cache.get(&cache_key) {
            return Ok(Arc::clone(cached.value()));
        }

        if is_inline_template(&key) {
            let template = key.trim_matches(|c| c == '\'' || c == '"');
            return Ok(Arc::new(TemplateConfig::inline(template)));
        }

        let Some(found) = resolver.try_get_node(&template_path(&key))? else {
            debug!(key = %key, "no template with this key, using it as a literal template");
            return Ok(Arc::new(TemplateConfig::inline(&key)));
        };

        let mut properties = template_properties(&found.node);
        let mut defaults: Option<Option<Map<String, Value>>> = None;

        for (property, display) in INHERITED_PROPERTIES {
            if properties.contains_key(property) {
                continue;
            }
            let default = match &defaults {
                Some(loaded) => loaded,
                None => defaults.insert(load_defaults(resolver)?),
            };
            let Some(default) = default else {
                break;
            };

            match default.get(property).filter(|value| !value.is_null()) {
                Some(value) => {
                    properties.insert(property.to_string(), value.clone());
                }
                None if OPTIONAL_DEFAULTS.contains(&property) => {}
                None => {
                    sink.report(NamingError::configuration(format!(
                        "Invalid default value for property '{display}'"
                    )))?;
                }
            }
        }

        let mut config = TemplateConfig::from_properties(&properties)?;
        config.key = Some(found.property_name.clone().unwrap_or_else(|| key.clone()));
        let config = Arc::new(config);
        self.cache.insert(cache_key, Arc::clone(&config));
        Ok(config)
    }

    /// Forget every cached template.
    pub fn clear(&self) {
        self.cache.clear();
    }
}

fn template_path(key: &str) -> String {
    format!("{TEMPLATES_PATH}{}", quote_member(key))
}

fn template_properties(node: &Value) -> Map<String, Value> {
    match node.as_object() {
        Some(object) => lowercase_keys(
            get_ignore_case(object, "properties")
                .and_then(Value::as_object)
                .unwrap_or(object),
        ),
        None => Map::new(),
    }
}

fn load_defaults(resolver: &ConfigResolver) -> Result<Option<Map<String, Value>>, NamingError> {
    Ok(resolver
        .try_get_node(&template_path(DEFAULT_TEMPLATE_KEY))?
        .map(|found| template_properties(&found.node)))
}
