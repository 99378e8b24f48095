//! Placeholders, value resolution and substitution.

use super::models::{ComponentPlaceholder, Values, ValuesInfo};
use super::template::TemplateConfig;
use super::NamingService;
use crate::components::{Component, ComponentKind};
use crate::core::{ErrorSink, NamingError};
use crate::node::scalar_text;
use indexmap::IndexMap;
use regex::{NoExpand, Regex};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::trace;
use uuid::Uuid;

/// Resolved value per lowercase placeholder name.
pub(crate) type Resolved = IndexMap<String, Option<String>>;

struct Patterns {
    placeholder: Regex,
    optional: Regex,
}

static PATTERNS: OnceLock<Result<Patterns, regex::Error>> = OnceLock::new();

fn patterns() -> Result<&'static Patterns, NamingError> {
    PATTERNS
        .get_or_init(|| {
            Ok(Patterns {
                placeholder: Regex::new(r"\{(.*?)\}")?,
                optional: Regex::new(r"\[(.*?)\]")?,
            })
        })
        .as_ref()
        .map_err(|e| NamingError::configuration(e.to_string()))
}

/// Hash `seed` into a lowercase hex token of `length` characters (at most 32).
pub fn unique_hash(seed: &str, length: usize) -> String {
    let digest = Sha256::digest(seed.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes_le(bytes).simple().to_string().chars().take(length).collect()
}

/// Replace every `{name}` in `text`, ignoring case.
fn replace_placeholder(text: &str, name: &str, value: &str) -> Result<String, NamingError> {
    let pattern = format!("(?i){}", regex::escape(&format!("{{{name}}}")));
    let regex = Regex::new(&pattern).map_err(|e| NamingError::configuration(e.to_string()))?;
    Ok(regex.replace_all(text, NoExpand(value)).into_owned())
}

impl NamingService {
    /// Bind every placeholder of `template` to its component.
    ///
    /// Placeholders that only appear inside `[...]` groups are optional.
    pub(crate) fn placeholders(
        &self,
        template: &str,
        sink: &mut ErrorSink,
    ) -> Result<IndexMap<String, ComponentPlaceholder>, NamingError> {
        let patterns = patterns()?;

        let mut optional: Vec<String> = Vec::new();
        let mut required_text = template.to_string();
        for group in patterns.optional.captures_iter(template) {
            for capture in patterns.placeholder.captures_iter(&group[1]) {
                let name = &capture[1];
                if name.is_empty() {
                    sink.report(NamingError::configuration("Placeholder cannot be empty"))?;
                }
                let key = self.component_key(name, sink)?;
                if !optional.contains(&key) {
                    optional.push(key);
                }
            }
            required_text = required_text.replace(&group[0], "");
        }
        for capture in patterns.placeholder.captures_iter(&required_text) {
            let name = &capture[1];
            if name.is_empty() {
                sink.report(NamingError::configuration("Placeholder cannot be empty"))?;
            }
            let key = self.component_key(name, sink)?;
            optional.retain(|o| *o != key);
        }

        let mut placeholders = IndexMap::new();
        for capture in patterns.placeholder.captures_iter(template) {
            let key = self.component_key(&capture[1], sink)?;
            if placeholders.contains_key(&key) {
                continue;
            }
            match self.component(&key, sink)? {
                Some(component) => {
                    placeholders.insert(
                        key.clone(),
                        ComponentPlaceholder {
                            name: capture[1].to_string(),
                            is_optional: optional.contains(&key),
                            component,
                        },
                    );
                }
                None => {
                    sink.report(NamingError::configuration(format!(
                        "Placeholder '{}' refers to non-existing component.",
                        &capture[1]
                    )))?;
                }
            }
        }
        Ok(placeholders)
    }

    /// Resolve every supplied value that belongs to a placeholder.
    ///
    /// Template-key pre-fill comes first, then the template's own default
    /// values, then `values`; later sources overwrite earlier ones.
    pub(crate) fn resolve_values(
        &self,
        config: &TemplateConfig,
        placeholders: &IndexMap<String, ComponentPlaceholder>,
        values: &Values,
        sink: &mut ErrorSink,
    ) -> Result<Resolved, NamingError> {
        let mut resolved = Resolved::new();
        let mut raw: HashMap<String, Value> = HashMap::new();
        for source in [&config.values, values] {
            for (key, value) in source {
                let key = self.component_key(key, sink)?;
                raw.insert(key, value.clone());
            }
        }

        if let Some(template_key) = config.key.as_deref().filter(|k| !k.is_empty()) {
            self.prefill_template_key(&template_key.to_lowercase(), placeholders, &mut raw, &mut resolved, sink)?;
        }

        self.apply_values(&config.values, placeholders, &raw, &mut resolved, sink)?;
        self.apply_values(values, placeholders, &raw, &mut resolved, sink)?;
        Ok(resolved)
    }

    fn prefill_template_key(
        &self,
        template_key: &str,
        placeholders: &IndexMap<String, ComponentPlaceholder>,
        raw: &mut HashMap<String, Value>,
        resolved: &mut Resolved,
        sink: &mut ErrorSink,
    ) -> Result<(), NamingError> {
        let Some(key_component) = self.template_component_key(sink)? else {
            return Ok(());
        };
        let Some(component) = self.component(&key_component, sink)? else {
            return Ok(());
        };
        let ComponentKind::Dictionary { source } = &component.kind else {
            return Ok(());
        };
        let Some(value) = source.get(template_key) else {
            return Ok(());
        };

        let mut references = self.aliases_of(&key_component, sink)?;
        references.push(key_component);
        for reference in references {
            if placeholders.contains_key(&reference) {
                trace!(placeholder = %reference, value = %value, "pre-filled from template key");
                resolved.insert(reference.clone(), Some(value.clone()));
                raw.insert(reference, Value::String(template_key.to_string()));
            }
        }
        Ok(())
    }

    fn apply_values(
        &self,
        values: &Values,
        placeholders: &IndexMap<String, ComponentPlaceholder>,
        raw: &HashMap<String, Value>,
        resolved: &mut Resolved,
        sink: &mut ErrorSink,
    ) -> Result<(), NamingError> {
        for (given_key, given) in values {
            let key = self.component_key(given_key, sink)?;
            let Some(placeholder) = placeholders.get(&key) else {
                continue;
            };

            let text = scalar_text(given);
            if !placeholder.is_optional && text.as_deref().is_none_or(str::is_empty) {
                sink.report(NamingError::value(format!("Value for '{given_key}' is required")))?;
            }

            let value = match self.component_value(&key, given_key, &placeholder.component, text, placeholders, raw, resolved, sink)? {
                Some(value) => value.map(|v| placeholder.component.casing.apply(&v)),
                None => Some(format!("{{{given_key}}}")),
            };
            resolved.insert(key, value);
        }
        Ok(())
    }

    /// Value of one placeholder; `None` when the value is invalid (already reported).
    #[allow(clippy::too_many_arguments)]
    fn component_value(
        &self,
        key: &str,
        given_key: &str,
        component: &Component,
        text: Option<String>,
        placeholders: &IndexMap<String, ComponentPlaceholder>,
        raw: &HashMap<String, Value>,
        resolved: &Resolved,
        sink: &mut ErrorSink,
    ) -> Result<Option<Option<String>>, NamingError> {
        let given = text.clone().unwrap_or_default();
        let not_found = |sink: &mut ErrorSink| {
            sink.report(NamingError::value(format!("Value '{given}' for '{given_key}' is not found")))
        };

        match &component.kind {
            ComponentKind::FreeText => Ok(Some(text)),
            ComponentKind::Dictionary { source } => match source.get(&given.to_lowercase()) {
                Some(value) => Ok(Some(Some(value.clone()))),
                None => {
                    not_found(sink)?;
                    Ok(None)
                }
            },
            ComponentKind::ChildDictionary { parent, source } => {
                let parent_key = self.component_key(parent, sink)?;
                let from_raw = raw.get(&parent_key).and_then(scalar_text).map(|p| p.to_lowercase());
                let from_resolved = resolved
                    .get(&parent_key)
                    .and_then(Option::as_deref)
                    .map(str::to_lowercase);
                let children = [from_raw, from_resolved]
                    .into_iter()
                    .flatten()
                    .filter(|p| !p.is_empty())
                    .find_map(|p| source.get(&p));

                let Some(children) = children else {
                    sink.report(NamingError::value(format!("Invalid Parent key '{parent}' for '{given_key}'")))?;
                    return Ok(None);
                };
                match children.get(&given.to_lowercase()) {
                    Some(value) => Ok(Some(Some(value.clone()))),
                    None => {
                        not_found(sink)?;
                        Ok(None)
                    }
                }
            }
            ComponentKind::Instance {
                min_value,
                max_value,
                padding,
            } => {
                let Ok(number) = given.trim().parse::<i64>() else {
                    sink.report(NamingError::value(format!(
                        "Value '{given}' for '{given_key}' is not a valid integer"
                    )))?;
                    return Ok(None);
                };
                let in_range = number <= *max_value && min_value.is_none_or(|min| number >= min);
                if !in_range {
                    sink.report(NamingError::value(format!(
                        "Value '{given}' for '{given_key}' is out of range"
                    )))?;
                    return Ok(None);
                }
                let number = number.to_string();
                Ok(Some(Some(match padding {
                    Some(padding) => padding.apply(&number),
                    None => number,
                })))
            }
            ComponentKind::Unique { length, seed } => {
                let seed = text.filter(|t| !t.is_empty()).or_else(|| seed.clone());
                let seed = match seed {
                    Some(seed) if seed.eq_ignore_ascii_case("true") => {
                        let mut others: Vec<&String> = placeholders.keys().filter(|k| k.as_str() != key).collect();
                        others.sort();
                        others
                            .into_iter()
                            .map(|k| raw.get(k).and_then(scalar_text).unwrap_or_default())
                            .collect::<String>()
                    }
                    Some(seed) if !seed.is_empty() => seed,
                    _ => {
                        sink.report(NamingError::value(format!("Seed value for '{given_key}' is not valid")))?;
                        return Ok(None);
                    }
                };
                Ok(Some(Some(unique_hash(&seed, *length))))
            }
        }
    }

    /// Sort supplied keys into valid and additional, and find required
    /// placeholders that ended up without a value.
    pub(crate) fn classify_values(
        &self,
        values: &Values,
        placeholders: &IndexMap<String, ComponentPlaceholder>,
        resolved: &Resolved,
        sink: &mut ErrorSink,
    ) -> Result<ValuesInfo, NamingError> {
        let mut info = ValuesInfo {
            values: resolved.clone(),
            ..ValuesInfo::default()
        };

        let mut supplied = Vec::new();
        for key in values.keys() {
            let canonical = self.component_key(key, sink)?;
            if placeholders.contains_key(&canonical) {
                info.valid_values_keys.push(key.clone());
            } else {
                info.additional_values_keys.push(key.clone());
            }
            supplied.push(canonical);
        }

        for (key, placeholder) in placeholders {
            if placeholder.is_optional {
                continue;
            }
            let has_value = resolved
                .get(key)
                .and_then(Option::as_deref)
                .is_some_and(|v| !v.is_empty());
            if !supplied.contains(key) && !resolved.contains_key(key) {
                info.invalid_values_keys.push(placeholder.name.clone());
            }
            if !has_value && !supplied.contains(key) {
                sink.report(NamingError::value(format!("Value for '{}' is required", placeholder.name)))?;
            }
        }
        Ok(info)
    }

    /// Put resolved values into `template`.
    ///
    /// Returns the text and whether every placeholder was filled.
    pub(crate) fn substitute(
        &self,
        template: &str,
        resolved: &Resolved,
        sink: &mut ErrorSink,
    ) -> Result<(String, bool), NamingError> {
        let patterns = patterns()?;
        let mut result = template.to_string();
        let mut success = true;

        for group in patterns.optional.captures_iter(template) {
            let mut part = Some(group[1].to_string());
            for capture in patterns.placeholder.captures_iter(&group[1]) {
                let key = self.component_key(&capture[1], sink)?;
                match (resolved.get(&key), part.take()) {
                    (Some(value), Some(text)) => {
                        part = Some(replace_placeholder(&text, &capture[1], value.as_deref().unwrap_or_default())?);
                    }
                    _ => break,
                }
            }
            result = result.replace(&group[0], part.as_deref().unwrap_or_default());
        }

        let remaining = result.clone();
        for capture in patterns.placeholder.captures_iter(&remaining) {
            let key = self.component_key(&capture[1], sink)?;
            match resolved.get(&key) {
                Some(value) => {
                    result = replace_placeholder(&result, &capture[1], value.as_deref().unwrap_or_default())?;
                }
                None => {
                    sink.report(NamingError::value(format!("Value for '{}' is required", &capture[1])))?;
                    success = false;
                }
            }
        }

        for key in resolved.keys() {
            if result.to_lowercase().contains(&format!("{{{key}}}")) {
                sink.report(NamingError::value(format!("Placeholder '{key}' is not used")))?;
                success = false;
            }
        }

        Ok((result, success))
    }
}
