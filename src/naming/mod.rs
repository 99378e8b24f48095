//! Name synthesis.
//!
//! [`NamingService`] turns a template key (or an inline template) plus a map of
//! placeholder values into a name:
//!
//! 1. the template configuration is resolved, inheriting from `default`
//! 2. `{placeholder}` and optional `[...]` groups are bound to components
//! 3. each supplied value is resolved by its component (dictionary lookup,
//!    ranged integer, free text or hash) and cased
//! 4. values are substituted; groups with an unresolved placeholder are dropped
//! 5. the name is cased, length-checked or truncated, matched against the
//!    template regex and optionally checked for availability in Azure
//!
//! Every problem goes through an [`ErrorSink`]: with `suppress_error` off the
//! first one aborts the evaluation, with it on evaluation carries on and the
//! first message ends up in [`NameInfo::error`].
//!
//! ```rust,no_run
//! use aznaming::naming::NamingService;
//! use aznaming::sections::ConfigResolver;
//! use serde_json::{Map, json};
//!
//! # fn example() -> Result<(), aznaming::core::NamingError> {
//! let resolver = ConfigResolver::with_base_dir(std::env::current_dir().unwrap_or_default());
//! resolver.add_section("./naming.json", None);
//! let service = NamingService::new(resolver);
//!
//! let mut values = Map::new();
//! values.insert("env".into(), json!("dev"));
//! let (name, _) = service.get_name("resourceGroup", &values)?;
//! # Ok(())
//! # }
//! ```

pub mod aliases;
mod availability;
pub mod graph;
pub mod models;
pub mod template;
mod values;

pub use aliases::{AliasIndex, AliasKind};
pub use models::{ComponentPlaceholder, NameInfo, TemplateInfo, Values, ValuesInfo};
pub use template::{TemplateConfig, TemplateStore};
pub use values::unique_hash;

use crate::components::{Component, ComponentCatalog};
use crate::config::NamingOptions;
use crate::core::{ErrorSink, NamingError};
use crate::rest::{AzureRestClient, RestTransport};
use crate::sections::ConfigResolver;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Synthesizes names from a layered configuration.
///
/// All caches are per service and safe to share across threads; clone the
/// [`Arc`] you keep the service in rather than the service itself.
pub struct NamingService {
    resolver: ConfigResolver,
    components: ComponentCatalog,
    aliases: AliasIndex,
    templates: TemplateStore,
    options: NamingOptions,
    transport: Arc<dyn RestTransport>,
}

impl NamingService {
    /// Service over `resolver` with default options and the Azure REST client.
    pub fn new(resolver: ConfigResolver) -> Self {
        Self {
            resolver,
            components: ComponentCatalog::new(),
            aliases: AliasIndex::new(),
            templates: TemplateStore::new(),
            options: NamingOptions::default(),
            transport: Arc::new(AzureRestClient::from_env()),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: NamingOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the transport used by the availability check.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn RestTransport>) -> Self {
        self.transport = transport;
        self
    }

    pub const fn options(&self) -> &NamingOptions {
        &self.options
    }

    pub const fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }

    /// Put `uri_or_json` in front of every loaded section.
    ///
    /// Returns `false` when the source was already loaded.
    pub fn add_config(&self, uri_or_json: &str, path: Option<&str>) -> bool {
        let added = self.resolver.insert_section(0, uri_or_json, path);
        if added {
            self.clear_caches();
        }
        added
    }

    /// Drop every section and every cached lookup.
    pub fn clear_config(&self) {
        self.resolver.clear_sections();
        self.clear_caches();
    }

    fn clear_caches(&self) {
        self.components.clear();
        self.templates.clear();
        self.aliases.clear();
    }

    /// Generate a name.
    ///
    /// Returns the name and, when `suppress_error` is set, the first error
    /// message.
    ///
    /// # Errors
    ///
    /// The first evaluation error, unless `suppress_error` is set.
    pub fn get_name(&self, key_or_template: &str, values: &Values) -> Result<(String, Option<String>), NamingError> {
        let info = self.name_info(key_or_template, values, self.options.suppress_error)?;
        Ok((info.result, info.error))
    }

    /// Generate a name and report how it was built. Never fails; the first
    /// error is in [`NameInfo::error`].
    pub fn evaluate_name(&self, key_or_template: &str, values: &Values) -> NameInfo {
        self.evaluate_suppressed(key_or_template, values)
    }

    fn evaluate_suppressed(&self, key_or_template: &str, values: &Values) -> NameInfo {
        match self.name_info(key_or_template, values, true) {
            Ok(info) => info,
            Err(e) => NameInfo::failed(key_or_template, e.to_string()),
        }
    }

    /// Run one evaluation with its own error sink.
    ///
    /// # Errors
    ///
    /// The first error when `suppress` is off.
    #[instrument(skip(self, values), level = "debug")]
    pub(crate) fn name_info(&self, key_or_template: &str, values: &Values, suppress: bool) -> Result<NameInfo, NamingError> {
        let mut sink = ErrorSink::new(suppress);
        let mut info = self.build_name(key_or_template, values, &mut sink)?;
        if info.error.is_none() {
            info.error = sink.into_first_error();
            info.success = info.error.is_none();
        }
        debug!(result = %info.result, success = info.success, "evaluated name");
        Ok(info)
    }

    fn build_name(&self, key_or_template: &str, values: &Values, sink: &mut ErrorSink) -> Result<NameInfo, NamingError> {
        let mut config = self.template_config(key_or_template, sink)?;
        let template = config.template.clone().unwrap_or_default();

        let placeholders = self.placeholders(&template, sink)?;
        let resolved = self.resolve_values(&config, &placeholders, values, sink)?;
        let values_info = self.classify_values(values, &placeholders, &resolved, sink)?;

        let (mut result, mut success) = self.substitute(&template, &resolved, sink)?;

        if self.options.no_additional_values && !values_info.additional_values_keys.is_empty() {
            sink.report(NamingError::value(format!(
                "Additional values not allowed. Additional values found: {}",
                values_info.additional_values_keys.join(", ")
            )))?;
        }

        // a partial result keeps its unresolved placeholders verbatim
        let mut full_result = result.clone();
        if success {
            config = self.redirect_template(config, &resolved, sink)?;

            if let Some(casing) = config.casing {
                result = casing.apply(&result);
            }
            full_result = result.clone();

            if let Some(max) = config.length_max {
                let length = result.chars().count();
                if length > max {
                    if self.options.allow_truncation {
                        result = truncate(&result, max, config.invalid_characters_end.as_deref());
                        debug!(full = %full_result, truncated = %result, "truncated name");
                    } else {
                        sink.report(NamingError::format(format!(
                            "Max length exceeded for '{full_result}'. Max length: {max}, Result length: {length}"
                        )))?;
                        success = false;
                    }
                }
            }

            if config.static_value.as_deref().is_none_or(str::is_empty)
                && let Some(pattern) = config.regex.as_deref().filter(|p| !p.is_empty())
            {
                match Regex::new(pattern) {
                    Ok(regex) if !regex.is_match(&result) => {
                        sink.report(NamingError::format(regex_mismatch(&result, pattern, key_or_template, &config)))?;
                        success = false;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        sink.report(NamingError::configuration(format!("Invalid regex '{pattern}': {e}")))?;
                        success = false;
                    }
                }
            }

            if success && self.options.check_unique_name {
                self.check_unique(&result, &config, sink)?;
            }
        }

        let requested = config.key.as_ref().map(|_| key_or_template.to_string());
        let template_info = TemplateInfo::new(
            requested,
            &config,
            placeholders.into_values().collect(),
            self.options.allow_truncation,
        );

        Ok(NameInfo::new(
            template_info,
            values_info,
            result,
            full_result,
            self.options.no_additional_values,
            None,
        ))
    }

    /// Evaluate the template named by the resolved template-key component
    /// instead, keeping the requested key and template string.
    fn redirect_template(
        &self,
        config: Arc<TemplateConfig>,
        resolved: &indexmap::IndexMap<String, Option<String>>,
        sink: &mut ErrorSink,
    ) -> Result<Arc<TemplateConfig>, NamingError> {
        if config.key.is_some() {
            return Ok(config);
        }
        let Some(key_component) = self.template_component_key(sink)? else {
            return Ok(config);
        };
        let key_component = self.component_key(&key_component, sink)?;
        let Some(target) = resolved
            .get(&key_component)
            .and_then(Option::as_deref)
            .map(str::to_lowercase)
            .filter(|v| !v.is_empty())
        else {
            return Ok(config);
        };

        let redirected = self.template_config(&target, sink)?;
        if redirected.key.is_none() {
            return Ok(config);
        }

        debug!(target = %target, "redirecting to keyed template");
        let mut merged = (*redirected).clone();
        merged.key.clone_from(&config.key);
        merged.template.clone_from(&config.template);
        Ok(Arc::new(merged))
    }

    fn check_unique(&self, name: &str, config: &TemplateConfig, sink: &mut ErrorSink) -> Result<(), NamingError> {
        let Some(subscription) = self.options.subscription() else {
            return sink.report(NamingError::value("SubscriptionId is required for unique name check"));
        };

        match self.check_name_availability(name, config.name.as_deref(), subscription) {
            Ok(None) => Ok(()),
            Ok(Some(message)) => sink.report(NamingError::remote_check(message)),
            Err(e) => sink.report(e),
        }
    }

    pub(crate) fn template_config(&self, key_or_template: &str, sink: &mut ErrorSink) -> Result<Arc<TemplateConfig>, NamingError> {
        let found = self.templates.get(&self.resolver, &self.aliases, key_or_template, sink);
        recover(sink, found, || Arc::new(TemplateConfig::inline(key_or_template)))
    }

    /// Canonical lowercase key of a component name.
    pub(crate) fn component_key(&self, name: &str, sink: &mut ErrorSink) -> Result<String, NamingError> {
        let key = aliases::component_key(&self.aliases, &self.resolver, name);
        recover(sink, key, || name.to_lowercase())
    }

    /// The component called `name`; definition errors are reported and the
    /// component treated as missing.
    pub(crate) fn component(&self, name: &str, sink: &mut ErrorSink) -> Result<Option<Arc<Component>>, NamingError> {
        let found = self.components.get(&self.resolver, name);
        recover(sink, found, || None)
    }

    /// `$.templateComponentKey`, lowercased, when set.
    pub(crate) fn template_component_key(&self, sink: &mut ErrorSink) -> Result<Option<String>, NamingError> {
        let found = self.resolver.try_get_value::<String>("$.templateComponentKey");
        let key = recover(sink, found, || None)?;
        Ok(key.map(|k| k.to_lowercase()).filter(|k| !k.is_empty()))
    }

    pub(crate) fn aliases_of(&self, name: &str, sink: &mut ErrorSink) -> Result<Vec<String>, NamingError> {
        let found = self.aliases.aliases_of(&self.resolver, AliasKind::Component, name);
        recover(sink, found, Vec::new)
    }
}

/// Route a failed lookup through `sink`, continuing with `fallback` when suppressed.
fn recover<T>(
    sink: &mut ErrorSink,
    result: Result<T, NamingError>,
    fallback: impl FnOnce() -> T,
) -> Result<T, NamingError> {
    match result {
        Ok(value) => Ok(value),
        Err(e) => {
            sink.report(e)?;
            Ok(fallback())
        }
    }
}

/// Cut `name` to `max` characters, then drop trailing characters in `invalid_end`.
fn truncate(name: &str, max: usize, invalid_end: Option<&str>) -> String {
    let cut: String = name.chars().take(max).collect();
    match invalid_end.filter(|chars| !chars.is_empty()) {
        Some(chars) => cut.trim_end_matches(|c| chars.contains(c)).to_string(),
        None => cut,
    }
}

fn regex_mismatch(result: &str, pattern: &str, key_or_template: &str, config: &TemplateConfig) -> String {
    let mut lines = vec![format!("Result '{result}' does not match regex '{pattern}'")];
    let details = [
        ("TemplateKey", Some(key_or_template)),
        ("Template", config.template.as_deref()),
        ("ValidText", config.valid_text.as_deref()),
        ("InvalidText", config.invalid_text.as_deref()),
    ];
    for (label, value) in details {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            lines.push(format!("{label}: {value}"));
        }
    }
    lines.join("\n")
}
