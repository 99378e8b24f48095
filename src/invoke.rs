//! One-shot naming calls over JSON text.
//!
//! [`NamingInvoker`] is the surface used by the CLI and by hosts that speak in
//! strings: every call builds a fresh [`NamingService`], applies the options,
//! loads the configuration sources and returns the result as JSON text with
//! the errors met on the way.
//!
//! Configuration sources are layered in this order, later ones shadowing
//! earlier ones:
//!
//! 1. the sources the invoker was created with
//! 2. `AZURE_NAMING_CONFIG_URI` (entries separated by `,` or `;`)
//! 3. `configUri` from the options
//!
//! `clearConfig` drops the first layer before the other two are added.

use crate::config::{NamingOptions, parse_json_input, parse_optional_json_input};
use crate::constants::CONFIG_URI_ENV;
use crate::naming::{NamingService, Values};
use crate::rest::RestTransport;
use crate::sections::{ConfigResolver, is_inline_json};
use crate::utils::expand_source;
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, instrument};

/// A result and the error messages recorded while producing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvokeResult<T> {
    pub result: T,
    pub errors: Vec<String>,
}

impl<T> InvokeResult<T> {
    pub fn new(result: T, errors: impl IntoIterator<Item = String>) -> Self {
        Self {
            result,
            errors: errors.into_iter().collect(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs naming operations on JSON inputs.
///
/// Inputs named `*_json_or_path` are either JSON text or the path of a file
/// holding it, relative to the working directory.
#[derive(Clone, Default)]
pub struct NamingInvoker {
    config_uris: Vec<String>,
    base_dir: Option<PathBuf>,
    transport: Option<Arc<dyn RestTransport>>,
}

impl NamingInvoker {
    /// Invoker whose services always start from `config_uris`.
    pub fn new<I, S>(config_uris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            config_uris: config_uris.into_iter().map(Into::into).collect(),
            base_dir: None,
            transport: None,
        }
    }

    /// Resolve relative configuration paths against `base_dir` instead of the
    /// working directory.
    #[must_use]
    pub fn with_base_dir(mut self, base_dir: PathBuf) -> Self {
        self.base_dir = Some(base_dir);
        self
    }

    /// Use `transport` for availability checks instead of the Azure client.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn RestTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Generate a name. The result is the name itself.
    ///
    /// # Errors
    ///
    /// An input cannot be read, or naming fails with `suppressError` off.
    #[instrument(skip(self, values_json_or_path, options), level = "debug")]
    pub fn get_name(
        &self,
        key_or_template: &str,
        values_json_or_path: Option<&str>,
        options: &NamingOptions,
    ) -> Result<InvokeResult<String>> {
        let values = read_values(values_json_or_path)?;
        let service = self.service(options)?;
        let (name, error) = service.get_name(key_or_template, &values)?;
        Ok(InvokeResult::new(name, error))
    }

    /// Evaluate a name. The result is the serialized
    /// [`NameInfo`](crate::naming::NameInfo).
    ///
    /// # Errors
    ///
    /// An input cannot be read or the report cannot be serialized.
    #[instrument(skip(self, values_json_or_path, options), level = "debug")]
    pub fn evaluate_name(
        &self,
        key_or_template: &str,
        values_json_or_path: Option<&str>,
        options: &NamingOptions,
    ) -> Result<InvokeResult<String>> {
        let values = read_values(values_json_or_path)?;
        let service = self.service(options)?;
        let info = service.evaluate_name(key_or_template, &values);
        let json = serde_json::to_string(&info).context("Failed to serialize name report")?;
        Ok(InvokeResult::new(json, info.error))
    }

    /// Replace every name node of a document with its name.
    ///
    /// # Errors
    ///
    /// An input cannot be read, or a name fails with `suppressError` off.
    #[instrument(skip_all, level = "debug")]
    pub fn get_name_json(
        &self,
        graph_json_or_path: &str,
        values_json_or_path: Option<&str>,
        key_or_template: Option<&str>,
        options: &NamingOptions,
    ) -> Result<InvokeResult<String>> {
        let graph: Value = parse_json_input(graph_json_or_path, "document")?;
        let values = read_values(values_json_or_path)?;
        let service = self.service(options)?;
        let outcome = service.get_name_json(&graph, &values, key_or_template)?;
        let json = serde_json::to_string(&outcome.document).context("Failed to serialize named document")?;
        Ok(InvokeResult::new(json, outcome.errors))
    }

    /// Evaluate every name node of a document. The result maps each node's
    /// path to its report.
    ///
    /// # Errors
    ///
    /// An input cannot be read or a report cannot be serialized.
    #[instrument(skip_all, level = "debug")]
    pub fn evaluate_name_json(
        &self,
        graph_json_or_path: &str,
        values_json_or_path: Option<&str>,
        key_or_template: Option<&str>,
        options: &NamingOptions,
    ) -> Result<InvokeResult<String>> {
        let graph: Value = parse_json_input(graph_json_or_path, "document")?;
        let values = read_values(values_json_or_path)?;
        let service = self.service(options)?;
        let outcome = service.evaluate_name_json(&graph, &values, key_or_template)?;
        let json = serde_json::to_string(&outcome.document).context("Failed to serialize name reports")?;
        Ok(InvokeResult::new(json, outcome.errors))
    }

    /// Evaluate `keys` (every template when empty) against one set of values.
    /// The result is `{"success": bool, "errors": [...]}`.
    ///
    /// # Errors
    ///
    /// An input cannot be read.
    #[instrument(skip(self, values_json_or_path, options), level = "debug")]
    pub fn test_name_json(
        &self,
        values_json_or_path: Option<&str>,
        keys: &[String],
        options: &NamingOptions,
    ) -> Result<InvokeResult<String>> {
        let values = read_values(values_json_or_path)?;
        let service = self.service(options)?;
        let report = service.test_name(&values, keys);
        let json = serde_json::to_string(&report).context("Failed to serialize test report")?;
        Ok(InvokeResult::new(json, report.errors))
    }

    fn service(&self, options: &NamingOptions) -> Result<NamingService> {
        let base_dir = match &self.base_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("Failed to determine the working directory")?,
        };

        let resolver = ConfigResolver::with_base_dir(base_dir);
        for uri in &self.config_uris {
            resolver.add_section(&expand_source(uri)?, None);
        }

        let mut service = NamingService::new(resolver).with_options(options.clone());
        if let Some(transport) = &self.transport {
            service = service.with_transport(Arc::clone(transport));
        }

        if options.clear_config {
            service.clear_config();
        }

        let env_uris = std::env::var(CONFIG_URI_ENV).ok();
        for uri in config_sources(env_uris.as_deref(), &options.config_uri) {
            let added = service.add_config(&expand_source(&uri)?, None);
            debug!(%uri, added, "added configuration source");
        }

        Ok(service)
    }
}

/// Parse options given as JSON text or a file path; absent means defaults.
///
/// # Errors
///
/// The options cannot be read or do not match [`NamingOptions`].
pub fn read_options(options_json_or_path: Option<&str>) -> Result<NamingOptions> {
    parse_optional_json_input(options_json_or_path, "options")
}

fn read_values(values_json_or_path: Option<&str>) -> Result<Values> {
    parse_optional_json_input(values_json_or_path, "values")
}

/// Ordered, de-duplicated source list from the environment and the options.
///
/// Entries are split on `,` and `;` unless they are inline JSON.
fn config_sources(env_uris: Option<&str>, option_uris: &[String]) -> Vec<String> {
    let mut sources: Vec<String> = Vec::new();
    let entries = env_uris.into_iter().chain(option_uris.iter().map(String::as_str));

    for entry in entries {
        let parts: Vec<&str> = if is_inline_json(entry.trim_start()) {
            vec![entry.trim()]
        } else {
            entry.split([',', ';']).map(str::trim).collect()
        };
        for part in parts {
            if !part.is_empty() && !sources.iter().any(|existing| existing == part) {
                sources.push(part.to_string());
            }
        }
    }
    sources
}
