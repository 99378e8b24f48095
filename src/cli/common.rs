//! Arguments and helpers shared by every naming command.

use crate::config::{NamingOptions, parse_optional_json_input};
use crate::core::NamingError;
use crate::invoke::{InvokeResult, NamingInvoker, read_options};
use crate::naming::Values;
use anyhow::{Context, Result, anyhow};
use clap::{Args, ValueEnum};
use colored::Colorize;
use serde_json::Value;

/// Flags mirroring [`NamingOptions`], accepted by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct NamingArgs {
    /// Naming configuration source: file, URL, `embedded:<name>` or inline JSON.
    ///
    /// Repeatable. Later sources shadow earlier ones.
    #[arg(long = "config", value_name = "URI", global = true)]
    pub config: Vec<String>,

    /// Options document (JSON text or file); flags below override it
    #[arg(long, value_name = "JSON|PATH", global = true)]
    pub options: Option<String>,

    /// Record errors on the result instead of failing
    #[arg(long, global = true)]
    pub suppress_error: bool,

    /// Truncate names longer than the template's maximum length
    #[arg(long, global = true)]
    pub allow_truncation: bool,

    /// Fail when values are given that the template does not use
    #[arg(long, global = true)]
    pub no_additional_values: bool,

    /// Ask Azure whether the generated name is available
    #[arg(long, global = true)]
    pub check_unique_name: bool,

    /// Ignore the configuration sources from the global config file
    #[arg(long, global = true)]
    pub clear_config: bool,

    #[arg(long, value_name = "ID", global = true)]
    pub subscription_id: Option<String>,

    #[arg(long, value_name = "NAME", global = true)]
    pub resource_group_name: Option<String>,

    #[arg(long, value_name = "LOCATION", global = true)]
    pub location: Option<String>,
}

impl NamingArgs {
    /// Options document overlaid with the command-line flags.
    ///
    /// # Errors
    ///
    /// `--options` cannot be read or parsed.
    pub fn to_options(&self) -> Result<NamingOptions> {
        let mut options = read_options(self.options.as_deref())?;

        options.suppress_error |= self.suppress_error;
        options.allow_truncation |= self.allow_truncation;
        options.no_additional_values |= self.no_additional_values;
        options.check_unique_name |= self.check_unique_name;
        options.clear_config |= self.clear_config;

        if self.subscription_id.is_some() {
            options.subscription_id.clone_from(&self.subscription_id);
        }
        if self.resource_group_name.is_some() {
            options.resource_group_name.clone_from(&self.resource_group_name);
        }
        if self.location.is_some() {
            options.location.clone_from(&self.location);
        }

        options.config_uri.extend(self.config.iter().cloned());
        Ok(options)
    }
}

/// Placeholder values from `--values` and `--value`.
#[derive(Args, Debug, Clone, Default)]
pub struct ValuesArgs {
    /// Values document (JSON object text or file)
    #[arg(long, value_name = "JSON|PATH")]
    pub values: Option<String>,

    /// A single value; wins over `--values`
    #[arg(long = "value", value_name = "KEY=VALUE")]
    pub value: Vec<String>,
}

impl ValuesArgs {
    /// The merged values as JSON text, or `None` when nothing was given.
    ///
    /// # Errors
    ///
    /// `--values` cannot be read, or a `--value` has no `=`.
    pub fn to_json(&self) -> Result<Option<String>> {
        if self.value.is_empty() {
            return Ok(self.values.clone());
        }

        let mut values: Values = parse_optional_json_input(self.values.as_deref(), "values")?;
        for pair in &self.value {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("Invalid value '{pair}': expected KEY=VALUE"))?;
            values.insert(key.trim().to_string(), Value::String(value.to_string()));
        }
        Ok(Some(Value::Object(values).to_string()))
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// The bare result, errors as warnings on stderr
    #[default]
    Text,
    /// `{"result": ..., "errors": [...]}`
    Json,
}

/// Everything a command needs to run.
#[derive(Clone)]
pub struct CommandContext {
    pub invoker: NamingInvoker,
    pub options: NamingOptions,
    pub quiet: bool,
}

impl CommandContext {
    /// Run `call` off the async runtime; the invoker does blocking I/O.
    pub async fn run<F>(&self, call: F) -> Result<InvokeResult<String>>
    where
        F: FnOnce(&NamingInvoker, &NamingOptions) -> Result<InvokeResult<String>> + Send + 'static,
    {
        let invoker = self.invoker.clone();
        let options = self.options.clone();
        tokio::task::spawn_blocking(move || call(&invoker, &options))
            .await
            .context("Naming task panicked")?
    }

    /// Print `outcome` in `format`. Text output pretty-prints JSON results.
    ///
    /// # Errors
    ///
    /// The JSON envelope cannot be serialized.
    pub fn print(&self, outcome: &InvokeResult<String>, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Text => {
                println!("{}", pretty(&outcome.result));
                self.warn(&outcome.errors);
            }
            OutputFormat::Json => {
                let result = serde_json::from_str::<Value>(&outcome.result)
                    .unwrap_or_else(|_| Value::String(outcome.result.clone()));
                let envelope = InvokeResult::new(result, outcome.errors.iter().cloned());
                println!("{}", serde_json::to_string_pretty(&envelope)?);
            }
        }
        Ok(())
    }

    /// Print suppressed errors to stderr unless `--quiet`.
    pub fn warn(&self, errors: &[String]) {
        if self.quiet {
            return;
        }
        for error in errors {
            eprintln!("{}: {error}", "warning".yellow().bold());
        }
    }
}

/// Pretty-print JSON objects and arrays; anything else as is.
pub fn pretty(result: &str) -> String {
    match serde_json::from_str::<Value>(result) {
        Ok(value @ (Value::Object(_) | Value::Array(_))) => {
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| result.to_string())
        }
        _ => result.to_string(),
    }
}

/// Fail with every collected message.
pub fn failed(errors: Vec<String>) -> anyhow::Error {
    NamingError::Aggregate { errors }.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_options_document() {
        let args = NamingArgs {
            config: vec!["b.json".into()],
            options: Some(r#"{"configUri": ["a.json"], "location": "westeurope"}"#.into()),
            allow_truncation: true,
            location: Some("eastus".into()),
            ..NamingArgs::default()
        };
        let options = args.to_options().unwrap();
        assert_eq!(options.config_uri, vec!["a.json", "b.json"]);
        assert!(options.allow_truncation);
        assert_eq!(options.location(), Some("eastus"));
    }

    #[test]
    fn test_single_values_win() {
        let args = ValuesArgs {
            values: Some(r#"{"env": "dev", "app": "web"}"#.into()),
            value: vec!["env=prod".into()],
        };
        let json: Value = serde_json::from_str(&args.to_json().unwrap().unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({"env": "prod", "app": "web"}));
    }

    #[test]
    fn test_value_without_equals_is_rejected() {
        let args = ValuesArgs {
            values: None,
            value: vec!["env".into()],
        };
        assert!(args.to_json().unwrap_err().to_string().contains("KEY=VALUE"));
    }

    #[test]
    fn test_pretty_leaves_plain_names() {
        assert_eq!(pretty("rg-web"), "rg-web");
        assert_eq!(pretty(r#"{"a":1}"#), "{\n  \"a\": 1\n}");
    }
}
