//! `aznaming get-json` and `aznaming evaluate-json`: name every name node of a
//! JSON document.
//!
//! ```bash
//! aznaming --config ./naming.json get-json ./deployment.json --value env=prod -o named.json
//! ```

use super::common::{CommandContext, OutputFormat, ValuesArgs, pretty};
use crate::invoke::InvokeResult;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug, Clone)]
pub struct DocumentCommand {
    /// Document to name (JSON text or file)
    #[arg(value_name = "JSON|PATH")]
    pub input: String,

    #[command(flatten)]
    pub values: ValuesArgs,

    /// Template for name nodes that neither have nor inherit one
    #[arg(long, value_name = "KEY")]
    pub key: Option<String>,

    /// Write the result here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl DocumentCommand {
    /// Replace name nodes with names.
    pub async fn execute_get(self, context: &CommandContext) -> Result<()> {
        let (input, values, key) = (self.input.clone(), self.values.to_json()?, self.key.clone());
        let outcome = context
            .run(move |invoker, options| invoker.get_name_json(&input, values.as_deref(), key.as_deref(), options))
            .await?;
        self.emit(context, &outcome).await
    }

    /// Report on every name node.
    pub async fn execute_evaluate(self, context: &CommandContext) -> Result<()> {
        let (input, values, key) = (self.input.clone(), self.values.to_json()?, self.key.clone());
        let outcome = context
            .run(move |invoker, options| {
                invoker.evaluate_name_json(&input, values.as_deref(), key.as_deref(), options)
            })
            .await?;
        self.emit(context, &outcome).await
    }

    async fn emit(&self, context: &CommandContext, outcome: &InvokeResult<String>) -> Result<()> {
        let Some(path) = &self.output else {
            return context.print(outcome, self.format);
        };

        tokio::fs::write(path, pretty(&outcome.result))
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), errors = outcome.errors.len(), "wrote named document");
        context.warn(&outcome.errors);
        Ok(())
    }
}
