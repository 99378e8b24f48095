//! `aznaming evaluate`: generate one name and report how it was built.

use super::common::{CommandContext, OutputFormat, ValuesArgs};
use anyhow::Result;
use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct EvaluateCommand {
    /// Template key, or an inline template such as `"{app}-{env}"`
    pub key: String,

    #[command(flatten)]
    pub values: ValuesArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl EvaluateCommand {
    /// Prints the report. A failed evaluation is part of the report, not an
    /// error of the command.
    pub async fn execute(self, context: &CommandContext) -> Result<()> {
        let values = self.values.to_json()?;
        let key = self.key;
        let outcome = context
            .run(move |invoker, options| invoker.evaluate_name(&key, values.as_deref(), options))
            .await?;
        context.print(&outcome, self.format)
    }
}
