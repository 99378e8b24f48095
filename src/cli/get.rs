//! `aznaming get`: generate one name.
//!
//! ```bash
//! aznaming --config ./naming.json get rg --value env=dev --value app=web
//! aznaming get "{app}-{env}" --values ./values.json --format json
//! ```

use super::common::{CommandContext, OutputFormat, ValuesArgs};
use anyhow::Result;
use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct GetCommand {
    /// Template key, or an inline template such as `"{app}-{env}"`
    pub key: String,

    #[command(flatten)]
    pub values: ValuesArgs,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl GetCommand {
    pub async fn execute(self, context: &CommandContext) -> Result<()> {
        let values = self.values.to_json()?;
        let key = self.key;
        let outcome = context
            .run(move |invoker, options| invoker.get_name(&key, values.as_deref(), options))
            .await?;
        context.print(&outcome, self.format)
    }
}
