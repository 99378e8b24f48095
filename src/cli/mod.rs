//! Command-line interface for aznaming.
//!
//! Each subcommand is a thin layer over [`NamingInvoker`](crate::invoke::NamingInvoker):
//!
//! - `get` - generate a name
//! - `evaluate` - generate a name and print the full report
//! - `get-json` - replace every name node of a JSON document with its name
//! - `evaluate-json` - report on every name node of a JSON document
//! - `test` - evaluate templates against one set of values
//!
//! # Options
//!
//! Flags mirroring [`NamingOptions`](crate::config::NamingOptions) are global
//! and may also come from an `--options` document. Defaults for them, and base
//! configuration sources, come from `~/.aznaming/config.toml`.
//!
//! ```bash
//! aznaming --config ./naming.json get rg --value env=dev --value app=web
//! aznaming --config ./naming.json --suppress-error evaluate vm --values '{"app": "db"}'
//! aznaming --config ./naming.json test --value env=dev --value app=x
//! ```
//!
//! # Environment
//!
//! - `AZURE_NAMING_CONFIG_URI` - extra configuration sources, `,` or `;` separated
//! - `AZURE_ACCESS_TOKEN` - bearer token for `--check-unique-name`
//! - `AZNAMING_CONFIG_PATH` - location of the global config file
//! - `RUST_LOG` - log filter, overrides `--verbose`

mod common;
mod document;
mod evaluate;
mod get;

pub use common::{CommandContext, NamingArgs, OutputFormat, ValuesArgs};

use crate::config::GlobalConfig;
use crate::invoke::NamingInvoker;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Settings derived from the global flags, separate from the command so
/// tests can inject them.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter when `RUST_LOG` is unset; `None` disables logging.
    pub log_level: Option<String>,

    /// Global config file instead of the default location.
    pub global_config: Option<PathBuf>,

    /// Suppress warnings on stderr.
    pub quiet: bool,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the stderr log subscriber. A second call is a no-op.
    pub fn init_logging(&self) {
        let filter = match std::env::var("RUST_LOG") {
            Ok(filter) if !filter.is_empty() => EnvFilter::new(filter),
            _ => match &self.log_level {
                Some(level) => EnvFilter::new(level),
                None => return,
            },
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

#[derive(Parser)]
#[command(
    name = "aznaming",
    about = "Generate Azure resource names from naming conventions",
    version,
    long_about = "aznaming builds resource names from templates, components and values defined in layered JSON configuration documents."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at debug level
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print results and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Global config file (default: ~/.aznaming/config.toml)
    #[arg(long, value_name = "PATH", global = true)]
    global_config: Option<PathBuf>,

    #[command(flatten)]
    naming: NamingArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a name
    Get(get::GetCommand),

    /// Generate a name and print how it was built
    Evaluate(evaluate::EvaluateCommand),

    /// Replace every name node of a JSON document with its name
    #[command(name = "get-json")]
    GetJson(document::DocumentCommand),

    /// Report on every name node of a JSON document
    #[command(name = "evaluate-json")]
    EvaluateJson(document::DocumentCommand),

    /// Evaluate templates against one set of values
    Test(test::TestCommand),
}

impl Cli {
    /// Run the parsed command.
    ///
    /// # Errors
    ///
    /// The global config or an input cannot be read, or naming fails.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translate the global flags.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("warn".to_string())
        };

        CliConfig {
            log_level,
            global_config: self.global_config.clone(),
            quiet: self.quiet,
        }
    }

    /// Run with injected settings.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        let global = GlobalConfig::load_with_optional(config.global_config.clone()).await?;
        let mut options = self.naming.to_options()?;
        global.apply_to(&mut options);
        debug!(sources = options.config_uri.len(), base_sources = global.config_uris.len(), "options ready");

        let context = CommandContext {
            invoker: NamingInvoker::new(global.config_uris),
            options,
            quiet: config.quiet,
        };

        match self.command {
            Commands::Get(cmd) => cmd.execute(&context).await,
            Commands::Evaluate(cmd) => cmd.execute(&context).await,
            Commands::GetJson(cmd) => cmd.execute_get(&context).await,
            Commands::EvaluateJson(cmd) => cmd.execute_evaluate(&context).await,
            Commands::Test(cmd) => cmd.execute(&context).await,
        }
    }
}
