//! User-wide defaults for the aznaming CLI.
//!
//! The file is optional. When present it supplies configuration sources that are
//! always loaded and defaults for options the command line leaves unset.
//!
//! ```toml
//! config_uris = ["~/naming/azure.json"]
//! allow_truncation = true
//! subscription_id = "00000000-0000-0000-0000-000000000000"
//! ```

use super::NamingOptions;
use crate::constants::CONFIG_PATH_ENV;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Contents of `~/.aznaming/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Sources every invocation starts from; shadowed by `--config` sources
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub config_uris: Vec<String>,
    pub allow_truncation: bool,
    pub no_additional_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_group_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl GlobalConfig {
    /// Load from the default location, or defaults when there is no file.
    ///
    /// # Errors
    ///
    /// The path cannot be determined, or the file exists but cannot be read or
    /// parsed.
    pub async fn load() -> Result<Self> {
        Self::load_with_optional(None).await
    }

    /// Load from `path`, falling back to the default location.
    ///
    /// # Errors
    ///
    /// The file exists but cannot be read or parsed.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        if path.exists() {
            Self::load_from(&path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    ///
    /// # Errors
    ///
    /// The file cannot be read or is not valid TOML for this structure.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read global config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse global config from {}", path.display()))
    }

    /// Platform location of the global config file.
    ///
    /// - `AZNAMING_CONFIG_PATH` when set
    /// - **Windows**: `%LOCALAPPDATA%\aznaming\config.toml`
    /// - **Unix/macOS**: `~/.aznaming/config.toml`
    ///
    /// # Errors
    ///
    /// The home (or local data) directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV)
            && !path.is_empty()
        {
            return Ok(PathBuf::from(path));
        }

        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("aznaming")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".aznaming")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Fill in what `options` leaves unset.
    ///
    /// Flags are or-ed and identifiers are only taken when missing.
    /// `config_uris` are not merged here; they are the base sources every
    /// invocation starts from (see [`NamingInvoker`](crate::invoke::NamingInvoker)).
    pub fn apply_to(&self, options: &mut NamingOptions) {
        options.allow_truncation |= self.allow_truncation;
        options.no_additional_values |= self.no_additional_values;

        if options.subscription().is_none() {
            options.subscription_id.clone_from(&self.subscription_id);
        }
        if options.resource_group().is_none() {
            options.resource_group_name.clone_from(&self.resource_group_name);
        }
        if options.location().is_none() {
            options.location.clone_from(&self.location);
        }
    }
}
