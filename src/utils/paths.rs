//! Home directory lookup and `~`/environment expansion for configuration sources.

use anyhow::Result;
use std::path::PathBuf;

/// The current user's home directory.
///
/// # Errors
///
/// Fails when the platform does not report one (no `HOME`/`USERPROFILE`).
pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| {
        let platform_help = if cfg!(windows) {
            "On Windows: Check that the USERPROFILE environment variable is set"
        } else {
            "On Unix/Linux: Check that the HOME environment variable is set"
        };
        anyhow::anyhow!("Could not determine home directory.\n\n{platform_help}")
    })
}

/// Expand a leading `~/` and `$VAR`/`${VAR}` references in a configuration source.
///
/// URLs and inline JSON documents are returned unchanged.
///
/// # Errors
///
/// Fails when the home directory is unknown or a referenced variable is unset.
///
/// # Examples
///
/// ```rust,no_run
/// use aznaming::utils::expand_source;
///
/// # fn example() -> anyhow::Result<()> {
/// let path = expand_source("~/naming/config.json")?;
/// assert!(!path.starts_with('~'));
/// # Ok(())
/// # }
/// ```
pub fn expand_source(source: &str) -> Result<String> {
    let trimmed = source.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') || is_http_url(trimmed) {
        return Ok(source.to_string());
    }

    let expanded = if let Some(stripped) = source.strip_prefix("~/") {
        get_home_dir()?.join(stripped).to_string_lossy().into_owned()
    } else {
        source.to_string()
    };

    shellexpand::env(&expanded)
        .map(|cow| cow.into_owned())
        .map_err(|e| anyhow::anyhow!("Failed to expand '{source}': {e}"))
}

/// Whether `text` is an `http://` or `https://` URL.
pub fn is_http_url(text: &str) -> bool {
    let lower = text.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
