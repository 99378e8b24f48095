//! Reading JSON inputs given either inline or as a file path.
//!
//! Command-line arguments and invocation parameters (values, options, input
//! documents) accept both forms:
//!
//! ```text
//! aznaming get rg --values '{"env": "dev"}'
//! aznaming get rg --values ./values.json
//! ```
//!
//! Text whose first non-blank character is `{` or `[` is parsed as JSON;
//! anything else is a path, relative to the working directory.

use crate::sections::is_inline_json;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Parse `input` as JSON text or as the contents of the file it names.
///
/// `what` names the input in error messages.
///
/// # Errors
///
/// The file cannot be read, or the JSON does not parse into `T`.
pub fn parse_json_input<T>(input: &str, what: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let trimmed = input.trim_start();
    if is_inline_json(trimmed) {
        return serde_json::from_str(trimmed).with_context(|| format!("Failed to parse {what} JSON"));
    }

    let path = Path::new(input.trim());
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {what} file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {what} file: {}", path.display()))
}

/// Like [`parse_json_input`], with `None` or blank input meaning `T::default()`.
///
/// # Errors
///
/// See [`parse_json_input`].
pub fn parse_optional_json_input<T>(input: Option<&str>, what: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match input.filter(|text| !text.trim().is_empty()) {
        Some(text) => parse_json_input(text, what),
        None => Ok(T::default()),
    }
}
