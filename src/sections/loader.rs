//! Locating and reading configuration sources.
//!
//! A source string is one of:
//! - an `http://`/`https://` URL, downloaded through a [`Downloader`]
//! - an `embedded:<name>` document registered in-process
//! - an absolute file path
//! - a relative file path, resolved against the document that mentions it
//!   (a manifest's directory or URL) or the loader's base directory
//!
//! Inline JSON is recognised by [`is_inline_json`] before the loader is involved.

use crate::constants::EMBEDDED_SCHEME;
use crate::core::NamingError;
use crate::utils::{Downloader, is_http_url};
use dashmap::DashMap;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Whether a source string is an inline JSON document rather than a location.
pub fn is_inline_json(source: &str) -> bool {
    let trimmed = source.trim_start();
    trimmed.starts_with('{') || trimmed.starts_with('[')
}

/// What relative sources found inside a document are resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceBase {
    /// Directory of a local document
    Dir(PathBuf),
    /// URL of a remote document
    Url(String),
}

/// Where a source string points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Http(String),
    File(PathBuf),
    Embedded(String),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(url) => f.write_str(url),
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Embedded(name) => write!(f, "{EMBEDDED_SCHEME}{name}"),
        }
    }
}

/// A parsed source document and where it came from.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub document: Value,
    /// Resolved location, used as the section URI
    pub origin: String,
    /// Base for relative sources listed inside `document`
    pub base: SourceBase,
}

/// Reads configuration sources from disk, the network, or the embedded registry.
pub struct SourceLoader {
    base_dir: PathBuf,
    downloader: Arc<dyn Downloader>,
    embedded: DashMap<String, String>,
}

impl SourceLoader {
    /// Create a loader resolving top-level relative paths against `base_dir`.
    pub fn new(base_dir: PathBuf, downloader: Arc<dyn Downloader>) -> Self {
        Self {
            base_dir,
            downloader,
            embedded: DashMap::new(),
        }
    }

    /// Register `json` under `embedded:<name>`. Names are case-insensitive.
    pub fn register_embedded(&self, name: &str, json: impl Into<String>) {
        self.embedded.insert(name.to_lowercase(), json.into());
    }

    /// Base directory for top-level relative paths.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Work out where `uri` points, relative to `base` when it is relative.
    ///
    /// # Errors
    ///
    /// Fails when a relative source cannot be joined onto a remote base.
    pub fn locate(&self, uri: &str, base: Option<&SourceBase>) -> Result<Location, NamingError> {
        let uri = uri.trim();
        if is_http_url(uri) {
            return Ok(Location::Http(uri.to_string()));
        }
        if let Some(name) = strip_prefix_ignore_case(uri, EMBEDDED_SCHEME) {
            return Ok(Location::Embedded(name.to_string()));
        }

        let path = Path::new(uri);
        if path.is_absolute() {
            return Ok(Location::File(path.to_path_buf()));
        }

        match base {
            Some(SourceBase::Url(parent)) => {
                let joined = reqwest::Url::parse(parent)
                    .and_then(|url| url.join(uri))
                    .map_err(|e| NamingError::Source {
                        uri: uri.to_string(),
                        reason: format!("cannot resolve against '{parent}': {e}"),
                    })?;
                Ok(Location::Http(joined.to_string()))
            }
            Some(SourceBase::Dir(dir)) => Ok(Location::File(dir.join(path))),
            None => Ok(Location::File(self.base_dir.join(path))),
        }
    }

    /// Locate, read and parse `uri`.
    ///
    /// # Errors
    ///
    /// [`NamingError::Io`] / [`NamingError::Http`] when the source cannot be read,
    /// [`NamingError::Source`] for unknown embedded names, and
    /// [`NamingError::Json`] when the content is not JSON.
    pub fn load(&self, uri: &str, base: Option<&SourceBase>) -> Result<LoadedSource, NamingError> {
        let location = self.locate(uri, base)?;
        debug!(?location, "loading configuration source");

        let (text, origin, next_base) = match location {
            Location::Http(url) => {
                let local = self.downloader.download(&url)?;
                (read_file(&local)?, url.clone(), SourceBase::Url(url))
            }
            Location::File(path) => {
                let text = read_file(&path)?;
                let dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| self.base_dir.clone());
                (text, path.display().to_string(), SourceBase::Dir(dir))
            }
            Location::Embedded(name) => {
                let text = self
                    .embedded
                    .get(&name.to_lowercase())
                    .map(|entry| entry.value().clone())
                    .ok_or_else(|| NamingError::Source {
                        uri: uri.to_string(),
                        reason: "no embedded document is registered under that name".to_string(),
                    })?;
                let next_base = base.cloned().unwrap_or_else(|| SourceBase::Dir(self.base_dir.clone()));
                (text, format!("{EMBEDDED_SCHEME}{name}"), next_base)
            }
        };

        let document = parse_json(&text, &origin)?;
        Ok(LoadedSource {
            document,
            origin,
            base: next_base,
        })
    }
}

/// Parse `text` as JSON, naming `origin` in the error.
pub fn parse_json(text: &str, origin: &str) -> Result<Value, NamingError> {
    serde_json::from_str(text).map_err(|e| NamingError::Json {
        origin: origin.to_string(),
        reason: e.to_string(),
    })
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &text[prefix.len()..])
}

fn read_file(path: &Path) -> Result<String, NamingError> {
    std::fs::read_to_string(path).map_err(|e| NamingError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
