//! Downloading remote configuration documents.
//!
//! Remote sources are fetched once into a process-lifetime temporary directory
//! and read from disk afterwards like any other file. The temporary directory is
//! removed when the [`HttpDownloader`] is dropped.
//!
//! [`Downloader`] is the seam the configuration resolver talks to, so tests can
//! substitute an in-memory implementation.

use crate::constants::HTTP_TIMEOUT;
use crate::core::NamingError;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tempfile::TempDir;
use tracing::debug;
use uuid::Uuid;

/// Fetches a URL to a local file.
pub trait Downloader: Send + Sync {
    /// Download `url` and return the path of the local copy.
    ///
    /// # Errors
    ///
    /// Transport failures and non-success statuses are [`NamingError::Http`].
    fn download(&self, url: &str) -> Result<PathBuf, NamingError>;
}

/// [`Downloader`] backed by a blocking `reqwest` client.
#[derive(Default)]
pub struct HttpDownloader {
    client: OnceLock<reqwest::blocking::Client>,
    temp_dir: OnceLock<Result<TempDir, NamingError>>,
}

impl HttpDownloader {
    /// Create a downloader. The client and temp directory are built on first use.
    pub fn new() -> Self {
        Self::default()
    }

    fn client(&self) -> &reqwest::blocking::Client {
        self.client.get_or_init(|| {
            reqwest::blocking::Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .unwrap_or_default()
        })
    }

    fn temp_dir(&self) -> Result<&Path, NamingError> {
        let dir = self.temp_dir.get_or_init(|| {
            tempfile::Builder::new()
                .prefix("aznaming-")
                .tempdir()
                .map_err(|e| NamingError::Io {
                    path: std::env::temp_dir().display().to_string(),
                    reason: e.to_string(),
                })
        });
        match dir {
            Ok(dir) => Ok(dir.path()),
            Err(e) => Err(e.clone()),
        }
    }
}

/// Local file name for `url`: the last path segment with a unique suffix.
fn local_file_name(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last = path.rsplit('/').next().filter(|s| !s.is_empty()).unwrap_or("download");
    let unique = Uuid::new_v4().simple();
    match last.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}_{unique}.{ext}"),
        _ => format!("{last}_{unique}"),
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str) -> Result<PathBuf, NamingError> {
        debug!("Downloading configuration from: {}", url);

        let http_error = |reason: String| NamingError::Http {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client()
            .get(url)
            .send()
            .map_err(|e| http_error(e.to_string()))?
            .error_for_status()
            .map_err(|e| http_error(e.to_string()))?;
        let bytes = response.bytes().map_err(|e| http_error(e.to_string()))?;

        let target = self.temp_dir()?.join(local_file_name(url));
        std::fs::write(&target, &bytes).map_err(|e| NamingError::Io {
            path: target.display().to_string(),
            reason: e.to_string(),
        })?;

        debug!("Saved {} bytes to {}", bytes.len(), target.display());
        Ok(target)
    }
}
