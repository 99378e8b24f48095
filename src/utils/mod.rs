//! Utilities shared by the configuration and CLI layers.
//!
//! # Modules
//!
//! - [`download`] - fetching remote configuration documents to local temp files
//! - [`paths`] - home directory lookup and `~`/environment expansion of sources

pub mod download;
pub mod paths;

pub use download::{Downloader, HttpDownloader};
pub use paths::{expand_source, get_home_dir, is_http_url};
