//! Core types shared by every layer of aznaming.
//!
//! At the moment this is the error system:
//! - [`NamingError`] - enumerated failure modes of configuration loading and evaluation
//! - [`ErrorSink`] - first-error recording with optional suppression
//! - [`ErrorContext`] - user-facing wrapper with suggestions and details
//! - [`user_friendly_error`] - convert any `anyhow::Error` for CLI display
//!
//! # Examples
//!
//! ```rust,no_run
//! use aznaming::core::{NamingError, user_friendly_error};
//!
//! fn evaluate() -> anyhow::Result<String> {
//!     Err(NamingError::value("Value for 'env' is required").into())
//! }
//!
//! if let Err(e) = evaluate() {
//!     user_friendly_error(e).display();
//! }
//! ```

pub mod error;

pub use error::{ErrorContext, ErrorSink, NamingError, user_friendly_error};
