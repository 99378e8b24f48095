//! Error handling for aznaming
//!
//! Every failure the naming engine can raise is a [`NamingError`]. The enum is
//! `Clone` on purpose: the configuration resolver memoizes the outcome of loading a
//! section (including a failure) and hands that outcome to every later query, and
//! evaluation records the *first* error it sees as a plain message on the result.
//!
//! Two ideas shape the module:
//! 1. **Strongly-typed errors** that callers can match on (a circular `$ref` is not
//!    the same thing as an out-of-range instance number).
//! 2. **User-friendly messages** for the CLI, produced by [`user_friendly_error`]
//!    and rendered by [`ErrorContext::display`].
//!
//! # Error categories
//!
//! - **Configuration**: [`NamingError::Configuration`], [`NamingError::CircularReference`],
//!   [`NamingError::Json`], [`NamingError::Source`]
//! - **Value validation**: [`NamingError::Value`]
//! - **Result formatting**: [`NamingError::Format`]
//! - **Remote checks**: [`NamingError::RemoteCheck`], [`NamingError::Http`]
//! - **File system**: [`NamingError::Io`]
//! - **Batch operations**: [`NamingError::Aggregate`]
//!
//! # Suppression
//!
//! Evaluation routes recoverable errors through an [`ErrorSink`]. A sink built with
//! `suppress = true` remembers the first message and lets evaluation continue; a
//! non-suppressing sink returns the error so `?` aborts the operation.
//!
//! # Examples
//!
//! ```rust,no_run
//! use aznaming::core::{ErrorContext, NamingError};
//!
//! let error = NamingError::value("Value for 'env' is required");
//! let context = ErrorContext::new(error)
//!     .with_suggestion("Pass the missing value with --value env=<value>");
//!
//! context.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// The main error type for naming operations.
///
/// Messages are written for end users. Variants carrying a bare `message` display
/// that message unchanged, which is what ends up in `NameInfo::error`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NamingError {
    /// Configuration content is missing, malformed or inconsistent.
    ///
    /// Raised for things like a dictionary component without a source, a template
    /// default with an invalid value, or a `$ref` that does not point anywhere.
    #[error("{message}")]
    Configuration {
        /// Human-readable description
        message: String,
    },

    /// A `$ref` chain or a section manifest refers back to itself.
    #[error("Circular reference detected at '{chain}'")]
    CircularReference {
        /// The full cycle, e.g. `a -> b -> a`
        chain: String,
    },

    /// A supplied or derived placeholder value is not acceptable.
    #[error("{message}")]
    Value {
        /// Human-readable description
        message: String,
    },

    /// The generated name violates the template's length or regex rules.
    #[error("{message}")]
    Format {
        /// Human-readable description
        message: String,
    },

    /// The Azure name-availability check failed or reported the name as taken.
    #[error("{message}")]
    RemoteCheck {
        /// Human-readable description
        message: String,
    },

    /// Reading a configuration file failed.
    #[error("Failed to read '{path}': {reason}")]
    Io {
        /// File that could not be read
        path: String,
        /// Underlying I/O error text
        reason: String,
    },

    /// A configuration document is not valid JSON.
    #[error("Invalid JSON in {origin}: {reason}")]
    Json {
        /// Where the text came from (a URI or "inline configuration")
        origin: String,
        /// Parser message
        reason: String,
    },

    /// An HTTP request failed at the transport level or returned an error status.
    #[error("Request to {url} failed: {reason}")]
    Http {
        /// Requested URL
        url: String,
        /// Status line or transport error
        reason: String,
    },

    /// A configuration source URI could not be interpreted.
    #[error("Invalid configuration source '{uri}': {reason}")]
    Source {
        /// The source as given
        uri: String,
        /// Why it was rejected
        reason: String,
    },

    /// Several errors collected by a batch operation such as the JSON name tree.
    #[error("{}", errors.join("\n"))]
    Aggregate {
        /// One message per failure, in encounter order
        errors: Vec<String>,
    },
}

impl NamingError {
    /// Shorthand for [`NamingError::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Shorthand for [`NamingError::Value`].
    pub fn value(message: impl Into<String>) -> Self {
        Self::Value {
            message: message.into(),
        }
    }

    /// Shorthand for [`NamingError::Format`].
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Shorthand for [`NamingError::RemoteCheck`].
    pub fn remote_check(message: impl Into<String>) -> Self {
        Self::RemoteCheck {
            message: message.into(),
        }
    }

    /// Build a [`NamingError::CircularReference`] from the visited chain.
    ///
    /// The repeated element is appended so the message shows where the loop closes.
    pub fn circular<S: AsRef<str>>(chain: &[S], repeated: &str) -> Self {
        let mut parts: Vec<&str> = chain.iter().map(AsRef::as_ref).collect();
        parts.push(repeated);
        Self::CircularReference {
            chain: parts.join(" -> "),
        }
    }

    /// Short category label used in logs.
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Configuration { .. } | Self::CircularReference { .. } => "configuration",
            Self::Value { .. } => "value",
            Self::Format { .. } => "format",
            Self::RemoteCheck { .. } | Self::Http { .. } => "remote",
            Self::Io { .. } | Self::Json { .. } | Self::Source { .. } => "source",
            Self::Aggregate { .. } => "aggregate",
        }
    }
}

/// Records the first error of an evaluation and decides whether to keep going.
///
/// # Examples
///
/// ```rust
/// use aznaming::core::{ErrorSink, NamingError};
///
/// let mut sink = ErrorSink::new(true);
/// assert!(sink.report(NamingError::value("first")).is_ok());
/// assert!(sink.report(NamingError::value("second")).is_ok());
/// assert_eq!(sink.first_error(), Some("first"));
///
/// let mut strict = ErrorSink::new(false);
/// assert!(strict.report(NamingError::value("boom")).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ErrorSink {
    suppress: bool,
    first: Option<String>,
}

impl ErrorSink {
    /// Create a sink. With `suppress` set, [`report`](Self::report) never fails.
    pub const fn new(suppress: bool) -> Self {
        Self {
            suppress,
            first: None,
        }
    }

    /// Whether errors are being suppressed.
    pub const fn suppressing(&self) -> bool {
        self.suppress
    }

    /// Record `error`, then either swallow it or hand it back.
    ///
    /// # Errors
    ///
    /// Returns `error` unchanged when the sink does not suppress.
    pub fn report(&mut self, error: NamingError) -> Result<(), NamingError> {
        debug!(category = error.category(), %error, suppressed = self.suppress, "naming error");
        if self.first.is_none() {
            self.first = Some(error.to_string());
        }
        if self.suppress {
            Ok(())
        } else {
            Err(error)
        }
    }

    /// Message of the first recorded error.
    pub fn first_error(&self) -> Option<&str> {
        self.first.as_deref()
    }

    /// Consume the sink, yielding the first recorded message.
    pub fn into_first_error(self) -> Option<String> {
        self.first
    }
}

/// Error wrapper carrying a suggestion and details for the CLI.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: NamingError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with no suggestion or details.
    #[must_use]
    pub const fn new(error: NamingError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add an actionable suggestion, shown in green.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add explanatory details, shown in yellow.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error, details and suggestion to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

fn create_error_context(error: NamingError) -> ErrorContext {
    match &error {
        NamingError::CircularReference { .. } => ErrorContext::new(error)
            .with_suggestion("Break the cycle by pointing one of the '$ref' entries at a concrete node")
            .with_details("A '$ref' chain or a section manifest eventually refers back to itself"),
        NamingError::Configuration { .. } => ErrorContext::new(error)
            .with_suggestion("Check the naming configuration documents passed with --config"),
        NamingError::Value { .. } => ErrorContext::new(error)
            .with_suggestion("Check the values passed with --value and the template's placeholders"),
        NamingError::Format { .. } => ErrorContext::new(error)
            .with_suggestion("Shorten the inputs or allow truncation with --allow-truncation")
            .with_details("The generated name violates the template's length or pattern rules"),
        NamingError::RemoteCheck { .. } | NamingError::Http { .. } => ErrorContext::new(error)
            .with_suggestion("Verify AZURE_ACCESS_TOKEN and the subscription id, or drop --check-unique"),
        NamingError::Io { .. } | NamingError::Source { .. } => ErrorContext::new(error)
            .with_suggestion("Check that the configuration file or URL exists and is readable"),
        NamingError::Json { .. } => ErrorContext::new(error)
            .with_suggestion("Validate the configuration document with a JSON linter"),
        NamingError::Aggregate { errors } => {
            let count = errors.len();
            ErrorContext::new(error).with_details(format!("{count} name(s) failed to evaluate"))
        }
    }
}

/// Convert any error into a user-friendly [`ErrorContext`].
///
/// Naming errors keep their variant; anything else (argument parsing, TOML, I/O
/// surfaced through `anyhow`) is wrapped as a configuration error with the whole
/// context chain as its message.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(naming_error) = error.downcast_ref::<NamingError>() {
        return create_error_context(naming_error.clone());
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(NamingError::configuration(toml_error.to_string()))
            .with_suggestion("Check the TOML syntax in ~/.aznaming/config.toml");
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        if io_error.kind() == std::io::ErrorKind::NotFound {
            return ErrorContext::new(NamingError::Io {
                path: "unknown".to_string(),
                reason: io_error.to_string(),
            })
            .with_suggestion("Check that the file or directory exists and the path is correct");
        }
    }

    let message = error.chain().map(ToString::to_string).collect::<Vec<_>>().join(": ");
    ErrorContext::new(NamingError::configuration(message))
}
