//! Test utilities for aznaming
//!
//! Shared by the unit tests and, through the `test-utils` feature, by the
//! integration suite: logging setup, configuration fixtures and a scripted
//! REST transport.
//!
//! # Example
//!
//! ```rust,no_run
//! use aznaming::naming::NamingService;
//! use aznaming::sections::ConfigResolver;
//! use aznaming::test_utils::{init_test_logging, sample_config};
//!
//! init_test_logging(None);
//! let resolver = ConfigResolver::with_base_dir(std::env::temp_dir());
//! resolver.add_section(&sample_config().to_string(), None);
//! let service = NamingService::new(resolver);
//! ```

pub mod fixtures;
pub mod transport;

pub use fixtures::{sample_config, write_config};
pub use transport::{RecordedCall, RecordingTransport};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests, once per process.
///
/// Uses `level` when given, otherwise `RUST_LOG`; with neither, tests run
/// without a subscriber.
///
/// ```bash
/// RUST_LOG=aznaming=trace cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
