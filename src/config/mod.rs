//! Settings for aznaming.
//!
//! Two layers feed an evaluation:
//!
//! 1. **Options** ([`NamingOptions`]) - per invocation, from CLI flags or an
//!    options JSON document
//! 2. **Global configuration** ([`GlobalConfig`], `~/.aznaming/config.toml`) -
//!    user-wide defaults and always-loaded configuration sources
//!
//! Options win over the global file; the global file wins over built-in
//! defaults. The naming configuration itself (components, templates) is JSON
//! and is loaded by [`crate::sections`].
//!
//! # Modules
//!
//! - `options` - per-invocation switches
//! - `global` - the optional TOML settings file
//! - `parser` - JSON inputs given inline or as a path

mod global;
mod options;
mod parser;

pub use global::GlobalConfig;
pub use options::NamingOptions;
pub use parser::{parse_json_input, parse_optional_json_input};
