//! aznaming - Azure resource naming from layered JSON configuration
//!
//! Names are built from *templates* such as `rg-{app}-{env}[-{instance}]` whose
//! placeholders are bound to *components*: dictionaries (`"dev"` -> `"d"`),
//! dictionaries keyed by another component, ranged and padded instance
//! numbers, free text and deterministic hashes. Templates, components and
//! aliases live in JSON documents that are layered, referenced and nested.
//!
//! # Architecture Overview
//!
//! - [`jsonpath`] - the path selector language used to address configuration
//! - [`node`] - paths, traversal and rewriting of JSON nodes
//! - [`sections`] - layered configuration: sources, manifests, `$ref`/`$id`
//! - [`components`] - typed components and their value resolution
//! - [`naming`] - templates, value binding, name synthesis, JSON documents
//! - [`rest`] - transport for the Azure name-availability check
//! - [`invoke`] - string-in, string-out calls over fresh services
//! - [`config`] - per-invocation options and `~/.aznaming/config.toml`
//! - [`cli`] - the `aznaming` command
//! - [`core`] - error types and their CLI rendering
//! - [`utils`] - downloads and source path expansion
//!
//! # Configuration Format
//!
//! ```json
//! {
//!   "components": {
//!     "env": {"type": "dictionary", "source": {"dev": "d", "prod": "p"}},
//!     "app": {"type": "freeText", "casing": "lower"},
//!     "instance": {"type": "instance", "maxValue": 99, "padding": {"totalLength": 2}}
//!   },
//!   "templates": {
//!     "rg": {"template": "rg-{app}-{env}", "lengthMax": 90},
//!     "vm": {"template": "vm{app}{env}[{instance}]", "lengthMax": 15, "casing": "upper"}
//!   }
//! }
//! ```
//!
//! Later sources shadow earlier ones; `{"sections": [...]}` documents expand to
//! the sources they list; `{"$ref": "$.templates.rg"}` and `{"$ref": "#id"}`
//! reuse nodes across sources.
//!
//! # Example
//!
//! ```rust,no_run
//! use aznaming::naming::NamingService;
//! use aznaming::sections::ConfigResolver;
//! use serde_json::json;
//!
//! # fn example() -> Result<(), aznaming::core::NamingError> {
//! let resolver = ConfigResolver::with_base_dir(std::env::current_dir().unwrap_or_default());
//! resolver.add_section("./naming.json", None);
//! let service = NamingService::new(resolver);
//!
//! let values = json!({"app": "web", "env": "dev"});
//! let (name, _) = service.get_name("rg", values.as_object().unwrap_or(&Default::default()))?;
//! println!("{name}");
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod components;
pub mod config;
pub mod constants;
pub mod core;
pub mod invoke;
pub mod jsonpath;
pub mod naming;
pub mod node;
pub mod rest;
pub mod sections;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
