//! Global constants used throughout the aznaming codebase.
//!
//! Configuration paths, property names and numeric defaults that more than one
//! module needs live here so they are discoverable in one place.

use std::time::Duration;

/// Root of the template map in a configuration tree.
pub const TEMPLATES_PATH: &str = "$.templates";

/// Root of the component map in a configuration tree.
pub const COMPONENTS_PATH: &str = "$.components";

/// Root of the alias maps in a configuration tree.
pub const ALIASES_PATH: &str = "$.aliases";

/// Name of the template whose properties every other template inherits.
pub const DEFAULT_TEMPLATE_KEY: &str = "default";

/// Identity property of a configuration node.
pub const ID_PROPERTY: &str = "$id";

/// Reference property of a configuration node.
pub const REF_PROPERTY: &str = "$ref";

/// Property holding the list of sub-sources in a section manifest.
pub const SECTIONS_PROPERTY: &str = "sections";

/// Prefix of sources registered in-process with `ConfigResolver::register_embedded`.
pub const EMBEDDED_SCHEME: &str = "embedded:";

/// Default length of a unique component's hash.
pub const DEFAULT_UNIQUE_LENGTH: usize = 4;

/// Longest hash a unique component can produce (a simple-format GUID).
pub const MAX_UNIQUE_LENGTH: usize = 32;

/// Default padding character of an instance component.
pub const DEFAULT_PADDING_CHARACTER: char = '0';

/// Base URL of the Azure Resource Manager REST API.
pub const AZURE_MANAGEMENT_URL: &str = "https://management.azure.com";

/// Environment variable holding the bearer token for Azure REST calls.
pub const AZURE_ACCESS_TOKEN_ENV: &str = "AZURE_ACCESS_TOKEN";

/// Environment variable with a default configuration URI.
pub const CONFIG_URI_ENV: &str = "AZURE_NAMING_CONFIG_URI";

/// Environment variable overriding the global config file path.
pub const CONFIG_PATH_ENV: &str = "AZNAMING_CONFIG_PATH";

/// Timeout applied to configuration downloads and Azure REST calls.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
