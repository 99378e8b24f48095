//! JSONPath subset used to address configuration nodes.
//!
//! Supported syntax:
//!
//! | Form | Meaning |
//! |------|---------|
//! | `$` | the root (only meaningful at the start) |
//! | `.name` / `name` | object member; exact spelling first, then ignoring case |
//! | `['name']`, `["name"]` | quoted member; a doubled quote is a literal quote |
//! | `*`, `[*]` | every member or item |
//! | `..` | the frontier and all of its descendants |
//! | `[i]` | array item, negative counts from the end |
//! | `[start:end:step]` | array slice with optional bounds |
//! | `[a, 'b', 0]` | union, applied left to right |
//!
//! Filters and script expressions are not supported.
//!
//! - `parse`: path text to [`JsonPath`]
//! - `select`: frontier evaluation producing [`Match`]es

pub mod parse;
pub mod select;

pub use parse::{JsonPath, PathParseError, Segment, Selector, Slice};
pub use select::Match;

pub(crate) use parse::{split_bracket, unquote};

use serde_json::Value;
use tracing::debug;

/// Evaluate `path` against `root`.
///
/// A path that does not parse selects nothing.
///
/// # Examples
///
/// ```rust
/// use aznaming::jsonpath::select;
/// use serde_json::json;
///
/// let doc = json!({"envs": ["dev", "test", "prod"]});
/// let picked: Vec<_> = select(&doc, "$.envs[-1]").into_iter().map(|m| m.node.clone()).collect();
/// assert_eq!(picked, vec![json!("prod")]);
/// ```
pub fn select<'a>(root: &'a Value, path: &str) -> Vec<Match<'a>> {
    match JsonPath::parse(path) {
        Ok(parsed) => parsed.evaluate(root),
        Err(error) => {
            debug!(%error, "unparsable path selects nothing");
            Vec::new()
        }
    }
}
