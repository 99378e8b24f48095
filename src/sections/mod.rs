//! Layered naming configuration.
//!
//! A naming configuration is an ordered list of *sections*. Each section is a JSON
//! document, optionally mounted at a dotted path, and earlier sections shadow later
//! ones. Sections come from inline JSON, files, URLs or documents registered
//! in-process; a source whose document has a `sections` array is a *manifest* and
//! is replaced by the documents it lists, in order.
//!
//! Nodes may point elsewhere with `$ref`: either a path (`"$.shared.values"`) or an
//! identity declared with `$id` (`"#base"`, `"#base['values']"`). The referring
//! node's other members are laid over the target, so local settings win.
//! Reference chains that loop back on themselves fail with
//! [`NamingError::CircularReference`](crate::core::NamingError::CircularReference).
//!
//! # Modules
//!
//! - `loader` - locating and reading sources
//! - `section` - one lazily parsed, memoizing layer
//! - `resolver` - [`ConfigResolver`], the ordered lookup with reference resolution

pub mod loader;
pub mod resolver;
pub mod section;

pub use loader::{Location, SourceBase, SourceLoader, is_inline_json};
pub use resolver::ConfigResolver;
pub use section::{ResolvedNode, Section};
