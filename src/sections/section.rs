//! A single configuration layer.

use crate::constants::ID_PROPERTY;
use crate::core::NamingError;
use crate::node::{NodePath, nest};
use dashmap::DashMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::warn;
use uuid::Uuid;

use super::loader::parse_json;

/// A resolved node together with the member name it was found under.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedNode {
    pub node: Arc<Value>,
    pub property_name: Option<String>,
}

#[derive(Debug)]
pub(crate) enum SectionSource {
    /// JSON text supplied directly by the caller.
    Inline(String),
    /// A document produced by expanding a source location.
    Document(Value),
    /// A location not fetched yet; expanded into leaf sections on first query.
    Origin,
}

/// One layer of configuration.
///
/// The tree is parsed lazily and nested under the section's dotted `path`, so
/// a document mounted at `$.templates` can be written as a bare template map.
/// Resolved nodes are memoized per section.
#[derive(Debug)]
pub struct Section {
    id: String,
    uri: String,
    path: Option<String>,
    source: SectionSource,
    root: OnceLock<Result<Option<Arc<Value>>, NamingError>>,
    id_paths: OnceLock<HashMap<String, String>>,
    cache: DashMap<String, ResolvedNode>,
}

impl Section {
    fn new(uri: String, path: Option<String>, source: SectionSource) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            uri,
            path: path.filter(|p| !p.trim().is_empty()),
            source,
            root: OnceLock::new(),
            id_paths: OnceLock::new(),
            cache: DashMap::new(),
        }
    }

    pub(crate) fn inline(json: String, path: Option<String>) -> Self {
        Self::new(String::new(), path, SectionSource::Inline(json))
    }

    pub(crate) fn document(uri: String, document: Value, path: Option<String>) -> Self {
        Self::new(uri, path, SectionSource::Document(document))
    }

    pub(crate) fn origin(uri: String, path: Option<String>) -> Self {
        Self::new(uri, path, SectionSource::Origin)
    }

    /// Random identifier of this section.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Where the section came from; empty for inline JSON.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Dotted mount point of the section's content.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// The section's tree, parsed and nested on first access.
    ///
    /// Origin sections have no tree of their own and yield `None` (or the error
    /// recorded while expanding them).
    ///
    /// # Errors
    ///
    /// Returns the memoized parse or expansion failure.
    pub fn root(&self) -> Result<Option<Arc<Value>>, NamingError> {
        if matches!(self.source, SectionSource::Origin) {
            return self.root.get().cloned().unwrap_or(Ok(None));
        }
        self.root
            .get_or_init(|| -> Result<Option<Arc<Value>>, NamingError> {
                let document = match &self.source {
                    SectionSource::Inline(json) => parse_json(json, "inline configuration")?,
                    SectionSource::Document(document) => document.clone(),
                    SectionSource::Origin => return Ok(None),
                };
                Ok(Some(Arc::new(nest(document, &nesting_segments(self.path())))))
            })
            .clone()
    }

    pub(crate) fn is_pending_origin(&self) -> bool {
        matches!(self.source, SectionSource::Origin) && self.root.get().is_none()
    }

    pub(crate) fn mark_expanded(&self, outcome: Result<(), NamingError>) {
        let _ = self.root.set(outcome.map(|()| None));
    }

    /// Lowercased `$id` → path of the node carrying it. The first occurrence wins.
    pub fn id_paths(&self) -> &HashMap<String, String> {
        self.id_paths.get_or_init(|| {
            let mut index = HashMap::new();
            if let Ok(Some(root)) = self.root() {
                collect_ids(&root, &mut NodePath::root(), &mut index);
            }
            index
        })
    }

    /// Whether a query for `query_path` could be answered by this section.
    ///
    /// A mounted section only answers queries at or under its mount point,
    /// compared segment by segment.
    pub fn covers(&self, query_path: &str) -> bool {
        let Some(path) = self.path() else {
            return true;
        };
        let strip = |p: &str| -> String {
            let p = p.trim();
            let p = p.strip_prefix('$').unwrap_or(p);
            p.strip_prefix('.').unwrap_or(p).to_lowercase()
        };
        let mount = strip(path);
        if mount.is_empty() {
            return true;
        }
        strip(query_path)
            .strip_prefix(mount.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(['.', '[']))
    }

    pub(crate) fn cached(&self, key: &str) -> Option<ResolvedNode> {
        self.cache.get(key).map(|entry| entry.value().clone())
    }

    pub(crate) fn remember(&self, key: String, node: ResolvedNode) {
        self.cache.insert(key, node);
    }
}

/// Dotted segments of a mount path, without a leading `$`.
pub(crate) fn nesting_segments(path: Option<&str>) -> Vec<&str> {
    let Some(path) = path else {
        return Vec::new();
    };
    let mut segments: Vec<&str> = path.split('.').map(str::trim).filter(|s| !s.is_empty()).collect();
    if segments.first() == Some(&"$") {
        segments.remove(0);
    }
    segments
}

fn collect_ids(node: &Value, path: &mut NodePath, index: &mut HashMap<String, String>) {
    match node {
        Value::Object(map) => {
            if let Some(id) = map.get(ID_PROPERTY).and_then(Value::as_str).filter(|id| !id.is_empty()) {
                let key = id.to_lowercase();
                if let Some(existing) = index.get(&key) {
                    warn!("Duplicate $id '{}' at {} (already defined at {})", id, path, existing);
                } else {
                    index.insert(key, path.to_string());
                }
            }
            for (name, child) in map {
                if name == ID_PROPERTY {
                    continue;
                }
                path.push_key(name);
                collect_ids(child, path, index);
                path.pop();
            }
        }
        Value::Array(items) => {
            for (position, item) in items.iter().enumerate() {
                path.push_index(position);
                collect_ids(item, path, index);
                path.pop();
            }
        }
        _ => {}
    }
}
