//! Layered lookup with `$ref`/`$id` resolution.

use super::loader::{SourceBase, SourceLoader, is_inline_json};
use super::section::{ResolvedNode, Section};
use crate::constants::{ID_PROPERTY, REF_PROPERTY, SECTIONS_PROPERTY};
use crate::core::NamingError;
use crate::jsonpath::{select, split_bracket, unquote};
use crate::node::{NodePath, NodeVisitor, Visit, walk_mut};
use crate::utils::{Downloader, HttpDownloader};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, trace};

/// Ordered set of configuration sections answering path queries.
///
/// Sections are consulted in insertion order; the first one holding exactly one
/// node at the queried path answers. Origin sections (files and URLs) are
/// expanded into their leaf documents the first time anything is queried.
///
/// # Examples
///
/// ```rust
/// use aznaming::sections::ConfigResolver;
///
/// let resolver = ConfigResolver::with_base_dir(std::env::temp_dir());
/// resolver.add_section(r##"{"templates": {"rg": {"$ref": "#base"}}, "base": {"$id": "base", "template": "rg-{name}"}}"##, None);
///
/// let found = resolver.try_get_node("$.templates.rg").unwrap().unwrap();
/// assert_eq!(found.node["template"], "rg-{name}");
/// assert_eq!(found.property_name.as_deref(), Some("rg"));
/// ```
pub struct ConfigResolver {
    sections: RwLock<Vec<Arc<Section>>>,
    loader: SourceLoader,
}

impl ConfigResolver {
    /// Create a resolver with a custom downloader for remote sources.
    pub fn new(base_dir: PathBuf, downloader: Arc<dyn Downloader>) -> Self {
        Self {
            sections: RwLock::new(Vec::new()),
            loader: SourceLoader::new(base_dir, downloader),
        }
    }

    /// Create a resolver that downloads over HTTP and resolves relative paths
    /// against `base_dir`.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self::new(base_dir, Arc::new(HttpDownloader::new()))
    }

    /// Register `json` so it can be added as `embedded:<name>`.
    pub fn register_embedded(&self, name: &str, json: impl Into<String>) {
        self.loader.register_embedded(name, json);
    }

    /// Append a section. `source` is inline JSON, a path, a URL or `embedded:<name>`.
    ///
    /// Returns `false` when a section with the same URI is already present.
    pub fn add_section(&self, source: &str, path: Option<&str>) -> bool {
        let mut sections = self.sections.write().unwrap_or_else(PoisonError::into_inner);
        let index = sections.len();
        insert_unique(&mut sections, index, make_section(source, path), None)
    }

    /// Insert a section at `index` (clamped to the end). Same de-duplication as
    /// [`add_section`](Self::add_section).
    pub fn insert_section(&self, index: usize, source: &str, path: Option<&str>) -> bool {
        let mut sections = self.sections.write().unwrap_or_else(PoisonError::into_inner);
        let index = index.min(sections.len());
        insert_unique(&mut sections, index, make_section(source, path), None)
    }

    /// Remove every section.
    pub fn clear_sections(&self) {
        self.sections.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Current sections in priority order.
    pub fn sections(&self) -> Vec<Arc<Section>> {
        self.sections.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Find the node at `path`, with every `$ref` inside it resolved.
    ///
    /// # Errors
    ///
    /// Source loading failures, circular references and references that point
    /// nowhere.
    pub fn try_get_node(&self, path: &str) -> Result<Option<ResolvedNode>, NamingError> {
        self.expand_pending()?;
        let sections = self.sections();
        let mut stack = Vec::new();
        self.lookup(&sections, path, None, &mut stack)
    }

    /// Find the node at `path` and deserialize it.
    ///
    /// # Errors
    ///
    /// As [`try_get_node`](Self::try_get_node), plus a configuration error when
    /// the node does not have the expected shape.
    pub fn try_get_value<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, NamingError> {
        let Some(found) = self.try_get_node(path)? else {
            return Ok(None);
        };
        T::deserialize(found.node.as_ref())
            .map(Some)
            .map_err(|e| NamingError::configuration(format!("Invalid value at '{path}': {e}")))
    }

    /// Expand origin sections that have not been fetched yet into leaf sections.
    fn expand_pending(&self) -> Result<(), NamingError> {
        if !self.sections().iter().any(|s| s.is_pending_origin()) {
            return Ok(());
        }

        let mut sections = self.sections.write().unwrap_or_else(PoisonError::into_inner);
        let mut first_error = None;
        let mut index = 0;
        while index < sections.len() {
            let section = Arc::clone(&sections[index]);
            index += 1;
            if !section.is_pending_origin() {
                continue;
            }

            let mut chain = Vec::new();
            let mut leaves = Vec::new();
            match self.expand_origin(section.uri(), section.path(), None, &mut chain, &mut leaves) {
                Ok(()) => {
                    section.mark_expanded(Ok(()));
                    for leaf in leaves {
                        if insert_unique(&mut sections, index, leaf, Some(&section)) {
                            index += 1;
                        }
                    }
                }
                Err(e) => {
                    debug!(uri = section.uri(), error = %e, "section expansion failed");
                    section.mark_expanded(Err(e.clone()));
                    first_error.get_or_insert(e);
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    fn expand_origin(
        &self,
        uri: &str,
        path: Option<&str>,
        base: Option<&SourceBase>,
        chain: &mut Vec<String>,
        leaves: &mut Vec<Section>,
    ) -> Result<(), NamingError> {
        let location = self.loader.locate(uri, base)?.to_string();
        if chain.iter().any(|seen| seen.eq_ignore_ascii_case(&location)) {
            return Err(NamingError::circular(chain.as_slice(), &location));
        }

        let loaded = self.loader.load(uri, base)?;
        let Some(entries) = loaded.document.get(SECTIONS_PROPERTY).and_then(Value::as_array) else {
            debug!(origin = %loaded.origin, "loaded configuration section");
            leaves.push(Section::document(loaded.origin, loaded.document, path.map(str::to_string)));
            return Ok(());
        };

        chain.push(location);
        for entry in entries {
            let sub_uri = entry.get("uri").and_then(Value::as_str).ok_or_else(|| {
                NamingError::configuration(format!("Section entry in '{}' is missing 'uri'", loaded.origin))
            })?;
            let sub_path = entry.get("path").and_then(Value::as_str);
            self.expand_origin(sub_uri, sub_path, Some(&loaded.base), chain, leaves)?;
        }
        chain.pop();
        Ok(())
    }

    fn lookup(
        &self,
        sections: &[Arc<Section>],
        path: &str,
        scope: Option<&str>,
        stack: &mut Vec<String>,
    ) -> Result<Option<ResolvedNode>, NamingError> {
        let cache_key = path.to_lowercase();

        for section in sections {
            if scope.is_some_and(|id| id != section.id()) || !section.covers(path) {
                continue;
            }
            if let Some(hit) = section.cached(&cache_key) {
                trace!(path, "resolved node from cache");
                return Ok(Some(hit));
            }

            let Some(root) = section.root()? else {
                continue;
            };
            let (node, node_path) = {
                let matches = select(&root, path);
                if matches.len() != 1 {
                    continue;
                }
                (matches[0].node.clone(), matches[0].path.clone())
            };

            let raw_id = node
                .get(ID_PROPERTY)
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty())
                .map(str::to_lowercase);
            let resolved = self.resolve_match(sections, section, node, &node_path, raw_id.as_deref(), stack)?;
            let found = ResolvedNode {
                node: Arc::new(resolved),
                property_name: node_path.property_name().map(str::to_string),
            };

            section.remember(cache_key, found.clone());
            section.remember(node_path.to_string().to_lowercase(), found.clone());
            if let Some(id) = raw_id {
                section.remember(format!("#{id}"), found.clone());
            }
            return Ok(Some(found));
        }

        Ok(None)
    }

    fn resolve_match(
        &self,
        sections: &[Arc<Section>],
        section: &Section,
        mut node: Value,
        node_path: &NodePath,
        id: Option<&str>,
        stack: &mut Vec<String>,
    ) -> Result<Value, NamingError> {
        let identity = id.map_or_else(|| node_path.to_string(), |id| format!("#{id}"));
        if stack.contains(&identity) {
            return Err(NamingError::circular(stack.as_slice(), &identity));
        }
        stack.push(identity);

        let result = match node.as_object().and_then(reference_of) {
            Some(reference) => {
                let reference = reference.to_string();
                let map = node.as_object().cloned().unwrap_or_default();
                self.resolve_reference(sections, &map, &reference, Some((section, node_path)), stack)
            }
            None => self
                .resolve_nested(sections, &mut node, Some((section, node_path)), stack)
                .map(|()| node),
        };

        stack.pop();
        result
    }

    /// Resolve a node carrying `$ref`: fetch the target and lay the node's other
    /// members over it. `at` locates the node for memoizing nested resolutions.
    fn resolve_reference(
        &self,
        sections: &[Arc<Section>],
        node: &Map<String, Value>,
        reference: &str,
        at: Option<(&Section, &NodePath)>,
        stack: &mut Vec<String>,
    ) -> Result<Value, NamingError> {
        let mut target = self.dereference(sections, reference, stack)?;

        if let Value::Object(target_map) = &mut target {
            if reference.starts_with('#') {
                target_map.remove(ID_PROPERTY);
            }
            for (key, value) in node {
                if key == REF_PROPERTY || key == ID_PROPERTY {
                    continue;
                }
                let mut value = value.clone();
                let member_path = at.map(|(_, path)| path.child_key(key));
                let member_at = at.zip(member_path.as_ref()).map(|((section, _), path)| (section, path));
                self.resolve_nested(sections, &mut value, member_at, stack)?;
                target_map.insert(key.clone(), value);
            }
        }

        Ok(target)
    }

    fn dereference(
        &self,
        sections: &[Arc<Section>],
        reference: &str,
        stack: &mut Vec<String>,
    ) -> Result<Value, NamingError> {
        let unresolved = || NamingError::configuration(format!("Cannot resolve reference '{reference}'"));

        let Some(id_ref) = IdReference::parse(reference) else {
            return self
                .lookup(sections, reference, None, stack)?
                .map(|found| found.node.as_ref().clone())
                .ok_or_else(unresolved);
        };

        let id_key = id_ref.id.to_lowercase();
        let (owner, id_path) = sections
            .iter()
            .find_map(|section| section.id_paths().get(&id_key).map(|p| (Arc::clone(section), p.clone())))
            .ok_or_else(unresolved)?;

        if id_ref.remaining.is_empty() {
            if let Some(hit) = owner.cached(&format!("#{id_key}")) {
                return Ok(hit.node.as_ref().clone());
            }
        }

        let target_path = format!("{id_path}{}", id_ref.remaining);
        self.lookup(sections, &target_path, Some(owner.id()), stack)?
            .map(|found| found.node.as_ref().clone())
            .ok_or_else(unresolved)
    }

    fn resolve_nested(
        &self,
        sections: &[Arc<Section>],
        node: &mut Value,
        at: Option<(&Section, &NodePath)>,
        stack: &mut Vec<String>,
    ) -> Result<(), NamingError> {
        let mut visitor = ReferenceVisitor {
            resolver: self,
            sections,
            at,
            stack,
        };
        walk_mut(node, &mut visitor)
    }
}

struct ReferenceVisitor<'r> {
    resolver: &'r ConfigResolver,
    sections: &'r [Arc<Section>],
    at: Option<(&'r Section, &'r NodePath)>,
    stack: &'r mut Vec<String>,
}

impl NodeVisitor for ReferenceVisitor<'_> {
    type Error = NamingError;

    fn enter(&mut self, path: &NodePath, node: &mut Value) -> Result<Visit, NamingError> {
        let Some(map) = node.as_object() else {
            return Ok(Visit::Descend);
        };
        let Some(reference) = reference_of(map) else {
            return Ok(Visit::Descend);
        };
        let reference = reference.to_string();
        let absolute = self.at.map(|(_, base)| base.join(path));
        let at = self.at.zip(absolute.as_ref()).map(|((section, _), path)| (section, path));
        let resolved = self
            .resolver
            .resolve_reference(self.sections, map, &reference, at, self.stack)?;

        if let Some((section, path)) = at {
            let found = ResolvedNode {
                node: Arc::new(resolved.clone()),
                property_name: path.property_name().map(str::to_string),
            };
            if let Some(id) = map.get(ID_PROPERTY).and_then(Value::as_str).filter(|id| !id.is_empty()) {
                section.remember(format!("#{}", id.to_lowercase()), found.clone());
            }
            section.remember(path.to_string().to_lowercase(), found);
        }
        Ok(Visit::Replace(resolved))
    }
}

fn reference_of(map: &Map<String, Value>) -> Option<&str> {
    map.get(REF_PROPERTY).and_then(Value::as_str).filter(|r| !r.trim().is_empty())
}

/// `#id`, `#id[...]`, `#['id']...` or `#.id...` split into the id and the path
/// that follows it.
#[derive(Debug, PartialEq, Eq)]
struct IdReference {
    id: String,
    remaining: String,
}

impl IdReference {
    fn parse(reference: &str) -> Option<Self> {
        let rest = reference.trim().strip_prefix('#')?;
        let rest = rest.strip_prefix('.').unwrap_or(rest);

        let (id, remaining) = if rest.starts_with('[') {
            let (content, after) = split_bracket(rest).ok()?;
            let content = content.trim();
            (unquote(content).unwrap_or_else(|| content.to_string()), after)
        } else {
            let end = rest.find('[').unwrap_or(rest.len());
            (rest[..end].to_string(), &rest[end..])
        };

        (!id.is_empty()).then(|| Self {
            id,
            remaining: remaining.to_string(),
        })
    }
}

fn make_section(source: &str, path: Option<&str>) -> Section {
    let path = path.map(str::to_string);
    if is_inline_json(source) {
        Section::inline(source.to_string(), path)
    } else {
        Section::origin(source.trim().to_string(), path)
    }
}

/// Insert unless a section with the same non-empty URI exists. `origin` is the
/// section being expanded; its own leaves may share its URI.
fn insert_unique(
    sections: &mut Vec<Arc<Section>>,
    index: usize,
    section: Section,
    origin: Option<&Arc<Section>>,
) -> bool {
    let duplicate = !section.uri().is_empty()
        && sections
            .iter()
            .filter(|s| origin.is_none_or(|origin| !Arc::ptr_eq(s, origin)))
            .any(|s| s.uri().eq_ignore_ascii_case(section.uri()));
    if duplicate {
        debug!(uri = section.uri(), "section already present");
        return false;
    }
    sections.insert(index, Arc::new(section));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use tempfile::TempDir;

    /// Serves canned documents by URL from a temp directory.
    struct StaticDownloader {
        dir: TempDir,
        documents: HashMap<String, String>,
    }

    impl Downloader for StaticDownloader {
        fn download(&self, url: &str) -> Result<PathBuf, NamingError> {
            let text = self.documents.get(url).ok_or_else(|| NamingError::Http {
                url: url.to_string(),
                reason: "404 Not Found".to_string(),
            })?;
            let local = self.dir.path().join(format!("{}.json", uuid::Uuid::new_v4().simple()));
            std::fs::write(&local, text).map_err(|e| NamingError::Io {
                path: local.display().to_string(),
                reason: e.to_string(),
            })?;
            Ok(local)
        }
    }

    fn resolver() -> ConfigResolver {
        ConfigResolver::with_base_dir(std::env::temp_dir())
    }

    fn node(resolver: &ConfigResolver, path: &str) -> Value {
        resolver.try_get_node(path).unwrap().unwrap().node.as_ref().clone()
    }

    #[test]
    fn test_id_reference_forms() {
        let parse = |r: &str| IdReference::parse(r).map(|i| (i.id, i.remaining));
        assert_eq!(parse("#base"), Some(("base".into(), String::new())));
        assert_eq!(parse("#base['x']"), Some(("base".into(), "['x']".into())));
        assert_eq!(parse("#['my id'].x"), Some(("my id".into(), ".x".into())));
        assert_eq!(parse("#.base"), Some(("base".into(), String::new())));
        assert_eq!(parse("$.a"), None);
        assert_eq!(parse("#"), None);
    }

    #[test]
    fn test_first_section_wins() {
        let resolver = resolver();
        resolver.add_section(r#"{"a": 1}"#, None);
        resolver.add_section(r#"{"a": 2, "b": 3}"#, None);
        assert_eq!(node(&resolver, "$.a"), json!(1));
        assert_eq!(node(&resolver, "$.b"), json!(3));
        assert!(resolver.try_get_node("$.c").unwrap().is_none());
    }

    #[test]
    fn test_insert_section_takes_priority() {
        let resolver = resolver();
        resolver.add_section(r#"{"a": 1}"#, None);
        resolver.insert_section(0, r#"{"a": 2}"#, None);
        assert_eq!(node(&resolver, "$.a"), json!(2));
    }

    #[test]
    fn test_path_reference_with_override() {
        let resolver = resolver();
        resolver.add_section(
            r#"{"base": {"x": 1, "y": 2}, "derived": {"$ref": "$.base", "y": 3}}"#,
            None,
        );
        assert_eq!(node(&resolver, "$.derived"), json!({"x": 1, "y": 3}));
    }

    #[test]
    fn test_id_reference_with_remaining_path() {
        let resolver = resolver();
        resolver.add_section(
            r##"{"shared": {"$id": "S", "values": {"env": "dev"}}, "t": {"v": {"$ref": "#s['values']"}}}"##,
            None,
        );
        assert_eq!(node(&resolver, "$.t"), json!({"v": {"env": "dev"}}));
    }

    #[test]
    fn test_id_reference_drops_id_from_copy() {
        let resolver = resolver();
        resolver.add_section(r##"{"a": {"$id": "a", "k": 1}, "b": {"$ref": "#a"}}"##, None);
        assert_eq!(node(&resolver, "$.b"), json!({"k": 1}));
    }

    #[test]
    fn test_reference_across_sections() {
        let resolver = resolver();
        resolver.add_section(r##"{"b": {"$ref": "#shared"}}"##, None);
        resolver.add_section(r#"{"lib": {"$id": "shared", "k": 1}}"#, None);
        assert_eq!(node(&resolver, "$.b"), json!({"k": 1}));
    }

    #[test]
    fn test_circular_reference_names_chain() {
        let resolver = resolver();
        resolver.add_section(r#"{"a": {"$ref": "$.b"}, "b": {"$ref": "$.a"}}"#, None);
        let err = resolver.try_get_node("$.a").unwrap_err();
        assert_eq!(err, NamingError::CircularReference { chain: "$.a -> $.b -> $.a".into() });
    }

    #[test]
    fn test_nested_self_reference_is_circular() {
        let resolver = resolver();
        resolver.add_section(r#"{"a": {"inner": {"$ref": "$.a"}}}"#, None);
        assert!(matches!(
            resolver.try_get_node("$.a"),
            Err(NamingError::CircularReference { .. })
        ));
    }

    #[test]
    fn test_unresolvable_reference() {
        let resolver = resolver();
        resolver.add_section(r##"{"a": {"$ref": "#missing"}}"##, None);
        let err = resolver.try_get_node("$.a").unwrap_err();
        assert_eq!(err.to_string(), "Cannot resolve reference '#missing'");
    }

    #[test]
    fn test_mounted_section() {
        let resolver = resolver();
        resolver.add_section(r#"{"env": {"type": "freeText"}}"#, Some("$.components"));
        assert_eq!(node(&resolver, "$.components.env"), json!({"type": "freeText"}));
        assert!(resolver.try_get_node("$.templates.env").unwrap().is_none());
    }

    #[test]
    fn test_ambiguous_match_is_skipped() {
        let resolver = resolver();
        resolver.add_section(r#"{"a": {"x": 1, "y": 2}}"#, None);
        resolver.add_section(r#"{"a": {"x": 3}}"#, None);
        assert_eq!(
            resolver.try_get_node("$.a.*").unwrap().unwrap().node.as_ref(),
            &json!(3)
        );
    }

    #[test]
    fn test_duplicate_uri_is_ignored() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.json");
        std::fs::write(&file, r#"{"a": 1}"#).unwrap();
        let resolver = ConfigResolver::with_base_dir(temp.path().to_path_buf());
        let source = file.to_str().unwrap();
        assert!(resolver.add_section(source, None));
        assert!(!resolver.add_section(source, None));
        assert!(!resolver.add_section(&source.to_uppercase(), None));
        assert_eq!(resolver.sections().len(), 1);
    }

    #[test]
    fn test_manifest_expands_in_order() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("parts")).unwrap();
        std::fs::write(temp.path().join("parts/one.json"), r#"{"a": 1}"#).unwrap();
        std::fs::write(temp.path().join("parts/two.json"), r#"{"a": 2, "env": {"type": "freeText"}}"#).unwrap();
        std::fs::write(
            temp.path().join("manifest.json"),
            r#"{"sections": [{"uri": "parts/one.json"}, {"uri": "parts/two.json", "path": "$.components"}]}"#,
        )
        .unwrap();

        let resolver = ConfigResolver::with_base_dir(temp.path().to_path_buf());
        resolver.add_section("manifest.json", None);
        assert_eq!(node(&resolver, "$.a"), json!(1));
        assert_eq!(node(&resolver, "$.components.env"), json!({"type": "freeText"}));
        assert_eq!(resolver.sections().len(), 3);
    }

    #[test]
    fn test_circular_manifest() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.json"), r#"{"sections": [{"uri": "b.json"}]}"#).unwrap();
        std::fs::write(temp.path().join("b.json"), r#"{"sections": [{"uri": "a.json"}]}"#).unwrap();

        let resolver = ConfigResolver::with_base_dir(temp.path().to_path_buf());
        resolver.add_section("a.json", None);
        assert!(matches!(resolver.try_get_node("$.x"), Err(NamingError::CircularReference { .. })));
        // the failure is remembered on the section
        assert!(resolver.try_get_node("$.x").is_err());
    }

    #[test]
    fn test_embedded_source() {
        let resolver = resolver();
        resolver.register_embedded("defaults", r#"{"templates": {"rg": {"template": "rg-{name}"}}}"#);
        resolver.add_section("embedded:defaults", None);
        assert_eq!(node(&resolver, "$.templates.rg.template"), json!("rg-{name}"));
    }

    #[test]
    fn test_try_get_value() {
        let resolver = resolver();
        resolver.add_section(r#"{"n": 5}"#, None);
        assert_eq!(resolver.try_get_value::<u32>("$.n").unwrap(), Some(5));
        assert!(resolver.try_get_value::<String>("$.n").is_err());
    }

    #[test]
    fn test_clear_sections() {
        let resolver = resolver();
        resolver.add_section(r#"{"a": 1}"#, None);
        resolver.clear_sections();
        assert!(resolver.try_get_node("$.a").unwrap().is_none());
    }

    #[test]
    fn test_absolute_file_section() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.json");
        std::fs::write(&file, r#"{"a": 1}"#).unwrap();

        let resolver = ConfigResolver::with_base_dir(std::env::temp_dir());
        resolver.add_section(file.to_str().unwrap(), None);
        assert_eq!(node(&resolver, "$.a"), json!(1));
        assert_eq!(resolver.sections().len(), 2);
    }

    #[test]
    fn test_url_sections_and_relative_manifest_entries() {
        let documents = HashMap::from([
            ("https://example.com/naming/base.json".to_string(), r#"{"a": 1}"#.to_string()),
            (
                "https://example.com/naming/manifest.json".to_string(),
                r#"{"sections": [{"uri": "parts/env.json", "path": "$.components"}]}"#.to_string(),
            ),
            ("https://example.com/naming/parts/env.json".to_string(), r#"{"env": {"type": "freeText"}}"#.to_string()),
        ]);
        let downloader = StaticDownloader {
            dir: TempDir::new().unwrap(),
            documents,
        };
        let resolver = ConfigResolver::new(std::env::temp_dir(), Arc::new(downloader));
        resolver.add_section("https://example.com/naming/base.json", None);
        resolver.add_section("https://example.com/naming/manifest.json", None);

        assert_eq!(node(&resolver, "$.a"), json!(1));
        assert_eq!(node(&resolver, "$.components.env"), json!({"type": "freeText"}));
    }

    #[test]
    fn test_three_step_cycle_names_chain() {
        let resolver = resolver();
        resolver.add_section(r#"{"a": {"$ref": "$.b"}, "b": {"$ref": "$.c"}, "c": {"$ref": "$.a"}}"#, None);
        let err = resolver.try_get_node("$.a").unwrap_err();
        assert_eq!(err, NamingError::CircularReference { chain: "$.a -> $.b -> $.c -> $.a".into() });
    }

    #[test]
    fn test_direct_self_reference() {
        let resolver = resolver();
        resolver.add_section(r#"{"a": {"$ref": "$.a"}}"#, None);
        let err = resolver.try_get_node("$.a").unwrap_err();
        assert_eq!(err, NamingError::CircularReference { chain: "$.a -> $.a".into() });
    }

    #[test]
    fn test_reference_free_content_is_unchanged() {
        let doc = json!({
            "templates": {"rg": {"template": "rg-{app}", "values": {"env": "dev"}, "lengthMax": 90}},
            "list": [1, "two", {"three": [true, null]}],
            "ref": "not a reference object"
        });
        let resolver = resolver();
        resolver.add_section(&doc.to_string(), None);
        assert_eq!(node(&resolver, "$"), doc);
        assert_eq!(node(&resolver, "$.templates.rg"), doc["templates"]["rg"]);
    }

    #[test]
    fn test_nested_references_are_memoized() {
        let resolver = resolver();
        resolver.add_section(
            r##"{"base": {"$id": "base", "k": 1}, "t": {"v": {"$ref": "#base", "$id": "v", "x": 2}}}"##,
            None,
        );
        assert_eq!(node(&resolver, "$.t"), json!({"v": {"k": 1, "x": 2}}));

        let section = &resolver.sections()[0];
        let nested = section.cached("$.t.v").unwrap();
        assert_eq!(*nested.node, json!({"k": 1, "x": 2}));
        assert_eq!(nested.property_name.as_deref(), Some("v"));
        assert!(section.cached("#v").is_some());
    }
}
