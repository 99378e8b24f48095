//! Alias maps for component and template names.
//!
//! `$.aliases.components` and `$.aliases.templates` map alternate names to
//! canonical ones. Lookups are case-insensitive and cached, misses included.

use crate::constants::ALIASES_PATH;
use crate::core::NamingError;
use crate::node::quote_member;
use crate::sections::ConfigResolver;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Which alias namespace to consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AliasKind {
    Component,
    Template,
}

impl AliasKind {
    fn root(self) -> String {
        match self {
            Self::Component => format!("{ALIASES_PATH}.components"),
            Self::Template => format!("{ALIASES_PATH}.templates"),
        }
    }
}

/// Cached alias lookups plus lazily built reverse indexes.
#[derive(Debug, Default)]
pub struct AliasIndex {
    resolved: DashMap<(AliasKind, String), Option<String>>,
    references: DashMap<AliasKind, Arc<HashMap<String, Vec<String>>>>,
}

impl AliasIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical name for `name`, lowercased, or `name` itself when it is not an alias.
    ///
    /// # Errors
    ///
    /// Resolver failures while reading the alias map.
    pub fn resolve(&self, resolver: &ConfigResolver, kind: AliasKind, name: &str) -> Result<String, NamingError> {
        let key = (kind, name.to_lowercase());
        if let Some(cached) = self.resolved.get(&key) {
            return Ok(cached.value().clone().unwrap_or_else(|| name.to_string()));
        }

        let path = format!("{}{}", kind.root(), quote_member(&key.1));
        let canonical = resolver
            .try_get_node(&path)?
            .and_then(|found| found.node.as_str().map(str::to_lowercase));
        if let Some(canonical) = &canonical {
            trace!(alias = name, canonical = %canonical, "resolved alias");
        }

        let resolved = canonical.clone().unwrap_or_else(|| name.to_string());
        self.resolved.insert(key, canonical);
        Ok(resolved)
    }

    /// Every alias (lowercased) whose canonical name is `canonical`.
    ///
    /// # Errors
    ///
    /// Resolver failures while reading the alias map.
    pub fn aliases_of(&self, resolver: &ConfigResolver, kind: AliasKind, canonical: &str) -> Result<Vec<String>, NamingError> {
        let existing = self.references.get(&kind).map(|entry| Arc::clone(entry.value()));
        let index = match existing {
            Some(index) => index,
            None => {
                let index = Arc::new(build_references(resolver, kind)?);
                self.references.insert(kind, Arc::clone(&index));
                index
            }
        };
        Ok(index.get(&canonical.to_lowercase()).cloned().unwrap_or_default())
    }

    /// Forget all cached lookups and reverse indexes.
    pub fn clear(&self) {
        self.resolved.clear();
        self.references.clear();
    }
}

fn build_references(resolver: &ConfigResolver, kind: AliasKind) -> Result<HashMap<String, Vec<String>>, NamingError> {
    let mut index: HashMap<String, Vec<String>> = HashMap::new();
    let Some(found) = resolver.try_get_node(&kind.root())? else {
        return Ok(index);
    };

    if let Some(map) = found.node.as_object() {
        for (alias, canonical) in map {
            let Some(canonical) = canonical.as_str() else {
                continue;
            };
            let aliases = index.entry(canonical.to_lowercase()).or_default();
            let alias = alias.to_lowercase();
            if !aliases.contains(&alias) {
                aliases.push(alias);
            }
        }
    }

    Ok(index)
}

/// Resolve a component alias; a convenience used by the value resolver.
pub(crate) fn component_key(
    aliases: &AliasIndex,
    resolver: &ConfigResolver,
    name: &str,
) -> Result<String, NamingError> {
    Ok(aliases.resolve(resolver, AliasKind::Component, name)?.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> ConfigResolver {
        let resolver = ConfigResolver::with_base_dir(std::env::temp_dir());
        resolver.add_section(
            r#"{"aliases": {"components": {"Environment": "env", "stage": "ENV"}, "templates": {"rg": "resourceGroup"}}}"#,
            None,
        );
        resolver
    }

    #[test]
    fn test_resolve_alias_and_passthrough() {
        let resolver = resolver();
        let aliases = AliasIndex::new();
        assert_eq!(aliases.resolve(&resolver, AliasKind::Component, "environment").unwrap(), "env");
        assert_eq!(aliases.resolve(&resolver, AliasKind::Component, "Region").unwrap(), "Region");
        assert_eq!(aliases.resolve(&resolver, AliasKind::Template, "rg").unwrap(), "resourcegroup");
        // cached miss keeps the caller's spelling
        assert_eq!(aliases.resolve(&resolver, AliasKind::Component, "Region").unwrap(), "Region");
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let resolver = resolver();
        let aliases = AliasIndex::new();
        let once = aliases.resolve(&resolver, AliasKind::Component, "stage").unwrap();
        let twice = aliases.resolve(&resolver, AliasKind::Component, &once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_reverse_index() {
        let resolver = resolver();
        let aliases = AliasIndex::new();
        let mut found = aliases.aliases_of(&resolver, AliasKind::Component, "Env").unwrap();
        found.sort();
        assert_eq!(found, vec!["environment", "stage"]);
        assert!(aliases.aliases_of(&resolver, AliasKind::Template, "missing").unwrap().is_empty());
    }
}
