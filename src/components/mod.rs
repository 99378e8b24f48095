//! Components: the typed rules that turn a placeholder value into name text.
//!
//! A component is declared under `$.components.<name>` either as
//! `{"type": "...", "properties": {...}}` or with the properties inlined next to
//! `type`. Property names are matched case-insensitively.
//!
//! | Type | Properties | Produces |
//! |------|------------|----------|
//! | `freeText` | `casing` | the supplied text |
//! | `dictionary` | `source` | `source[value]`, looked up case-insensitively |
//! | `childDictionary` | `parent`, `source` | `source[parent value][value]` |
//! | `instance` | `minValue`, `maxValue`, `padding` | the integer, optionally left-padded |
//! | `unique` | `length` (1-32, default 4), `seed` | a hash of the seed |
//!
//! Dictionary entries may be wrapped as `{"value": "..."}`.
//!
//! Materialized components are cached per lowercase name in a [`ComponentCatalog`].

use crate::constants::{
    COMPONENTS_PATH, DEFAULT_PADDING_CHARACTER, DEFAULT_UNIQUE_LENGTH, MAX_UNIQUE_LENGTH,
};
use crate::core::NamingError;
use crate::node::{get_ignore_case, quote_member, scalar_text, unwrap_value};
use crate::sections::ConfigResolver;
use dashmap::DashMap;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Case applied to a component value or a whole name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Casing {
    #[default]
    None,
    Lower,
    Upper,
}

impl Casing {
    /// Parse `none`/`lower`/`upper`, ignoring case.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "none" => Some(Self::None),
            "lower" => Some(Self::Lower),
            "upper" => Some(Self::Upper),
            _ => None,
        }
    }

    /// Apply to `text`.
    pub fn apply(self, text: &str) -> String {
        match self {
            Self::None => text.to_string(),
            Self::Lower => text.to_lowercase(),
            Self::Upper => text.to_uppercase(),
        }
    }
}

/// Left padding of an instance number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Padding {
    pub total_length: usize,
    pub character: char,
}

impl Padding {
    /// Pad `text` on the left to `total_length` characters.
    pub fn apply(&self, text: &str) -> String {
        let missing = self.total_length.saturating_sub(text.chars().count());
        let mut padded: String = std::iter::repeat_n(self.character, missing).collect();
        padded.push_str(text);
        padded
    }
}

/// Kind-specific data of a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentKind {
    FreeText,
    /// Lowercased key → value
    Dictionary { source: HashMap<String, String> },
    /// Lowercased parent value → lowercased key → value
    ChildDictionary {
        parent: String,
        source: HashMap<String, HashMap<String, String>>,
    },
    Instance {
        min_value: Option<i64>,
        max_value: i64,
        padding: Option<Padding>,
    },
    Unique { length: usize, seed: Option<String> },
}

impl ComponentKind {
    /// Type name as written in configuration.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::FreeText => "freeText",
            Self::Dictionary { .. } => "dictionary",
            Self::ChildDictionary { .. } => "childDictionary",
            Self::Instance { .. } => "instance",
            Self::Unique { .. } => "unique",
        }
    }
}

/// A materialized component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub name: String,
    pub casing: Casing,
    pub kind: ComponentKind,
}

// Only the identity of a component is part of evaluation reports.
impl Serialize for Component {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Component", 3)?;
        state.serialize_field("type", self.kind.type_name())?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("casing", &self.casing)?;
        state.end()
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind.type_name())
    }
}

impl Component {
    /// Build a component from its configuration node.
    ///
    /// # Errors
    ///
    /// Fails with [`NamingError::Configuration`] when the type is missing or
    /// unknown, a dictionary source is empty, an instance has no `maxValue`, or a
    /// unique length is outside 1-32.
    pub fn from_node(name: &str, node: &Value) -> Result<Self, NamingError> {
        let object = node
            .as_object()
            .ok_or_else(|| NamingError::configuration(format!("Component '{name}' must be an object")))?;
        let type_name = get_ignore_case(object, "type")
            .and_then(Value::as_str)
            .ok_or_else(|| NamingError::configuration(format!("Component '{name}' is missing 'type'")))?;
        let properties = get_ignore_case(object, "properties")
            .and_then(Value::as_object)
            .unwrap_or(object);

        let casing = get_ignore_case(properties, "casing")
            .and_then(Value::as_str)
            .and_then(Casing::parse)
            .unwrap_or_default();

        let kind = match type_name.to_ascii_lowercase().as_str() {
            "freetext" => ComponentKind::FreeText,
            "dictionary" => ComponentKind::Dictionary {
                source: read_dictionary(name, properties)?,
            },
            "childdictionary" => read_child_dictionary(name, properties)?,
            "instance" => read_instance(name, properties)?,
            "unique" => read_unique(properties)?,
            other => {
                return Err(NamingError::configuration(format!(
                    "Unknown component type '{other}' for component '{name}'"
                )));
            }
        };

        Ok(Self {
            name: name.to_string(),
            casing,
            kind,
        })
    }
}

fn non_empty_source<'a>(
    properties: &'a Map<String, Value>,
    missing: impl FnOnce() -> NamingError,
) -> Result<&'a Map<String, Value>, NamingError> {
    get_ignore_case(properties, "source")
        .and_then(Value::as_object)
        .filter(|source| !source.is_empty())
        .ok_or_else(missing)
}

fn lowercase_entries(name: &str, source: &Map<String, Value>) -> Result<HashMap<String, String>, NamingError> {
    source
        .iter()
        .map(|(key, value)| {
            let text = scalar_text(unwrap_value(value)).ok_or_else(|| {
                NamingError::configuration(format!("Value for '{key}' in component '{name}' is missing"))
            })?;
            Ok((key.to_lowercase(), text))
        })
        .collect()
}

fn read_dictionary(name: &str, properties: &Map<String, Value>) -> Result<HashMap<String, String>, NamingError> {
    let source = non_empty_source(properties, || {
        NamingError::configuration(format!("Source is required for dictionary component '{name}'"))
    })?;
    lowercase_entries(name, source)
}

fn read_child_dictionary(name: &str, properties: &Map<String, Value>) -> Result<ComponentKind, NamingError> {
    let parent = get_ignore_case(properties, "parent")
        .and_then(Value::as_str)
        .filter(|parent| !parent.is_empty())
        .ok_or_else(|| {
            NamingError::configuration(format!("Parent is required for child dictionary component '{name}'"))
        })?;
    let source = non_empty_source(properties, || {
        NamingError::configuration(format!("Source is required for child dictionary component '{name}'"))
    })?;

    let mut children = HashMap::with_capacity(source.len());
    for (key, value) in source {
        let entries = unwrap_value(value)
            .as_object()
            .filter(|entries| !entries.is_empty())
            .ok_or_else(|| {
                NamingError::configuration(format!(
                    "Source item is required for child dictionary component '{name}'"
                ))
            })?;
        children.insert(key.to_lowercase(), lowercase_entries(name, entries)?);
    }

    Ok(ComponentKind::ChildDictionary {
        parent: parent.to_string(),
        source: children,
    })
}

fn read_instance(name: &str, properties: &Map<String, Value>) -> Result<ComponentKind, NamingError> {
    let max_value = get_ignore_case(properties, "maxValue")
        .and_then(Value::as_i64)
        .ok_or_else(|| NamingError::configuration(format!("MaxValue is required for instance component '{name}'")))?;
    let min_value = get_ignore_case(properties, "minValue").and_then(Value::as_i64);

    let padding = get_ignore_case(properties, "padding")
        .and_then(Value::as_object)
        .map(|padding| Padding {
            total_length: get_ignore_case(padding, "totalLength")
                .and_then(Value::as_u64)
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(0),
            character: get_ignore_case(padding, "character")
                .and_then(Value::as_str)
                .and_then(|c| c.chars().next())
                .unwrap_or(DEFAULT_PADDING_CHARACTER),
        });

    Ok(ComponentKind::Instance {
        min_value,
        max_value,
        padding,
    })
}

fn read_unique(properties: &Map<String, Value>) -> Result<ComponentKind, NamingError> {
    let length = match get_ignore_case(properties, "length").and_then(Value::as_i64) {
        None => DEFAULT_UNIQUE_LENGTH,
        Some(length) if length < 1 => {
            return Err(NamingError::configuration("Length must be greater than 0"));
        }
        Some(length) => match usize::try_from(length) {
            Ok(length) if length <= MAX_UNIQUE_LENGTH => length,
            _ => {
                return Err(NamingError::configuration(format!(
                    "Length must be less than {}",
                    MAX_UNIQUE_LENGTH + 1
                )));
            }
        },
    };
    let seed = get_ignore_case(properties, "seed").and_then(scalar_text);

    Ok(ComponentKind::Unique { length, seed })
}

/// Per-service cache of materialized components.
#[derive(Debug, Default)]
pub struct ComponentCatalog {
    cache: DashMap<String, Arc<Component>>,
}

impl ComponentCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up and materialize the component called `name` (already alias-resolved).
    ///
    /// # Errors
    ///
    /// Resolver failures and invalid component definitions.
    pub fn get(&self, resolver: &ConfigResolver, name: &str) -> Result<Option<Arc<Component>>, NamingError> {
        let key = name.to_lowercase();
        if let Some(cached) = self.cache.get(&key) {
            return Ok(Some(Arc::clone(cached.value())));
        }

        let path = format!("{COMPONENTS_PATH}{}", quote_member(&key));
        let Some(found) = resolver.try_get_node(&path)? else {
            debug!(component = name, "component not found");
            return Ok(None);
        };

        let display_name = found.property_name.as_deref().unwrap_or(name);
        let component = Arc::new(Component::from_node(display_name, &found.node)?);
        debug!(component = %component, "materialized component");
        self.cache.insert(key, Arc::clone(&component));
        Ok(Some(component))
    }

    /// Forget every cached component.
    pub fn clear(&self) {
        self.cache.clear();
    }
}
