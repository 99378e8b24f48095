//! Tree helpers over [`serde_json::Value`].
//!
//! Configuration documents are plain JSON trees. This module gives them:
//! - [`NodePath`], the normalized path of a node (`$.templates['my template'][0]`)
//! - [`descendants`], a pre-order walk used by the `..` path segment
//! - [`nest`], wrapping a document under dotted segments
//! - [`walk_mut`], a mutable visitor used by reference resolution and by the
//!   JSON name-tree rewrite
//! - small accessors for case-insensitive property lookup and scalar text

use serde_json::{Map, Value};
use std::fmt;

/// One step of a [`NodePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object member
    Key(String),
    /// Array element
    Index(usize),
}

/// Normalized location of a node inside a document.
///
/// Displays as `$` followed by `.name` for plain member names, `['name']` for
/// names that would not survive re-parsing as a bare segment, and `[i]` for
/// array indices. The displayed form is itself a valid path query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath {
    segments: Vec<PathSegment>,
}

impl NodePath {
    /// The document root, `$`.
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Extend with an object member.
    #[must_use]
    pub fn child_key(&self, key: &str) -> Self {
        let mut path = self.clone();
        path.push_key(key);
        path
    }

    /// Extend with an array index.
    #[must_use]
    pub fn child_index(&self, index: usize) -> Self {
        let mut path = self.clone();
        path.segments.push(PathSegment::Index(index));
        path
    }

    /// Append a member segment in place.
    pub fn push_key(&mut self, key: &str) {
        self.segments.push(PathSegment::Key(key.to_string()));
    }

    /// Append an index segment in place.
    pub fn push_index(&mut self, index: usize) {
        self.segments.push(PathSegment::Index(index));
    }

    /// `relative` appended below this path.
    #[must_use]
    pub fn join(&self, relative: &NodePath) -> Self {
        let mut path = self.clone();
        path.segments.extend(relative.segments.iter().cloned());
        path
    }

    /// Drop the last segment.
    pub fn pop(&mut self) {
        self.segments.pop();
    }

    /// Segments from the root down.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Member name of the last segment, if it is a member.
    pub fn property_name(&self) -> Option<&str> {
        match self.segments.last() {
            Some(PathSegment::Key(key)) => Some(key),
            _ => None,
        }
    }
}

/// Whether `name` can be written as a bare `.name` segment.
fn is_plain_member(name: &str) -> bool {
    !name.is_empty()
        && name.parse::<i64>().is_err()
        && name != "*"
        && !name
            .chars()
            .any(|c| matches!(c, '.' | '[' | ']' | '\'' | '"' | '*' | ',' | ':') || c.is_whitespace())
}

/// Quote a member name as a bracket segment: `['it''s']`.
pub fn quote_member(name: &str) -> String {
    format!("['{}']", name.replace('\'', "''"))
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for segment in &self.segments {
            match segment {
                PathSegment::Key(key) if is_plain_member(key) => write!(f, ".{key}")?,
                PathSegment::Key(key) => f.write_str(&quote_member(key))?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// Pre-order, self-inclusive walk of `node`, skipping nulls.
///
/// Paths are relative to `base`. Object members come in document order,
/// array items in index order.
pub fn descendants<'a>(node: &'a Value, base: &NodePath) -> Vec<(NodePath, &'a Value)> {
    let mut out = Vec::new();
    collect_descendants(node, base.clone(), &mut out);
    out
}

fn collect_descendants<'a>(node: &'a Value, path: NodePath, out: &mut Vec<(NodePath, &'a Value)>) {
    if node.is_null() {
        return;
    }
    out.push((path.clone(), node));
    match node {
        Value::Object(map) => {
            for (key, child) in map {
                collect_descendants(child, path.child_key(key), out);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                collect_descendants(item, path.child_index(index), out);
            }
        }
        _ => {}
    }
}

/// Wrap `node` so it sits at the dotted location given by `segments`.
///
/// Segments are applied innermost-first; a `$` segment stops the wrapping, so
/// `["$", "a", "b"]` yields `{"a": {"b": node}}`. An empty list returns the node
/// unchanged.
///
/// # Examples
///
/// ```rust
/// use aznaming::node::nest;
/// use serde_json::json;
///
/// let nested = nest(json!({"x": 1}), &["a", "b"]);
/// assert_eq!(nested, json!({"a": {"b": {"x": 1}}}));
/// ```
pub fn nest<S: AsRef<str>>(node: Value, segments: &[S]) -> Value {
    let mut current = node;
    for segment in segments.iter().rev() {
        let segment = segment.as_ref();
        if segment == "$" {
            break;
        }
        let mut wrapper = Map::new();
        wrapper.insert(segment.to_string(), current);
        current = Value::Object(wrapper);
    }
    current
}

/// What [`walk_mut`] should do with the node it just entered.
#[derive(Debug)]
pub enum Visit {
    /// Visit the node's children.
    Descend,
    /// Leave the children alone.
    Skip,
    /// Swap the node for this value and do not descend into it.
    Replace(Value),
}

/// Callbacks for [`walk_mut`].
pub trait NodeVisitor {
    /// Error that aborts the walk.
    type Error;

    /// Called before the children of `node`.
    fn enter(&mut self, path: &NodePath, node: &mut Value) -> Result<Visit, Self::Error>;

    /// Called after the children of `node` (also after a replacement).
    fn leave(&mut self, _path: &NodePath, _node: &mut Value) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Depth-first mutable walk of `node`, root included. Null children are skipped.
///
/// # Errors
///
/// Stops at the first error returned by the visitor.
pub fn walk_mut<V: NodeVisitor>(node: &mut Value, visitor: &mut V) -> Result<(), V::Error> {
    let mut path = NodePath::root();
    walk_node(node, &mut path, visitor)
}

fn walk_node<V: NodeVisitor>(node: &mut Value, path: &mut NodePath, visitor: &mut V) -> Result<(), V::Error> {
    match visitor.enter(path, node)? {
        Visit::Replace(replacement) => *node = replacement,
        Visit::Skip => {}
        Visit::Descend => match node {
            Value::Object(map) => {
                for (key, child) in map.iter_mut() {
                    if child.is_null() {
                        continue;
                    }
                    path.push_key(key);
                    walk_node(child, path, visitor)?;
                    path.pop();
                }
            }
            Value::Array(items) => {
                for (index, item) in items.iter_mut().enumerate() {
                    if item.is_null() {
                        continue;
                    }
                    path.push_index(index);
                    walk_node(item, path, visitor)?;
                    path.pop();
                }
            }
            _ => {}
        },
    }
    visitor.leave(path, node)
}

/// Case-insensitive member lookup.
///
/// An exact match wins over a case-folded one.
pub fn get_ignore_case<'a>(map: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    map.get(name).or_else(|| {
        map.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

/// Whether `map` has a member named `name`, ignoring case.
pub fn contains_ignore_case(map: &Map<String, Value>, name: &str) -> bool {
    get_ignore_case(map, name).is_some()
}

/// Copy of `map` with every key lowercased. Later duplicates win.
pub fn lowercase_keys(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| (key.to_lowercase(), value.clone()))
        .collect()
}

/// Text form of a scalar value.
///
/// Strings come back as-is, numbers and booleans in their JSON spelling,
/// null as `None`. Arrays and objects are rendered as compact JSON.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        other => Some(other.to_string()),
    }
}

/// Unwrap `{"value": x}` to `x`; anything else is returned unchanged.
pub fn unwrap_value(value: &Value) -> &Value {
    match value {
        Value::Object(map) => get_ignore_case(map, "value").unwrap_or(value),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_display_quotes_special_names() {
        let path = NodePath::root()
            .child_key("templates")
            .child_key("my template")
            .child_key("it's")
            .child_index(2)
            .child_key("$id");
        assert_eq!(path.to_string(), "$.templates['my template']['it''s'][2].$id");
    }

    #[test]
    fn test_join_appends_relative_segments() {
        let base = NodePath::root().child_key("templates");
        let relative = NodePath::root().child_key("rg").child_index(0);
        assert_eq!(base.join(&relative).to_string(), "$.templates.rg[0]");
        assert_eq!(base.join(&NodePath::root()), base);
    }

    #[test]
    fn test_path_display_quotes_numeric_names() {
        assert_eq!(NodePath::root().child_key("0").to_string(), "$['0']");
        assert_eq!(NodePath::root().child_key("").to_string(), "$['']");
    }

    #[test]
    fn test_descendants_preorder_skips_null() {
        let doc = json!({"a": {"b": 1, "n": null}, "c": [true]});
        let paths: Vec<String> = descendants(&doc, &NodePath::root())
            .into_iter()
            .map(|(path, _)| path.to_string())
            .collect();
        assert_eq!(paths, vec!["$", "$.a", "$.a.b", "$.c", "$.c[0]"]);
    }

    #[test]
    fn test_nest_stops_at_dollar() {
        assert_eq!(nest(json!(1), &["$", "a"]), json!({"a": 1}));
        assert_eq!(nest(json!(1), &[] as &[&str]), json!(1));
    }

    struct Upper;

    impl NodeVisitor for Upper {
        type Error = ();

        fn enter(&mut self, _path: &NodePath, node: &mut Value) -> Result<Visit, ()> {
            Ok(match node {
                Value::String(text) => Visit::Replace(Value::String(text.to_uppercase())),
                _ => Visit::Descend,
            })
        }
    }

    #[test]
    fn test_walk_mut_replaces_nodes() {
        let mut doc = json!({"a": ["x", {"b": "y"}], "n": null});
        walk_mut(&mut doc, &mut Upper).unwrap();
        assert_eq!(doc, json!({"a": ["X", {"b": "Y"}], "n": null}));
    }

    #[test]
    fn test_get_ignore_case_prefers_exact() {
        let map = json!({"Type": "a", "type": "b"});
        let map = map.as_object().unwrap();
        assert_eq!(get_ignore_case(map, "type"), Some(&json!("b")));
        assert_eq!(get_ignore_case(map, "TYPE"), Some(&json!("a")));
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(scalar_text(&json!(7)).as_deref(), Some("7"));
        assert_eq!(scalar_text(&json!(true)).as_deref(), Some("true"));
        assert_eq!(scalar_text(&Value::Null), None);
    }
}
