//! Frontier evaluation of a [`JsonPath`].
//!
//! Evaluation starts with the root as the only frontier member and folds each
//! segment over the frontier. A segment that matches nothing ends the query with
//! no results. Null values never match.

use super::parse::{JsonPath, Segment, Selector, Slice};
use crate::node::{NodePath, descendants};
use serde_json::Value;
use std::collections::HashSet;

/// A node selected by a path query, with its normalized location.
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'a> {
    pub path: NodePath,
    pub node: &'a Value,
}

impl JsonPath {
    /// Evaluate against `root`.
    ///
    /// Results are distinct by location and keep first-seen order.
    pub fn evaluate<'a>(&self, root: &'a Value) -> Vec<Match<'a>> {
        if root.is_null() {
            return Vec::new();
        }

        let mut frontier = vec![Match {
            path: NodePath::root(),
            node: root,
        }];
        let mut expanded = false;

        for segment in self.segments() {
            frontier = match segment {
                // A second `..` would only repeat nodes the first one produced.
                Segment::Descendants if expanded => frontier,
                Segment::Descendants => {
                    expanded = true;
                    frontier
                        .iter()
                        .flat_map(|m| descendants(m.node, &m.path))
                        .map(|(path, node)| Match { path, node })
                        .collect()
                }
                Segment::Child(selector) => {
                    let mut next = Vec::new();
                    for m in &frontier {
                        apply(selector, m, &mut next);
                    }
                    next
                }
            };
            frontier = distinct(frontier);
            if frontier.is_empty() {
                return frontier;
            }
        }

        frontier
    }
}

fn distinct(matches: Vec<Match<'_>>) -> Vec<Match<'_>> {
    let mut seen = HashSet::new();
    matches
        .into_iter()
        .filter(|m| seen.insert(m.path.clone()))
        .collect()
}

fn apply<'a>(selector: &Selector, m: &Match<'a>, out: &mut Vec<Match<'a>>) {
    match selector {
        Selector::Wildcard => match m.node {
            Value::Object(map) => {
                for (key, child) in map {
                    push(out, m.path.child_key(key), child);
                }
            }
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    push(out, m.path.child_index(index), item);
                }
            }
            _ => {}
        },
        Selector::Member(name) => {
            if let Some(map) = m.node.as_object() {
                let found = map.get_key_value(name).or_else(|| {
                    let lower = name.to_lowercase();
                    map.iter().find(|(key, _)| key.to_lowercase() == lower)
                });
                if let Some((key, child)) = found {
                    push(out, m.path.child_key(key), child);
                }
            }
        }
        Selector::Index(index) => {
            if let Value::Array(items) = m.node {
                if let Some(position) = resolve_index(*index, items.len()) {
                    push(out, m.path.child_index(position), &items[position]);
                }
            }
        }
        Selector::Slice(slice) => {
            if let Value::Array(items) = m.node {
                for position in slice_indices(slice, items.len()) {
                    push(out, m.path.child_index(position), &items[position]);
                }
            }
        }
        Selector::Union(selectors) => {
            for inner in selectors {
                apply(inner, m, out);
            }
        }
    }
}

fn push<'a>(out: &mut Vec<Match<'a>>, path: NodePath, node: &'a Value) {
    if !node.is_null() {
        out.push(Match { path, node });
    }
}

fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let position = if index < 0 { len + index } else { index };
    if (0..len).contains(&position) {
        usize::try_from(position).ok()
    } else {
        None
    }
}

/// Indices selected by `slice` on an array of `len` items.
///
/// Start defaults to 0 and end to `len`; negative bounds count from the end.
/// A negative step walks from `end - 1` down to `start`. A zero step selects
/// nothing.
pub(crate) fn slice_indices(slice: &Slice, len: usize) -> Vec<usize> {
    let Ok(len) = i64::try_from(len) else {
        return Vec::new();
    };
    let step = slice.step.unwrap_or(1);
    if step == 0 {
        return Vec::new();
    }

    let normalize = |bound: i64| if bound < 0 { bound + len } else { bound };
    let start = normalize(slice.start.unwrap_or(0)).clamp(0, len);
    let end = normalize(slice.end.unwrap_or(len)).clamp(0, len);

    let mut indices = Vec::new();
    if step > 0 {
        let mut i = start;
        while i < end {
            indices.push(i);
            i += step;
        }
    } else {
        let mut i = end - 1;
        while i >= start {
            indices.push(i);
            i += step;
        }
    }

    indices
        .into_iter()
        .filter_map(|i| usize::try_from(i).ok())
        .collect()
}
