//! Naming every name node of a JSON document.
//!
//! A *name node* is an object whose only members are `template` and/or
//! `values`:
//!
//! ```json
//! {
//!   "values": {"env": "dev"},
//!   "resourceGroup": {"template": "rg"},
//!   "apps": [
//!     {"values": {"app": "web"}, "site": {"template": "app"}},
//!     {"values": {"app": "api"}, "site": {"template": "app"}}
//!   ]
//! }
//! ```
//!
//! `template` and `values` on any other object are inherited by everything
//! below it and removed from the output. A name node's own template wins over
//! inherited ones; values supplied by the caller win over the node's own
//! values, which win over inherited values (nearest first).

use super::models::Values;
use super::NamingService;
use crate::constants::{DEFAULT_TEMPLATE_KEY, ID_PROPERTY, TEMPLATES_PATH};
use crate::core::NamingError;
use crate::node::{NodePath, NodeVisitor, Visit, lowercase_keys, walk_mut};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::debug;

const TEMPLATE_PROPERTY: &str = "template";
const VALUES_PROPERTY: &str = "values";

/// A rewritten document and the errors met while naming it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphResult {
    pub document: Value,
    pub errors: Vec<String>,
}

/// Outcome of evaluating a set of templates against one set of values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestReport {
    pub success: bool,
    pub errors: Vec<String>,
}

/// Whether `map` is `{template?, values?}` with at least one of the two.
pub fn is_name_node(map: &Map<String, Value>) -> bool {
    (map.contains_key(TEMPLATE_PROPERTY) || map.contains_key(VALUES_PROPERTY))
        && map
            .keys()
            .all(|key| key.eq_ignore_ascii_case(TEMPLATE_PROPERTY) || key.eq_ignore_ascii_case(VALUES_PROPERTY))
}

#[derive(Debug, Default)]
struct Inherited {
    template: Option<String>,
    values: Option<Map<String, Value>>,
}

struct NameNodeVisitor<'a, F> {
    caller_values: Map<String, Value>,
    default_template: Option<&'a str>,
    frames: Vec<Inherited>,
    action: F,
}

impl<F> NameNodeVisitor<'_, F> {
    fn template_for(&self, own: Option<&Value>) -> String {
        own.and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .or_else(|| self.frames.iter().rev().find_map(|frame| frame.template.clone()))
            .or_else(|| self.default_template.map(str::to_string))
            .unwrap_or_default()
    }

    fn values_for(&self, own: Option<&Value>) -> Values {
        let mut merged = self.caller_values.clone();
        let own = own.and_then(Value::as_object);
        let inherited = self.frames.iter().rev().filter_map(|frame| frame.values.as_ref());
        for values in own.into_iter().chain(inherited) {
            for (key, value) in values {
                let key = key.to_lowercase();
                let missing = merged
                    .get(&key)
                    .is_none_or(|existing| existing.is_null() || existing.as_str() == Some(""));
                if missing {
                    merged.insert(key, value.clone());
                }
            }
        }
        merged
    }
}

impl<F> NodeVisitor for NameNodeVisitor<'_, F>
where
    F: FnMut(&NodePath, &str, &Values) -> Result<Option<Value>, NamingError>,
{
    type Error = NamingError;

    fn enter(&mut self, path: &NodePath, node: &mut Value) -> Result<Visit, NamingError> {
        let Value::Object(map) = node else {
            self.frames.push(Inherited::default());
            return Ok(Visit::Descend);
        };

        if is_name_node(map) {
            let template = self.template_for(map.get(TEMPLATE_PROPERTY));
            let values = self.values_for(map.get(VALUES_PROPERTY));
            self.frames.push(Inherited::default());
            debug!(path = %path, template = %template, "found name node");
            return Ok(match (self.action)(path, &template, &values)? {
                Some(replacement) => Visit::Replace(replacement),
                None => Visit::Skip,
            });
        }

        let template = match map.get(TEMPLATE_PROPERTY) {
            Some(Value::String(text)) => {
                let text = text.clone();
                map.shift_remove(TEMPLATE_PROPERTY);
                Some(text).filter(|t| !t.is_empty())
            }
            _ => None,
        };
        let values = match map.get(VALUES_PROPERTY) {
            Some(Value::Object(_)) => match map.shift_remove(VALUES_PROPERTY) {
                Some(Value::Object(values)) => Some(values),
                _ => None,
            },
            _ => None,
        };
        self.frames.push(Inherited { template, values });
        Ok(Visit::Descend)
    }

    fn leave(&mut self, _path: &NodePath, _node: &mut Value) -> Result<(), NamingError> {
        self.frames.pop();
        Ok(())
    }
}

impl NamingService {
    /// Walk `graph` and hand every name node to `action` together with its
    /// effective template and values. A `Some` return replaces the node.
    ///
    /// `key_or_template` is the template for name nodes that neither have nor
    /// inherit one.
    ///
    /// # Errors
    ///
    /// The first error returned by `action`.
    pub fn enumerate_names<F>(
        &self,
        graph: &mut Value,
        values: &Values,
        key_or_template: Option<&str>,
        action: F,
    ) -> Result<(), NamingError>
    where
        F: FnMut(&NodePath, &str, &Values) -> Result<Option<Value>, NamingError>,
    {
        let mut visitor = NameNodeVisitor {
            caller_values: lowercase_keys(values),
            default_template: key_or_template.filter(|t| !t.is_empty()),
            frames: Vec::new(),
            action,
        };
        walk_mut(graph, &mut visitor)
    }

    /// Replace every name node of `graph` with its generated name.
    ///
    /// Each name is evaluated with errors suppressed; the messages are collected.
    ///
    /// # Errors
    ///
    /// [`NamingError::Aggregate`] with every message when any name failed and
    /// `suppress_error` is off.
    pub fn get_name_json(
        &self,
        graph: &Value,
        values: &Values,
        key_or_template: Option<&str>,
    ) -> Result<GraphResult, NamingError> {
        let mut document = graph.clone();
        let mut errors = Vec::new();
        self.enumerate_names(&mut document, values, key_or_template, |_, template, values| {
            let info = self.name_info(template, values, true)?;
            if let Some(error) = info.error {
                errors.push(error);
            }
            Ok(Some(Value::String(info.result)))
        })?;

        if !errors.is_empty() && !self.options.suppress_error {
            return Err(NamingError::Aggregate { errors });
        }
        Ok(GraphResult { document, errors })
    }

    /// Evaluate every name node of `graph`.
    ///
    /// The document is an object mapping each name node's path to its
    /// serialized [`NameInfo`](super::NameInfo).
    ///
    /// # Errors
    ///
    /// A report cannot be serialized.
    pub fn evaluate_name_json(
        &self,
        graph: &Value,
        values: &Values,
        key_or_template: Option<&str>,
    ) -> Result<GraphResult, NamingError> {
        let mut walked = graph.clone();
        let mut reports = Map::new();
        let mut errors = Vec::new();
        self.enumerate_names(&mut walked, values, key_or_template, |path, template, values| {
            let info = self.evaluate_suppressed(template, values);
            if let Some(error) = &info.error {
                errors.push(error.clone());
            }
            let report = serde_json::to_value(&info).map_err(|e| NamingError::Json {
                origin: path.to_string(),
                reason: e.to_string(),
            })?;
            reports.insert(path.to_string(), report);
            Ok(None)
        })?;

        Ok(GraphResult {
            document: Value::Object(reports),
            errors,
        })
    }

    /// Evaluate `keys` (every configured template when empty) against
    /// `values`. The `$id` and `default` entries are never evaluated.
    pub fn test_name(&self, values: &Values, keys: &[String]) -> TestReport {
        let keys = if keys.is_empty() { self.template_keys() } else { keys.to_vec() };
        let values = lowercase_keys(values);

        let errors: Vec<String> = keys
            .iter()
            .filter(|key| !is_reserved_template(key))
            .filter_map(|key| self.evaluate_suppressed(key, &values).error)
            .collect();

        debug!(templates = keys.len(), failures = errors.len(), "tested templates");
        TestReport {
            success: errors.is_empty(),
            errors,
        }
    }

    /// [`test_name`](Self::test_name) as `{"success": bool, "errors": [...]}`.
    pub fn test_name_json(&self, values: &Values, keys: &[String]) -> Value {
        let report = self.test_name(values, keys);
        json!({"success": report.success, "errors": report.errors})
    }

    fn template_keys(&self) -> Vec<String> {
        match self.resolver.try_get_node(TEMPLATES_PATH) {
            Ok(Some(found)) => found
                .node
                .as_object()
                .map(|templates| templates.keys().cloned().collect())
                .unwrap_or_default(),
            Ok(None) => Vec::new(),
            Err(e) => {
                debug!(error = %e, "cannot list templates");
                Vec::new()
            }
        }
    }
}

fn is_reserved_template(key: &str) -> bool {
    key.eq_ignore_ascii_case(ID_PROPERTY) || key.eq_ignore_ascii_case(DEFAULT_TEMPLATE_KEY)
}
