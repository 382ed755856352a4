//! Plan vs state comparison
//!
//! Only configurable attributes take part. Computed attributes and the
//! `timeouts` block are never a reason to call the service.

use super::model::ServiceLevelObjectiveModel;
use super::schema::Schema;
use serde_json::{Map, Value};

const LOCAL_ONLY_BLOCKS: &[&str] = &["timeouts"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeChange {
    pub path: String,
    pub requires_replace: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    pub changes: Vec<AttributeChange>,
}

impl Diff {
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    pub fn requires_replace(&self) -> bool {
        self.changes.iter().any(|c| c.requires_replace)
    }

    pub fn paths(&self) -> Vec<&str> {
        self.changes.iter().map(|c| c.path.as_str()).collect()
    }
}

/// Compute the changes needed to move `state` to `plan`
pub fn diff(
    schema: &Schema,
    plan: &ServiceLevelObjectiveModel,
    state: &ServiceLevelObjectiveModel,
) -> Diff {
    let plan = configurable_projection(schema, plan);
    let state = configurable_projection(schema, state);

    let mut paths = Vec::new();
    diff_values("", &plan, &state, &mut paths);

    let changes = paths
        .into_iter()
        .map(|path| {
            let requires_replace = schema
                .block
                .attributes
                .get(path.as_str())
                .map(|a| a.requires_replace)
                .unwrap_or(false);
            AttributeChange {
                path,
                requires_replace,
            }
        })
        .collect();
    Diff { changes }
}

fn configurable_projection(schema: &Schema, model: &ServiceLevelObjectiveModel) -> Value {
    let mut value = serde_json::to_value(model).unwrap_or(Value::Null);
    if let Some(object) = value.as_object_mut() {
        for name in schema.computed_attributes() {
            object.remove(name);
        }
        for name in LOCAL_ONLY_BLOCKS {
            object.remove(*name);
        }
    }
    value
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn diff_values(path: &str, plan: &Value, state: &Value, out: &mut Vec<String>) {
    match (plan, state) {
        (Value::Object(p), Value::Object(s)) => diff_objects(path, p, s, out),
        (Value::Array(p), Value::Array(s)) if p.len() == s.len() => {
            for (i, (pv, sv)) in p.iter().zip(s).enumerate() {
                diff_values(&format!("{}[{}]", path, i), pv, sv, out);
            }
        }
        (p, s) if p != s => out.push(path.to_string()),
        _ => {}
    }
}

fn diff_objects(
    path: &str,
    plan: &Map<String, Value>,
    state: &Map<String, Value>,
    out: &mut Vec<String>,
) {
    let mut keys: Vec<&String> = plan.keys().chain(state.keys()).collect();
    keys.sort();
    keys.dedup();

    for key in keys {
        let p = plan.get(key).unwrap_or(&Value::Null);
        let s = state.get(key).unwrap_or(&Value::Null);
        diff_values(&join(path, key), p, s, out);
    }
}
