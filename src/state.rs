//! Flat attribute view of declarative state
//!
//! State is addressed by dotted paths the way plans and checks are written:
//! `display_name`, `admin_privileges.manage_members`, `member.#`,
//! `member.0.roles.1`. Null values and empty lists have no attributes at all.

use serde_json::Value;
use std::collections::BTreeMap;

/// Flatten a JSON state into `path -> value` attributes
pub fn flatten(value: &Value) -> BTreeMap<String, String> {
    let mut attributes = BTreeMap::new();
    flatten_into(&mut attributes, "", value);
    attributes
}

fn flatten_into(attributes: &mut BTreeMap<String, String>, prefix: &str, value: &Value) {
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", prefix, key)
        }
    };

    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(attributes, &join(key), child);
            }
        }
        Value::Array(items) if items.is_empty() => {}
        Value::Array(items) => {
            attributes.insert(join("#"), items.len().to_string());
            for (index, child) in items.iter().enumerate() {
                flatten_into(attributes, &join(&index.to_string()), child);
            }
        }
        scalar => {
            attributes.insert(prefix.to_string(), scalar_to_string(scalar));
        }
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// One planned attribute change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeChange {
    Added { path: String, new: String },
    Removed { path: String, old: String },
    Modified { path: String, old: String, new: String },
}

impl AttributeChange {
    pub fn path(&self) -> &str {
        match self {
            AttributeChange::Added { path, .. }
            | AttributeChange::Removed { path, .. }
            | AttributeChange::Modified { path, .. } => path,
        }
    }
}

impl std::fmt::Display for AttributeChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeChange::Added { path, new } => write!(f, "+ {} = {:?}", path, new),
            AttributeChange::Removed { path, old } => write!(f, "- {} = {:?}", path, old),
            AttributeChange::Modified { path, old, new } => {
                write!(f, "~ {}: {:?} -> {:?}", path, old, new)
            }
        }
    }
}

/// Changes between two flat states, minus those `suppress(path, old, new)` marks as no-ops
pub fn diff<F>(
    old: &BTreeMap<String, String>,
    new: &BTreeMap<String, String>,
    suppress: F,
) -> Vec<AttributeChange>
where
    F: Fn(&str, &str, &str) -> bool,
{
    let mut changes = Vec::new();

    for (path, old_value) in old {
        match new.get(path) {
            None => changes.push(AttributeChange::Removed {
                path: path.clone(),
                old: old_value.clone(),
            }),
            Some(new_value) if new_value != old_value && !suppress(path, old_value, new_value) => {
                changes.push(AttributeChange::Modified {
                    path: path.clone(),
                    old: old_value.clone(),
                    new: new_value.clone(),
                })
            }
            Some(_) => {}
        }
    }

    for (path, new_value) in new {
        if !old.contains_key(path) {
            changes.push(AttributeChange::Added {
                path: path.clone(),
                new: new_value.clone(),
            });
        }
    }

    changes.sort_by(|a, b| a.path().cmp(b.path()));
    changes
}
