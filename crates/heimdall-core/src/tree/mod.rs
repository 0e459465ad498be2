//! Dotted-path access over an untyped view of the configuration.
//!
//! The injector and migrator work on a [`Tree`]: the document converted to an
//! insertion-ordered JSON object. The tree never leaves the crate; callers
//! use [`get_value`] and [`set_value`] which convert on the fly.

pub mod errors;

use serde_json::{Map, Value};

use crate::config::ShellConfiguration;
use errors::TreeError;

pub(crate) type Tree = Map<String, Value>;

pub(crate) fn to_tree(config: &ShellConfiguration) -> Result<Tree, TreeError> {
    match serde_json::to_value(config) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(TreeError::ToTree {
            message: format!("expected an object, got {}", type_name(&other)),
        }),
        Err(e) => Err(TreeError::ToTree {
            message: e.to_string(),
        }),
    }
}

pub(crate) fn from_tree(tree: Tree) -> Result<ShellConfiguration, TreeError> {
    serde_json::from_value(Value::Object(tree)).map_err(|e| TreeError::FromTree {
        message: e.to_string(),
    })
}

/// Split a dotted path, rejecting empty segments.
pub(crate) fn split_path(path: &str) -> Result<Vec<&str>, TreeError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(TreeError::InvalidPath {
            path: path.to_string(),
        });
    }
    Ok(segments)
}

pub(crate) fn lookup<'a>(tree: &'a Tree, path: &str) -> Option<&'a Value> {
    let (first, rest) = match path.split_once('.') {
        Some((first, rest)) => (first, Some(rest)),
        None => (path, None),
    };
    let value = tree.get(first)?;
    match rest {
        None => Some(value),
        Some(rest) => lookup(value.as_object()?, rest),
    }
}

/// Set `path` to `value`, creating intermediate objects.
///
/// A non-object intermediate is replaced by an empty object.
pub(crate) fn insert(tree: &mut Tree, path: &str, value: Value) -> Result<(), TreeError> {
    let segments = split_path(path)?;
    let (last, parents) = segments.split_last().ok_or_else(|| TreeError::InvalidPath {
        path: path.to_string(),
    })?;

    let mut current = tree;
    for segment in parents {
        let slot = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = slot
            .as_object_mut()
            .ok_or_else(|| TreeError::InvalidPath {
                path: path.to_string(),
            })?;
    }

    current.insert(last.to_string(), value);
    Ok(())
}

/// Union `source` into `target` recursively without overwriting existing leaves.
///
/// A non-object `target` is left alone.
pub(crate) fn merge_deep(target: &mut Value, source: &Value) {
    let (Value::Object(target), Value::Object(source)) = (target, source) else {
        return;
    };
    for (key, value) in source {
        match target.get_mut(key) {
            Some(existing) if existing.is_object() && value.is_object() => {
                merge_deep(existing, value)
            }
            Some(_) => {}
            None => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Union only the top-level keys of `source` into `target`.
pub(crate) fn merge_shallow(target: &mut Value, source: &Value) {
    let (Value::Object(target), Value::Object(source)) = (target, source) else {
        return;
    };
    for (key, value) in source {
        if !target.contains_key(key) {
            target.insert(key.clone(), value.clone());
        }
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Read the value at a dotted path, or `None` if nothing is there.
pub fn get_value(config: &ShellConfiguration, path: &str) -> Result<Option<Value>, TreeError> {
    split_path(path)?;
    let tree = to_tree(config)?;
    Ok(lookup(&tree, path).cloned())
}

/// Write `value` at a dotted path, creating intermediate objects.
///
/// The document is left untouched if the result no longer fits the schema.
pub fn set_value(
    config: &mut ShellConfiguration,
    path: &str,
    value: Value,
) -> Result<(), TreeError> {
    let mut tree = to_tree(config)?;
    insert(&mut tree, path, value)?;
    *config = from_tree(tree)?;
    Ok(())
}
