//! Built-in schema migration steps.

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value, json};

use super::registry::Migration;
use crate::config::defaults::DEFAULT_WATCH_PATH;
use crate::tree::Tree;

/// Closed set of migration steps shipped with this release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MigrationStep {
    /// `panel` becomes `bar`, `theme` folds into `appearance`, hot reload appears.
    V0_9_0ToV1_0_0,
}

impl MigrationStep {
    /// Every step, in registration order.
    pub fn all() -> &'static [MigrationStep] {
        &[MigrationStep::V0_9_0ToV1_0_0]
    }

    pub fn migration(&self) -> Migration {
        match self {
            MigrationStep::V0_9_0ToV1_0_0 => Migration {
                from: "0.9.0",
                to: "1.0.0",
                description: "Rename panel to bar, merge theme into appearance, add hot reload",
                validate: validate_0_9,
                apply: apply_0_9_to_1_0,
                rollback: rollback_1_0_to_0_9,
            },
        }
    }
}

fn validate_0_9(tree: &Tree) -> Result<(), String> {
    let version = tree
        .get("version")
        .and_then(Value::as_str)
        .ok_or_else(|| "missing version field".to_string())?;

    if !version.starts_with("0.9") {
        return Err(format!("invalid source version: {}", version));
    }
    Ok(())
}

/// An absent key and an empty object both count as "not configured".
fn is_unset(tree: &Tree, key: &str) -> bool {
    match tree.get(key) {
        None | Some(Value::Null) => true,
        Some(Value::Object(map)) => map.is_empty(),
        Some(_) => false,
    }
}

fn apply_0_9_to_1_0(tree: &mut Tree) -> Result<(), String> {
    if let Some(panel) = tree.remove("panel") {
        tree.insert("bar".to_string(), panel);
    }

    match tree.remove("theme") {
        Some(Value::Object(theme)) => match tree.get_mut("appearance") {
            Some(Value::Object(appearance)) => {
                for (key, value) in theme {
                    appearance.insert(key, value);
                }
            }
            _ => {
                tree.insert("appearance".to_string(), Value::Object(theme));
            }
        },
        // A non-object theme has no 1.0.0 counterpart; keep it opaque.
        Some(other) => {
            tree.insert("theme".to_string(), other);
        }
        None => {}
    }

    if is_unset(tree, "hotReload") {
        tree.insert(
            "hotReload".to_string(),
            json!({
                "enabled": true,
                "watchPaths": [DEFAULT_WATCH_PATH],
                "debounce": 100,
            }),
        );
    }

    let metadata = tree
        .entry("metadata")
        .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(metadata) = metadata {
        metadata.insert(
            "migrated".to_string(),
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        metadata.insert("migrationVersion".to_string(), Value::from("1.0.0"));
    }

    Ok(())
}

fn rollback_1_0_to_0_9(tree: &mut Tree) -> Result<(), String> {
    if let Some(bar) = tree.remove("bar") {
        tree.insert("panel".to_string(), bar);
    }

    tree.remove("hotReload");

    if let Some(Value::Object(metadata)) = tree.get_mut("metadata") {
        metadata.remove("migrated");
        metadata.remove("migrationVersion");
    }

    Ok(())
}
