//! Fills missing properties from the default profile.
//!
//! A pass diffs the default tree against the live tree, drops anything the
//! user has locked, picks a strategy per path, and writes the result back into
//! the typed document. Only conversion failures abort a pass; a property that
//! cannot be written is logged and reported in [`InjectionReport::failed`].

use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::errors::InjectionError;
use super::types::{InjectionReport, InjectionRule, Strategy, blank};
use crate::config::defaults::{DEFAULT_PROFILE, DEFAULT_WATCH_PATH, LEGACY_WATCH_PATH};
use crate::config::types::{CURRENT_SCHEMA_VERSION, MANAGED_BY, ShellConfiguration};
use crate::config::profile_defaults;
use crate::tree::{self, Tree};

#[derive(Debug)]
pub struct PropertyInjector {
    defaults: Tree,
    rules: Vec<InjectionRule>,
    /// Defaults shipped by earlier releases, keyed by path.
    previous_defaults: HashMap<String, Value>,
}

impl PropertyInjector {
    /// Build an injector over the `default` profile and the built-in rules.
    pub fn new() -> Result<Self, InjectionError> {
        let defaults = tree::to_tree(&profile_defaults(DEFAULT_PROFILE))?;

        let mut previous_defaults = HashMap::new();
        previous_defaults.insert(
            "hotReload.watchPaths".to_string(),
            Value::from(vec![LEGACY_WATCH_PATH]),
        );

        Ok(Self::with_parts(defaults, builtin_rules(), previous_defaults))
    }

    pub(crate) fn with_parts(
        defaults: Tree,
        rules: Vec<InjectionRule>,
        previous_defaults: HashMap<String, Value>,
    ) -> Self {
        Self {
            defaults,
            rules,
            previous_defaults,
        }
    }

    /// Fill missing properties in place.
    ///
    /// On error the document is left untouched.
    pub fn inject_defaults(
        &self,
        config: &mut ShellConfiguration,
    ) -> Result<InjectionReport, InjectionError> {
        let mut live = tree::to_tree(config)?;
        let locks = config.metadata.user_locked.clone();
        let mut report = InjectionReport::default();

        let mut candidates = Vec::new();
        self.collect_missing("", &live, &self.defaults, &mut candidates);
        self.collect_rule_candidates(&live, &mut candidates);

        for (path, default_value) in candidates {
            if is_locked(&path, &locks) {
                debug!(
                    event = "core.injection.property_skipped_locked",
                    path = %path
                );
                report.skipped_locked.push(path);
                continue;
            }

            let rule = self.find_rule(&path);
            if let Some(rule) = rule
                && !(rule.precondition)(tree::lookup(&live, &path))
            {
                continue;
            }

            let strategy = rule.map_or(Strategy::ReplaceIfMissing, |r| r.strategy);
            let mut value = rule
                .and_then(|r| r.value.clone())
                .unwrap_or(default_value);
            self.prune_excluded(&path, &mut value, &locks);

            match self.apply(&mut live, &path, value, strategy) {
                Ok(true) => {
                    debug!(
                        event = "core.injection.property_injected",
                        path = %path,
                        strategy = %strategy
                    );
                    report.injected.push(path);
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(
                        event = "core.injection.property_failed",
                        path = %path,
                        error = %e
                    );
                    report.failed.push(path);
                }
            }
        }

        let mut updated = tree::from_tree(live)?;
        stamp_metadata(&mut updated);
        *config = updated;

        info!(
            event = "core.injection.completed",
            injected = report.injected.len(),
            skipped_locked = report.skipped_locked.len(),
            failed = report.failed.len()
        );

        Ok(report)
    }

    /// Write `value` at `path` if the slot is vacant.
    ///
    /// Returns whether the document changed. Locked paths are left alone.
    pub fn inject_property(
        &self,
        config: &mut ShellConfiguration,
        path: &str,
        value: Value,
    ) -> Result<bool, InjectionError> {
        tree::split_path(path)?;
        if is_locked(path, &config.metadata.user_locked) {
            debug!(
                event = "core.injection.property_skipped_locked",
                path = %path
            );
            return Ok(false);
        }

        let mut live = tree::to_tree(config)?;
        let changed = self.apply(&mut live, path, value, Strategy::ReplaceIfMissing)?;
        if changed {
            *config = tree::from_tree(live)?;
        }
        Ok(changed)
    }

    /// Pin `path` so injection never touches it. Idempotent.
    pub fn set_user_lock(&self, config: &mut ShellConfiguration, path: &str) {
        if !config.metadata.user_locked.iter().any(|p| p == path) {
            config.metadata.user_locked.push(path.to_string());
            info!(event = "core.injection.lock_added", path = %path);
        }
    }

    /// Remove a pin. Idempotent.
    pub fn remove_user_lock(&self, config: &mut ShellConfiguration, path: &str) {
        let before = config.metadata.user_locked.len();
        config.metadata.user_locked.retain(|p| p != path);
        if config.metadata.user_locked.len() != before {
            info!(event = "core.injection.lock_removed", path = %path);
        }
    }

    /// Walk `defaults` and record every path the live tree lacks.
    ///
    /// A live scalar where the default is an object counts as missing. The
    /// walk stops at paths whose rule merges or never injects: such a path
    /// yields a single candidate carrying the whole default subtree, so the
    /// rule's strategy decides how it lands.
    fn collect_missing(
        &self,
        prefix: &str,
        live: &Map<String, Value>,
        defaults: &Map<String, Value>,
        out: &mut Vec<(String, Value)>,
    ) {
        for (key, default_value) in defaults {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };

            match self.find_rule(&path).map(|rule| rule.strategy) {
                Some(Strategy::Never) => continue,
                Some(Strategy::MergeDeep | Strategy::MergeShallow) => {
                    out.push((path, default_value.clone()));
                    continue;
                }
                _ => {}
            }

            match (live.get(key), default_value) {
                (None, _) | (Some(Value::Null), _) => out.push((path, default_value.clone())),
                (Some(Value::Object(live_child)), Value::Object(default_child)) => {
                    self.collect_missing(&path, live_child, default_child, out)
                }
                (Some(_), Value::Object(_)) => out.push((path, default_value.clone())),
                (Some(_), _) => {}
            }
        }
    }

    /// Remove locked and never-injected descendants from a value about to
    /// be written at `path`.
    fn prune_excluded(&self, path: &str, value: &mut Value, locks: &[String]) {
        let Value::Object(map) = value else {
            return;
        };
        map.retain(|key, _| {
            let child = format!("{}.{}", path, key);
            !is_locked(&child, locks)
                && self
                    .find_rule(&child)
                    .is_none_or(|rule| rule.strategy != Strategy::Never)
        });
        for (key, child) in map.iter_mut() {
            self.prune_excluded(&format!("{}.{}", path, key), child, locks);
        }
    }

    fn find_rule(&self, path: &str) -> Option<&InjectionRule> {
        self.rules.iter().find(|rule| rule.path == path)
    }

    /// Rule paths that are present but still need a value.
    ///
    /// Covers blank strings under replace-if-missing rules and values that
    /// equal a previously shipped default under replace-if-known-default.
    fn collect_rule_candidates(&self, live: &Tree, candidates: &mut Vec<(String, Value)>) {
        for rule in &self.rules {
            if candidates.iter().any(|(p, _)| p == &rule.path) {
                continue;
            }
            let Some(current) = tree::lookup(live, &rule.path) else {
                continue;
            };
            let Some(replacement) = rule
                .value
                .clone()
                .or_else(|| tree::lookup(&self.defaults, &rule.path).cloned())
            else {
                continue;
            };

            let stale = match rule.strategy {
                Strategy::ReplaceIfMissing => {
                    is_vacant(Some(current), &replacement) && (rule.precondition)(Some(current))
                }
                Strategy::ReplaceIfKnownDefault => {
                    self.previous_defaults.get(&rule.path) == Some(current)
                }
                _ => false,
            };
            if stale {
                candidates.push((rule.path.clone(), replacement));
            }
        }
    }

    fn apply(
        &self,
        live: &mut Tree,
        path: &str,
        value: Value,
        strategy: Strategy,
    ) -> Result<bool, InjectionError> {
        let current = tree::lookup(live, path).cloned();

        let replacement = match strategy {
            Strategy::Never => None,
            Strategy::ReplaceIfMissing => is_vacant(current.as_ref(), &value).then_some(value),
            Strategy::ReplaceIfKnownDefault => match &current {
                None | Some(Value::Null) => Some(value),
                Some(current) => {
                    (self.previous_defaults.get(path) == Some(current)).then_some(value)
                }
            },
            Strategy::MergeDeep | Strategy::MergeShallow => match current {
                Some(current @ Value::Object(_)) if value.is_object() => {
                    let mut merged = current.clone();
                    if strategy == Strategy::MergeDeep {
                        tree::merge_deep(&mut merged, &value);
                    } else {
                        tree::merge_shallow(&mut merged, &value);
                    }
                    (merged != current).then_some(merged)
                }
                current => is_vacant(current.as_ref(), &value).then_some(value),
            },
        };

        match replacement {
            Some(replacement) => {
                tree::insert(live, path, replacement)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn is_vacant(current: Option<&Value>, default: &Value) -> bool {
    match current {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(current) => default.is_object() && !current.is_object(),
    }
}

/// Whether `path` falls under any lock.
///
/// A lock matches its exact path and every descendant; a trailing `*` turns
/// the lock into a plain prefix match (`services.*` matches `services.audio`).
pub(crate) fn is_locked(path: &str, locks: &[String]) -> bool {
    locks.iter().any(|lock| match lock.strip_suffix('*') {
        Some(prefix) => path.starts_with(prefix),
        None => {
            path == lock
                || path
                    .strip_prefix(lock.as_str())
                    .is_some_and(|rest| rest.starts_with('.'))
        }
    })
}

fn stamp_metadata(config: &mut ShellConfiguration) {
    config.metadata.last_modified = Some(Utc::now());
    if config
        .metadata
        .managed_by
        .as_deref()
        .is_none_or(|m| m.trim().is_empty())
    {
        config.metadata.managed_by = Some(MANAGED_BY.to_string());
    }
}

fn builtin_rules() -> Vec<InjectionRule> {
    vec![
        InjectionRule::new("version", Strategy::ReplaceIfMissing)
            .when(blank)
            .with_value(Value::from(CURRENT_SCHEMA_VERSION)),
        InjectionRule::new("metadata.managedBy", Strategy::ReplaceIfMissing)
            .when(blank)
            .with_value(Value::from(MANAGED_BY)),
        InjectionRule::new("system.shell", Strategy::ReplaceIfMissing)
            .when(blank)
            .with_value(Value::from("bash")),
        InjectionRule::new("system.terminal", Strategy::ReplaceIfMissing)
            .when(blank)
            .with_value(Value::from("kitty")),
        InjectionRule::new("metadata.created", Strategy::Never),
        InjectionRule::new("metadata.lastModified", Strategy::Never),
        InjectionRule::new("modules.settings", Strategy::MergeShallow),
        InjectionRule::new("hotReload", Strategy::MergeDeep),
        InjectionRule::new("hotReload.watchPaths", Strategy::ReplaceIfKnownDefault)
            .with_value(Value::from(vec![DEFAULT_WATCH_PATH])),
    ]
}
