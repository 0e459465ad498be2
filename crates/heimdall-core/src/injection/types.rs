//! Injection strategies, rules, and the per-pass report.

use serde_json::Value;

/// How a default is written into the live document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Write the default only if the slot is vacant: absent, null, an empty
    /// string, or a scalar where the default is an object.
    ReplaceIfMissing,
    /// Replace the current value only if it equals the previously shipped default.
    ReplaceIfKnownDefault,
    /// Recursively add keys the current object lacks.
    MergeDeep,
    /// Add only the top-level keys the current object lacks.
    MergeShallow,
    /// Leave the slot alone.
    Never,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::ReplaceIfMissing => "replace-if-missing",
            Strategy::ReplaceIfKnownDefault => "replace-if-known-default",
            Strategy::MergeDeep => "merge-deep",
            Strategy::MergeShallow => "merge-shallow",
            Strategy::Never => "never",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Precondition over the current value at a rule's path.
pub type Precondition = fn(Option<&Value>) -> bool;

/// A path-specific override of the default strategy.
#[derive(Debug, Clone)]
pub struct InjectionRule {
    pub path: String,
    pub precondition: Precondition,
    /// Replaces the value from the default tree when set.
    pub value: Option<Value>,
    pub strategy: Strategy,
}

impl InjectionRule {
    pub fn new(path: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            path: path.into(),
            precondition: always,
            value: None,
            strategy,
        }
    }

    pub fn when(mut self, precondition: Precondition) -> Self {
        self.precondition = precondition;
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }
}

pub fn always(_: Option<&Value>) -> bool {
    true
}

/// True when the slot is absent, null, or a blank string.
pub fn blank(current: Option<&Value>) -> bool {
    match current {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

/// What an injection pass did, path by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectionReport {
    pub injected: Vec<String>,
    pub skipped_locked: Vec<String>,
    pub failed: Vec<String>,
}

impl InjectionReport {
    pub fn is_noop(&self) -> bool {
        self.injected.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_blank_precondition() {
        assert!(blank(None));
        assert!(blank(Some(&Value::Null)));
        assert!(blank(Some(&json!("  "))));
        assert!(!blank(Some(&json!("zsh"))));
        assert!(!blank(Some(&json!(0))));
    }

    #[test]
    fn test_rule_builder() {
        let rule = InjectionRule::new("system.shell", Strategy::ReplaceIfMissing)
            .when(blank)
            .with_value(json!("bash"));
        assert_eq!(rule.strategy.to_string(), "replace-if-missing");
        assert!((rule.precondition)(None));
        assert_eq!(rule.value, Some(json!("bash")));
    }
}
