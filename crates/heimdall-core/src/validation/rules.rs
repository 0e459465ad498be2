//! Declarative rules evaluated after the fixed battery.
//!
//! A rule names a dotted path and a predicate over whatever value sits there.
//! New checks that only need a path lookup belong here rather than in
//! [`super::validator`].

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use super::types::{IssueKind, Severity, ValidationIssue};
use crate::tree::{self, Tree};

pub(crate) static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#([0-9A-Fa-f]{6}|[0-9A-Fa-f]{8})$").expect("hex color pattern is valid")
});

static VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+\.\d+\.\d+(-[A-Za-z0-9]+)?$").expect("version pattern is valid")
});

pub(crate) type RuleCheck = fn(&Value) -> Result<(), String>;

#[derive(Debug, Clone)]
pub(crate) struct ValidationRule {
    pub path: &'static str,
    /// Absent or null values raise "<path> is required".
    pub required: bool,
    pub severity: Severity,
    pub check: Option<RuleCheck>,
    pub fix: Option<&'static str>,
}

impl ValidationRule {
    pub(crate) fn evaluate(&self, tree: &Tree) -> Option<ValidationIssue> {
        let value = tree::lookup(tree, self.path).filter(|v| !v.is_null());

        match value {
            None if self.required => Some(ValidationIssue::new(
                IssueKind::Required,
                self.path,
                format!("{} is required", self.path),
                self.severity,
            )),
            None => None,
            Some(value) => {
                let check = self.check?;
                let message = check(value).err()?;
                let issue = ValidationIssue::new(IssueKind::Rule, self.path, message, self.severity);
                Some(match self.fix {
                    Some(fix) => issue.with_fix(fix),
                    None => issue,
                })
            }
        }
    }
}

fn non_empty_version(value: &Value) -> Result<(), String> {
    match value.as_str() {
        Some(s) if !s.is_empty() => Ok(()),
        _ => Err("version must be a non-empty string".to_string()),
    }
}

fn shell_specified(value: &Value) -> Result<(), String> {
    match value.as_str() {
        Some(s) if !s.is_empty() => Ok(()),
        _ => Err("shell must be specified".to_string()),
    }
}

/// Only judges non-empty strings; emptiness is `non_empty_version`'s call.
fn version_pattern(value: &Value) -> Result<(), String> {
    match value.as_str() {
        Some(s) if !s.is_empty() && !VERSION.is_match(s) => {
            Err(format!("Version '{}' is not of the form MAJOR.MINOR.PATCH", s))
        }
        _ => Ok(()),
    }
}

pub(crate) fn builtin_rules() -> Vec<ValidationRule> {
    vec![
        ValidationRule {
            path: "version",
            required: true,
            severity: Severity::Error,
            check: Some(non_empty_version),
            fix: None,
        },
        ValidationRule {
            path: "system.shell",
            required: true,
            severity: Severity::Error,
            check: Some(shell_specified),
            fix: None,
        },
        ValidationRule {
            path: "version",
            required: false,
            severity: Severity::Warning,
            check: Some(version_pattern),
            fix: Some("Use a semantic version such as 1.0.0"),
        },
    ]
}
