//! Validation issue types.

use serde::{Deserialize, Serialize};

/// How serious a validation issue is.
///
/// Ordered so that `Warning < Error < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }

    /// Error and Critical block a save; Warning is advisory.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Severity::Error | Severity::Critical)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which family of check produced an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Required,
    Range,
    Enum,
    Conflict,
    Duplicate,
    Pattern,
    Conditional,
    /// Raised by an entry of the declarative rule table.
    Rule,
}

/// A suggested remedy attached to an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedFix {
    pub description: String,
    /// Example command that applies the fix, if there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    pub auto_fix: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub path: String,
    pub message: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fix: Option<SuggestedFix>,
}

impl ValidationIssue {
    pub fn new(
        kind: IssueKind,
        path: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
            severity,
            fix: None,
        }
    }

    pub fn with_fix(mut self, description: impl Into<String>) -> Self {
        self.fix = Some(SuggestedFix {
            description: description.into(),
            command: None,
            auto_fix: false,
        });
        self
    }

    /// Attach an auto-fixable suggestion with the command that applies it.
    pub fn with_auto_fix(
        mut self,
        description: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        self.fix = Some(SuggestedFix {
            description: description.into(),
            command: Some(command.into()),
            auto_fix: true,
        });
        self
    }
}

/// Check whether any issue would block a save.
pub fn has_blocking_issues(issues: &[ValidationIssue]) -> bool {
    issues.iter().any(|issue| issue.severity.is_blocking())
}

/// Per-severity issue counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IssueSummary {
    pub critical: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl IssueSummary {
    pub fn from_issues(issues: &[ValidationIssue]) -> Self {
        let mut summary = Self::default();
        for issue in issues {
            match issue.severity {
                Severity::Critical => summary.critical += 1,
                Severity::Error => summary.errors += 1,
                Severity::Warning => summary.warnings += 1,
            }
        }
        summary
    }

    pub fn is_blocking(&self) -> bool {
        self.critical > 0 || self.errors > 0
    }
}

impl std::fmt::Display for IssueSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} critical, {} errors, {} warnings",
            self.critical, self.errors, self.warnings
        )
    }
}
