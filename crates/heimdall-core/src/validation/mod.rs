mod rules;
pub mod types;
pub mod validator;

pub use types::{
    IssueKind, IssueSummary, Severity, SuggestedFix, ValidationIssue, has_blocking_issues,
};
pub use validator::SchemaValidator;
