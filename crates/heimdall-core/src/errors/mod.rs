use std::error::Error;
use std::path::PathBuf;

use crate::injection::errors::InjectionError;
use crate::migration::errors::MigrationError;
use crate::tree::errors::TreeError;
use crate::validation::ValidationIssue;

/// Base trait for all heimdall errors
pub trait HeimdallError: Error + Send + Sync + 'static {
    /// Error code for programmatic handling
    fn error_code(&self) -> &'static str;

    /// Whether this error should be logged as an error or warning
    fn is_user_error(&self) -> bool {
        false
    }
}

/// Common result type for the library
pub type HeimdallResult<T> = Result<T, Box<dyn HeimdallError>>;

/// Errors surfaced by [`crate::manager::ConfigManager`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration has {} blocking issue(s): {}", blocking_count(issues), first_message(issues))]
    Validation { issues: Vec<ValidationIssue> },

    #[error("Migration failed: {source}")]
    Migration {
        #[from]
        source: MigrationError,
    },

    #[error("Default injection failed: {source}")]
    Injection {
        #[from]
        source: InjectionError,
    },

    #[error("Tree operation failed: {source}")]
    Tree {
        #[from]
        source: TreeError,
    },

    #[error("IO error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {message}")]
    Parse { message: String },

    #[error("Failed to persist migrated configuration ({message}); restored backup {}", backup.display())]
    MigrationRolledBack { message: String, backup: PathBuf },

    #[error(
        "Failed to persist migrated configuration ({original}) and rollback also failed ({rollback}). Manual intervention required"
    )]
    RollbackFailed { original: String, rollback: String },

    #[error("Legacy configuration at '{}' could not be migrated: {message}", path.display())]
    Legacy { path: PathBuf, message: String },

    #[error("Configuration already exists at '{}'. Use --force to overwrite", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("Unknown profile '{name}'. Available: {}", crate::config::available_profiles().join(", "))]
    UnknownProfile { name: String },
}

fn blocking_count(issues: &[ValidationIssue]) -> usize {
    issues.iter().filter(|issue| issue.severity.is_blocking()).count()
}

fn first_message(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .find(|issue| issue.severity.is_blocking())
        .or_else(|| issues.first())
        .map(|issue| format!("{}: {}", issue.path, issue.message))
        .unwrap_or_default()
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error is an IO error for a file that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ConfigError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

impl HeimdallError for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            ConfigError::Validation { .. } => "CONFIG_VALIDATION_FAILED",
            ConfigError::Migration { .. } => "CONFIG_MIGRATION_FAILED",
            ConfigError::Injection { .. } => "CONFIG_INJECTION_FAILED",
            ConfigError::Tree { .. } => "CONFIG_TREE_ERROR",
            ConfigError::Io { .. } => "CONFIG_IO_ERROR",
            ConfigError::Parse { .. } => "CONFIG_PARSE_ERROR",
            ConfigError::MigrationRolledBack { .. } => "CONFIG_MIGRATION_ROLLED_BACK",
            ConfigError::RollbackFailed { .. } => "CONFIG_ROLLBACK_FAILED",
            ConfigError::Legacy { .. } => "CONFIG_LEGACY_MIGRATION_FAILED",
            ConfigError::AlreadyExists { .. } => "CONFIG_ALREADY_EXISTS",
            ConfigError::UnknownProfile { .. } => "CONFIG_UNKNOWN_PROFILE",
        }
    }

    fn is_user_error(&self) -> bool {
        match self {
            ConfigError::Validation { .. }
            | ConfigError::Parse { .. }
            | ConfigError::AlreadyExists { .. }
            | ConfigError::UnknownProfile { .. } => true,
            ConfigError::Migration { source } => source.is_user_error(),
            ConfigError::Tree { source } => source.is_user_error(),
            _ => false,
        }
    }
}
