use std::path::PathBuf;

use crate::errors::HeimdallError;
use crate::tree::errors::TreeError;

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("No migration path from version '{from}' to '{to}'")]
    NoPath { from: String, to: String },

    #[error("Migration {from} -> {to} cannot run: {message}")]
    PreconditionFailed {
        from: String,
        to: String,
        message: String,
    },

    #[error("Migration {from} -> {to} failed: {message}")]
    ApplyFailed {
        from: String,
        to: String,
        message: String,
    },

    #[error("Duplicate migration registered for {from} -> {to}")]
    DuplicateEdge { from: String, to: String },

    #[error("Failed to write pre-migration backup in '{}': {source}", dir.display())]
    Backup {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read '{}' for the pre-migration backup: {source}", path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No migration backup is available to roll back to")]
    NoBackup,

    #[error("Rollback from '{}' failed: {source}", backup.display())]
    RollbackFailed {
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Reverting migration {from} -> {to} failed: {message}")]
    RevertFailed {
        from: String,
        to: String,
        message: String,
    },

    #[error("No completed migration run to revert")]
    NothingToRevert,

    #[error("Migration tree conversion failed: {source}")]
    Tree {
        #[from]
        source: TreeError,
    },

    #[error("Failed to serialize configuration for backup: {message}")]
    Encode { message: String },
}

impl HeimdallError for MigrationError {
    fn error_code(&self) -> &'static str {
        match self {
            MigrationError::NoPath { .. } => "MIGRATION_NO_PATH",
            MigrationError::PreconditionFailed { .. } => "MIGRATION_PRECONDITION_FAILED",
            MigrationError::ApplyFailed { .. } => "MIGRATION_APPLY_FAILED",
            MigrationError::DuplicateEdge { .. } => "MIGRATION_DUPLICATE_EDGE",
            MigrationError::Backup { .. } => "MIGRATION_BACKUP_FAILED",
            MigrationError::Snapshot { .. } => "MIGRATION_SNAPSHOT_FAILED",
            MigrationError::NoBackup => "MIGRATION_NO_BACKUP",
            MigrationError::RollbackFailed { .. } => "MIGRATION_ROLLBACK_FAILED",
            MigrationError::RevertFailed { .. } => "MIGRATION_REVERT_FAILED",
            MigrationError::NothingToRevert => "MIGRATION_NOTHING_TO_REVERT",
            MigrationError::Tree { .. } => "MIGRATION_TREE_ERROR",
            MigrationError::Encode { .. } => "MIGRATION_ENCODE_FAILED",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            MigrationError::NoPath { .. }
                | MigrationError::PreconditionFailed { .. }
                | MigrationError::NoBackup
                | MigrationError::NothingToRevert
        )
    }
}
