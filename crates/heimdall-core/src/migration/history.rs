//! Durable migration history.
//!
//! The whole list is re-read at startup and rewritten after every append.
//! History is informational only; failing to persist it never fails a
//! migration.

use std::path::Path;

use super::types::MigrationRecord;
use crate::persistence;

pub(crate) fn load_history(path: &Path) -> Vec<MigrationRecord> {
    let content = match std::fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            tracing::warn!(
                event = "core.migration.history_load_failed",
                path = %path.display(),
                error = %e
            );
            return Vec::new();
        }
    };

    match serde_json::from_slice(&content) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(
                event = "core.migration.history_parse_failed",
                path = %path.display(),
                error = %e,
                "Migration history is corrupted; starting a fresh log"
            );
            Vec::new()
        }
    }
}

pub(crate) fn save_history(path: &Path, records: &[MigrationRecord]) {
    let bytes = match serde_json::to_vec_pretty(records) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(
                event = "core.migration.history_serialize_failed",
                error = %e
            );
            return;
        }
    };

    if let Err(e) = persistence::write_atomic(path, &bytes) {
        tracing::warn!(
            event = "core.migration.history_save_failed",
            path = %path.display(),
            error = %e
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn record(success: bool) -> MigrationRecord {
        MigrationRecord {
            from: "0.9.0".to_string(),
            to: "1.0.0".to_string(),
            timestamp: Utc::now(),
            backup: None,
            success,
        }
    }

    #[test]
    fn test_missing_history_is_empty() {
        let temp = TempDir::new().unwrap();
        assert!(load_history(&temp.path().join("migration-history.json")).is_empty());
    }

    #[test]
    fn test_history_survives_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("backups/migration-history.json");

        let records = vec![record(false), record(true)];
        save_history(&path, &records);

        assert_eq!(load_history(&path), records);
    }

    #[test]
    fn test_corrupt_history_is_empty() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("migration-history.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(load_history(&path).is_empty());
    }
}
