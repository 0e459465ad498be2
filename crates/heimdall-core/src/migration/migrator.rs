//! Runs migration paths against a document.
//!
//! One backup is written before the first edge of a run: the document file
//! exactly as it sits on disk, or the encoded document when no file exists
//! yet. If an edge's apply step fails the run stops; edges already applied are
//! not undone in memory, and [`VersionMigrator::rollback`] restores the
//! pre-run bytes on disk.

use chrono::Utc;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use super::errors::MigrationError;
use super::history::{load_history, save_history};
use super::registry::{Migration, MigrationRegistry};
use super::types::MigrationRecord;
use crate::config::{CURRENT_SCHEMA_VERSION, ManagerPaths, ShellConfiguration, encode};
use crate::persistence;
use crate::tree;

#[derive(Debug)]
pub struct VersionMigrator {
    registry: MigrationRegistry,
    config_path: PathBuf,
    backup_dir: PathBuf,
    history_path: PathBuf,
    history: Vec<MigrationRecord>,
    last_backup: Option<PathBuf>,
    /// Edges applied by the most recent successful run, in order.
    last_run: Vec<Migration>,
}

impl VersionMigrator {
    pub fn new(paths: &ManagerPaths) -> Self {
        Self::with_registry(paths, MigrationRegistry::builtin())
    }

    pub fn with_registry(paths: &ManagerPaths, registry: MigrationRegistry) -> Self {
        let history_path = paths.history_path();
        let history = load_history(&history_path);
        // A previous process's snapshot stays available for rollback.
        let last_backup = history.iter().rev().find_map(|r| r.backup.clone());

        Self {
            registry,
            config_path: paths.config_path.clone(),
            backup_dir: paths.backup_dir.clone(),
            history_path,
            history,
            last_backup,
            last_run: Vec::new(),
        }
    }

    /// Migrate to the current schema version.
    pub fn migrate(
        &mut self,
        config: &ShellConfiguration,
    ) -> Result<ShellConfiguration, MigrationError> {
        self.migrate_to_version(config, CURRENT_SCHEMA_VERSION)
    }

    /// Migrate along the shortest registered path to `target`.
    ///
    /// Returns the migrated document; `config` itself is not modified.
    pub fn migrate_to_version(
        &mut self,
        config: &ShellConfiguration,
        target: &str,
    ) -> Result<ShellConfiguration, MigrationError> {
        let from = config.version.clone();
        let path: Vec<Migration> = self
            .registry
            .find_path(&from, target)?
            .into_iter()
            .cloned()
            .collect();

        if path.is_empty() {
            info!(
                event = "core.migration.already_current",
                version = %from
            );
            return Ok(config.clone());
        }

        info!(
            event = "core.migration.started",
            from = %from,
            to = %target,
            steps = path.len()
        );

        let backup = self.write_backup(config)?;
        let mut tree = tree::to_tree(config)?;
        let mut applied = Vec::with_capacity(path.len());

        for edge in &path {
            if let Err(message) = (edge.validate)(&tree) {
                warn!(
                    event = "core.migration.precondition_failed",
                    from = edge.from,
                    to = edge.to,
                    error = %message
                );
                return Err(MigrationError::PreconditionFailed {
                    from: edge.from.to_string(),
                    to: edge.to.to_string(),
                    message,
                });
            }

            if let Err(message) = (edge.apply)(&mut tree) {
                error!(
                    event = "core.migration.step_failed",
                    from = edge.from,
                    to = edge.to,
                    error = %message
                );
                self.record(edge, &backup, false);
                return Err(MigrationError::ApplyFailed {
                    from: edge.from.to_string(),
                    to: edge.to.to_string(),
                    message,
                });
            }

            tree.insert("version".to_string(), Value::from(edge.to));
            self.record(edge, &backup, true);
            applied.push(edge.clone());

            info!(
                event = "core.migration.step_applied",
                from = edge.from,
                to = edge.to,
                description = edge.description
            );
        }

        let migrated = tree::from_tree(tree)?;
        self.last_run = applied;

        info!(
            event = "core.migration.completed",
            from = %from,
            to = %migrated.version,
            backup = %backup.display()
        );

        Ok(migrated)
    }

    /// Restore the pre-run backup over the live document.
    pub fn rollback(&mut self) -> Result<PathBuf, MigrationError> {
        let backup = self.last_backup.clone().ok_or(MigrationError::NoBackup)?;

        let restore = std::fs::read(&backup)
            .and_then(|bytes| persistence::write_atomic(&self.config_path, &bytes));
        if let Err(source) = restore {
            error!(
                event = "core.migration.rollback_failed",
                backup = %backup.display(),
                error = %source
            );
            return Err(MigrationError::RollbackFailed { backup, source });
        }

        self.last_run.clear();
        info!(
            event = "core.migration.rollback_completed",
            backup = %backup.display(),
            path = %self.config_path.display()
        );
        Ok(backup)
    }

    /// Undo the last successful run in memory, edge by edge in reverse.
    pub fn revert(
        &mut self,
        config: &ShellConfiguration,
    ) -> Result<ShellConfiguration, MigrationError> {
        let Some(last) = self.last_run.last() else {
            return Err(MigrationError::NothingToRevert);
        };
        if config.version != last.to {
            return Err(MigrationError::RevertFailed {
                from: last.from.to_string(),
                to: last.to.to_string(),
                message: format!(
                    "document is at version '{}', expected '{}'",
                    config.version, last.to
                ),
            });
        }

        let mut tree = tree::to_tree(config)?;
        for edge in self.last_run.iter().rev() {
            (edge.rollback)(&mut tree).map_err(|message| MigrationError::RevertFailed {
                from: edge.from.to_string(),
                to: edge.to.to_string(),
                message,
            })?;
            tree.insert("version".to_string(), Value::from(edge.from));
        }

        let reverted = tree::from_tree(tree)?;
        self.last_run.clear();

        info!(
            event = "core.migration.reverted",
            version = %reverted.version
        );
        Ok(reverted)
    }

    pub fn available_versions(&self) -> Vec<String> {
        self.registry.versions()
    }

    pub fn history(&self) -> &[MigrationRecord] {
        &self.history
    }

    pub fn last_backup(&self) -> Option<&Path> {
        self.last_backup.as_deref()
    }

    /// Bytes the pre-run backup must hold.
    fn snapshot(&self, config: &ShellConfiguration) -> Result<Vec<u8>, MigrationError> {
        match std::fs::read(&self.config_path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                encode(config).map_err(|e| MigrationError::Encode {
                    message: e.to_string(),
                })
            }
            Err(source) => Err(MigrationError::Snapshot {
                path: self.config_path.clone(),
                source,
            }),
        }
    }

    fn write_backup(&mut self, config: &ShellConfiguration) -> Result<PathBuf, MigrationError> {
        let bytes = self.snapshot(config)?;
        let version = if config.version.is_empty() {
            "unknown"
        } else {
            config.version.as_str()
        };
        let stem = format!("migration-{}-{}", version, persistence::backup_timestamp());

        let path = persistence::write_backup(&self.backup_dir, &stem, &bytes).map_err(|source| {
            MigrationError::Backup {
                dir: self.backup_dir.clone(),
                source,
            }
        })?;

        info!(
            event = "core.migration.backup_created",
            path = %path.display()
        );
        self.last_backup = Some(path.clone());
        Ok(path)
    }

    fn record(&mut self, edge: &Migration, backup: &Path, success: bool) {
        self.history.push(MigrationRecord {
            from: edge.from.to_string(),
            to: edge.to.to_string(),
            timestamp: Utc::now(),
            backup: Some(backup.to_path_buf()),
            success,
        });
        save_history(&self.history_path, &self.history);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::profile_defaults;
    use crate::tree::Tree;
    use serde_json::json;
    use tempfile::TempDir;

    fn paths(temp: &TempDir) -> ManagerPaths {
        ManagerPaths::under(temp.path())
    }

    fn legacy_document() -> ShellConfiguration {
        serde_json::from_value(json!({
            "version": "0.9.0",
            "metadata": {"profile": "default"},
            "system": {"shell": "zsh", "terminal": "foot"},
            "panel": {"position": "bottom", "height": 28},
        }))
        .unwrap()
    }

    fn ok(_: &Tree) -> Result<(), String> {
        Ok(())
    }

    fn noop(_: &mut Tree) -> Result<(), String> {
        Ok(())
    }

    fn fail(_: &mut Tree) -> Result<(), String> {
        Err("boom".to_string())
    }

    fn reject(_: &Tree) -> Result<(), String> {
        Err("not ready".to_string())
    }

    fn mark(tree: &mut Tree) -> Result<(), String> {
        tree.insert("marked".to_string(), json!(true));
        Ok(())
    }

    fn unmark(tree: &mut Tree) -> Result<(), String> {
        tree.remove("marked");
        Ok(())
    }

    fn edge(
        from: &'static str,
        to: &'static str,
        validate: fn(&Tree) -> Result<(), String>,
        apply: fn(&mut Tree) -> Result<(), String>,
        rollback: fn(&mut Tree) -> Result<(), String>,
    ) -> Migration {
        Migration {
            from,
            to,
            description: "test",
            validate,
            apply,
            rollback,
        }
    }

    #[test]
    fn test_migrate_legacy_document() {
        let temp = TempDir::new().unwrap();
        let mut migrator = VersionMigrator::new(&paths(&temp));

        let migrated = migrator.migrate(&legacy_document()).unwrap();

        assert_eq!(migrated.version, "1.0.0");
        assert!(!migrated.extra.contains_key("panel"));
        assert_eq!(migrated.bar.position.as_deref(), Some("bottom"));
        assert_eq!(migrated.bar.height, Some(28));
        assert_eq!(migrated.hot_reload.enabled, Some(true));
        assert_eq!(migrated.metadata.extra["migrationVersion"], "1.0.0");
        assert_eq!(migrated.system.shell.as_deref(), Some("zsh"));

        let backup = migrator.last_backup().unwrap();
        let name = backup.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("migration-0.9.0-"), "{}", name);

        assert_eq!(migrator.history().len(), 1);
        assert!(migrator.history()[0].success);
    }

    #[test]
    fn test_already_current_is_noop() {
        let temp = TempDir::new().unwrap();
        let mut migrator = VersionMigrator::new(&paths(&temp));
        let config = profile_defaults("default");

        let migrated = migrator.migrate(&config).unwrap();
        assert_eq!(migrated, config);
        assert!(migrator.last_backup().is_none());
        assert!(migrator.history().is_empty());
    }

    #[test]
    fn test_no_path_takes_no_backup() {
        let temp = TempDir::new().unwrap();
        let mut migrator = VersionMigrator::new(&paths(&temp));
        let mut config = profile_defaults("default");
        config.version = "0.5.0".to_string();

        let err = migrator.migrate(&config).unwrap_err();
        assert!(matches!(err, MigrationError::NoPath { .. }));
        assert!(migrator.last_backup().is_none());
    }

    #[test]
    fn test_apply_failure_records_and_stops() {
        let temp = TempDir::new().unwrap();
        let registry = MigrationRegistry::new(vec![
            edge("1.0.0", "1.1.0", ok, mark, unmark),
            edge("1.1.0", "1.2.0", ok, fail, noop),
            edge("1.2.0", "1.3.0", ok, mark, unmark),
        ])
        .unwrap();
        let mut migrator = VersionMigrator::with_registry(&paths(&temp), registry);

        let err = migrator
            .migrate_to_version(&profile_defaults("default"), "1.3.0")
            .unwrap_err();

        assert!(matches!(err, MigrationError::ApplyFailed { ref from, .. } if from == "1.1.0"));
        let history = migrator.history();
        assert_eq!(history.len(), 2);
        assert!(history[0].success);
        assert!(!history[1].success);
        assert!(migrator.last_backup().is_some());
    }

    #[test]
    fn test_precondition_failure_records_nothing() {
        let temp = TempDir::new().unwrap();
        let registry =
            MigrationRegistry::new(vec![edge("1.0.0", "1.1.0", reject, mark, unmark)]).unwrap();
        let mut migrator = VersionMigrator::with_registry(&paths(&temp), registry);

        let err = migrator
            .migrate_to_version(&profile_defaults("default"), "1.1.0")
            .unwrap_err();
        assert!(matches!(err, MigrationError::PreconditionFailed { .. }));
        assert!(migrator.history().is_empty());
    }

    #[test]
    fn test_history_is_persisted_and_reloaded() {
        let temp = TempDir::new().unwrap();
        let mut migrator = VersionMigrator::new(&paths(&temp));
        migrator.migrate(&legacy_document()).unwrap();

        let reloaded = VersionMigrator::new(&paths(&temp));
        assert_eq!(reloaded.history(), migrator.history());
        assert_eq!(reloaded.last_backup(), migrator.last_backup());
        assert!(temp.path().join("heimdall/backups/migration-history.json").exists());
    }

    #[test]
    fn test_rollback_restores_backup_bytes() {
        let temp = TempDir::new().unwrap();
        let paths = paths(&temp);
        let original = encode(&legacy_document()).unwrap();
        persistence::write_atomic(&paths.config_path, &original).unwrap();

        let mut migrator = VersionMigrator::new(&paths);
        let migrated = migrator.migrate(&legacy_document()).unwrap();
        persistence::write_atomic(&paths.config_path, &encode(&migrated).unwrap()).unwrap();

        migrator.rollback().unwrap();
        assert_eq!(std::fs::read(&paths.config_path).unwrap(), original);
    }

    #[test]
    #[test]
    fn test_backup_holds_file_bytes_not_reencoding() {
        let temp = TempDir::new().unwrap();
        let paths = paths(&temp);
        let original = br#"{"version":"0.9.0","system":{"shell":"zsh"},"panel":{"height":28}}"#;
        std::fs::create_dir_all(paths.config_path.parent().unwrap()).unwrap();
        std::fs::write(&paths.config_path, original).unwrap();
        let config: ShellConfiguration = serde_json::from_slice(original).unwrap();

        let mut migrator = VersionMigrator::new(&paths);
        let migrated = migrator.migrate(&config).unwrap();
        assert_eq!(
            std::fs::read(migrator.last_backup().unwrap()).unwrap(),
            original
        );

        persistence::write_atomic(&paths.config_path, &encode(&migrated).unwrap()).unwrap();
        migrator.rollback().unwrap();
        assert_eq!(std::fs::read(&paths.config_path).unwrap(), original);
    }

    #[test]
    fn test_rollback_without_backup() {
        let temp = TempDir::new().unwrap();
        let mut migrator = VersionMigrator::new(&paths(&temp));
        assert!(matches!(
            migrator.rollback().unwrap_err(),
            MigrationError::NoBackup
        ));
    }

    #[test]
    fn test_revert_multi_step_run() {
        let temp = TempDir::new().unwrap();
        let registry = MigrationRegistry::new(vec![
            edge("1.0.0", "1.1.0", ok, mark, unmark),
            edge("1.1.0", "1.2.0", ok, noop, noop),
        ])
        .unwrap();
        let mut migrator = VersionMigrator::with_registry(&paths(&temp), registry);
        let config = profile_defaults("default");

        let migrated = migrator.migrate_to_version(&config, "1.2.0").unwrap();
        assert_eq!(migrated.version, "1.2.0");
        assert_eq!(migrated.extra["marked"], true);

        let reverted = migrator.revert(&migrated).unwrap();
        assert_eq!(reverted, config);
        assert!(matches!(
            migrator.revert(&reverted).unwrap_err(),
            MigrationError::NothingToRevert
        ));
    }

    #[test]
    fn test_revert_rejects_other_version() {
        let temp = TempDir::new().unwrap();
        let mut migrator = VersionMigrator::new(&paths(&temp));
        migrator.migrate(&legacy_document()).unwrap();

        let err = migrator.revert(&legacy_document()).unwrap_err();
        assert!(matches!(err, MigrationError::RevertFailed { .. }));
    }

    #[test]
    fn test_backup_failure_is_fatal() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();
        let paths = ManagerPaths::new(
            temp.path().join("shell.json"),
            blocker.join("backups"),
            temp.path().join("legacy.json"),
        );
        let mut migrator = VersionMigrator::new(&paths);

        let err = migrator.migrate(&legacy_document()).unwrap_err();
        assert!(matches!(err, MigrationError::Backup { .. }));
        assert!(migrator.history().is_empty());
    }

    #[test]
    fn test_available_versions() {
        let temp = TempDir::new().unwrap();
        let migrator = VersionMigrator::new(&paths(&temp));
        assert_eq!(migrator.available_versions(), vec!["0.9.0", "1.0.0"]);
    }
}
