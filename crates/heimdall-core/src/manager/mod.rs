//! Lifecycle of the on-disk shell configuration.
//!
//! [`ConfigManager`] ties the validator, injector and migrator to a single
//! document on disk. Reads go through a short-lived cache; every write path
//! takes the storage lock exclusively, so at most one save, migration or
//! injection touches the file at a time.

mod cache;
mod legacy;

pub use cache::DEFAULT_CACHE_TTL;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::defaults::DEFAULT_PROFILE;
use crate::config::{
    MANAGED_BY, ManagerPaths, ShellConfiguration, decode, encode, is_known_profile,
    profile_defaults,
};
use crate::errors::ConfigError;
use crate::injection::{InjectionReport, PropertyInjector};
use crate::migration::{MigrationRecord, VersionMigrator};
use crate::persistence;
use crate::tree;
use crate::validation::{SchemaValidator, ValidationIssue, has_blocking_issues};
use cache::{ConfigCache, FileStamp};

/// Stem of the backups taken before every save and migration.
const BACKUP_STEM: &str = "shell";

/// What [`ConfigManager::initialize`] found or did on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// A document was already in place.
    Existing,
    /// The legacy document was imported.
    LegacyImported,
    /// A profile was written because nothing existed.
    ProfileWritten,
}

#[derive(Debug)]
pub struct ConfigManager {
    paths: ManagerPaths,
    validator: SchemaValidator,
    injector: PropertyInjector,
    migrator: Mutex<VersionMigrator>,
    cache: RwLock<Option<ConfigCache>>,
    /// Shared for reads of the file, exclusive for writes.
    io_lock: RwLock<()>,
    cache_ttl: Duration,
}

impl ConfigManager {
    pub fn new(paths: ManagerPaths) -> Result<Self, ConfigError> {
        let injector = PropertyInjector::new()?;
        let migrator = VersionMigrator::new(&paths);

        Ok(Self {
            validator: SchemaValidator::new(),
            injector,
            migrator: Mutex::new(migrator),
            cache: RwLock::new(None),
            io_lock: RwLock::new(()),
            cache_ttl: DEFAULT_CACHE_TTL,
            paths,
        })
    }

    /// Manager over the paths resolved from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(ManagerPaths::resolve())
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn paths(&self) -> &ManagerPaths {
        &self.paths
    }

    pub fn config_path(&self) -> &Path {
        &self.paths.config_path
    }

    pub fn exists(&self) -> bool {
        self.paths.config_path.exists()
    }

    /// Bring the configuration on disk into a usable state.
    ///
    /// Imports the legacy document if present, writes the default profile
    /// when nothing exists, then loads and validates. Validation findings are
    /// logged, never returned as errors.
    pub fn initialize(&self) -> Result<InitOutcome, ConfigError> {
        self.initialize_with_profile(DEFAULT_PROFILE)
    }

    /// Like [`ConfigManager::initialize`], writing `profile` when neither a
    /// document nor a legacy document exists.
    pub fn initialize_with_profile(&self, profile: &str) -> Result<InitOutcome, ConfigError> {
        if !is_known_profile(profile) {
            return Err(ConfigError::UnknownProfile {
                name: profile.to_string(),
            });
        }

        let _guard = write_lock(&self.io_lock);
        info!(
            event = "core.config.initialize_started",
            path = %self.paths.config_path.display(),
            profile = profile
        );

        let mut outcome = InitOutcome::Existing;
        match self.import_legacy() {
            Ok(true) => outcome = InitOutcome::LegacyImported,
            Ok(false) => {}
            Err(e) => warn!(event = "core.config.legacy_migration_failed", error = %e),
        }

        if !self.paths.config_path.exists() {
            let mut config = profile_defaults(profile);
            stamp(&mut config);
            self.persist(&config)?;
            outcome = InitOutcome::ProfileWritten;
            info!(
                event = "core.config.defaults_written",
                path = %self.paths.config_path.display(),
                profile = profile
            );
        }

        let (config, file_stamp) = self.read_stamped()?;
        let issues = self.validator.validate(&config);
        for issue in &issues {
            warn!(
                event = "core.config.validation_issue",
                path = %issue.path,
                severity = %issue.severity,
                message = %issue.message
            );
        }

        *write_lock(&self.cache) = Some(ConfigCache::new(
            Arc::new(config),
            file_stamp,
            self.cache_ttl,
        ));
        info!(
            event = "core.config.initialize_completed",
            outcome = ?outcome,
            issues = issues.len()
        );
        Ok(outcome)
    }

    /// The current document, served from the cache while it is fresh.
    pub fn load(&self) -> Result<Arc<ShellConfiguration>, ConfigError> {
        let _guard = read_lock(&self.io_lock);
        self.load_locked()
    }

    /// [`ConfigManager::load`] for callers already holding the storage lock.
    fn load_locked(&self) -> Result<Arc<ShellConfiguration>, ConfigError> {
        {
            let cache = read_lock(&self.cache);
            if let Some(cached) = cache.as_ref()
                && cached.is_fresh(&self.paths.config_path)
            {
                debug!(event = "core.config.cache_hit");
                return Ok(Arc::clone(&cached.document));
            }
        }

        let (config, file_stamp) = self.read_stamped()?;
        let config = Arc::new(config);
        *write_lock(&self.cache) = Some(ConfigCache::new(
            Arc::clone(&config),
            file_stamp,
            self.cache_ttl,
        ));
        debug!(
            event = "core.config.load_completed",
            path = %self.paths.config_path.display(),
            version = %config.version
        );
        Ok(config)
    }

    pub fn validate(&self, config: &ShellConfiguration) -> Vec<ValidationIssue> {
        self.validator.validate(config)
    }

    /// Validate, back up the current file, stamp metadata and persist.
    ///
    /// Blocking issues reject the save without touching the file. On success
    /// `config` carries the stamped metadata that was written.
    pub fn save(&self, config: &mut ShellConfiguration) -> Result<(), ConfigError> {
        let _guard = write_lock(&self.io_lock);
        self.save_locked(config)
    }

    fn save_locked(&self, config: &mut ShellConfiguration) -> Result<(), ConfigError> {
        let issues = self.validator.validate(config);
        if has_blocking_issues(&issues) {
            warn!(
                event = "core.config.save_rejected",
                issues = issues.len()
            );
            return Err(ConfigError::Validation { issues });
        }

        if let Err(e) = self.backup_current() {
            warn!(event = "core.config.backup_failed", error = %e);
        }

        stamp(config);
        self.persist(config)?;
        info!(
            event = "core.config.save_completed",
            path = %self.paths.config_path.display()
        );
        Ok(())
    }

    /// Migrate to the current schema version and persist the result.
    pub fn migrate(&self, config: &ShellConfiguration) -> Result<ShellConfiguration, ConfigError> {
        self.migrate_to_version(config, crate::config::CURRENT_SCHEMA_VERSION)
    }

    /// Migrate to `target` and persist the result.
    ///
    /// The pre-migration backup is mandatory. If the migrated document cannot
    /// be written, the migrator's snapshot is restored over the file.
    pub fn migrate_to_version(
        &self,
        config: &ShellConfiguration,
        target: &str,
    ) -> Result<ShellConfiguration, ConfigError> {
        let _guard = write_lock(&self.io_lock);
        info!(
            event = "core.config.migrate_started",
            from = %config.version,
            to = target
        );

        if config.version == target {
            info!(event = "core.config.migrate_skipped", version = target);
            return Ok(config.clone());
        }

        self.backup_current()?;

        let mut migrator = lock(&self.migrator);
        let mut migrated = migrator.migrate_to_version(config, target)?;
        stamp(&mut migrated);

        if let Err(persist_error) = self.persist(&migrated) {
            error!(
                event = "core.config.migrate_persist_failed",
                error = %persist_error
            );
            self.invalidate_cache();
            return Err(match migrator.rollback() {
                Ok(backup) => ConfigError::MigrationRolledBack {
                    message: persist_error.to_string(),
                    backup,
                },
                Err(rollback_error) => ConfigError::RollbackFailed {
                    original: persist_error.to_string(),
                    rollback: rollback_error.to_string(),
                },
            });
        }

        info!(
            event = "core.config.migrate_completed",
            from = %config.version,
            to = %migrated.version
        );
        Ok(migrated)
    }

    /// Fill in missing defaults and persist the result.
    pub fn inject_defaults(
        &self,
        config: &mut ShellConfiguration,
    ) -> Result<InjectionReport, ConfigError> {
        let _guard = write_lock(&self.io_lock);

        if let Err(e) = self.backup_current() {
            warn!(event = "core.config.backup_failed", error = %e);
        }

        let report = self.injector.inject_defaults(config)?;
        self.persist(config)?;
        info!(
            event = "core.config.inject_completed",
            injected = report.injected.len(),
            skipped_locked = report.skipped_locked.len()
        );
        Ok(report)
    }

    /// Restore the snapshot taken before the last migration.
    pub fn rollback(&self) -> Result<PathBuf, ConfigError> {
        let _guard = write_lock(&self.io_lock);
        let backup = lock(&self.migrator).rollback()?;
        self.invalidate_cache();
        Ok(backup)
    }

    pub fn history(&self) -> Vec<MigrationRecord> {
        lock(&self.migrator).history().to_vec()
    }

    pub fn available_versions(&self) -> Vec<String> {
        lock(&self.migrator).available_versions()
    }

    /// Value at a dotted path of the current document.
    pub fn get(&self, path: &str) -> Result<Option<Value>, ConfigError> {
        let config = self.load()?;
        Ok(tree::get_value(&config, path)?)
    }

    /// Set a dotted path on the current document and save it.
    pub fn set(&self, path: &str, value: Value) -> Result<ShellConfiguration, ConfigError> {
        self.update(|config| Ok(tree::set_value(config, path, value)?))
    }

    /// Add `path` to the document's locks without persisting.
    pub fn set_user_lock(&self, config: &mut ShellConfiguration, path: &str) {
        self.injector.set_user_lock(config, path);
    }

    pub fn remove_user_lock(&self, config: &mut ShellConfiguration, path: &str) {
        self.injector.remove_user_lock(config, path);
    }

    /// Pin `path` on the stored document so injection never overwrites it.
    pub fn lock_path(&self, path: &str) -> Result<(), ConfigError> {
        tree::split_path(path)?;
        self.update(|config| {
            self.set_user_lock(config, path);
            Ok(())
        })?;
        Ok(())
    }

    pub fn unlock_path(&self, path: &str) -> Result<(), ConfigError> {
        self.update(|config| {
            self.remove_user_lock(config, path);
            Ok(())
        })?;
        Ok(())
    }

    /// Current document as canonical bytes.
    pub fn export(&self) -> Result<Vec<u8>, ConfigError> {
        let config = self.load()?;
        encode(&config)
    }

    /// Decode, validate and save a document from `bytes`.
    pub fn import(&self, bytes: &[u8]) -> Result<ShellConfiguration, ConfigError> {
        let mut config = decode(bytes)?;
        self.save(&mut config)?;
        Ok(config)
    }

    /// Write the named profile as the current document.
    pub fn write_profile(&self, name: &str, force: bool) -> Result<ShellConfiguration, ConfigError> {
        if !is_known_profile(name) {
            return Err(ConfigError::UnknownProfile {
                name: name.to_string(),
            });
        }

        let _guard = write_lock(&self.io_lock);
        if self.paths.config_path.exists() && !force {
            return Err(ConfigError::AlreadyExists {
                path: self.paths.config_path.clone(),
            });
        }

        let mut config = profile_defaults(name);
        config.metadata.created = Some(Utc::now());
        self.save_locked(&mut config)?;
        info!(event = "core.config.profile_written", profile = name);
        Ok(config)
    }

    /// Load, edit and save under one exclusive hold of the storage lock.
    fn update<F>(&self, edit: F) -> Result<ShellConfiguration, ConfigError>
    where
        F: FnOnce(&mut ShellConfiguration) -> Result<(), ConfigError>,
    {
        let _guard = write_lock(&self.io_lock);
        let mut config = self.load_locked()?.as_ref().clone();
        edit(&mut config)?;
        self.save_locked(&mut config)?;
        Ok(config)
    }

    /// Returns whether a legacy document was imported.
    fn import_legacy(&self) -> Result<bool, ConfigError> {
        let Some(mut config) = legacy::read_legacy(
            &self.paths.config_path,
            &self.paths.legacy_path,
            &self.paths.backup_dir,
        )?
        else {
            return Ok(false);
        };

        stamp(&mut config);
        self.persist(&config)?;
        info!(
            event = "core.config.legacy_migration_completed",
            from = %self.paths.legacy_path.display(),
            to = %self.paths.config_path.display(),
            version = %config.version
        );
        Ok(true)
    }

    /// Read the document along with the file stamp taken just before.
    fn read_stamped(&self) -> Result<(ShellConfiguration, Option<FileStamp>), ConfigError> {
        let file_stamp = FileStamp::of(&self.paths.config_path);
        let bytes = std::fs::read(&self.paths.config_path)
            .map_err(|e| ConfigError::io(&self.paths.config_path, e))?;
        Ok((decode(&bytes)?, file_stamp))
    }

    /// Copy the file as it is on disk into the backup directory.
    ///
    /// Nothing to back up is not an error.
    fn backup_current(&self) -> Result<Option<PathBuf>, ConfigError> {
        let bytes = match std::fs::read(&self.paths.config_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ConfigError::io(&self.paths.config_path, e)),
        };

        let stem = format!("{}-{}", BACKUP_STEM, persistence::backup_timestamp());
        let backup = persistence::write_backup(&self.paths.backup_dir, &stem, &bytes)
            .map_err(|e| ConfigError::io(&self.paths.backup_dir, e))?;
        debug!(event = "core.config.backup_written", path = %backup.display());
        Ok(Some(backup))
    }

    fn persist(&self, config: &ShellConfiguration) -> Result<(), ConfigError> {
        let bytes = encode(config)?;
        let result = persistence::write_atomic(&self.paths.config_path, &bytes)
            .map_err(|e| ConfigError::io(&self.paths.config_path, e));
        self.invalidate_cache();
        result
    }

    fn invalidate_cache(&self) {
        *write_lock(&self.cache) = None;
    }
}

/// Refresh `lastModified` and claim ownership of the document.
fn stamp(config: &mut ShellConfiguration) {
    let now = Utc::now();
    config.metadata.created.get_or_insert(now);
    config.metadata.last_modified = Some(now);
    config.metadata.managed_by = Some(MANAGED_BY.to_string());
}

fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Severity;
    use serde_json::json;
    use tempfile::TempDir;

    fn manager(temp: &TempDir) -> ConfigManager {
        ConfigManager::new(ManagerPaths::under(temp.path())).unwrap()
    }

    fn write_raw(manager: &ConfigManager, value: serde_json::Value) {
        let path = manager.config_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, serde_json::to_vec_pretty(&value).unwrap()).unwrap();
    }

    fn backups(manager: &ConfigManager, prefix: &str) -> Vec<PathBuf> {
        match std::fs::read_dir(&manager.paths().backup_dir) {
            Ok(entries) => entries
                .map(|e| e.unwrap().path())
                .filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|n| n.starts_with(prefix))
                })
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    #[test]
    fn test_initialize_writes_defaults() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);

        assert_eq!(manager.initialize().unwrap(), InitOutcome::ProfileWritten);

        let config = manager.load().unwrap();
        assert_eq!(config.version, "1.0.0");
        assert_eq!(config.metadata.profile.as_deref(), Some("default"));
        assert_eq!(config.metadata.managed_by.as_deref(), Some(MANAGED_BY));
        assert!(!has_blocking_issues(&manager.validate(&config)));
    }

    #[test]
    fn test_initialize_keeps_existing_document() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);
        write_raw(
            &manager,
            json!({"version": "1.0.0", "system": {"shell": "fish"}}),
        );

        assert_eq!(manager.initialize().unwrap(), InitOutcome::Existing);

        assert_eq!(manager.load().unwrap().system.shell.as_deref(), Some("fish"));
    }

    #[test]
    fn test_initialize_with_profile() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);

        assert!(matches!(
            manager.initialize_with_profile("nope").unwrap_err(),
            ConfigError::UnknownProfile { .. }
        ));
        assert!(!manager.exists());

        manager.initialize_with_profile("gaming").unwrap();
        assert_eq!(
            manager.load().unwrap().metadata.profile.as_deref(),
            Some("gaming")
        );
    }

    #[test]
    fn test_initialize_imports_legacy_document() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);
        let legacy = &manager.paths().legacy_path;
        std::fs::create_dir_all(legacy.parent().unwrap()).unwrap();
        std::fs::write(
            legacy,
            r#"{"version":"1.0.0","system":{"shell":"nu"}}"#,
        )
        .unwrap();

        assert_eq!(
            manager.initialize_with_profile("minimal").unwrap(),
            InitOutcome::LegacyImported
        );

        let config = manager.load().unwrap();
        assert_eq!(config.system.shell.as_deref(), Some("nu"));
        assert!(config.metadata.profile.is_none());
        assert_eq!(config.metadata.managed_by.as_deref(), Some(MANAGED_BY));
        assert_eq!(backups(&manager, "migrated-from-quickshell").len(), 1);
        assert!(legacy.exists());
    }

    #[test]
    fn test_initialize_survives_broken_legacy_document() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);
        let legacy = &manager.paths().legacy_path;
        std::fs::create_dir_all(legacy.parent().unwrap()).unwrap();
        std::fs::write(legacy, "not json").unwrap();

        assert_eq!(manager.initialize().unwrap(), InitOutcome::ProfileWritten);

        assert_eq!(manager.load().unwrap().system.shell.as_deref(), Some("bash"));
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let err = manager(&temp).load().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_rejects_empty_version() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);
        write_raw(&manager, json!({"version": ""}));

        assert!(matches!(
            manager.load().unwrap_err(),
            ConfigError::Parse { .. }
        ));
    }

    #[test]
    fn test_load_is_cached_within_ttl() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);
        manager.initialize().unwrap();

        let first = manager.load().unwrap();
        let second = manager.load().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_load_rereads_after_external_change() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);
        manager.initialize().unwrap();
        let first = manager.load().unwrap();

        write_raw(
            &manager,
            json!({"version": "1.0.0", "system": {"shell": "zsh"}}),
        );

        let second = manager.load().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.system.shell.as_deref(), Some("zsh"));
    }

    #[test]
    fn test_zero_ttl_always_rereads() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp).with_cache_ttl(Duration::ZERO);
        manager.initialize().unwrap();

        let first = manager.load().unwrap();
        let second = manager.load().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first, second);
    }

    #[test]
    fn test_save_rejects_blocking_issues() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);
        manager.initialize().unwrap();
        let before = std::fs::read(manager.config_path()).unwrap();

        let mut config = manager.load().unwrap().as_ref().clone();
        config.services.audio.volume = Some(150);

        let err = manager.save(&mut config).unwrap_err();
        let ConfigError::Validation { issues } = err else {
            panic!("expected validation error");
        };
        assert!(issues.iter().any(|i| i.severity == Severity::Error));
        assert_eq!(std::fs::read(manager.config_path()).unwrap(), before);
    }

    #[test]
    fn test_save_backs_up_and_stamps() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);
        manager.initialize().unwrap();

        let mut config = manager.load().unwrap().as_ref().clone();
        config.system.editor = Some("helix".to_string());
        config.metadata.managed_by = Some("someone-else".to_string());
        manager.save(&mut config).unwrap();

        assert_eq!(config.metadata.managed_by.as_deref(), Some(MANAGED_BY));
        assert_eq!(backups(&manager, "shell-").len(), 1);
        assert_eq!(
            manager.load().unwrap().system.editor.as_deref(),
            Some("helix")
        );
    }

    #[test]
    fn test_save_twice_differs_only_in_last_modified() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);
        manager.initialize().unwrap();

        let mut config = manager.load().unwrap().as_ref().clone();
        manager.save(&mut config).unwrap();
        let first = manager.load().unwrap().as_ref().clone();
        let mut again = first.clone();
        manager.save(&mut again).unwrap();
        let mut second = manager.load().unwrap().as_ref().clone();

        second.metadata.last_modified = first.metadata.last_modified;
        assert_eq!(encode(&first).unwrap(), encode(&second).unwrap());
    }

    #[test]
    fn test_migrate_legacy_schema() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);
        write_raw(
            &manager,
            json!({
                "version": "0.9.0",
                "system": {"shell": "bash"},
                "panel": {"position": "top", "height": 30}
            }),
        );

        let config = manager.load().unwrap();
        let migrated = manager.migrate(&config).unwrap();

        assert_eq!(migrated.version, "1.0.0");
        assert_eq!(migrated.bar.position.as_deref(), Some("top"));
        assert!(!migrated.extra.contains_key("panel"));

        let on_disk = manager.load().unwrap();
        assert_eq!(on_disk.version, "1.0.0");
        assert_eq!(backups(&manager, "shell-").len(), 1);
        assert_eq!(manager.history().len(), 1);
        assert!(manager.history()[0].success);
    }

    #[test]
    fn test_migrate_at_target_is_noop() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);
        manager.initialize().unwrap();
        let before = std::fs::read(manager.config_path()).unwrap();

        let config = manager.load().unwrap();
        let migrated = manager.migrate(&config).unwrap();

        assert_eq!(&migrated, config.as_ref());
        assert_eq!(std::fs::read(manager.config_path()).unwrap(), before);
        assert!(manager.history().is_empty());
    }

    #[test]
    fn test_migrate_without_path_fails() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);
        write_raw(&manager, json!({"version": "0.1.0", "system": {"shell": "sh"}}));

        let config = manager.load().unwrap();
        let err = manager.migrate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Migration { .. }));
    }

    #[test]
    fn test_migrate_persist_and_rollback_failure_is_combined() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);
        write_raw(&manager, json!({"version": "0.9.0", "system": {"shell": "bash"}}));
        let config = manager.load().unwrap();

        // The temp file of every atomic write to the config is blocked.
        let mut blocker = manager.config_path().as_os_str().to_owned();
        blocker.push(".tmp");
        std::fs::create_dir(&blocker).unwrap();

        let err = manager.migrate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::RollbackFailed { .. }));
    }

    #[test]
    fn test_rollback_restores_pre_migration_bytes() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);
        let original = br#"{"version":"0.9.0","system":{"shell":"bash"},"panel":{"height":30}}"#;
        std::fs::create_dir_all(manager.config_path().parent().unwrap()).unwrap();
        std::fs::write(manager.config_path(), original).unwrap();

        let config = manager.load().unwrap();
        manager.migrate_to_version(&config, "1.0.0").unwrap();
        assert_ne!(std::fs::read(manager.config_path()).unwrap(), original);

        manager.rollback().unwrap();

        assert_eq!(std::fs::read(manager.config_path()).unwrap(), original);
        let restored = manager.load().unwrap();
        assert_eq!(restored.version, "0.9.0");
        assert!(restored.extra.contains_key("panel"));
    }

    #[test]
    fn test_rollback_without_migration_fails() {
        let temp = TempDir::new().unwrap();
        let err = manager(&temp).rollback().unwrap_err();
        assert!(matches!(err, ConfigError::Migration { .. }));
    }

    #[test]
    fn test_inject_defaults_honors_locks() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);
        write_raw(
            &manager,
            json!({
                "version": "1.0.0",
                "metadata": {"userLocked": ["system.shell"]},
                "system": {"shell": "zsh"}
            }),
        );

        let mut config = manager.load().unwrap().as_ref().clone();
        let report = manager.inject_defaults(&mut config).unwrap();

        assert!(!report.injected.is_empty());
        let on_disk = manager.load().unwrap();
        assert_eq!(on_disk.system.shell.as_deref(), Some("zsh"));
        assert_eq!(on_disk.system.terminal.as_deref(), Some("kitty"));
    }

    #[test]
    fn test_get_and_set() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);
        manager.initialize().unwrap();

        manager.set("system.editor", json!("vim")).unwrap();

        assert_eq!(manager.get("system.editor").unwrap(), Some(json!("vim")));
        assert_eq!(manager.get("system.nothing").unwrap(), None);
    }

    #[test]
    fn test_set_rejects_invalid_value() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);
        manager.initialize().unwrap();

        let err = manager.set("bar.position", json!("middle")).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn test_lock_and_unlock_path() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);
        manager.initialize().unwrap();

        manager.lock_path("system.shell").unwrap();
        manager.lock_path("system.shell").unwrap();
        assert_eq!(
            manager.load().unwrap().metadata.user_locked,
            vec!["system.shell"]
        );

        manager.unlock_path("system.shell").unwrap();
        assert!(manager.load().unwrap().metadata.user_locked.is_empty());
    }

    #[test]
    fn test_user_lock_on_document_is_not_persisted() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);
        manager.initialize().unwrap();

        let mut config = manager.load().unwrap().as_ref().clone();
        manager.set_user_lock(&mut config, "bar.*");
        assert_eq!(config.metadata.user_locked, vec!["bar.*"]);
        assert!(manager.load().unwrap().metadata.user_locked.is_empty());

        manager.remove_user_lock(&mut config, "bar.*");
        assert!(config.metadata.user_locked.is_empty());
    }

    #[test]
    fn test_lock_rejects_malformed_path() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);
        manager.initialize().unwrap();

        assert!(matches!(
            manager.lock_path("system..shell").unwrap_err(),
            ConfigError::Tree { .. }
        ));
    }

    #[test]
    fn test_export_import() {
        let temp = TempDir::new().unwrap();
        let source = manager(&temp);
        source.initialize().unwrap();
        source.set("system.shell", json!("fish")).unwrap();
        let bytes = source.export().unwrap();

        let other = TempDir::new().unwrap();
        let target = manager(&other);
        let imported = target.import(&bytes).unwrap();

        assert_eq!(imported.system.shell.as_deref(), Some("fish"));
        assert_eq!(target.load().unwrap().system.shell.as_deref(), Some("fish"));
    }

    #[test]
    fn test_import_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);

        assert!(matches!(
            manager.import(b"{").unwrap_err(),
            ConfigError::Parse { .. }
        ));
        assert!(!manager.exists());
    }

    #[test]
    fn test_write_profile() {
        let temp = TempDir::new().unwrap();
        let manager = manager(&temp);

        let config = manager.write_profile("gaming", false).unwrap();
        assert_eq!(config.metadata.profile.as_deref(), Some("gaming"));

        let err = manager.write_profile("minimal", false).unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyExists { .. }));

        manager.write_profile("minimal", true).unwrap();
        assert_eq!(
            manager.load().unwrap().metadata.profile.as_deref(),
            Some("minimal")
        );
    }

    #[test]
    fn test_write_unknown_profile() {
        let temp = TempDir::new().unwrap();
        let err = manager(&temp).write_profile("nope", true).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownProfile { .. }));
    }

    #[test]
    fn test_concurrent_saves_serialize() {
        let temp = TempDir::new().unwrap();
        let manager = Arc::new(manager(&temp));
        manager.initialize().unwrap();

        let keys = ["editor", "browser", "launcher", "fileManager"];
        let handles: Vec<_> = keys
            .iter()
            .map(|key| {
                let manager = Arc::clone(&manager);
                let path = format!("system.{}", key);
                std::thread::spawn(move || {
                    manager.set(&path, json!(format!("{}-set", path))).unwrap();
                    manager.load().unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for key in keys {
            let path = format!("system.{}", key);
            assert_eq!(
                manager.get(&path).unwrap(),
                Some(json!(format!("{}-set", path))),
                "lost update on {}",
                path
            );
        }
    }
}
