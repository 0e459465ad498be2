//! Location of the configuration document, its backups, and the legacy file.

use std::path::{Path, PathBuf};

/// Overrides the canonical document path.
pub const CONFIG_PATH_ENV: &str = "HEIMDALL_CONFIG_PATH";

/// Overrides the backup directory.
pub const BACKUP_DIR_ENV: &str = "HEIMDALL_BACKUP_DIR";

const APP_DIR: &str = "heimdall";
const CONFIG_FILE: &str = "shell.json";
const BACKUP_SUBDIR: &str = "backups";

/// Filesystem locations used by the configuration manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerPaths {
    pub config_path: PathBuf,
    pub backup_dir: PathBuf,
    pub legacy_path: PathBuf,
}

impl ManagerPaths {
    pub fn new(
        config_path: impl Into<PathBuf>,
        backup_dir: impl Into<PathBuf>,
        legacy_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            config_path: config_path.into(),
            backup_dir: backup_dir.into(),
            legacy_path: legacy_path.into(),
        }
    }

    /// Build the standard layout under a single configuration home.
    pub fn under(config_home: &Path) -> Self {
        Self {
            config_path: config_home.join(APP_DIR).join(CONFIG_FILE),
            backup_dir: config_home.join(APP_DIR).join(BACKUP_SUBDIR),
            legacy_path: config_home
                .join("quickshell")
                .join(APP_DIR)
                .join(CONFIG_FILE),
        }
    }

    /// Resolve paths from the environment.
    ///
    /// `HEIMDALL_CONFIG_PATH` and `HEIMDALL_BACKUP_DIR` win when set and
    /// non-empty; everything else hangs off [`config_home`].
    pub fn resolve() -> Self {
        let mut paths = Self::under(&config_home());

        if let Some(path) = env_path(CONFIG_PATH_ENV) {
            paths.config_path = path;
        }
        if let Some(dir) = env_path(BACKUP_DIR_ENV) {
            paths.backup_dir = dir;
        }

        paths
    }

    /// Path of the persisted migration history.
    pub fn history_path(&self) -> PathBuf {
        self.backup_dir.join("migration-history.json")
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

/// `$XDG_CONFIG_HOME`, else `~/.config`.
///
/// Falls back to `./.config` if the home directory cannot be determined.
pub fn config_home() -> PathBuf {
    if let Some(xdg) = env_path("XDG_CONFIG_HOME") {
        return xdg;
    }

    match dirs::home_dir() {
        Some(home) => home.join(".config"),
        None => {
            tracing::error!(
                event = "core.config.home_dir_not_found",
                fallback = ".",
                "Could not determine home directory - using current directory as fallback"
            );
            PathBuf::from(".").join(".config")
        }
    }
}
