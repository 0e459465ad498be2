//! One-time import of the pre-rename `quickshell/heimdall/shell.json`.

use std::path::Path;

use crate::config::ShellConfiguration;
use crate::errors::ConfigError;
use crate::persistence;

/// Version assumed for a legacy document that carries none.
const LEGACY_VERSION: &str = "0.9.0";

/// Backup name for the legacy bytes.
const LEGACY_BACKUP_STEM: &str = "migrated-from-quickshell";

/// Read the legacy document if the canonical one does not exist yet.
///
/// Returns `Ok(None)` when there is nothing to import. A copy of the legacy
/// bytes is written to `backup_dir` on a best-effort basis.
pub(crate) fn read_legacy(
    config_path: &Path,
    legacy_path: &Path,
    backup_dir: &Path,
) -> Result<Option<ShellConfiguration>, ConfigError> {
    if config_path.exists() || !legacy_path.exists() {
        return Ok(None);
    }

    tracing::info!(
        event = "core.config.legacy_migration_started",
        from = %legacy_path.display(),
        to = %config_path.display()
    );

    let bytes = std::fs::read(legacy_path).map_err(|e| ConfigError::Legacy {
        path: legacy_path.to_path_buf(),
        message: format!("failed to read legacy config: {}", e),
    })?;

    if let Err(e) = persistence::write_backup(backup_dir, LEGACY_BACKUP_STEM, &bytes) {
        tracing::warn!(
            event = "core.config.legacy_backup_failed",
            path = %backup_dir.display(),
            error = %e
        );
    }

    let mut config: ShellConfiguration =
        serde_json::from_slice(&bytes).map_err(|e| ConfigError::Legacy {
            path: legacy_path.to_path_buf(),
            message: format!("failed to parse legacy config: {}", e),
        })?;

    if config.version.trim().is_empty() {
        config.version = LEGACY_VERSION.to_string();
    }

    Ok(Some(config))
}
