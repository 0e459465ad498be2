//! Filesystem primitives shared by the manager and the migrator.
//!
//! Writes to the live document go through a sibling temp file and a rename so
//! readers never observe a truncated file. Backups are created exclusively and
//! never overwritten.

use chrono::Utc;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Upper bound on `-N` suffixes tried for a colliding backup name.
const MAX_BACKUP_SUFFIX: u32 = 1000;

/// Timestamp used in backup file names.
pub(crate) fn backup_timestamp() -> String {
    Utc::now().format("%Y%m%d-%H%M%S").to_string()
}

pub(crate) fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn cleanup_partial_file(partial: &Path, original_error: &io::Error) {
    if let Err(cleanup_err) = fs::remove_file(partial) {
        tracing::warn!(
            event = "core.persistence.partial_file_cleanup_failed",
            path = %partial.display(),
            original_error = %original_error,
            cleanup_error = %cleanup_err,
            message = "Failed to clean up partially written file after operation error"
        );
    }
}

/// Replace `path` with `bytes` via a temp file and rename.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    ensure_parent(path)?;

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_file = PathBuf::from(temp_name);

    if let Err(e) = fs::write(&temp_file, bytes) {
        cleanup_partial_file(&temp_file, &e);
        return Err(e);
    }

    if let Err(e) = fs::rename(&temp_file, path) {
        cleanup_partial_file(&temp_file, &e);
        return Err(e);
    }

    Ok(())
}

/// Remove a partially written backup when `result` is an error.
fn discard_on_error(path: &Path, result: io::Result<()>) -> io::Result<()> {
    if let Err(e) = &result {
        cleanup_partial_file(path, e);
    }
    result
}

fn create_private(path: &Path) -> io::Result<fs::File> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

/// Write `bytes` to `<dir>/<stem>.json`, owner-readable only.
///
/// An existing file is never replaced: a `-1`, `-2`, ... suffix is appended
/// to the stem until a free name is found.
pub(crate) fn write_backup(dir: &Path, stem: &str, bytes: &[u8]) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;

    for attempt in 0..=MAX_BACKUP_SUFFIX {
        let name = if attempt == 0 {
            format!("{}.json", stem)
        } else {
            format!("{}-{}.json", stem, attempt)
        };
        let path = dir.join(name);

        match create_private(&path) {
            Ok(mut file) => {
                let written = file.write_all(bytes).and_then(|()| file.sync_all());
                drop(file);
                discard_on_error(&path, written)?;
                tracing::debug!(
                    event = "core.persistence.backup_written",
                    path = %path.display(),
                    bytes = bytes.len()
                );
                return Ok(path);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free backup name for '{}' in {}", stem, dir.display()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_creates_parent_and_replaces() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/dir/shell.json");

        write_atomic(&path, b"one").unwrap();
        write_atomic(&path, b"two").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"two");
        assert!(!temp.path().join("nested/dir/shell.json.tmp").exists());
    }

    #[test]
    fn test_write_atomic_cleans_up_temp_on_rename_failure() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("shell.json");
        // A directory at the target forces the rename to fail.
        fs::create_dir_all(&path).unwrap();

        assert!(write_atomic(&path, b"data").is_err());
        assert!(!temp.path().join("shell.json.tmp").exists());
    }

    #[test]
    fn test_write_backup_never_overwrites() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("backups");

        let first = write_backup(&dir, "shell-20240101-000000", b"a").unwrap();
        let second = write_backup(&dir, "shell-20240101-000000", b"b").unwrap();

        assert_ne!(first, second);
        assert_eq!(first.file_name().unwrap(), "shell-20240101-000000.json");
        assert_eq!(second.file_name().unwrap(), "shell-20240101-000000-1.json");
        assert_eq!(fs::read(&first).unwrap(), b"a");
        assert_eq!(fs::read(&second).unwrap(), b"b");
    }

    #[test]
    fn test_failed_backup_write_is_removed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("shell-partial.json");
        fs::write(&path, b"{\"ver").unwrap();

        let err = discard_on_error(&path, Err(io::Error::other("disk full"))).unwrap_err();

        assert_eq!(err.to_string(), "disk full");
        assert!(!path.exists());
    }

    #[test]
    fn test_successful_backup_write_is_kept() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("shell-ok.json");
        fs::write(&path, b"{}").unwrap();

        discard_on_error(&path, Ok(())).unwrap();
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_backup_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = write_backup(temp.path(), "shell-x", b"{}").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_backup_timestamp_shape() {
        let ts = backup_timestamp();
        assert_eq!(ts.len(), 15);
        assert_eq!(&ts[8..9], "-");
    }
}
