use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use crate::config::ShellConfiguration;

/// How long a loaded document is served from memory.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5);

/// Modification time and size of the document file at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FileStamp {
    modified: SystemTime,
    len: u64,
}

impl FileStamp {
    /// Stamp of the file at `path`, or `None` if it cannot be read.
    pub fn of(path: &Path) -> Option<Self> {
        let metadata = std::fs::metadata(path).ok()?;
        Some(Self {
            modified: metadata.modified().ok()?,
            len: metadata.len(),
        })
    }
}

/// A loaded document and the file stamp seen when it was read.
#[derive(Debug, Clone)]
pub(crate) struct ConfigCache {
    pub document: Arc<ShellConfiguration>,
    stamp: Option<FileStamp>,
    loaded_at: Instant,
    ttl: Duration,
}

impl ConfigCache {
    /// `stamp` must be taken before the bytes behind `document` were read.
    pub fn new(
        document: Arc<ShellConfiguration>,
        stamp: Option<FileStamp>,
        ttl: Duration,
    ) -> Self {
        Self {
            document,
            stamp,
            loaded_at: Instant::now(),
            ttl,
        }
    }

    /// Within the TTL and the file still carries the stamp seen at load.
    pub fn is_fresh(&self, config_path: &Path) -> bool {
        if self.loaded_at.elapsed() >= self.ttl {
            return false;
        }
        self.stamp.is_some() && FileStamp::of(config_path) == self.stamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::profile_defaults;
    use tempfile::TempDir;

    fn cache_for(path: &Path, ttl: Duration) -> ConfigCache {
        ConfigCache::new(
            Arc::new(profile_defaults("default")),
            FileStamp::of(path),
            ttl,
        )
    }

    #[test]
    fn test_fresh_after_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("shell.json");
        std::fs::write(&path, "{}").unwrap();

        assert!(cache_for(&path, DEFAULT_CACHE_TTL).is_fresh(&path));
    }

    #[test]
    fn test_zero_ttl_is_never_fresh() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("shell.json");
        std::fs::write(&path, "{}").unwrap();

        assert!(!cache_for(&path, Duration::ZERO).is_fresh(&path));
    }

    #[test]
    fn test_immediate_rewrite_invalidates() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("shell.json");
        std::fs::write(&path, "{}").unwrap();

        let cache = cache_for(&path, DEFAULT_CACHE_TTL);
        std::fs::write(&path, r#"{"version":"1.0.0"}"#).unwrap();

        assert!(!cache.is_fresh(&path));
    }

    #[test]
    fn test_missing_file_invalidates() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("gone.json");
        assert!(!cache_for(&path, DEFAULT_CACHE_TTL).is_fresh(&path));
    }

    #[test]
    fn test_file_removed_after_load_invalidates() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("shell.json");
        std::fs::write(&path, "{}").unwrap();

        let cache = cache_for(&path, DEFAULT_CACHE_TTL);
        std::fs::remove_file(&path).unwrap();

        assert!(!cache.is_fresh(&path));
    }
}
