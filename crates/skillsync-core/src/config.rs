//! Engine configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use skillsync_fs::{ConfigStore, NormalizedPath, RobustnessConfig, StorePath};

use crate::Result;

/// Settings shared by every component of the engine.
///
/// Missing keys in a config file take their default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Root for snapshots and lock files
    pub store_dir: PathBuf,
    /// Longest wait for an operation lock, in milliseconds
    pub lock_timeout_ms: u64,
    /// Threads used to hash large trees
    pub fingerprint_workers: usize,
    /// File and directory names skipped when walking artifact trees
    pub exclude: Vec<String>,
    /// Whether writes are fsynced before being renamed into place
    pub enable_fsync: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            store_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("skillsync"),
            lock_timeout_ms: 2000,
            fingerprint_workers: 4,
            exclude: vec![
                StorePath::ProjectMeta.to_string(),
                ".git".to_string(),
                ".DS_Store".to_string(),
            ],
            enable_fsync: true,
        }
    }
}

impl SyncConfig {
    /// Load from `path` (TOML, JSON or YAML by extension); a missing file
    /// yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Ok(ConfigStore::new().load(&NormalizedPath::new(path))?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        Ok(ConfigStore::with_robustness(self.robustness()).save(&NormalizedPath::new(path), self)?)
    }

    /// Defaults with a different store directory.
    pub fn with_store_dir(store_dir: impl Into<PathBuf>) -> Self {
        Self {
            store_dir: store_dir.into(),
            ..Self::default()
        }
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn robustness(&self) -> RobustnessConfig {
        RobustnessConfig {
            lock_timeout: self.lock_timeout(),
            enable_fsync: self.enable_fsync,
        }
    }

    pub fn locks_dir(&self) -> PathBuf {
        self.store_dir.join(StorePath::Locks)
    }

    pub fn snapshots_dir(&self) -> PathBuf {
        self.store_dir.join(StorePath::Snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.lock_timeout(), Duration::from_secs(2));
        assert_eq!(config.fingerprint_workers, 4);
        assert_eq!(config.exclude, vec![".skillsync", ".git", ".DS_Store"]);
        assert!(config.store_dir.ends_with("skillsync"));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = SyncConfig::load_or_default(&dir.path().join("skillsync.toml")).unwrap();
        assert_eq!(config, SyncConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("skillsync.toml");
        std::fs::write(&path, "lock_timeout_ms = 50\nfingerprint_workers = 1\n").unwrap();

        let config = SyncConfig::load_or_default(&path).unwrap();
        assert_eq!(config.lock_timeout_ms, 50);
        assert_eq!(config.fingerprint_workers, 1);
        assert!(config.enable_fsync);
    }

    #[test]
    fn save_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("skillsync.json");
        let config = SyncConfig {
            enable_fsync: false,
            ..SyncConfig::with_store_dir(dir.path().join("store"))
        };
        config.save(&path).unwrap();
        assert_eq!(SyncConfig::load_or_default(&path).unwrap(), config);
    }
}
