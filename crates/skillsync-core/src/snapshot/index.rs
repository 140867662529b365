//! Per-scope snapshot index (`index.toml`)

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use skillsync_fs::io::update_locked;
use skillsync_fs::{NormalizedPath, RobustnessConfig};

use super::Snapshot;
use crate::{Error, Result};

/// Snapshots of one scope, in creation order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct SnapshotIndex {
    #[serde(default)]
    pub snapshots: Vec<Snapshot>,
}

impl SnapshotIndex {
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(Error::io(path, e)),
        }
    }

    /// Append `snapshot` to the index at `path`. The read and the write
    /// happen under one lock, so concurrent appends are never lost.
    pub fn append(path: &Path, snapshot: &Snapshot, robustness: RobustnessConfig) -> Result<()> {
        update_locked(&NormalizedPath::new(path), robustness, |current| {
            let mut index: Self = match current {
                Some(content) => toml::from_str(&content)?,
                None => Self::default(),
            };
            index.snapshots.push(snapshot.clone());
            Ok::<_, Error>(toml::to_string_pretty(&index)?.into_bytes())
        })
    }
}
