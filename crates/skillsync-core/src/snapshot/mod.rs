//! Immutable snapshots of a scope
//!
//! Each snapshot is a deterministic tar.gz of the scope's tree, stored as
//! `<store>/snapshots/<scope>/<id>.tar.gz` and listed in that directory's
//! `index.toml` in creation order. Snapshots are never modified after they
//! are written.

mod id;
mod index;

pub use id::SnapshotId;

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillsync_fs::checksum::compute_bytes_checksum;
use skillsync_fs::io::write_atomic;
use skillsync_fs::{FileTree, NormalizedPath, RobustnessConfig, StorePath};

use crate::archive;
use crate::artifact::ArtifactType;
use crate::config::SyncConfig;
use crate::fingerprint::{ContentFingerprint, fingerprint_tree};
use crate::scope::Scope;
use crate::{Error, Result};
use index::SnapshotIndex;

/// Why a snapshot was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    /// Requested by a caller
    Manual,
    /// Taken automatically before a mutating operation
    Safety,
    /// The tree a rollback left in place
    Restored,
}

/// Index entry describing one archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub scope: String,
    pub kind: SnapshotKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub artifact_count: usize,
    pub file_count: usize,
    /// Fingerprint of the captured tree
    pub fingerprint: ContentFingerprint,
    /// Archive file name within the scope directory
    pub archive: String,
    /// Checksum of the archive bytes
    pub archive_checksum: String,
}

/// Creates, lists and reads snapshots.
///
/// Callers are expected to hold the scope's operation lock around
/// [`SnapshotManager::create_snapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotManager {
    root: PathBuf,
    exclude: Vec<String>,
    robustness: RobustnessConfig,
}

impl SnapshotManager {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            root: config.snapshots_dir(),
            exclude: config.exclude.clone(),
            robustness: config.robustness(),
        }
    }

    /// `<store>/snapshots/<scope>`
    pub fn scope_dir(&self, scope_name: &str) -> PathBuf {
        self.root.join(scope_name)
    }

    fn index_path(&self, scope_name: &str) -> PathBuf {
        self.scope_dir(scope_name).join(StorePath::SnapshotIndex)
    }

    /// `<store>/snapshots/<scope>/audit.toml`
    pub fn audit_path(&self, scope_name: &str) -> PathBuf {
        self.scope_dir(scope_name).join(StorePath::AuditLog)
    }

    /// Archive the scope's current tree and append it to the index.
    ///
    /// A scope whose root does not exist is captured as an empty tree.
    pub fn create_snapshot(
        &self,
        scope: &Scope,
        message: &str,
        kind: SnapshotKind,
    ) -> Result<Snapshot> {
        self.capture(scope, message, kind).map(|(snapshot, _)| snapshot)
    }

    /// Like [`SnapshotManager::create_snapshot`], also returning the
    /// captured tree.
    pub(crate) fn capture(
        &self,
        scope: &Scope,
        message: &str,
        kind: SnapshotKind,
    ) -> Result<(Snapshot, FileTree)> {
        let tree = FileTree::load_if_exists(scope.root(), &self.exclude)?.unwrap_or_default();
        let snapshot = self.record(scope, &tree, message, kind)?;
        Ok((snapshot, tree))
    }

    /// Archive an in-memory `tree` as a snapshot of `scope`.
    pub(crate) fn record(
        &self,
        scope: &Scope,
        tree: &FileTree,
        message: &str,
        kind: SnapshotKind,
    ) -> Result<Snapshot> {
        let created_at = Utc::now();
        let id = SnapshotId::generate(created_at);
        let archive_name = format!("{}.tar.gz", id);
        let archive_path = self.scope_dir(scope.name()).join(&archive_name);

        let bytes = archive::pack(tree).map_err(|e| Error::io(&archive_path, e))?;
        write_atomic(&NormalizedPath::new(&archive_path), &bytes, self.robustness)?;

        let snapshot = Snapshot {
            id,
            scope: scope.name().to_string(),
            kind,
            message: message.to_string(),
            created_at,
            artifact_count: count_artifacts(tree),
            file_count: tree.len(),
            fingerprint: fingerprint_tree(tree),
            archive: archive_name,
            archive_checksum: compute_bytes_checksum(&bytes),
        };

        SnapshotIndex::append(&self.index_path(scope.name()), &snapshot, self.robustness)?;

        tracing::info!(
            scope = %scope.name(),
            id = %snapshot.id,
            kind = ?kind,
            files = snapshot.file_count,
            "snapshot created"
        );
        Ok(snapshot)
    }

    /// All snapshots of `scope`, oldest first.
    pub fn list_snapshots(&self, scope: &Scope) -> Result<Vec<Snapshot>> {
        Ok(SnapshotIndex::load(&self.index_path(scope.name()))?.snapshots)
    }

    pub fn get_snapshot(&self, scope: &Scope, id: &str) -> Result<Snapshot> {
        self.list_snapshots(scope)?
            .into_iter()
            .find(|s| s.id.as_str() == id)
            .ok_or_else(|| Error::SnapshotNotFound {
                scope: scope.name().to_string(),
                id: id.to_string(),
            })
    }

    /// Read a snapshot's tree back.
    ///
    /// # Errors
    ///
    /// [`Error::SnapshotCorrupt`] if the archive is missing, fails its
    /// checksum, cannot be decoded, or decodes to a tree with a different
    /// fingerprint.
    pub fn load_tree(&self, snapshot: &Snapshot) -> Result<FileTree> {
        let corrupt = |reason: String| Error::SnapshotCorrupt {
            id: snapshot.id.to_string(),
            reason,
        };
        let path = self.scope_dir(&snapshot.scope).join(&snapshot.archive);

        let bytes = fs::read(&path).map_err(|e| corrupt(format!("{}: {}", path.display(), e)))?;
        if compute_bytes_checksum(&bytes) != snapshot.archive_checksum {
            return Err(corrupt("archive checksum mismatch".into()));
        }
        let tree = archive::unpack(&bytes).map_err(|e| corrupt(e.to_string()))?;
        if fingerprint_tree(&tree) != snapshot.fingerprint {
            return Err(corrupt("tree fingerprint mismatch".into()));
        }
        Ok(tree)
    }
}

/// Count artifacts in a captured tree.
///
/// Paths under a known type directory count one artifact per
/// `<type dir>/<name>`; anything else counts one per top-level entry, which
/// covers scopes rooted at a single type directory.
fn count_artifacts(tree: &FileTree) -> usize {
    let mut artifacts = BTreeSet::new();
    for path in tree.paths() {
        let mut parts = path.as_str().splitn(3, '/');
        let first = parts.next().unwrap_or_default();
        match (ArtifactType::from_dir_name(first), parts.next()) {
            (Some(_), Some(name)) => artifacts.insert(format!("{}/{}", first, name)),
            _ => artifacts.insert(first.to_string()),
        };
    }
    artifacts.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(paths: &[&str]) -> FileTree {
        let mut tree = FileTree::new();
        for path in paths {
            tree.insert(*path, b"x".to_vec()).unwrap();
        }
        tree
    }

    #[test]
    fn artifacts_are_counted_per_type_directory() {
        let t = tree(&[
            "skills/review/SKILL.md",
            "skills/review/refs/a.md",
            "skills/lint/SKILL.md",
            "hooks/pre/hook.json",
            "README.md",
        ]);
        assert_eq!(count_artifacts(&t), 4);
    }

    #[test]
    fn empty_tree_has_no_artifacts() {
        assert_eq!(count_artifacts(&FileTree::new()), 0);
    }
}
