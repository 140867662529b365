//! Content-addressed store of deployed baselines
//!
//! Every tree recorded as a deployment baseline is archived under
//! `<project>/.skillsync/baselines/<hex>.tar.gz`. Merges read the ancestor
//! from here, never from the collection's current content.

use std::fs;
use std::path::{Path, PathBuf};

use skillsync_fs::io::write_atomic;
use skillsync_fs::{FileTree, NormalizedPath, RobustnessConfig, StorePath};

use crate::archive;
use crate::fingerprint::{ContentFingerprint, fingerprint_tree};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct BaselineStore {
    dir: PathBuf,
    robustness: RobustnessConfig,
}

impl BaselineStore {
    /// Store for the project rooted at `project_root`.
    pub fn for_project(project_root: &Path, robustness: RobustnessConfig) -> Self {
        Self {
            dir: project_root
                .join(StorePath::ProjectMeta)
                .join(StorePath::Baselines),
            robustness,
        }
    }

    fn path_for(&self, hash: &ContentFingerprint) -> PathBuf {
        self.dir.join(format!("{}.tar.gz", hash.hex()))
    }

    pub fn contains(&self, hash: &ContentFingerprint) -> bool {
        self.path_for(hash).exists()
    }

    /// Archive `tree` under its fingerprint. Already-stored content is left
    /// alone.
    pub fn store(&self, tree: &FileTree) -> Result<ContentFingerprint> {
        let hash = fingerprint_tree(tree);
        let path = self.path_for(&hash);
        if path.exists() {
            return Ok(hash);
        }

        let bytes = archive::pack(tree).map_err(|e| Error::io(&path, e))?;
        write_atomic(&NormalizedPath::new(&path), &bytes, self.robustness)?;
        tracing::debug!(%hash, files = tree.len(), "baseline stored");
        Ok(hash)
    }

    /// Load the tree stored under `hash`.
    ///
    /// # Errors
    ///
    /// [`Error::BaselineUnavailable`] if nothing is stored under `hash`, or
    /// the stored archive no longer matches it.
    pub fn load(&self, hash: &ContentFingerprint) -> Result<FileTree> {
        let unavailable = || Error::BaselineUnavailable {
            hash: hash.to_string(),
        };
        let path = self.path_for(hash);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(unavailable()),
            Err(e) => return Err(Error::io(&path, e)),
        };

        let tree = archive::unpack(&bytes).map_err(|e| {
            tracing::warn!(%hash, "unreadable baseline archive: {}", e);
            unavailable()
        })?;
        if fingerprint_tree(&tree) != *hash {
            tracing::warn!(%hash, "baseline archive does not match its fingerprint");
            return Err(unavailable());
        }
        Ok(tree)
    }

    /// First of `candidates` whose content is stored.
    pub fn first_available<'a>(
        &self,
        candidates: impl IntoIterator<Item = &'a ContentFingerprint>,
    ) -> Option<&'a ContentFingerprint> {
        candidates.into_iter().find(|hash| self.contains(hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tree(content: &str) -> FileTree {
        let mut tree = FileTree::new();
        tree.insert("SKILL.md", content.as_bytes().to_vec()).unwrap();
        tree
    }

    #[test]
    fn store_then_load() {
        let dir = tempdir().unwrap();
        let store = BaselineStore::for_project(dir.path(), RobustnessConfig::default());
        let hash = store.store(&tree("v1")).unwrap();

        assert!(store.contains(&hash));
        assert_eq!(store.load(&hash).unwrap(), tree("v1"));
        assert!(dir
            .path()
            .join(".skillsync/baselines")
            .join(format!("{}.tar.gz", hash.hex()))
            .exists());
    }

    #[test]
    fn unknown_hash_is_unavailable() {
        let dir = tempdir().unwrap();
        let store = BaselineStore::for_project(dir.path(), RobustnessConfig::default());
        let missing = fingerprint_tree(&tree("never stored"));
        assert!(matches!(
            store.load(&missing),
            Err(Error::BaselineUnavailable { .. })
        ));
    }

    #[test]
    fn tampered_archive_is_unavailable() {
        let dir = tempdir().unwrap();
        let store = BaselineStore::for_project(dir.path(), RobustnessConfig::default());
        let hash = store.store(&tree("v1")).unwrap();
        let other = archive::pack(&tree("v2")).unwrap();
        fs::write(store.path_for(&hash), other).unwrap();

        assert!(matches!(
            store.load(&hash),
            Err(Error::BaselineUnavailable { .. })
        ));
    }
}
