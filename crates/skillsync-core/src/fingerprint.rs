//! Content fingerprints of artifact trees
//!
//! A fingerprint is the SHA-256 of a manifest listing every file as
//! `relative_path:content_hash\n`, in normalized path order. Two trees have
//! the same fingerprint exactly when they hold the same files with the same
//! bytes; timestamps, permissions and symlink-versus-copy never matter.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use skillsync_fs::checksum::{self, compute_bytes_checksum, compute_file_checksum};
use skillsync_fs::{FileTree, NormalizedPath, walk_files};

use crate::config::SyncConfig;
use crate::{Error, Result};

/// Trees with more files than this are hashed on the worker pool.
const PARALLEL_THRESHOLD: usize = 64;

/// Canonical `sha256:<hex>` hash of an artifact tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentFingerprint(String);

impl ContentFingerprint {
    /// Parse the canonical textual form.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedFingerprint`] for anything but `sha256:` followed by
    /// 64 lowercase hex digits.
    pub fn parse(value: &str) -> Result<Self> {
        if checksum::is_canonical(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(Error::MalformedFingerprint {
                value: value.to_string(),
            })
        }
    }

    /// Hash raw manifest bytes.
    fn of_manifest(manifest: &[u8]) -> Self {
        Self(compute_bytes_checksum(manifest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The bare hex digest, used to name content-addressed files.
    pub fn hex(&self) -> &str {
        &self.0[checksum::PREFIX.len()..]
    }
}

impl std::fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentFingerprint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContentFingerprint {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ContentFingerprint> for String {
    fn from(value: ContentFingerprint) -> Self {
        value.0
    }
}

/// Fingerprint of an in-memory tree.
///
/// Identical to [`Fingerprinter::fingerprint`] of the same files on disk.
pub fn fingerprint_tree(tree: &FileTree) -> ContentFingerprint {
    let mut manifest = String::new();
    for (path, content) in tree.iter() {
        push_line(&mut manifest, path, &compute_bytes_checksum(content));
    }
    ContentFingerprint::of_manifest(manifest.as_bytes())
}

fn push_line(manifest: &mut String, path: &NormalizedPath, hash: &str) {
    manifest.push_str(path.as_str());
    manifest.push(':');
    manifest.push_str(hash);
    manifest.push('\n');
}

/// Computes fingerprints of directories on disk.
#[derive(Debug, Clone)]
pub struct Fingerprinter {
    exclude: Vec<String>,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl Fingerprinter {
    pub fn new(config: &SyncConfig) -> Self {
        let pool = if config.fingerprint_workers > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(config.fingerprint_workers)
                .thread_name(|i| format!("skillsync-hash-{}", i))
                .build()
            {
                Ok(pool) => Some(Arc::new(pool)),
                Err(e) => {
                    tracing::warn!("hash worker pool unavailable, hashing sequentially: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            exclude: config.exclude.clone(),
            pool,
        }
    }

    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }

    /// Fingerprint every non-excluded regular file under `root`.
    ///
    /// # Errors
    ///
    /// [`Error::HashComputation`] naming the first file (or directory) that
    /// could not be read, including a missing `root`.
    pub fn fingerprint(&self, root: &Path) -> Result<ContentFingerprint> {
        let files = walk_files(root, &self.exclude).map_err(hash_error)?;

        let hash = |(_, absolute): &(NormalizedPath, std::path::PathBuf)| {
            compute_file_checksum(absolute).map_err(|source| Error::HashComputation {
                path: absolute.clone(),
                source,
            })
        };
        let hashes: Vec<String> = match &self.pool {
            Some(pool) if files.len() > PARALLEL_THRESHOLD => {
                pool.install(|| files.par_iter().map(hash).collect::<Result<_>>())?
            }
            _ => files.iter().map(hash).collect::<Result<_>>()?,
        };

        let mut manifest = String::new();
        for ((path, _), hash) in files.iter().zip(&hashes) {
            push_line(&mut manifest, path, hash);
        }

        let fingerprint = ContentFingerprint::of_manifest(manifest.as_bytes());
        tracing::debug!(root = %root.display(), files = files.len(), %fingerprint, "fingerprinted tree");
        Ok(fingerprint)
    }

    /// Like [`Fingerprinter::fingerprint`], but a missing `root` is `None`.
    pub fn fingerprint_if_exists(&self, root: &Path) -> Result<Option<ContentFingerprint>> {
        if !root.exists() {
            return Ok(None);
        }
        self.fingerprint(root).map(Some)
    }
}

fn hash_error(error: skillsync_fs::Error) -> Error {
    match error {
        skillsync_fs::Error::Io { path, source } => Error::HashComputation { path, source },
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    fn fingerprinter() -> Fingerprinter {
        Fingerprinter::new(&SyncConfig::default())
    }

    #[test]
    fn parse_accepts_only_canonical_form() {
        let hex = "ab".repeat(32);
        let fp = ContentFingerprint::parse(&format!("sha256:{}", hex)).unwrap();
        assert_eq!(fp.hex(), hex);

        let upper = format!("sha256:{}", "AB".repeat(32));
        for bad in ["", "sha256:", "md5:abcd", upper.as_str()] {
            assert!(matches!(
                ContentFingerprint::parse(bad),
                Err(Error::MalformedFingerprint { .. })
            ));
        }
    }

    #[test]
    fn disk_and_memory_fingerprints_agree() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("refs")).unwrap();
        fs::write(dir.path().join("SKILL.md"), "# Skill\n").unwrap();
        fs::write(dir.path().join("refs/a.txt"), "a").unwrap();

        let on_disk = fingerprinter().fingerprint(dir.path()).unwrap();
        let tree = FileTree::load(dir.path(), &[]).unwrap();
        assert_eq!(fingerprint_tree(&tree), on_disk);
    }

    #[test]
    fn excluded_entries_do_not_count() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("SKILL.md"), "x").unwrap();
        let before = fingerprinter().fingerprint(dir.path()).unwrap();

        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git/HEAD"), "ref").unwrap();
        fs::write(dir.path().join(".DS_Store"), "junk").unwrap();
        assert_eq!(fingerprinter().fingerprint(dir.path()).unwrap(), before);
    }

    #[test]
    fn missing_root_is_absent() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(fingerprinter().fingerprint_if_exists(&missing).unwrap(), None);
        assert!(matches!(
            fingerprinter().fingerprint(&missing),
            Err(Error::HashComputation { .. })
        ));
    }

    #[test]
    fn serde_uses_canonical_string() {
        let fp = fingerprint_tree(&FileTree::new());
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, format!("\"{}\"", fp));
        assert!(serde_json::from_str::<ContentFingerprint>("\"sha256:zz\"").is_err());
    }
}
