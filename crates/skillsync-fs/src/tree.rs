//! File trees: walking directories and holding their contents in memory
//!
//! A [`FileTree`] maps normalized relative paths to file bytes. It is the unit
//! the merge engine, the snapshot archiver and the fingerprinter agree on.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::io::is_transient_name;
use crate::{Error, NormalizedPath, Result};

/// List every regular file under `root`, sorted by normalized relative path.
///
/// Symlinks are followed, so a linked file is indistinguishable from a copy.
/// Entries whose name appears in `exclude` are pruned during the walk (a
/// matching directory is skipped entirely) and are never read. So are the
/// temporary directories of an interrupted swap.
///
/// Returns `(relative path, absolute path)` pairs.
pub fn walk_files(root: &Path, exclude: &[String]) -> Result<Vec<(NormalizedPath, PathBuf)>> {
    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !(is_excluded(e.file_name(), exclude)
                    || is_transient_name(&e.file_name().to_string_lossy()))
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
            Error::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = if entry.depth() == 0 {
            NormalizedPath::new(entry.file_name())
        } else {
            match NormalizedPath::relative_to(entry.path(), root) {
                Some(rel) => rel,
                None => continue,
            }
        };
        files.push((relative, entry.path().to_path_buf()));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

fn is_excluded(name: &std::ffi::OsStr, exclude: &[String]) -> bool {
    let name = name.to_string_lossy();
    exclude.iter().any(|pattern| *pattern == name)
}

/// An in-memory file tree keyed by normalized relative path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTree {
    files: BTreeMap<NormalizedPath, Vec<u8>>,
}

impl FileTree {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every non-excluded file under `root` into memory.
    pub fn load(root: &Path, exclude: &[String]) -> Result<Self> {
        let mut tree = Self::new();
        for (relative, absolute) in walk_files(root, exclude)? {
            let bytes = fs::read(&absolute).map_err(|e| Error::io(&absolute, e))?;
            tree.files.insert(relative, bytes);
        }
        Ok(tree)
    }

    /// Like [`FileTree::load`], but a missing `root` yields `None`.
    pub fn load_if_exists(root: &Path, exclude: &[String]) -> Result<Option<Self>> {
        if !root.exists() {
            return Ok(None);
        }
        Self::load(root, exclude).map(Some)
    }

    /// Insert or replace a file.
    ///
    /// # Errors
    ///
    /// Rejects absolute paths and paths containing `..`.
    pub fn insert(&mut self, path: impl Into<NormalizedPath>, content: Vec<u8>) -> Result<()> {
        let path = path.into();
        if !path.is_safe_relative() {
            return Err(Error::UnsafePath {
                path: path.to_string(),
            });
        }
        self.files.insert(path, content);
        Ok(())
    }

    /// Get a file's content.
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(&NormalizedPath::new(path)).map(Vec::as_slice)
    }

    /// Remove a file, returning its content.
    pub fn remove(&mut self, path: &str) -> Option<Vec<u8>> {
        self.files.remove(&NormalizedPath::new(path))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(&NormalizedPath::new(path))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate `(path, content)` pairs in sorted path order.
    pub fn iter(&self) -> impl Iterator<Item = (&NormalizedPath, &[u8])> {
        self.files.iter().map(|(p, c)| (p, c.as_slice()))
    }

    /// Sorted relative paths.
    pub fn paths(&self) -> impl Iterator<Item = &NormalizedPath> {
        self.files.keys()
    }

    /// Sum of all file sizes in bytes.
    pub fn total_bytes(&self) -> u64 {
        self.files.values().map(|c| c.len() as u64).sum()
    }

    /// Write every file beneath `dir`, creating directories as needed.
    pub fn write_to(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        for (relative, content) in &self.files {
            let target = dir.join(relative.to_native());
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
            fs::write(&target, content).map_err(|e| Error::io(&target, e))?;
        }
        Ok(())
    }
}

impl FromIterator<(NormalizedPath, Vec<u8>)> for FileTree {
    fn from_iter<I: IntoIterator<Item = (NormalizedPath, Vec<u8>)>>(iter: I) -> Self {
        Self {
            files: iter
                .into_iter()
                .filter(|(p, _)| p.is_safe_relative())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn insert_rejects_escaping_paths() {
        let mut tree = FileTree::new();
        assert!(tree.insert("../outside.md", b"x".to_vec()).is_err());
        assert!(tree.insert("/abs.md", b"x".to_vec()).is_err());
        assert!(tree.insert("ok/inside.md", b"x".to_vec()).is_ok());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn walk_prunes_excluded_directories() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git/objects")).unwrap();
        fs::write(dir.path().join(".git/objects/blob"), "x").unwrap();
        fs::write(dir.path().join("SKILL.md"), "# skill").unwrap();

        let files = walk_files(dir.path(), &[".git".to_string()]).unwrap();
        let names: Vec<_> = files.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(names, vec!["SKILL.md"]);
    }

    #[test]
    fn walk_skips_interrupted_swap_directories() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("skills/review")).unwrap();
        fs::write(dir.path().join("skills/review/SKILL.md"), "live").unwrap();
        fs::create_dir_all(dir.path().join("skills/.review.staging-deadbeef")).unwrap();
        fs::write(dir.path().join("skills/.review.staging-deadbeef/SKILL.md"), "half").unwrap();

        let files = walk_files(dir.path(), &[]).unwrap();
        let names: Vec<_> = files.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(names, vec!["skills/review/SKILL.md"]);
    }

    #[test]
    fn walk_orders_by_full_relative_path() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("a/b"), "1").unwrap();
        fs::write(dir.path().join("a-c"), "2").unwrap();

        let files = walk_files(dir.path(), &[]).unwrap();
        let names: Vec<_> = files.iter().map(|(p, _)| p.as_str()).collect();
        // '-' (0x2d) sorts before '/' (0x2f)
        assert_eq!(names, vec!["a-c", "a/b"]);
    }

    #[test]
    fn load_and_write_round_trip() {
        let src = tempdir().unwrap();
        fs::create_dir_all(src.path().join("refs")).unwrap();
        fs::write(src.path().join("SKILL.md"), "body").unwrap();
        fs::write(src.path().join("refs/notes.txt"), [0u8, 1, 2]).unwrap();

        let tree = FileTree::load(src.path(), &[]).unwrap();
        let dst = tempdir().unwrap();
        tree.write_to(dst.path()).unwrap();

        assert_eq!(FileTree::load(dst.path(), &[]).unwrap(), tree);
        assert_eq!(tree.total_bytes(), 7);
    }

    #[test]
    fn missing_root_loads_as_none() {
        let dir = tempdir().unwrap();
        let tree = FileTree::load_if_exists(&dir.path().join("absent"), &[]).unwrap();
        assert!(tree.is_none());
    }
}
