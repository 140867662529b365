//! File-level diff between two trees

use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use skillsync_fs::{FileTree, NormalizedPath};
use std::collections::BTreeSet;

use crate::text::as_text;

/// Lines of context around each hunk in unified output
const CONTEXT_RADIUS: usize = 3;

/// How a file differs between the old and new tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Removed,
    Modified,
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Removed => write!(f, "removed"),
            Self::Modified => write!(f, "modified"),
        }
    }
}

/// Difference for one path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileDiff {
    pub path: String,
    pub status: FileStatus,
    /// Unified diff; `None` for binary content
    pub unified: Option<String>,
    pub insertions: usize,
    pub deletions: usize,
    /// Line similarity ratio (0.0 to 1.0); 0.0 for binary changes
    pub similarity: f32,
}

impl FileDiff {
    fn compute(path: &NormalizedPath, old: Option<&[u8]>, new: Option<&[u8]>) -> Self {
        let status = match (old, new) {
            (None, _) => FileStatus::Added,
            (_, None) => FileStatus::Removed,
            _ => FileStatus::Modified,
        };
        let old_text = old.map_or(Some(""), as_text);
        let new_text = new.map_or(Some(""), as_text);

        let (Some(old_text), Some(new_text)) = (old_text, new_text) else {
            return Self {
                path: path.to_string(),
                status,
                unified: None,
                insertions: 0,
                deletions: 0,
                similarity: 0.0,
            };
        };

        let diff = TextDiff::from_lines(old_text, new_text);
        let (mut insertions, mut deletions) = (0, 0);
        for change in diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Insert => insertions += 1,
                ChangeTag::Delete => deletions += 1,
                ChangeTag::Equal => {}
            }
        }

        let old_label = format!("a/{}", path);
        let new_label = format!("b/{}", path);
        let unified = diff
            .unified_diff()
            .context_radius(CONTEXT_RADIUS)
            .header(&old_label, &new_label)
            .to_string();

        Self {
            path: path.to_string(),
            status,
            unified: Some(unified),
            insertions,
            deletions,
            similarity: diff.ratio(),
        }
    }
}

/// All differences between two trees, sorted by path
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TreeDiff {
    pub files: Vec<FileDiff>,
    /// Number of paths present and identical in both trees
    pub unchanged: usize,
}

impl TreeDiff {
    /// Compare `old` against `new`
    pub fn compute(old: &FileTree, new: &FileTree) -> Self {
        let paths: BTreeSet<&NormalizedPath> = old.paths().chain(new.paths()).collect();
        let mut diff = Self::default();

        for path in paths {
            let before = old.get(path.as_str());
            let after = new.get(path.as_str());
            if before == after {
                diff.unchanged += 1;
            } else {
                diff.files.push(FileDiff::compute(path, before, after));
            }
        }
        diff
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn with_status(&self, status: FileStatus) -> impl Iterator<Item = &FileDiff> {
        self.files.iter().filter(move |f| f.status == status)
    }

    pub fn total_insertions(&self) -> usize {
        self.files.iter().map(|f| f.insertions).sum()
    }

    pub fn total_deletions(&self) -> usize {
        self.files.iter().map(|f| f.deletions).sum()
    }
}

/// Compare two trees; shorthand for [`TreeDiff::compute`]
pub fn diff_trees(old: &FileTree, new: &FileTree) -> TreeDiff {
    TreeDiff::compute(old, new)
}
