//! Three-way merge of whole file trees
//!
//! Every path in the union of base, local and remote is classified on its
//! own. Disagreements become [`ConflictRecord`]s in the returned outcome;
//! they are data for the caller, never errors.

use std::collections::BTreeSet;
use std::path::Path;

use skillsync_fs::{FileTree, NormalizedPath};

use crate::Result;
use crate::conflict::{ConflictKind, ConflictRecord, SuggestedStrategy};
use crate::text::{as_text, conflict_whole, merge_text};

/// Result of [`diff3`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Merged tree. Pending text conflicts carry inline markers.
    pub merged: FileTree,
    /// One record per path on which the two sides disagreed
    pub conflicts: Vec<ConflictRecord>,
    /// Paths whose result was taken from the local side alone
    pub from_local: Vec<String>,
    /// Paths whose result was taken from the remote side alone
    pub from_remote: Vec<String>,
    /// Paths changed on both sides that merged without intervention
    pub auto_merged: Vec<String>,
}

impl MergeOutcome {
    /// True when no conflict needs a caller decision
    pub fn is_clean(&self) -> bool {
        self.conflicts.iter().all(|c| c.auto_mergeable)
    }

    /// Conflicts still awaiting a decision
    pub fn pending(&self) -> impl Iterator<Item = &ConflictRecord> {
        self.conflicts.iter().filter(|c| c.is_pending())
    }
}

/// Merge `local` and `remote` against their common ancestor `base`.
pub fn diff3(base: &FileTree, local: &FileTree, remote: &FileTree) -> MergeOutcome {
    let paths: BTreeSet<&NormalizedPath> = base
        .paths()
        .chain(local.paths())
        .chain(remote.paths())
        .collect();

    let mut outcome = MergeOutcome::default();
    for path in paths {
        let key = path.as_str();
        merge_path(
            path,
            base.get(key),
            local.get(key),
            remote.get(key),
            &mut outcome,
        );
    }

    tracing::debug!(
        files = outcome.merged.len(),
        conflicts = outcome.conflicts.len(),
        pending = outcome.pending().count(),
        "three-way merge complete"
    );
    outcome
}

/// Load three directories and merge them.
///
/// # Errors
///
/// Fails if any tree cannot be read; nothing is written in that case.
pub fn diff3_dirs(
    base: &Path,
    local: &Path,
    remote: &Path,
    exclude: &[String],
) -> Result<MergeOutcome> {
    let base = FileTree::load_if_exists(base, exclude)?.unwrap_or_default();
    let local = FileTree::load_if_exists(local, exclude)?.unwrap_or_default();
    let remote = FileTree::load_if_exists(remote, exclude)?.unwrap_or_default();
    Ok(diff3(&base, &local, &remote))
}

fn merge_path(
    path: &NormalizedPath,
    base: Option<&[u8]>,
    local: Option<&[u8]>,
    remote: Option<&[u8]>,
    outcome: &mut MergeOutcome,
) {
    let key = path.to_string();

    // Same on both sides: unchanged, identical edits, or deleted on both
    if local == remote {
        if let Some(content) = local {
            keep(outcome, path, content);
        }
        if local != base {
            outcome.auto_merged.push(key);
        }
        return;
    }
    if local == base {
        if let Some(content) = remote {
            keep(outcome, path, content);
        }
        outcome.from_remote.push(key);
        return;
    }
    if remote == base {
        if let Some(content) = local {
            keep(outcome, path, content);
        }
        outcome.from_local.push(key);
        return;
    }

    let is_binary = [base, local, remote]
        .into_iter()
        .flatten()
        .any(|bytes| as_text(bytes).is_none());

    let record = |kind, auto_mergeable, suggested_strategy| ConflictRecord {
        file_path: key.clone(),
        kind,
        base: base.map(<[u8]>::to_vec),
        local: local.map(<[u8]>::to_vec),
        remote: remote.map(<[u8]>::to_vec),
        auto_mergeable,
        suggested_strategy,
        is_binary,
    };

    match (base, local, remote) {
        // Deleted on one side, modified on the other: keep the surviving edit
        (Some(_), None, Some(modified)) => {
            keep(outcome, path, modified);
            outcome
                .conflicts
                .push(record(ConflictKind::Deletion, false, SuggestedStrategy::UseRemote));
        }
        (Some(_), Some(modified), None) => {
            keep(outcome, path, modified);
            outcome
                .conflicts
                .push(record(ConflictKind::Deletion, false, SuggestedStrategy::UseLocal));
        }
        (None, Some(l), Some(r)) => {
            match (as_text(l), as_text(r)) {
                (Some(l), Some(r)) => keep(outcome, path, conflict_whole(l, r).as_bytes()),
                _ => keep(outcome, path, l),
            }
            outcome
                .conflicts
                .push(record(ConflictKind::AddAdd, false, SuggestedStrategy::Manual));
        }
        (Some(b), Some(l), Some(r)) => {
            match (as_text(b), as_text(l), as_text(r)) {
                (Some(b), Some(l), Some(r)) => {
                    let merged = merge_text(b, l, r);
                    keep(outcome, path, merged.content.as_bytes());
                    if merged.is_clean() {
                        outcome.auto_merged.push(key.clone());
                        outcome.conflicts.push(record(
                            ConflictKind::BothModified,
                            true,
                            SuggestedStrategy::Merge,
                        ));
                    } else {
                        outcome.conflicts.push(record(
                            ConflictKind::Content,
                            false,
                            SuggestedStrategy::Manual,
                        ));
                    }
                }
                _ => {
                    keep(outcome, path, l);
                    outcome
                        .conflicts
                        .push(record(ConflictKind::Content, false, SuggestedStrategy::Manual));
                }
            }
        }
        // Every other combination has two equal sides and returned above
        _ => unreachable!("path {key} has two equal sides"),
    }
}

fn keep(outcome: &mut MergeOutcome, path: &NormalizedPath, content: &[u8]) {
    // Paths come from existing trees, so they are already safe
    let _ = outcome.merged.insert(path.clone(), content.to_vec());
}
