//! Two-phase interactive merge
//!
//! [`begin_merge`] computes the merge and exposes the conflict list. The
//! caller collects one [`Resolution`] per pending conflict (from a prompt, a
//! policy, a web form) and hands them to [`MergeSession::apply_resolutions`].
//! The engine never waits on input.

use std::collections::BTreeMap;

use skillsync_fs::FileTree;

use crate::conflict::ConflictRecord;
use crate::merge::{MergeOutcome, diff3};
use crate::{Error, Result};

/// A caller's decision for one conflicting path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    UseLocal,
    UseRemote,
    /// Revert to the common ancestor (deletes the file if it had none)
    UseBase,
    Delete,
    /// Caller-supplied content, e.g. a hand-edited file
    Custom(Vec<u8>),
}

/// Final tree after every conflict has a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMerge {
    pub tree: FileTree,
    /// Paths settled by an explicit caller decision
    pub resolved: Vec<String>,
    /// Paths settled automatically by the line-level merge
    pub auto_merged: Vec<String>,
}

/// A computed merge waiting for caller decisions.
#[derive(Debug, Clone)]
pub struct MergeSession {
    outcome: MergeOutcome,
}

/// Start a merge and return the session holding its conflicts.
pub fn begin_merge(base: &FileTree, local: &FileTree, remote: &FileTree) -> MergeSession {
    MergeSession {
        outcome: diff3(base, local, remote),
    }
}

impl MergeSession {
    /// Wrap an outcome computed elsewhere.
    pub fn from_outcome(outcome: MergeOutcome) -> Self {
        Self { outcome }
    }

    pub fn outcome(&self) -> &MergeOutcome {
        &self.outcome
    }

    /// Every conflict record, auto-mergeable ones included
    pub fn conflicts(&self) -> &[ConflictRecord] {
        &self.outcome.conflicts
    }

    /// Conflicts that must receive a decision
    pub fn pending(&self) -> Vec<&ConflictRecord> {
        self.outcome.pending().collect()
    }

    /// Commit the caller's decisions.
    ///
    /// Auto-mergeable conflicts keep their merged content unless a decision
    /// overrides them.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownConflict`] if a decision names a path with no conflict
    /// - [`Error::UnresolvedConflicts`] if any pending conflict has no decision
    pub fn apply_resolutions(
        &self,
        resolutions: &BTreeMap<String, Resolution>,
    ) -> Result<ResolvedMerge> {
        if let Some(unknown) = resolutions
            .keys()
            .find(|path| !self.outcome.conflicts.iter().any(|c| &c.file_path == *path))
        {
            return Err(Error::UnknownConflict {
                path: unknown.clone(),
            });
        }

        let unresolved: Vec<String> = self
            .outcome
            .pending()
            .filter(|c| !resolutions.contains_key(&c.file_path))
            .map(|c| c.file_path.clone())
            .collect();
        if !unresolved.is_empty() {
            return Err(Error::UnresolvedConflicts { paths: unresolved });
        }

        let mut tree = self.outcome.merged.clone();
        let mut resolved = Vec::new();
        let mut auto_merged = Vec::new();

        for conflict in &self.outcome.conflicts {
            let Some(decision) = resolutions.get(&conflict.file_path) else {
                auto_merged.push(conflict.file_path.clone());
                continue;
            };

            let content = match decision {
                Resolution::UseLocal => conflict.local.clone(),
                Resolution::UseRemote => conflict.remote.clone(),
                Resolution::UseBase => conflict.base.clone(),
                Resolution::Delete => None,
                Resolution::Custom(bytes) => Some(bytes.clone()),
            };
            match content {
                Some(bytes) => tree.insert(conflict.file_path.as_str(), bytes)?,
                None => {
                    tree.remove(&conflict.file_path);
                }
            }
            resolved.push(conflict.file_path.clone());
        }

        tracing::debug!(
            resolved = resolved.len(),
            auto_merged = auto_merged.len(),
            "merge resolutions applied"
        );
        Ok(ResolvedMerge {
            tree,
            resolved,
            auto_merged,
        })
    }
}
