//! Crash-safe rollback to an earlier snapshot
//!
//! A rollback takes the scope lock, captures a safety snapshot of the live
//! tree, computes the restored tree, stages it in a sibling directory,
//! verifies the staged fingerprint and only then swaps it into place. Every
//! attempt that gets past the lock leaves exactly one audit entry.
//!
//! After a successful swap the restored tree is archived as a `Restored`
//! snapshot, so the index always ends with a state the live tree descends
//! from.

mod audit;
mod swap;

pub use audit::{AuditLog, OperationType, RollbackAuditEntry};
pub use swap::{RenameSwap, TreeSwap};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use skillsync_fs::{FileTree, NormalizedPath, OperationLock, RobustnessConfig};
use skillsync_merge::{ConflictRecord, diff3, diff_trees};

use crate::config::SyncConfig;
use crate::fingerprint::Fingerprinter;
use crate::install::Installer;
use crate::scope::Scope;
use crate::snapshot::{Snapshot, SnapshotId, SnapshotKind, SnapshotManager};
use crate::{Error, Result};

/// How the restored tree is derived from the target snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackMode {
    /// Replace the tree with the target wholesale
    Simple,
    /// Three-way merge of the live tree with the target, keeping changes
    /// made since the last recorded state
    Intelligent,
    /// Restore only these files or directory prefixes
    Selective(Vec<String>),
}

impl RollbackMode {
    pub fn operation_type(&self) -> OperationType {
        match self {
            Self::Simple => OperationType::Simple,
            Self::Intelligent => OperationType::Intelligent,
            Self::Selective(_) => OperationType::Selective,
        }
    }
}

/// What a successful rollback did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollbackResult {
    pub audit_id: uuid::Uuid,
    pub target_snapshot: SnapshotId,
    /// Safety snapshot of the tree that was replaced
    pub safety_snapshot: SnapshotId,
    pub operation_type: OperationType,
    pub files_restored: Vec<String>,
    pub files_merged: Vec<String>,
    pub conflicts_resolved: Vec<String>,
    /// Conflicts left in the restored tree with inline markers
    pub conflicts_pending: Vec<ConflictRecord>,
}

/// Restored tree plus the bookkeeping that goes into the audit entry.
struct Plan {
    tree: FileTree,
    files_restored: Vec<String>,
    files_merged: Vec<String>,
    conflicts_resolved: Vec<String>,
    conflicts_pending: Vec<ConflictRecord>,
}

pub struct RollbackManager {
    snapshots: SnapshotManager,
    installer: Installer,
    locks_dir: PathBuf,
    lock_timeout: Duration,
    robustness: RobustnessConfig,
}

impl RollbackManager {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            snapshots: SnapshotManager::new(config),
            installer: Installer::new(Fingerprinter::new(config), Arc::new(RenameSwap)),
            locks_dir: config.locks_dir(),
            lock_timeout: config.lock_timeout(),
            robustness: config.robustness(),
        }
    }

    /// Replace the swap primitive.
    pub fn with_swap(mut self, swap: Arc<dyn TreeSwap>) -> Self {
        self.installer = self.installer.with_swap(swap);
        self
    }

    pub fn snapshots(&self) -> &SnapshotManager {
        &self.snapshots
    }

    pub fn audit_log(&self, scope: &Scope) -> AuditLog {
        AuditLog::new(self.snapshots.audit_path(scope.name()), self.robustness)
    }

    /// The scope's audit trail, oldest first.
    pub fn audit_entries(&self, scope: &Scope) -> Result<Vec<RollbackAuditEntry>> {
        self.audit_log(scope).entries()
    }

    /// Roll `scope` back to snapshot `target_id`.
    ///
    /// # Errors
    ///
    /// - `LockContention` (retryable) if another operation holds the scope
    /// - [`Error::SnapshotNotFound`] / [`Error::SnapshotCorrupt`] for a bad
    ///   target; the live tree is untouched
    /// - [`Error::AtomicWrite`] if staging or the swap failed; `mutated`
    ///   tells whether the live tree may have changed
    ///
    /// Every error after the lock is taken is also recorded in the audit
    /// trail with `success = false`.
    pub fn rollback(
        &self,
        scope: &Scope,
        target_id: &str,
        mode: RollbackMode,
    ) -> Result<RollbackResult> {
        let _lock =
            OperationLock::acquire(&self.locks_dir, scope.lock_key().clone(), self.lock_timeout)?;

        let mut entry = RollbackAuditEntry::new(scope.name(), target_id, mode.operation_type());
        let outcome = self.run(scope, target_id, &mode, &mut entry);

        match &outcome {
            Ok(_) => entry.success = true,
            Err(e) => {
                tracing::error!(scope = %scope.name(), target = target_id, "rollback failed: {}", e);
                entry.error = Some(e.to_string());
            }
        }
        self.audit_log(scope).append(&entry)?;

        let (safety, plan) = outcome?;
        tracing::info!(
            scope = %scope.name(),
            target = target_id,
            mode = %entry.operation_type,
            restored = plan.files_restored.len(),
            pending = plan.conflicts_pending.len(),
            "rollback complete"
        );
        Ok(RollbackResult {
            audit_id: entry.id,
            target_snapshot: SnapshotId::from(target_id),
            safety_snapshot: safety.id,
            operation_type: entry.operation_type,
            files_restored: plan.files_restored,
            files_merged: plan.files_merged,
            conflicts_resolved: plan.conflicts_resolved,
            conflicts_pending: plan.conflicts_pending,
        })
    }

    fn run(
        &self,
        scope: &Scope,
        target_id: &str,
        mode: &RollbackMode,
        entry: &mut RollbackAuditEntry,
    ) -> Result<(Snapshot, Plan)> {
        self.installer.report_leftovers(scope.name(), scope.root())?;
        let target = self.snapshots.get_snapshot(scope, target_id)?;
        let target_tree = self.snapshots.load_tree(&target)?;

        let (safety, live) = self.snapshots.capture(
            scope,
            &format!("before rollback to {}", target_id),
            SnapshotKind::Safety,
        )?;
        entry.source_snapshot = Some(safety.id.to_string());

        let plan = match mode {
            RollbackMode::Simple => plan_simple(&live, target_tree),
            RollbackMode::Intelligent => {
                let base = self.intelligent_base(scope, &safety, &target, &target_tree)?;
                plan_intelligent(&base, &live, &target_tree)
            }
            RollbackMode::Selective(paths) => plan_selective(&live, &target_tree, paths)?,
        };
        entry.files_restored = plan.files_restored.clone();
        entry.files_merged = plan.files_merged.clone();
        entry.conflicts_resolved = plan.conflicts_resolved.clone();
        entry.conflicts_pending = plan
            .conflicts_pending
            .iter()
            .map(|c| c.file_path.clone())
            .collect();

        self.installer.install(scope.name(), scope.root(), &plan.tree)?;

        let message = format!("restored from {}", target_id);
        if let Err(e) = self
            .snapshots
            .record(scope, &plan.tree, &message, SnapshotKind::Restored)
        {
            tracing::warn!(scope = %scope.name(), target = target_id, "failed to record restored tree: {}", e);
        }
        Ok((safety, plan))
    }

    /// Nearest recorded state the live tree descends from: the newest
    /// snapshot taken before the safety snapshot, or the target itself when
    /// there is none.
    ///
    /// A rollback's own safety snapshot holds the tree it replaced, so it is
    /// never the newest entry once that rollback succeeded: the `Restored`
    /// snapshot recorded after the swap follows it.
    fn intelligent_base(
        &self,
        scope: &Scope,
        safety: &Snapshot,
        target: &Snapshot,
        target_tree: &FileTree,
    ) -> Result<FileTree> {
        let index = self.snapshots.list_snapshots(scope)?;
        let base = index
            .iter()
            .take_while(|s| s.id != safety.id)
            .last()
            .filter(|s| s.id != target.id);

        match base {
            Some(snapshot) => {
                tracing::debug!(scope = %scope.name(), base = %snapshot.id, "merge base selected");
                self.snapshots.load_tree(snapshot)
            }
            None => Ok(target_tree.clone()),
        }
    }
}

fn plan_simple(live: &FileTree, target: FileTree) -> Plan {
    let files_restored = diff_trees(live, &target)
        .files
        .into_iter()
        .map(|f| f.path)
        .collect();
    Plan {
        tree: target,
        files_restored,
        files_merged: Vec::new(),
        conflicts_resolved: Vec::new(),
        conflicts_pending: Vec::new(),
    }
}

fn plan_intelligent(base: &FileTree, live: &FileTree, target: &FileTree) -> Plan {
    let outcome = diff3(base, live, target);
    let (pending, resolved): (Vec<_>, Vec<_>) = outcome
        .conflicts
        .into_iter()
        .partition(ConflictRecord::is_pending);
    Plan {
        tree: outcome.merged,
        files_restored: outcome.from_remote,
        files_merged: outcome.auto_merged,
        conflicts_resolved: resolved.into_iter().map(|c| c.file_path).collect(),
        conflicts_pending: pending,
    }
}

fn plan_selective(live: &FileTree, target: &FileTree, paths: &[String]) -> Result<Plan> {
    let prefixes: Vec<NormalizedPath> = paths.iter().map(NormalizedPath::new).collect();
    if let Some(bad) = prefixes.iter().find(|p| !p.is_safe_relative()) {
        return Err(Error::invalid_name(format!("unsafe rollback path '{}'", bad)));
    }
    let selected = |path: &NormalizedPath| prefixes.iter().any(|p| path.starts_with(p));

    let mut tree = live.clone();
    let mut files_restored = Vec::new();
    for path in live.paths().filter(|p| selected(*p)) {
        if !target.contains(path.as_str()) {
            tree.remove(path.as_str());
            files_restored.push(path.to_string());
        }
    }
    for (path, content) in target.iter().filter(|(p, _)| selected(*p)) {
        if live.get(path.as_str()) != Some(content) {
            tree.insert(path.clone(), content.to_vec())?;
            files_restored.push(path.to_string());
        }
    }
    files_restored.sort();

    Ok(Plan {
        tree,
        files_restored,
        files_merged: Vec::new(),
        conflicts_resolved: Vec::new(),
        conflicts_pending: Vec::new(),
    })
}
