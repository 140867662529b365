//! SyncEngine: the operations exposed to collaborators
//!
//! The engine ties a collection scope to any number of projects. Every
//! mutating operation holds the `(collection, project)` lock, takes a safety
//! snapshot of each tree it is about to change, writes through a staged swap
//! and finally records the new baseline in the project's ledger.
//!
//! Anything that writes the shared collection tree also holds the collection
//! lock, which collection-wide snapshots and rollbacks take. It is always
//! acquired before the pair lock.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use skillsync_fs::{FileTree, OperationLock};
use skillsync_merge::{MergeSession, Resolution, TreeDiff, diff_trees};

use crate::artifact::{ArtifactId, ArtifactType};
use crate::baseline::BaselineStore;
use crate::config::SyncConfig;
use crate::drift::{self, DriftInput, DriftResult};
use crate::fingerprint::{ContentFingerprint, Fingerprinter, fingerprint_tree};
use crate::install::Installer;
use crate::ledger::{DeploymentLedger, DeploymentRecord};
use crate::resolution::{Direction, ResolutionOutcome, ResolutionStrategy};
use crate::rollback::{
    RenameSwap, RollbackAuditEntry, RollbackManager, RollbackMode, RollbackResult, TreeSwap,
};
use crate::scope::{Project, Scope};
use crate::snapshot::{Snapshot, SnapshotKind, SnapshotManager};
use crate::{Error, Result};

/// A merge computed by [`SyncEngine::begin_merge`], waiting for decisions.
#[derive(Debug, Clone)]
pub struct PendingMerge {
    pub project: Project,
    pub artifact: ArtifactId,
    pub session: MergeSession,
    /// Baseline the merge used as common ancestor
    pub base_hash: ContentFingerprint,
    collection_tree: FileTree,
    /// What the merge read, checked again before committing
    project_fingerprint: Option<ContentFingerprint>,
    collection_fingerprint: ContentFingerprint,
}

impl PendingMerge {
    pub fn conflicts(&self) -> &[skillsync_merge::ConflictRecord] {
        self.session.conflicts()
    }
}

/// Merge inputs gathered for one artifact.
struct MergeInputs {
    base_hash: ContentFingerprint,
    base: FileTree,
    project: FileTree,
    collection: FileTree,
    record: DeploymentRecord,
}

/// Locks held by one operation on a project.
struct OperationGuard {
    _collection: Option<OperationLock>,
    _pair: OperationLock,
}

pub struct SyncEngine {
    config: SyncConfig,
    collection: Scope,
    fingerprinter: Fingerprinter,
    snapshots: SnapshotManager,
    rollback: RollbackManager,
    installer: Installer,
}

impl SyncEngine {
    /// Create an engine for `collection`.
    pub fn new(config: SyncConfig, collection: Scope) -> Self {
        let fingerprinter = Fingerprinter::new(&config);
        Self {
            snapshots: SnapshotManager::new(&config),
            rollback: RollbackManager::new(&config),
            installer: Installer::new(fingerprinter.clone(), Arc::new(RenameSwap)),
            fingerprinter,
            collection,
            config,
        }
    }

    /// Replace the swap primitive used for every tree write.
    pub fn with_swap(mut self, swap: Arc<dyn TreeSwap>) -> Self {
        self.installer = self.installer.with_swap(swap.clone());
        self.rollback = self.rollback.with_swap(swap);
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn collection(&self) -> &Scope {
        &self.collection
    }

    /// `<collection>/<type dir>/<name>`
    pub fn collection_path(&self, artifact: &ArtifactId) -> PathBuf {
        self.collection.root().join(artifact.relative_dir())
    }

    /// `<project>/.claude/<type dir>/<name>`
    pub fn project_path(&self, project: &Project, artifact: &ArtifactId) -> PathBuf {
        project.deploy_root().join(artifact.relative_dir())
    }

    pub fn project_scope(&self, project: &Project) -> Scope {
        Scope::project(self.collection.name(), project)
    }

    fn lock(&self, scope: &Scope) -> Result<OperationLock> {
        let lock = OperationLock::acquire(
            &self.config.locks_dir(),
            scope.lock_key().clone(),
            self.config.lock_timeout(),
        )?;
        self.installer.report_leftovers(scope.name(), scope.root())?;
        Ok(lock)
    }

    /// Take the pair lock for `project`, preceded by the collection lock when
    /// the operation writes the collection tree.
    fn lock_project(&self, project: &Project, writes_collection: bool) -> Result<OperationGuard> {
        let collection = if writes_collection {
            Some(self.lock(&self.collection)?)
        } else {
            None
        };
        Ok(OperationGuard {
            _collection: collection,
            _pair: self.lock(&self.project_scope(project))?,
        })
    }

    fn load_ledger(&self, project: &Project) -> Result<DeploymentLedger> {
        DeploymentLedger::load(&project.ledger_path())
    }

    fn save_ledger(&self, project: &Project, ledger: &DeploymentLedger) -> Result<()> {
        ledger.save(&project.ledger_path(), self.config.robustness())
    }

    fn baselines(&self, project: &Project) -> BaselineStore {
        BaselineStore::for_project(project.root(), self.config.robustness())
    }

    fn load_tree(&self, path: &std::path::Path) -> Result<Option<FileTree>> {
        Ok(FileTree::load_if_exists(path, &self.config.exclude)?)
    }

    fn load_collection(&self, artifact: &ArtifactId) -> Result<FileTree> {
        let path = self.collection_path(artifact);
        self.load_tree(&path)?.ok_or_else(|| Error::ArtifactNotFound {
            artifact: artifact.to_string(),
            path,
        })
    }

    fn safety_snapshot(&self, scope: &Scope, reason: &str) -> Result<Snapshot> {
        self.snapshots
            .create_snapshot(scope, reason, SnapshotKind::Safety)
    }

    /// Write `tree` as the project copy of `artifact`, snapshotting the
    /// project first when an existing copy is replaced. Changed paths are
    /// added to `outcome`.
    fn write_project(
        &self,
        project: &Project,
        artifact: &ArtifactId,
        tree: &FileTree,
        reason: &str,
        outcome: &mut ResolutionOutcome,
    ) -> Result<()> {
        let path = self.project_path(project, artifact);
        let current = self.load_tree(&path)?;
        if current.as_ref() == Some(tree) {
            return Ok(());
        }

        let scope = self.project_scope(project);
        if current.is_some() {
            outcome
                .safety_snapshots
                .push(self.safety_snapshot(&scope, reason)?.id);
        }
        self.installer.install(scope.name(), &path, tree)?;
        let old = current.unwrap_or_default();
        outcome
            .files_changed
            .extend(diff_trees(&old, tree).files.into_iter().map(|f| f.path));
        Ok(())
    }

    /// Same as [`SyncEngine::write_project`] for the collection copy.
    fn write_collection(
        &self,
        artifact: &ArtifactId,
        tree: &FileTree,
        reason: &str,
        outcome: &mut ResolutionOutcome,
    ) -> Result<()> {
        let path = self.collection_path(artifact);
        let current = self.load_tree(&path)?;
        if current.as_ref() == Some(tree) {
            return Ok(());
        }

        outcome
            .safety_snapshots
            .push(self.safety_snapshot(&self.collection, reason)?.id);
        self.installer.install(self.collection.name(), &path, tree)?;
        let old = current.unwrap_or_default();
        outcome
            .files_changed
            .extend(diff_trees(&old, tree).files.into_iter().map(|f| f.path));
        Ok(())
    }

    /// Store `tree` as a baseline and record it for `artifact`.
    fn record_baseline(
        &self,
        project: &Project,
        ledger: &mut DeploymentLedger,
        artifact: &ArtifactId,
        tree: &FileTree,
        version: Option<String>,
        local_modifications: bool,
    ) -> Result<ContentFingerprint> {
        let hash = self.baselines(project).store(tree)?;
        let record = DeploymentRecord::new(artifact, self.collection.name(), hash.clone())
            .with_version(version)
            .with_local_modifications(local_modifications);
        ledger.record_deployment(record);
        Ok(hash)
    }

    /// Copy the collection's `artifact` into `project` and record it.
    ///
    /// # Errors
    ///
    /// [`Error::ArtifactNotFound`] if the collection has no such artifact.
    pub fn deploy(
        &self,
        project: &Project,
        artifact: &ArtifactId,
        version: Option<&str>,
    ) -> Result<DeploymentRecord> {
        let _guard = self.lock_project(project, false)?;

        let tree = self.load_collection(artifact)?;
        let mut outcome = ResolutionOutcome::new(
            artifact.clone(),
            ResolutionStrategy::Overwrite {
                direction: Direction::CollectionToProject,
            },
        );
        let reason = format!("before deploy of {}", artifact);
        self.write_project(project, artifact, &tree, &reason, &mut outcome)?;

        let mut ledger = self.load_ledger(project)?;
        self.record_baseline(
            project,
            &mut ledger,
            artifact,
            &tree,
            version.map(str::to_string),
            false,
        )?;
        self.save_ledger(project, &ledger)?;

        let record = ledger
            .get(&artifact.name, artifact.artifact_type)
            .cloned()
            .ok_or_else(|| self.not_deployed(project, artifact))?;
        tracing::info!(
            artifact = %artifact,
            project = %project.name(),
            hash = %record.content_hash,
            changed = outcome.files_changed.len(),
            "artifact deployed"
        );
        Ok(record)
    }

    /// Remove the project copy of `artifact` and its ledger record.
    ///
    /// # Errors
    ///
    /// [`Error::DeploymentNotFound`] if the project has no record for it.
    pub fn undeploy(&self, project: &Project, artifact: &ArtifactId) -> Result<DeploymentRecord> {
        let scope = self.project_scope(project);
        let _guard = self.lock_project(project, false)?;

        let mut ledger = self.load_ledger(project)?;
        let record = ledger
            .remove_deployment(&artifact.name, artifact.artifact_type)
            .ok_or_else(|| self.not_deployed(project, artifact))?;

        let path = self.project_path(project, artifact);
        if path.exists() {
            self.safety_snapshot(&scope, &format!("before undeploy of {}", artifact))?;
            self.installer.remove(scope.name(), &path)?;
        }
        self.save_ledger(project, &ledger)?;

        tracing::info!(artifact = %artifact, project = %project.name(), "artifact undeployed");
        Ok(record)
    }

    /// Classify drift of one artifact.
    pub fn detect_drift(&self, project: &Project, artifact: &ArtifactId) -> Result<DriftResult> {
        self.detect_drift_at_version(project, artifact, None)
    }

    /// Classify drift, comparing the recorded version against the version
    /// the collection currently advertises.
    pub fn detect_drift_at_version(
        &self,
        project: &Project,
        artifact: &ArtifactId,
        collection_version: Option<&str>,
    ) -> Result<DriftResult> {
        let ledger = self.load_ledger(project)?;
        self.drift_with(&ledger, project, artifact, collection_version)
    }

    fn drift_with(
        &self,
        ledger: &DeploymentLedger,
        project: &Project,
        artifact: &ArtifactId,
        collection_version: Option<&str>,
    ) -> Result<DriftResult> {
        let record = ledger.get(&artifact.name, artifact.artifact_type);
        let input = DriftInput::new(
            record.map(|r| r.content_hash.clone()),
            self.fingerprinter
                .fingerprint_if_exists(&self.collection_path(artifact))?,
            self.fingerprinter
                .fingerprint_if_exists(&self.project_path(project, artifact))?,
        )
        .with_versions(
            record.and_then(|r| r.version.clone()),
            collection_version.map(str::to_string),
        );
        Ok(drift::detect(artifact.clone(), input))
    }

    /// Drift of every artifact the project knows about: everything in its
    /// ledger plus every artifact directory under its deploy root.
    pub fn detect_drift_all(&self, project: &Project) -> Result<Vec<DriftResult>> {
        let ledger = self.load_ledger(project)?;
        let mut artifacts: BTreeSet<ArtifactId> =
            ledger.list().iter().map(DeploymentRecord::artifact).collect();

        for artifact_type in ArtifactType::ALL {
            let dir = project.deploy_root().join(artifact_type.dir_name());
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(Error::io(&dir, e)),
            };
            for entry in entries {
                let entry = entry.map_err(|e| Error::io(&dir, e))?;
                let file_type = entry.file_type().map_err(|e| Error::io(entry.path(), e))?;
                if !file_type.is_dir() {
                    continue;
                }
                if let Ok(id) = ArtifactId::new(entry.file_name().to_string_lossy(), artifact_type) {
                    artifacts.insert(id);
                }
            }
        }

        artifacts
            .iter()
            .map(|artifact| self.drift_with(&ledger, project, artifact, None))
            .collect()
    }

    /// Settle the drift of one artifact with `strategy`.
    pub fn resolve(
        &self,
        project: &Project,
        artifact: &ArtifactId,
        strategy: ResolutionStrategy,
    ) -> Result<ResolutionOutcome> {
        let mut outcome = ResolutionOutcome::new(artifact.clone(), strategy.clone());
        if strategy == ResolutionStrategy::Skip {
            tracing::debug!(artifact = %artifact, project = %project.name(), "resolution skipped");
            return Ok(outcome);
        }

        let _guard = self.lock_project(project, strategy.writes_collection())?;
        let reason = format!("before {} of {}", strategy.name(), artifact);

        match &strategy {
            ResolutionStrategy::Skip => {}
            ResolutionStrategy::Overwrite {
                direction: Direction::CollectionToProject,
            } => self.overwrite_project(project, artifact, &reason, &mut outcome)?,
            ResolutionStrategy::Overwrite {
                direction: Direction::ProjectToCollection,
            } => self.overwrite_collection(project, artifact, &reason, &mut outcome)?,
            ResolutionStrategy::Merge => {
                let inputs = self.merge_inputs(project, artifact)?;
                let merge = skillsync_merge::diff3(&inputs.base, &inputs.project, &inputs.collection);
                // Pending conflicts are written with inline markers
                outcome.conflicts = merge.pending().cloned().collect();
                if !outcome.conflicts.is_empty() {
                    tracing::warn!(
                        artifact = %artifact,
                        project = %project.name(),
                        pending = outcome.conflicts.len(),
                        "merge written with conflict markers"
                    );
                }
                self.commit_merge(
                    project,
                    artifact,
                    &merge.merged,
                    &inputs.collection,
                    &inputs.record,
                    &reason,
                    &mut outcome,
                )?;
            }
            ResolutionStrategy::Fork { new_name } => {
                self.fork(project, artifact, new_name, &reason, &mut outcome)?
            }
        }

        outcome.applied = true;
        tracing::info!(
            artifact = %artifact,
            project = %project.name(),
            strategy = %strategy,
            changed = outcome.files_changed.len(),
            "resolution applied"
        );
        Ok(outcome)
    }

    fn overwrite_project(
        &self,
        project: &Project,
        artifact: &ArtifactId,
        reason: &str,
        outcome: &mut ResolutionOutcome,
    ) -> Result<()> {
        let mut ledger = self.load_ledger(project)?;
        let version = ledger
            .get(&artifact.name, artifact.artifact_type)
            .and_then(|r| r.version.clone());

        match self.load_tree(&self.collection_path(artifact))? {
            Some(tree) => {
                self.write_project(project, artifact, &tree, reason, outcome)?;
                outcome.baseline = Some(self.record_baseline(
                    project, &mut ledger, artifact, &tree, version, false,
                )?);
            }
            // Collection copy is gone: the project follows
            None => {
                let path = self.project_path(project, artifact);
                if path.exists() {
                    let scope = self.project_scope(project);
                    outcome.safety_snapshots.push(self.safety_snapshot(&scope, reason)?.id);
                    let old = self.load_tree(&path)?.unwrap_or_default();
                    outcome.files_changed = old.paths().map(ToString::to_string).collect();
                    self.installer.remove(scope.name(), &path)?;
                }
                ledger.remove_deployment(&artifact.name, artifact.artifact_type);
            }
        }
        self.save_ledger(project, &ledger)
    }

    fn overwrite_collection(
        &self,
        project: &Project,
        artifact: &ArtifactId,
        reason: &str,
        outcome: &mut ResolutionOutcome,
    ) -> Result<()> {
        let mut ledger = self.load_ledger(project)?;
        let version = ledger
            .get(&artifact.name, artifact.artifact_type)
            .and_then(|r| r.version.clone());

        match self.load_tree(&self.project_path(project, artifact))? {
            Some(tree) => {
                self.write_collection(artifact, &tree, reason, outcome)?;
                outcome.baseline = Some(self.record_baseline(
                    project, &mut ledger, artifact, &tree, version, false,
                )?);
            }
            // Project copy is gone: the collection follows
            None => {
                let path = self.collection_path(artifact);
                if path.exists() {
                    outcome
                        .safety_snapshots
                        .push(self.safety_snapshot(&self.collection, reason)?.id);
                    let old = self.load_tree(&path)?.unwrap_or_default();
                    outcome.files_changed = old.paths().map(ToString::to_string).collect();
                    self.installer.remove(self.collection.name(), &path)?;
                }
                ledger.remove_deployment(&artifact.name, artifact.artifact_type);
            }
        }
        self.save_ledger(project, &ledger)
    }

    fn fork(
        &self,
        project: &Project,
        artifact: &ArtifactId,
        new_name: &str,
        reason: &str,
        outcome: &mut ResolutionOutcome,
    ) -> Result<()> {
        let forked = artifact.renamed(new_name)?;
        if self.collection_path(&forked).exists() {
            return Err(Error::invalid_name(format!(
                "{} already exists in collection '{}'",
                forked,
                self.collection.name()
            )));
        }
        if self.project_path(project, &forked).exists() {
            return Err(Error::invalid_name(format!(
                "{} already exists in project '{}'",
                forked,
                project.name()
            )));
        }
        let project_path = self.project_path(project, artifact);
        let local = self
            .load_tree(&project_path)?
            .ok_or_else(|| Error::ArtifactNotFound {
                artifact: artifact.to_string(),
                path: project_path,
            })?;

        // Only the new identity is written; the original keeps its files and
        // its ledger record on both sides
        let mut ledger = self.load_ledger(project)?;
        self.write_collection(&forked, &local, reason, outcome)?;
        self.write_project(project, &forked, &local, reason, outcome)?;
        outcome.baseline =
            Some(self.record_baseline(project, &mut ledger, &forked, &local, None, false)?);
        self.save_ledger(project, &ledger)?;

        outcome.forked = Some(forked);
        Ok(())
    }

    /// Gather base, project and collection trees for a merge.
    ///
    /// The base is the stored baseline for the nearest common ancestor of the
    /// recorded baseline and the collection's current content, falling back
    /// to the recorded baseline itself.
    fn merge_inputs(&self, project: &Project, artifact: &ArtifactId) -> Result<MergeInputs> {
        let ledger = self.load_ledger(project)?;
        let record = ledger
            .get(&artifact.name, artifact.artifact_type)
            .cloned()
            .ok_or_else(|| self.not_deployed(project, artifact))?;

        let collection = self.load_collection(artifact)?;
        let local = self
            .load_tree(&self.project_path(project, artifact))?
            .unwrap_or_default();

        let collection_hash = fingerprint_tree(&collection);
        let ancestor = ledger.find_common_ancestor(&record.content_hash, &collection_hash);
        let store = self.baselines(project);
        let base_hash = store
            .first_available(ancestor.iter().chain(std::iter::once(&record.content_hash)))
            .cloned()
            .ok_or_else(|| Error::BaselineUnavailable {
                hash: record.content_hash.to_string(),
            })?;
        let base = store.load(&base_hash)?;
        tracing::debug!(artifact = %artifact, base = %base_hash, "merge base loaded");

        Ok(MergeInputs {
            base_hash,
            base,
            project: local,
            collection,
            record,
        })
    }

    /// Write a merged tree into the project and record the collection's
    /// content as the new baseline.
    #[allow(clippy::too_many_arguments)]
    fn commit_merge(
        &self,
        project: &Project,
        artifact: &ArtifactId,
        merged: &FileTree,
        collection: &FileTree,
        previous: &DeploymentRecord,
        reason: &str,
        outcome: &mut ResolutionOutcome,
    ) -> Result<()> {
        self.write_project(project, artifact, merged, reason, outcome)?;

        let mut ledger = self.load_ledger(project)?;
        let diverges = merged != collection;
        outcome.baseline = Some(self.record_baseline(
            project,
            &mut ledger,
            artifact,
            collection,
            previous.version.clone(),
            diverges,
        )?);
        self.save_ledger(project, &ledger)
    }

    /// Start an interactive merge of the project copy with the collection.
    ///
    /// Nothing is written. The session remembers the fingerprints of both
    /// copies so a later commit can tell whether they moved on.
    pub fn begin_merge(&self, project: &Project, artifact: &ArtifactId) -> Result<PendingMerge> {
        let _guard = self.lock_project(project, false)?;
        let inputs = self.merge_inputs(project, artifact)?;
        let project_fingerprint = self
            .fingerprinter
            .fingerprint_if_exists(&self.project_path(project, artifact))?;
        let session = skillsync_merge::begin_merge(&inputs.base, &inputs.project, &inputs.collection);
        tracing::debug!(
            artifact = %artifact,
            conflicts = session.conflicts().len(),
            pending = session.pending().len(),
            "merge session started"
        );
        Ok(PendingMerge {
            project: project.clone(),
            artifact: artifact.clone(),
            session,
            base_hash: inputs.base_hash,
            collection_fingerprint: fingerprint_tree(&inputs.collection),
            collection_tree: inputs.collection,
            project_fingerprint,
        })
    }

    /// Commit caller decisions for a merge started with
    /// [`SyncEngine::begin_merge`].
    ///
    /// # Errors
    ///
    /// - `UnresolvedConflicts` if a pending conflict has no decision
    /// - [`Error::StaleMerge`] if the project or collection copy changed
    ///   since [`SyncEngine::begin_merge`]
    ///
    /// Nothing is written in either case.
    pub fn apply_resolutions(
        &self,
        pending: &PendingMerge,
        decisions: &BTreeMap<String, Resolution>,
    ) -> Result<ResolutionOutcome> {
        let resolved = pending.session.apply_resolutions(decisions)?;

        let project = &pending.project;
        let artifact = &pending.artifact;
        let _guard = self.lock_project(project, false)?;
        self.ensure_current(pending)?;

        let previous = self
            .load_ledger(project)?
            .get(&artifact.name, artifact.artifact_type)
            .cloned()
            .ok_or_else(|| self.not_deployed(project, artifact))?;

        let mut outcome = ResolutionOutcome::new(artifact.clone(), ResolutionStrategy::Merge);
        self.commit_merge(
            project,
            artifact,
            &resolved.tree,
            &pending.collection_tree,
            &previous,
            &format!("before merge of {}", artifact),
            &mut outcome,
        )?;
        outcome.applied = true;

        tracing::info!(
            artifact = %artifact,
            project = %project.name(),
            resolved = resolved.resolved.len(),
            auto_merged = resolved.auto_merged.len(),
            "merge decisions applied"
        );
        Ok(outcome)
    }

    /// Fail with [`Error::StaleMerge`] unless both copies still hash to what
    /// the session read.
    fn ensure_current(&self, pending: &PendingMerge) -> Result<()> {
        let stale = |side: &str| Error::StaleMerge {
            artifact: pending.artifact.to_string(),
            project: pending.project.name().to_string(),
            side: side.to_string(),
        };
        let project_now = self
            .fingerprinter
            .fingerprint_if_exists(&self.project_path(&pending.project, &pending.artifact))?;
        if project_now != pending.project_fingerprint {
            return Err(stale("project"));
        }
        let collection_now = self
            .fingerprinter
            .fingerprint_if_exists(&self.collection_path(&pending.artifact))?;
        if collection_now.as_ref() != Some(&pending.collection_fingerprint) {
            return Err(stale("collection"));
        }
        Ok(())
    }

    /// What deploying the collection's copy over the project's would change.
    pub fn preview(&self, project: &Project, artifact: &ArtifactId) -> Result<TreeDiff> {
        let current = self
            .load_tree(&self.project_path(project, artifact))?
            .unwrap_or_default();
        let incoming = self
            .load_tree(&self.collection_path(artifact))?
            .unwrap_or_default();
        Ok(diff_trees(&current, &incoming))
    }

    /// Snapshot the whole collection.
    pub fn create_snapshot(&self, message: &str) -> Result<Snapshot> {
        let _lock = self.lock(&self.collection)?;
        self.snapshots
            .create_snapshot(&self.collection, message, SnapshotKind::Manual)
    }

    pub fn list_snapshots(&self) -> Result<Vec<Snapshot>> {
        self.snapshots.list_snapshots(&self.collection)
    }

    /// Roll the collection back to `snapshot_id`.
    pub fn rollback(&self, snapshot_id: &str, mode: RollbackMode) -> Result<RollbackResult> {
        self.rollback.rollback(&self.collection, snapshot_id, mode)
    }

    /// Snapshots of a project's deploy root, including safety snapshots.
    pub fn list_project_snapshots(&self, project: &Project) -> Result<Vec<Snapshot>> {
        self.snapshots.list_snapshots(&self.project_scope(project))
    }

    /// Roll a project's deploy root back to one of its snapshots.
    pub fn rollback_project(
        &self,
        project: &Project,
        snapshot_id: &str,
        mode: RollbackMode,
    ) -> Result<RollbackResult> {
        self.rollback
            .rollback(&self.project_scope(project), snapshot_id, mode)
    }

    /// The collection's rollback audit trail.
    pub fn audit_entries(&self) -> Result<Vec<RollbackAuditEntry>> {
        self.rollback.audit_entries(&self.collection)
    }

    pub fn list_deployments(&self, project: &Project) -> Result<Vec<DeploymentRecord>> {
        Ok(self.load_ledger(project)?.list().to_vec())
    }

    fn not_deployed(&self, project: &Project, artifact: &ArtifactId) -> Error {
        Error::DeploymentNotFound {
            artifact: artifact.to_string(),
            project: project.name().to_string(),
        }
    }
}
