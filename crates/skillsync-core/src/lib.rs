//! Core synchronization engine for skillsync
//!
//! Keeps three locations of every artifact (skills, commands, agents, MCP
//! server definitions and hooks) consistent: the shared collection, the
//! copy deployed into a project, and the baseline recorded at deploy time.
//!
//! - **Fingerprinting**: deterministic content hashes of artifact trees
//! - **Drift detection**: classification of how the three locations relate
//! - **Deployment ledger**: per-project baselines and their version lineage
//! - **Resolution**: overwrite, merge, fork or skip for drifted artifacts
//! - **Snapshots and rollback**: crash-safe restore with an audit trail
//!
//! # Architecture
//!
//! ```text
//!                  SyncEngine
//!                      |
//!     +--------+-------+-------+----------+
//!     |        |       |       |          |
//!   drift   ledger  snapshot rollback  resolution
//!     |        |       |       |          |
//!     +--------+-------+-------+----------+
//!                      |
//!        skillsync-merge    skillsync-fs
//! ```
//!
//! # Example
//!
//! ```no_run
//! use skillsync_core::{ArtifactId, Project, Scope, SyncConfig, SyncEngine};
//!
//! fn example() -> skillsync_core::Result<()> {
//!     let config = SyncConfig::with_store_dir("/home/me/.skillsync");
//!     let collection = Scope::collection("default", "/home/me/skills")?;
//!     let engine = SyncEngine::new(config, collection);
//!
//!     let project = Project::new("webapp", "/work/webapp")?;
//!     let skill = ArtifactId::skill("code-review")?;
//!     engine.deploy(&project, &skill, Some("1.0.0"))?;
//!
//!     let drift = engine.detect_drift(&project, &skill)?;
//!     println!("{}: {}", skill, drift.drift_type);
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod artifact;
pub mod baseline;
pub mod config;
pub mod drift;
pub mod engine;
pub mod error;
pub mod fingerprint;
mod install;
pub mod ledger;
pub mod resolution;
pub mod rollback;
pub mod scope;
pub mod snapshot;

pub use artifact::{ArtifactId, ArtifactType};
pub use baseline::BaselineStore;
pub use config::SyncConfig;
pub use drift::{DriftInput, DriftResult, DriftType, Recommendation};
pub use engine::{PendingMerge, SyncEngine};
pub use error::{Error, Result};
pub use fingerprint::{ContentFingerprint, Fingerprinter, fingerprint_tree};
pub use ledger::{DeploymentLedger, DeploymentRecord};
pub use resolution::{Direction, ResolutionOutcome, ResolutionStrategy};
pub use rollback::{
    AuditLog, OperationType, RenameSwap, RollbackAuditEntry, RollbackManager, RollbackMode,
    RollbackResult, TreeSwap,
};
pub use scope::{Project, Scope};
pub use snapshot::{Snapshot, SnapshotId, SnapshotKind, SnapshotManager};

pub use skillsync_merge::{ConflictKind, ConflictRecord, Resolution, TreeDiff};
