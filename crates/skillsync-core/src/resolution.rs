//! Resolution strategies for drifted artifacts

use serde::{Deserialize, Serialize};
use skillsync_merge::ConflictRecord;

use crate::artifact::ArtifactId;
use crate::drift::{DriftResult, Recommendation};
use crate::fingerprint::ContentFingerprint;
use crate::snapshot::SnapshotId;

/// Which copy wins an overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    CollectionToProject,
    ProjectToCollection,
}

/// How to settle a drift. Handled by one exhaustive match in the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ResolutionStrategy {
    /// Copy one side over the other
    Overwrite { direction: Direction },
    /// Three-way merge of project and collection against the baseline. The
    /// merged tree is written to the project; pending conflicts keep inline
    /// markers for the caller to resolve.
    Merge,
    /// Copy the project's version into a new artifact on both sides,
    /// leaving the original untouched
    Fork { new_name: String },
    /// Leave everything as it is
    Skip,
}

impl ResolutionStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Overwrite { .. } => "overwrite",
            Self::Merge => "merge",
            Self::Fork { .. } => "fork",
            Self::Skip => "skip",
        }
    }

    /// Whether applying this strategy writes the collection tree.
    pub fn writes_collection(&self) -> bool {
        matches!(
            self,
            Self::Overwrite {
                direction: Direction::ProjectToCollection
            } | Self::Fork { .. }
        )
    }

    /// Strategy that carries out a drift's recommendation, if one does.
    ///
    /// `remove_from_project` has no strategy; callers undeploy instead.
    pub fn recommended_for(drift: &DriftResult) -> Option<Self> {
        match drift.recommendation {
            Recommendation::None => Some(Self::Skip),
            Recommendation::DeployToProject => Some(Self::Overwrite {
                direction: Direction::CollectionToProject,
            }),
            Recommendation::PullFromProject => Some(Self::Overwrite {
                direction: Direction::ProjectToCollection,
            }),
            Recommendation::ReviewManually => Some(Self::Merge),
            Recommendation::RemoveFromProject => None,
        }
    }
}

impl std::fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overwrite {
                direction: Direction::CollectionToProject,
            } => write!(f, "overwrite (collection -> project)"),
            Self::Overwrite {
                direction: Direction::ProjectToCollection,
            } => write!(f, "overwrite (project -> collection)"),
            Self::Fork { new_name } => write!(f, "fork as '{}'", new_name),
            other => f.write_str(other.name()),
        }
    }
}

/// What a resolution did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionOutcome {
    pub artifact: ArtifactId,
    pub strategy: ResolutionStrategy,
    /// False when nothing was written
    pub applied: bool,
    /// Safety snapshots taken before writing
    pub safety_snapshots: Vec<SnapshotId>,
    /// Paths whose content changed on the written side
    pub files_changed: Vec<String>,
    /// Conflicts a merge left in the project copy as inline markers
    pub conflicts: Vec<ConflictRecord>,
    /// Baseline recorded in the ledger afterwards
    pub baseline: Option<ContentFingerprint>,
    /// New artifact created by a fork
    pub forked: Option<ArtifactId>,
}

impl ResolutionOutcome {
    pub(crate) fn new(artifact: ArtifactId, strategy: ResolutionStrategy) -> Self {
        Self {
            artifact,
            strategy,
            applied: false,
            safety_snapshots: Vec::new(),
            files_changed: Vec::new(),
            conflicts: Vec::new(),
            baseline: None,
            forked: None,
        }
    }
}
