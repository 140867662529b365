//! Drift classification across collection, project and baseline
//!
//! [`detect`] is a pure function of the three optional fingerprints (plus the
//! recorded and current version strings). Every combination of presence and
//! equality maps to exactly one [`DriftType`] and [`Recommendation`].

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::artifact::ArtifactId;
use crate::fingerprint::ContentFingerprint;

/// Relationship between the three copies of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftType {
    /// All copies agree
    None,
    /// One side changed since the last deployment, or the project holds an
    /// untracked copy
    Modified,
    /// The collection moved on; the project still has the baseline
    Outdated,
    /// Both sides diverged from the baseline, or cannot be reconciled
    Conflict,
    /// In the collection but never deployed
    Added,
    /// Gone from the collection
    Removed,
    /// Content agrees but the recorded version string differs
    VersionMismatch,
}

impl std::fmt::Display for DriftType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Modified => write!(f, "modified"),
            Self::Outdated => write!(f, "outdated"),
            Self::Conflict => write!(f, "conflict"),
            Self::Added => write!(f, "added"),
            Self::Removed => write!(f, "removed"),
            Self::VersionMismatch => write!(f, "version_mismatch"),
        }
    }
}

/// Suggested next step for a drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    None,
    PullFromProject,
    DeployToProject,
    RemoveFromProject,
    ReviewManually,
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::PullFromProject => write!(f, "pull_from_project"),
            Self::DeployToProject => write!(f, "deploy_to_project"),
            Self::RemoveFromProject => write!(f, "remove_from_project"),
            Self::ReviewManually => write!(f, "review_manually"),
        }
    }
}

/// Observations fed to [`detect`]. `None` means the copy is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriftInput {
    pub baseline: Option<ContentFingerprint>,
    pub collection: Option<ContentFingerprint>,
    pub project: Option<ContentFingerprint>,
    /// Version recorded when the baseline was deployed
    pub deployed_version: Option<String>,
    /// Version the collection currently advertises
    pub collection_version: Option<String>,
}

impl DriftInput {
    pub fn new(
        baseline: Option<ContentFingerprint>,
        collection: Option<ContentFingerprint>,
        project: Option<ContentFingerprint>,
    ) -> Self {
        Self {
            baseline,
            collection,
            project,
            ..Self::default()
        }
    }

    /// Build from textual fingerprints.
    ///
    /// # Errors
    ///
    /// [`crate::Error::MalformedFingerprint`] if any present value is not
    /// canonical. Absence is never an error.
    pub fn parse(
        baseline: Option<&str>,
        collection: Option<&str>,
        project: Option<&str>,
    ) -> Result<Self> {
        let parse = |v: Option<&str>| v.map(ContentFingerprint::parse).transpose();
        Ok(Self::new(parse(baseline)?, parse(collection)?, parse(project)?))
    }

    pub fn with_versions(
        mut self,
        deployed: Option<String>,
        collection: Option<String>,
    ) -> Self {
        self.deployed_version = deployed;
        self.collection_version = collection;
        self
    }
}

/// Drift state of one artifact. Computed on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftResult {
    pub artifact: ArtifactId,
    pub drift_type: DriftType,
    pub baseline_hash: Option<ContentFingerprint>,
    pub collection_hash: Option<ContentFingerprint>,
    pub project_hash: Option<ContentFingerprint>,
    pub recommendation: Recommendation,
    /// Both sides diverged from the baseline to identical content
    pub converged: bool,
}

impl DriftResult {
    pub fn is_clean(&self) -> bool {
        self.drift_type == DriftType::None
    }
}

/// Classify the relationship between baseline, collection and project.
pub fn detect(artifact: ArtifactId, input: DriftInput) -> DriftResult {
    use DriftType as D;
    use Recommendation as R;

    let DriftInput {
        baseline,
        collection,
        project,
        deployed_version,
        collection_version,
    } = input;

    let mut converged = false;
    let (drift_type, recommendation) = match (&baseline, &collection, &project) {
        (Some(b), Some(c), Some(p)) => match (c == b, p == b) {
            (true, true) => match (&deployed_version, &collection_version) {
                (Some(deployed), Some(current)) if deployed != current => {
                    (D::VersionMismatch, R::ReviewManually)
                }
                _ => (D::None, R::None),
            },
            (true, false) => (D::Modified, R::PullFromProject),
            (false, true) => (D::Outdated, R::DeployToProject),
            (false, false) => {
                converged = c == p;
                (D::Conflict, R::ReviewManually)
            }
        },
        (Some(b), None, Some(p)) if p == b => (D::Removed, R::RemoveFromProject),
        (Some(_), None, Some(_)) => (D::Conflict, R::ReviewManually),
        (Some(_), None, None) => (D::Removed, R::RemoveFromProject),
        // Project copy deleted by hand while the collection kept the baseline
        (Some(b), Some(c), None) if c == b => (D::Modified, R::ReviewManually),
        (Some(_), Some(_), None) => (D::Conflict, R::ReviewManually),
        // Untracked project copy
        (None, Some(c), Some(p)) if c == p => (D::None, R::None),
        (None, Some(_), Some(_)) => (D::Conflict, R::ReviewManually),
        (None, Some(_), None) => (D::Added, R::DeployToProject),
        (None, None, Some(_)) => (D::Modified, R::PullFromProject),
        (None, None, None) => (D::None, R::None),
    };

    if drift_type != D::None {
        tracing::debug!(artifact = %artifact, %drift_type, %recommendation, converged, "drift detected");
    }

    DriftResult {
        artifact,
        drift_type,
        baseline_hash: baseline,
        collection_hash: collection,
        project_hash: project,
        recommendation,
        converged,
    }
}
