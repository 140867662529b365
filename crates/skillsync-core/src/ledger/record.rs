//! Deployment record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::artifact::{ArtifactId, ArtifactType};
use crate::fingerprint::ContentFingerprint;

/// What was last deployed for one artifact in one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub artifact_name: String,
    pub artifact_type: ArtifactType,
    /// Name of the collection the content came from
    pub from_collection: String,
    pub deployed_at: DateTime<Utc>,
    /// Fingerprint of the deployed content: the baseline
    pub content_hash: ContentFingerprint,
    /// Baseline this one replaced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_hash: Option<ContentFingerprint>,
    /// Earlier baselines, newest first
    #[serde(default)]
    pub version_lineage: Vec<ContentFingerprint>,
    /// True when the project copy was knowingly left different from the
    /// baseline (for example after a merge kept local edits)
    #[serde(default)]
    pub local_modifications: bool,
    /// Collection version string at deploy time, if it has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl DeploymentRecord {
    /// A fresh record with no history.
    pub fn new(
        artifact: &ArtifactId,
        from_collection: impl Into<String>,
        content_hash: ContentFingerprint,
    ) -> Self {
        Self {
            artifact_name: artifact.name.clone(),
            artifact_type: artifact.artifact_type,
            from_collection: from_collection.into(),
            deployed_at: Utc::now(),
            content_hash,
            parent_hash: None,
            version_lineage: Vec::new(),
            local_modifications: false,
            version: None,
        }
    }

    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    pub fn with_local_modifications(mut self, modified: bool) -> Self {
        self.local_modifications = modified;
        self
    }

    pub fn artifact(&self) -> ArtifactId {
        ArtifactId {
            name: self.artifact_name.clone(),
            artifact_type: self.artifact_type,
        }
    }

    pub fn matches(&self, name: &str, artifact_type: ArtifactType) -> bool {
        self.artifact_name == name && self.artifact_type == artifact_type
    }
}
