//! Error types for skillsync-core

use std::path::PathBuf;

/// Result type for skillsync-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in skillsync-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A file could not be read while fingerprinting; no partial hash is returned
    #[error("Failed to hash {path}: {source}")]
    HashComputation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed fingerprint '{value}': expected sha256:<64 hex digits>")]
    MalformedFingerprint { value: String },

    #[error("Invalid name: {reason}")]
    InvalidName { reason: String },

    /// Writing a tree into place failed. `mutated` is false when the live tree
    /// was never touched.
    #[error(
        "Atomic write of scope '{scope}' failed ({}): {source}",
        if *mutated { "live tree may have been modified" } else { "live tree untouched" }
    )]
    AtomicWrite {
        scope: String,
        mutated: bool,
        #[source]
        source: skillsync_fs::Error,
    },

    #[error("Snapshot '{id}' not found in scope '{scope}'")]
    SnapshotNotFound { scope: String, id: String },

    #[error("Snapshot '{id}' is corrupt: {reason}")]
    SnapshotCorrupt { id: String, reason: String },

    #[error("No deployment of {artifact} recorded in project '{project}'")]
    DeploymentNotFound { artifact: String, project: String },

    #[error("Artifact {artifact} not found at {path}")]
    ArtifactNotFound { artifact: String, path: PathBuf },

    /// A copy changed between `begin_merge` and `apply_resolutions`
    #[error("Merge of {artifact} in project '{project}' is stale: the {side} copy changed since it began")]
    StaleMerge {
        artifact: String,
        project: String,
        side: String,
    },

    /// The stored copy of a deployed baseline is missing or unreadable
    #[error("Baseline content {hash} is not available")]
    BaselineUnavailable { hash: String },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from skillsync-fs
    #[error(transparent)]
    Fs(#[from] skillsync_fs::Error),

    /// Merge error from skillsync-merge
    #[error(transparent)]
    Merge(#[from] skillsync_merge::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    /// I/O failure at a known path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Fs(skillsync_fs::Error::io(path, source))
    }

    pub(crate) fn invalid_name(reason: impl Into<String>) -> Self {
        Self::InvalidName {
            reason: reason.into(),
        }
    }

    /// Whether the caller may retry the same operation unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fs(e) => e.is_retryable(),
            Self::Merge(skillsync_merge::Error::Fs(e)) => e.is_retryable(),
            _ => false,
        }
    }
}
