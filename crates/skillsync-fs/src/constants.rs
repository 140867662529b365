//! Names of the directories and files skillsync keeps on disk.

use std::path::Path;

/// Well-known store and project paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePath {
    /// Per-project metadata directory (`.skillsync`)
    ProjectMeta,
    /// Deployment ledger inside the project metadata directory
    Ledger,
    /// Content-addressed baseline archives inside the project metadata directory
    Baselines,
    /// Directory under the store root holding one sub-directory per scope
    Snapshots,
    /// Snapshot index file inside a scope directory
    SnapshotIndex,
    /// Rollback audit trail inside a scope directory
    AuditLog,
    /// Directory under the store root holding operation lock files
    Locks,
    /// Directory inside a project where artifacts are deployed
    DeployRoot,
}

impl StorePath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectMeta => ".skillsync",
            Self::Ledger => "deployments.toml",
            Self::Baselines => "baselines",
            Self::Snapshots => "snapshots",
            Self::SnapshotIndex => "index.toml",
            Self::AuditLog => "audit.toml",
            Self::Locks => "locks",
            Self::DeployRoot => ".claude",
        }
    }
}

impl AsRef<Path> for StorePath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for StorePath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for StorePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
