//! Error types for skillsync-merge

/// Result type for skillsync-merge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while merging.
///
/// Conflicts are not errors; they are reported in a
/// [`MergeOutcome`](crate::MergeOutcome).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Pending conflicts were left without a decision
    #[error("Unresolved conflicts remain: {}", paths.join(", "))]
    UnresolvedConflicts { paths: Vec<String> },

    /// A decision was supplied for a path that has no conflict
    #[error("No conflict recorded for path: {path}")]
    UnknownConflict { path: String },

    /// Filesystem error from skillsync-fs
    #[error(transparent)]
    Fs(#[from] skillsync_fs::Error),
}
