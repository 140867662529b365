//! Conflict records produced by a tree merge

use serde::Serialize;

/// How two sides disagree about one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Both sides changed the file differently and the change cannot be merged
    Content,
    /// One side deleted the file while the other modified it
    Deletion,
    /// Both sides changed a text file and the line-level merge succeeded
    BothModified,
    /// The file is new on both sides with different content
    AddAdd,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Content => write!(f, "content"),
            Self::Deletion => write!(f, "deletion"),
            Self::BothModified => write!(f, "both_modified"),
            Self::AddAdd => write!(f, "add_add"),
        }
    }
}

/// What the engine proposes to do about a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedStrategy {
    UseLocal,
    UseRemote,
    /// Keep the automatic line-level merge
    Merge,
    /// A person has to decide
    Manual,
}

/// One file path on which local and remote disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictRecord {
    /// Normalized path relative to the artifact root
    pub file_path: String,
    pub kind: ConflictKind,
    /// Content in the common ancestor, if the file existed there
    pub base: Option<Vec<u8>>,
    /// Content on the local side, if present
    pub local: Option<Vec<u8>>,
    /// Content on the remote side, if present
    pub remote: Option<Vec<u8>>,
    /// True when the merged output already holds a clean resolution
    pub auto_mergeable: bool,
    pub suggested_strategy: SuggestedStrategy,
    /// True when any side holds binary content
    pub is_binary: bool,
}

impl ConflictRecord {
    /// True when the conflict still needs a caller decision
    pub fn is_pending(&self) -> bool {
        !self.auto_mergeable
    }
}
