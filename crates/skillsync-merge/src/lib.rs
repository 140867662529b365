//! Three-way merge and diff engine for skillsync
//!
//! - [`diff3`] merges a base, local and remote [`FileTree`](skillsync_fs::FileTree)
//!   path by path and reports [`ConflictRecord`]s as data
//! - [`merge_text`] is the line-level diff3 used for text files changed on
//!   both sides
//! - [`begin_merge`] / [`MergeSession::apply_resolutions`] split interactive
//!   resolution into two non-blocking phases
//! - [`TreeDiff`] renders file-level differences for previews

pub mod conflict;
pub mod diff;
pub mod error;
pub mod merge;
pub mod session;
pub mod text;

pub use conflict::{ConflictKind, ConflictRecord, SuggestedStrategy};
pub use diff::{FileDiff, FileStatus, TreeDiff, diff_trees};
pub use error::{Error, Result};
pub use merge::{MergeOutcome, diff3, diff3_dirs};
pub use session::{MergeSession, Resolution, ResolvedMerge, begin_merge};
pub use text::{TextMerge, as_text, merge_text};
