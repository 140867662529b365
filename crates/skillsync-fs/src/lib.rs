//! Filesystem primitives for skillsync
//!
//! Provides normalized paths, crash-safe I/O (atomic file writes and atomic
//! directory swaps), scoped advisory locks, in-memory file trees and the
//! canonical checksum format shared by every other crate.

pub mod checksum;
pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod lock;
pub mod path;
pub mod tree;

pub use config::ConfigStore;
pub use constants::StorePath;
pub use error::{Error, Result};
pub use io::RobustnessConfig;
pub use lock::{LockKey, OperationLock};
pub use path::{NormalizedPath, SCOPE_SEPARATOR, validate_path_identifier};
pub use tree::{FileTree, walk_files};
