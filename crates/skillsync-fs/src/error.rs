//! Error types for skillsync-fs

use std::path::PathBuf;

/// Result type for skillsync-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in skillsync-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config at {path}: {message}")]
    ConfigParse {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Failed to serialize {format} config for {path}: {message}")]
    ConfigSerialize {
        path: PathBuf,
        format: String,
        message: String,
    },

    #[error("Unsupported config format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },

    /// Another mutating operation holds the lock; safe to retry later.
    #[error("Operation in progress for {key}; lock not acquired within {waited_ms}ms")]
    LockContention { key: String, waited_ms: u64 },

    #[error("Unsafe path in tree: {path}")]
    UnsafePath { path: String },

    /// The directory swap failed. `restored` tells whether the previous tree
    /// was put back in place.
    #[error(
        "Atomic swap of {live} failed: {source} ({})",
        if *restored { "live tree unchanged" } else { "live tree may be partially updated" }
    )]
    SwapFailed {
        live: PathBuf,
        restored: bool,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the caller may retry the same operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LockContention { .. })
    }
}
