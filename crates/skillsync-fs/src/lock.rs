//! Scoped advisory locks
//!
//! Mutating operations (merge, rollback, ledger write) are serialized per
//! `(collection, project)` pair with an exclusive `fs2` lock on a lock file.
//! The lock is held by an [`OperationLock`] guard and released when the guard
//! drops, whichever way the operation exits.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use backoff::ExponentialBackoffBuilder;
use fs2::FileExt;

use crate::{Error, Result, SCOPE_SEPARATOR};

/// Identifies the unit of mutual exclusion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockKey {
    collection: String,
    project: Option<String>,
}

impl LockKey {
    /// Lock covering operations that touch only the collection.
    pub fn collection(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            project: None,
        }
    }

    /// Lock covering operations on a collection/project pair.
    pub fn pair(collection: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            project: Some(project.into()),
        }
    }

    /// File name of the lock file for this key.
    pub fn file_name(&self) -> String {
        match &self.project {
            Some(project) => format!("{}{}{}.lock", self.collection, SCOPE_SEPARATOR, project),
            None => format!("{}.lock", self.collection),
        }
    }
}

impl std::fmt::Display for LockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.project {
            Some(project) => write!(f, "collection '{}' / project '{}'", self.collection, project),
            None => write!(f, "collection '{}'", self.collection),
        }
    }
}

/// RAII guard for an acquired operation lock.
#[derive(Debug)]
pub struct OperationLock {
    file: File,
    path: PathBuf,
    key: LockKey,
}

impl OperationLock {
    /// Acquire the lock for `key`, waiting at most `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockContention`] if another holder keeps the lock for
    /// longer than `timeout`. The error is retryable.
    pub fn acquire(lock_dir: &Path, key: LockKey, timeout: Duration) -> Result<Self> {
        std::fs::create_dir_all(lock_dir).map_err(|e| Error::io(lock_dir, e))?;
        let path = lock_dir.join(key.file_name());
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| Error::io(&path, e))?;

        let started = Instant::now();
        if lock_exclusive_within(&file, timeout).is_err() {
            return Err(Error::LockContention {
                key: key.to_string(),
                waited_ms: started.elapsed().as_millis() as u64,
            });
        }

        tracing::debug!(lock = %key, "operation lock acquired");
        Ok(Self { file, path, key })
    }

    /// The key this guard holds.
    pub fn key(&self) -> &LockKey {
        &self.key
    }

    /// Path of the underlying lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for OperationLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(lock = %self.key, "failed to release operation lock: {}", e);
        } else {
            tracing::debug!(lock = %self.key, "operation lock released");
        }
    }
}

/// Take an exclusive lock on `file`, retrying with exponential backoff until
/// `timeout` has elapsed.
pub(crate) fn lock_exclusive_within(file: &File, timeout: Duration) -> std::io::Result<()> {
    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(Duration::from_millis(5))
        .with_max_interval(Duration::from_millis(100))
        .with_max_elapsed_time(Some(timeout))
        .build();

    backoff::retry(policy, || {
        FileExt::try_lock_exclusive(file).map_err(backoff::Error::transient)
    })
    .map_err(|e| match e {
        backoff::Error::Permanent(err) => err,
        backoff::Error::Transient { err, .. } => err,
    })
}
