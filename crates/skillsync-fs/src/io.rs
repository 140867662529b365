//! Crash-safe I/O: atomic file writes, append-only writes and directory swaps

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use uuid::Uuid;
use walkdir::WalkDir;

use crate::lock::lock_exclusive_within;
use crate::{Error, NormalizedPath, Result};

/// Tuning for lock waits and durability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobustnessConfig {
    /// Maximum time to wait for a file lock before giving up
    pub lock_timeout: Duration,
    /// Whether to fsync written data before renaming it into place
    pub enable_fsync: bool,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(2),
            enable_fsync: true,
        }
    }
}

/// Path of the advisory lock file guarding writes to `path`.
pub fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}

/// Write content atomically to a file with locking.
///
/// Holds an exclusive lock on `<path>.lock`, writes to a temp file in the
/// same directory and renames it over the target. Readers see either the
/// old or the new content in full.
pub fn write_atomic(path: &NormalizedPath, content: &[u8], config: RobustnessConfig) -> Result<()> {
    let native_path = path.to_native();
    let _lock = lock_for_write(&native_path, config)?;
    replace_contents(&native_path, content, config)
}

/// Read-modify-write a file under the same lock [`write_atomic`] takes.
///
/// `update` receives the current content (`None` if the file does not exist)
/// and returns the new content. No other writer can interleave between the
/// read and the rename.
pub fn update_locked<E>(
    path: &NormalizedPath,
    config: RobustnessConfig,
    update: impl FnOnce(Option<String>) -> std::result::Result<Vec<u8>, E>,
) -> std::result::Result<(), E>
where
    E: From<Error>,
{
    let native_path = path.to_native();
    let _lock = lock_for_write(&native_path, config)?;

    let current = match fs::read_to_string(&native_path) {
        Ok(content) => Some(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(Error::io(&native_path, e).into()),
    };
    let content = update(current)?;
    Ok(replace_contents(&native_path, &content, config)?)
}

/// Create the parent directory and take the exclusive write lock. The lock
/// is released when the returned file is dropped.
fn lock_for_write(native_path: &Path, config: RobustnessConfig) -> Result<fs::File> {
    if let Some(parent) = native_path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let lock_path = lock_path_for(native_path);
    let lock_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|e| Error::io(&lock_path, e))?;
    lock_exclusive_within(&lock_file, config.lock_timeout).map_err(|_| Error::LockFailed {
        path: native_path.to_path_buf(),
    })?;
    Ok(lock_file)
}

/// Write to a temp file beside `native_path` and rename it into place.
fn replace_contents(native_path: &Path, content: &[u8], config: RobustnessConfig) -> Result<()> {
    let temp_path = native_path.with_file_name(format!(
        ".{}.{}.tmp",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        Uuid::new_v4().simple()
    ));

    let result = write_then_rename(&temp_path, native_path, content, config.enable_fsync);
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_then_rename(temp: &Path, target: &Path, content: &[u8], fsync: bool) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp)
        .map_err(|e| Error::io(temp, e))?;
    file.write_all(content).map_err(|e| Error::io(temp, e))?;
    if fsync {
        file.sync_all().map_err(|e| Error::io(temp, e))?;
    }
    drop(file);

    fs::rename(temp, target).map_err(|e| Error::io(target, e))
}

/// Append content to a file under an exclusive lock.
///
/// Existing bytes are never rewritten; the file is created if missing.
pub fn append_locked(path: &NormalizedPath, content: &[u8], config: RobustnessConfig) -> Result<()> {
    let native_path = path.to_native();
    if let Some(parent) = native_path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&native_path)
        .map_err(|e| Error::io(&native_path, e))?;
    lock_exclusive_within(&file, config.lock_timeout).map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;

    file.write_all(content)
        .map_err(|e| Error::io(&native_path, e))?;
    if config.enable_fsync {
        file.sync_all().map_err(|e| Error::io(&native_path, e))?;
    }
    Ok(())
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Create a fresh, empty staging directory next to `live`.
///
/// Staging beside the target keeps the later rename on one filesystem.
pub fn create_staging_dir(live: &Path) -> Result<PathBuf> {
    let staged = sibling(live, "staging");
    fs::create_dir_all(&staged).map_err(|e| Error::io(&staged, e))?;
    Ok(staged)
}

/// Replace the directory at `live` with the directory at `staged`.
///
/// The live tree is renamed aside, the staged tree renamed into place and
/// the old tree deleted. If the second rename fails the old tree is renamed
/// back. A missing `live` is simply created from `staged`.
///
/// # Errors
///
/// Returns [`Error::SwapFailed`]; its `restored` flag reports whether the
/// previous tree is back in place.
pub fn swap_dir(staged: &Path, live: &Path) -> Result<()> {
    if let Some(parent) = live.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let had_live = live.exists();
    let aside = sibling(live, "old");

    if had_live {
        fs::rename(live, &aside).map_err(|source| Error::SwapFailed {
            live: live.to_path_buf(),
            restored: true,
            source,
        })?;
    }

    if let Err(source) = fs::rename(staged, live) {
        let restored = !had_live || fs::rename(&aside, live).is_ok();
        tracing::error!(live = %live.display(), restored, "directory swap failed: {}", source);
        return Err(Error::SwapFailed {
            live: live.to_path_buf(),
            restored,
            source,
        });
    }

    if had_live && let Err(e) = fs::remove_dir_all(&aside) {
        tracing::warn!(path = %aside.display(), "failed to remove replaced tree: {}", e);
    }
    Ok(())
}

/// Remove the directory at `path` if it exists.
pub fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Temporary directories a swap creates beside its target.
const TRANSIENT_TAGS: [&str; 2] = ["staging", "old"];

/// True for `.<name>.staging-<hex>` and `.<name>.old-<hex>`, the names
/// [`create_staging_dir`] and [`swap_dir`] give their temporary directories.
pub fn is_transient_name(name: &str) -> bool {
    transient_owner(name).is_some()
}

/// Name of the live directory a transient directory was created for.
fn transient_owner(name: &str) -> Option<&str> {
    let (owner, tail) = name.strip_prefix('.')?.rsplit_once('.')?;
    let (tag, suffix) = tail.split_once('-')?;
    let transient = !owner.is_empty()
        && TRANSIENT_TAGS.contains(&tag)
        && !suffix.is_empty()
        && suffix.chars().all(|c| c.is_ascii_hexdigit());
    transient.then_some(owner)
}

/// Remove staging and aside directories an interrupted swap left beside
/// `live`. Returns the removed paths.
pub fn sweep_transient_siblings(live: &Path) -> Result<Vec<PathBuf>> {
    let (Some(parent), Some(name)) = (live.parent(), live.file_name()) else {
        return Ok(Vec::new());
    };
    let name = name.to_string_lossy();
    let entries = match fs::read_dir(parent) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::io(parent, e)),
    };

    let mut removed = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(parent, e))?;
        if transient_owner(&entry.file_name().to_string_lossy()) == Some(name.as_ref()) {
            remove_dir_if_exists(&entry.path())?;
            removed.push(entry.path());
        }
    }
    removed.sort();
    Ok(removed)
}

/// Transient directories under `root`, at most `max_depth` levels down.
pub fn find_transient_dirs(root: &Path, max_depth: usize) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    let mut walker = WalkDir::new(root).min_depth(1).max_depth(max_depth).into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
            Error::io(path, e.into())
        })?;
        if entry.file_type().is_dir() && is_transient_name(&entry.file_name().to_string_lossy()) {
            found.push(entry.into_path());
            walker.skip_current_dir();
        }
    }
    Ok(found)
}

fn sibling(live: &Path, tag: &str) -> PathBuf {
    let name = live
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "tree".to_string());
    live.with_file_name(format!(".{}.{}-{}", name, tag, Uuid::new_v4().simple()))
}
