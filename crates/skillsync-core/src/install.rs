//! Staged installation of a tree into a live directory
//!
//! The tree is written into a fresh sibling directory, its fingerprint is
//! checked against the in-memory tree, and only then is it swapped into
//! place. Anything that fails before the swap leaves the live directory as
//! it was.
//!
//! Staging and aside directories live next to the target, so an interrupted
//! process can leave them inside a scope tree. File walks never see them;
//! the next install of the same target removes them.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use skillsync_fs::FileTree;
use skillsync_fs::io::{
    create_staging_dir, find_transient_dirs, remove_dir_if_exists, sweep_transient_siblings,
};
use walkdir::WalkDir;

use crate::fingerprint::{Fingerprinter, fingerprint_tree};
use crate::rollback::TreeSwap;
use crate::{Error, Result};

#[derive(Clone)]
pub(crate) struct Installer {
    fingerprinter: Fingerprinter,
    swap: Arc<dyn TreeSwap>,
}

impl Installer {
    pub fn new(fingerprinter: Fingerprinter, swap: Arc<dyn TreeSwap>) -> Self {
        Self {
            fingerprinter,
            swap,
        }
    }

    pub fn with_swap(mut self, swap: Arc<dyn TreeSwap>) -> Self {
        self.swap = swap;
        self
    }

    /// Replace the directory `live` with `tree`. `scope` names the live tree
    /// in errors.
    ///
    /// Top-level excluded entries of `live` (such as `.git`) are carried
    /// over into the new tree.
    pub fn install(&self, scope: &str, live: &Path, tree: &FileTree) -> Result<()> {
        let untouched = |source: skillsync_fs::Error| Error::AtomicWrite {
            scope: scope.to_string(),
            mutated: false,
            source,
        };

        for leftover in sweep_transient_siblings(live).map_err(untouched)? {
            tracing::warn!(scope, path = %leftover.display(), "removed leftover staging directory");
        }
        let staged = create_staging_dir(live).map_err(untouched)?;
        let prepared = tree
            .write_to(&staged)
            .and_then(|()| carry_excluded(live, &staged, self.fingerprinter.exclude()));
        if let Err(e) = prepared {
            cleanup(&staged);
            return Err(untouched(e));
        }

        let expected = fingerprint_tree(tree);
        match self.fingerprinter.fingerprint(&staged) {
            Ok(actual) if actual == expected => {}
            Ok(actual) => {
                cleanup(&staged);
                return Err(untouched(skillsync_fs::Error::io(
                    &staged,
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("staged tree hashes to {}, expected {}", actual, expected),
                    ),
                )));
            }
            Err(e) => {
                cleanup(&staged);
                return Err(e);
            }
        }

        if let Err(e) = self.swap.swap(&staged, live) {
            cleanup(&staged);
            let mutated = match &e {
                skillsync_fs::Error::SwapFailed { restored, .. } => !restored,
                _ => true,
            };
            return Err(Error::AtomicWrite {
                scope: scope.to_string(),
                mutated,
                source: e,
            });
        }

        tracing::debug!(scope, live = %live.display(), files = tree.len(), "tree installed");
        Ok(())
    }

    /// Warn about staging directories an interrupted install left in the
    /// tree at `root`. Artifact installs stage beside `<type dir>/<name>`,
    /// so leftovers sit at most two levels down.
    pub fn report_leftovers(&self, scope: &str, root: &Path) -> Result<usize> {
        let leftovers = find_transient_dirs(root, 2)?;
        for leftover in &leftovers {
            tracing::warn!(scope, path = %leftover.display(), "leftover staging directory");
        }
        Ok(leftovers.len())
    }

    /// Remove the directory `live` entirely.
    pub fn remove(&self, scope: &str, live: &Path) -> Result<()> {
        remove_dir_if_exists(live).map_err(|source| Error::AtomicWrite {
            scope: scope.to_string(),
            mutated: true,
            source,
        })
    }
}

/// Copy top-level excluded entries from the live root into the staged tree.
fn carry_excluded(live: &Path, staged: &Path, exclude: &[String]) -> skillsync_fs::Result<()> {
    let Ok(entries) = fs::read_dir(live) else {
        return Ok(());
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        if !exclude.iter().any(|e| *e == name.to_string_lossy()) {
            continue;
        }
        for item in WalkDir::new(entry.path()) {
            let item = item.map_err(|e| skillsync_fs::Error::io(entry.path(), e.into()))?;
            let Ok(relative) = item.path().strip_prefix(live) else {
                continue;
            };
            let dest = staged.join(relative);
            if item.file_type().is_dir() {
                fs::create_dir_all(&dest).map_err(|e| skillsync_fs::Error::io(&dest, e))?;
            } else if item.file_type().is_file() {
                fs::copy(item.path(), &dest).map_err(|e| skillsync_fs::Error::io(&dest, e))?;
            }
        }
    }
    Ok(())
}

fn cleanup(staged: &Path) {
    if let Err(e) = remove_dir_if_exists(staged) {
        tracing::warn!(path = %staged.display(), "failed to remove staging directory: {}", e);
    }
}
