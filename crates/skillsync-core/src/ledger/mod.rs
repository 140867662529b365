//! Deployment ledger
//!
//! One ledger per project records what was deployed for every artifact. The
//! recorded `content_hash` is the baseline that drift detection and merges
//! measure against. Replacing a record chains the old hash into the new
//! record's lineage, so the ledger doubles as a version graph.

mod record;

pub use record::DeploymentRecord;

use crate::Result;
use crate::artifact::ArtifactType;
use crate::fingerprint::ContentFingerprint;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use skillsync_fs::io::{lock_path_for, write_atomic};
use skillsync_fs::{NormalizedPath, RobustnessConfig};
use std::collections::{HashMap, HashSet};
use std::fs::{self, OpenOptions};
use std::path::Path;

const LEDGER_FORMAT: &str = "1";

/// Persistent `(artifact_name, artifact_type)` → [`DeploymentRecord`] map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentLedger {
    /// Ledger format version for forward compatibility
    version: String,
    #[serde(default)]
    deployments: Vec<DeploymentRecord>,
}

impl Default for DeploymentLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl DeploymentLedger {
    /// Create a new empty ledger
    pub fn new() -> Self {
        Self {
            version: LEDGER_FORMAT.to_string(),
            deployments: Vec::new(),
        }
    }

    /// Load a ledger from a TOML file, or an empty ledger if there is none.
    ///
    /// Holds a shared lock on the ledger's lock file while reading, so a
    /// concurrent save is never observed half way.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, locked, or
    /// parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let lock_path = lock_path_for(path);
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| crate::Error::io(&lock_path, e))?;
        lock_file
            .lock_shared()
            .map_err(|e| crate::Error::io(&lock_path, e))?;

        let content = fs::read_to_string(path).map_err(|e| crate::Error::io(path, e))?;
        let ledger: DeploymentLedger = toml::from_str(&content)?;

        // Lock released when lock_file is dropped
        Ok(ledger)
    }

    /// Serialize the whole ledger and atomically replace the file.
    pub fn save(&self, path: &Path, robustness: RobustnessConfig) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        write_atomic(&NormalizedPath::new(path), content.as_bytes(), robustness)?;
        tracing::debug!(path = %path.display(), records = self.deployments.len(), "ledger saved");
        Ok(())
    }

    /// Insert or replace the record for the record's artifact.
    ///
    /// When a record with a different `content_hash` is replaced, the old
    /// hash becomes the new record's `parent_hash` and heads its
    /// `version_lineage`. Redeploying identical content keeps the old history.
    pub fn record_deployment(&mut self, mut record: DeploymentRecord) -> &DeploymentRecord {
        let existing = self
            .deployments
            .iter()
            .position(|r| r.matches(&record.artifact_name, record.artifact_type));

        let index = match existing {
            Some(index) => {
                let old = &self.deployments[index];
                if old.content_hash == record.content_hash {
                    record.parent_hash = old.parent_hash.clone();
                    record.version_lineage = old.version_lineage.clone();
                } else {
                    let mut lineage = Vec::with_capacity(old.version_lineage.len() + 1);
                    lineage.push(old.content_hash.clone());
                    lineage.extend(old.version_lineage.iter().cloned());
                    lineage.dedup();
                    record.parent_hash = Some(old.content_hash.clone());
                    record.version_lineage = lineage;
                }
                self.deployments[index] = record;
                index
            }
            None => {
                self.deployments.push(record);
                self.deployments.len() - 1
            }
        };
        &self.deployments[index]
    }

    /// Remove the record for an artifact, returning it if present.
    pub fn remove_deployment(
        &mut self,
        name: &str,
        artifact_type: ArtifactType,
    ) -> Option<DeploymentRecord> {
        let pos = self
            .deployments
            .iter()
            .position(|r| r.matches(name, artifact_type))?;
        Some(self.deployments.remove(pos))
    }

    pub fn get(&self, name: &str, artifact_type: ArtifactType) -> Option<&DeploymentRecord> {
        self.deployments
            .iter()
            .find(|r| r.matches(name, artifact_type))
    }

    /// All records, in insertion order
    pub fn list(&self) -> &[DeploymentRecord] {
        &self.deployments
    }

    /// Nearest common ancestor of two content hashes.
    ///
    /// Walks parent links gathered from every record's lineage. A hash counts
    /// as its own ancestor, so `find_common_ancestor(a, a)` is `a`. "Nearest"
    /// is measured from `b`.
    pub fn find_common_ancestor(
        &self,
        a: &ContentFingerprint,
        b: &ContentFingerprint,
    ) -> Option<ContentFingerprint> {
        let parents = self.parent_map();
        let ancestors_of_a: HashSet<&ContentFingerprint> = ancestry(&parents, a).collect();
        ancestry(&parents, b)
            .find(|hash| ancestors_of_a.contains(hash))
            .cloned()
    }

    /// Child → parent links. Lineage is newest first, so each hash's parent is
    /// the one after it.
    fn parent_map(&self) -> HashMap<&ContentFingerprint, &ContentFingerprint> {
        let mut parents = HashMap::new();
        for record in &self.deployments {
            let chain = std::iter::once(&record.content_hash).chain(&record.version_lineage);
            let next = record.version_lineage.iter();
            for (child, parent) in chain.zip(next) {
                if child != parent {
                    parents.entry(child).or_insert(parent);
                }
            }
        }
        parents
    }
}

/// `start`, then its parent, grandparent and so on. Stops at a repeat.
fn ancestry<'a>(
    parents: &'a HashMap<&'a ContentFingerprint, &'a ContentFingerprint>,
    start: &'a ContentFingerprint,
) -> impl Iterator<Item = &'a ContentFingerprint> + 'a {
    let mut seen = HashSet::new();
    std::iter::successors(Some(start), move |current| parents.get(current).copied())
        .take_while(move |hash| seen.insert(*hash))
}
