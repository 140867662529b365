//! Append-only rollback audit trail
//!
//! Each rollback appends one `[[entries]]` table to the scope's
//! `audit.toml`. Existing bytes are never rewritten, so the file can be read
//! back as a single TOML document at any time.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillsync_fs::io::append_locked;
use skillsync_fs::{NormalizedPath, RobustnessConfig};
use uuid::Uuid;

use crate::{Error, Result};

/// How the restored tree was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Simple,
    Intelligent,
    Selective,
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simple => write!(f, "simple"),
            Self::Intelligent => write!(f, "intelligent"),
            Self::Selective => write!(f, "selective"),
        }
    }
}

/// One rollback attempt, successful or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollbackAuditEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub scope: String,
    /// Safety snapshot of the tree that was replaced, when one was taken
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_snapshot: Option<String>,
    pub target_snapshot: String,
    pub operation_type: OperationType,
    #[serde(default)]
    pub files_restored: Vec<String>,
    #[serde(default)]
    pub files_merged: Vec<String>,
    #[serde(default)]
    pub conflicts_resolved: Vec<String>,
    #[serde(default)]
    pub conflicts_pending: Vec<String>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RollbackAuditEntry {
    pub fn new(scope: &str, target_snapshot: &str, operation_type: OperationType) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            scope: scope.to_string(),
            source_snapshot: None,
            target_snapshot: target_snapshot.to_string(),
            operation_type,
            files_restored: Vec::new(),
            files_merged: Vec::new(),
            conflicts_resolved: Vec::new(),
            conflicts_pending: Vec::new(),
            success: false,
            error: None,
        }
    }
}

#[derive(Serialize)]
struct AppendChunk<'a> {
    entries: [&'a RollbackAuditEntry; 1],
}

#[derive(Deserialize)]
struct AuditFile {
    #[serde(default)]
    entries: Vec<RollbackAuditEntry>,
}

/// Handle on one scope's `audit.toml`.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
    robustness: RobustnessConfig,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>, robustness: RobustnessConfig) -> Self {
        Self {
            path: path.into(),
            robustness,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry.
    pub fn append(&self, entry: &RollbackAuditEntry) -> Result<()> {
        let chunk = toml::to_string(&AppendChunk { entries: [entry] })?;
        let mut bytes = Vec::with_capacity(chunk.len() + 1);
        bytes.push(b'\n');
        bytes.extend_from_slice(chunk.as_bytes());
        append_locked(&NormalizedPath::new(&self.path), &bytes, self.robustness)?;
        tracing::debug!(path = %self.path.display(), id = %entry.id, "audit entry appended");
        Ok(())
    }

    /// Every entry, oldest first. A missing file has no entries.
    pub fn entries(&self) -> Result<Vec<RollbackAuditEntry>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(&self.path, e)),
        };
        Ok(toml::from_str::<AuditFile>(&content)?.entries)
    }
}
