//! Scopes: the directory trees that snapshots capture and rollbacks restore

use std::path::{Path, PathBuf};

use skillsync_fs::{LockKey, SCOPE_SEPARATOR, StorePath, validate_path_identifier};

use crate::{Error, Result};

/// A named directory tree with its own snapshot index and audit trail.
///
/// Mutations of a scope are serialized through its [`LockKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    name: String,
    root: PathBuf,
    lock_key: LockKey,
}

impl Scope {
    /// A collection rooted at `root`.
    pub fn collection(name: impl Into<String>, root: impl Into<PathBuf>) -> Result<Self> {
        let name = name.into();
        validate_path_identifier(&name, "Collection name").map_err(Error::invalid_name)?;
        Ok(Self {
            lock_key: LockKey::collection(name.clone()),
            name,
            root: root.into(),
        })
    }

    /// The deploy root of `project`, as seen from collection `collection`.
    ///
    /// Shares its lock with every operation on the same collection/project
    /// pair. Identifiers never contain the separator, so the name cannot
    /// collide with a collection scope.
    pub fn project(collection: &str, project: &Project) -> Self {
        Self {
            name: format!("{}{}{}", collection, SCOPE_SEPARATOR, project.name()),
            root: project.deploy_root(),
            lock_key: LockKey::pair(collection, project.name()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn lock_key(&self) -> &LockKey {
        &self.lock_key
    }
}

/// A project that artifacts are deployed into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    name: String,
    root: PathBuf,
}

impl Project {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Result<Self> {
        let name = name.into();
        validate_path_identifier(&name, "Project name").map_err(Error::invalid_name)?;
        Ok(Self {
            name,
            root: root.into(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<project>/.claude`
    pub fn deploy_root(&self) -> PathBuf {
        self.root.join(StorePath::DeployRoot)
    }

    /// `<project>/.skillsync`
    pub fn meta_dir(&self) -> PathBuf {
        self.root.join(StorePath::ProjectMeta)
    }

    /// `<project>/.skillsync/deployments.toml`
    pub fn ledger_path(&self) -> PathBuf {
        self.meta_dir().join(StorePath::Ledger)
    }
}
