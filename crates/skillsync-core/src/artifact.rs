//! Artifact identity

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use skillsync_fs::validate_path_identifier;

use crate::{Error, Result};

/// Kind of artifact managed by a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    Skill,
    Command,
    Agent,
    McpServer,
    Hook,
}

impl ArtifactType {
    pub const ALL: [Self; 5] = [
        Self::Skill,
        Self::Command,
        Self::Agent,
        Self::McpServer,
        Self::Hook,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skill => "skill",
            Self::Command => "command",
            Self::Agent => "agent",
            Self::McpServer => "mcp_server",
            Self::Hook => "hook",
        }
    }

    /// Directory holding artifacts of this type, in both collections and
    /// projects.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Skill => "skills",
            Self::Command => "commands",
            Self::Agent => "agents",
            Self::McpServer => "mcp_servers",
            Self::Hook => "hooks",
        }
    }

    /// Reverse of [`ArtifactType::dir_name`].
    pub fn from_dir_name(dir: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.dir_name() == dir)
    }
}

impl std::fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::invalid_name(format!("unknown artifact type '{}'", s)))
    }
}

/// Identity of an artifact: `(name, type)`, displayed as `type:name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactId {
    pub name: String,
    pub artifact_type: ArtifactType,
}

impl ArtifactId {
    /// Create an identity, rejecting names that are not a single path
    /// component.
    pub fn new(name: impl Into<String>, artifact_type: ArtifactType) -> Result<Self> {
        let name = name.into();
        validate_path_identifier(&name, "Artifact name").map_err(Error::invalid_name)?;
        Ok(Self {
            name,
            artifact_type,
        })
    }

    pub fn skill(name: impl Into<String>) -> Result<Self> {
        Self::new(name, ArtifactType::Skill)
    }

    /// Same type, different name
    pub fn renamed(&self, name: impl Into<String>) -> Result<Self> {
        Self::new(name, self.artifact_type)
    }

    /// `<type dir>/<name>`, relative to a collection root or a project's
    /// deploy root.
    pub fn relative_dir(&self) -> PathBuf {
        PathBuf::from(self.artifact_type.dir_name()).join(&self.name)
    }
}

impl std::fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.artifact_type, self.name)
    }
}

impl FromStr for ArtifactId {
    type Err = Error;

    /// Parse `type:name`.
    fn from_str(s: &str) -> Result<Self> {
        let (kind, name) = s
            .split_once(':')
            .ok_or_else(|| Error::invalid_name(format!("expected type:name, got '{}'", s)))?;
        Self::new(name, kind.parse()?)
    }
}
