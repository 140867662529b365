//! Normalized path handling for cross-platform compatibility
//!
//! Artifact trees are compared across machines, so every relative path that
//! feeds a fingerprint, an archive entry or a conflict record goes through
//! [`NormalizedPath`] first.

use std::path::{Component, Path, PathBuf};

/// A path normalized to use forward slashes internally.
///
/// Converted to the platform-native form only at I/O boundaries.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NormalizedPath {
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    ///
    /// Backslashes become forward slashes, `.` segments and repeated
    /// separators are dropped. A leading `//` (network share) is preserved.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let raw = path.as_ref().to_string_lossy().replace('\\', "/");
        Self {
            inner: clean(&raw),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a segment.
    pub fn join(&self, segment: &str) -> Self {
        let segment = segment.replace('\\', "/");
        if self.inner.is_empty() {
            return Self::new(segment);
        }
        Self::new(format!("{}/{}", self.inner, segment))
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        match self.inner.rfind('/') {
            Some(0) => Some(Self {
                inner: "/".to_string(),
            }),
            Some(idx) => Some(Self {
                inner: self.inner[..idx].to_string(),
            }),
            None => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        self.inner.rsplit('/').next().filter(|s| !s.is_empty())
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 { None } else { Some(&name[idx + 1..]) }
        })
    }

    /// Express `path` relative to `base`.
    ///
    /// Returns `None` when `path` does not live under `base`.
    pub fn relative_to(path: &Path, base: &Path) -> Option<Self> {
        path.strip_prefix(base).ok().map(Self::new)
    }

    /// True when this is a relative path that cannot escape its root:
    /// non-empty, not absolute, and free of `..` segments.
    pub fn is_safe_relative(&self) -> bool {
        !self.inner.is_empty()
            && !self.inner.starts_with('/')
            && !has_drive_prefix(&self.inner)
            && Path::new(&self.inner)
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
    }

    /// True when this path equals `prefix` or lies beneath it.
    pub fn starts_with(&self, prefix: &NormalizedPath) -> bool {
        let prefix = prefix.inner.trim_end_matches('/');
        self.inner == prefix
            || (self.inner.starts_with(prefix) && self.inner[prefix.len()..].starts_with('/'))
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }
}

fn clean(raw: &str) -> String {
    let network = raw.starts_with("//") && !raw.starts_with("///");
    let absolute = raw.starts_with('/');
    let parts: Vec<&str> = raw
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    let body = parts.join("/");
    if network {
        format!("//{}", body)
    } else if absolute {
        format!("/{}", body)
    } else {
        body
    }
}

fn has_drive_prefix(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Joins a collection name and a project name into one store name.
pub const SCOPE_SEPARATOR: &str = "--";

/// Validate that `value` is usable as a single path component.
///
/// Used for artifact names, scope names and project names, which become
/// directory or file names inside the store. `label` names the value in the
/// returned error message.
///
/// `--` is reserved: it joins collection and project names in lock files and
/// snapshot scope directories.
pub fn validate_path_identifier(value: &str, label: &str) -> std::result::Result<(), String> {
    if value.is_empty() {
        return Err(format!("{} must not be empty", label));
    }
    if value.starts_with('.') {
        return Err(format!("{} '{}' must not start with '.'", label, value));
    }
    if value.contains(['/', '\\', ':', '\0']) {
        return Err(format!(
            "{} '{}' must not contain path separators",
            label, value
        ));
    }
    if value.contains(SCOPE_SEPARATOR) {
        return Err(format!(
            "{} '{}' must not contain '{}'",
            label, value, SCOPE_SEPARATOR
        ));
    }
    Ok(())
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}
