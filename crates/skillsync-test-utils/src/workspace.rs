//! [`TestWorkspace`] builder for sync scenarios.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::fixture::{write_files, write_sample_skill};

/// A temporary directory holding a collection, any number of projects and
/// the skillsync store.
///
/// ```text
/// <tmp>/collection/skills/<name>/...
/// <tmp>/projects/<project>/.claude/skills/<name>/...
/// <tmp>/store/
/// ```
///
/// # Example
///
/// ```rust,no_run
/// use skillsync_test_utils::TestWorkspace;
///
/// let ws = TestWorkspace::new();
/// ws.add_collection_skill("review");
/// ws.assert_file_exists("collection/skills/review/SKILL.md");
/// ```
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkspace {
    /// Create the workspace with an empty collection directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("collection")).unwrap();
        Self { temp_dir }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn collection_dir(&self) -> PathBuf {
        self.root().join("collection")
    }

    pub fn store_dir(&self) -> PathBuf {
        self.root().join("store")
    }

    /// Root of project `name`, created on first use.
    pub fn project_dir(&self, name: &str) -> PathBuf {
        let dir = self.root().join("projects").join(name);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// `collection/skills/<name>`
    pub fn collection_skill_dir(&self, name: &str) -> PathBuf {
        self.collection_dir().join("skills").join(name)
    }

    /// `projects/<project>/.claude/skills/<name>`
    pub fn project_skill_dir(&self, project: &str, name: &str) -> PathBuf {
        self.project_dir(project)
            .join(".claude")
            .join("skills")
            .join(name)
    }

    /// Write a sample skill into the collection.
    pub fn add_collection_skill(&self, name: &str) -> PathBuf {
        let dir = self.collection_skill_dir(name);
        write_sample_skill(&dir, name);
        dir
    }

    /// Write `files` into the collection copy of skill `name`.
    pub fn write_collection_skill(&self, name: &str, files: &[(&str, &str)]) {
        write_files(&self.collection_skill_dir(name), files);
    }

    /// Write `files` into the project copy of skill `name`.
    pub fn write_project_skill(&self, project: &str, name: &str, files: &[(&str, &str)]) {
        write_files(&self.project_skill_dir(project, name), files);
    }

    /// Read a file relative to the workspace root.
    ///
    /// # Panics
    /// Panics if the file cannot be read.
    pub fn read(&self, path: &str) -> String {
        let full_path = self.root().join(path);
        fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()))
    }

    /// Assert that `path` (relative to the workspace root) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the workspace root) does **not** exist.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path exists.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.root().join(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }

    /// Assert that the file at `path` (relative to root) contains `content`.
    ///
    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, path: &str, content: &str) {
        let file_content = self.read(path);
        assert!(
            file_content.contains(content),
            "File {} does not contain expected content.\nExpected: {}\nActual: {}",
            path,
            content,
            file_content
        );
    }
}
