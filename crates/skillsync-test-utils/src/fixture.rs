//! Artifact tree fixtures.

use std::fs;
use std::path::Path;

/// Write `files` (relative path, content) under `root`, creating parent
/// directories as needed.
///
/// # Panics
/// Panics if any filesystem operation fails.
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (relative, content) in files {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("write_files: failed to create {}: {e}", parent.display()));
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("write_files: failed to write {}: {e}", path.display()));
    }
}

/// Content of a minimal skill: a `SKILL.md` with front matter plus one
/// reference file.
pub fn sample_skill(name: &str) -> Vec<(String, String)> {
    vec![
        (
            "SKILL.md".to_string(),
            format!(
                "---\nname: {name}\ndescription: Sample skill {name}\n---\n\n# {name}\n\nStep one.\nStep two.\nStep three.\n"
            ),
        ),
        (
            "references/notes.md".to_string(),
            format!("Notes for {name}.\n"),
        ),
    ]
}

/// Write [`sample_skill`] into `dir`.
///
/// # Panics
/// Panics if any filesystem operation fails.
pub fn write_sample_skill(dir: &Path, name: &str) {
    let files = sample_skill(name);
    let borrowed: Vec<(&str, &str)> = files
        .iter()
        .map(|(path, content)| (path.as_str(), content.as_str()))
        .collect();
    write_files(dir, &borrowed);
}

/// Create a minimal `.git` marker directory without a real object store.
///
/// Use for tests that check excluded entries survive a tree replacement.
///
/// # Panics
/// Panics if the filesystem operations fail.
pub fn fake_git_dir(path: &Path) {
    fs::create_dir_all(path.join(".git/refs/heads"))
        .unwrap_or_else(|e| panic!("fake_git_dir: failed to create .git: {e}"));
    fs::write(path.join(".git/HEAD"), "ref: refs/heads/main\n")
        .unwrap_or_else(|e| panic!("fake_git_dir: failed to write HEAD: {e}"));
}

/// Read every regular file under `root` as `(relative path, content)`,
/// sorted by path. Non-UTF-8 content is replaced lossily.
///
/// # Panics
/// Panics if a directory cannot be read.
pub fn read_files(root: &Path) -> Vec<(String, String)> {
    fn visit(root: &Path, dir: &Path, out: &mut Vec<(String, String)>) {
        let entries = fs::read_dir(dir)
            .unwrap_or_else(|e| panic!("read_files: failed to read {}: {e}", dir.display()));
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                visit(root, &path, out);
            } else if let Ok(relative) = path.strip_prefix(root) {
                let bytes = fs::read(&path).unwrap_or_default();
                out.push((
                    relative.to_string_lossy().replace('\\', "/"),
                    String::from_utf8_lossy(&bytes).into_owned(),
                ));
            }
        }
    }

    let mut out = Vec::new();
    if root.exists() {
        visit(root, root, &mut out);
    }
    out.sort();
    out
}
