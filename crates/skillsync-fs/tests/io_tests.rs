use skillsync_fs::{NormalizedPath, RobustnessConfig, io};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_write_atomic_creates_file_and_parents() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join(".skillsync/deployments.toml"));

    io::write_atomic(&path, b"version = \"1.0\"\n", RobustnessConfig::default()).unwrap();

    let content = fs::read_to_string(path.to_native()).unwrap();
    assert_eq!(content, "version = \"1.0\"\n");
}

#[test]
fn test_write_atomic_overwrites_existing() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("index.toml");
    fs::write(&file_path, "original").unwrap();

    io::write_atomic(
        &NormalizedPath::new(&file_path),
        b"updated",
        RobustnessConfig::default(),
    )
    .unwrap();

    assert_eq!(fs::read_to_string(&file_path).unwrap(), "updated");
}

#[test]
fn test_append_locked_never_rewrites() {
    let temp = TempDir::new().unwrap();
    let path = NormalizedPath::new(temp.path().join("audit.toml"));
    let config = RobustnessConfig::default();

    io::append_locked(&path, b"[[entries]]\nn = 1\n", config).unwrap();
    let first = fs::read(path.to_native()).unwrap();
    io::append_locked(&path, b"[[entries]]\nn = 2\n", config).unwrap();
    let second = fs::read(path.to_native()).unwrap();

    assert!(second.starts_with(&first));
    assert_eq!(
        String::from_utf8(second).unwrap(),
        "[[entries]]\nn = 1\n[[entries]]\nn = 2\n"
    );
}

#[test]
fn test_read_text_nonexistent_file() {
    let path = NormalizedPath::new("/nonexistent/skillsync/file.txt");
    assert!(io::read_text(&path).is_err());
}

#[test]
fn test_swap_dir_replaces_live_tree() {
    let temp = TempDir::new().unwrap();
    let live = temp.path().join("collection");
    fs::create_dir_all(live.join("skills/old")).unwrap();
    fs::write(live.join("skills/old/SKILL.md"), "old").unwrap();

    let staged = io::create_staging_dir(&live).unwrap();
    fs::create_dir_all(staged.join("skills/new")).unwrap();
    fs::write(staged.join("skills/new/SKILL.md"), "new").unwrap();

    io::swap_dir(&staged, &live).unwrap();

    assert!(!live.join("skills/old").exists());
    assert_eq!(
        fs::read_to_string(live.join("skills/new/SKILL.md")).unwrap(),
        "new"
    );
    assert!(!staged.exists());
    // Only the live tree remains: no staging or replaced siblings left over
    let entries: Vec<_> = fs::read_dir(temp.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_swap_dir_creates_missing_live_tree() {
    let temp = TempDir::new().unwrap();
    let live = temp.path().join("project/.claude/skills/demo");
    let staged = temp.path().join("staged");
    fs::create_dir_all(&staged).unwrap();
    fs::write(staged.join("SKILL.md"), "demo").unwrap();

    io::swap_dir(&staged, &live).unwrap();

    assert_eq!(fs::read_to_string(live.join("SKILL.md")).unwrap(), "demo");
}

#[test]
fn test_swap_dir_failure_restores_live_tree() {
    let temp = TempDir::new().unwrap();
    let live = temp.path().join("collection");
    fs::create_dir_all(&live).unwrap();
    fs::write(live.join("keep.md"), "keep").unwrap();

    // Staged tree does not exist, so the second rename fails
    let missing = temp.path().join("never-staged");
    let err = io::swap_dir(&missing, &live).unwrap_err();

    match err {
        skillsync_fs::Error::SwapFailed { restored, .. } => assert!(restored),
        other => panic!("expected SwapFailed, got {other:?}"),
    }
    assert_eq!(fs::read_to_string(live.join("keep.md")).unwrap(), "keep");
}
