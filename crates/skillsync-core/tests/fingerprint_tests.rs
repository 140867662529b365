//! Fingerprint stability tests

use proptest::prelude::*;
use skillsync_core::{Error, Fingerprinter, SyncConfig, fingerprint_tree};
use skillsync_fs::FileTree;
use skillsync_test_utils::fixture::{write_files, write_sample_skill};
use std::fs;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

fn fingerprinter() -> Fingerprinter {
    Fingerprinter::new(&SyncConfig::default())
}

#[test]
fn same_content_in_different_places_hashes_the_same() {
    let dir = tempdir().unwrap();
    write_sample_skill(&dir.path().join("a/review"), "review");
    write_sample_skill(&dir.path().join("b/review"), "review");

    let fp = fingerprinter();
    assert_eq!(
        fp.fingerprint(&dir.path().join("a/review")).unwrap(),
        fp.fingerprint(&dir.path().join("b/review")).unwrap()
    );
}

#[test]
fn renaming_a_file_changes_the_hash() {
    let dir = tempdir().unwrap();
    write_files(dir.path(), &[("notes.md", "same bytes\n")]);
    let fp = fingerprinter();
    let before = fp.fingerprint(dir.path()).unwrap();

    fs::rename(dir.path().join("notes.md"), dir.path().join("renamed.md")).unwrap();
    assert_ne!(fp.fingerprint(dir.path()).unwrap(), before);
}

#[test]
fn timestamps_do_not_matter() {
    let dir = tempdir().unwrap();
    write_files(dir.path(), &[("SKILL.md", "# Skill\n")]);
    let fp = fingerprinter();
    let before = fp.fingerprint(dir.path()).unwrap();

    let file = fs::File::options()
        .write(true)
        .open(dir.path().join("SKILL.md"))
        .unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(86_400))
        .unwrap();
    drop(file);

    assert_eq!(fp.fingerprint(dir.path()).unwrap(), before);
}

#[test]
fn excluded_entries_are_ignored() {
    let dir = tempdir().unwrap();
    write_files(dir.path(), &[("SKILL.md", "# Skill\n")]);
    let fp = fingerprinter();
    let before = fp.fingerprint(dir.path()).unwrap();

    write_files(dir.path(), &[(".git/HEAD", "ref\n"), (".DS_Store", "junk")]);
    assert_eq!(fp.fingerprint(dir.path()).unwrap(), before);
}

#[test]
fn on_disk_matches_in_memory() {
    let dir = tempdir().unwrap();
    write_files(
        dir.path(),
        &[("SKILL.md", "# Skill\n"), ("scripts/run.sh", "echo hi\n")],
    );
    let tree = FileTree::load(dir.path(), &[]).unwrap();
    assert_eq!(
        fingerprinter().fingerprint(dir.path()).unwrap(),
        fingerprint_tree(&tree)
    );
}

#[test]
fn large_trees_hash_the_same_in_parallel_and_serial() {
    let dir = tempdir().unwrap();
    for i in 0..150 {
        write_files(
            dir.path(),
            &[(&format!("refs/file-{i:03}.md"), &format!("content {i}\n"))],
        );
    }
    let serial = Fingerprinter::new(&SyncConfig {
        fingerprint_workers: 1,
        ..SyncConfig::default()
    });
    let parallel = Fingerprinter::new(&SyncConfig {
        fingerprint_workers: 4,
        ..SyncConfig::default()
    });
    assert_eq!(
        serial.fingerprint(dir.path()).unwrap(),
        parallel.fingerprint(dir.path()).unwrap()
    );
}

#[test]
fn missing_directory_has_no_fingerprint() {
    let dir = tempdir().unwrap();
    assert!(fingerprinter()
        .fingerprint_if_exists(&dir.path().join("nope"))
        .unwrap()
        .is_none());
}

#[cfg(unix)]
#[test]
fn symlinked_file_hashes_like_a_copy() {
    let dir = tempdir().unwrap();
    write_files(dir.path(), &[("shared/guide.md", "# Guide\n")]);
    write_files(&dir.path().join("copied"), &[("guide.md", "# Guide\n")]);
    fs::create_dir_all(dir.path().join("linked")).unwrap();
    std::os::unix::fs::symlink(
        dir.path().join("shared/guide.md"),
        dir.path().join("linked/guide.md"),
    )
    .unwrap();

    let fp = fingerprinter();
    assert_eq!(
        fp.fingerprint(&dir.path().join("linked")).unwrap(),
        fp.fingerprint(&dir.path().join("copied")).unwrap()
    );
}

#[cfg(unix)]
#[test]
fn permission_changes_do_not_matter() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    write_files(dir.path(), &[("scripts/run.sh", "echo hi\n")]);
    let fp = fingerprinter();
    let before = fp.fingerprint(dir.path()).unwrap();

    let script = dir.path().join("scripts/run.sh");
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    assert_eq!(fp.fingerprint(dir.path()).unwrap(), before);
}

#[cfg(unix)]
#[test]
fn unreadable_entry_aborts_with_its_path() {
    let dir = tempdir().unwrap();
    write_files(dir.path(), &[("SKILL.md", "# Skill\n")]);
    let dangling = dir.path().join("refs/missing.md");
    fs::create_dir_all(dir.path().join("refs")).unwrap();
    std::os::unix::fs::symlink(dir.path().join("refs/gone.md"), &dangling).unwrap();

    match fingerprinter().fingerprint(dir.path()) {
        Err(Error::HashComputation { path, .. }) => assert_eq!(path, dangling),
        other => panic!("expected HashComputation, got {other:?}"),
    }
}

fn tree_strategy() -> impl Strategy<Value = Vec<(String, Vec<u8>)>> {
    prop::collection::vec(("[a-z]{1,8}(/[a-z]{1,8})?", prop::collection::vec(any::<u8>(), 0..64)), 0..12)
}

proptest! {
    #[test]
    fn insertion_order_does_not_matter(files in tree_strategy()) {
        let mut forward = FileTree::new();
        for (path, content) in &files {
            forward.insert(path.as_str(), content.clone()).unwrap();
        }
        let mut backward = FileTree::new();
        for (path, content) in files.iter().rev() {
            // Later duplicates overwrite earlier ones in `forward`
            if !backward.contains(path) {
                backward.insert(path.as_str(), forward.get(path).unwrap().to_vec()).unwrap();
            }
        }
        prop_assert_eq!(fingerprint_tree(&forward), fingerprint_tree(&backward));
    }

    #[test]
    fn changing_any_byte_changes_the_hash(content in prop::collection::vec(any::<u8>(), 1..128), index in any::<prop::sample::Index>()) {
        let mut original = FileTree::new();
        original.insert("file.bin", content.clone()).unwrap();

        let mut changed_content = content;
        let i = index.index(changed_content.len());
        changed_content[i] = changed_content[i].wrapping_add(1);
        let mut changed = FileTree::new();
        changed.insert("file.bin", changed_content).unwrap();

        prop_assert_ne!(fingerprint_tree(&original), fingerprint_tree(&changed));
    }
}
