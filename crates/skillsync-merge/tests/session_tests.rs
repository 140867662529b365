//! Two-phase merge: begin, decide, apply

use pretty_assertions::assert_eq;
use skillsync_fs::FileTree;
use skillsync_merge::{Error, Resolution, begin_merge};
use std::collections::BTreeMap;

fn tree(files: &[(&str, &str)]) -> FileTree {
    let mut tree = FileTree::new();
    for (path, content) in files {
        tree.insert(*path, content.as_bytes().to_vec()).unwrap();
    }
    tree
}

fn conflicted() -> (FileTree, FileTree, FileTree) {
    let base = tree(&[("a.md", "base\n"), ("b.md", "x\ny\nz\n"), ("c.md", "gone?\n")]);
    let local = tree(&[("a.md", "local\n"), ("b.md", "X\ny\nz\n"), ("c.md", "kept\n")]);
    let remote = tree(&[("a.md", "remote\n"), ("b.md", "x\ny\nZ\n")]);
    (base, local, remote)
}

#[test]
fn begin_merge_lists_conflicts_without_blocking() {
    let (base, local, remote) = conflicted();
    let session = begin_merge(&base, &local, &remote);

    assert_eq!(session.conflicts().len(), 3);
    let pending: Vec<_> = session.pending().iter().map(|c| c.file_path.clone()).collect();
    assert_eq!(pending, vec!["a.md", "c.md"]);
}

#[test]
fn missing_decisions_are_rejected() {
    let (base, local, remote) = conflicted();
    let session = begin_merge(&base, &local, &remote);

    let mut decisions = BTreeMap::new();
    decisions.insert("a.md".to_string(), Resolution::UseLocal);

    match session.apply_resolutions(&decisions) {
        Err(Error::UnresolvedConflicts { paths }) => assert_eq!(paths, vec!["c.md"]),
        other => panic!("expected UnresolvedConflicts, got {other:?}"),
    }
}

#[test]
fn decisions_for_unknown_paths_are_rejected() {
    let (base, local, remote) = conflicted();
    let session = begin_merge(&base, &local, &remote);

    let mut decisions = BTreeMap::new();
    decisions.insert("nope.md".to_string(), Resolution::Delete);
    assert!(matches!(
        session.apply_resolutions(&decisions),
        Err(Error::UnknownConflict { .. })
    ));
}

#[test]
fn applied_decisions_produce_final_tree() {
    let (base, local, remote) = conflicted();
    let session = begin_merge(&base, &local, &remote);

    let mut decisions = BTreeMap::new();
    decisions.insert("a.md".to_string(), Resolution::Custom(b"hand merged\n".to_vec()));
    decisions.insert("c.md".to_string(), Resolution::UseRemote);

    let resolved = session.apply_resolutions(&decisions).unwrap();
    assert_eq!(
        resolved.tree,
        tree(&[("a.md", "hand merged\n"), ("b.md", "X\ny\nZ\n")])
    );
    assert_eq!(resolved.resolved, vec!["a.md", "c.md"]);
    assert_eq!(resolved.auto_merged, vec!["b.md"]);
}

#[test]
fn use_base_restores_ancestor_content() {
    let (base, local, remote) = conflicted();
    let session = begin_merge(&base, &local, &remote);

    let mut decisions = BTreeMap::new();
    decisions.insert("a.md".to_string(), Resolution::UseBase);
    decisions.insert("c.md".to_string(), Resolution::UseLocal);

    let resolved = session.apply_resolutions(&decisions).unwrap();
    assert_eq!(resolved.tree.get("a.md"), Some(&b"base\n"[..]));
    assert_eq!(resolved.tree.get("c.md"), Some(&b"kept\n"[..]));
}
