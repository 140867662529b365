use proptest::prelude::*;
use skillsync_fs::{FileTree, NormalizedPath};
use skillsync_merge::{diff3, merge_text};

fn text() -> impl Strategy<Value = String> {
    proptest::collection::vec("[a-c]{0,3}", 0..12).prop_map(|lines| {
        lines.into_iter().map(|l| format!("{l}\n")).collect::<String>()
    })
}

fn file_tree() -> impl Strategy<Value = FileTree> {
    proptest::collection::btree_map("[a-d]{1,3}(/[a-d]{1,3})?", text(), 0..6).prop_map(|files| {
        files
            .into_iter()
            .map(|(p, c)| (NormalizedPath::new(p), c.into_bytes()))
            .collect()
    })
}

proptest! {
    #[test]
    fn merge_of_identical_trees_is_identity(t in file_tree()) {
        let outcome = diff3(&t, &t, &t);
        prop_assert!(outcome.conflicts.is_empty());
        prop_assert_eq!(outcome.merged, t);
    }

    #[test]
    fn one_sided_text_change_wins(base in text(), changed in text()) {
        let local_only = merge_text(&base, &changed, &base);
        prop_assert!(local_only.is_clean());
        prop_assert_eq!(&local_only.content, &changed);

        let remote_only = merge_text(&base, &base, &changed);
        prop_assert!(remote_only.is_clean());
        prop_assert_eq!(&remote_only.content, &changed);
    }

    #[test]
    fn same_change_on_both_sides_wins(base in text(), changed in text()) {
        let merged = merge_text(&base, &changed, &changed);
        prop_assert!(merged.is_clean());
        prop_assert_eq!(merged.content, changed);
    }
}
