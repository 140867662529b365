//! Line-level three-way merge
//!
//! Classic diff3: lines of `base` that `similar` matches to both `local` and
//! `remote` act as sync points. Between sync points each side's chunk is
//! compared to the base chunk; a chunk changed on only one side (or changed
//! identically on both) merges cleanly, anything else becomes a marked
//! conflict hunk.

use similar::{Algorithm, DiffOp, capture_diff_slices};

/// Opens the local side of a conflict hunk
pub const MARKER_LOCAL: &str = "<<<<<<< local";
/// Opens the common-ancestor section of a conflict hunk
pub const MARKER_BASE: &str = "||||||| base";
/// Separates the ancestor section from the remote side
pub const MARKER_SEPARATOR: &str = "=======";
/// Closes a conflict hunk
pub const MARKER_REMOTE: &str = ">>>>>>> remote";

/// Number of leading bytes inspected when sniffing for binary content
const BINARY_PROBE_LEN: usize = 8000;

/// Result of a line-level merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMerge {
    /// Merged text, with conflict markers around irreconcilable hunks
    pub content: String,
    /// Number of conflict hunks written
    pub conflicts: usize,
}

impl TextMerge {
    /// True when no conflict markers were needed
    pub fn is_clean(&self) -> bool {
        self.conflicts == 0
    }
}

/// Interpret `bytes` as text.
///
/// Content with a NUL byte near the start, or that is not valid UTF-8, is
/// treated as binary and yields `None`.
pub fn as_text(bytes: &[u8]) -> Option<&str> {
    let probe = &bytes[..bytes.len().min(BINARY_PROBE_LEN)];
    if probe.contains(&0) {
        return None;
    }
    std::str::from_utf8(bytes).ok()
}

/// Three-way merge of `local` and `remote` against their ancestor `base`.
pub fn merge_text(base: &str, local: &str, remote: &str) -> TextMerge {
    let base: Vec<&str> = base.split_inclusive('\n').collect();
    let local: Vec<&str> = local.split_inclusive('\n').collect();
    let remote: Vec<&str> = remote.split_inclusive('\n').collect();

    let to_local = match_lines(&base, &local);
    let to_remote = match_lines(&base, &remote);

    let mut out = String::new();
    let mut conflicts = 0;
    let (mut ib, mut il, mut ir) = (0, 0, 0);

    loop {
        // Stable run: base lines present unchanged at the current position on both sides
        let mut run = 0;
        while ib + run < base.len()
            && to_local[ib + run] == Some(il + run)
            && to_remote[ib + run] == Some(ir + run)
        {
            run += 1;
        }
        if run > 0 {
            base[ib..ib + run].iter().for_each(|line| out.push_str(line));
            ib += run;
            il += run;
            ir += run;
            continue;
        }

        if ib == base.len() && il == local.len() && ir == remote.len() {
            break;
        }

        let (jb, jl, jr) = (ib..base.len())
            .find_map(|j| match (to_local[j], to_remote[j]) {
                (Some(l), Some(r)) => Some((j, l, r)),
                _ => None,
            })
            .unwrap_or((base.len(), local.len(), remote.len()));

        let clean = resolve_chunk(&base[ib..jb], &local[il..jl], &remote[ir..jr], &mut out);
        if !clean {
            conflicts += 1;
        }
        ib = jb;
        il = jl;
        ir = jr;
    }

    TextMerge {
        content: out,
        conflicts,
    }
}

/// Render two unrelated versions as a single whole-file conflict hunk.
pub fn conflict_whole(local: &str, remote: &str) -> String {
    let mut out = String::new();
    write_conflict(&[local], &[], &[remote], &mut out);
    out
}

/// For each base line, the index of the matching line in `side`, if any.
fn match_lines(base: &[&str], side: &[&str]) -> Vec<Option<usize>> {
    let mut matched = vec![None; base.len()];
    for op in capture_diff_slices(Algorithm::Myers, base, side) {
        if let DiffOp::Equal {
            old_index,
            new_index,
            len,
        } = op
        {
            for k in 0..len {
                matched[old_index + k] = Some(new_index + k);
            }
        }
    }
    matched
}

/// Emit the merged form of one unstable chunk; false means a conflict hunk.
fn resolve_chunk(base: &[&str], local: &[&str], remote: &[&str], out: &mut String) -> bool {
    if local == base {
        push_lines(remote, out);
    } else if remote == base || local == remote {
        push_lines(local, out);
    } else {
        write_conflict(local, base, remote, out);
        return false;
    }
    true
}

fn write_conflict(local: &[&str], base: &[&str], remote: &[&str], out: &mut String) {
    push_marker(MARKER_LOCAL, out);
    push_section(local, out);
    push_marker(MARKER_BASE, out);
    push_section(base, out);
    push_marker(MARKER_SEPARATOR, out);
    push_section(remote, out);
    push_marker(MARKER_REMOTE, out);
}

fn push_lines(lines: &[&str], out: &mut String) {
    lines.iter().for_each(|line| out.push_str(line));
}

/// Push lines and make sure a following marker starts on its own line.
fn push_section(lines: &[&str], out: &mut String) {
    push_lines(lines, out);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn push_marker(marker: &str, out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(marker);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn identical_inputs_merge_to_themselves() {
        let text = "one\ntwo\nthree\n";
        let merged = merge_text(text, text, text);
        assert!(merged.is_clean());
        assert_eq!(merged.content, text);
    }

    #[test]
    fn disjoint_edits_merge_cleanly() {
        let base = "a\nb\nc\nd\ne\n";
        let local = "A\nb\nc\nd\ne\n";
        let remote = "a\nb\nc\nd\nE\n";
        let merged = merge_text(base, local, remote);
        assert!(merged.is_clean());
        assert_eq!(merged.content, "A\nb\nc\nd\nE\n");
    }

    #[test]
    fn overlapping_edits_produce_markers() {
        let base = "a\nb\nc\n";
        let local = "a\nlocal\nc\n";
        let remote = "a\nremote\nc\n";
        let merged = merge_text(base, local, remote);
        assert_eq!(merged.conflicts, 1);
        assert_eq!(
            merged.content,
            "a\n<<<<<<< local\nlocal\n||||||| base\nb\n=======\nremote\n>>>>>>> remote\nc\n"
        );
    }

    #[test]
    fn missing_trailing_newline_keeps_markers_on_own_lines() {
        let merged = merge_text("x", "y", "z");
        assert_eq!(
            merged.content,
            "<<<<<<< local\ny\n||||||| base\nx\n=======\nz\n>>>>>>> remote\n"
        );
    }

    #[test]
    fn appends_on_one_side_are_kept() {
        let merged = merge_text("a\n", "a\n", "a\nb\n");
        assert!(merged.is_clean());
        assert_eq!(merged.content, "a\nb\n");
    }

    #[test]
    fn binary_sniffing() {
        assert_eq!(as_text(b"plain"), Some("plain"));
        assert_eq!(as_text(&[0x50, 0x00, 0x51]), None);
        assert_eq!(as_text(&[0xff, 0xfe, 0xfd]), None);
    }
}
