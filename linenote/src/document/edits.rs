//! Derives line-level `TextChange`s from two versions of a file.
//!
//! The terminal host has no editor buffer to observe, so edits are recovered
//! after the fact from a line diff. Each diff op becomes one change expressed
//! in the old file's coordinates, shaped the way an editor reports it:
//!
//! - insertion of `n` lines after line `a - 1`: `(a - 1, a - 1, "\n" * n)`
//! - deletion of lines `a..a + n`: `(a - 1, a + n - 1, "")`
//! - replacement of `a..a + m` by `n` lines: `(a, a + m, n lines)`
//!
//! Edits at the top of the file anchor on line 0 instead. The changes are
//! returned bottom-up so applying them one after another never invalidates
//! the coordinates of the ones still to come.

use linenote_core::TextChange;
use similar::{DiffTag, TextDiff};

/// Computes the changes that turn `old` into `new`, ordered by descending
/// start line.
pub fn changes_between(old: &str, new: &str) -> Vec<TextChange> {
    let diff = TextDiff::from_lines(old, new);
    let new_lines = diff.new_slices();

    let mut changes: Vec<TextChange> = diff
        .ops()
        .iter()
        .filter_map(|op| {
            let (tag, old_range, new_range) = op.as_tag_tuple();
            let start = line_no(old_range.start);
            let removed = line_no(old_range.len());
            let inserted = &new_lines[new_range];
            match tag {
                DiffTag::Equal => None,
                DiffTag::Insert if start == 0 => Some(TextChange::new(0, 0, terminated(inserted))),
                DiffTag::Insert => {
                    Some(TextChange::new(start - 1, start - 1, led(inserted)))
                }
                DiffTag::Delete if start == 0 => Some(TextChange::new(0, removed, "")),
                DiffTag::Delete => Some(TextChange::new(start - 1, start - 1 + removed, "")),
                DiffTag::Replace => {
                    Some(TextChange::new(start, start + removed, terminated(inserted)))
                }
            }
        })
        .collect();

    changes.sort_by(|a, b| b.start_line.cmp(&a.start_line));
    changes
}

fn line_no(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn strip(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Each line followed by a newline.
fn terminated(lines: &[&str]) -> String {
    lines.iter().map(|l| format!("{}\n", strip(l))).collect()
}

/// Each line preceded by a newline, as typed at the end of the line above.
fn led(lines: &[&str]) -> String {
    lines.iter().map(|l| format!("\n{}", strip(l))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use linenote_core::model::{Comment, CommentStore, Range};
    use linenote_core::reconcile::reconcile;

    fn store_at(lines: &[u32]) -> CommentStore {
        let comments = lines
            .iter()
            .map(|line| Comment {
                id: format!("c{line}"),
                author: "ana".to_owned(),
                timestamp: Utc::now(),
                text: "note".to_owned(),
                file_path: "f.txt".to_owned(),
                range: Range::lines(*line, *line),
                replies: Vec::new(),
                resolved: false,
            })
            .collect();
        CommentStore { comments }
    }

    fn anchors_after(old: &str, new: &str, lines: &[u32]) -> Vec<u32> {
        let mut store = store_at(lines);
        reconcile(&mut store, "f.txt", &changes_between(old, new));
        store.comments.iter().map(|c| c.range.start.line).collect()
    }

    #[test]
    fn identical_text_has_no_changes() {
        assert!(changes_between("a\nb\n", "a\nb\n").is_empty());
    }

    #[test]
    fn inserted_lines_push_later_anchors_down() {
        let old = "a\nb\nc\nd\n";
        let new = "a\nX\nY\nb\nc\nd\n";
        let changes = changes_between(old, new);
        assert_eq!(changes, vec![TextChange::new(0, 0, "\nX\nY")]);
        assert_eq!(anchors_after(old, new, &[0, 1, 3]), vec![0, 3, 5]);
    }

    #[test]
    fn deleted_lines_pull_later_anchors_up() {
        let old = "a\nb\nc\nd\n";
        let new = "a\nd\n";
        assert_eq!(changes_between(old, new), vec![TextChange::new(0, 2, "")]);
        assert_eq!(anchors_after(old, new, &[0, 3]), vec![0, 1]);
    }

    #[test]
    fn insertion_at_top_of_file() {
        let old = "a\nb\n";
        let new = "new\na\nb\n";
        assert_eq!(changes_between(old, new), vec![TextChange::new(0, 0, "new\n")]);
        assert_eq!(anchors_after(old, new, &[1]), vec![2]);
    }

    #[test]
    fn rewritten_line_keeps_anchors() {
        let old = "a\nb\nc\n";
        let new = "a\nB\nc\n";
        assert_eq!(anchors_after(old, new, &[0, 1, 2]), vec![0, 1, 2]);
    }

    #[test]
    fn changes_come_bottom_up() {
        let old = "a\nb\nc\nd\ne\nf\n";
        let new = "a\nX\nb\nc\nd\nf\n";
        let changes = changes_between(old, new);
        assert!(changes.windows(2).all(|w| w[0].start_line >= w[1].start_line));
        // "X" added after line 0, "e" (line 4) removed.
        assert_eq!(anchors_after(old, new, &[2, 5]), vec![3, 5]);
    }
}
