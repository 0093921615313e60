//! Anchor reconciliation after document edits.
//!
//! Only whole-line shifts are tracked. For each change the net line delta is
//! `newlines(inserted_text) - (end_line - start_line)`; every comment in the
//! edited file whose anchor starts *strictly after* `start_line` is moved by
//! that delta. Comments starting on or before `start_line` never move, even if
//! the edit covers their line. That rule is kept as is: an edit that begins on
//! a comment's own line leaves the comment where it was.

use crate::model::CommentStore;

/// One contiguous edit as reported by the host, in document coordinates at the
/// time the change was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    pub start_line: u32,
    pub end_line: u32,
    pub inserted_text: String,
}

impl TextChange {
    pub fn new(start_line: u32, end_line: u32, inserted_text: impl Into<String>) -> Self {
        Self { start_line, end_line, inserted_text: inserted_text.into() }
    }

    /// Net number of lines this change adds (negative when it removes lines).
    pub fn line_delta(&self) -> i64 {
        let inserted = self.inserted_text.matches('\n').count() as i64;
        let removed = i64::from(self.end_line) - i64::from(self.start_line);
        inserted - removed
    }
}

fn shift(line: u32, delta: i64) -> u32 {
    (i64::from(line) + delta).clamp(0, i64::from(u32::MAX)) as u32
}

/// Applies `changes` to the anchors of every comment in `file_path`.
///
/// Changes are applied one pass each, in the order given. Returns the ids of
/// the comments that moved, deduplicated, in store order.
pub fn reconcile(store: &mut CommentStore, file_path: &str, changes: &[TextChange]) -> Vec<String> {
    let mut moved = vec![false; store.comments.len()];

    for change in changes {
        let delta = change.line_delta();
        if delta == 0 {
            continue;
        }
        for (idx, comment) in store.comments.iter_mut().enumerate() {
            if comment.file_path != file_path || comment.range.start.line <= change.start_line {
                continue;
            }
            let before = comment.range;
            comment.range.start.line = shift(comment.range.start.line, delta);
            comment.range.end.line = shift(comment.range.end.line, delta);
            if comment.range != before {
                tracing::debug!(
                    id = %comment.id,
                    from = before.start.line,
                    to = comment.range.start.line,
                    "moved comment anchor"
                );
                moved[idx] = true;
            }
        }
    }

    store
        .comments
        .iter()
        .zip(moved)
        .filter_map(|(c, m)| m.then(|| c.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Comment, Range};
    use chrono::Utc;

    fn store_with(anchors: &[(&str, &str, u32)]) -> CommentStore {
        let comments = anchors
            .iter()
            .map(|(id, file, line)| Comment {
                id: (*id).to_owned(),
                author: "ana".to_owned(),
                timestamp: Utc::now(),
                text: "note".to_owned(),
                file_path: (*file).to_owned(),
                range: Range::lines(*line, *line),
                replies: Vec::new(),
                resolved: false,
            })
            .collect();
        CommentStore { comments }
    }

    fn line_of(store: &CommentStore, id: &str) -> u32 {
        store.get(id).unwrap().range.start.line
    }

    #[test]
    fn insertion_above_moves_anchor_down() {
        let mut store = store_with(&[("below", "a.rs", 10), ("above", "a.rs", 3)]);
        let moved = reconcile(&mut store, "a.rs", &[TextChange::new(5, 5, "x\ny\n")]);

        assert_eq!(line_of(&store, "below"), 12);
        assert_eq!(store.get("below").unwrap().range.end.line, 12);
        assert_eq!(line_of(&store, "above"), 3);
        assert_eq!(moved, vec!["below".to_owned()]);
    }

    #[test]
    fn net_removal_moves_anchor_up() {
        let mut store = store_with(&[("c", "a.rs", 10)]);
        let change = TextChange::new(4, 7, "one line\n");
        assert_eq!(change.line_delta(), -2);

        reconcile(&mut store, "a.rs", &[change]);
        assert_eq!(line_of(&store, "c"), 8);
    }

    #[test]
    fn same_line_edit_moves_nothing() {
        let mut store = store_with(&[("c", "a.rs", 10)]);
        let moved = reconcile(&mut store, "a.rs", &[TextChange::new(2, 2, "typed")]);
        assert!(moved.is_empty());
        assert_eq!(line_of(&store, "c"), 10);
    }

    #[test]
    fn other_files_are_untouched() {
        let mut store = store_with(&[("c", "b.rs", 10)]);
        reconcile(&mut store, "a.rs", &[TextChange::new(0, 0, "\n\n")]);
        assert_eq!(line_of(&store, "c"), 10);
    }

    // Known limitation: an edit starting on the anchor line does not move it.
    #[test]
    fn edit_on_anchor_line_leaves_anchor_in_place() {
        let mut store = store_with(&[("c", "a.rs", 6)]);
        reconcile(&mut store, "a.rs", &[TextChange::new(6, 6, "\n\n\n")]);
        assert_eq!(line_of(&store, "c"), 6);

        // Nor does a deletion that starts on the anchor line and runs past it.
        reconcile(&mut store, "a.rs", &[TextChange::new(6, 9, "")]);
        assert_eq!(line_of(&store, "c"), 6);
    }

    #[test]
    fn deletion_from_above_spanning_the_anchor_pulls_it_up() {
        let mut store = store_with(&[("c", "a.rs", 6)]);
        let moved = reconcile(&mut store, "a.rs", &[TextChange::new(4, 9, "")]);
        assert_eq!(line_of(&store, "c"), 1);
        assert_eq!(store.get("c").unwrap().range.end.line, 1);
        assert_eq!(moved, vec!["c".to_owned()]);
    }

    #[test]
    fn large_deletions_clamp_at_zero() {
        let mut store = store_with(&[("c", "a.rs", 2)]);
        reconcile(&mut store, "a.rs", &[TextChange::new(0, 50, "")]);
        assert_eq!(line_of(&store, "c"), 0);
    }

    #[test]
    fn batch_changes_apply_in_order() {
        let mut store = store_with(&[("c", "a.rs", 20), ("d", "a.rs", 8)]);
        let moved = reconcile(
            &mut store,
            "a.rs",
            &[TextChange::new(10, 10, "\n"), TextChange::new(1, 3, "")],
        );
        // First change: only "c" (20 > 10) moves to 21.
        // Second change: both move up by two.
        assert_eq!(line_of(&store, "c"), 19);
        assert_eq!(line_of(&store, "d"), 6);
        assert_eq!(moved, vec!["c".to_owned(), "d".to_owned()]);
    }
}
