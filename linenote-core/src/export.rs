//! Markdown rendering of the whole comment store.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::model::{Comment, CommentStore};

/// Timestamp format used in exports and thread panels.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Renders every comment grouped by file, files in path order.
///
/// Returns `None` for an empty store. Within a file, comments keep store order.
pub fn render_markdown(store: &CommentStore) -> Option<String> {
    if store.is_empty() {
        return None;
    }

    let mut by_file: BTreeMap<&str, Vec<&Comment>> = BTreeMap::new();
    for comment in &store.comments {
        by_file.entry(comment.file_path.as_str()).or_default().push(comment);
    }

    let mut out = String::from("# Code Comments\n");
    for (file, comments) in by_file {
        let _ = write!(out, "\n## {file}\n");
        for comment in comments {
            render_comment(&mut out, comment);
        }
    }
    Some(out)
}

fn render_comment(out: &mut String, comment: &Comment) {
    let marker = if comment.resolved { "[resolved]" } else { "[open]" };
    let _ = write!(
        out,
        "\n### {marker} Line {} - {} ({})\n\n{}\n",
        comment.range.start.display_line(),
        comment.author,
        format_timestamp(&comment.timestamp),
        comment.text,
    );
    if !comment.replies.is_empty() {
        out.push('\n');
        for reply in &comment.replies {
            let _ = writeln!(
                out,
                "- **{}** ({}): {}",
                reply.author,
                format_timestamp(&reply.timestamp),
                reply.text,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Range, Reply};
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, 30, 0).unwrap()
    }

    #[test]
    fn empty_store_has_nothing_to_export() {
        assert_eq!(render_markdown(&CommentStore::default()), None);
    }

    #[test]
    fn groups_by_file_with_one_based_lines() {
        let store = CommentStore {
            comments: vec![
                Comment {
                    id: "1".into(),
                    author: "ana".into(),
                    timestamp: at(9),
                    text: "rename this".into(),
                    file_path: "src/z.rs".into(),
                    range: Range::lines(0, 0),
                    replies: vec![Reply {
                        id: "1-reply-5".into(),
                        author: "bo".into(),
                        timestamp: at(10),
                        text: "done".into(),
                    }],
                    resolved: true,
                },
                Comment {
                    id: "2".into(),
                    author: "cy".into(),
                    timestamp: at(11),
                    text: "why?".into(),
                    file_path: "src/a.rs".into(),
                    range: Range::lines(41, 42),
                    replies: Vec::new(),
                    resolved: false,
                },
            ],
        };

        let md = render_markdown(&store).unwrap();
        let expected = "# Code Comments\n\
            \n## src/a.rs\n\
            \n### [open] Line 42 - cy (2024-05-01 11:30 UTC)\n\nwhy?\n\
            \n## src/z.rs\n\
            \n### [resolved] Line 1 - ana (2024-05-01 09:30 UTC)\n\nrename this\n\
            \n- **bo** (2024-05-01 10:30 UTC): done\n";
        assert_eq!(md, expected);
    }

    #[test]
    fn anchor_pushed_to_the_last_line_still_exports() {
        use crate::reconcile::{reconcile, TextChange};

        let mut store = CommentStore {
            comments: vec![Comment {
                id: "far".into(),
                author: "ana".into(),
                timestamp: at(9),
                text: "end of file".into(),
                file_path: "big.log".into(),
                range: Range::lines(u32::MAX - 1, u32::MAX - 1),
                replies: Vec::new(),
                resolved: false,
            }],
        };
        reconcile(&mut store, "big.log", &[TextChange::new(0, 0, "\n\n\n")]);
        assert_eq!(store.comments[0].range.start.line, u32::MAX);

        let md = render_markdown(&store).unwrap();
        assert!(md.contains("### [open] Line 4294967296 - ana"), "{md}");
    }
}
