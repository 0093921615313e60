//! Comment data model.
//!
//! These types are the exact shape of the persisted JSON document, so field
//! names are camelCase on the wire and field order is the on-disk key order.
//! Nothing here touches the filesystem; see [`crate::store`] for that.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Separator between the parent comment id and the creation time in reply ids.
pub const REPLY_ID_SEPARATOR: &str = "-reply-";

/// A zero-based `(line, character)` document coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }

    /// One-based line number for display. Widened so `u32::MAX` cannot overflow.
    pub fn display_line(&self) -> u64 {
        u64::from(self.line) + 1
    }
}

/// A document range. Half-open by convention; `end` may equal `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// A range covering whole lines `first..=last`, character 0 on both ends.
    pub fn lines(first: u32, last: u32) -> Self {
        let (first, last) = if first <= last { (first, last) } else { (last, first) };
        Self::new(Position::new(first, 0), Position::new(last, 0))
    }

    /// Returns `true` if `line` falls between the start and end lines inclusive.
    pub fn contains_line(&self, line: u32) -> bool {
        self.start.line <= line && line <= self.end.line
    }
}

/// A reply inside a thread. Replies have no anchor of their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub text: String,
}

/// A top-level comment: the anchor of a thread plus its replies.
///
/// `range` is the only field that changes after creation apart from
/// `replies` and `resolved`; it is moved by [`crate::reconcile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub text: String,
    pub file_path: String,
    pub range: Range,
    #[serde(default)]
    pub replies: Vec<Reply>,
    #[serde(default)]
    pub resolved: bool,
}

impl Comment {
    /// Looks up a reply by id.
    pub fn reply(&self, reply_id: &str) -> Option<&Reply> {
        self.replies.iter().find(|r| r.id == reply_id)
    }

    /// Builds a reply id that is unique among this comment's replies.
    ///
    /// The id is `<comment id>-reply-<millis>`; if that collides (two replies
    /// within the same millisecond) the millisecond value is bumped forward.
    pub fn next_reply_id(&self, now: DateTime<Utc>) -> String {
        let mut millis = now.timestamp_millis();
        loop {
            let candidate = format!("{}{}{}", self.id, REPLY_ID_SEPARATOR, millis);
            if self.reply(&candidate).is_none() {
                return candidate;
            }
            millis += 1;
        }
    }
}

/// The whole persisted collection, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommentStore {
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl CommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn get(&self, id: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Comment> {
        self.comments.iter_mut().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Removes a comment and, with it, all of its replies.
    pub fn remove(&mut self, id: &str) -> Option<Comment> {
        let idx = self.comments.iter().position(|c| c.id == id)?;
        Some(self.comments.remove(idx))
    }

    /// Comments anchored in `file_path`, in store order.
    pub fn in_file<'a>(&'a self, file_path: &'a str) -> impl Iterator<Item = &'a Comment> + 'a {
        self.comments.iter().filter(move |c| c.file_path == file_path)
    }

    /// Generates a fresh comment id that does not collide with any stored id.
    ///
    /// Ids are UUID v7 text, so they sort by creation time.
    pub fn next_comment_id(&self) -> String {
        loop {
            let id = uuid::Uuid::now_v7().to_string();
            if !self.contains(&id) {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn comment(id: &str) -> Comment {
        Comment {
            id: id.to_owned(),
            author: "ana".to_owned(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            text: "check this".to_owned(),
            file_path: "src/lib.rs".to_owned(),
            range: Range::lines(3, 3),
            replies: Vec::new(),
            resolved: false,
        }
    }

    #[test]
    fn reply_ids_bump_past_collisions() {
        let mut c = comment("abc");
        let now = Utc.timestamp_millis_opt(1_000).unwrap();
        let first = c.next_reply_id(now);
        assert_eq!(first, "abc-reply-1000");
        c.replies.push(Reply {
            id: first,
            author: "bo".to_owned(),
            timestamp: now,
            text: "ok".to_owned(),
        });
        assert_eq!(c.next_reply_id(now), "abc-reply-1001");
    }

    #[test]
    fn range_lines_orders_its_bounds() {
        let r = Range::lines(9, 4);
        assert_eq!(r.start.line, 4);
        assert_eq!(r.end.line, 9);
        assert!(r.contains_line(4));
        assert!(r.contains_line(9));
        assert!(!r.contains_line(10));
    }

    #[test]
    fn display_line_does_not_overflow_at_the_last_line() {
        assert_eq!(Position::new(0, 0).display_line(), 1);
        assert_eq!(Position::new(u32::MAX, 0).display_line(), u64::from(u32::MAX) + 1);
    }

    #[test]
    fn missing_optional_fields_default() {
        let json = r#"{
            "id": "1",
            "author": "ana",
            "timestamp": "2024-05-01T12:00:00.000Z",
            "text": "hi",
            "filePath": "a.txt",
            "range": {"start": {"line": 1, "character": 0}, "end": {"line": 1, "character": 4}}
        }"#;
        let c: Comment = serde_json::from_str(json).unwrap();
        assert!(c.replies.is_empty());
        assert!(!c.resolved);
        assert_eq!(c.range.end.character, 4);
    }

    #[test]
    fn remove_takes_replies_with_it() {
        let mut store = CommentStore::new();
        let mut c = comment("x");
        c.replies.push(Reply {
            id: "x-reply-1".to_owned(),
            author: "bo".to_owned(),
            timestamp: c.timestamp,
            text: "r".to_owned(),
        });
        store.comments.push(c);
        store.comments.push(comment("y"));

        let removed = store.remove("x").unwrap();
        assert_eq!(removed.replies.len(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.comments.iter().all(|c| c.replies.is_empty()));
    }

    #[test]
    fn generated_comment_ids_are_unique() {
        let mut store = CommentStore::new();
        for _ in 0..64 {
            let id = store.next_comment_id();
            store.comments.push(comment(&id));
        }
        let mut ids: Vec<_> = store.comments.iter().map(|c| c.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 64);
    }
}
