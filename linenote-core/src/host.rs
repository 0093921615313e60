//! Interfaces the core calls into.
//!
//! The core never draws anything or reads keys. A host implements
//! [`Presenter`] to show threads, prompts, pickers and messages, and
//! [`Settings`] to expose the configured default author.

use chrono::{DateTime, Utc};

use crate::model::{Comment, Range};

/// A displayable entry inside a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadEntry {
    pub id: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub text: String,
    pub is_reply: bool,
}

/// Everything a host needs to render one comment thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadView {
    pub comment_id: String,
    pub file_path: String,
    pub range: Range,
    pub resolved: bool,
    /// The comment first, then its replies in order.
    pub entries: Vec<ThreadEntry>,
}

impl ThreadView {
    pub fn from_comment(comment: &Comment) -> Self {
        let head = ThreadEntry {
            id: comment.id.clone(),
            author: comment.author.clone(),
            timestamp: comment.timestamp,
            text: comment.text.clone(),
            is_reply: false,
        };
        let replies = comment.replies.iter().map(|r| ThreadEntry {
            id: r.id.clone(),
            author: r.author.clone(),
            timestamp: r.timestamp,
            text: r.text.clone(),
            is_reply: true,
        });
        Self {
            comment_id: comment.id.clone(),
            file_path: comment.file_path.clone(),
            range: comment.range,
            resolved: comment.resolved,
            entries: std::iter::once(head).chain(replies).collect(),
        }
    }
}

/// A single-line text input request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PromptRequest {
    pub title: String,
    pub placeholder: String,
    /// Pre-filled value.
    pub value: String,
}

impl PromptRequest {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), ..Self::default() }
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }
}

/// A yes/no gate. `destructive` asks the host to frame it as irreversible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmRequest {
    pub message: String,
    pub confirm_label: String,
    pub destructive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickItem {
    pub label: String,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

/// One open comment in the tree view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub comment_id: String,
    /// Zero-based anchor line.
    pub line: u32,
    pub author: String,
    pub preview: String,
    pub reply_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeFile {
    pub file_path: String,
    pub entries: Vec<TreeEntry>,
}

/// Unresolved comments grouped by file, files sorted by path and entries by line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommentTree {
    pub files: Vec<TreeFile>,
}

impl CommentTree {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn open_count(&self) -> usize {
        self.files.iter().map(|f| f.entries.len()).sum()
    }
}

/// The presentation side of the system.
///
/// Threads are rebuilt, never patched: when a comment changes the core
/// disposes its handle and asks for a new one. Methods that wait on the user
/// are async; `None`/`false` means the user cancelled.
#[allow(async_fn_in_trait)]
pub trait Presenter {
    /// Identity of a live thread widget.
    type Handle;

    fn create_thread(&mut self, view: &ThreadView) -> Self::Handle;

    fn dispose_thread(&mut self, handle: Self::Handle);

    async fn prompt(&mut self, request: PromptRequest) -> Option<String>;

    async fn confirm(&mut self, request: ConfirmRequest) -> bool;

    /// Returns the index of the chosen item.
    async fn pick(&mut self, title: &str, items: &[PickItem]) -> Option<usize>;

    fn notify(&mut self, notice: Notice);

    fn refresh_tree(&mut self, tree: &CommentTree);

    /// Moves the user's view to `range` in `file_path`.
    fn reveal(&mut self, file_path: &str, range: Range);

    /// Copies the Markdown export to the clipboard and shows a preview.
    fn export(&mut self, markdown: &str);
}

/// Read access to user configuration.
pub trait Settings {
    /// The configured author name, if any.
    fn default_author(&self) -> Option<String>;
}
