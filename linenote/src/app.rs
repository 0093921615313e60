//! Central application state for linenote.
//!
//! Holds the open document, cursor and selection, the threads the comment
//! service has handed to the terminal, the open-comment tree, and the state of
//! whichever modal overlay is showing. Nothing here draws; `ui` reads this
//! state and `ui::keybindings` mutates it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use linenote_core::host::{CommentTree, ConfirmRequest, Notice, PickItem, ThreadView, TreeEntry};
use linenote_core::{Range, ThreadTarget};
use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::ListState;

use crate::document::types::DocPayload;

/// Editor mode controlling which keybinding set is active.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Cursor movement and commands.
    #[default]
    Normal,
    /// Line selection anchored at `AppState::select_anchor`.
    Select,
    /// Help overlay above all panels.
    HelpOverlay,
    /// Exported markdown preview.
    Preview,
    /// Single-line text prompt owned by a running command.
    Prompt,
    /// Yes/no confirmation owned by a running command.
    Confirm,
    /// List picker owned by a running command.
    Picker,
}

impl Mode {
    /// Modes driven by a command awaiting user input.
    pub fn is_modal(self) -> bool {
        matches!(self, Mode::Prompt | Mode::Confirm | Mode::Picker)
    }
}

/// Which panel has keyboard focus. Cycles Tree → Document → Thread.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    /// Left panel: open comments grouped by file.
    Tree,
    /// Centre panel: the document with comment markers.
    #[default]
    Document,
    /// Right panel: threads anchored on the cursor line.
    Thread,
}

impl PanelFocus {
    pub fn prev(self) -> Self {
        match self {
            PanelFocus::Tree => PanelFocus::Thread,
            PanelFocus::Document => PanelFocus::Tree,
            PanelFocus::Thread => PanelFocus::Document,
        }
    }

    pub fn next(self) -> Self {
        match self {
            PanelFocus::Tree => PanelFocus::Document,
            PanelFocus::Document => PanelFocus::Thread,
            PanelFocus::Thread => PanelFocus::Tree,
        }
    }
}

/// The file shown in the centre panel.
#[derive(Debug, Clone)]
pub struct Document {
    /// Workspace-relative path, as stored on comments.
    pub rel_path: String,
    pub abs_path: PathBuf,
    pub lines: Vec<Line<'static>>,
    /// Modification time at the last load; polled on every tick.
    pub modified: Option<SystemTime>,
}

/// Text input state for `Mode::Prompt`.
#[derive(Debug, Clone, Default)]
pub struct PromptState {
    pub title: String,
    pub placeholder: String,
    pub buffer: String,
}

/// List state for `Mode::Picker`.
#[derive(Debug, Clone, Default)]
pub struct PickerState {
    pub title: String,
    pub items: Vec<PickItem>,
    pub list_state: ListState,
}

/// All mutable UI state passed through every render cycle.
pub struct AppState {
    pub mode: Mode,
    pub focus: PanelFocus,

    /// Workspace root; document paths are resolved against it.
    pub root: PathBuf,
    pub document: Option<Document>,
    /// Relative path of a load request still in flight.
    pub loading: Option<String>,
    /// Line to move the cursor to once the loading document arrives.
    pub pending_reveal: Option<u32>,
    /// Payloads that arrived while a modal prompt owned the event loop.
    pub deferred: Vec<Box<DocPayload>>,

    /// Zero-based cursor line in the document.
    pub cursor: usize,
    pub doc_scroll: usize,
    /// Other end of the line selection in `Mode::Select`.
    pub select_anchor: Option<usize>,

    /// Threads currently shown, keyed by the handle given to the service.
    pub threads: BTreeMap<u64, ThreadView>,
    pub next_handle: u64,
    pub tree: CommentTree,
    /// Selection over the flattened tree entries.
    pub tree_state: ListState,
    pub thread_scroll: u16,

    /// Last message from the comment service; cleared on the next key.
    pub notice: Option<Notice>,
    pub prompt: PromptState,
    pub confirm: Option<ConfirmRequest>,
    pub picker: PickerState,
    pub preview: String,
    pub preview_scroll: u16,
    pub help_scroll: u16,

    /// Inner heights cached after each render for page movement.
    pub doc_viewport_height: u16,
    pub thread_viewport_height: u16,
    pub tree_viewport_height: u16,
    /// Outer rects of the tree, document and thread panels from the last render.
    pub panel_rects: [Rect; 3],

    pub quit_requested: bool,
}

impl AppState {
    pub fn new(root: PathBuf) -> Self {
        Self {
            mode: Mode::default(),
            focus: PanelFocus::default(),
            root,
            document: None,
            loading: None,
            pending_reveal: None,
            deferred: Vec::new(),
            cursor: 0,
            doc_scroll: 0,
            select_anchor: None,
            threads: BTreeMap::new(),
            next_handle: 0,
            tree: CommentTree::default(),
            tree_state: ListState::default(),
            thread_scroll: 0,
            notice: None,
            prompt: PromptState::default(),
            confirm: None,
            picker: PickerState::default(),
            preview: String::new(),
            preview_scroll: 0,
            help_scroll: 0,
            doc_viewport_height: 0,
            thread_viewport_height: 0,
            tree_viewport_height: 0,
            panel_rects: [Rect::default(); 3],
            quit_requested: false,
        }
    }

    /// Resolves a workspace-relative path against the root.
    pub fn absolute(&self, rel_path: &str) -> PathBuf {
        let path = Path::new(rel_path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn doc_path(&self) -> Option<&str> {
        self.document.as_ref().map(|d| d.rel_path.as_str())
    }

    fn line_count(&self) -> usize {
        self.document.as_ref().map_or(0, |d| d.lines.len())
    }

    // -----------------------------------------------------------------------
    // Document
    // -----------------------------------------------------------------------

    /// Installs a loaded document. A reload of the same file keeps the cursor;
    /// a different file resets it, or jumps to a pending reveal.
    pub fn apply_document(&mut self, payload: DocPayload) {
        let same_file = self.doc_path() == Some(payload.rel_path.as_str());
        if self.loading.as_deref() == Some(payload.rel_path.as_str()) {
            self.loading = None;
        }
        if let Some(error) = payload.error {
            self.notice = Some(Notice::error(format!(
                "Could not open {}: {error}",
                payload.rel_path
            )));
            self.pending_reveal = None;
            return;
        }

        self.document = Some(Document {
            rel_path: payload.rel_path,
            abs_path: payload.abs_path,
            lines: payload.lines,
            modified: payload.modified,
        });
        if !same_file {
            self.cursor = 0;
            self.doc_scroll = 0;
            self.select_anchor = None;
            if self.mode == Mode::Select {
                self.mode = Mode::Normal;
            }
        }
        if let Some(line) = self.pending_reveal.take() {
            self.cursor = line as usize;
            self.focus = PanelFocus::Document;
        }
        self.clamp_cursor();
    }

    /// Returns `true` when the open document changed on disk since it was
    /// loaded and no load is already in flight.
    pub fn document_is_stale(&self) -> bool {
        let Some(doc) = &self.document else {
            return false;
        };
        if self.loading.is_some() {
            return false;
        }
        let on_disk = std::fs::metadata(&doc.abs_path).and_then(|m| m.modified()).ok();
        on_disk.is_some() && on_disk != doc.modified
    }

    // -----------------------------------------------------------------------
    // Cursor and selection
    // -----------------------------------------------------------------------

    fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.line_count().saturating_sub(1));
        if let Some(anchor) = self.select_anchor {
            self.select_anchor = Some(anchor.min(self.line_count().saturating_sub(1)));
        }
        self.ensure_cursor_visible();
    }

    /// Scrolls the document so the cursor is inside the cached viewport.
    pub fn ensure_cursor_visible(&mut self) {
        let height = usize::from(self.doc_viewport_height.max(1));
        if self.cursor < self.doc_scroll {
            self.doc_scroll = self.cursor;
        } else if self.cursor >= self.doc_scroll + height {
            self.doc_scroll = self.cursor + 1 - height;
        }
    }

    pub fn cursor_down(&mut self, lines: usize) {
        self.cursor = self.cursor.saturating_add(lines);
        self.thread_scroll = 0;
        self.clamp_cursor();
    }

    pub fn cursor_up(&mut self, lines: usize) {
        self.cursor = self.cursor.saturating_sub(lines);
        self.thread_scroll = 0;
        self.clamp_cursor();
    }

    /// Puts the cursor on `line` and focuses the document.
    pub fn move_cursor_to(&mut self, line: usize) {
        self.cursor = line;
        self.thread_scroll = 0;
        self.focus = PanelFocus::Document;
        self.clamp_cursor();
    }

    /// Starts a line selection at the cursor, or drops the current one.
    pub fn toggle_selection(&mut self) {
        if self.mode == Mode::Select {
            self.clear_selection();
        } else if self.document.is_some() {
            self.select_anchor = Some(self.cursor);
            self.mode = Mode::Select;
        }
    }

    pub fn clear_selection(&mut self) {
        self.select_anchor = None;
        if self.mode == Mode::Select {
            self.mode = Mode::Normal;
        }
    }

    /// The selected lines, or the cursor line when nothing is selected.
    pub fn selected_range(&self) -> Range {
        let anchor = self.select_anchor.unwrap_or(self.cursor);
        Range::lines(to_u32(anchor), to_u32(self.cursor))
    }

    pub fn is_selected(&self, line: usize) -> bool {
        self.select_anchor.is_some_and(|anchor| {
            let (lo, hi) = if anchor <= self.cursor { (anchor, self.cursor) } else { (self.cursor, anchor) };
            (lo..=hi).contains(&line)
        })
    }

    // -----------------------------------------------------------------------
    // Threads
    // -----------------------------------------------------------------------

    /// Threads of the open document, ordered by anchor line.
    pub fn document_threads(&self) -> Vec<&ThreadView> {
        let Some(path) = self.doc_path() else {
            return Vec::new();
        };
        let mut threads: Vec<&ThreadView> =
            self.threads.values().filter(|t| t.file_path == path).collect();
        threads.sort_by_key(|t| (t.range.start.line, t.range.end.line));
        threads
    }

    /// Threads whose range covers the cursor line.
    pub fn threads_at_cursor(&self) -> Vec<&ThreadView> {
        let line = to_u32(self.cursor);
        self.document_threads().into_iter().filter(|t| t.range.contains_line(line)).collect()
    }

    /// Gutter marker state for `line`: `Some(true)` if every thread starting
    /// there is resolved, `Some(false)` if any is open.
    pub fn marker_at(&self, line: usize) -> Option<bool> {
        let line = to_u32(line);
        let mut starting = self
            .document_threads()
            .into_iter()
            .filter(|t| t.range.start.line == line)
            .peekable();
        starting.peek()?;
        Some(starting.all(|t| t.resolved))
    }

    /// Moves the cursor to the next comment anchor below it.
    pub fn next_comment(&mut self) {
        let cursor = to_u32(self.cursor);
        let next = self
            .document_threads()
            .iter()
            .map(|t| t.range.start.line)
            .find(|&l| l > cursor);
        if let Some(line) = next {
            self.cursor = line as usize;
            self.clamp_cursor();
        }
    }

    /// Moves the cursor to the nearest comment anchor above it.
    pub fn prev_comment(&mut self) {
        let cursor = to_u32(self.cursor);
        let prev = self
            .document_threads()
            .iter()
            .rev()
            .map(|t| t.range.start.line)
            .find(|&l| l < cursor);
        if let Some(line) = prev {
            self.cursor = line as usize;
            self.clamp_cursor();
        }
    }

    // -----------------------------------------------------------------------
    // Tree
    // -----------------------------------------------------------------------

    /// Tree entries in display order, each with its file path.
    pub fn tree_entries(&self) -> impl Iterator<Item = (&str, &TreeEntry)> {
        self.tree
            .files
            .iter()
            .flat_map(|f| f.entries.iter().map(move |e| (f.file_path.as_str(), e)))
    }

    pub fn set_tree(&mut self, tree: CommentTree) {
        self.tree = tree;
        let count = self.tree.open_count();
        match self.tree_state.selected() {
            _ if count == 0 => self.tree_state.select(None),
            Some(idx) if idx >= count => self.tree_state.select(Some(count - 1)),
            None => self.tree_state.select(Some(0)),
            Some(_) => {}
        }
    }

    /// Selects tree entry `idx`, clamped to the last entry.
    pub fn select_tree(&mut self, idx: usize) {
        let count = self.tree.open_count();
        self.tree_state.select((count > 0).then(|| idx.min(count - 1)));
    }

    pub fn selected_tree_entry(&self) -> Option<&TreeEntry> {
        let idx = self.tree_state.selected()?;
        self.tree_entries().nth(idx).map(|(_, e)| e)
    }

    /// The comment a command should act on: the selected tree entry when the
    /// tree has focus, otherwise the first thread on the cursor line.
    pub fn focused_comment(&self) -> Option<String> {
        match self.focus {
            PanelFocus::Tree => self.selected_tree_entry().map(|e| e.comment_id.clone()),
            PanelFocus::Document | PanelFocus::Thread => {
                self.threads_at_cursor().first().map(|t| t.comment_id.clone())
            }
        }
    }

    /// Where text typed into the thread panel goes: the first thread on the
    /// cursor line, or a fresh thread over the cursor line or selection.
    pub fn compose_target(&self) -> Option<ThreadTarget> {
        let file_path = self.doc_path()?.to_owned();
        let target = match self.threads_at_cursor().first() {
            Some(thread) => ThreadTarget {
                file_path,
                range: thread.range,
                comment_id: Some(thread.comment_id.clone()),
                entry_count: thread.entries.len(),
            },
            None => ThreadTarget { file_path, range: self.selected_range(), comment_id: None, entry_count: 0 },
        };
        Some(target)
    }

    // -----------------------------------------------------------------------
    // Focus-relative scrolling
    // -----------------------------------------------------------------------

    pub fn scroll_down(&mut self, lines: u16) {
        match self.focus {
            PanelFocus::Tree => {
                let idx = self.tree_state.selected().map_or(0, |i| i + usize::from(lines));
                self.select_tree(idx);
            }
            PanelFocus::Document => self.cursor_down(usize::from(lines)),
            PanelFocus::Thread => self.thread_scroll = self.thread_scroll.saturating_add(lines),
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        match self.focus {
            PanelFocus::Tree => {
                let idx = self.tree_state.selected().unwrap_or(0).saturating_sub(usize::from(lines));
                self.select_tree(idx);
            }
            PanelFocus::Document => self.cursor_up(usize::from(lines)),
            PanelFocus::Thread => self.thread_scroll = self.thread_scroll.saturating_sub(lines),
        }
    }

    pub fn scroll_top(&mut self) {
        match self.focus {
            PanelFocus::Tree => self.select_tree(0),
            PanelFocus::Document => self.cursor_up(usize::MAX),
            PanelFocus::Thread => self.thread_scroll = 0,
        }
    }

    pub fn scroll_bottom(&mut self) {
        match self.focus {
            PanelFocus::Tree => self.select_tree(usize::MAX),
            PanelFocus::Document => self.cursor_down(usize::MAX),
            PanelFocus::Thread => self.thread_scroll = u16::MAX,
        }
    }

    fn viewport_height(&self) -> u16 {
        match self.focus {
            PanelFocus::Tree => self.tree_viewport_height,
            PanelFocus::Document => self.doc_viewport_height,
            PanelFocus::Thread => self.thread_viewport_height,
        }
    }

    pub fn half_page_down(&mut self) {
        self.scroll_down((self.viewport_height() / 2).max(1));
    }

    pub fn half_page_up(&mut self) {
        self.scroll_up((self.viewport_height() / 2).max(1));
    }

    pub fn full_page_down(&mut self) {
        self.scroll_down(self.viewport_height().max(1));
    }

    pub fn full_page_up(&mut self) {
        self.scroll_up(self.viewport_height().max(1));
    }
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use linenote_core::host::{ThreadEntry, TreeFile};

    fn payload(rel: &str, lines: usize) -> DocPayload {
        DocPayload {
            rel_path: rel.to_owned(),
            abs_path: PathBuf::from("/w").join(rel),
            modified: None,
            lines: (0..lines).map(|i| Line::raw(format!("line {i}"))).collect(),
            changes: None,
            error: None,
        }
    }

    fn thread(id: &str, file: &str, first: u32, last: u32, resolved: bool) -> ThreadView {
        ThreadView {
            comment_id: id.to_owned(),
            file_path: file.to_owned(),
            range: Range::lines(first, last),
            resolved,
            entries: vec![ThreadEntry {
                id: id.to_owned(),
                author: "ana".to_owned(),
                timestamp: Utc::now(),
                text: "note".to_owned(),
                is_reply: false,
            }],
        }
    }

    fn state_with_doc() -> AppState {
        let mut state = AppState::new(PathBuf::from("/w"));
        state.doc_viewport_height = 10;
        state.apply_document(payload("a.rs", 40));
        state
    }

    #[test]
    fn cursor_is_clamped_to_document() {
        let mut state = state_with_doc();
        state.cursor_down(100);
        assert_eq!(state.cursor, 39);
        assert_eq!(state.doc_scroll, 30);
        state.cursor_up(100);
        assert_eq!((state.cursor, state.doc_scroll), (0, 0));
    }

    #[test]
    fn reload_keeps_cursor_and_new_file_resets_it() {
        let mut state = state_with_doc();
        state.cursor_down(12);
        state.apply_document(payload("a.rs", 41));
        assert_eq!(state.cursor, 12);

        state.pending_reveal = Some(7);
        state.apply_document(payload("b.rs", 20));
        assert_eq!(state.cursor, 7);
        assert_eq!(state.doc_path(), Some("b.rs"));
    }

    #[test]
    fn selection_covers_both_directions() {
        let mut state = state_with_doc();
        state.cursor_down(5);
        state.toggle_selection();
        state.cursor_up(3);
        assert_eq!(state.selected_range(), Range::lines(2, 5));
        assert!(state.is_selected(4));
        assert!(!state.is_selected(6));
        state.toggle_selection();
        assert_eq!(state.mode, Mode::Normal);
        assert_eq!(state.selected_range(), Range::lines(2, 2));
    }

    #[test]
    fn markers_and_comment_jumps_follow_open_document() {
        let mut state = state_with_doc();
        state.threads.insert(1, thread("x", "a.rs", 4, 6, false));
        state.threads.insert(2, thread("y", "a.rs", 20, 20, true));
        state.threads.insert(3, thread("z", "other.rs", 10, 10, false));

        assert_eq!(state.marker_at(4), Some(false));
        assert_eq!(state.marker_at(20), Some(true));
        assert_eq!(state.marker_at(10), None);

        state.next_comment();
        assert_eq!(state.cursor, 4);
        state.cursor_down(1);
        assert_eq!(state.focused_comment().as_deref(), Some("x"));
        state.next_comment();
        assert_eq!(state.cursor, 20);
        state.prev_comment();
        assert_eq!(state.cursor, 4);
    }

    #[test]
    fn tree_selection_survives_refresh() {
        let mut state = state_with_doc();
        let entry = |id: &str, line| TreeEntry {
            comment_id: id.to_owned(),
            line,
            author: "ana".to_owned(),
            preview: "p".to_owned(),
            reply_count: 0,
        };
        state.set_tree(CommentTree {
            files: vec![TreeFile { file_path: "a.rs".into(), entries: vec![entry("x", 1), entry("y", 2)] }],
        });
        assert_eq!(state.selected_tree_entry().map(|e| e.comment_id.as_str()), Some("x"));
        state.tree_state.select(Some(1));
        state.set_tree(CommentTree {
            files: vec![TreeFile { file_path: "a.rs".into(), entries: vec![entry("x", 1)] }],
        });
        assert_eq!(state.tree_state.selected(), Some(0));
        state.focus = PanelFocus::Tree;
        assert_eq!(state.focused_comment().as_deref(), Some("x"));
        state.set_tree(CommentTree::default());
        assert_eq!(state.tree_state.selected(), None);
    }
}
