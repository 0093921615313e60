//! Terminal implementation of the comment service's `Presenter`.
//!
//! Prompts, confirmations and pickers are modal: they switch
//! `AppState::mode`, then pump the shared event channel themselves (drawing on
//! `Render`, reading keys) until the user answers. Document loads that arrive
//! meanwhile are parked in `AppState::deferred` for the main loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Sender;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use linenote_core::host::{
    CommentTree, ConfirmRequest, Notice, PickItem, Presenter, PromptRequest, ThreadView,
};
use linenote_core::Range;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::app::{AppState, Mode, PickerState, PromptState};
use crate::document::types::DocRequest;
use crate::event::AppEvent;
use crate::theme::Theme;
use crate::tui::{copy_to_clipboard, Tui};
use crate::ui;

/// The running terminal application, as seen by `CommentService`.
///
/// Owns the terminal, the receiving end of the event channel and all UI state;
/// the main loop works through it between service calls.
pub struct TerminalHost {
    pub terminal: Tui,
    pub rx: UnboundedReceiver<AppEvent>,
    pub state: AppState,
    pub theme: Theme,
    pub doc_tx: Sender<DocRequest>,
    pub term_flag: Arc<AtomicBool>,
}

impl TerminalHost {
    pub fn new(
        terminal: Tui,
        rx: UnboundedReceiver<AppEvent>,
        state: AppState,
        theme: Theme,
        doc_tx: Sender<DocRequest>,
        term_flag: Arc<AtomicBool>,
    ) -> Self {
        Self { terminal, rx, state, theme, doc_tx, term_flag }
    }

    /// Draws one frame from the current state.
    ///
    /// # Errors
    ///
    /// Returns `Err` if writing to the terminal fails.
    pub fn draw(&mut self) -> std::io::Result<()> {
        let Self { terminal, state, theme, .. } = self;
        terminal.draw(|frame| ui::render(frame, state, theme)).map(drop)
    }

    /// Returns `true` once SIGTERM arrived or a modal saw the channel close.
    pub fn should_quit(&self) -> bool {
        self.state.quit_requested || self.term_flag.load(Ordering::Relaxed)
    }

    /// Requests a (re)load of `rel_path` from the document worker.
    pub fn open_document(&mut self, rel_path: &str) {
        request_document(&mut self.state, &self.doc_tx, rel_path);
    }

    /// Waits for the next key press while a modal overlay is up.
    ///
    /// Returns `None` when the application is shutting down; the caller treats
    /// that as a cancel.
    async fn next_key(&mut self) -> Option<KeyEvent> {
        loop {
            if self.term_flag.load(Ordering::Relaxed) {
                self.state.quit_requested = true;
                return None;
            }
            let event = tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(50)) => continue,
                event = self.rx.recv() => event,
            };
            match event {
                Some(AppEvent::Key(key)) => return Some(key),
                Some(AppEvent::Render) => {
                    if let Err(e) = self.draw() {
                        tracing::warn!(error = %e, "draw failed");
                    }
                }
                Some(AppEvent::DocLoaded(payload)) => self.state.deferred.push(payload),
                Some(AppEvent::Quit) | None => {
                    self.state.quit_requested = true;
                    return None;
                }
                Some(_) => {}
            }
        }
    }

    fn redraw(&mut self) {
        if let Err(e) = self.draw() {
            tracing::warn!(error = %e, "draw failed");
        }
    }
}

/// Asks the document worker for `rel_path`, unless it is already loading.
pub fn request_document(state: &mut AppState, doc_tx: &Sender<DocRequest>, rel_path: &str) {
    if state.loading.as_deref() == Some(rel_path) {
        return;
    }
    let request = DocRequest::Load { abs_path: state.absolute(rel_path), rel_path: rel_path.to_owned() };
    if doc_tx.send(request).is_ok() {
        state.loading = Some(rel_path.to_owned());
    } else {
        tracing::error!(path = rel_path, "document worker is gone");
    }
}

impl Presenter for TerminalHost {
    type Handle = u64;

    fn create_thread(&mut self, view: &ThreadView) -> u64 {
        self.state.next_handle += 1;
        let handle = self.state.next_handle;
        self.state.threads.insert(handle, view.clone());
        handle
    }

    fn dispose_thread(&mut self, handle: u64) {
        self.state.threads.remove(&handle);
    }

    async fn prompt(&mut self, request: PromptRequest) -> Option<String> {
        self.state.prompt = PromptState {
            title: request.title,
            placeholder: request.placeholder,
            buffer: request.value,
        };
        self.state.mode = Mode::Prompt;
        self.redraw();

        let answer = loop {
            let Some(key) = self.next_key().await else {
                break None;
            };
            let buffer = &mut self.state.prompt.buffer;
            match key.code {
                KeyCode::Enter => break Some(std::mem::take(buffer)),
                KeyCode::Esc => break None,
                KeyCode::Backspace => {
                    buffer.pop();
                }
                KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    buffer.clear();
                }
                KeyCode::Char(c) => buffer.push(c),
                _ => {}
            }
        };
        self.state.mode = Mode::Normal;
        answer
    }

    async fn confirm(&mut self, request: ConfirmRequest) -> bool {
        self.state.confirm = Some(request);
        self.state.mode = Mode::Confirm;
        self.redraw();

        let answer = loop {
            let Some(key) = self.next_key().await else {
                break false;
            };
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => break true,
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Char('q') | KeyCode::Esc => {
                    break false
                }
                _ => {}
            }
        };
        self.state.confirm = None;
        self.state.mode = Mode::Normal;
        answer
    }

    async fn pick(&mut self, title: &str, items: &[PickItem]) -> Option<usize> {
        if items.is_empty() {
            return None;
        }
        let mut picker = PickerState { title: title.to_owned(), items: items.to_vec(), ..Default::default() };
        picker.list_state.select(Some(0));
        self.state.picker = picker;
        self.state.mode = Mode::Picker;
        self.redraw();

        let last = items.len() - 1;
        let answer = loop {
            let Some(key) = self.next_key().await else {
                break None;
            };
            let list = &mut self.state.picker.list_state;
            let current = list.selected().unwrap_or(0);
            match key.code {
                KeyCode::Char('j') | KeyCode::Down => list.select(Some((current + 1).min(last))),
                KeyCode::Char('k') | KeyCode::Up => list.select(Some(current.saturating_sub(1))),
                KeyCode::Char('g') | KeyCode::Home => list.select(Some(0)),
                KeyCode::Char('G') | KeyCode::End => list.select(Some(last)),
                KeyCode::Enter => break Some(current),
                KeyCode::Esc | KeyCode::Char('q') => break None,
                _ => {}
            }
        };
        self.state.picker = PickerState::default();
        self.state.mode = Mode::Normal;
        answer
    }

    fn notify(&mut self, notice: Notice) {
        self.state.notice = Some(notice);
    }

    fn refresh_tree(&mut self, tree: &CommentTree) {
        self.state.set_tree(tree.clone());
    }

    fn reveal(&mut self, file_path: &str, range: Range) {
        let line = range.start.line as usize;
        if self.state.doc_path() == Some(file_path) {
            self.state.move_cursor_to(line);
        } else {
            self.state.pending_reveal = Some(range.start.line);
            self.open_document(file_path);
        }
    }

    fn export(&mut self, markdown: &str) {
        if let Err(e) = copy_to_clipboard(self.terminal.backend_mut(), markdown) {
            tracing::warn!(error = %e, "clipboard copy failed");
        }
        self.state.preview = markdown.to_owned();
        self.state.preview_scroll = 0;
        self.state.mode = Mode::Preview;
    }
}
