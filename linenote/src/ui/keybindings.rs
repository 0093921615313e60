//! Keybinding dispatcher for linenote.
//!
//! Translates crossterm key and mouse events into `AppState` mutations and
//! returns a `KeyAction`. Comment operations come back as
//! `KeyAction::Run(Command)` for the main loop to hand to the comment service.
//! Prompt, confirm and picker keys never reach this module: the modal loops in
//! `presenter` read them directly.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use linenote_core::host::Notice;
use linenote_core::Command;
use ratatui::layout::Position;

use crate::app::{AppState, Mode, PanelFocus};

/// What the event loop should do after a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
    /// Hand a command to the comment service.
    Run(Command),
}

/// Dispatches a key event to the handler for the current mode.
pub fn handle_key(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if state.mode.is_modal() {
        return KeyAction::Continue;
    }
    state.notice = None;
    match state.mode {
        Mode::HelpOverlay => handle_help(key, state),
        Mode::Preview => handle_preview(key, state),
        _ => handle_normal(key, state),
    }
}

// ---------------------------------------------------------------------------
// Normal and Select modes
// ---------------------------------------------------------------------------

fn handle_normal(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if let Some(action) = handle_scroll_key(key, state) {
        return action;
    }
    if let Some(action) = handle_comment_key(key, state) {
        return action;
    }

    match key.code {
        KeyCode::Char('H') => {
            state.focus = state.focus.prev();
            KeyAction::Continue
        }
        KeyCode::Char('L') | KeyCode::Tab => {
            state.focus = state.focus.next();
            KeyAction::Continue
        }
        KeyCode::Char('[') => {
            state.prev_comment();
            KeyAction::Continue
        }
        KeyCode::Char(']') => {
            state.next_comment();
            KeyAction::Continue
        }
        KeyCode::Char('V') => {
            state.toggle_selection();
            KeyAction::Continue
        }
        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
            KeyAction::Continue
        }
        KeyCode::Esc if state.mode == Mode::Select => {
            state.clear_selection();
            KeyAction::Continue
        }
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        _ => KeyAction::Continue,
    }
}

/// Keys that start a comment operation.
///
/// Thread-targeted keys act on the focused comment (tree selection, or the
/// first thread on the cursor line) and leave the choice to a picker when
/// there is none.
fn handle_comment_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }
    let command = match key.code {
        KeyCode::Enter if state.focus == PanelFocus::Tree => {
            let comment_id = state.selected_tree_entry()?.comment_id.clone();
            Command::Navigate { comment_id }
        }
        KeyCode::Enter if state.focus == PanelFocus::Thread => {
            let Some(target) = state.compose_target() else {
                state.notice = Some(Notice::info("Open a file to comment on"));
                return Some(KeyAction::Continue);
            };
            state.clear_selection();
            Command::Compose { target }
        }
        KeyCode::Char('a') => {
            let Some(file_path) = state.doc_path().map(str::to_owned) else {
                state.notice = Some(Notice::info("Open a file to comment on"));
                return Some(KeyAction::Continue);
            };
            let range = state.selected_range();
            state.clear_selection();
            Command::AddComment { file_path, range }
        }
        KeyCode::Char('c') => {
            let Some(file_path) = state.doc_path().map(str::to_owned) else {
                state.notice = Some(Notice::info("Open a file first"));
                return Some(KeyAction::Continue);
            };
            Command::ViewFileComments { file_path }
        }
        KeyCode::Char('r') => Command::Reply { comment_id: state.focused_comment() },
        KeyCode::Char('x') => {
            Command::ToggleResolved { comment_id: state.focused_comment(), resolved: None }
        }
        KeyCode::Char('d') => Command::DeleteComment { comment_id: state.focused_comment() },
        KeyCode::Char('D') => {
            Command::DeleteReply { comment_id: state.focused_comment(), reply_id: None }
        }
        KeyCode::Char('e') => Command::Export,
        _ => return None,
    };
    Some(KeyAction::Run(command))
}

fn handle_scroll_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => state.scroll_up(1),
        KeyCode::Char('g') | KeyCode::Home => state.scroll_top(),
        KeyCode::Char('G') | KeyCode::End => state.scroll_bottom(),
        KeyCode::Char('d') if ctrl => state.half_page_down(),
        KeyCode::Char('u') if ctrl => state.half_page_up(),
        KeyCode::Char('f') if ctrl => state.full_page_down(),
        KeyCode::Char('b') if ctrl => state.full_page_up(),
        KeyCode::PageDown => state.full_page_down(),
        KeyCode::PageUp => state.full_page_up(),
        _ => return None,
    }
    Some(KeyAction::Continue)
}

// ---------------------------------------------------------------------------
// Overlays
// ---------------------------------------------------------------------------

fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.help_scroll = state.help_scroll.saturating_add(1),
        KeyCode::Char('k') | KeyCode::Up => state.help_scroll = state.help_scroll.saturating_sub(1),
        KeyCode::Char('g') => state.help_scroll = 0,
        KeyCode::Char('G') => state.help_scroll = u16::MAX,
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

fn handle_preview(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            state.preview_scroll = state.preview_scroll.saturating_add(1)
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.preview_scroll = state.preview_scroll.saturating_sub(1)
        }
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => {
            state.preview.clear();
            state.mode = Mode::Normal;
        }
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Mouse events
// ---------------------------------------------------------------------------

/// Click focuses a panel (and moves the cursor in the document); the wheel
/// scrolls the focused panel or the open overlay by 3 lines.
pub fn handle_mouse(mouse: MouseEvent, state: &mut AppState) {
    if state.mode.is_modal() {
        return;
    }
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => handle_mouse_click(mouse.column, mouse.row, state),
        MouseEventKind::ScrollUp => match state.mode {
            Mode::HelpOverlay => state.help_scroll = state.help_scroll.saturating_sub(3),
            Mode::Preview => state.preview_scroll = state.preview_scroll.saturating_sub(3),
            _ => state.scroll_up(3),
        },
        MouseEventKind::ScrollDown => match state.mode {
            Mode::HelpOverlay => state.help_scroll = state.help_scroll.saturating_add(3),
            Mode::Preview => state.preview_scroll = state.preview_scroll.saturating_add(3),
            _ => state.scroll_down(3),
        },
        _ => {}
    }
}

fn handle_mouse_click(col: u16, row: u16, state: &mut AppState) {
    if !matches!(state.mode, Mode::Normal | Mode::Select) {
        return;
    }
    let pos = Position { x: col, y: row };
    let [tree, document, thread] = state.panel_rects;

    if tree.width > 0 && tree.contains(pos) {
        state.focus = PanelFocus::Tree;
    } else if document.contains(pos) {
        // Rows inside the border map onto document lines.
        if row > document.y && row < document.bottom().saturating_sub(1) {
            let line = state.doc_scroll + usize::from(row - document.y - 1);
            state.move_cursor_to(line);
        }
        state.focus = PanelFocus::Document;
    } else if thread.width > 0 && thread.contains(pos) {
        state.focus = PanelFocus::Thread;
    }
}
