//! UI rendering for linenote.
//!
//! `render()` is the single entry point used by every `terminal.draw()` call,
//! both in the main loop and inside modal prompts. Layout math lives in
//! `layout`, each panel in its own module, overlays last so they sit on top.

mod comment_tree;
mod document_view;
mod help;
mod layout;
mod overlays;
mod thread_view;
pub mod keybindings;

use ratatui::Frame;

use crate::app::{AppState, Mode};
use crate::theme::Theme;
use layout::{compute_layout, inner_rect, render_status_bar};

/// Renders one complete frame.
///
/// Viewport heights and panel rects are written back into `state` first, so
/// page movement and mouse hit-testing on the next event use this frame's
/// geometry.
pub fn render(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    let [tree, document, thread, status_bar] = compute_layout(frame);

    state.tree_viewport_height = inner_rect(tree).height;
    state.doc_viewport_height = inner_rect(document).height;
    state.thread_viewport_height = inner_rect(thread).height;
    state.panel_rects = [tree, document, thread];
    state.ensure_cursor_visible();

    if tree.width > 0 {
        comment_tree::render_comment_tree(frame, tree, state, theme);
    }
    document_view::render_document(frame, document, state, theme);
    if thread.width > 0 {
        thread_view::render_threads(frame, thread, state, theme);
    }
    render_status_bar(frame, status_bar, state, theme);

    match state.mode {
        Mode::HelpOverlay => help::render_help_overlay(frame, theme, state.help_scroll),
        Mode::Preview => overlays::render_preview(frame, state, theme),
        Mode::Prompt => overlays::render_prompt(frame, state, theme),
        Mode::Confirm => overlays::render_confirm(frame, state, theme),
        Mode::Picker => overlays::render_picker(frame, state, theme),
        Mode::Normal | Mode::Select => {}
    }
}
