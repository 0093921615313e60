//! Centre panel: the open document with a comment gutter.
//!
//! Virtual scrolling: only `lines[doc_scroll..doc_scroll + height]` are turned
//! into list items per frame, so large files cost O(viewport) to draw.

use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{List, ListItem},
};

use crate::app::{AppState, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

pub fn render_document(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::Document;
    let title = state.doc_path().unwrap_or("Document").to_owned();
    let block = panel_block(title, is_focused, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let Some(doc) = &state.document else {
        let msg = if state.loading.is_some() {
            "Loading..."
        } else {
            "No file open. Pick a comment in the tree or pass a path."
        };
        frame.render_widget(List::new(vec![ListItem::new(Line::raw(msg))]), inner);
        return;
    };

    let total = doc.lines.len();
    let number_width = total.max(1).to_string().len();
    let start = state.doc_scroll.min(total.saturating_sub(1));
    let end = (start + inner.height as usize).min(total);

    let items: Vec<ListItem> = (start..end)
        .map(|idx| {
            let marker = match state.marker_at(idx) {
                Some(false) => Span::styled("● ", Style::default().fg(theme.marker_open)),
                Some(true) => Span::styled("✓ ", Style::default().fg(theme.marker_resolved)),
                None => Span::raw("  "),
            };
            let number = Span::styled(
                format!("{:>number_width$} ", idx + 1),
                Style::default().fg(theme.gutter),
            );
            let mut spans = vec![marker, number];
            spans.extend(doc.lines[idx].spans.iter().cloned());

            let item = ListItem::new(Line::from(spans));
            if idx == state.cursor {
                item.style(Style::default().bg(theme.cursor_line_bg))
            } else if state.is_selected(idx) {
                item.style(Style::default().bg(theme.selection_bg))
            } else {
                item
            }
        })
        .collect();

    frame.render_widget(List::new(items), inner);
}
