//! Modal overlays: text prompt, confirmation, picker and export preview.
//!
//! Each overlay clears its area first and is drawn after the panels, inside
//! the same `terminal.draw()` call.

use ratatui::{
    Frame,
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Clear, List, ListItem, Paragraph, Wrap},
};

use crate::app::AppState;
use crate::theme::Theme;

fn modal_block<'a>(title: String, theme: &Theme) -> Block<'a> {
    Block::bordered()
        .title(title)
        .border_style(Style::default().fg(theme.border_active))
}

/// Centered rect of `width` columns and `height` rows, clamped to the frame.
fn centered(frame: &Frame, width: u16, height: u16) -> Rect {
    let area = frame.area();
    area.centered(
        Constraint::Length(width.min(area.width)),
        Constraint::Length(height.min(area.height)),
    )
}

pub fn render_prompt(frame: &mut Frame, state: &AppState, theme: &Theme) {
    let prompt = &state.prompt;
    let width = (frame.area().width * 3 / 5).max(40);
    let area = centered(frame, width, 3);
    frame.render_widget(Clear, area);

    let content = if prompt.buffer.is_empty() {
        Line::styled(prompt.placeholder.clone(), Style::default().fg(theme.muted))
    } else {
        Line::from(vec![Span::raw(prompt.buffer.clone()), Span::styled("▏", Style::default().fg(theme.border_active))])
    };
    let title = format!(" {}  (Enter to submit, Esc to cancel) ", prompt.title);
    frame.render_widget(Paragraph::new(content).block(modal_block(title, theme)), area);
}

pub fn render_confirm(frame: &mut Frame, state: &AppState, theme: &Theme) {
    let Some(request) = &state.confirm else {
        return;
    };
    let width = (request.message.len() as u16 + 6).clamp(40, frame.area().width);
    let area = centered(frame, width, 5);
    frame.render_widget(Clear, area);

    let accent = if request.destructive { theme.notice_error } else { theme.border_active };
    let text = Text::from(vec![
        Line::raw(request.message.clone()),
        Line::raw(""),
        Line::from(vec![
            Span::styled(
                format!("[y] {}", request.confirm_label),
                Style::default().fg(accent).add_modifier(Modifier::BOLD),
            ),
            Span::styled("   [n] Cancel", Style::default().fg(theme.muted)),
        ]),
    ]);
    let block = modal_block(" Confirm ".to_owned(), theme).border_style(Style::default().fg(accent));
    frame.render_widget(Paragraph::new(text).block(block).wrap(Wrap { trim: true }), area);
}

pub fn render_picker(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    let picker = &mut state.picker;
    let height = (picker.items.len() as u16).saturating_mul(2).saturating_add(2).min(20);
    let width = (frame.area().width * 3 / 5).max(40);
    let area = centered(frame, width, height);
    frame.render_widget(Clear, area);

    let items: Vec<ListItem> = picker
        .items
        .iter()
        .map(|item| {
            ListItem::new(Text::from(vec![
                Line::raw(item.label.clone()),
                Line::styled(format!("  {}", item.detail), Style::default().fg(theme.muted)),
            ]))
        })
        .collect();
    let list = List::new(items)
        .block(modal_block(format!(" {}  (j/k, Enter, Esc) ", picker.title), theme))
        .highlight_style(Style::default().fg(theme.border_active).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, area, &mut picker.list_state);
}

pub fn render_preview(frame: &mut Frame, state: &AppState, theme: &Theme) {
    if frame.area().width < 40 {
        return;
    }
    let area = frame.area().centered(Constraint::Percentage(80), Constraint::Percentage(80));
    frame.render_widget(Clear, area);
    let title = " Exported to clipboard  (j/k scroll, Esc to close) ".to_owned();
    frame.render_widget(
        Paragraph::new(state.preview.as_str())
            .block(modal_block(title, theme))
            .wrap(Wrap { trim: false })
            .scroll((state.preview_scroll, 0)),
        area,
    );
}
