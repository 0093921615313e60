//! Responsive 3-panel layout for linenote.
//!
//! Pure layout arithmetic, recomputed inside every `terminal.draw()` so the
//! panels follow the live terminal size.
//!
//! At `>= 120` columns the comment tree, document and thread panels share the
//! width 22 / 48 / 30. Between 80 and 119 columns the tree collapses. Below 80
//! only the document remains and threads are reached through the pickers.
//!
//! `Spacing::Overlap(1)` plus `MergeStrategy::Fuzzy` lets neighbouring panels
//! share one border column with merged junction glyphs.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect, Spacing},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
};

use linenote_core::host::NoticeLevel;

use crate::app::{AppState, Mode};
use crate::theme::Theme;

/// Returns `[tree, document, thread, status_bar]` rects for the current frame.
///
/// Collapsed panels come back with zero width; callers skip them.
pub fn compute_layout(frame: &Frame) -> [Rect; 4] {
    let term_width = frame.area().width;

    let [main_area, status_bar] =
        frame.area().layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]));

    let constraints = if term_width >= 120 {
        [Constraint::Percentage(22), Constraint::Percentage(48), Constraint::Percentage(30)]
    } else if term_width >= 80 {
        [Constraint::Length(0), Constraint::Percentage(60), Constraint::Percentage(40)]
    } else {
        [Constraint::Length(0), Constraint::Fill(1), Constraint::Length(0)]
    };
    let horizontal = Layout::horizontal(constraints).spacing(Spacing::Overlap(1));
    let [tree, document, thread] = main_area.layout(&horizontal);

    [tree, document, thread, status_bar]
}

/// Inner rect of a bordered panel.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin { vertical: 1, horizontal: 1 })
}

/// Bordered block for a panel: thick and accent-colored when focused.
///
/// `MergeStrategy::Fuzzy` because `Exact` draws wrong junctions where thick
/// and plain borders meet.
pub fn panel_block<'a>(title: impl Into<Line<'a>>, is_focused: bool, theme: &Theme) -> Block<'a> {
    let border_style = if is_focused {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_focused { BorderType::Thick } else { BorderType::Plain };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
        .merge_borders(MergeStrategy::Fuzzy)
}

/// Renders the 1-row status bar: mode, open file and cursor, then either the
/// latest notice or the count of open comments.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let (mode_text, mode_fg) = match state.mode {
        Mode::Select => (" SELECT ", theme.status_mode_insert),
        Mode::Prompt => (" INPUT ", theme.status_mode_insert),
        Mode::Normal | Mode::HelpOverlay | Mode::Preview | Mode::Confirm | Mode::Picker => {
            (" NORMAL ", theme.status_mode_normal)
        }
    };

    let mut spans = vec![Span::styled(
        mode_text,
        Style::default().fg(mode_fg).add_modifier(Modifier::BOLD),
    )];

    match (&state.document, &state.loading) {
        (_, Some(path)) => spans.push(Span::raw(format!(" {path} (loading) "))),
        (Some(doc), None) => {
            spans.push(Span::raw(format!(" {}:{} ", doc.rel_path, state.cursor + 1)))
        }
        (None, None) => spans.push(Span::raw(" no file ")),
    }

    match &state.notice {
        Some(notice) => {
            let color = match notice.level {
                NoticeLevel::Info => theme.notice_info,
                NoticeLevel::Warning => theme.notice_warning,
                NoticeLevel::Error => theme.notice_error,
            };
            spans.push(Span::styled(format!(" {} ", notice.message), Style::default().fg(color)));
        }
        None => {
            let open = state.tree.open_count();
            spans.push(Span::styled(
                format!(" {open} open comment{} ", if open == 1 { "" } else { "s" }),
                Style::default().fg(theme.muted),
            ));
        }
    }
    spans.push(Span::styled(" ? help ", Style::default().fg(theme.muted)));

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}
