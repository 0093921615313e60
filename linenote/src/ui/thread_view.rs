//! Right panel: every thread whose range covers the cursor line.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Paragraph, Wrap},
};

use linenote_core::export::format_timestamp;
use linenote_core::host::ThreadView;

use crate::app::{AppState, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

pub fn render_threads(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::Thread;
    let threads = state.threads_at_cursor();
    let title = match threads.len() {
        0 => "Thread".to_owned(),
        1 => "Thread (1)".to_owned(),
        n => format!("Threads ({n})"),
    };
    let block = panel_block(title, is_focused, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let text = if threads.is_empty() {
        Text::from(vec![
            Line::styled("No comments on this line.", Style::default().fg(theme.muted)),
            Line::raw(""),
            Line::styled("a  add a comment", Style::default().fg(theme.muted)),
            Line::styled("V  select lines first", Style::default().fg(theme.muted)),
        ])
    } else {
        let mut lines = Vec::new();
        for (idx, thread) in threads.iter().enumerate() {
            if idx > 0 {
                lines.push(Line::raw(""));
            }
            thread_lines(thread, theme, &mut lines);
        }
        Text::from(lines)
    };

    frame.render_widget(
        Paragraph::new(text).wrap(Wrap { trim: false }).scroll((state.thread_scroll, 0)),
        inner,
    );
}

fn thread_lines(thread: &ThreadView, theme: &Theme, out: &mut Vec<Line<'static>>) {
    let (status, color) = if thread.resolved {
        ("resolved", theme.thread_resolved)
    } else {
        ("open", theme.thread_open)
    };
    let (first, last) = (thread.range.start.display_line(), thread.range.end.display_line());
    let lines = if first == last { format!("line {first}") } else { format!("lines {first}-{last}") };
    out.push(Line::from(vec![
        Span::styled(format!("[{status}] "), Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(lines, Style::default().fg(theme.muted)),
    ]));

    for entry in &thread.entries {
        let indent = if entry.is_reply { "  ↳ " } else { "" };
        out.push(Line::from(vec![
            Span::raw(indent),
            Span::styled(entry.author.clone(), Style::default().fg(theme.author).add_modifier(Modifier::BOLD)),
            Span::styled(format!("  {}", format_timestamp(&entry.timestamp)), Style::default().fg(theme.muted)),
        ]));
        let pad = if entry.is_reply { "    " } else { "  " };
        for text_line in entry.text.lines() {
            out.push(Line::raw(format!("{pad}{text_line}")));
        }
    }
}
