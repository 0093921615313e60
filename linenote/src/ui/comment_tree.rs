//! Left panel: open comments grouped by file.
//!
//! Every list item is one comment. The first comment of each file carries a
//! header line with the path, so the selection index maps straight onto
//! `AppState::tree_entries`.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{List, ListItem},
};

use linenote_core::host::TreeEntry;

use crate::app::{AppState, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::panel_block;

pub fn render_comment_tree(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::Tree;
    let open = state.tree.open_count();
    let title = if open > 0 { format!("Comments ({open})") } else { "Comments".to_owned() };
    let block = panel_block(title, is_focused, theme);

    let items: Vec<ListItem> = if state.tree.is_empty() {
        vec![ListItem::new(Line::styled("No open comments", Style::default().fg(theme.muted)))]
    } else {
        state
            .tree
            .files
            .iter()
            .flat_map(|file| {
                file.entries.iter().enumerate().map(move |(idx, entry)| {
                    let header = (idx == 0).then_some(file.file_path.as_str());
                    tree_item(header, entry, theme)
                })
            })
            .collect()
    };

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(theme.border_active).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut state.tree_state);
}

/// `L12 ana: first line of the comment (+2)`, under an optional file header.
fn tree_item(header: Option<&str>, entry: &TreeEntry, theme: &Theme) -> ListItem<'static> {
    let mut lines = Vec::with_capacity(2);
    if let Some(path) = header {
        lines.push(Line::styled(
            path.to_owned(),
            Style::default().fg(theme.thread_open).add_modifier(Modifier::BOLD),
        ));
    }
    let mut spans = vec![
        Span::styled(format!("L{} ", u64::from(entry.line) + 1), Style::default().fg(theme.gutter)),
        Span::styled(format!("{}: ", entry.author), Style::default().fg(theme.author)),
        Span::raw(entry.preview.clone()),
    ];
    if entry.reply_count > 0 {
        spans.push(Span::styled(format!(" (+{})", entry.reply_count), Style::default().fg(theme.muted)));
    }
    lines.push(Line::from(spans));
    ListItem::new(Text::from(lines))
}
