//! Help overlay listing every keybinding.
//!
//! Drawn over the panels with `Clear` first, inside the same draw call.

use ratatui::{
    Frame,
    layout::Constraint,
    style::Style,
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::theme::Theme;

/// Renders the help overlay. Skipped below 60 columns, where the centered
/// area would collapse.
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 60 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));
    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help  (j/k scroll, ? or Esc to dismiss) ")
        .border_style(Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(build_help_text())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

fn build_help_text() -> Text<'static> {
    Text::from(vec![
        Line::from("Navigation"),
        Line::from("  j / k         Move down / up"),
        Line::from("  g / G         Jump to top / bottom"),
        Line::from("  Ctrl-d / u    Half page down / up"),
        Line::from("  Ctrl-f / b    Full page down / up"),
        Line::from("  [ / ]         Previous / next comment in this file"),
        Line::from("  H / L         Move panel focus left / right"),
        Line::from("  Enter         Open the selected comment (tree)"),
        Line::from(""),
        Line::from("Comments"),
        Line::from("  V             Start / drop a line selection"),
        Line::from("  a             Comment on the cursor line or selection"),
        Line::from("  Enter         Write into the thread here (thread panel)"),
        Line::from("  r             Reply to the thread here"),
        Line::from("  x             Resolve / reopen the thread here"),
        Line::from("  d             Delete the thread here"),
        Line::from("  D             Delete one reply"),
        Line::from("  c             List the comments in this file"),
        Line::from("  e             Export all comments as markdown"),
        Line::from(""),
        Line::from("  With no thread under the cursor, r / x / d / D ask"),
        Line::from("  which comment to act on."),
        Line::from(""),
        Line::from("General"),
        Line::from("  ?             Open / close this help"),
        Line::from("  q / Esc       Quit (pending changes are saved)"),
    ])
}
