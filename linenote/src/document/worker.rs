//! Background thread that reads and highlights documents.
//!
//! Syntect's `SyntaxSet` and `ThemeSet` are loaded once and reused for every
//! request. The worker remembers the last text it read for every file, so a
//! reload can report which lines moved since the file was last seen.
//! Requests arrive over a crossbeam channel; results go back as
//! `AppEvent::DocLoaded`.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use crossbeam_channel::Receiver;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use tokio::sync::mpsc::UnboundedSender;

use crate::document::edits::changes_between;
use crate::document::types::{DocPayload, DocRequest};
use crate::event::AppEvent;

static PS: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static TS: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

/// Last text read for each workspace-relative path.
type Seen = HashMap<String, String>;

/// Entry point for the document worker thread.
///
/// Loops until every sender is dropped. Each request produces exactly one
/// `AppEvent::DocLoaded`, including failed reads.
pub fn document_worker_loop(rx: Receiver<DocRequest>, event_tx: UnboundedSender<AppEvent>) {
    let _ = &*PS;
    let _ = &*TS;

    let mut seen = Seen::new();
    for request in rx {
        let payload = handle_request(request, &mut seen);
        if event_tx.send(AppEvent::DocLoaded(Box::new(payload))).is_err() {
            break;
        }
    }
}

fn handle_request(request: DocRequest, seen: &mut Seen) -> DocPayload {
    let DocRequest::Load { abs_path, rel_path } = request;
    let modified = std::fs::metadata(&abs_path).and_then(|m| m.modified()).ok();

    let text = match std::fs::read(&abs_path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => {
            tracing::warn!(path = %abs_path.display(), error = %e, "could not read document");
            return DocPayload {
                rel_path,
                abs_path,
                modified,
                lines: Vec::new(),
                changes: None,
                error: Some(e.to_string()),
            };
        }
    };

    let changes = seen.get(&rel_path).map(|prev| changes_between(prev, &text));
    let lines = highlight_document(&text, &rel_path);
    seen.insert(rel_path.clone(), text);

    DocPayload { rel_path, abs_path, modified, lines, changes, error: None }
}

/// Converts a syntect (Style, &str) pair to an owned ratatui Span.
///
/// Background colors are dropped so the cursor and selection highlights drawn
/// by the document view stay visible.
fn syntect_to_span(style: syntect::highlighting::Style, content: &str) -> Span<'static> {
    use syntect::highlighting::FontStyle;
    let mut ratatui_style = Style::default();
    if style.foreground.a > 0 {
        let c = style.foreground;
        ratatui_style = ratatui_style.fg(Color::Rgb(c.r, c.g, c.b));
    }
    if style.font_style.contains(FontStyle::BOLD) {
        ratatui_style = ratatui_style.add_modifier(Modifier::BOLD);
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        ratatui_style = ratatui_style.add_modifier(Modifier::ITALIC);
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        ratatui_style = ratatui_style.add_modifier(Modifier::UNDERLINED);
    }
    Span::styled(content.trim_end_matches(['\n', '\r']).to_owned(), ratatui_style)
}

/// Highlights every line of `text`, picking the syntax from `rel_path`'s
/// extension. Unknown extensions and missing themes fall back to plain text.
pub fn highlight_document(text: &str, rel_path: &str) -> Vec<Line<'static>> {
    let syntax = Path::new(rel_path)
        .extension()
        .and_then(|e| e.to_str())
        .and_then(|ext| PS.find_syntax_by_extension(ext))
        .unwrap_or_else(|| PS.find_syntax_plain_text());
    let theme = TS.themes.get("base16-ocean.dark").or_else(|| TS.themes.values().next());

    let Some(theme) = theme else {
        return text.lines().map(|l| Line::raw(l.to_owned())).collect();
    };

    let mut h = HighlightLines::new(syntax, theme);
    syntect::util::LinesWithEndings::from(text)
        .map(|line| match h.highlight_line(line, &PS) {
            Ok(ranges) => Line::from(
                ranges
                    .into_iter()
                    .map(|(style, part)| syntect_to_span(style, part))
                    .collect::<Vec<_>>(),
            ),
            Err(_) => Line::raw(line.trim_end_matches(['\n', '\r']).to_owned()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn plain(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn highlights_one_line_per_source_line() {
        let lines = highlight_document("fn main() {\n    println!(\"hi\");\n}\n", "main.rs");
        assert_eq!(lines.len(), 3);
        assert_eq!(plain(&lines[1]), "    println!(\"hi\");");
    }

    #[test]
    fn reload_of_same_file_reports_changes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "a\nb\n").unwrap();
        let request = || DocRequest::Load { abs_path: file.clone(), rel_path: "notes.txt".into() };

        let mut seen = Seen::new();
        let first = handle_request(request(), &mut seen);
        assert!(first.changes.is_none());
        assert_eq!(first.lines.len(), 2);

        std::fs::write(&file, "top\na\nb\n").unwrap();
        let second = handle_request(request(), &mut seen);
        assert!(second.has_changes());
        assert_eq!(second.lines.len(), 3);
    }

    #[test]
    fn missing_file_reports_error() {
        let mut seen = Seen::new();
        let payload = handle_request(
            DocRequest::Load { abs_path: PathBuf::from("/no/such/file.rs"), rel_path: "file.rs".into() },
            &mut seen,
        );
        assert!(payload.error.is_some());
        assert!(payload.lines.is_empty());
        assert!(seen.is_empty());
    }
}
