//! linenote: line-anchored review comments for any file in a workspace.
//!
//! Entry point for the `linenote` binary. Wires the terminal lifecycle
//! (`tui`), the event bus (`event`), the document worker (`document`), the
//! panels (`ui`) and the comment service from `linenote-core`, which talks back
//! through `presenter::TerminalHost`.
//!
//! # Startup sequence
//!
//! 1. Parse arguments, find the workspace root, start file logging.
//! 2. `--export` prints the markdown export and exits without a terminal.
//! 3. Load config and theme, install the panic hook, register SIGTERM.
//! 4. `init_tui()`, spawn the event task and the document worker.
//! 5. Open the comment service, which renders every stored thread.
//!
//! The loop exits only via `break`, so `shutdown()` (final save) and
//! `restore_tui()` always run; the panic hook covers panics.

mod app;
mod document;
mod event;
mod presenter;
mod theme;
mod tui;
mod ui;

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use linenote_core::config::{discover_root, normalize_path, Config};
use linenote_core::store::STORE_DIR;
use linenote_core::{CommentService, JsonStore};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::app::AppState;
use crate::event::AppEvent;
use crate::presenter::TerminalHost;
use crate::ui::keybindings::{self, KeyAction};

#[derive(Debug, Parser)]
#[command(name = "linenote", version, about = "Line-anchored review comments for any file")]
struct Args {
    /// File to open, relative to the current directory.
    file: Option<PathBuf>,

    /// Workspace root holding `.linenote/` (defaults to the enclosing git work tree).
    #[arg(long)]
    root: Option<PathBuf>,

    /// Print every comment as markdown on stdout and exit.
    #[arg(long)]
    export: bool,
}

/// Installs file logging under `<root>/.linenote/linenote.log`.
///
/// The TUI owns the terminal, so nothing is logged to it. Returns `None` when
/// the log directory cannot be created; the app then runs without logs.
fn init_logging(root: &Path) -> Option<WorkerGuard> {
    let log_dir = root.join(STORE_DIR);
    std::fs::create_dir_all(&log_dir).ok()?;
    let file_appender = tracing_appender::rolling::never(&log_dir, "linenote.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("LINENOTE_LOG").unwrap_or_else(|_| {
            "linenote=info,linenote_core=info,warn".into()
        }))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();
    Some(guard)
}

/// Workspace-relative path of the file given on the command line.
fn initial_document(args: &Args, root: &Path) -> std::io::Result<Option<String>> {
    let Some(file) = &args.file else {
        return Ok(None);
    };
    let absolute = std::env::current_dir()?.join(file);
    let absolute = absolute.canonicalize().unwrap_or(absolute);
    Ok(Some(normalize_path(root, &absolute)))
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    let cwd = std::env::current_dir()?;
    let root = match &args.root {
        Some(root) => root.canonicalize()?,
        None => discover_root(&cwd),
    };

    if args.export {
        let store = JsonStore::for_project(&root).load_or_empty();
        match linenote_core::export::render_markdown(&store) {
            Some(markdown) => print!("{markdown}"),
            None => eprintln!("linenote: no comments to export"),
        }
        return Ok(());
    }

    let _log_guard = init_logging(&root);
    tracing::info!(root = %root.display(), "starting linenote");

    let config = Config::load();
    let theme = theme::Theme::from_name(config.theme_name());
    let first_doc = initial_document(&args, &root)?;

    tui::install_panic_hook();
    let term_flag = tui::register_sigterm()?;
    let terminal = tui::init_tui()?;

    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());

    let (doc_tx, doc_rx) = crossbeam_channel::unbounded();
    let worker_tx = handler.tx.clone();
    std::thread::spawn(move || document::worker::document_worker_loop(doc_rx, worker_tx));

    let state = AppState::new(root.clone());
    let mut host = TerminalHost::new(terminal, handler.rx, state, theme, doc_tx, term_flag);
    let mut service = CommentService::open(JsonStore::for_project(&root), Box::new(config), &mut host);

    let first_doc =
        first_doc.or_else(|| host.state.tree.files.first().map(|f| f.file_path.clone()));
    if let Some(rel_path) = first_doc {
        host.open_document(&rel_path);
    }

    let mut draw_result = Ok(());
    'event_loop: loop {
        // Loads that arrived while a prompt owned the channel.
        for payload in std::mem::take(&mut host.state.deferred) {
            apply_loaded(&mut service, &mut host, *payload);
        }
        if host.should_quit() {
            break 'event_loop;
        }

        tokio::select! {
            // Heartbeat so SIGTERM is seen even when no events arrive.
            _ = tokio::time::sleep(Duration::from_millis(50)) => {}
            _ = service.save_due() => {
                service.flush_if_due(&mut host);
            }
            maybe_event = host.rx.recv() => {
                match maybe_event {
                    Some(AppEvent::Render) => {
                        if let Err(e) = host.draw() {
                            draw_result = Err(e);
                            break 'event_loop;
                        }
                    }
                    Some(AppEvent::Key(key)) => match keybindings::handle_key(key, &mut host.state) {
                        KeyAction::Continue => {}
                        KeyAction::Quit => break 'event_loop,
                        KeyAction::Run(command) => {
                            let _ = service.run(&mut host, command).await;
                        }
                    },
                    Some(AppEvent::Mouse(mouse)) => keybindings::handle_mouse(mouse, &mut host.state),
                    Some(AppEvent::Tick) => {
                        if host.state.document_is_stale() {
                            if let Some(rel_path) = host.state.doc_path().map(str::to_owned) {
                                host.open_document(&rel_path);
                            }
                        }
                    }
                    Some(AppEvent::DocLoaded(payload)) => apply_loaded(&mut service, &mut host, *payload),
                    Some(AppEvent::Resize(_, _)) => {}
                    Some(AppEvent::Quit) | None => break 'event_loop,
                }
            }
        }
    }

    service.shutdown(&mut host);
    tracing::info!("linenote stopped");

    tui::restore_tui()?;
    draw_result
}

/// Feeds a loaded document to the service and the view.
///
/// A file the worker has read before carries the line changes since then;
/// those move the file's comment anchors before the new text is shown.
fn apply_loaded(
    service: &mut CommentService<TerminalHost>,
    host: &mut TerminalHost,
    payload: document::types::DocPayload,
) {
    if payload.has_changes() {
        let changes = payload.changes.as_deref().unwrap_or_default();
        let moved = service.apply_edits(host, &payload.rel_path, changes);
        tracing::debug!(moved = moved.len(), file = %payload.rel_path, "document changed on disk");
    }
    host.state.apply_document(payload);
}
