//! Owned data types exchanged with the document worker thread.
//!
//! Everything here is `Send` and free of borrowed lifetimes so payloads can be
//! moved from the worker into `AppState` without copying.

use std::path::PathBuf;
use std::time::SystemTime;

use linenote_core::TextChange;
use ratatui::text::Line;

/// Work sent from the UI thread to the document worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocRequest {
    /// Read and highlight a file. Loading a file the worker has read before
    /// reports the line changes since then.
    Load {
        /// Absolute path used to read the file.
        abs_path: PathBuf,
        /// Workspace-relative path the comment store keys on.
        rel_path: String,
    },
}

/// Result of one `DocRequest::Load`.
#[derive(Debug, Clone)]
pub struct DocPayload {
    /// Workspace-relative path, as stored on comments.
    pub rel_path: String,
    /// Absolute path that was read.
    pub abs_path: PathBuf,
    /// Modification time observed when the file was read.
    pub modified: Option<SystemTime>,
    /// Syntax-highlighted lines, one per source line.
    pub lines: Vec<Line<'static>>,
    /// Line changes since the previous load of the same file.
    ///
    /// `None` when the worker reads `rel_path` for the first time.
    pub changes: Option<Vec<TextChange>>,
    /// Read failure, if any. `lines` is empty when set.
    pub error: Option<String>,
}

impl DocPayload {
    /// Returns `true` when the reload contains at least one line change.
    pub fn has_changes(&self) -> bool {
        self.changes.as_ref().is_some_and(|c| !c.is_empty())
    }
}
