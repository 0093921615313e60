//! Error types for the comment core.
//!
//! Persistence failures (`StoreError`) and lifecycle failures (`CommentError`)
//! are kept apart: a failed write never aborts a lifecycle operation, it is
//! reported and the in-memory store stays authoritative.

use std::path::PathBuf;

/// Failure reading or writing the JSON comment file.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed comment file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot encode comments: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Why a lifecycle operation did not take effect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommentError {
    /// A prompt, picker or confirmation was dismissed.
    #[error("cancelled")]
    Cancelled,
    /// Comment or reply text was empty after trimming.
    #[error("comment text is empty")]
    EmptyText,
    #[error("comment {0} no longer exists")]
    CommentNotFound(String),
    #[error("reply {reply} no longer exists on comment {comment}")]
    ReplyNotFound { comment: String, reply: String },
}

impl CommentError {
    /// Cancellation and empty input end an operation without telling the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, CommentError::Cancelled | CommentError::EmptyText)
    }
}

pub type Result<T, E = CommentError> = std::result::Result<T, E>;
