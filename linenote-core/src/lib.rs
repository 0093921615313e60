//! linenote-core: line-anchored comment threads stored as JSON.
//!
//! The crate owns the comment store, its on-disk format, the reconciliation
//! of anchors after edits, and the thread lifecycle. Rendering and user
//! input are delegated to a host through [`host::Presenter`].

pub mod author;
pub mod config;
pub mod debounce;
pub mod error;
pub mod export;
pub mod host;
pub mod model;
pub mod reconcile;
pub mod service;
pub mod store;

pub use error::{CommentError, StoreError};
pub use model::{Comment, CommentStore, Position, Range, Reply};
pub use reconcile::TextChange;
pub use service::{Command, CommentService, Submission, ThreadTarget};
pub use store::JsonStore;
