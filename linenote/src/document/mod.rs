//! Document loading and edit tracking for the centre panel.
//!
//! `worker` owns the syntect state on a background thread, `types` holds the
//! owned request and result values that cross the channel, and `edits` turns
//! two versions of a file into the line changes the reconciler consumes.

pub mod edits;
pub mod types;
pub mod worker;
