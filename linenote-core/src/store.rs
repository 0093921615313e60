use std::io::Write as _;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::model::CommentStore;

/// Project-relative directory holding the comment file.
pub const STORE_DIR: &str = ".linenote";

/// File name of the comment document inside [`STORE_DIR`].
pub const STORE_FILE: &str = "comments.json";

/// Reads and writes the comment store as a single pretty-printed JSON file.
///
/// Every save rewrites the whole document. There is no incremental format and
/// no locking; two processes writing the same file means last writer wins.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    /// Uses `path` as the comment file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Uses the canonical `<root>/.linenote/comments.json` location.
    pub fn for_project(root: &Path) -> Self {
        Self::new(root.join(STORE_DIR).join(STORE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the store from disk.
    ///
    /// A missing file is not an error and yields an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read and
    /// [`StoreError::Parse`] if it is not a valid comment document.
    pub fn load(&self) -> Result<CommentStore, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(CommentStore::default());
            }
            Err(source) => {
                return Err(StoreError::Io { path: self.path.clone(), source });
            }
        };
        if raw.trim().is_empty() {
            return Ok(CommentStore::default());
        }
        serde_json::from_str(&raw)
            .map_err(|source| StoreError::Parse { path: self.path.clone(), source })
    }

    /// Loads the store, degrading any failure to an empty store.
    ///
    /// The failure is logged; the caller gets a usable store either way.
    pub fn load_or_empty(&self) -> CommentStore {
        match self.load() {
            Ok(store) => {
                tracing::debug!(path = %self.path.display(), count = store.len(), "loaded comments");
                store
            }
            Err(e) => {
                tracing::warn!("{e}; starting with an empty comment store");
                CommentStore::default()
            }
        }
    }

    /// Writes the full store, creating the containing directory if needed.
    ///
    /// The document is written to a sibling temp file and renamed over the
    /// target, so an interrupted write leaves the previous file intact.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory, temp file, or rename fails.
    pub fn save(&self, store: &CommentStore) -> Result<(), StoreError> {
        let mut json = serde_json::to_string_pretty(store)?;
        json.push('\n');

        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .map_err(|source| StoreError::Io { path: dir.to_path_buf(), source })?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let io_err = |source| StoreError::Io { path: tmp.clone(), source };
        let mut file = std::fs::File::create(&tmp).map_err(io_err)?;
        file.write_all(json.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
        drop(file);

        std::fs::rename(&tmp, &self.path)
            .map_err(|source| StoreError::Io { path: self.path.clone(), source })?;
        tracing::debug!(path = %self.path.display(), count = store.len(), "saved comments");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_empty_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = JsonStore::for_project(dir.path());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn malformed_file_degrades_to_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = JsonStore::for_project(dir.path());
        std::fs::create_dir_all(dir.path().join(STORE_DIR)).unwrap();
        std::fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.load(), Err(StoreError::Parse { .. })));
        assert!(store.load_or_empty().is_empty());
    }

    #[test]
    fn save_creates_the_store_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = JsonStore::for_project(dir.path());
        store.save(&CommentStore::default()).unwrap();

        let written = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(written, "{\n  \"comments\": []\n}\n");
        assert!(!store.path().with_extension("json.tmp").exists());
    }
}
