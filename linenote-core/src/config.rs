//! User configuration and project location.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::host::Settings;

/// Theme used when the config names none.
pub const DEFAULT_THEME: &str = "catppuccin-mocha";

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub default_author: Option<String>,
    pub theme: Option<String>,
}

impl Config {
    /// Returns the path to the linenote config file.
    ///
    /// Prefers `$XDG_CONFIG_HOME/linenote/config.toml`; falls back to
    /// `~/.config/linenote/config.toml` when the env var is absent.
    pub fn path() -> PathBuf {
        let base = std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
            .unwrap_or_else(|| PathBuf::from(".config"));
        base.join("linenote").join("config.toml")
    }

    /// Parses config text.
    ///
    /// # Errors
    ///
    /// Returns the `toml` error for malformed input or wrongly typed keys.
    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Loads `path`, falling back to defaults.
    ///
    /// A missing file is silent; a malformed one is logged. Config problems
    /// never prevent startup.
    pub fn load_from(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(_) => return Self::default(),
        };
        match Self::parse(&raw) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("config parse error in {}: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    pub fn theme_name(&self) -> &str {
        self.theme.as_deref().unwrap_or(DEFAULT_THEME)
    }
}

impl Settings for Config {
    fn default_author(&self) -> Option<String> {
        self.default_author.clone()
    }
}

/// Finds the project root for `start`: the enclosing git work tree, or
/// `start` itself outside a repository.
pub fn discover_root(start: &Path) -> PathBuf {
    match git2::Repository::discover(start) {
        Ok(repo) => match repo.workdir() {
            Some(dir) => dir.to_path_buf(),
            None => start.to_path_buf(),
        },
        Err(_) => start.to_path_buf(),
    }
}

/// Normalizes a document path into the portable form stored in comments.
///
/// Absolute paths under `root` become root-relative. Separators become `/`
/// and a leading `./` is dropped. Paths outside `root` keep their full form.
pub fn normalize_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let text = relative.to_string_lossy().replace('\\', "/");
    let mut text = text.as_str();
    while let Some(rest) = text.strip_prefix("./") {
        text = rest;
    }
    text.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_keys() {
        let cfg = Config::parse("default_author = \"Ana\"\ntheme = \"dark\"\n").unwrap();
        assert_eq!(cfg.default_author.as_deref(), Some("Ana"));
        assert_eq!(cfg.theme_name(), "dark");
    }

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = Config::parse("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.theme_name(), DEFAULT_THEME);
        assert_eq!(cfg.default_author(), None);
    }

    #[test]
    fn malformed_file_falls_back() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_author = [").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
        assert_eq!(Config::load_from(&dir.path().join("missing.toml")), Config::default());
    }

    #[test]
    fn normalizes_paths_relative_to_root() {
        let root = Path::new("/work/proj");
        assert_eq!(normalize_path(root, Path::new("/work/proj/src/main.rs")), "src/main.rs");
        assert_eq!(normalize_path(root, Path::new("./src/lib.rs")), "src/lib.rs");
        assert_eq!(normalize_path(root, Path::new("src\\win\\mod.rs")), "src/win/mod.rs");
    }

    #[test]
    fn root_is_the_enclosing_work_tree() {
        let dir = tempfile::TempDir::new().unwrap();
        let inner = dir.path().join("nested");
        std::fs::create_dir_all(&inner).unwrap();
        let repo = git2::Repository::init(dir.path()).unwrap();
        let root = discover_root(&inner);
        assert_eq!(
            root.canonicalize().unwrap(),
            repo.workdir().unwrap().canonicalize().unwrap()
        );
    }
}
