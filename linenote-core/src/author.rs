//! Author name resolution.

use crate::error::{CommentError, Result};
use crate::host::{Presenter, PromptRequest, Settings};

/// Name offered as the prompt's pre-filled value when nothing is configured.
///
/// Tries git's `user.name`, then `$USER`, then `$USERNAME`.
pub fn fallback_author() -> Option<String> {
    let from_git = git2::Config::open_default()
        .and_then(|cfg| cfg.get_string("user.name"))
        .ok();
    from_git
        .into_iter()
        .chain(std::env::var("USER").ok())
        .chain(std::env::var("USERNAME").ok())
        .map(|name| name.trim().to_owned())
        .find(|name| !name.is_empty())
}

/// Resolves the author for a new comment or reply.
///
/// A configured default wins if it is non-empty after trimming. Otherwise the
/// user is prompted with `fallback` pre-filled.
///
/// # Errors
///
/// Returns [`CommentError::Cancelled`] if the prompt is dismissed or submitted
/// empty. This is the only way resolution fails.
pub async fn resolve_author<P: Presenter>(
    settings: &dyn Settings,
    host: &mut P,
    fallback: Option<&str>,
) -> Result<String> {
    if let Some(name) = settings.default_author() {
        let name = name.trim();
        if !name.is_empty() {
            return Ok(name.to_owned());
        }
    }

    let request = PromptRequest::new("Your name for comments")
        .placeholder("Author name")
        .value(fallback.unwrap_or_default());
    match host.prompt(request).await {
        Some(name) if !name.trim().is_empty() => Ok(name.trim().to_owned()),
        _ => Err(CommentError::Cancelled),
    }
}
