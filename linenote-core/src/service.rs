//! Comment thread lifecycle.
//!
//! [`CommentService`] owns the in-memory store, the persistence adapter, the
//! map from comment id to live thread handle, and the save debouncer. It is
//! built once at startup with [`CommentService::open`] and torn down with
//! [`CommentService::shutdown`]; every operation borrows the host presenter
//! for its duration instead of reaching for shared state.
//!
//! User-initiated mutations persist synchronously. Anchor moves caused by
//! edits only signal the debouncer, so a burst of keystrokes costs one write.

use std::collections::HashMap;

use chrono::Utc;
use crate::author;
use crate::debounce::Debouncer;
use crate::error::{CommentError, Result};
use crate::export;
use crate::host::{
    CommentTree, ConfirmRequest, Notice, PickItem, Presenter, PromptRequest, Settings,
    ThreadView, TreeEntry, TreeFile,
};
use crate::model::{Comment, CommentStore, Range, Reply};
use crate::reconcile::{self, TextChange};
use crate::store::JsonStore;

/// Longest comment preview shown in pickers and the tree.
const PREVIEW_CHARS: usize = 48;

/// Commands a host can trigger. `None` arguments are asked for with a picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddComment { file_path: String, range: Range },
    ViewFileComments { file_path: String },
    DeleteComment { comment_id: Option<String> },
    DeleteReply { comment_id: Option<String>, reply_id: Option<String> },
    Reply { comment_id: Option<String> },
    ToggleResolved { comment_id: Option<String>, resolved: Option<bool> },
    Navigate { comment_id: String },
    /// Text typed into the thread panel: a reply when the thread has entries,
    /// a new thread otherwise.
    Compose { target: ThreadTarget },
    Export,
}

/// Where an inline thread submission was typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadTarget {
    pub file_path: String,
    pub range: Range,
    /// The comment backing the thread, once it has one.
    pub comment_id: Option<String>,
    /// Number of entries currently shown in the thread.
    pub entry_count: usize,
}

impl ThreadTarget {
    /// A target with no entries starts a thread; anything else is a reply.
    pub fn starts_thread(&self) -> bool {
        self.comment_id.is_none() || self.entry_count == 0
    }
}

/// What a thread submission means, decided up front rather than by the
/// shape of the callback payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    NewThread { file_path: String, range: Range, text: String },
    AppendReply { comment_id: String, text: String },
}

impl Submission {
    pub fn classify(target: ThreadTarget, text: impl Into<String>) -> Self {
        let text = text.into();
        match target.comment_id {
            Some(comment_id) if !target.starts_thread() => Submission::AppendReply { comment_id, text },
            _ => Submission::NewThread { file_path: target.file_path, range: target.range, text },
        }
    }
}

pub struct CommentService<P: Presenter> {
    store: CommentStore,
    persistence: JsonStore,
    settings: Box<dyn Settings>,
    fallback_author: Option<String>,
    threads: HashMap<String, P::Handle>,
    debouncer: Debouncer,
}

impl<P: Presenter> CommentService<P> {
    /// Loads the store and renders every stored thread.
    ///
    /// A store that cannot be read starts empty; the failure is reported
    /// through `host` and logged.
    pub fn open(persistence: JsonStore, settings: Box<dyn Settings>, host: &mut P) -> Self {
        let store = match persistence.load() {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!("{e}; starting with an empty comment store");
                host.notify(Notice::error(format!("Could not read comments: {e}")));
                CommentStore::default()
            }
        };
        tracing::info!(path = %persistence.path().display(), count = store.len(), "comment store opened");

        let mut service = Self {
            store,
            persistence,
            settings,
            fallback_author: author::fallback_author(),
            threads: HashMap::new(),
            debouncer: Debouncer::default(),
        };
        let ids: Vec<String> = service.store.comments.iter().map(|c| c.id.clone()).collect();
        for id in &ids {
            service.render_thread(host, id);
        }
        service.refresh_tree(host);
        service
    }

    /// Overrides the name pre-filled in the author prompt.
    pub fn set_fallback_author(&mut self, name: Option<String>) {
        self.fallback_author = name;
    }

    pub fn store(&self) -> &CommentStore {
        &self.store
    }

    pub fn comment(&self, id: &str) -> Option<&Comment> {
        self.store.get(id)
    }

    /// Number of live thread handles; equals the comment count outside of
    /// an operation.
    pub fn live_threads(&self) -> usize {
        self.threads.len()
    }

    // -----------------------------------------------------------------------
    // Lifecycle operations
    // -----------------------------------------------------------------------

    /// Creates a new unresolved thread and persists it.
    ///
    /// # Errors
    ///
    /// [`CommentError::EmptyText`] if `text` is blank. Non-blank text is
    /// stored as entered, indentation included.
    pub fn create(
        &mut self,
        host: &mut P,
        author: &str,
        text: &str,
        file_path: &str,
        range: Range,
    ) -> Result<Comment> {
        require_text(text)?;
        let comment = Comment {
            id: self.store.next_comment_id(),
            author: author.to_owned(),
            timestamp: Utc::now(),
            text: text.to_owned(),
            file_path: file_path.to_owned(),
            range,
            replies: Vec::new(),
            resolved: false,
        };
        tracing::info!(id = %comment.id, file = %comment.file_path, line = range.start.line, "comment created");
        self.store.comments.push(comment.clone());
        self.persist(host);
        self.render_thread(host, &comment.id);
        self.refresh_tree(host);
        Ok(comment)
    }

    /// Appends a reply to an existing thread and persists it.
    ///
    /// # Errors
    ///
    /// [`CommentError::EmptyText`] for blank text and
    /// [`CommentError::CommentNotFound`] if the thread is gone.
    pub fn reply(&mut self, host: &mut P, comment_id: &str, author: &str, text: &str) -> Result<Reply> {
        require_text(text)?;
        let comment = self
            .store
            .get_mut(comment_id)
            .ok_or_else(|| CommentError::CommentNotFound(comment_id.to_owned()))?;
        let now = Utc::now();
        let reply = Reply {
            id: comment.next_reply_id(now),
            author: author.to_owned(),
            timestamp: now,
            text: text.to_owned(),
        };
        comment.replies.push(reply.clone());
        tracing::info!(comment = %comment_id, reply = %reply.id, "reply added");
        self.persist(host);
        self.render_thread(host, comment_id);
        self.refresh_tree(host);
        Ok(reply)
    }

    /// Sets `resolved`, or toggles it when `target` is `None`. Returns the new value.
    ///
    /// # Errors
    ///
    /// [`CommentError::CommentNotFound`] if the id is unknown.
    pub fn set_resolved(&mut self, host: &mut P, comment_id: &str, target: Option<bool>) -> Result<bool> {
        let comment = self
            .store
            .get_mut(comment_id)
            .ok_or_else(|| CommentError::CommentNotFound(comment_id.to_owned()))?;
        comment.resolved = target.unwrap_or(!comment.resolved);
        let resolved = comment.resolved;
        tracing::info!(id = %comment_id, resolved, "resolution changed");
        self.persist(host);
        self.render_thread(host, comment_id);
        self.refresh_tree(host);
        Ok(resolved)
    }

    /// Deletes a thread and all of its replies after a destructive confirmation.
    ///
    /// # Errors
    ///
    /// [`CommentError::CommentNotFound`] if the id is unknown and
    /// [`CommentError::Cancelled`] if the user declines; neither changes state.
    pub async fn delete_thread(&mut self, host: &mut P, comment_id: &str) -> Result<Comment> {
        let comment = self
            .store
            .get(comment_id)
            .ok_or_else(|| CommentError::CommentNotFound(comment_id.to_owned()))?;
        let message = match comment.replies.len() {
            0 => format!("Delete the comment on line {}?", comment.range.start.display_line()),
            n => format!(
                "Delete the comment on line {} and its {n} repl{}?",
                comment.range.start.display_line(),
                if n == 1 { "y" } else { "ies" },
            ),
        };
        if !host.confirm(destructive(message)).await {
            return Err(CommentError::Cancelled);
        }

        let removed = self
            .store
            .remove(comment_id)
            .ok_or_else(|| CommentError::CommentNotFound(comment_id.to_owned()))?;
        if let Some(handle) = self.threads.remove(comment_id) {
            host.dispose_thread(handle);
        }
        tracing::info!(id = %comment_id, replies = removed.replies.len(), "thread deleted");
        self.persist(host);
        self.refresh_tree(host);
        host.notify(Notice::info("Comment deleted"));
        Ok(removed)
    }

    /// Deletes a single reply after a destructive confirmation.
    ///
    /// # Errors
    ///
    /// [`CommentError::CommentNotFound`] / [`CommentError::ReplyNotFound`] if
    /// either id is unknown, [`CommentError::Cancelled`] if the user declines.
    pub async fn delete_reply(&mut self, host: &mut P, comment_id: &str, reply_id: &str) -> Result<Reply> {
        let comment = self
            .store
            .get(comment_id)
            .ok_or_else(|| CommentError::CommentNotFound(comment_id.to_owned()))?;
        let reply = comment.reply(reply_id).ok_or_else(|| CommentError::ReplyNotFound {
            comment: comment_id.to_owned(),
            reply: reply_id.to_owned(),
        })?;
        let message = format!("Delete the reply by {}?", reply.author);
        if !host.confirm(destructive(message)).await {
            return Err(CommentError::Cancelled);
        }

        let comment = self
            .store
            .get_mut(comment_id)
            .ok_or_else(|| CommentError::CommentNotFound(comment_id.to_owned()))?;
        let idx = comment.replies.iter().position(|r| r.id == reply_id).ok_or_else(|| {
            CommentError::ReplyNotFound { comment: comment_id.to_owned(), reply: reply_id.to_owned() }
        })?;
        let removed = comment.replies.remove(idx);
        tracing::info!(comment = %comment_id, reply = %reply_id, "reply deleted");
        self.persist(host);
        self.render_thread(host, comment_id);
        self.refresh_tree(host);
        host.notify(Notice::info("Reply deleted"));
        Ok(removed)
    }

    /// Hands the Markdown export to the host. Returns `false` when there is
    /// nothing to export; the store is never modified.
    pub fn export(&self, host: &mut P) -> bool {
        match export::render_markdown(&self.store) {
            Some(markdown) => {
                host.export(&markdown);
                host.notify(Notice::info(format!(
                    "Exported {} comment(s) to the clipboard",
                    self.store.len()
                )));
                true
            }
            None => {
                host.notify(Notice::info("No comments to export"));
                false
            }
        }
    }

    /// Handles text typed into an inline thread.
    ///
    /// # Errors
    ///
    /// Whatever the underlying create or reply returns, plus
    /// [`CommentError::Cancelled`] if no author could be resolved.
    pub async fn submit(&mut self, host: &mut P, submission: Submission) -> Result<()> {
        match submission {
            Submission::NewThread { file_path, range, text } => {
                require_text(&text)?;
                let author = self.resolve_author(host).await?;
                self.create(host, &author, &text, &file_path, range).map(drop)
            }
            Submission::AppendReply { comment_id, text } => {
                require_text(&text)?;
                if !self.store.contains(&comment_id) {
                    return Err(CommentError::CommentNotFound(comment_id));
                }
                let author = self.resolve_author(host).await?;
                self.reply(host, &comment_id, &author, &text).map(drop)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Edits and persistence scheduling
    // -----------------------------------------------------------------------

    /// Moves anchors in `file_path` to follow an edit and schedules a save.
    ///
    /// Moved threads are rebuilt at their new range. Returns the moved ids.
    pub fn apply_edits(&mut self, host: &mut P, file_path: &str, changes: &[TextChange]) -> Vec<String> {
        let moved = reconcile::reconcile(&mut self.store, file_path, changes);
        if moved.is_empty() {
            return moved;
        }
        tracing::debug!(file = %file_path, moved = moved.len(), "anchors reconciled");
        for id in &moved {
            self.render_thread(host, id);
        }
        self.refresh_tree(host);
        self.debouncer.signal();
        moved
    }

    /// Completes once a pending debounced save is due. Never completes while
    /// nothing is pending, so it can sit in a `select!` next to other events.
    pub async fn save_due(&self) {
        self.debouncer.wait().await
    }

    /// Writes the store if a debounced save is due. Returns whether it wrote.
    pub fn flush_if_due(&mut self, host: &mut P) -> bool {
        if !self.debouncer.take_due() {
            return false;
        }
        self.persist(host);
        true
    }

    /// Final flush of any pending save, then disposes every live thread.
    pub fn shutdown(mut self, host: &mut P) {
        if self.debouncer.take_pending() {
            self.persist(host);
        }
        for (_, handle) in self.threads.drain() {
            host.dispose_thread(handle);
        }
        tracing::info!("comment service shut down");
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Runs a host command and reports failures the user should see.
    ///
    /// Cancellation and empty input are silent. A reply to a thread that has
    /// disappeared is silent too; other missing targets show a warning.
    pub async fn run(&mut self, host: &mut P, command: Command) -> Result<()> {
        let silent_not_found = match &command {
            Command::Reply { .. } => true,
            Command::Compose { target } => !target.starts_thread(),
            _ => false,
        };
        let result = self.dispatch(host, command).await;
        if let Err(e) = &result {
            let not_found = matches!(e, CommentError::CommentNotFound(_) | CommentError::ReplyNotFound { .. });
            if e.is_silent() || (silent_not_found && not_found) {
                tracing::debug!("command ended without effect: {e}");
            } else {
                tracing::warn!("command failed: {e}");
                host.notify(Notice::warning(capitalize(&e.to_string())));
            }
        }
        result
    }

    async fn dispatch(&mut self, host: &mut P, command: Command) -> Result<()> {
        match command {
            Command::AddComment { file_path, range } => {
                let text = host
                    .prompt(PromptRequest::new("New comment").placeholder("Type your comment"))
                    .await
                    .ok_or(CommentError::Cancelled)?;
                require_text(&text)?;
                let author = self.resolve_author(host).await?;
                self.create(host, &author, &text, &file_path, range)?;
                host.notify(Notice::info("Comment added"));
                Ok(())
            }
            Command::ViewFileComments { file_path } => {
                let mut comments: Vec<&Comment> = self.store.in_file(&file_path).collect();
                if comments.is_empty() {
                    host.notify(Notice::info("No comments in this file"));
                    return Ok(());
                }
                comments.sort_by_key(|c| c.range.start.line);
                let items: Vec<PickItem> = comments.iter().map(|c| comment_item(c)).collect();
                let targets: Vec<(String, Range)> =
                    comments.iter().map(|c| (c.file_path.clone(), c.range)).collect();
                let idx = host.pick("Comments in this file", &items).await.ok_or(CommentError::Cancelled)?;
                let (file, range) = targets.get(idx).ok_or(CommentError::Cancelled)?;
                host.reveal(file, *range);
                Ok(())
            }
            Command::DeleteComment { comment_id } => {
                let id = match comment_id {
                    Some(id) => id,
                    None => self.pick_comment(host, "Delete which comment?", |_| true).await?,
                };
                self.delete_thread(host, &id).await.map(drop)
            }
            Command::DeleteReply { comment_id, reply_id } => {
                let comment_id = match comment_id {
                    Some(id) => id,
                    None => {
                        self.pick_comment(host, "Delete a reply from which thread?", |c| !c.replies.is_empty())
                            .await?
                    }
                };
                let reply_id = match reply_id {
                    Some(id) => id,
                    None => self.pick_reply(host, &comment_id).await?,
                };
                self.delete_reply(host, &comment_id, &reply_id).await.map(drop)
            }
            Command::Reply { comment_id } => {
                let comment_id = match comment_id {
                    Some(id) => id,
                    None => self.pick_comment(host, "Reply to which comment?", |_| true).await?,
                };
                if !self.store.contains(&comment_id) {
                    return Err(CommentError::CommentNotFound(comment_id));
                }
                let text = host
                    .prompt(PromptRequest::new("Reply").placeholder("Type your reply"))
                    .await
                    .ok_or(CommentError::Cancelled)?;
                self.submit(host, Submission::AppendReply { comment_id, text }).await
            }
            Command::ToggleResolved { comment_id, resolved } => {
                let comment_id = match comment_id {
                    Some(id) => id,
                    None => self.pick_comment(host, "Resolve which comment?", |_| true).await?,
                };
                let resolved = self.set_resolved(host, &comment_id, resolved)?;
                host.notify(Notice::info(if resolved { "Comment resolved" } else { "Comment reopened" }));
                Ok(())
            }
            Command::Navigate { comment_id } => {
                let comment = self
                    .store
                    .get(&comment_id)
                    .ok_or_else(|| CommentError::CommentNotFound(comment_id.clone()))?;
                host.reveal(&comment.file_path, comment.range);
                Ok(())
            }
            Command::Compose { target } => {
                let request = if target.starts_thread() {
                    PromptRequest::new("New comment").placeholder("Type your comment")
                } else {
                    PromptRequest::new("Reply").placeholder("Type your reply")
                };
                let text = host.prompt(request).await.ok_or(CommentError::Cancelled)?;
                let new_thread = target.starts_thread();
                self.submit(host, Submission::classify(target, text)).await?;
                if new_thread {
                    host.notify(Notice::info("Comment added"));
                }
                Ok(())
            }
            Command::Export => {
                self.export(host);
                Ok(())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn resolve_author(&self, host: &mut P) -> Result<String> {
        author::resolve_author(self.settings.as_ref(), host, self.fallback_author.as_deref()).await
    }

    async fn pick_comment(
        &self,
        host: &mut P,
        title: &str,
        filter: impl Fn(&Comment) -> bool,
    ) -> Result<String> {
        let candidates: Vec<&Comment> = self.store.comments.iter().filter(|c| filter(*c)).collect();
        if candidates.is_empty() {
            host.notify(Notice::info("No matching comments"));
            return Err(CommentError::Cancelled);
        }
        let items: Vec<PickItem> = candidates.iter().map(|c| comment_item(c)).collect();
        let ids: Vec<String> = candidates.iter().map(|c| c.id.clone()).collect();
        let idx = host.pick(title, &items).await.ok_or(CommentError::Cancelled)?;
        ids.get(idx).cloned().ok_or(CommentError::Cancelled)
    }

    async fn pick_reply(&self, host: &mut P, comment_id: &str) -> Result<String> {
        let comment = self
            .store
            .get(comment_id)
            .ok_or_else(|| CommentError::CommentNotFound(comment_id.to_owned()))?;
        if comment.replies.is_empty() {
            host.notify(Notice::info("This thread has no replies"));
            return Err(CommentError::Cancelled);
        }
        let items: Vec<PickItem> = comment
            .replies
            .iter()
            .map(|r| PickItem {
                label: preview(&r.text),
                detail: format!("{} - {}", r.author, export::format_timestamp(&r.timestamp)),
            })
            .collect();
        let ids: Vec<String> = comment.replies.iter().map(|r| r.id.clone()).collect();
        let idx = host.pick("Delete which reply?", &items).await.ok_or(CommentError::Cancelled)?;
        ids.get(idx).cloned().ok_or(CommentError::Cancelled)
    }

    fn render_thread(&mut self, host: &mut P, comment_id: &str) {
        if let Some(old) = self.threads.remove(comment_id) {
            host.dispose_thread(old);
        }
        if let Some(comment) = self.store.get(comment_id) {
            let handle = host.create_thread(&ThreadView::from_comment(comment));
            self.threads.insert(comment_id.to_owned(), handle);
        }
    }

    fn refresh_tree(&self, host: &mut P) {
        host.refresh_tree(&build_tree(&self.store));
    }

    /// Writes the whole store now. A failure is reported, never propagated:
    /// the in-memory store remains the source of truth for the session.
    fn persist(&mut self, host: &mut P) {
        self.debouncer.take_pending();
        if let Err(e) = self.persistence.save(&self.store) {
            tracing::error!("failed to save comments: {e}");
            host.notify(Notice::error(format!("Failed to save comments: {e}")));
        }
    }
}

/// Unresolved comments grouped by file.
pub fn build_tree(store: &CommentStore) -> CommentTree {
    let mut files: Vec<TreeFile> = Vec::new();
    for comment in store.comments.iter().filter(|c| !c.resolved) {
        let entry = TreeEntry {
            comment_id: comment.id.clone(),
            line: comment.range.start.line,
            author: comment.author.clone(),
            preview: preview(&comment.text),
            reply_count: comment.replies.len(),
        };
        match files.iter_mut().find(|f| f.file_path == comment.file_path) {
            Some(file) => file.entries.push(entry),
            None => files.push(TreeFile { file_path: comment.file_path.clone(), entries: vec![entry] }),
        }
    }
    files.sort_by(|a, b| a.file_path.cmp(&b.file_path));
    for file in &mut files {
        file.entries.sort_by_key(|e| e.line);
    }
    CommentTree { files }
}

fn require_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        Err(CommentError::EmptyText)
    } else {
        Ok(())
    }
}

fn destructive(message: String) -> ConfirmRequest {
    ConfirmRequest { message, confirm_label: "Delete".to_owned(), destructive: true }
}

fn comment_item(comment: &Comment) -> PickItem {
    let mark = if comment.resolved { " (resolved)" } else { "" };
    PickItem {
        label: format!("Line {}: {}{mark}", comment.range.start.display_line(), preview(&comment.text)),
        detail: format!("{} - {}", comment.author, comment.file_path),
    }
}

fn preview(text: &str) -> String {
    let first = text.lines().next().unwrap_or_default();
    if first.chars().count() > PREVIEW_CHARS {
        let cut: String = first.chars().take(PREVIEW_CHARS - 3).collect();
        format!("{cut}...")
    } else {
        first.to_owned()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
