use std::sync::Arc;

use parley_types::ThreadListing;

use crate::error::{PersistError, Result};
use crate::models::{Message, MessageRole, Thread, DEFAULT_THREAD_TITLE};
use crate::trait_client::PersistenceClient;

const SUMMARY_MAX_CHARS: usize = 48;

/// Thread lifecycle operations on top of a [`PersistenceClient`].
///
/// Owns the rules the raw store does not know about: title defaults and
/// validation, freshness, and the listing shape used by the sidebar.
#[derive(Clone)]
pub struct ThreadDirectory {
    store: Arc<dyn PersistenceClient>,
}

impl ThreadDirectory {
    pub fn new(store: Arc<dyn PersistenceClient>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn PersistenceClient> {
        &self.store
    }

    /// Create a thread. A missing or blank hint gives the placeholder title.
    pub async fn create_thread(&self, title_hint: Option<&str>) -> Result<Thread> {
        let title = title_hint
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_THREAD_TITLE);

        let thread = self.store.create_thread(title.to_string()).await?;
        tracing::debug!(thread_id = %thread.id, title = %thread.title, "thread created");
        Ok(thread)
    }

    pub async fn get_thread(&self, thread_id: &str) -> Result<Thread> {
        self.store
            .get_thread(thread_id)
            .await?
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))
    }

    /// Rename a thread. The title is trimmed and must not end up empty.
    pub async fn rename_thread(&self, thread_id: &str, new_title: &str) -> Result<Thread> {
        let title = new_title.trim();
        if title.is_empty() {
            return Err(PersistError::Validation("title must not be blank".to_string()));
        }

        let thread = self.store.rename_thread(thread_id, title.to_string()).await?;
        tracing::debug!(thread_id, title, "thread renamed");
        Ok(thread)
    }

    pub async fn archive_thread(&self, thread_id: &str) -> Result<Thread> {
        let thread = self.store.archive_thread(thread_id).await?;
        tracing::debug!(thread_id, "thread archived");
        Ok(thread)
    }

    pub async fn delete_thread(&self, thread_id: &str) -> Result<bool> {
        let deleted = self.store.delete_thread(thread_id).await?;
        tracing::debug!(thread_id, deleted, "thread purge requested");
        Ok(deleted)
    }

    /// Recent threads shaped for display, most recently active first.
    pub async fn list_recent(&self, limit: usize, include_archived: bool) -> Result<Vec<ThreadListing>> {
        let threads = self.store.list_recent_threads(limit, include_archived).await?;

        let mut listings = Vec::with_capacity(threads.len());
        for thread in threads {
            // A thread purged between the two reads still gets listed, just without a preview.
            let latest = match self.store.latest_message(&thread.id).await {
                Ok(latest) => latest,
                Err(e) if e.is_not_found() => None,
                Err(e) => return Err(e),
            };
            listings.push(ThreadListing {
                has_messages: latest.is_some(),
                summary: latest.as_ref().map(|m| summarize(&m.content)),
                id: thread.id,
                title: thread.title,
                archived: thread.archived,
                last_activity_at: thread.last_activity_at,
            });
        }
        Ok(listings)
    }

    pub async fn list_messages(&self, thread_id: &str, limit: Option<usize>) -> Result<Vec<Message>> {
        self.store.list_messages(thread_id, limit).await
    }

    pub async fn append_message(&self, thread_id: &str, role: MessageRole, content: impl Into<String>) -> Result<Message> {
        self.store.append_message(thread_id, role, content.into()).await
    }

    /// A thread is fresh when its only stored message is from the user.
    pub async fn is_fresh(&self, thread_id: &str) -> Result<bool> {
        let firsts = self.store.list_messages(thread_id, Some(2)).await?;
        Ok(firsts.len() == 1 && firsts[0].role == MessageRole::User)
    }
}

/// One-line preview of a message.
fn summarize(content: &str) -> String {
    let line = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.chars().count() <= SUMMARY_MAX_CHARS {
        return line;
    }
    let mut cut: String = line.chars().take(SUMMARY_MAX_CHARS).collect();
    cut.truncate(cut.trim_end().len());
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_short_text_untouched() {
        assert_eq!(summarize("Hello there"), "Hello there");
    }

    #[test]
    fn test_summarize_collapses_lines() {
        assert_eq!(summarize("first line\n\nsecond   line"), "first line second line");
    }

    #[test]
    fn test_summarize_truncates_long_text() {
        let long = "word ".repeat(30);
        let summary = summarize(&long);
        assert!(summary.ends_with('…'));
        assert!(summary.chars().count() <= SUMMARY_MAX_CHARS + 1);
    }
}
