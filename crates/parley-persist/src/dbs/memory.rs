use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::error::{PersistError, Result};
use crate::models::{Message, MessageRole, Thread};
use crate::trait_client::PersistenceClient;

struct ThreadRecord {
    thread: Thread,
    messages: Vec<Message>,
    /// Set by a purge; writers that fetched the record earlier must not revive it
    deleted: bool,
}

/// Process-local store.
///
/// The outer map is only write-locked to add or remove threads; appends take
/// the per-thread lock, so writers on different threads proceed in parallel.
#[derive(Default)]
pub struct InMemoryPersistenceClient {
    threads: RwLock<HashMap<String, Arc<Mutex<ThreadRecord>>>>,
}

impl InMemoryPersistenceClient {
    pub fn new() -> Self {
        Self::default()
    }

    async fn record(&self, thread_id: &str) -> Option<Arc<Mutex<ThreadRecord>>> {
        self.threads.read().await.get(thread_id).cloned()
    }

    async fn require(&self, thread_id: &str) -> Result<Arc<Mutex<ThreadRecord>>> {
        self.record(thread_id)
            .await
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))
    }
}

#[async_trait]
impl PersistenceClient for InMemoryPersistenceClient {
    async fn create_thread(&self, title: String) -> Result<Thread> {
        let thread = Thread::new(title);
        let record = ThreadRecord {
            thread: thread.clone(),
            messages: Vec::new(),
            deleted: false,
        };
        self.threads
            .write()
            .await
            .insert(thread.id.clone(), Arc::new(Mutex::new(record)));
        Ok(thread)
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>> {
        let Some(record) = self.record(thread_id).await else {
            return Ok(None);
        };
        let thread = record.lock().await.thread.clone();
        Ok(Some(thread))
    }

    async fn rename_thread(&self, thread_id: &str, title: String) -> Result<Thread> {
        let record = self.require(thread_id).await?;
        let mut record = record.lock().await;
        record.thread.title = title;
        Ok(record.thread.clone())
    }

    async fn archive_thread(&self, thread_id: &str) -> Result<Thread> {
        let record = self.require(thread_id).await?;
        let mut record = record.lock().await;
        record.thread.archived = true;
        Ok(record.thread.clone())
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<bool> {
        let removed = self.threads.write().await.remove(thread_id);
        match removed {
            Some(record) => {
                // Wait out any append that already holds the record.
                let mut record = record.lock().await;
                record.deleted = true;
                record.messages.clear();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_recent_threads(&self, limit: usize, include_archived: bool) -> Result<Vec<Thread>> {
        let records: Vec<_> = self.threads.read().await.values().cloned().collect();

        let mut threads = Vec::with_capacity(records.len());
        for record in records {
            let thread = record.lock().await.thread.clone();
            if include_archived || !thread.archived {
                threads.push(thread);
            }
        }

        threads.sort_by(|a, b| {
            b.last_activity_at
                .cmp(&a.last_activity_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        threads.truncate(limit);
        Ok(threads)
    }

    async fn list_messages(&self, thread_id: &str, limit: Option<usize>) -> Result<Vec<Message>> {
        let record = self.require(thread_id).await?;
        let record = record.lock().await;
        let take = limit.unwrap_or(usize::MAX);
        Ok(record.messages.iter().take(take).cloned().collect())
    }

    async fn append_message(&self, thread_id: &str, role: MessageRole, content: String) -> Result<Message> {
        let record = self.require(thread_id).await?;
        append_to(&record, thread_id, role, content).await
    }

    async fn count_messages(&self, thread_id: &str) -> Result<u64> {
        let record = self.require(thread_id).await?;
        let count = record.lock().await.messages.len() as u64;
        Ok(count)
    }

    async fn latest_message(&self, thread_id: &str) -> Result<Option<Message>> {
        let record = self.require(thread_id).await?;
        let latest = record.lock().await.messages.last().cloned();
        Ok(latest)
    }
}

/// Append under the record lock. The record may have been purged after it was fetched.
async fn append_to(record: &Mutex<ThreadRecord>, thread_id: &str, role: MessageRole, content: String) -> Result<Message> {
    let mut record = record.lock().await;
    if record.deleted {
        return Err(PersistError::ThreadNotFound(thread_id.to_string()));
    }

    let seq = record.messages.len() as u64;
    let message = Message::new(thread_id, seq, role, content);
    let touched = message.created_at.max(record.thread.last_activity_at);

    record.messages.push(message.clone());
    record.thread.last_activity_at = touched;
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_assigns_sequence_and_touches_thread() {
        let store = InMemoryPersistenceClient::new();
        let thread = store.create_thread("New chat".to_string()).await.unwrap();

        let first = store
            .append_message(&thread.id, MessageRole::User, "Hello".to_string())
            .await
            .unwrap();
        let second = store
            .append_message(&thread.id, MessageRole::Assistant, "Hi".to_string())
            .await
            .unwrap();

        assert_eq!(first.seq, 0);
        assert_eq!(second.seq, 1);

        let stored = store.get_thread(&thread.id).await.unwrap().unwrap();
        assert!(stored.last_activity_at >= thread.last_activity_at);
        assert_eq!(store.count_messages(&thread.id).await.unwrap(), 2);
        assert_eq!(
            store.latest_message(&thread.id).await.unwrap().unwrap().content,
            "Hi"
        );
    }

    #[tokio::test]
    async fn test_append_to_missing_thread_fails() {
        let store = InMemoryPersistenceClient::new();
        let err = store
            .append_message("nope", MessageRole::User, "x".to_string())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_removes_messages() {
        let store = InMemoryPersistenceClient::new();
        let thread = store.create_thread("t".to_string()).await.unwrap();
        store
            .append_message(&thread.id, MessageRole::User, "x".to_string())
            .await
            .unwrap();

        assert!(store.delete_thread(&thread.id).await.unwrap());
        assert!(!store.delete_thread(&thread.id).await.unwrap());
        assert!(store.get_thread(&thread.id).await.unwrap().is_none());
        assert!(store.list_messages(&thread.id, None).await.is_err());
    }

    #[tokio::test]
    async fn test_append_after_purge_of_fetched_record_fails() {
        let store = InMemoryPersistenceClient::new();
        let thread = store.create_thread("t".to_string()).await.unwrap();

        // An append that looked the record up just before the purge ran
        let record = store.require(&thread.id).await.unwrap();
        assert!(store.delete_thread(&thread.id).await.unwrap());

        let err = append_to(&record, &thread.id, MessageRole::User, "late".to_string())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(record.lock().await.messages.is_empty());
    }

    #[tokio::test]
    async fn test_list_messages_limit() {
        let store = InMemoryPersistenceClient::new();
        let thread = store.create_thread("t".to_string()).await.unwrap();
        for text in ["a", "b", "c"] {
            store
                .append_message(&thread.id, MessageRole::User, text.to_string())
                .await
                .unwrap();
        }

        let firsts = store.list_messages(&thread.id, Some(2)).await.unwrap();
        let contents: Vec<_> = firsts.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["a", "b"]);
    }
}
