use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Message, MessageRole, Thread};

/// Trait for database persistence operations
///
/// Implementations provide backend-specific storage of threads and their
/// messages. Writes to different threads must not block each other, and a
/// message never outlives its thread.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Create a new, non-archived thread with the given title
    async fn create_thread(&self, title: String) -> Result<Thread>;

    /// Get a thread by ID
    async fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>>;

    /// Replace a thread's title
    async fn rename_thread(&self, thread_id: &str, title: String) -> Result<Thread>;

    /// Mark a thread archived. Its messages are kept.
    async fn archive_thread(&self, thread_id: &str) -> Result<Thread>;

    /// Remove a thread and all of its messages. Returns false if it did not exist.
    async fn delete_thread(&self, thread_id: &str) -> Result<bool>;

    /// Threads ordered by most recent activity first
    async fn list_recent_threads(&self, limit: usize, include_archived: bool) -> Result<Vec<Thread>>;

    /// Messages of a thread in insertion order. With `limit`, only the first `limit`.
    async fn list_messages(&self, thread_id: &str, limit: Option<usize>) -> Result<Vec<Message>>;

    /// Append a message and bump the thread's last activity
    async fn append_message(&self, thread_id: &str, role: MessageRole, content: String) -> Result<Message>;

    /// Number of messages stored for a thread
    async fn count_messages(&self, thread_id: &str) -> Result<u64>;

    /// Most recently appended message of a thread
    async fn latest_message(&self, thread_id: &str) -> Result<Option<Message>>;
}
