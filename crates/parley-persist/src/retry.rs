use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{PersistError, Result};
use crate::models::{Message, MessageRole, Thread};
use crate::trait_client::PersistenceClient;

/// Bounded retry for transient store failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before attempt `n` is `backoff * n`
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

/// Wraps a store and retries operations whose error is transient
pub struct RetryingClient {
    inner: Arc<dyn PersistenceClient>,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(inner: Arc<dyn PersistenceClient>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn with_retry<T, F, Fut>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
        T: Send,
    {
        self.retry_when(operation, PersistError::is_transient, call).await
    }

    async fn retry_when<T, F, Fut>(
        &self,
        operation: &'static str,
        retryable: fn(&PersistError) -> bool,
        mut call: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
        T: Send,
    {
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if retryable(&e) && attempt < attempts => {
                    tracing::warn!(operation, attempt, error = %e, "transient store failure, retrying");
                    tokio::time::sleep(self.policy.backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl PersistenceClient for RetryingClient {
    async fn create_thread(&self, title: String) -> Result<Thread> {
        self.with_retry("create_thread", || self.inner.create_thread(title.clone()))
            .await
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>> {
        self.with_retry("get_thread", || self.inner.get_thread(thread_id))
            .await
    }

    async fn rename_thread(&self, thread_id: &str, title: String) -> Result<Thread> {
        self.with_retry("rename_thread", || self.inner.rename_thread(thread_id, title.clone()))
            .await
    }

    async fn archive_thread(&self, thread_id: &str) -> Result<Thread> {
        self.with_retry("archive_thread", || self.inner.archive_thread(thread_id))
            .await
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<bool> {
        self.with_retry("delete_thread", || self.inner.delete_thread(thread_id))
            .await
    }

    async fn list_recent_threads(&self, limit: usize, include_archived: bool) -> Result<Vec<Thread>> {
        self.with_retry("list_recent_threads", || {
            self.inner.list_recent_threads(limit, include_archived)
        })
        .await
    }

    async fn list_messages(&self, thread_id: &str, limit: Option<usize>) -> Result<Vec<Message>> {
        self.with_retry("list_messages", || self.inner.list_messages(thread_id, limit))
            .await
    }

    async fn append_message(&self, thread_id: &str, role: MessageRole, content: String) -> Result<Message> {
        // Appends are not idempotent; replay only when the write never landed
        self.retry_when("append_message", PersistError::is_safe_to_replay, || {
            self.inner.append_message(thread_id, role, content.clone())
        })
        .await
    }

    async fn count_messages(&self, thread_id: &str) -> Result<u64> {
        self.with_retry("count_messages", || self.inner.count_messages(thread_id))
            .await
    }

    async fn latest_message(&self, thread_id: &str) -> Result<Option<Message>> {
        self.with_retry("latest_message", || self.inner.latest_message(thread_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbs::memory::InMemoryPersistenceClient;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails `create_thread` and `append_message` a fixed number of times.
    struct Flaky {
        inner: InMemoryPersistenceClient,
        failures_left: AtomicU32,
        error: fn() -> PersistError,
        calls: AtomicU32,
    }

    impl Flaky {
        fn new(failures: u32, transient: bool) -> Self {
            if transient {
                Self::failing_with(failures, || PersistError::Unavailable("blip".to_string()))
            } else {
                Self::failing_with(failures, || PersistError::Validation("bad".to_string()))
            }
        }

        fn failing_with(failures: u32, error: fn() -> PersistError) -> Self {
            Self {
                inner: InMemoryPersistenceClient::new(),
                failures_left: AtomicU32::new(failures),
                error,
                calls: AtomicU32::new(0),
            }
        }

        fn trip(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err((self.error)());
            }
            Ok(())
        }
    }

    #[async_trait]
    impl PersistenceClient for Flaky {
        async fn create_thread(&self, title: String) -> Result<Thread> {
            self.trip()?;
            self.inner.create_thread(title).await
        }
        async fn get_thread(&self, id: &str) -> Result<Option<Thread>> {
            self.inner.get_thread(id).await
        }
        async fn rename_thread(&self, id: &str, title: String) -> Result<Thread> {
            self.inner.rename_thread(id, title).await
        }
        async fn archive_thread(&self, id: &str) -> Result<Thread> {
            self.inner.archive_thread(id).await
        }
        async fn delete_thread(&self, id: &str) -> Result<bool> {
            self.inner.delete_thread(id).await
        }
        async fn list_recent_threads(&self, limit: usize, include_archived: bool) -> Result<Vec<Thread>> {
            self.inner.list_recent_threads(limit, include_archived).await
        }
        async fn list_messages(&self, id: &str, limit: Option<usize>) -> Result<Vec<Message>> {
            self.inner.list_messages(id, limit).await
        }
        async fn append_message(&self, id: &str, role: MessageRole, content: String) -> Result<Message> {
            self.trip()?;
            self.inner.append_message(id, role, content).await
        }
        async fn count_messages(&self, id: &str) -> Result<u64> {
            self.inner.count_messages(id).await
        }
        async fn latest_message(&self, id: &str) -> Result<Option<Message>> {
            self.inner.latest_message(id).await
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let flaky = Arc::new(Flaky::new(2, true));
        let client = RetryingClient::new(flaky.clone(), fast_policy(3));

        let thread = client.create_thread("t".to_string()).await.unwrap();
        assert_eq!(thread.title, "t");
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let flaky = Arc::new(Flaky::new(5, true));
        let client = RetryingClient::new(flaky.clone(), fast_policy(2));

        let err = client.create_thread("t".to_string()).await.unwrap_err();
        assert!(matches!(err, PersistError::Unavailable(_)));
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let flaky = Arc::new(Flaky::new(1, false));
        let client = RetryingClient::new(flaky.clone(), fast_policy(3));

        assert!(client.create_thread("t".to_string()).await.is_err());
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_append_lost_on_connection_is_not_replayed() {
        // Nothing says whether the insert committed before the connection dropped
        let flaky = Arc::new(Flaky::failing_with(1, || PersistError::Connection("reset".to_string())));
        let client = RetryingClient::new(flaky.clone(), fast_policy(3));
        let thread = flaky.inner.create_thread("t".to_string()).await.unwrap();

        let err = client
            .append_message(&thread.id, MessageRole::Assistant, "reply".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, PersistError::Connection(_)));
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refused_append_is_replayed_once_stored() {
        let flaky = Arc::new(Flaky::new(1, true));
        let client = RetryingClient::new(flaky.clone(), fast_policy(3));
        let thread = flaky.inner.create_thread("t".to_string()).await.unwrap();

        let message = client
            .append_message(&thread.id, MessageRole::User, "hi".to_string())
            .await
            .unwrap();
        assert_eq!(message.seq, 0);
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);
        assert_eq!(flaky.inner.count_messages(&thread.id).await.unwrap(), 1);
    }

    #[test]
    fn test_connection_errors_are_transient_but_not_replayable() {
        let err = PersistError::Connection("reset".to_string());
        assert!(err.is_transient());
        assert!(!err.is_safe_to_replay());
        assert!(PersistError::Unavailable("busy".to_string()).is_safe_to_replay());
    }
}
