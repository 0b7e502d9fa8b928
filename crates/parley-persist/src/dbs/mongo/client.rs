use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use mongodb::{Client, ClientSession};

use crate::dbs::mongo::models::MongoMessage;
use crate::dbs::mongo::repositories::{MongoMessageRepository, MongoThreadRepository};
use crate::error::{PersistError, Result};
use crate::models::{Message, MessageRole, Thread};
use crate::trait_client::PersistenceClient;

/// MongoDB-backed store. Appends and deletes run in multi-document
/// transactions, so the server must be a replica set.
pub struct MongoPersistenceClient {
    client: Client,
    message_repo: MongoMessageRepository,
    thread_repo: MongoThreadRepository,
}

fn parse_id(thread_id: &str) -> Result<ObjectId> {
    ObjectId::parse_str(thread_id).map_err(|e| PersistError::InvalidObjectId(e.to_string()))
}

impl MongoPersistenceClient {
    /// Connect to MongoDB and create client
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        let message_repo = MongoMessageRepository::new(&client, database);
        let thread_repo = MongoThreadRepository::new(&client, database);

        tracing::info!(database, "connected to mongodb");

        Ok(Self {
            client,
            message_repo,
            thread_repo,
        })
    }

    async fn append_in_session(
        &self,
        session: &mut ClientSession,
        thread_id: ObjectId,
        role: MessageRole,
        content: String,
    ) -> Result<MongoMessage> {
        let now = Utc::now();

        // Touching first takes the write lock on the thread document, which
        // serializes concurrent appends to the same thread.
        if self.thread_repo.touch(session, thread_id, now).await?.is_none() {
            return Err(PersistError::ThreadNotFound(thread_id.to_hex()));
        }

        let seq = self.message_repo.count_in_session(session, thread_id).await?;
        let message = MongoMessage {
            id: ObjectId::new(),
            thread_id,
            seq: i64::try_from(seq).unwrap_or(i64::MAX),
            role,
            content,
            created_at: now,
        };
        self.message_repo.insert(session, &message).await?;
        Ok(message)
    }

    async fn delete_in_session(&self, session: &mut ClientSession, thread_id: ObjectId) -> Result<bool> {
        self.message_repo.delete_for_thread(session, thread_id).await?;
        self.thread_repo.delete_thread(session, thread_id).await
    }

    async fn require_thread(&self, thread_id: ObjectId) -> Result<()> {
        match self.thread_repo.get_thread(thread_id).await? {
            Some(_) => Ok(()),
            None => Err(PersistError::ThreadNotFound(thread_id.to_hex())),
        }
    }
}

#[async_trait]
impl PersistenceClient for MongoPersistenceClient {
    async fn create_thread(&self, title: String) -> Result<Thread> {
        let mongo_thread = self.thread_repo.create_thread(title).await?;
        Ok(mongo_thread.into())
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Option<Thread>> {
        let object_id = parse_id(thread_id)?;
        let mongo_thread = self.thread_repo.get_thread(object_id).await?;
        Ok(mongo_thread.map(|t| t.into()))
    }

    async fn rename_thread(&self, thread_id: &str, title: String) -> Result<Thread> {
        let object_id = parse_id(thread_id)?;
        self.thread_repo
            .set_title(object_id, title)
            .await?
            .map(Thread::from)
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))
    }

    async fn archive_thread(&self, thread_id: &str) -> Result<Thread> {
        let object_id = parse_id(thread_id)?;
        self.thread_repo
            .archive(object_id)
            .await?
            .map(Thread::from)
            .ok_or_else(|| PersistError::ThreadNotFound(thread_id.to_string()))
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<bool> {
        let object_id = parse_id(thread_id)?;

        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;
        match self.delete_in_session(&mut session, object_id).await {
            Ok(deleted) => {
                session.commit_transaction().await?;
                Ok(deleted)
            }
            Err(e) => {
                if let Err(abort) = session.abort_transaction().await {
                    tracing::warn!(error = %abort, "failed to abort delete transaction");
                }
                Err(e)
            }
        }
    }

    async fn list_recent_threads(&self, limit: usize, include_archived: bool) -> Result<Vec<Thread>> {
        let mongo_threads = self.thread_repo.list_recent(limit, include_archived).await?;
        Ok(mongo_threads.into_iter().map(|t| t.into()).collect())
    }

    async fn list_messages(&self, thread_id: &str, limit: Option<usize>) -> Result<Vec<Message>> {
        let object_id = parse_id(thread_id)?;
        self.require_thread(object_id).await?;

        let mongo_messages = self.message_repo.get_messages(object_id, limit).await?;
        Ok(mongo_messages.into_iter().map(|m| m.into()).collect())
    }

    async fn append_message(&self, thread_id: &str, role: MessageRole, content: String) -> Result<Message> {
        let object_id = parse_id(thread_id)?;

        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;
        match self.append_in_session(&mut session, object_id, role, content).await {
            Ok(message) => {
                session.commit_transaction().await?;
                Ok(message.into())
            }
            Err(e) => {
                if let Err(abort) = session.abort_transaction().await {
                    tracing::warn!(error = %abort, "failed to abort append transaction");
                }
                Err(e)
            }
        }
    }

    async fn count_messages(&self, thread_id: &str) -> Result<u64> {
        let object_id = parse_id(thread_id)?;
        self.require_thread(object_id).await?;
        self.message_repo.count(object_id).await
    }

    async fn latest_message(&self, thread_id: &str) -> Result<Option<Message>> {
        let object_id = parse_id(thread_id)?;
        self.require_thread(object_id).await?;
        let latest = self.message_repo.latest(object_id).await?;
        Ok(latest.map(|m| m.into()))
    }
}
