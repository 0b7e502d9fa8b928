use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, DateTime as BsonDateTime};
use mongodb::options::ReturnDocument;
use mongodb::{Client, ClientSession, Collection};

use crate::dbs::mongo::models::MongoThread;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoThreadRepository {
    collection: Collection<MongoThread>,
}

impl MongoThreadRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("threads");
        Self { collection }
    }

    /// Create a new thread
    pub async fn create_thread(&self, title: String) -> Result<MongoThread> {
        let now = Utc::now();
        let thread = MongoThread {
            id: ObjectId::new(),
            title,
            archived: false,
            created_at: now,
            last_activity_at: now,
        };

        self.collection.insert_one(&thread).await?;
        Ok(thread)
    }

    /// Get thread by ID
    pub async fn get_thread(&self, thread_id: ObjectId) -> Result<Option<MongoThread>> {
        let filter = doc! { "_id": thread_id };
        Ok(self.collection.find_one(filter).await?)
    }

    /// Apply a `$set` and return the updated thread, or None if it does not exist
    async fn set_fields(&self, thread_id: ObjectId, fields: mongodb::bson::Document) -> Result<Option<MongoThread>> {
        let filter = doc! { "_id": thread_id };
        let update = doc! { "$set": fields };
        let updated = self
            .collection
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated)
    }

    pub async fn set_title(&self, thread_id: ObjectId, title: String) -> Result<Option<MongoThread>> {
        self.set_fields(thread_id, doc! { "title": title }).await
    }

    pub async fn archive(&self, thread_id: ObjectId) -> Result<Option<MongoThread>> {
        self.set_fields(thread_id, doc! { "archived": true }).await
    }

    /// Bump last activity inside a transaction. Never moves it backwards.
    pub async fn touch(
        &self,
        session: &mut ClientSession,
        thread_id: ObjectId,
        at: DateTime<Utc>,
    ) -> Result<Option<MongoThread>> {
        let filter = doc! { "_id": thread_id };
        let update = doc! { "$max": { "last_activity_at": Bson::DateTime(BsonDateTime::from_chrono(at)) } };
        let updated = self
            .collection
            .find_one_and_update(filter, update)
            .return_document(ReturnDocument::After)
            .session(&mut *session)
            .await?;
        Ok(updated)
    }

    /// List threads, most recently active first
    pub async fn list_recent(&self, limit: usize, include_archived: bool) -> Result<Vec<MongoThread>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let filter = if include_archived {
            doc! {}
        } else {
            doc! { "archived": { "$ne": true } }
        };

        let threads = self
            .collection
            .find(filter)
            .sort(doc! { "last_activity_at": -1, "created_at": -1 })
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .await?
            .try_collect()
            .await?;
        Ok(threads)
    }

    /// Delete thread inside a transaction
    pub async fn delete_thread(&self, session: &mut ClientSession, thread_id: ObjectId) -> Result<bool> {
        let filter = doc! { "_id": thread_id };
        let result = self.collection.delete_one(filter).session(&mut *session).await?;
        Ok(result.deleted_count > 0)
    }
}
