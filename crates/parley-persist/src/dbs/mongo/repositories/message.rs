use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::{Client, ClientSession, Collection};

use crate::dbs::mongo::models::MongoMessage;
use crate::error::Result;

#[derive(Clone)]
pub struct MongoMessageRepository {
    collection: Collection<MongoMessage>,
}

impl MongoMessageRepository {
    pub fn new(client: &Client, db_name: &str) -> Self {
        let collection = client.database(db_name).collection("messages");
        Self { collection }
    }

    /// Insert a message inside a transaction
    pub async fn insert(&self, session: &mut ClientSession, message: &MongoMessage) -> Result<()> {
        self.collection.insert_one(message).session(&mut *session).await?;
        Ok(())
    }

    /// Messages of a thread in insertion order
    pub async fn get_messages(&self, thread_id: ObjectId, limit: Option<usize>) -> Result<Vec<MongoMessage>> {
        // MongoDB reads a zero limit as "no limit"
        if limit == Some(0) {
            return Ok(Vec::new());
        }

        let filter = doc! { "thread_id": thread_id };
        let mut find = self.collection.find(filter).sort(doc! { "seq": 1 });
        if let Some(limit) = limit {
            find = find.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let messages = find.await?.try_collect().await?;
        Ok(messages)
    }

    pub async fn count(&self, thread_id: ObjectId) -> Result<u64> {
        Ok(self.collection.count_documents(doc! { "thread_id": thread_id }).await?)
    }

    /// Count inside a transaction, used to assign the next sequence number
    pub async fn count_in_session(&self, session: &mut ClientSession, thread_id: ObjectId) -> Result<u64> {
        let count = self
            .collection
            .count_documents(doc! { "thread_id": thread_id })
            .session(&mut *session)
            .await?;
        Ok(count)
    }

    pub async fn latest(&self, thread_id: ObjectId) -> Result<Option<MongoMessage>> {
        let message = self
            .collection
            .find_one(doc! { "thread_id": thread_id })
            .sort(doc! { "seq": -1 })
            .await?;
        Ok(message)
    }

    pub async fn delete_for_thread(&self, session: &mut ClientSession, thread_id: ObjectId) -> Result<u64> {
        let result = self
            .collection
            .delete_many(doc! { "thread_id": thread_id })
            .session(&mut *session)
            .await?;
        Ok(result.deleted_count)
    }
}
