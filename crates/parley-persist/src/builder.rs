use std::sync::Arc;

use crate::dbs::memory::InMemoryPersistenceClient;
use crate::error::{PersistError, Result};
use crate::retry::{RetryPolicy, RetryingClient};
use crate::trait_client::PersistenceClient;

/// Which backend the builder connects to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Mongodb,
}

pub struct PersistClientBuilder {
    backend: StorageBackend,
    #[cfg_attr(not(feature = "mongodb"), allow(dead_code))]
    mongodb_uri: Option<String>,
    #[cfg_attr(not(feature = "mongodb"), allow(dead_code))]
    database: Option<String>,
    retry: RetryPolicy,
}

impl PersistClientBuilder {
    pub fn new() -> Self {
        Self {
            backend: StorageBackend::Memory,
            mongodb_uri: None,
            database: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn backend(mut self, backend: StorageBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn mongodb_uri(mut self, uri: impl Into<String>) -> Self {
        self.mongodb_uri = Some(uri.into());
        self
    }

    pub fn database(mut self, db: impl Into<String>) -> Self {
        self.database = Some(db.into());
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    pub async fn build(self) -> Result<Arc<dyn PersistenceClient>> {
        let store: Arc<dyn PersistenceClient> = match self.backend {
            StorageBackend::Memory => Arc::new(InMemoryPersistenceClient::new()),
            StorageBackend::Mongodb => self.connect_mongo().await?,
        };

        Ok(Arc::new(RetryingClient::new(store, self.retry)))
    }

    #[cfg(feature = "mongodb")]
    async fn connect_mongo(&self) -> Result<Arc<dyn PersistenceClient>> {
        let mongodb_uri = self
            .mongodb_uri
            .as_deref()
            .ok_or_else(|| PersistError::Internal("mongodb_uri is required".to_string()))?;
        let database = self
            .database
            .as_deref()
            .ok_or_else(|| PersistError::Internal("database is required".to_string()))?;

        let client = crate::dbs::mongo::MongoPersistenceClient::connect(mongodb_uri, database).await?;
        Ok(Arc::new(client))
    }

    #[cfg(not(feature = "mongodb"))]
    async fn connect_mongo(&self) -> Result<Arc<dyn PersistenceClient>> {
        Err(PersistError::Internal(
            "mongodb backend requested but parley-persist was built without the `mongodb` feature".to_string(),
        ))
    }
}

impl Default for PersistClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
