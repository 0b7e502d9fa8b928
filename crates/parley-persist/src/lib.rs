pub mod builder;
pub mod dbs;
pub mod directory;
pub mod error;
pub mod models;
pub mod retry;
pub mod trait_client;

pub use builder::{PersistClientBuilder, StorageBackend};
pub use dbs::memory::InMemoryPersistenceClient;
#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoPersistenceClient;
pub use directory::ThreadDirectory;
pub use error::{PersistError, Result};
pub use models::{Message, MessageRole, Thread, DEFAULT_THREAD_TITLE};
pub use retry::{RetryPolicy, RetryingClient};
pub use trait_client::PersistenceClient;
