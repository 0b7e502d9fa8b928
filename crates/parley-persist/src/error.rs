use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistError {
    #[cfg(feature = "mongodb")]
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[cfg(feature = "mongodb")]
    #[error("BSON serialization error: {0}")]
    BsonSerialization(#[from] bson::ser::Error),

    #[cfg(feature = "mongodb")]
    #[error("BSON deserialization error: {0}")]
    BsonDeserialization(#[from] bson::de::Error),

    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid object ID: {0}")]
    InvalidObjectId(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PersistError {
    /// Whether retrying the same operation may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            PersistError::Unavailable(_) | PersistError::Connection(_) => true,
            #[cfg(feature = "mongodb")]
            PersistError::Database(e) => {
                use mongodb::error::{ErrorKind, RETRYABLE_WRITE_ERROR, TRANSIENT_TRANSACTION_ERROR};
                e.contains_label(TRANSIENT_TRANSACTION_ERROR)
                    || e.contains_label(RETRYABLE_WRITE_ERROR)
                    || matches!(*e.kind, ErrorKind::Io(_) | ErrorKind::ServerSelection { .. })
            }
            _ => false,
        }
    }

    /// Whether the failed write is known not to have been applied.
    ///
    /// Stricter than [`is_transient`](Self::is_transient): a dropped connection
    /// may hide a committed insert, so only refusals and aborted transactions qualify.
    pub fn is_safe_to_replay(&self) -> bool {
        match self {
            PersistError::Unavailable(_) => true,
            #[cfg(feature = "mongodb")]
            PersistError::Database(e) => e.contains_label(mongodb::error::TRANSIENT_TRANSACTION_ERROR),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PersistError::ThreadNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, PersistError>;
