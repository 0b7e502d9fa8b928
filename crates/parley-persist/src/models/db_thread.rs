use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title given to threads created without a usable hint.
pub const DEFAULT_THREAD_TITLE: &str = "New chat";

/// Database-agnostic thread model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub title: String,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl Thread {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            archived: false,
            created_at: now,
            last_activity_at: now,
        }
    }
}
