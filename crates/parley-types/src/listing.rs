use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the thread list shown in the sidebar and the threads tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadListing {
    pub id: String,
    pub title: String,
    pub archived: bool,
    pub has_messages: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub last_activity_at: DateTime<Utc>,
}
