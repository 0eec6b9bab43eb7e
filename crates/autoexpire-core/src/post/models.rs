use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `state` column value of a regular post
pub const STATE_NORMAL: i32 = 0;
/// `state` column value of an archived post
pub const STATE_ARCHIVED: i32 = 2;

/// A blog post row as seen by the rule engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: i64,
    pub title: String,
    pub created: DateTime<Utc>,
    /// 1 when published, 0 otherwise
    pub published: i32,
    pub state: i32,
}

impl PostRecord {
    pub fn is_published(&self) -> bool {
        self.published == 1
    }

    pub fn is_archived(&self) -> bool {
        self.state == STATE_ARCHIVED
    }

    /// Rows can change between the query and processing; only act on
    /// rows that still carry a real id and are still published.
    pub fn is_actionable(&self) -> bool {
        self.id > 0 && self.is_published()
    }
}
