mod database;
mod post_repo;

pub use database::Database;
pub use post_repo::{PostEvent, PostRepository};

use chrono::{DateTime, Utc};

use crate::post::PostRecord;
use crate::Result;

/// Criteria for candidate posts of a single rule
#[derive(Debug, Clone, PartialEq)]
pub struct MatchFilter {
    /// Only posts created at or before this instant
    pub created_before: DateTime<Utc>,
    /// Case-insensitive substring the title must contain, matched literally
    pub title_contains: String,
}

impl MatchFilter {
    /// Case-insensitive literal substring test, folding Unicode case
    pub fn matches_title(&self, title: &str) -> bool {
        title
            .to_lowercase()
            .contains(&self.title_contains.to_lowercase())
    }
}

/// Options passed along with an unpublish request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnpublishOptions {
    /// Marks the unpublish as coming from a scheduled process rather than a user
    pub scheduled: bool,
}

impl UnpublishOptions {
    pub fn scheduled() -> Self {
        Self { scheduled: true }
    }

    pub fn source(&self) -> &'static str {
        if self.scheduled {
            "scheduled"
        } else {
            "manual"
        }
    }
}

/// A single column assignment for a raw post update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostField {
    State(i32),
    Published(bool),
}

/// The blog's post API as consumed by the rule engine
#[async_trait::async_trait]
pub trait PostStore: Send + Sync {
    /// Whether the blog and its required feature are available
    async fn is_enabled(&self) -> Result<bool>;

    /// Published posts matching the filter
    async fn find_candidates(&self, filter: &MatchFilter) -> Result<Vec<PostRecord>>;

    /// Load a post by id
    async fn fetch_by_id(&self, id: i64) -> Result<Option<PostRecord>>;

    /// Unpublish a post through the blog's own unpublish operation
    async fn unpublish(&self, id: i64, options: UnpublishOptions) -> Result<()>;

    /// Assign columns directly, bypassing unpublish side effects
    async fn update_fields(&self, id: i64, fields: &[PostField]) -> Result<()>;
}
