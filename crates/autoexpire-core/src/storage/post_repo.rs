use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::{Database, MatchFilter, PostField, PostStore, UnpublishOptions};
use crate::post::PostRecord;
use crate::{Error, Result};

/// SQLite-backed post store over the `blog_posts` table
pub struct PostRepository<'a> {
    db: &'a Database,
    required_feature: String,
}

#[derive(FromRow)]
struct PostRow {
    id: i64,
    title: String,
    created: DateTime<Utc>,
    published: i32,
    state: i32,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        PostRecord {
            id: row.id,
            title: row.title,
            created: row.created,
            published: row.published,
            state: row.state,
        }
    }
}

/// Audit trail entry for a post
#[derive(Debug, Clone, FromRow)]
pub struct PostEvent {
    pub post_id: i64,
    pub event_type: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
}

impl<'a> PostRepository<'a> {
    pub fn new(db: &'a Database, required_feature: impl Into<String>) -> Self {
        Self {
            db,
            required_feature: required_feature.into(),
        }
    }

    /// Insert a post, returning its id
    pub async fn create(
        &self,
        title: &str,
        created: DateTime<Utc>,
        published: bool,
    ) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO blog_posts (title, created, published, state)
            VALUES (?, ?, ?, 0)
            "#,
        )
        .bind(title)
        .bind(created)
        .bind(i32::from(published))
        .execute(self.db.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Toggle a blog feature flag
    pub async fn set_feature(&self, name: &str, enabled: bool) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO blog_features (name, enabled) VALUES (?, ?)
            ON CONFLICT(name) DO UPDATE SET enabled = excluded.enabled
            "#,
        )
        .bind(name)
        .bind(i32::from(enabled))
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Audit events recorded for a post, oldest first
    pub async fn events_for(&self, post_id: i64) -> Result<Vec<PostEvent>> {
        let rows: Vec<PostEvent> = sqlx::query_as(
            r#"
            SELECT post_id, event_type, source, created_at
            FROM blog_post_events
            WHERE post_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }
}

#[async_trait::async_trait]
impl PostStore for PostRepository<'_> {
    async fn is_enabled(&self) -> Result<bool> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT enabled FROM blog_features WHERE name = ?")
            .bind(&self.required_feature)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(matches!(row, Some((enabled,)) if enabled != 0))
    }

    async fn find_candidates(&self, filter: &MatchFilter) -> Result<Vec<PostRecord>> {
        // julianday() accepts both RFC 3339 and "YYYY-MM-DD HH:MM:SS" values
        let rows: Vec<PostRow> = sqlx::query_as(
            r#"
            SELECT id, title, created, published, state
            FROM blog_posts
            WHERE published = 1
              AND julianday(created) <= julianday(?)
            ORDER BY id ASC
            "#,
        )
        .bind(filter.created_before)
        .fetch_all(self.db.pool())
        .await?;

        // SQLite LIKE only folds ASCII, so the title match happens here
        Ok(rows
            .into_iter()
            .map(PostRecord::from)
            .filter(|post| filter.matches_title(&post.title))
            .collect())
    }

    async fn fetch_by_id(&self, id: i64) -> Result<Option<PostRecord>> {
        let row: Option<PostRow> = sqlx::query_as(
            r#"
            SELECT id, title, created, published, state
            FROM blog_posts
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(PostRecord::from))
    }

    async fn unpublish(&self, id: i64, options: UnpublishOptions) -> Result<()> {
        let now = Utc::now();
        let mut tx = self.db.pool().begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE blog_posts
            SET published = 0, modified = ?
            WHERE id = ?
            "#,
        )
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::PostNotFound(id));
        }

        sqlx::query(
            r#"
            INSERT INTO blog_post_events (post_id, event_type, source, created_at)
            VALUES (?, 'unpublish', ?, ?)
            "#,
        )
        .bind(id)
        .bind(options.source())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_fields(&self, id: i64, fields: &[PostField]) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }

        let mut assignments = Vec::with_capacity(fields.len());
        let mut values = Vec::with_capacity(fields.len());
        for field in fields {
            match field {
                PostField::State(state) => {
                    assignments.push("state = ?");
                    values.push(*state);
                }
                PostField::Published(published) => {
                    assignments.push("published = ?");
                    values.push(i32::from(*published));
                }
            }
        }

        let query = format!(
            "UPDATE blog_posts SET {} WHERE id = ?",
            assignments.join(", ")
        );

        let mut query_builder = sqlx::query(&query);
        for value in values {
            query_builder = query_builder.bind(value);
        }

        let result = query_builder.bind(id).execute(self.db.pool()).await?;

        if result.rows_affected() == 0 {
            return Err(Error::PostNotFound(id));
        }

        Ok(())
    }
}
