use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, postgres::PgPoolOptions};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::comments::{Comment, SortOrder},
    repositories::{CommentStore, NewComment, path},
};

/// Connection settings for the PostgreSQL backend.
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
}

/// PostgreSQL-backed comment store.
///
/// Subtree queries compile the materialized-path prefix to `LIKE`, backed
/// by a `text_pattern_ops` index; full-text search uses `plainto_tsquery`
/// ranking backed by a GIN index over `content`.
#[derive(Clone)]
pub struct PgCommentStore {
    pool: PgPool,
}

impl PgCommentStore {
    /// Connects and bootstraps the `comment` table plus the two indexes the
    /// prefix and search queries rely on. Idempotent against an already
    /// provisioned database.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect(&settings.url)
            .await?;

        ensure_schema(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, AppError> {
        let row = crate::log_query_fetch_optional!(
            "comments.find_by_id",
            sqlx::query_as::<_, Comment>(
                r#"
                SELECT id, parent_id, path, content, author, created_at, updated_at
                FROM comment
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&self.pool)
        )?;

        Ok(row)
    }
}

async fn ensure_schema(pool: &PgPool) -> Result<(), AppError> {
    crate::log_query!(
        "comments.ensure_table",
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS comment (
                id         UUID PRIMARY KEY,
                parent_id  UUID,
                path       TEXT NOT NULL,
                content    TEXT NOT NULL,
                author     TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(pool)
    )?;

    crate::log_query!(
        "comments.ensure_path_index",
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS comment_path_idx \
             ON comment (path text_pattern_ops)",
        )
        .execute(pool)
    )?;

    crate::log_query!(
        "comments.ensure_content_index",
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS comment_content_fts_idx \
             ON comment USING GIN (to_tsvector('english', content))",
        )
        .execute(pool)
    )?;

    Ok(())
}

#[async_trait]
impl CommentStore for PgCommentStore {
    async fn create(&self, new: NewComment) -> Result<Comment, AppError> {
        let id = Uuid::now_v7();
        let now = Utc::now();

        // Point-in-time parent read; the insert below is a separate
        // statement, so the documented orphaning race stays possible.
        let path = match new.parent_id {
            None => path::root_path(id),
            Some(parent_id) => {
                let parent = self
                    .find_by_id(parent_id)
                    .await?
                    .ok_or(AppError::ParentNotFound(parent_id))?;
                path::child_path(&parent.path, id)
            }
        };

        let comment = Comment {
            id,
            parent_id: new.parent_id,
            path,
            content: new.content,
            author: new.author,
            created_at: now,
            updated_at: now,
        };

        crate::log_query_execute!(
            "comments.insert",
            sqlx::query(
                r#"
                INSERT INTO comment (id, parent_id, path, content, author, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(comment.id)
            .bind(comment.parent_id)
            .bind(&comment.path)
            .bind(&comment.content)
            .bind(&comment.author)
            .bind(comment.created_at)
            .bind(comment.updated_at)
            .execute(&self.pool)
        )?;

        Ok(comment)
    }

    async fn fetch_thread(
        &self,
        parent_id: Uuid,
        limit: u32,
        offset: u32,
        sort: SortOrder,
    ) -> Result<Vec<Comment>, AppError> {
        let parent = self
            .find_by_id(parent_id)
            .await?
            .ok_or(AppError::ParentNotFound(parent_id))?;

        // Stored paths contain only hex digits, '-' and '/', so the LIKE
        // pattern carries no metacharacters.
        let sql = match sort {
            SortOrder::Asc => {
                r#"
                SELECT id, parent_id, path, content, author, created_at, updated_at
                FROM comment
                WHERE path LIKE $1 || '%'
                ORDER BY created_at ASC, id ASC
                LIMIT $2 OFFSET $3
                "#
            }
            SortOrder::Desc => {
                r#"
                SELECT id, parent_id, path, content, author, created_at, updated_at
                FROM comment
                WHERE path LIKE $1 || '%'
                ORDER BY created_at DESC, id DESC
                LIMIT $2 OFFSET $3
                "#
            }
        };

        let rows = crate::log_query_fetch_all!(
            "comments.fetch_thread",
            sqlx::query_as::<_, Comment>(sql)
                .bind(&parent.path)
                .bind(i64::from(limit))
                .bind(i64::from(offset))
                .fetch_all(&self.pool)
        )?;

        Ok(rows)
    }

    async fn delete_thread(&self, id: Uuid) -> Result<u64, AppError> {
        let target = self
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound(id))?;

        let result = crate::log_query_execute!(
            "comments.delete_thread",
            sqlx::query("DELETE FROM comment WHERE path LIKE $1 || '%'")
                .bind(&target.path)
                .execute(&self.pool)
        )?;

        Ok(result.rows_affected())
    }

    async fn search(&self, query: &str, limit: u32, offset: u32) -> Result<Vec<Comment>, AppError> {
        if query.trim().is_empty() {
            let rows = crate::log_query_fetch_all!(
                "comments.browse",
                sqlx::query_as::<_, Comment>(
                    r#"
                    SELECT id, parent_id, path, content, author, created_at, updated_at
                    FROM comment
                    ORDER BY created_at DESC, id DESC
                    LIMIT $1 OFFSET $2
                    "#,
                )
                .bind(i64::from(limit))
                .bind(i64::from(offset))
                .fetch_all(&self.pool)
            )?;

            return Ok(rows);
        }

        let rows = crate::log_query_fetch_all!(
            "comments.search",
            sqlx::query_as::<_, Comment>(
                r#"
                SELECT id, parent_id, path, content, author, created_at, updated_at
                FROM comment
                WHERE to_tsvector('english', content) @@ plainto_tsquery('english', $1)
                ORDER BY
                    ts_rank(to_tsvector('english', content), plainto_tsquery('english', $1)) DESC,
                    created_at DESC,
                    id DESC
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(query)
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&self.pool)
        )?;

        Ok(rows)
    }
}
