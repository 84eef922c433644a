use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::comments::{Comment, SortOrder},
};

pub mod memory;
pub mod path;
pub mod postgres;

pub use memory::MemoryCommentStore;
pub use postgres::PgCommentStore;

/// Caller-supplied fields for a new comment. Identifier, path, and
/// timestamps are assigned by the store at creation.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub content: String,
    pub author: String,
    pub parent_id: Option<Uuid>,
}

/// Capability interface over the record store backing the comment tree.
///
/// Implementations own materialized-path assignment and translate the
/// subtree prefix algebra into their native query language; nothing above
/// this trait may compute or override a comment's path. Every method
/// returns the most specific `AppError` kind it can determine.
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Persists a new comment. A root comment's path is its own id; a
    /// reply's path extends the parent's path by one segment, derived from
    /// a point-in-time read of the parent (`ParentNotFound` if it does not
    /// resolve). The parent read and the insert are two separate
    /// operations: a parent deleted in between leaves the reply orphaned.
    async fn create(&self, new: NewComment) -> Result<Comment, AppError>;

    /// Returns the comment `parent_id` itself plus every descendant,
    /// ordered by `created_at` in the requested direction (id as the
    /// tiebreaker), with `offset` then `limit` applied after ordering.
    async fn fetch_thread(
        &self,
        parent_id: Uuid,
        limit: u32,
        offset: u32,
        sort: SortOrder,
    ) -> Result<Vec<Comment>, AppError>;

    /// Removes the comment `id` and its whole subtree in one bulk filter
    /// operation (`NotFound` if `id` does not resolve). Returns the number
    /// of records removed.
    async fn delete_thread(&self, id: Uuid) -> Result<u64, AppError>;

    /// Non-blank `query`: relevance-ranked full-text match over `content`,
    /// best match first, ties newest first with id as the final
    /// tiebreaker. Blank `query`: reverse-chronological browse of the
    /// entire corpus. Never scoped to a thread.
    async fn search(&self, query: &str, limit: u32, offset: u32)
    -> Result<Vec<Comment>, AppError>;
}
