use std::{future::Future, sync::Arc, time::Duration};

use uuid::Uuid;

use crate::{
    dto::comments::{
        CommentListResponse, CommentResponse, CreateCommentRequest, SearchQuery, ThreadQuery,
    },
    error::AppError,
    models::comments::Comment,
    repositories::{CommentStore, NewComment, path},
    telemetry::BusinessEvent,
};

const MIN_CONTENT_LENGTH: usize = 1;
const MAX_CONTENT_LENGTH: usize = 5000;
const MAX_AUTHOR_LENGTH: usize = 120;
const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

/// Orchestrates comment operations over a store implementation, applying
/// input validation and a per-call deadline.
pub struct CommentService {
    store: Arc<dyn CommentStore>,
    store_deadline: Duration,
}

impl CommentService {
    pub fn new(store: Arc<dyn CommentStore>, store_deadline: Duration) -> Self {
        Self {
            store,
            store_deadline,
        }
    }

    pub async fn save_comment(
        &self,
        req: CreateCommentRequest,
    ) -> Result<CommentResponse, AppError> {
        let content = normalize_content(&req.content)?;
        let author = normalize_author(&req.author)?;
        let parent_id = match req.parent_id.as_deref() {
            None => None,
            Some(raw) => Some(parse_identifier(raw)?),
        };

        let row = self
            .with_deadline(
                "save_comment",
                self.store.create(NewComment {
                    content,
                    author,
                    parent_id,
                }),
            )
            .await?;

        BusinessEvent::CommentCreated {
            comment_id: row.id,
            parent_id: row.parent_id,
            depth: path::depth(&row.path),
        }
        .log();

        Ok(map_comment_response(row))
    }

    pub async fn get_thread(&self, query: ThreadQuery) -> Result<CommentListResponse, AppError> {
        let Some(parent) = query.parent.as_deref() else {
            return Err(AppError::Validation(
                "parent query parameter is required".to_string(),
            ));
        };
        let parent_id = parse_identifier(parent)?;
        let limit = normalize_limit(query.limit)?;
        let offset = query.offset.unwrap_or(0);
        let sort = query.sort.unwrap_or_default();

        let rows = self
            .with_deadline(
                "get_thread",
                self.store.fetch_thread(parent_id, limit, offset, sort),
            )
            .await?;

        Ok(map_comment_list(rows))
    }

    pub async fn delete_thread(&self, raw_id: &str) -> Result<u64, AppError> {
        let id = parse_identifier(raw_id)?;

        let removed = self
            .with_deadline("delete_thread", self.store.delete_thread(id))
            .await?;

        BusinessEvent::ThreadDeleted {
            root_id: id,
            removed,
        }
        .log();

        Ok(removed)
    }

    pub async fn search(&self, query: SearchQuery) -> Result<CommentListResponse, AppError> {
        let text = query.query.unwrap_or_default();
        let limit = normalize_limit(query.limit)?;
        let offset = query.offset.unwrap_or(0);

        let rows = self
            .with_deadline("search", self.store.search(&text, limit, offset))
            .await?;

        Ok(map_comment_list(rows))
    }

    async fn with_deadline<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = Result<T, AppError>>,
    ) -> Result<T, AppError> {
        match tokio::time::timeout(self.store_deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(op)),
        }
    }
}

fn parse_identifier(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidIdentifier(raw.to_string()))
}

fn normalize_content(content: &str) -> Result<String, AppError> {
    let trimmed = content.trim();
    let len = trimmed.chars().count();
    if len < MIN_CONTENT_LENGTH {
        return Err(AppError::Validation(
            "Comment content is required".to_string(),
        ));
    }
    if len > MAX_CONTENT_LENGTH {
        return Err(AppError::Validation(format!(
            "Comment content exceeds {MAX_CONTENT_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_author(author: &str) -> Result<String, AppError> {
    let trimmed = author.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(
            "Comment author is required".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_AUTHOR_LENGTH {
        return Err(AppError::Validation(format!(
            "Comment author exceeds {MAX_AUTHOR_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_limit(limit: Option<u32>) -> Result<u32, AppError> {
    let value = limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if value == 0 {
        return Err(AppError::Validation(
            "Limit must be greater than zero".to_string(),
        ));
    }
    if value > MAX_PAGE_SIZE {
        return Err(AppError::Validation(format!(
            "Limit exceeds maximum of {MAX_PAGE_SIZE}"
        )));
    }
    Ok(value)
}

fn map_comment_response(row: Comment) -> CommentResponse {
    CommentResponse {
        id: row.id,
        parent_id: row.parent_id,
        path: row.path,
        content: row.content,
        author: row.author,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn map_comment_list(rows: Vec<Comment>) -> CommentListResponse {
    CommentListResponse {
        data: rows.into_iter().map(map_comment_response).collect(),
    }
}
