use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    app::state::AppState,
    dto::comments::{
        CommentListResponse, CommentResponse, CreateCommentRequest, SearchQuery, ThreadQuery,
    },
    error::AppError,
};

pub async fn create_comment_handle(
    State(state): State<AppState>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), AppError> {
    let response = state.comments.save_comment(req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn get_thread_handle(
    State(state): State<AppState>,
    Query(query): Query<ThreadQuery>,
) -> Result<Json<CommentListResponse>, AppError> {
    let response = state.comments.get_thread(query).await?;
    Ok(Json(response))
}

/// Identifier arrives as a raw string so malformed values surface through
/// the shared error envelope rather than the extractor's default reply.
pub async fn delete_thread_handle(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.comments.delete_thread(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn search_comments_handle(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<CommentListResponse>, AppError> {
    let response = state.comments.search(query).await?;
    Ok(Json(response))
}
