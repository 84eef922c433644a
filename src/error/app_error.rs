use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

#[derive(Debug)]
pub enum AppError {
    // Caller input errors
    InvalidIdentifier(String),
    Validation(String),

    // Resolution errors
    ParentNotFound(Uuid),
    NotFound(Uuid),

    // Store errors
    Timeout(&'static str),
    Store(sqlx::Error),

    // Startup and wiring errors
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidIdentifier(raw) => write!(f, "invalid identifier: {raw}"),
            AppError::Validation(msg) => write!(f, "validation error: {msg}"),
            AppError::ParentNotFound(id) => write!(f, "parent comment not found: {id}"),
            AppError::NotFound(id) => write!(f, "comment not found: {id}"),
            AppError::Timeout(op) => write!(f, "store deadline elapsed during {op}"),
            AppError::Store(e) => write!(f, "store error: {e}"),
            AppError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::InvalidIdentifier(raw) => (
                StatusCode::BAD_REQUEST,
                "INVALID_IDENTIFIER",
                format!("'{raw}' is not a well-formed comment id"),
            ),
            AppError::Validation(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                msg.clone(),
            ),
            AppError::ParentNotFound(id) => (
                StatusCode::NOT_FOUND,
                "PARENT_NOT_FOUND",
                format!("parent comment {id} not found"),
            ),
            AppError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("comment {id} not found"),
            ),
            AppError::Timeout(op) => {
                tracing::error!(operation = %op, "Store call exceeded its deadline");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "STORE_TIMEOUT",
                    "store did not answer in time".to_string(),
                )
            }
            AppError::Store(e) => {
                tracing::error!("Store error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "store error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "server error".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

// From implementations for automatic conversion
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Store(err)
    }
}

// Result type alias
pub type AppResult<T> = Result<T, AppError>;
