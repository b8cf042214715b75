use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("missing or invalid user identity")]
    Unauthorized,

    #[error("notification not found")]
    NotificationNotFound,

    #[error("project not found")]
    ProjectNotFound,

    #[error("post not found")]
    PostNotFound,

    #[error("comment not found")]
    CommentNotFound,

    /// Caller bug: a publish request must reference exactly one business entity.
    #[error("exactly one related entity must be set, got {0}")]
    InvalidRelatedEntityCount(usize),

    /// Caller bug: the orchestrator must scope a request to a receiver before append.
    #[error("publish request has no receiver")]
    MissingReceiver,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "unauthorized",
                "missing or invalid user identity".to_string(),
            ),
            AppError::NotificationNotFound => (
                StatusCode::NOT_FOUND,
                "not_found_error",
                "notification_not_found",
                "notification not found".to_string(),
            ),
            AppError::ProjectNotFound => (
                StatusCode::NOT_FOUND,
                "not_found_error",
                "project_not_found",
                "project not found".to_string(),
            ),
            AppError::PostNotFound => (
                StatusCode::NOT_FOUND,
                "not_found_error",
                "post_not_found",
                "post not found".to_string(),
            ),
            AppError::CommentNotFound => (
                StatusCode::NOT_FOUND,
                "not_found_error",
                "comment_not_found",
                "comment not found".to_string(),
            ),
            AppError::InvalidRelatedEntityCount(n) => {
                tracing::error!("publish request with {} related entities rejected", n);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "configuration_error",
                    "invalid_related_entity_count",
                    "internal server error".to_string(),
                )
            }
            AppError::MissingReceiver => {
                tracing::error!("publish request reached the store without a receiver");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "configuration_error",
                    "missing_receiver",
                    "internal server error".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}
