use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    routing::{get, patch},
    Router,
};

use crate::errors::AppError;
use crate::AppState;

pub mod handlers;

/// Build the notification API router.
/// All routes are relative — the caller mounts this under `/api/v1`.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/notifications", get(handlers::list_notifications))
        .route("/notifications/unread-count", get(handlers::unread_count))
        .route("/notifications/:id/read", patch(handlers::mark_read))
        .route("/notifications/stream", get(handlers::stream))
        .fallback(fallback_404)
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// The authenticated user behind a request.
///
/// Session handling lives in front of this service; the gateway forwards the
/// resolved user id in `X-User-Id`. A request without it is unauthorized.
pub struct CurrentUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<i64>().ok())
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}
