use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::sse::{Event, Sse},
    Json,
};
use futures::stream::{Stream, StreamExt};
use serde_json::json;

use crate::api::CurrentUser;
use crate::errors::AppError;
use crate::models::Notification;
use crate::stream::StreamFrame;
use crate::AppState;

/// GET /api/v1/notifications — recent notifications, newest first
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifications = state
        .store
        .list_recent(user_id, state.config.recent_limit)
        .await?;
    Ok(Json(notifications))
}

/// GET /api/v1/notifications/unread-count
pub async fn unread_count(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let count = state.store.unread_count(user_id).await?;
    Ok(Json(json!({ "count": count })))
}

/// PATCH /api/v1/notifications/:id/read — idempotent; 404 when the row is
/// absent or belongs to someone else
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.store.mark_read(user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/notifications/stream — long-lived SSE connection.
///
/// With a `Last-Event-ID` header, stored notifications after that id are
/// replayed first; live pushes and heartbeats follow. Each notification
/// frame carries the row id as the SSE event id and the notification type
/// as the event name, so the browser's `Last-Event-ID` reconnect machinery
/// lines up with the store cursor for free.
pub async fn stream(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    headers: HeaderMap,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let last_event_id = headers
        .get("last-event-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok());

    let subscription = state.registry.subscribe(user_id, last_event_id).await?;
    tracing::debug!(user_id, ?last_event_id, "live stream opened");

    Ok(Sse::new(
        subscription.map(|frame| Ok::<_, Infallible>(frame_to_event(frame))),
    ))
}

fn frame_to_event(frame: StreamFrame) -> Event {
    match frame {
        StreamFrame::Notification(n) => {
            let payload = serde_json::to_string(&n).unwrap_or_else(|e| {
                tracing::error!(notification_id = n.id, error = %e, "failed to serialize notification for stream");
                String::new()
            });
            Event::default()
                .id(n.id.to_string())
                .event(n.notification_type.as_str())
                .data(payload)
        }
        StreamFrame::KeepAlive => Event::default().comment("keep-alive"),
    }
}
