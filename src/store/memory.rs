use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::errors::AppError;
use crate::models::Notification;
use crate::publish::PublishRequest;
use crate::store::NotificationStore;

/// Rows and the id counter share one lock so ids are assigned in the same
/// order rows land in the Vec; the list queries rely on that.
struct StoreState {
    rows: Vec<Notification>,
    next_id: i64,
}

/// Process-local notification store. Backs `serve --in-memory` for local
/// development and the integration tests; semantics match [`super::PgStore`]
/// including monotonic id assignment and idempotent mark-read.
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState {
                rows: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Total rows across all receivers. Test helper.
    pub fn len(&self) -> usize {
        self.state.lock().expect("store mutex poisoned").rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn append(&self, request: &PublishRequest) -> Result<Notification, AppError> {
        let receiver_id = request.receiver_id().ok_or(AppError::MissingReceiver)?;

        let mut state = self.state.lock().expect("store mutex poisoned");
        let id = state.next_id;
        state.next_id += 1;

        let notification = Notification {
            id,
            receiver_id,
            notification_type: request.notification_type(),
            title: request.title_ref().map(str::to_owned),
            content: request.content_ref().map(str::to_owned),
            related_url: request.related_url_ref().map(str::to_owned),
            project_id: request.project_id_ref(),
            project_node_id: request.project_node_id_ref(),
            post_id: request.post_id_ref(),
            comment_id: request.comment_id_ref(),
            cs_qna_id: request.cs_qna_id_ref(),
            cs_post_id: request.cs_post_id_ref(),
            sender_user_id: request.sender_user_id_ref(),
            sender_name: request.sender_name_ref().map(str::to_owned),
            sender_profile_img: request.sender_profile_img_ref().map(str::to_owned),
            read_at: None,
            created_at: Utc::now(),
        };

        state.rows.push(notification.clone());
        Ok(notification)
    }

    async fn list_recent(
        &self,
        receiver_id: i64,
        limit: i64,
    ) -> Result<Vec<Notification>, AppError> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state
            .rows
            .iter()
            .rev()
            .filter(|n| n.receiver_id == receiver_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn list_after(
        &self,
        receiver_id: i64,
        after_id: i64,
    ) -> Result<Vec<Notification>, AppError> {
        let state = self.state.lock().expect("store mutex poisoned");
        // rows are appended in id order, so this is already ascending
        Ok(state
            .rows
            .iter()
            .filter(|n| n.receiver_id == receiver_id && n.id > after_id)
            .cloned()
            .collect())
    }

    async fn unread_count(&self, receiver_id: i64) -> Result<i64, AppError> {
        let state = self.state.lock().expect("store mutex poisoned");
        Ok(state
            .rows
            .iter()
            .filter(|n| n.receiver_id == receiver_id && n.read_at.is_none())
            .count() as i64)
    }

    async fn mark_read(&self, receiver_id: i64, id: i64) -> Result<(), AppError> {
        let mut state = self.state.lock().expect("store mutex poisoned");
        let row = state
            .rows
            .iter_mut()
            .find(|n| n.id == id && n.receiver_id == receiver_id)
            .ok_or(AppError::NotificationNotFound)?;

        if row.read_at.is_none() {
            row.read_at = Some(Utc::now());
        }
        Ok(())
    }
}
