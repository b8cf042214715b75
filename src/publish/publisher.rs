use std::collections::HashSet;
use std::sync::Arc;

use crate::errors::AppError;
use crate::models::{Notification, NotificationType};
use crate::publish::PublishRequest;
use crate::store::NotificationStore;
use crate::stream::EmitterRegistry;

/// Persist-then-push orchestrator.
///
/// Persistence is the durability guarantee; the live push is a best-effort
/// accelerant and its failure is never surfaced to the triggering business
/// operation. Fan-out across receivers is sequential and not atomic: an
/// append error aborts the remaining receivers without rolling back the
/// already-persisted ones.
#[derive(Clone)]
pub struct NotificationPublisher {
    store: Arc<dyn NotificationStore>,
    registry: Arc<EmitterRegistry>,
}

impl NotificationPublisher {
    pub fn new(store: Arc<dyn NotificationStore>, registry: Arc<EmitterRegistry>) -> Self {
        Self { store, registry }
    }

    /// Persist one receiver-scoped request, then push the stored row (with
    /// its real id) to the receiver's live connection if there is one.
    pub async fn publish(&self, request: PublishRequest) -> Result<Notification, AppError> {
        let saved = self.store.append(&request).await?;
        self.registry.push(saved.receiver_id, &saved);
        Ok(saved)
    }

    /// Expand one request template into one stored notification per receiver.
    /// An empty receiver set is a no-op. The template is validated once,
    /// before the first store write.
    pub async fn publish_to_users(
        &self,
        receivers: &HashSet<i64>,
        base: PublishRequest,
    ) -> Result<(), AppError> {
        if receivers.is_empty() {
            return Ok(());
        }
        base.validate()?;

        for &receiver_id in receivers {
            self.publish(base.with_receiver(receiver_id)).await?;
        }
        Ok(())
    }

    // Per-kind convenience entry points for the domain services.

    pub async fn publish_project(
        &self,
        receivers: &HashSet<i64>,
        notification_type: NotificationType,
        title: &str,
        content: &str,
        related_url: &str,
        project_id: i64,
    ) -> Result<(), AppError> {
        let base = PublishRequest::for_project(notification_type, project_id)
            .title(title)
            .content(content)
            .related_url(related_url);
        self.publish_to_users(receivers, base).await
    }

    pub async fn publish_project_node(
        &self,
        receivers: &HashSet<i64>,
        notification_type: NotificationType,
        title: &str,
        content: &str,
        related_url: &str,
        project_node_id: i64,
    ) -> Result<(), AppError> {
        let base = PublishRequest::for_project_node(notification_type, project_node_id)
            .title(title)
            .content(content)
            .related_url(related_url);
        self.publish_to_users(receivers, base).await
    }

    pub async fn publish_post(
        &self,
        receivers: &HashSet<i64>,
        notification_type: NotificationType,
        title: &str,
        content: &str,
        related_url: &str,
        post_id: i64,
    ) -> Result<(), AppError> {
        let base = PublishRequest::for_post(notification_type, post_id)
            .title(title)
            .content(content)
            .related_url(related_url);
        self.publish_to_users(receivers, base).await
    }

    pub async fn publish_comment(
        &self,
        receivers: &HashSet<i64>,
        notification_type: NotificationType,
        title: &str,
        content: &str,
        related_url: &str,
        comment_id: i64,
    ) -> Result<(), AppError> {
        let base = PublishRequest::for_comment(notification_type, comment_id)
            .title(title)
            .content(content)
            .related_url(related_url);
        self.publish_to_users(receivers, base).await
    }

    pub async fn publish_cs_qna(
        &self,
        receivers: &HashSet<i64>,
        notification_type: NotificationType,
        title: &str,
        content: &str,
        related_url: &str,
        cs_qna_id: i64,
    ) -> Result<(), AppError> {
        let base = PublishRequest::for_cs_qna(notification_type, cs_qna_id)
            .title(title)
            .content(content)
            .related_url(related_url);
        self.publish_to_users(receivers, base).await
    }

    pub async fn publish_cs_post(
        &self,
        receivers: &HashSet<i64>,
        notification_type: NotificationType,
        title: &str,
        content: &str,
        related_url: &str,
        cs_post_id: i64,
    ) -> Result<(), AppError> {
        let base = PublishRequest::for_cs_post(notification_type, cs_post_id)
            .title(title)
            .content(content)
            .related_url(related_url);
        self.publish_to_users(receivers, base).await
    }
}
