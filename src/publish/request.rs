use crate::errors::AppError;
use crate::models::NotificationType;

/// Validated description of one notification to deliver.
///
/// Constructed through one of the `for_*` factories, each of which pins
/// exactly one related-entity id; descriptive fields are filled in through
/// chained setters. The fan-out path derives per-receiver copies with
/// [`PublishRequest::with_receiver`] without touching the related-entity
/// shape again.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    receiver_id: Option<i64>,
    notification_type: NotificationType,
    title: Option<String>,
    content: Option<String>,
    related_url: Option<String>,
    project_id: Option<i64>,
    project_node_id: Option<i64>,
    post_id: Option<i64>,
    comment_id: Option<i64>,
    cs_qna_id: Option<i64>,
    cs_post_id: Option<i64>,
    sender_user_id: Option<i64>,
    sender_name: Option<String>,
    sender_profile_img: Option<String>,
}

impl PublishRequest {
    fn new(notification_type: NotificationType) -> Self {
        Self {
            receiver_id: None,
            notification_type,
            title: None,
            content: None,
            related_url: None,
            project_id: None,
            project_node_id: None,
            post_id: None,
            comment_id: None,
            cs_qna_id: None,
            cs_post_id: None,
            sender_user_id: None,
            sender_name: None,
            sender_profile_img: None,
        }
    }

    /// Project-related notification.
    pub fn for_project(notification_type: NotificationType, project_id: i64) -> Self {
        let mut req = Self::new(notification_type);
        req.project_id = Some(project_id);
        req
    }

    /// Project-node-related notification.
    pub fn for_project_node(notification_type: NotificationType, project_node_id: i64) -> Self {
        let mut req = Self::new(notification_type);
        req.project_node_id = Some(project_node_id);
        req
    }

    /// Post-related notification.
    pub fn for_post(notification_type: NotificationType, post_id: i64) -> Self {
        let mut req = Self::new(notification_type);
        req.post_id = Some(post_id);
        req
    }

    /// Comment-related notification.
    pub fn for_comment(notification_type: NotificationType, comment_id: i64) -> Self {
        let mut req = Self::new(notification_type);
        req.comment_id = Some(comment_id);
        req
    }

    /// CS QnA-related notification.
    pub fn for_cs_qna(notification_type: NotificationType, cs_qna_id: i64) -> Self {
        let mut req = Self::new(notification_type);
        req.cs_qna_id = Some(cs_qna_id);
        req
    }

    /// CS post-related notification.
    pub fn for_cs_post(notification_type: NotificationType, cs_post_id: i64) -> Self {
        let mut req = Self::new(notification_type);
        req.cs_post_id = Some(cs_post_id);
        req
    }

    // Chained setters for the descriptive payload.

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn related_url(mut self, related_url: impl Into<String>) -> Self {
        self.related_url = Some(related_url.into());
        self
    }

    pub fn sender(mut self, sender_user_id: i64) -> Self {
        self.sender_user_id = Some(sender_user_id);
        self
    }

    pub fn sender_name(mut self, sender_name: impl Into<String>) -> Self {
        self.sender_name = Some(sender_name.into());
        self
    }

    pub fn sender_profile_img(mut self, sender_profile_img: impl Into<String>) -> Self {
        self.sender_profile_img = Some(sender_profile_img.into());
        self
    }

    // Related-id setters kept for parity with the factories; setting a second
    // related id makes `validate` fail, which is the point of having it.

    pub fn project_id(mut self, project_id: i64) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn project_node_id(mut self, project_node_id: i64) -> Self {
        self.project_node_id = Some(project_node_id);
        self
    }

    pub fn post_id(mut self, post_id: i64) -> Self {
        self.post_id = Some(post_id);
        self
    }

    pub fn comment_id(mut self, comment_id: i64) -> Self {
        self.comment_id = Some(comment_id);
        self
    }

    pub fn cs_qna_id(mut self, cs_qna_id: i64) -> Self {
        self.cs_qna_id = Some(cs_qna_id);
        self
    }

    pub fn cs_post_id(mut self, cs_post_id: i64) -> Self {
        self.cs_post_id = Some(cs_post_id);
        self
    }

    /// Derive a copy scoped to one receiver. The related-entity shape is
    /// carried over verbatim, so no revalidation is needed.
    pub fn with_receiver(&self, receiver_id: i64) -> Self {
        let mut copy = self.clone();
        copy.receiver_id = Some(receiver_id);
        copy
    }

    /// The persistence invariant: exactly one related-entity id must be set.
    /// Violations are caller bugs and must fail before any store write.
    pub fn validate(&self) -> Result<(), AppError> {
        let count = self.related_entity_count();
        if count != 1 {
            return Err(AppError::InvalidRelatedEntityCount(count));
        }
        Ok(())
    }

    fn related_entity_count(&self) -> usize {
        [
            self.project_id,
            self.project_node_id,
            self.post_id,
            self.comment_id,
            self.cs_qna_id,
            self.cs_post_id,
        ]
        .iter()
        .filter(|id| id.is_some())
        .count()
    }

    // Accessors used by the stores.

    pub fn receiver_id(&self) -> Option<i64> {
        self.receiver_id
    }

    pub fn notification_type(&self) -> NotificationType {
        self.notification_type
    }

    pub fn title_ref(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn content_ref(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn related_url_ref(&self) -> Option<&str> {
        self.related_url.as_deref()
    }

    pub fn project_id_ref(&self) -> Option<i64> {
        self.project_id
    }

    pub fn project_node_id_ref(&self) -> Option<i64> {
        self.project_node_id
    }

    pub fn post_id_ref(&self) -> Option<i64> {
        self.post_id
    }

    pub fn comment_id_ref(&self) -> Option<i64> {
        self.comment_id
    }

    pub fn cs_qna_id_ref(&self) -> Option<i64> {
        self.cs_qna_id
    }

    pub fn cs_post_id_ref(&self) -> Option<i64> {
        self.cs_post_id
    }

    pub fn sender_user_id_ref(&self) -> Option<i64> {
        self.sender_user_id
    }

    pub fn sender_name_ref(&self) -> Option<&str> {
        self.sender_name.as_deref()
    }

    pub fn sender_profile_img_ref(&self) -> Option<&str> {
        self.sender_profile_img.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factories_pin_exactly_one_related_entity() {
        let requests = [
            PublishRequest::for_project(NotificationType::ProjectCreated, 1),
            PublishRequest::for_project_node(NotificationType::ProjectNodeUpdated, 2),
            PublishRequest::for_post(NotificationType::PostCreated, 3),
            PublishRequest::for_comment(NotificationType::PostCommentCreated, 4),
            PublishRequest::for_cs_qna(NotificationType::CsQnaCreated, 5),
            PublishRequest::for_cs_post(NotificationType::CsPostCreated, 6),
        ];
        for req in &requests {
            assert!(req.validate().is_ok());
        }
    }

    #[test]
    fn second_related_id_fails_validation() {
        let req = PublishRequest::for_post(NotificationType::PostCommentCreated, 42).comment_id(7);
        match req.validate() {
            Err(AppError::InvalidRelatedEntityCount(2)) => {}
            other => panic!("expected InvalidRelatedEntityCount(2), got {:?}", other),
        }
    }

    #[test]
    fn with_receiver_preserves_payload_and_shape() {
        let base = PublishRequest::for_post(NotificationType::PostCommentCreated, 42)
            .title("new comment")
            .content("someone replied")
            .related_url("/projects/1/posts/42")
            .sender(9);

        let scoped = base.with_receiver(3);
        assert_eq!(scoped.receiver_id(), Some(3));
        assert_eq!(scoped.post_id_ref(), Some(42));
        assert_eq!(scoped.title_ref(), Some("new comment"));
        assert_eq!(scoped.sender_user_id_ref(), Some(9));
        assert!(scoped.validate().is_ok());
        // the template itself stays receiver-free
        assert_eq!(base.receiver_id(), None);
    }
}
