use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event kinds a notification can carry. Stored as TEXT; the wire name is
/// also the SSE event name on the live stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    ProjectCreated,
    ProjectInfoUpdated,
    ProjectMemberAdded,
    ProjectMemberRemoved,
    ProjectNodeCreated,
    ProjectNodeUpdated,
    StatusChanged,
    ReviewRequest,
    ReviewCompleted,
    ReviewRejected,
    ChecklistCreated,
    ChecklistUpdated,
    ChecklistItemStatusChanged,
    ChecklistCommentCreated,
    PostCreated,
    PostUpdated,
    PostDeleted,
    PostCommentCreated,
    CsQnaCreated,
    CsPostCreated,
    CsPostUpdated,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::ProjectCreated => "PROJECT_CREATED",
            NotificationType::ProjectInfoUpdated => "PROJECT_INFO_UPDATED",
            NotificationType::ProjectMemberAdded => "PROJECT_MEMBER_ADDED",
            NotificationType::ProjectMemberRemoved => "PROJECT_MEMBER_REMOVED",
            NotificationType::ProjectNodeCreated => "PROJECT_NODE_CREATED",
            NotificationType::ProjectNodeUpdated => "PROJECT_NODE_UPDATED",
            NotificationType::StatusChanged => "STATUS_CHANGED",
            NotificationType::ReviewRequest => "REVIEW_REQUEST",
            NotificationType::ReviewCompleted => "REVIEW_COMPLETED",
            NotificationType::ReviewRejected => "REVIEW_REJECTED",
            NotificationType::ChecklistCreated => "CHECKLIST_CREATED",
            NotificationType::ChecklistUpdated => "CHECKLIST_UPDATED",
            NotificationType::ChecklistItemStatusChanged => "CHECKLIST_ITEM_STATUS_CHANGED",
            NotificationType::ChecklistCommentCreated => "CHECKLIST_COMMENT_CREATED",
            NotificationType::PostCreated => "POST_CREATED",
            NotificationType::PostUpdated => "POST_UPDATED",
            NotificationType::PostDeleted => "POST_DELETED",
            NotificationType::PostCommentCreated => "POST_COMMENT_CREATED",
            NotificationType::CsQnaCreated => "CS_QNA_CREATED",
            NotificationType::CsPostCreated => "CS_POST_CREATED",
            NotificationType::CsPostUpdated => "CS_POST_UPDATED",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s {
            "PROJECT_CREATED" => NotificationType::ProjectCreated,
            "PROJECT_INFO_UPDATED" => NotificationType::ProjectInfoUpdated,
            "PROJECT_MEMBER_ADDED" => NotificationType::ProjectMemberAdded,
            "PROJECT_MEMBER_REMOVED" => NotificationType::ProjectMemberRemoved,
            "PROJECT_NODE_CREATED" => NotificationType::ProjectNodeCreated,
            "PROJECT_NODE_UPDATED" => NotificationType::ProjectNodeUpdated,
            "STATUS_CHANGED" => NotificationType::StatusChanged,
            "REVIEW_REQUEST" => NotificationType::ReviewRequest,
            "REVIEW_COMPLETED" => NotificationType::ReviewCompleted,
            "REVIEW_REJECTED" => NotificationType::ReviewRejected,
            "CHECKLIST_CREATED" => NotificationType::ChecklistCreated,
            "CHECKLIST_UPDATED" => NotificationType::ChecklistUpdated,
            "CHECKLIST_ITEM_STATUS_CHANGED" => NotificationType::ChecklistItemStatusChanged,
            "CHECKLIST_COMMENT_CREATED" => NotificationType::ChecklistCommentCreated,
            "POST_CREATED" => NotificationType::PostCreated,
            "POST_UPDATED" => NotificationType::PostUpdated,
            "POST_DELETED" => NotificationType::PostDeleted,
            "POST_COMMENT_CREATED" => NotificationType::PostCommentCreated,
            "CS_QNA_CREATED" => NotificationType::CsQnaCreated,
            "CS_POST_CREATED" => NotificationType::CsPostCreated,
            "CS_POST_UPDATED" => NotificationType::CsPostUpdated,
            other => anyhow::bail!("unknown notification type '{}'", other),
        };
        Ok(ty)
    }
}

/// One stored notification, owned by a single receiver. Immutable after
/// persistence except `read_at`, which is set once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub receiver_id: i64,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: Option<String>,
    pub content: Option<String>,
    pub related_url: Option<String>,
    pub project_id: Option<i64>,
    pub project_node_id: Option<i64>,
    pub post_id: Option<i64>,
    pub comment_id: Option<i64>,
    pub cs_qna_id: Option<i64>,
    pub cs_post_id: Option<i64>,
    pub sender_user_id: Option<i64>,
    pub sender_name: Option<String>,
    pub sender_profile_img: Option<String>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}
