use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::Notification;
use crate::publish::PublishRequest;
use crate::store::{MemberDirectory, NotificationStore};

const NOTIFICATION_COLUMNS: &str = "id, receiver_id, notification_type, title, content, \
     related_url, project_id, project_node_id, post_id, comment_id, cs_qna_id, cs_post_id, \
     sender_user_id, sender_name, sender_profile_img, read_at, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Raw row shape; `notification_type` is TEXT in the schema and parsed on
/// the way out so an unknown value surfaces as an error instead of a panic.
#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: i64,
    receiver_id: i64,
    notification_type: String,
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
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = AppError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let notification_type = row
            .notification_type
            .parse()
            .map_err(AppError::Internal)?;
        Ok(Notification {
            id: row.id,
            receiver_id: row.receiver_id,
            notification_type,
            title: row.title,
            content: row.content,
            related_url: row.related_url,
            project_id: row.project_id,
            project_node_id: row.project_node_id,
            post_id: row.post_id,
            comment_id: row.comment_id,
            cs_qna_id: row.cs_qna_id,
            cs_post_id: row.cs_post_id,
            sender_user_id: row.sender_user_id,
            sender_name: row.sender_name,
            sender_profile_img: row.sender_profile_img,
            read_at: row.read_at,
            created_at: row.created_at,
        })
    }
}

fn into_notifications(rows: Vec<NotificationRow>) -> Result<Vec<Notification>, AppError> {
    rows.into_iter().map(Notification::try_from).collect()
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn append(&self, request: &PublishRequest) -> Result<Notification, AppError> {
        let receiver_id = request.receiver_id().ok_or(AppError::MissingReceiver)?;

        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            r#"INSERT INTO project_notifications
                   (receiver_id, notification_type, title, content, related_url,
                    project_id, project_node_id, post_id, comment_id, cs_qna_id, cs_post_id,
                    sender_user_id, sender_name, sender_profile_img)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
               RETURNING {NOTIFICATION_COLUMNS}"#
        ))
        .bind(receiver_id)
        .bind(request.notification_type().as_str())
        .bind(request.title_ref())
        .bind(request.content_ref())
        .bind(request.related_url_ref())
        .bind(request.project_id_ref())
        .bind(request.project_node_id_ref())
        .bind(request.post_id_ref())
        .bind(request.comment_id_ref())
        .bind(request.cs_qna_id_ref())
        .bind(request.cs_post_id_ref())
        .bind(request.sender_user_id_ref())
        .bind(request.sender_name_ref())
        .bind(request.sender_profile_img_ref())
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn list_recent(
        &self,
        receiver_id: i64,
        limit: i64,
    ) -> Result<Vec<Notification>, AppError> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM project_notifications \
             WHERE receiver_id = $1 ORDER BY id DESC LIMIT $2"
        ))
        .bind(receiver_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        into_notifications(rows)
    }

    async fn list_after(
        &self,
        receiver_id: i64,
        after_id: i64,
    ) -> Result<Vec<Notification>, AppError> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM project_notifications \
             WHERE receiver_id = $1 AND id > $2 ORDER BY id ASC"
        ))
        .bind(receiver_id)
        .bind(after_id)
        .fetch_all(&self.pool)
        .await?;

        into_notifications(rows)
    }

    async fn unread_count(&self, receiver_id: i64) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM project_notifications \
             WHERE receiver_id = $1 AND read_at IS NULL",
        )
        .bind(receiver_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn mark_read(&self, receiver_id: i64, id: i64) -> Result<(), AppError> {
        // Only touch unread rows so the timestamp is set exactly once.
        let result = sqlx::query(
            "UPDATE project_notifications SET read_at = NOW() \
             WHERE id = $1 AND receiver_id = $2 AND read_at IS NULL",
        )
        .bind(id)
        .bind(receiver_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        // Zero rows: either already read (fine) or absent/foreign (404).
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM project_notifications \
             WHERE id = $1 AND receiver_id = $2)",
        )
        .bind(id)
        .bind(receiver_id)
        .fetch_one(&self.pool)
        .await?;

        if exists {
            Ok(())
        } else {
            Err(AppError::NotificationNotFound)
        }
    }
}

#[async_trait]
impl MemberDirectory for PgStore {
    async fn project_dev_member_ids(&self, project_id: i64) -> Result<HashSet<i64>, AppError> {
        self.ensure_project_exists(project_id).await?;

        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM project_dev_members WHERE project_id = $1",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().collect())
    }

    async fn project_client_member_ids(&self, project_id: i64) -> Result<HashSet<i64>, AppError> {
        self.ensure_project_exists(project_id).await?;

        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM project_client_members WHERE project_id = $1",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().collect())
    }

    async fn post_author_id(&self, post_id: i64) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT user_id FROM posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::PostNotFound)
    }

    async fn comment_author_id(&self, comment_id: i64) -> Result<i64, AppError> {
        sqlx::query_scalar::<_, i64>("SELECT user_id FROM post_comments WHERE id = $1")
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(AppError::CommentNotFound)
    }
}

impl PgStore {
    /// An unknown project must surface as an error, not as an empty
    /// receiver set.
    async fn ensure_project_exists(&self, project_id: i64) -> Result<(), AppError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1)")
                .bind(project_id)
                .fetch_one(&self.pool)
                .await?;

        if exists {
            Ok(())
        } else {
            Err(AppError::ProjectNotFound)
        }
    }
}
