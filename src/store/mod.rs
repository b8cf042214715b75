use std::collections::HashSet;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::Notification;
use crate::publish::PublishRequest;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Durable, append-only notification storage. The store is the record of
/// truth; live delivery is only an accelerant on top of it.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Persist one receiver-scoped request and return the stored row with
    /// its assigned id. Fan-out callers invoke this once per receiver.
    async fn append(&self, request: &PublishRequest) -> Result<Notification, AppError>;

    /// Most recent `limit` notifications for a receiver, newest first.
    async fn list_recent(&self, receiver_id: i64, limit: i64)
        -> Result<Vec<Notification>, AppError>;

    /// All notifications with `id > after_id`, ascending. This is the
    /// reconnect backfill primitive and must be gap-free with respect to
    /// appends that completed before the query started.
    async fn list_after(&self, receiver_id: i64, after_id: i64)
        -> Result<Vec<Notification>, AppError>;

    /// Number of stored rows for the receiver with `read_at` unset.
    async fn unread_count(&self, receiver_id: i64) -> Result<i64, AppError>;

    /// Set `read_at` once. Re-marking an already-read row is a no-op;
    /// a row that does not exist or belongs to another receiver is
    /// `NotificationNotFound`.
    async fn mark_read(&self, receiver_id: i64, id: i64) -> Result<(), AppError>;
}

/// Read-only lookups against the business domain, used to resolve the
/// receiver set for an event. Owned by the wider workhub backend; this
/// service only consumes it.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    async fn project_dev_member_ids(&self, project_id: i64) -> Result<HashSet<i64>, AppError>;

    async fn project_client_member_ids(&self, project_id: i64) -> Result<HashSet<i64>, AppError>;

    async fn post_author_id(&self, post_id: i64) -> Result<i64, AppError>;

    async fn comment_author_id(&self, comment_id: i64) -> Result<i64, AppError>;
}
