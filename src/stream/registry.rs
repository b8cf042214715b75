use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use dashmap::DashMap;
use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::errors::AppError;
use crate::models::Notification;
use crate::store::NotificationStore;

/// One frame on a live connection. Heartbeats are a separate variant (and a
/// separate SSE frame shape) so they never look like notification payload.
#[derive(Debug, Clone)]
pub enum StreamFrame {
    Notification(Notification),
    KeepAlive,
}

struct Emitter {
    /// Identifies the concrete connection behind the sender, so that
    /// teardown of a superseded connection can never evict its replacement.
    conn_id: u64,
    tx: mpsc::UnboundedSender<StreamFrame>,
}

/// Remove the entry for `receiver_id` only if it still belongs to the
/// connection identified by `conn_id`.
fn evict_if(emitters: &DashMap<i64, Emitter>, receiver_id: i64, conn_id: u64) {
    emitters.remove_if(&receiver_id, |_, emitter| emitter.conn_id == conn_id);
}

/// In-process table of receiver id → active live connection.
///
/// At most one connection per receiver: `subscribe` replaces any prior
/// entry, and dropping the superseded sender terminates the old stream.
/// `push` is best-effort; a failed send evicts the handle and the durable
/// store remains the record of truth. All operations are safe under
/// concurrent publish / subscribe / keep-alive interleaving; the map is the
/// only synchronization boundary.
pub struct EmitterRegistry {
    emitters: Arc<DashMap<i64, Emitter>>,
    next_conn_id: AtomicU64,
    store: Arc<dyn NotificationStore>,
}

impl EmitterRegistry {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self {
            emitters: Arc::new(DashMap::new()),
            next_conn_id: AtomicU64::new(1),
            store,
        }
    }

    /// Register a live connection for `receiver_id`, replacing any prior one.
    ///
    /// With a `last_event_id` cursor, stored notifications after the cursor
    /// are queued onto the new connection in ascending id order before it is
    /// registered for live pushes.
    ///
    /// TODO: a notification published between the backfill query and the
    /// registration below is delivered on neither path for this connection;
    /// closing the window needs register-first plus id-based dedup of the
    /// backfill batch.
    pub async fn subscribe(
        &self,
        receiver_id: i64,
        last_event_id: Option<i64>,
    ) -> Result<Subscription, AppError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);

        if let Some(after_id) = last_event_id {
            for notification in self.store.list_after(receiver_id, after_id).await? {
                // we hold the receiving half, so send cannot fail here
                let _ = tx.send(StreamFrame::Notification(notification));
            }
        }

        if let Some(old) = self.emitters.insert(receiver_id, Emitter { conn_id, tx }) {
            // dropping the superseded sender ends the old connection's stream
            tracing::debug!(
                receiver_id,
                old_conn_id = old.conn_id,
                new_conn_id = conn_id,
                "replaced live connection"
            );
        }

        Ok(Subscription {
            receiver_id,
            conn_id,
            inner: UnboundedReceiverStream::new(rx),
            emitters: Arc::clone(&self.emitters),
        })
    }

    /// Best-effort live push of a persisted notification. A disconnected
    /// receiver is a silent no-op; a dead connection is evicted.
    pub fn push(&self, receiver_id: i64, notification: &Notification) {
        let Some((conn_id, tx)) = self.sender_for(receiver_id) else {
            return;
        };

        if tx
            .send(StreamFrame::Notification(notification.clone()))
            .is_err()
        {
            evict_if(&self.emitters, receiver_id, conn_id);
            tracing::debug!(receiver_id, conn_id, "evicted dead connection on push");
        }
    }

    /// Send one heartbeat frame to every connected receiver, evicting any
    /// connection that no longer accepts frames. Driven by the shared
    /// keep-alive ticker in `jobs::keepalive`.
    pub fn send_keep_alive(&self) {
        if self.emitters.is_empty() {
            return;
        }

        // snapshot first: removing entries while iterating the map can
        // deadlock on the shard lock
        let snapshot: Vec<(i64, u64, mpsc::UnboundedSender<StreamFrame>)> = self
            .emitters
            .iter()
            .map(|entry| (*entry.key(), entry.conn_id, entry.tx.clone()))
            .collect();

        for (receiver_id, conn_id, tx) in snapshot {
            if tx.send(StreamFrame::KeepAlive).is_err() {
                evict_if(&self.emitters, receiver_id, conn_id);
                tracing::debug!(receiver_id, conn_id, "evicted dead connection on keep-alive");
            }
        }
    }

    /// Number of currently registered connections.
    pub fn connected_count(&self) -> usize {
        self.emitters.len()
    }

    pub fn is_connected(&self, receiver_id: i64) -> bool {
        self.emitters.contains_key(&receiver_id)
    }

    fn sender_for(&self, receiver_id: i64) -> Option<(u64, mpsc::UnboundedSender<StreamFrame>)> {
        // clone out of the guard so eviction below never runs under it
        self.emitters
            .get(&receiver_id)
            .map(|entry| (entry.conn_id, entry.tx.clone()))
    }
}

/// Receiving half of one live connection. Yields backfill frames first, then
/// live pushes and heartbeats. Dropping it (client disconnect, handler
/// timeout) synchronously evicts the registry entry.
pub struct Subscription {
    receiver_id: i64,
    conn_id: u64,
    inner: UnboundedReceiverStream<StreamFrame>,
    emitters: Arc<DashMap<i64, Emitter>>,
}

impl Stream for Subscription {
    type Item = StreamFrame;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        evict_if(&self.emitters, self.receiver_id, self.conn_id);
    }
}
