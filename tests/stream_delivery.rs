//! Integration tests for live delivery: subscription, reconnect backfill,
//! single-connection-per-receiver replacement, eviction and heartbeats.

use std::collections::HashSet;
use std::sync::Arc;

use futures::{FutureExt, StreamExt};
use workhub_notify::models::{Notification, NotificationType};
use workhub_notify::publish::{NotificationPublisher, PublishRequest};
use workhub_notify::store::{MemoryStore, NotificationStore};
use workhub_notify::stream::{EmitterRegistry, StreamFrame, Subscription};

fn fixture() -> (
    Arc<MemoryStore>,
    Arc<EmitterRegistry>,
    NotificationPublisher,
) {
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(EmitterRegistry::new(store.clone()));
    let publisher = NotificationPublisher::new(store.clone(), registry.clone());
    (store, registry, publisher)
}

async fn publish_one(publisher: &NotificationPublisher, receiver_id: i64) -> Notification {
    publisher
        .publish(
            PublishRequest::for_post(NotificationType::PostCommentCreated, 42)
                .title("new comment")
                .with_receiver(receiver_id),
        )
        .await
        .unwrap()
}

/// Pull the next frame if one is already queued, without waiting.
fn next_queued(sub: &mut Subscription) -> Option<StreamFrame> {
    sub.next().now_or_never().flatten()
}

fn as_notification(frame: StreamFrame) -> Notification {
    match frame {
        StreamFrame::Notification(n) => n,
        StreamFrame::KeepAlive => panic!("expected a notification frame, got a heartbeat"),
    }
}

mod subscribe {
    use super::*;

    /// A first-time subscriber with no cursor gets no backfill, only
    /// future live pushes.
    #[tokio::test]
    async fn no_cursor_means_no_backfill() {
        let (_, registry, publisher) = fixture();

        // rows that exist before the subscription must not be replayed
        publish_one(&publisher, 1).await;

        let mut sub = registry.subscribe(1, None).await.unwrap();
        assert!(next_queued(&mut sub).is_none());

        let pushed = publish_one(&publisher, 1).await;
        let received = as_notification(next_queued(&mut sub).expect("live push expected"));
        assert_eq!(received.id, pushed.id);
        assert_eq!(received.notification_type, NotificationType::PostCommentCreated);
    }

    #[tokio::test]
    async fn pushes_are_scoped_to_the_receiver() {
        let (_, registry, publisher) = fixture();

        let mut sub_1 = registry.subscribe(1, None).await.unwrap();
        let mut sub_2 = registry.subscribe(2, None).await.unwrap();

        publish_one(&publisher, 2).await;

        assert!(next_queued(&mut sub_1).is_none());
        assert!(next_queued(&mut sub_2).is_some());
    }

    /// Publishing to a receiver with no connection stores the row and
    /// otherwise does nothing.
    #[tokio::test]
    async fn push_while_disconnected_is_a_silent_no_op() {
        let (store, registry, publisher) = fixture();

        let saved = publish_one(&publisher, 1).await;

        assert!(!registry.is_connected(1));
        assert_eq!(store.list_recent(1, 10).await.unwrap()[0].id, saved.id);
    }
}

mod backfill {
    use super::*;

    /// With stored ids {3,4,5} and a cursor of 2, the client receives
    /// exactly 3,4,5 in ascending order before anything published later.
    #[tokio::test]
    async fn replays_everything_after_the_cursor_in_order() {
        let (_, registry, publisher) = fixture();

        let mut stored = Vec::new();
        for _ in 0..5 {
            stored.push(publish_one(&publisher, 1).await.id);
        }

        let mut sub = registry.subscribe(1, Some(stored[1])).await.unwrap();

        let live = publish_one(&publisher, 1).await;

        let mut received = Vec::new();
        while let Some(frame) = next_queued(&mut sub) {
            received.push(as_notification(frame).id);
        }
        assert_eq!(received, vec![stored[2], stored[3], stored[4], live.id]);
    }

    #[tokio::test]
    async fn cursor_at_head_replays_nothing() {
        let (_, registry, publisher) = fixture();

        let last = publish_one(&publisher, 1).await;
        let mut sub = registry.subscribe(1, Some(last.id)).await.unwrap();

        assert!(next_queued(&mut sub).is_none());
    }

    /// Connection killed mid-session: a row published during the gap is
    /// stored, and the reconnect with the stale cursor replays it.
    #[tokio::test]
    async fn reconnect_recovers_rows_published_during_the_gap() {
        let (store, registry, publisher) = fixture();

        let before_gap = publish_one(&publisher, 1).await;
        let sub = registry.subscribe(1, None).await.unwrap();
        drop(sub); // connection dies

        let during_gap = publish_one(&publisher, 1).await;
        assert_eq!(store.unread_count(1).await.unwrap(), 2);

        let mut sub = registry.subscribe(1, Some(before_gap.id)).await.unwrap();
        let replayed = as_notification(next_queued(&mut sub).expect("backfill expected"));
        assert_eq!(replayed.id, during_gap.id);
        assert!(next_queued(&mut sub).is_none(), "no duplicates");
    }
}

mod replacement {
    use super::*;

    /// Last registration wins: the superseded connection terminates and
    /// receives nothing further.
    #[tokio::test]
    async fn second_subscription_supersedes_the_first() {
        let (_, registry, publisher) = fixture();

        let mut old = registry.subscribe(1, None).await.unwrap();
        let mut new = registry.subscribe(1, None).await.unwrap();
        assert_eq!(registry.connected_count(), 1);

        let pushed = publish_one(&publisher, 1).await;

        // the old stream has ended; its sender was dropped on replacement
        assert!(matches!(old.next().now_or_never(), Some(None)));
        let received = as_notification(next_queued(&mut new).expect("new connection delivers"));
        assert_eq!(received.id, pushed.id);
    }

    /// Tearing down a superseded connection must not evict its replacement.
    #[tokio::test]
    async fn stale_teardown_does_not_evict_the_replacement() {
        let (_, registry, publisher) = fixture();

        let old = registry.subscribe(1, None).await.unwrap();
        let mut new = registry.subscribe(1, None).await.unwrap();

        drop(old);
        assert!(registry.is_connected(1));

        publish_one(&publisher, 1).await;
        assert!(next_queued(&mut new).is_some());
    }
}

mod eviction {
    use super::*;

    /// Dropping the subscription (client disconnect, handler timeout)
    /// synchronously removes the registry entry.
    #[tokio::test]
    async fn dropping_the_subscription_evicts_immediately() {
        let (_, registry, _) = fixture();

        let sub = registry.subscribe(1, None).await.unwrap();
        assert!(registry.is_connected(1));

        drop(sub);
        assert!(!registry.is_connected(1));
        assert_eq!(registry.connected_count(), 0);
    }
}

mod keep_alive {
    use super::*;

    /// Heartbeats reach every connected receiver and are structurally
    /// distinct from notification frames.
    #[tokio::test]
    async fn heartbeat_is_not_a_notification_frame() {
        let (_, registry, publisher) = fixture();

        let mut sub = registry.subscribe(1, None).await.unwrap();

        registry.send_keep_alive();
        publish_one(&publisher, 1).await;
        registry.send_keep_alive();

        assert!(matches!(next_queued(&mut sub), Some(StreamFrame::KeepAlive)));
        assert!(matches!(
            next_queued(&mut sub),
            Some(StreamFrame::Notification(_))
        ));
        assert!(matches!(next_queued(&mut sub), Some(StreamFrame::KeepAlive)));
    }

    #[tokio::test]
    async fn sweep_skips_an_empty_registry() {
        let (_, registry, _) = fixture();
        // nothing registered; the sweep must not panic or register anything
        registry.send_keep_alive();
        assert_eq!(registry.connected_count(), 0);
    }
}

mod ordering {
    use super::*;

    /// Backfill plus live forwarding yields one gap-free, duplicate-free,
    /// ascending sequence for a reconnecting receiver.
    #[tokio::test]
    async fn backfill_then_live_is_one_total_order() {
        let (_, registry, publisher) = fixture();
        let receivers = HashSet::from([1]);

        for _ in 0..3 {
            publisher
                .publish_to_users(
                    &receivers,
                    PublishRequest::for_post(NotificationType::PostCreated, 9).title("stored"),
                )
                .await
                .unwrap();
        }

        let mut sub = registry.subscribe(1, Some(0)).await.unwrap();
        for _ in 0..2 {
            publish_one(&publisher, 1).await;
        }

        let mut ids = Vec::new();
        while let Some(frame) = next_queued(&mut sub) {
            ids.push(as_notification(frame).id);
        }
        assert_eq!(ids.len(), 5);
        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1], "expected strictly ascending ids");
        }
    }
}
