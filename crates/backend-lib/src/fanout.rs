// ============================
// crates/backend-lib/src/fanout.rs
// ============================
//! Realtime fan-out of state changes to connected clients.
//!
//! One live connection is tracked per user. Delivery is best-effort and
//! at-most-once: closed or saturated connections are skipped, never retried.
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::Utf8Bytes;
use dashmap::DashMap;
use matchday_common::{ServerEvent, UserId};
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::metrics;

/// Distinguishes successive connections of the same user
pub type ConnectionId = u64;

struct Connection {
    id: ConnectionId,
    tx: mpsc::Sender<Utf8Bytes>,
}

/// Identity to connection map with register/unregister/broadcast as its
/// only operations
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<UserId, Connection>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `tx` as the live connection for `user_id`, replacing any
    /// previous handle
    pub fn register(&self, user_id: UserId, tx: mpsc::Sender<Utf8Bytes>) -> ConnectionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Some(previous) = self.connections.insert(user_id, Connection { id, tx }) {
            tracing::info!(
                %user_id,
                replaced = previous.id,
                connection_id = id,
                "connection replaced"
            );
        }
        ::metrics::gauge!(metrics::WS_ACTIVE).set(self.connections.len() as f64);
        id
    }

    /// Forget `user_id`'s connection, but only if it is still `connection_id`;
    /// a newer connection of the same user stays registered
    pub fn unregister(&self, user_id: UserId, connection_id: ConnectionId) -> bool {
        let removed = self
            .connections
            .remove_if(&user_id, |_, conn| conn.id == connection_id)
            .is_some();
        ::metrics::gauge!(metrics::WS_ACTIVE).set(self.connections.len() as f64);
        removed
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Serialize `event` once and offer it to every open connection.
    /// Returns how many connections accepted the frame.
    pub fn broadcast(&self, event: &ServerEvent) -> usize {
        let frame = match serde_json::to_string(event) {
            Ok(json) => Utf8Bytes::from(json),
            Err(e) => {
                tracing::error!(event = event.type_tag(), error = %e, "failed to serialize event");
                return 0;
            },
        };

        let mut delivered = 0;
        let mut dropped = 0;
        for entry in self.connections.iter() {
            match entry.tx.try_send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Closed(_)) => {},
                Err(TrySendError::Full(_)) => {
                    dropped += 1;
                    tracing::debug!(user_id = %entry.key(), "client lagging, event dropped");
                },
            }
        }

        ::metrics::counter!(metrics::FANOUT_DELIVERED).increment(delivered as u64);
        if dropped > 0 {
            ::metrics::counter!(metrics::FANOUT_DROPPED).increment(dropped);
        }
        tracing::trace!(event = event.type_tag(), delivered, "event broadcast");
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use matchday_common::{Post, ServerEvent};
    use uuid::Uuid;

    fn post_event() -> ServerEvent {
        ServerEvent::NewPost(Post {
            id: Uuid::new_v4(),
            match_id: None,
            user_id: Uuid::new_v4(),
            content: "Five-a-side tonight?".to_string(),
            image_url: None,
            likes: Default::default(),
            created_at: Utc::now(),
        })
    }

    #[tokio::test]
    async fn test_broadcast_skips_closed_connections() {
        let registry = ConnectionRegistry::new();
        let (tx_a, mut rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        let (tx_c, rx_c) = mpsc::channel(4);
        registry.register(Uuid::new_v4(), tx_a);
        registry.register(Uuid::new_v4(), tx_b);
        registry.register(Uuid::new_v4(), tx_c);
        drop(rx_c);

        assert_eq!(registry.broadcast(&post_event()), 2);
        assert!(rx_a.recv().await.unwrap().as_str().contains("\"NEW_POST\""));
        assert!(rx_b.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_second_connection_replaces_first() {
        let registry = ConnectionRegistry::new();
        let user = Uuid::new_v4();
        let (old_tx, mut old_rx) = mpsc::channel(4);
        let (new_tx, mut new_rx) = mpsc::channel(4);

        let old_id = registry.register(user, old_tx);
        let new_id = registry.register(user, new_tx);
        assert_eq!(registry.len(), 1);

        // teardown of the stale connection must not evict the new one
        assert!(!registry.unregister(user, old_id));
        assert_eq!(registry.broadcast(&post_event()), 1);
        assert!(new_rx.recv().await.is_some());
        assert!(old_rx.recv().await.is_none());

        assert!(registry.unregister(user, new_id));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_full_channel_drops_instead_of_blocking() {
        let registry = ConnectionRegistry::new();
        let (tx, mut rx) = mpsc::channel(1);
        registry.register(Uuid::new_v4(), tx);

        assert_eq!(registry.broadcast(&post_event()), 1);
        assert_eq!(registry.broadcast(&post_event()), 0);
        assert!(rx.recv().await.is_some());
        assert!(rx.try_recv().is_err());
    }
}
