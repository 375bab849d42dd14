//! Fan-out of game events to the set of live WebSocket connections.
//!
//! Delivery is decoupled from the sockets: each connection registers an
//! unbounded channel drained by its own forward task, so a slow client never
//! stalls the round loop. A failed send marks the client dead; dead clients
//! are collected during iteration and removed afterwards, never mid-iteration.

use crate::api::events::WsEvent;
use dashmap::DashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Outbound message queue for one connection.
pub type ClientSender = mpsc::UnboundedSender<String>;

/// Live connection registry with serialize-once broadcast.
pub struct Broadcaster {
    clients: DashMap<u64, ClientSender>,
    next_client_id: AtomicU64,
}

impl Broadcaster {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            clients: DashMap::new(),
            next_client_id: AtomicU64::new(1),
        })
    }

    /// Add a connection to the live set, returning its client id.
    pub fn register(&self, sender: ClientSender) -> u64 {
        let client_id = self.next_client_id.fetch_add(1, Ordering::SeqCst);
        self.clients.insert(client_id, sender);
        debug!("Client {} joined live set (total: {})", client_id, self.client_count());
        client_id
    }

    /// Remove a connection from the live set (disconnect or send failure).
    pub fn unregister(&self, client_id: u64) {
        if self.clients.remove(&client_id).is_some() {
            debug!("Client {} left live set (remaining: {})", client_id, self.client_count());
        }
    }

    /// Number of currently connected clients.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Send an event to every live connection.
    ///
    /// Serializes once; failures are isolated per connection and the failed
    /// connections are dropped from the set after the pass completes.
    pub fn broadcast(&self, event: &WsEvent) {
        if self.clients.is_empty() {
            return;
        }
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize broadcast event: {}", e);
                return;
            }
        };

        let mut dead = Vec::new();
        for entry in self.clients.iter() {
            if entry.value().send(payload.clone()).is_err() {
                dead.push(*entry.key());
            }
        }
        for client_id in dead {
            warn!("Dropping dead client {} during broadcast", client_id);
            self.unregister(client_id);
        }
    }

    /// Send an event to a single connection (private replies).
    pub fn send_to(&self, client_id: u64, event: &WsEvent) {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize private event: {}", e);
                return;
            }
        };
        // Drop the map guard before any removal.
        let failed = match self.clients.get(&client_id) {
            Some(sender) => sender.send(payload).is_err(),
            None => return,
        };
        if failed {
            self.unregister(client_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::events::WsEvent;

    fn tick_event() -> WsEvent {
        WsEvent::Tick {
            multiplier: 1.42,
            cashouts: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_live_clients() {
        let broadcaster = Broadcaster::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        broadcaster.register(tx1);
        broadcaster.register(tx2);

        broadcaster.broadcast(&tick_event());

        let a = rx1.recv().await.unwrap();
        let b = rx2.recv().await.unwrap();
        assert_eq!(a, b);
        assert!(a.contains("\"type\":\"tick\""));
    }

    #[tokio::test]
    async fn test_failed_client_removed_others_still_served() {
        let broadcaster = Broadcaster::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, rx2) = mpsc::unbounded_channel();
        broadcaster.register(tx1);
        broadcaster.register(tx2);
        drop(rx2); // Connection 2 is dead.

        broadcaster.broadcast(&tick_event());

        assert!(rx1.recv().await.is_some());
        assert_eq!(broadcaster.client_count(), 1);

        // A further broadcast still works against the pruned set.
        broadcaster.broadcast(&tick_event());
        assert!(rx1.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_send_to_targets_one_client() {
        let broadcaster = Broadcaster::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        let id1 = broadcaster.register(tx1);
        broadcaster.register(tx2);

        broadcaster.send_to(id1, &WsEvent::Error {
            message: "private".to_string(),
        });

        assert!(rx1.recv().await.unwrap().contains("private"));
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unregister_shrinks_live_set() {
        let broadcaster = Broadcaster::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = broadcaster.register(tx);
        assert_eq!(broadcaster.client_count(), 1);
        broadcaster.unregister(id);
        assert_eq!(broadcaster.client_count(), 0);
    }
}
