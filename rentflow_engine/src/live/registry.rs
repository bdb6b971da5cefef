use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
        Mutex,
    },
};

use log::*;
use rf_common::WalletAddress;
use tokio::sync::mpsc;

use crate::live::PushMessage;

/// Identifies one registered handle, so that a disconnect for a superseded connection does not
/// tear down its replacement.
pub type LiveHandleId = u64;

#[derive(Clone)]
struct ClientHandle {
    id: LiveHandleId,
    sender: mpsc::Sender<PushMessage>,
}

/// The user → live-connection mapping.
///
/// At most one handle per recipient: a second `register` for the same address supersedes the
/// first. The superseded handle is not closed, just no longer targeted; its eventual disconnect
/// arrives as an `unregister` that matches nothing.
///
/// Absence of a connection is the normal path, not an error. `push` reports delivery as a bool
/// purely for logging; callers must not treat `false` as a failure.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    next_id: AtomicU64,
    connections: Mutex<HashMap<WalletAddress, ClientHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live handle for the recipient, replacing any existing one. Returns the handle
    /// id to pass to [`ConnectionRegistry::unregister`] on disconnect.
    pub fn register(&self, recipient: WalletAddress, sender: mpsc::Sender<PushMessage>) -> LiveHandleId {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let mut connections = self.inner.connections.lock().expect("connection registry poisoned");
        if let Some(old) = connections.insert(recipient.clone(), ClientHandle { id, sender }) {
            debug!("📡️ {recipient} re-identified. Handle #{} superseded by #{id}", old.id);
        } else {
            debug!("📡️ {recipient} identified with handle #{id}");
        }
        id
    }

    /// Remove the mapping that owns this handle. A no-op if the handle was already superseded or
    /// never registered.
    pub fn unregister(&self, handle_id: LiveHandleId) {
        let mut connections = self.inner.connections.lock().expect("connection registry poisoned");
        let owner = connections.iter().find(|(_, handle)| handle.id == handle_id).map(|(addr, _)| addr.clone());
        match owner {
            Some(addr) => {
                connections.remove(&addr);
                debug!("📡️ {addr} disconnected (handle #{handle_id})");
            },
            None => trace!("📡️ Handle #{handle_id} was already superseded. Nothing to unregister."),
        }
    }

    /// Push to the recipient's live connection, if any. The recipient disconnecting between
    /// lookup and send is indistinguishable from having no connection, and treated the same way.
    pub fn push(&self, recipient: &WalletAddress, message: PushMessage) -> bool {
        let handle = {
            let connections = self.inner.connections.lock().expect("connection registry poisoned");
            connections.get(recipient).cloned()
        };
        match handle {
            Some(handle) => match handle.sender.try_send(message) {
                Ok(()) => true,
                Err(e) => {
                    debug!("📡️ Handle #{} for {recipient} is gone or backlogged ({e}). Dropping push.", handle.id);
                    false
                },
            },
            None => {
                trace!("📡️ No live connection for {recipient}. They'll catch up on their next poll.");
                false
            },
        }
    }

    /// Push to every live connection. Used for non-critical events that are discoverable by other
    /// means; nothing is persisted per-recipient.
    pub fn broadcast(&self, message: PushMessage) -> usize {
        let handles: Vec<ClientHandle> = {
            let connections = self.inner.connections.lock().expect("connection registry poisoned");
            connections.values().cloned().collect()
        };
        let mut delivered = 0;
        for handle in handles {
            if handle.sender.try_send(message.clone()).is_ok() {
                delivered += 1;
            }
        }
        trace!("📡️ Broadcast '{}' delivered to {delivered} clients", message.event);
        delivered
    }

    pub fn connected_count(&self) -> usize {
        self.inner.connections.lock().expect("connection registry poisoned").len()
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn addr(tail: u8) -> WalletAddress {
        format!("0x{:040x}", tail).parse().unwrap()
    }

    fn msg(event: &str) -> PushMessage {
        PushMessage::new(event, json!({}))
    }

    #[tokio::test]
    async fn second_registration_supersedes_the_first() {
        let registry = ConnectionRegistry::new();
        let (tx_a, mut rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        registry.register(addr(1), tx_a);
        registry.register(addr(1), tx_b);
        assert_eq!(registry.connected_count(), 1);

        assert!(registry.push(&addr(1), msg("hello")));
        assert_eq!(rx_b.recv().await.unwrap().event, "hello");
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn unregister_of_superseded_handle_is_a_noop() {
        let registry = ConnectionRegistry::new();
        let (tx_a, _rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        let old = registry.register(addr(1), tx_a);
        registry.register(addr(1), tx_b);

        // The old connection's disconnect arrives late; B must stay registered.
        registry.unregister(old);
        assert_eq!(registry.connected_count(), 1);
        assert!(registry.push(&addr(1), msg("still-here")));
        assert_eq!(rx_b.recv().await.unwrap().event, "still-here");
    }

    #[tokio::test]
    async fn push_to_dropped_receiver_is_absorbed() {
        let registry = ConnectionRegistry::new();
        let (tx, rx) = mpsc::channel(4);
        registry.register(addr(2), tx);
        drop(rx);
        assert!(!registry.push(&addr(2), msg("lost")));
    }

    #[tokio::test]
    async fn push_without_connection_is_the_normal_path() {
        let registry = ConnectionRegistry::new();
        assert!(!registry.push(&addr(3), msg("nobody-home")));
    }

    #[tokio::test]
    async fn broadcast_reaches_every_connection() {
        let registry = ConnectionRegistry::new();
        let (tx_a, mut rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);
        registry.register(addr(1), tx_a);
        registry.register(addr(2), tx_b);
        assert_eq!(registry.broadcast(msg("newProperty")), 2);
        assert_eq!(rx_a.recv().await.unwrap().event, "newProperty");
        assert_eq!(rx_b.recv().await.unwrap().event, "newProperty");
    }
}
