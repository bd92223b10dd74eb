use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use chrono::Utc;
use smartsense_core::reading::Envelope;
use smartsense_core::types::Timestamp;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// Channel sender half for pushing messages to an observer's connection.
pub type ObserverSender = mpsc::UnboundedSender<Message>;

/// Handle identifying one registered observer.
///
/// Only [`BroadcastHub::register`] creates handles, so every entry in the
/// hub is one it issued itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(Uuid);

impl std::fmt::Display for ObserverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered observer.
struct Observer {
    /// Channel sender for outbound messages to this observer.
    sender: ObserverSender,
    /// When this observer was registered.
    connected_at: Timestamp,
}

/// Fans envelopes out to every live observer.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application. The hub holds only the sending half of
/// each observer's channel: the connection task owns the socket and is
/// responsible for calling [`unregister`](Self::unregister) when it closes.
pub struct BroadcastHub {
    observers: RwLock<HashMap<ObserverId, Observer>>,
}

impl BroadcastHub {
    /// Create a new, empty hub.
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new observer.
    ///
    /// Returns the observer's handle and the receiver half of its message
    /// channel. Only envelopes broadcast after this call are delivered.
    pub async fn register(&self) -> (ObserverId, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = ObserverId(Uuid::new_v4());
        let observer = Observer {
            sender: tx,
            connected_at: Utc::now(),
        };
        self.observers.write().await.insert(id, observer);
        (id, rx)
    }

    /// Remove an observer. Removing an unknown or already removed handle is
    /// a no-op.
    pub async fn unregister(&self, id: &ObserverId) {
        if let Some(observer) = self.observers.write().await.remove(id) {
            let connected_for = Utc::now() - observer.connected_at;
            tracing::debug!(
                observer_id = %id,
                connected_secs = connected_for.num_seconds(),
                "Observer unregistered"
            );
        }
    }

    /// Serialize an envelope once and deliver it to every observer.
    ///
    /// Returns the number of observers the envelope was handed to.
    pub async fn broadcast(&self, envelope: &Envelope) -> usize {
        match envelope.to_json() {
            Ok(json) => self.send_all(Message::Text(json.into())).await,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize envelope");
                0
            }
        }
    }

    /// Deliver a message to every observer registered when the call began.
    ///
    /// The observer set is snapshotted under the read lock and the lock is
    /// released before sending, so concurrent register/unregister calls
    /// never block on or disturb the pass. A failed delivery (the observer's
    /// receiver is gone) is logged and skipped; the observer stays
    /// registered until its connection task removes it.
    pub async fn send_all(&self, message: Message) -> usize {
        let snapshot: Vec<(ObserverId, ObserverSender)> = self
            .observers
            .read()
            .await
            .iter()
            .map(|(id, observer)| (*id, observer.sender.clone()))
            .collect();

        let mut delivered = 0;
        for (id, sender) in snapshot {
            match sender.send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(_) => {
                    tracing::debug!(observer_id = %id, "Delivery to observer failed, channel closed");
                }
            }
        }
        delivered
    }

    /// Return the current number of registered observers.
    pub async fn observer_count(&self) -> usize {
        self.observers.read().await.len()
    }

    /// Send a Close frame to every observer, then clear the set.
    ///
    /// Used during graceful shutdown to notify all clients before the
    /// server stops accepting new connections.
    pub async fn shutdown_all(&self) {
        let mut observers = self.observers.write().await;
        let count = observers.len();
        for observer in observers.values() {
            let _ = observer.sender.send(Message::Close(None));
        }
        observers.clear();
        tracing::info!(count, "Closed all observer connections");
    }

    /// Send a Ping frame to every observer.
    ///
    /// Used by the heartbeat task to keep connections alive and detect
    /// stale ones.
    pub async fn ping_all(&self) {
        self.send_all(Message::Ping(Bytes::new())).await;
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}
