// MIT License - Copyright (c) 2026 The dmp-bridge developers
// Change callbacks and bridge lifecycle events

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::RwLock;

/// A change callback. Identity is the `Arc` allocation, so registering a
/// clone of the same `Arc` twice is a no-op.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Deduplicated set of callbacks invoked after every processed frame or
/// status refresh.
#[derive(Default)]
pub struct ChangeNotifier {
    callbacks: RwLock<Vec<Callback>>,
}

fn same_callback(a: &Callback, b: &Callback) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. Returns false if it was already registered.
    pub async fn register(&self, callback: Callback) -> bool {
        let mut callbacks = self.callbacks.write().await;
        if callbacks.iter().any(|c| same_callback(c, &callback)) {
            return false;
        }
        callbacks.push(callback);
        true
    }

    /// Remove a callback. Returns false if it was not registered.
    pub async fn remove(&self, callback: &Callback) -> bool {
        let mut callbacks = self.callbacks.write().await;
        let before = callbacks.len();
        callbacks.retain(|c| !same_callback(c, callback));
        callbacks.len() != before
    }

    pub async fn len(&self) -> usize {
        self.callbacks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.callbacks.read().await.is_empty()
    }

    /// Invoke every registered callback once.
    pub async fn notify(&self) {
        let callbacks = self.callbacks.read().await.clone();
        for callback in callbacks {
            callback();
        }
    }
}

/// Lifecycle events emitted by the listener.
///
/// Users subscribe via `listener.subscribe()` to receive a
/// `tokio::sync::broadcast::Receiver<BridgeEvent>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    /// A panel opened a connection to the listener
    ConnectionAccepted { peer: SocketAddr },
    /// A connection ended (peer closed, read error, or unknown account)
    ConnectionClosed { peer: SocketAddr },
    /// A frame arrived for an account with no configured panel
    UnknownAccount { account: String, peer: SocketAddr },
    /// Checkin heartbeat
    Checkin { account: String },
    /// An event telegram was decoded and applied
    EventDecoded { account: String, code: String },
    /// A status poll was folded into the panel state
    StatusRefreshed { account: String },
}

/// Type alias for the broadcast sender.
pub type EventSender = tokio::sync::broadcast::Sender<BridgeEvent>;

/// Type alias for the broadcast receiver.
pub type EventReceiver = tokio::sync::broadcast::Receiver<BridgeEvent>;

/// Create a new event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    tokio::sync::broadcast::channel(capacity)
}
