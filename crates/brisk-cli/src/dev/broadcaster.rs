//! Reload broadcaster.
//!
//! Keeps a non-owning registry of push-channel clients. Each client is the
//! sending half of a bounded channel drained by its SSE stream; dropping the
//! stream closes the channel, and the next broadcast notices.

use crate::dev::markup::RELOAD_TOKEN;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Messages a slow client may have queued before it counts as dead.
const CLIENT_BUFFER: usize = 16;

/// Why a send to a client failed. Never propagated; the client is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("client disconnected")]
    Closed,
    #[error("client is not draining its channel")]
    Full,
}

impl<T> From<mpsc::error::TrySendError<T>> for TransportError {
    fn from(err: mpsc::error::TrySendError<T>) -> Self {
        match err {
            mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
            mpsc::error::TrySendError::Full(_) => TransportError::Full,
        }
    }
}

/// Registry of connected reload clients.
#[derive(Debug, Default)]
pub struct ReloadBroadcaster {
    clients: RwLock<HashMap<usize, mpsc::Sender<String>>>,
    next_id: AtomicUsize,
    broadcasts: AtomicU64,
}

impl ReloadBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client. The receiver yields every reload token sent after
    /// this call.
    pub fn register(&self) -> (usize, mpsc::Receiver<String>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(CLIENT_BUFFER);
        self.clients.write().insert(id, tx);
        tracing::debug!("Reload client {} connected", id);
        (id, rx)
    }

    /// Register a client whose registration ends when the guard drops.
    pub fn connect(self: &Arc<Self>) -> (ClientGuard, mpsc::Receiver<String>) {
        let (id, rx) = self.register();
        (
            ClientGuard {
                id,
                broadcaster: Arc::clone(self),
            },
            rx,
        )
    }

    pub fn unregister(&self, id: usize) {
        if self.clients.write().remove(&id).is_some() {
            tracing::debug!("Reload client {} disconnected", id);
        }
    }

    /// Send the reload token to every registered client.
    ///
    /// A client whose send fails is removed. Returns how many clients
    /// received the token.
    pub fn broadcast(&self) -> usize {
        self.broadcasts.fetch_add(1, Ordering::Relaxed);

        let mut failed = Vec::new();
        let mut delivered = 0;
        {
            let clients = self.clients.read();
            for (id, tx) in clients.iter() {
                match tx.try_send(RELOAD_TOKEN.to_string()) {
                    Ok(()) => delivered += 1,
                    Err(err) => failed.push((*id, TransportError::from(err))),
                }
            }
        }

        if !failed.is_empty() {
            let mut clients = self.clients.write();
            for (id, reason) in failed {
                tracing::debug!("Dropping reload client {}: {}", id, reason);
                clients.remove(&id);
            }
        }

        tracing::debug!("Reload broadcast delivered to {} client(s)", delivered);
        delivered
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    /// Number of broadcasts sent since startup.
    pub fn broadcast_count(&self) -> u64 {
        self.broadcasts.load(Ordering::Relaxed)
    }
}

/// Unregisters its client on drop.
#[derive(Debug)]
pub struct ClientGuard {
    id: usize,
    broadcaster: Arc<ReloadBroadcaster>,
}

impl ClientGuard {
    pub fn id(&self) -> usize {
        self.id
    }
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        self.broadcaster.unregister(self.id);
    }
}
