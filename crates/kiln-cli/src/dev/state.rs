//! Shared state for the dev server: what to serve and who to notify.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// The message every browser tab receives after an output change.
pub const RELOAD_MESSAGE: &str = "reload";

/// Open reload sockets, keyed by client id.
pub type ClientRegistry = Arc<RwLock<HashMap<usize, mpsc::Sender<String>>>>;

/// State shared by request handlers and the reload broadcaster.
#[derive(Debug)]
pub struct DevServerState {
    out_dir: PathBuf,
    live_reload: bool,
    clients: ClientRegistry,
    next_client_id: AtomicUsize,
}

impl DevServerState {
    /// State serving `out_dir`; `live_reload` injects the reload client into HTML.
    pub fn new(out_dir: PathBuf, live_reload: bool) -> Self {
        Self {
            out_dir,
            live_reload,
            clients: Arc::new(RwLock::new(HashMap::new())),
            next_client_id: AtomicUsize::new(0),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn live_reload(&self) -> bool {
        self.live_reload
    }

    /// Register a reload client and return its id and message receiver.
    pub fn register_client(&self) -> (usize, mpsc::Receiver<String>) {
        let id = self.next_client_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(16);
        self.clients.write().insert(id, tx);
        (id, rx)
    }

    pub fn unregister_client(&self, id: usize) {
        self.clients.write().remove(&id);
    }

    /// Send `message` to every client, pruning the ones that went away.
    ///
    /// Never waits on a client: a tab whose queue is full already has a
    /// reload pending and counts as reached. Returns how many clients were
    /// reached.
    pub fn broadcast(&self, message: &str) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();
        for (id, tx) in self.clients.read().iter() {
            match tx.try_send(message.to_string()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::debug!(client = id, "reload already pending");
                    delivered += 1;
                }
                Err(TrySendError::Closed(_)) => closed.push(*id),
            }
        }

        for id in closed {
            tracing::debug!(client = id, "pruning closed reload client");
            self.unregister_client(id);
        }
        delivered
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }
}

/// Shared state handle.
pub type SharedState = Arc<DevServerState>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_reaches_every_client() {
        let state = DevServerState::new(PathBuf::from("public"), true);
        let (_, mut a) = state.register_client();
        let (_, mut b) = state.register_client();

        assert_eq!(state.broadcast(RELOAD_MESSAGE), 2);
        assert_eq!(a.recv().await.as_deref(), Some("reload"));
        assert_eq!(b.recv().await.as_deref(), Some("reload"));
    }

    #[tokio::test]
    async fn test_closed_clients_are_pruned() {
        let state = DevServerState::new(PathBuf::from("public"), true);
        let (_, open) = state.register_client();
        let (_, closed) = state.register_client();
        drop(closed);

        assert_eq!(state.broadcast(RELOAD_MESSAGE), 1);
        assert_eq!(state.client_count(), 1);
        drop(open);
    }

    #[tokio::test]
    async fn test_stalled_client_does_not_hold_up_others() {
        let state = DevServerState::new(PathBuf::from("public"), true);
        let (_, stalled) = state.register_client();
        for _ in 0..16 {
            state.broadcast(RELOAD_MESSAGE);
        }

        let (_, mut fresh) = state.register_client();
        assert_eq!(state.broadcast(RELOAD_MESSAGE), 2);
        assert_eq!(fresh.recv().await.as_deref(), Some("reload"));
        assert_eq!(state.client_count(), 2);
        drop(stalled);
    }

    #[test]
    fn test_client_ids_are_unique() {
        let state = DevServerState::new(PathBuf::from("public"), false);
        let (a, _rx_a) = state.register_client();
        let (b, _rx_b) = state.register_client();
        assert_ne!(a, b);
        state.unregister_client(a);
        assert_eq!(state.client_count(), 1);
    }
}
