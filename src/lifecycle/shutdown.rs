//! Shutdown trigger shared by the signal listener and the supervisor.

use tokio::sync::broadcast;

/// Cloneable shutdown trigger.
///
/// Backed by a broadcast channel of capacity 1: a trigger that happens before the
/// subscriber starts waiting stays buffered, so it is never lost.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe before anything may call [`trigger`](Self::trigger).
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Request shutdown. Triggering more than once is harmless.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
