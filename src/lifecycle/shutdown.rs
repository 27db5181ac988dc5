//! Stop signal shared by the signal watcher and the HTTP server.

use tokio::sync::broadcast;

/// One-shot stop signal for the proxy.
///
/// `startup::run` hands a clone to the OS signal watcher, which fires it,
/// and a receiver to `HttpServer::run`, which stops accepting connections
/// and lets in-flight script and event requests finish. Tests fire it
/// directly to stop a proxy they started.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// A receiver for `HttpServer::run`.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Ask every receiver to stop. Safe to fire more than once, or with no
    /// receivers.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_fire_the_same_signal() {
        let shutdown = Shutdown::new();
        let mut server = shutdown.subscribe();
        let watcher = shutdown.clone();

        watcher.trigger();

        assert!(server.recv().await.is_ok());
    }

    #[test]
    fn trigger_without_subscribers_is_harmless() {
        Shutdown::new().trigger();
    }
}
