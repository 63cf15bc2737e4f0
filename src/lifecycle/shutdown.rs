//! Shutdown coordination.

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// The HTTP server and background probes each hold a receiver; a single
/// trigger stops all of them.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// A future that resolves once shutdown is triggered.
    pub fn signalled(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.subscribe();
        async move {
            // A closed channel also means shutdown
            let _ = rx.recv().await;
        }
    }

    /// Trigger the shutdown signal.
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
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_wakes_subscribers() {
        let shutdown = Shutdown::new();
        let first = tokio::spawn(shutdown.signalled());
        let second = tokio::spawn(shutdown.signalled());

        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(1), async {
            first.await.unwrap();
            second.await.unwrap();
        })
        .await
        .expect("subscribers should be released");
    }

    #[tokio::test]
    async fn test_dropping_coordinator_releases_waiters() {
        let shutdown = Shutdown::new();
        let waiter = shutdown.signalled();
        drop(shutdown);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("closed channel should resolve");
    }
}
