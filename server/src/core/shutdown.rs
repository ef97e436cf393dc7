//! Coordinated shutdown for the server and its background tasks

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

use super::constants::SHUTDOWN_TIMEOUT_SECS;

/// Shared shutdown switch
///
/// One instance is cloned everywhere a task needs to learn about shutdown.
/// Flipping the switch wakes every subscriber; `shutdown()` additionally
/// waits, with a deadline, for the tracked background tasks. Resources that
/// own connections close themselves once `shutdown()` returns.
#[derive(Clone)]
pub struct ShutdownService {
    signal: Arc<watch::Sender<bool>>,
    watcher: watch::Receiver<bool>,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl ShutdownService {
    pub fn new() -> Self {
        let (signal, watcher) = watch::channel(false);
        Self {
            signal: Arc::new(signal),
            watcher,
            tasks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Track a background task so `shutdown()` waits for it
    pub async fn register(&self, task: JoinHandle<()>) {
        self.tasks.lock().await.push(task);
    }

    /// A receiver that flips to `true` on shutdown
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.watcher.clone()
    }

    /// Flip the switch
    pub fn trigger(&self) {
        let _ = self.signal.send(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.watcher.borrow()
    }

    /// Flip the switch, then wait for tracked tasks until the deadline
    pub async fn shutdown(&self) {
        tracing::debug!("Beginning graceful shutdown");
        self.trigger();

        let tasks = std::mem::take(&mut *self.tasks.lock().await);
        tracing::debug!(count = tasks.len(), "Draining background tasks");

        let budget = Duration::from_secs(SHUTDOWN_TIMEOUT_SECS);
        if tokio::time::timeout(budget, futures::future::join_all(tasks))
            .await
            .is_err()
        {
            tracing::warn!(
                timeout_secs = budget.as_secs(),
                "Background tasks still running at the shutdown deadline"
            );
        }

        tracing::debug!("Shutdown complete");
    }

    /// An owned future that resolves on shutdown, for axum's graceful_shutdown
    pub fn wait(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut watcher = self.watcher.clone();
        async move {
            let _ = watcher.wait_for(|&flag| flag).await;
        }
    }

    /// Trip the switch on Ctrl+C or SIGTERM
    pub fn install_signal_handlers(&self) {
        let switch = self.clone();
        tokio::spawn(async move {
            let interrupt = async {
                tokio::signal::ctrl_c()
                    .await
                    .expect("Ctrl+C handler installation failed");
            };

            #[cfg(unix)]
            let terminate = async {
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("SIGTERM handler installation failed")
                    .recv()
                    .await;
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = interrupt => tracing::debug!("Ctrl+C received"),
                _ = terminate => tracing::debug!("SIGTERM received"),
            }

            switch.trigger();
        });
    }
}

impl Default for ShutdownService {
    fn default() -> Self {
        Self::new()
    }
}
