//! Shutdown coordination.
//!
//! Drain order: close the listener, wait for the accept loop to exit, then
//! wait for every registered session to finish. Closing first means no new
//! registrations can appear while the drain waits, so the wait cannot hang
//! on a session that will never exist.

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::net::connection::SessionTracker;

/// Coordinator for graceful shutdown.
#[derive(Debug)]
pub struct ShutdownCoordinator {
    /// `true` once the listener has been told to close.
    closed_tx: watch::Sender<bool>,
    sessions: SessionTracker,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (closed_tx, _) = watch::channel(false);
        Self {
            closed_tx,
            sessions: SessionTracker::new(),
        }
    }

    /// Receiver the accept loop watches for the close signal. Late
    /// subscribers still observe a close that already happened.
    pub fn listener_closed(&self) -> watch::Receiver<bool> {
        self.closed_tx.subscribe()
    }

    /// The live-set of sessions.
    pub fn sessions(&self) -> &SessionTracker {
        &self.sessions
    }

    /// Tell the accept loop to close the listener. Returns `false` if it
    /// had already been told.
    pub fn close_listener(&self) -> bool {
        !self.closed_tx.send_replace(true)
    }

    /// Close the listener, wait for the accept loop to exit, then wait for
    /// every in-flight session to finish.
    ///
    /// In-flight reads are not cancelled, so this can take up to one read
    /// timeout after the last byte a peer sends.
    pub async fn initiate_shutdown(&self, acceptor: JoinHandle<()>) {
        tracing::info!("Closing listener to stop accepting new connections...");
        self.close_listener();

        if let Err(e) = acceptor.await {
            // The loop is gone either way; the listener went with it.
            tracing::error!(error = %e, "Accept loop task failed");
        }

        tracing::info!(
            active_sessions = self.sessions.active_count(),
            "Waiting for active connections to finish..."
        );
        self.sessions.wait_for_drain().await;

        tracing::info!("All connections finished.");
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
