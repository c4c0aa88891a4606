//! The accept loop.
//!
//! Runs as its own task, owns the listening socket, and spawns one
//! [`Session`] task per accepted connection. It stops when the shutdown
//! coordinator closes the listener; the socket is dropped as the loop
//! returns.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::capture::RecordSink;
use crate::config::SessionConfig;
use crate::net::connection::SessionTracker;
use crate::net::listener::{Accept, Listener};
use crate::net::session::Session;
use crate::observability::metrics;

/// Pause after a failed accept so a persistent failure (EMFILE, say)
/// does not spin the loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

pub struct Acceptor<L = Listener> {
    listener: L,
    session_config: SessionConfig,
    sink: Arc<dyn RecordSink>,
    sessions: SessionTracker,
}

impl<L: Accept> Acceptor<L> {
    pub fn new(
        listener: L,
        session_config: SessionConfig,
        sink: Arc<dyn RecordSink>,
        sessions: SessionTracker,
    ) -> Self {
        Self {
            listener,
            session_config,
            sink,
            sessions,
        }
    }

    /// Accept until `closed` flips to true (or its sender goes away).
    ///
    /// Accept errors are logged and the loop carries on; a single failed
    /// accept never stops the listener.
    pub async fn run(self, mut closed: watch::Receiver<bool>) {
        tracing::info!(
            address = %self.listener.local_addr(),
            "Accept loop started. Waiting for connections..."
        );

        loop {
            tokio::select! {
                // Prefer the close signal so no connection is accepted
                // once shutdown has started.
                biased;

                _ = wait_closed(&mut closed) => {
                    tracing::info!("Listener closed, accept loop terminating.");
                    break;
                }

                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        metrics::record_accept();
                        // Register here, before spawning, so the drain can
                        // never miss a session this loop has accepted.
                        let registration = self.sessions.register();
                        let session = Session::new(
                            stream,
                            peer,
                            &self.session_config,
                            Arc::clone(&self.sink),
                            registration,
                        );
                        tokio::spawn(session.run());
                    }
                    Err(e) => {
                        metrics::record_accept_error();
                        tracing::error!(error = %e, "Error accepting connection");
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
            }
        }

        drop(self.listener);
    }
}

/// Resolves once the close flag is set, or once the coordinator is gone.
async fn wait_closed(closed: &mut watch::Receiver<bool>) {
    let _ = closed.wait_for(|closed| *closed).await;
}
