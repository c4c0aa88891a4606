//! Capture server wiring.
//!
//! Ties the listener, accept loop and shutdown coordinator together:
//! [`CaptureServer::start`] spawns the accept loop and hands back a
//! [`ServerHandle`] whose [`shutdown`](ServerHandle::shutdown) performs the
//! graceful drain.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::capture::RecordSink;
use crate::config::SessionConfig;
use crate::lifecycle::ShutdownCoordinator;
use crate::net::{Acceptor, Listener, SessionTracker};

/// Capture server, configured but not yet accepting.
pub struct CaptureServer {
    session_config: SessionConfig,
    sink: Arc<dyn RecordSink>,
}

impl CaptureServer {
    pub fn new(session_config: SessionConfig, sink: Arc<dyn RecordSink>) -> Self {
        Self { session_config, sink }
    }

    /// Spawn the accept loop on `listener`. Must be called inside a Tokio
    /// runtime.
    pub fn start(self, listener: Listener) -> ServerHandle {
        let local_addr = listener.local_addr();
        let coordinator = ShutdownCoordinator::new();

        tracing::info!(
            address = %local_addr,
            read_timeout = ?self.session_config.read_timeout,
            buffer_size = self.session_config.buffer_size,
            "Capture server starting"
        );

        let acceptor = Acceptor::new(
            listener,
            self.session_config,
            self.sink,
            coordinator.sessions().clone(),
        );
        let task = tokio::spawn(acceptor.run(coordinator.listener_closed()));

        ServerHandle {
            local_addr,
            coordinator,
            acceptor: task,
        }
    }
}

/// A running capture server.
pub struct ServerHandle {
    local_addr: SocketAddr,
    coordinator: ShutdownCoordinator,
    acceptor: JoinHandle<()>,
}

impl ServerHandle {
    /// The address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of sessions currently in flight.
    pub fn active_sessions(&self) -> u64 {
        self.coordinator.sessions().active_count()
    }

    /// A handle onto the live-set that outlives this server handle.
    pub fn sessions(&self) -> SessionTracker {
        self.coordinator.sessions().clone()
    }

    /// Stop accepting and wait for every in-flight session to finish.
    ///
    /// Consumes the handle, so the drain runs at most once.
    pub async fn shutdown(self) {
        let ServerHandle {
            coordinator,
            acceptor,
            ..
        } = self;
        coordinator.initiate_shutdown(acceptor).await;
    }
}
