//! Shared utilities for integration tests.

use std::sync::Arc;
use std::time::Duration;

use hello_capture::config::SessionConfig;
use hello_capture::net::Listener;
use hello_capture::{CaptureServer, MemorySink, ServerHandle};
use tokio::net::TcpListener;

/// Start a capture server on an ephemeral loopback port.
pub async fn start_capture_server(read_timeout: Duration) -> (ServerHandle, Arc<MemorySink>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let listener = Listener::from_tokio(listener).unwrap();
    let sink = Arc::new(MemorySink::new());
    let config = SessionConfig {
        read_timeout,
        buffer_size: 4096,
    };

    let handle = CaptureServer::new(config, sink.clone()).start(listener);
    (handle, sink)
}

/// Poll `condition` until it holds, failing the test after a few seconds.
pub async fn wait_until<F>(what: &str, condition: F)
where
    F: Fn() -> bool,
{
    let waited = tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "timed out waiting for {}", what);
}
