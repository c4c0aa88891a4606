//! TCP listener implementation.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Accept incoming TCP connections
//! - Report bind and accept failures as distinct errors

use std::future::Future;
use std::io;
use std::net::SocketAddr;

use thiserror::Error;
use tokio::io::AsyncRead;
use tokio::net::{TcpListener, TcpStream};

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
    /// Failed to accept connection.
    #[error("Failed to accept: {0}")]
    Accept(#[source] io::Error),
}

/// The listening socket. Owned by the accept loop; dropping it closes the
/// socket.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Bind to the configured address.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let bind_error = |source: io::Error| ListenerError::Bind {
            address: config.bind_address.clone(),
            source,
        };

        let addr = config
            .socket_addr()
            .map_err(|e| bind_error(io::Error::new(io::ErrorKind::InvalidInput, e)))?;

        let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
        let listener = Self::from_tokio(listener).map_err(bind_error)?;

        tracing::info!(address = %listener.local_addr, "TCP listener started");
        Ok(listener)
    }

    /// Wrap an already-bound Tokio listener.
    pub fn from_tokio(inner: TcpListener) -> io::Result<Self> {
        let local_addr = inner.local_addr()?;
        Ok(Self { inner, local_addr })
    }

    /// Accept a new connection.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), ListenerError> {
        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;
        tracing::debug!(peer_addr = %addr, "Connection accepted");
        Ok((stream, addr))
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

/// A source of accepted connections for the accept loop.
pub trait Accept: Send + Sync + 'static {
    type Stream: AsyncRead + Unpin + Send + 'static;

    /// Wait for the next connection.
    fn accept(&self) -> impl Future<Output = Result<(Self::Stream, SocketAddr), ListenerError>> + Send;

    fn local_addr(&self) -> SocketAddr;
}

impl Accept for Listener {
    type Stream = TcpStream;

    fn accept(&self) -> impl Future<Output = Result<(TcpStream, SocketAddr), ListenerError>> + Send {
        Listener::accept(self)
    }

    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binds_ephemeral_port() {
        let config = ListenerConfig {
            bind_address: "127.0.0.1:0".into(),
        };
        let listener = Listener::bind(&config).await.unwrap();
        assert_ne!(listener.local_addr().port(), 0);
    }

    #[tokio::test]
    async fn port_in_use_is_a_bind_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = ListenerConfig {
            bind_address: taken.local_addr().unwrap().to_string(),
        };

        let err = Listener::bind(&config).await.unwrap_err();
        assert!(matches!(err, ListenerError::Bind { .. }), "got {err}");
    }

    #[tokio::test]
    async fn unparseable_address_is_a_bind_error() {
        let config = ListenerConfig {
            bind_address: "not an address".into(),
        };
        let err = Listener::bind(&config).await.unwrap_err();
        assert!(err.to_string().contains("not an address"));
    }

    #[tokio::test]
    async fn accept_yields_peer_address() {
        let listener = Listener::from_tokio(TcpListener::bind("127.0.0.1:0").await.unwrap()).unwrap();
        let client = TcpStream::connect(listener.local_addr()).await.unwrap();

        let (_stream, peer) = listener.accept().await.unwrap();
        assert_eq!(peer, client.local_addr().unwrap());
    }
}
