//! Per-connection read loop.
//!
//! # State machine
//! ```text
//! Running ──(no bytes within read_timeout)──▶ TimedOut  ─┐
//!    │ ▲                                                  │
//!    │ └──(n > 0 bytes: record, re-arm deadline)          ├─▶ Terminated
//!    ├──(read returned 0)─────────────────────▶ PeerClosed ┤
//!    └──(any other io error)──────────────────▶ ReadError ─┘
//! ```
//!
//! Terminated always closes the stream and then releases the session's
//! registration. Both happen by drop, so early returns and panics take the
//! same path. The session never writes to its peer.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::net::TcpStream;
use tokio::time;

use crate::capture::RecordSink;
use crate::config::SessionConfig;
use crate::net::connection::{ConnectionId, SessionGuard};
use crate::observability::metrics;

/// Why a session stopped reading.
#[derive(Debug)]
pub enum SessionOutcome {
    /// No bytes arrived within the idle timeout.
    TimedOut,
    /// The peer closed its write side.
    PeerClosed,
    /// Any other transport error.
    ReadError(io::Error),
}

impl SessionOutcome {
    /// Short label used for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            SessionOutcome::TimedOut => "timeout",
            SessionOutcome::PeerClosed => "eof",
            SessionOutcome::ReadError(_) => "error",
        }
    }
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionOutcome::TimedOut => write!(f, "read timed out"),
            SessionOutcome::PeerClosed => write!(f, "closed by peer"),
            SessionOutcome::ReadError(e) => write!(f, "read error: {}", e),
        }
    }
}

/// One accepted connection, from accept to close.
///
/// Field order matters: if the session unwinds, the stream is dropped
/// (closed) before the registration is released.
pub struct Session<S = TcpStream> {
    stream: S,
    registration: SessionGuard,
    peer: SocketAddr,
    read_timeout: Duration,
    buffer_size: usize,
    sink: Arc<dyn RecordSink>,
}

impl<S> Session<S>
where
    S: AsyncRead + Unpin,
{
    /// Build a session. `registration` must already be held so the
    /// session is counted before it reads anything.
    pub fn new(
        stream: S,
        peer: SocketAddr,
        config: &SessionConfig,
        sink: Arc<dyn RecordSink>,
        registration: SessionGuard,
    ) -> Self {
        Self {
            stream,
            registration,
            peer,
            read_timeout: config.read_timeout,
            buffer_size: config.buffer_size,
            sink,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.registration.id()
    }

    /// Read until timeout, end-of-stream, or error, recording every chunk.
    pub async fn run(mut self) -> SessionOutcome {
        let id = self.id();
        let peer = self.peer;
        tracing::info!(session_id = %id, remote_addr = %peer, "Accepted connection");

        let outcome = self.read_loop().await;
        match &outcome {
            SessionOutcome::TimedOut => tracing::info!(
                session_id = %id,
                remote_addr = %peer,
                "Read timeout: No further data from client. Closing connection."
            ),
            SessionOutcome::PeerClosed => tracing::info!(
                session_id = %id,
                remote_addr = %peer,
                "Connection closed by client (EOF)."
            ),
            SessionOutcome::ReadError(e) => tracing::error!(
                session_id = %id,
                remote_addr = %peer,
                error = %e,
                "Error reading from client. Closing connection."
            ),
        }
        metrics::session_closed(outcome.label());

        // Close, log, then deregister: the drain must not finish before the
        // final closure is logged.
        let Session {
            stream,
            registration,
            ..
        } = self;
        drop(stream);
        tracing::info!(session_id = %id, remote_addr = %peer, "Closing connection.");
        drop(registration);
        outcome
    }

    async fn read_loop(&mut self) -> SessionOutcome {
        let mut buffer = vec![0u8; self.buffer_size];
        loop {
            // Fresh deadline per read: this is an idle timeout, not a cap on
            // the whole session.
            let read = time::timeout(self.read_timeout, self.stream.read(&mut buffer)).await;
            match read {
                Err(_elapsed) => return SessionOutcome::TimedOut,
                Ok(Ok(0)) => return SessionOutcome::PeerClosed,
                Ok(Ok(n)) => {
                    tracing::debug!(session_id = %self.id(), bytes = n, "Read from client");
                    self.sink.record_capture(self.peer, &buffer[..n]);
                    metrics::record_capture(n);
                }
                Ok(Err(e)) if e.kind() == io::ErrorKind::TimedOut => {
                    return SessionOutcome::TimedOut;
                }
                Ok(Err(e)) => return SessionOutcome::ReadError(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::MemorySink;
    use crate::net::connection::SessionTracker;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::task::{Context, Poll};
    use tokio::io::{duplex, AsyncWriteExt, ReadBuf};
    use tracing::field::{Field, Visit};
    use tracing_subscriber::layer::{Context as LayerContext, Layer, SubscriberExt};

    fn peer() -> SocketAddr {
        "192.0.2.10:40000".parse().unwrap()
    }

    fn config(read_timeout: Duration) -> SessionConfig {
        SessionConfig {
            read_timeout,
            buffer_size: 4096,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn records_then_times_out() {
        let tracker = SessionTracker::new();
        let sink = Arc::new(MemorySink::new());
        let (mut client, server) = duplex(1024);

        let session = Session::new(server, peer(), &config(Duration::from_secs(5)), sink.clone(), tracker.register());
        let task = tokio::spawn(session.run());

        client.write_all(b"AB").await.unwrap();
        let outcome = task.await.unwrap();

        assert!(matches!(outcome, SessionOutcome::TimedOut), "got {outcome}");
        assert_eq!(sink.payloads_from(peer()), vec![b"AB".to_vec()]);
        assert_eq!(tracker.active_count(), 0);

        // Server half is gone, so the client sees end-of-stream.
        let mut rest = Vec::new();
        client.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn records_each_read_then_sees_eof() {
        let tracker = SessionTracker::new();
        let sink = Arc::new(MemorySink::new());
        let (mut client, server) = duplex(1024);

        let session = Session::new(server, peer(), &config(Duration::from_secs(30)), sink.clone(), tracker.register());
        let task = tokio::spawn(session.run());

        client.write_all(b"X").await.unwrap();
        wait_for_records(&sink, 1).await;
        client.write_all(b"Y").await.unwrap();
        wait_for_records(&sink, 2).await;
        drop(client);

        let outcome = task.await.unwrap();
        assert!(matches!(outcome, SessionOutcome::PeerClosed), "got {outcome}");
        assert_eq!(sink.payloads_from(peer()), vec![b"X".to_vec(), b"Y".to_vec()]);
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_is_rearmed_after_every_read() {
        let sink = Arc::new(MemorySink::new());
        let (mut client, server) = duplex(1024);
        let session = Session::new(
            server,
            peer(),
            &config(Duration::from_secs(10)),
            sink.clone(),
            SessionTracker::new().register(),
        );
        let task = tokio::spawn(session.run());

        // Total time well past one timeout, but never idle for a full one.
        for chunk in [&b"a"[..], b"b", b"c", b"d"] {
            time::sleep(Duration::from_secs(6)).await;
            client.write_all(chunk).await.unwrap();
        }
        drop(client);

        let outcome = task.await.unwrap();
        assert!(matches!(outcome, SessionOutcome::PeerClosed), "got {outcome}");
        assert_eq!(sink.len(), 4);
    }

    #[tokio::test]
    async fn large_payload_split_across_reads_is_exact() {
        let sink = Arc::new(MemorySink::new());
        let (mut client, server) = duplex(64 * 1024);
        let small = SessionConfig {
            read_timeout: Duration::from_secs(30),
            buffer_size: 16,
        };
        let session = Session::new(server, peer(), &small, sink.clone(), SessionTracker::new().register());
        let task = tokio::spawn(session.run());

        let payload: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        client.write_all(&payload).await.unwrap();
        drop(client);
        task.await.unwrap();

        let chunks = sink.payloads_from(peer());
        assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= 16));
        assert_eq!(chunks.concat(), payload);
    }

    #[tokio::test]
    async fn read_error_ends_session() {
        let tracker = SessionTracker::new();
        let sink = Arc::new(MemorySink::new());
        let session = Session::new(FailingStream(io::ErrorKind::ConnectionReset), peer(), &config(Duration::from_secs(30)), sink.clone(), tracker.register());

        let outcome = session.run().await;
        match outcome {
            SessionOutcome::ReadError(e) => assert_eq!(e.kind(), io::ErrorKind::ConnectionReset),
            other => panic!("expected read error, got {other}"),
        }
        assert!(sink.is_empty());
        assert_eq!(tracker.active_count(), 0);
    }

    #[test]
    fn outcome_labels() {
        assert_eq!(SessionOutcome::TimedOut.label(), "timeout");
        assert_eq!(SessionOutcome::PeerClosed.label(), "eof");
        let err = SessionOutcome::ReadError(io::Error::from(io::ErrorKind::BrokenPipe));
        assert_eq!(err.label(), "error");
    }

    #[tokio::test]
    async fn socket_timeout_error_counts_as_idle_timeout() {
        let tracker = SessionTracker::new();
        let sink = Arc::new(MemorySink::new());
        let session = Session::new(
            FailingStream(io::ErrorKind::TimedOut),
            peer(),
            &config(Duration::from_secs(30)),
            sink.clone(),
            tracker.register(),
        );

        let outcome = session.run().await;
        assert!(matches!(outcome, SessionOutcome::TimedOut), "got {outcome}");
        assert!(sink.is_empty());
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn final_closure_is_logged_before_deregistering() {
        let tracker = SessionTracker::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(LiveCountAtClose {
            tracker: tracker.clone(),
            seen: Arc::clone(&seen),
        });
        let _default = tracing::subscriber::set_default(subscriber);

        let (client, server) = duplex(64);
        drop(client);
        let session = Session::new(
            server,
            peer(),
            &config(Duration::from_secs(30)),
            Arc::new(MemorySink::new()),
            tracker.register(),
        );

        let outcome = session.run().await;
        assert!(matches!(outcome, SessionOutcome::PeerClosed), "got {outcome}");
        assert_eq!(*seen.lock().unwrap(), vec![1]);
        assert_eq!(tracker.active_count(), 0);
    }

    /// Records the live count whenever the final "Closing connection." event fires.
    struct LiveCountAtClose {
        tracker: SessionTracker,
        seen: Arc<Mutex<Vec<u64>>>,
    }

    impl<S: tracing::Subscriber> Layer<S> for LiveCountAtClose {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: LayerContext<'_, S>) {
            let mut message = MessageField::default();
            event.record(&mut message);
            if message.0 == "Closing connection." {
                self.seen.lock().unwrap().push(self.tracker.active_count());
            }
        }
    }

    #[derive(Default)]
    struct MessageField(String);

    impl Visit for MessageField {
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{:?}", value);
            }
        }
    }

    struct FailingStream(io::ErrorKind);

    impl AsyncRead for FailingStream {
        fn poll_read(self: Pin<&mut Self>, _cx: &mut Context<'_>, _buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::from(self.0)))
        }
    }

    async fn wait_for_records(sink: &MemorySink, n: usize) {
        time::timeout(Duration::from_secs(5), async {
            while sink.len() < n {
                time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("records did not arrive");
    }
}
