//! Passive TCP capture listener.
//!
//! Accepts inbound connections, records whatever bytes each peer sends
//! until it goes idle, closes the connection, and on shutdown stops
//! accepting and drains in-flight sessions.
//!
//! ```text
//!   peer ──TCP──▶ net::listener ──▶ net::acceptor ──spawn──▶ net::session
//!                                        │                      │
//!                                        │ register             │ record_capture
//!                                        ▼                      ▼
//!                              lifecycle::shutdown        capture::RecordSink
//!                              (close listener, drain)
//! ```

pub mod capture;
pub mod config;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod server;

pub use capture::{HelloRecordLogger, MemorySink, RecordSink};
pub use config::CaptureConfig;
pub use lifecycle::ShutdownCoordinator;
pub use server::{CaptureServer, ServerHandle};
