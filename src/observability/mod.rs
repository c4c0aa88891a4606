//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Acceptor, sessions, shutdown produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges)
//! ```
//!
//! # Design Decisions
//! - Every session event carries `session_id` and `remote_addr`
//! - Metrics are optional and cheap when disabled

pub mod logging;
pub mod metrics;
