//! Capture records: the seam between sessions and whatever stores or
//! reports the bytes they read.
//!
//! # Data Flow
//! ```text
//! Session read (n > 0 bytes)
//!     → RecordSink::record_capture(peer, &buf[..n])
//!     → hello.rs (structured log event, hex payload)
//!     → sink.rs  (in-memory collection)
//! ```
//!
//! Payloads are passed through verbatim. Nothing here frames or validates
//! them, even though the log label calls them ClientHello records.

pub mod hello;
pub mod sink;

pub use hello::HelloRecordLogger;
pub use sink::{CapturedRecord, MemorySink, RecordSink};
