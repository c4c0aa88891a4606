//! The record sink trait and an in-memory implementation.

use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard};

/// Receives every chunk of bytes a session reads.
///
/// Called inline from the session's read loop, once per successful read,
/// with exactly the bytes that read returned. Implementations must not
/// block for long: the session does not read again until this returns.
pub trait RecordSink: Send + Sync + 'static {
    fn record_capture(&self, peer: SocketAddr, payload: &[u8]);
}

/// One captured read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedRecord {
    pub peer: SocketAddr,
    pub payload: Vec<u8>,
}

/// Keeps every record in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<CapturedRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records captured so far.
    pub fn records(&self) -> Vec<CapturedRecord> {
        self.lock().clone()
    }

    /// Payloads captured from one peer, in arrival order.
    pub fn payloads_from(&self, peer: SocketAddr) -> Vec<Vec<u8>> {
        self.lock()
            .iter()
            .filter(|record| record.peer == peer)
            .map(|record| record.payload.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CapturedRecord>> {
        // A panicking writer cannot leave a half-pushed record behind.
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RecordSink for MemorySink {
    fn record_capture(&self, peer: SocketAddr, payload: &[u8]) {
        self.lock().push(CapturedRecord {
            peer,
            payload: payload.to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_records_in_order_per_peer() {
        let a: SocketAddr = "10.0.0.1:1000".parse().unwrap();
        let b: SocketAddr = "10.0.0.2:2000".parse().unwrap();
        let sink = MemorySink::new();
        assert!(sink.is_empty());

        sink.record_capture(a, b"X");
        sink.record_capture(b, b"other");
        sink.record_capture(a, b"Y");

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.payloads_from(a), vec![b"X".to_vec(), b"Y".to_vec()]);
        assert_eq!(sink.payloads_from(b), vec![b"other".to_vec()]);
        assert_eq!(sink.records()[1].peer, b);
    }
}
