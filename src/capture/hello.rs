//! Structured-log record sink.

use std::fmt::Write as _;
use std::net::SocketAddr;

use crate::capture::sink::RecordSink;

/// Logs each captured read as a "TLS ClientHello record" event.
///
/// The label is historical: the payload is hex-encoded as received and is
/// not checked to be TLS at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelloRecordLogger;

impl RecordSink for HelloRecordLogger {
    fn record_capture(&self, peer: SocketAddr, payload: &[u8]) {
        tracing::info!(
            remote_addr = %peer,
            data_hex = %hex_encode(payload),
            raw_data_len = payload.len(),
            "Received TLS ClientHello record"
        );
    }
}

/// Lowercase hex, two digits per byte, no separators.
pub fn hex_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for byte in data {
        // Writing to a String cannot fail.
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_lowercase_and_unseparated() {
        assert_eq!(hex_encode(&[]), "");
        assert_eq!(hex_encode(b"AB"), "4142");
        assert_eq!(hex_encode(&[0x16, 0x03, 0x01, 0x00, 0xff]), "16030100ff");
    }

    #[test]
    fn logging_arbitrary_bytes_does_not_panic() {
        let peer: SocketAddr = "127.0.0.1:5555".parse().unwrap();
        HelloRecordLogger.record_capture(peer, &[0, 159, 146, 150]);
        HelloRecordLogger.record_capture(peer, b"GET / HTTP/1.1\r\n");
    }
}
