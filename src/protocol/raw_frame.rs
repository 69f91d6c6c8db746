//! Raw scanned string to frame bytes.
//!
//! The camera layer hands over each QR code as the hex rendition of its
//! binary-mode bit stream:
//!
//! ```text
//! 4          binary mode indicator (one nibble)
//! 37         byte length (1 byte, or 2 bytes for large versions)
//! 000001...  frame bytes
//! 0          terminator (one nibble)
//! ec11ec11   filler bytes
//! ```

use bytes::Bytes;

use crate::error::{Result, ScanError};

/// Mode nibble for byte-mode QR data.
const BINARY_MODE: char = '4';

/// Terminator nibble.
const TERMINATOR: char = '0';

/// Trailing filler emitted by some camera decoders.
const FILLER: &str = "ec11";

/// Decode a raw scanned string into frame bytes.
///
/// Strips filler bytes, checks mode and terminator, then reconciles the
/// declared length with either a 1-byte or 2-byte length prefix.
///
/// # Example
///
/// ```
/// use uos_scanner::protocol::decode_raw_frame;
///
/// let bytes = decode_raw_frame("402cafe0ec11ec11").unwrap();
/// assert_eq!(&bytes[..], &[0xca, 0xfe]);
/// ```
pub fn decode_raw_frame(scanned: &str) -> Result<Bytes> {
    let mut data = scanned.trim().to_ascii_lowercase();

    if data.ends_with("ec") && !data.ends_with(FILLER) {
        data.truncate(data.len() - 2);
    }
    while data.ends_with(FILLER) {
        data.truncate(data.len() - FILLER.len());
    }

    if !data.starts_with(BINARY_MODE) || !data.ends_with(TERMINATOR) || data.len() < 2 {
        return Err(ScanError::MalformedFrame(
            "missing binary mode indicator or terminator".to_string(),
        ));
    }

    let inner = &data[1..data.len() - 1];
    let len8 = declared_length(inner, 2);
    let len16 = declared_length(inner, 4);

    let body = if len8 * 2 + 2 == inner.len() {
        &inner[2..]
    } else if len16 * 2 + 4 == inner.len() {
        &inner[4..]
    } else {
        return Err(ScanError::MalformedFrame(format!(
            "declared length does not match {} hex digits",
            inner.len()
        )));
    };

    hex::decode(body)
        .map(Bytes::from)
        .map_err(|e| ScanError::MalformedFrame(e.to_string()))
}

/// Encode frame bytes as a raw scanned string (no filler).
///
/// Uses a 1-byte length when it fits, otherwise a 2-byte length.
///
/// # Panics
///
/// Panics in debug builds if `bytes` is longer than `u16::MAX`.
pub fn encode_raw_frame(bytes: &[u8]) -> String {
    debug_assert!(bytes.len() <= u16::MAX as usize);
    let body = hex::encode(bytes);
    if bytes.len() <= u8::MAX as usize {
        format!("{BINARY_MODE}{:02x}{body}{TERMINATOR}", bytes.len())
    } else {
        format!("{BINARY_MODE}{:04x}{body}{TERMINATOR}", bytes.len())
    }
}

/// Parse the first `digits` hex digits as a length, 0 when unreadable.
fn declared_length(inner: &str, digits: usize) -> usize {
    inner
        .get(..digits)
        .and_then(|s| usize::from_str_radix(s, 16).ok())
        .unwrap_or(0)
}
