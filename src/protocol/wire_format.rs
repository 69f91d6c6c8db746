//! Frame header encoding and decoding.
//!
//! Every scanned frame starts with a 5-byte header:
//! ```text
//! ┌───────────┬─────────────┬─────────────┐
//! │ Multipart │ Frame count │ Frame index │
//! │ 1 byte    │ 2 bytes     │ 2 bytes     │
//! │           │ uint16 BE   │ uint16 BE   │
//! └───────────┴─────────────┴─────────────┘
//! ```
//!
//! A multipart byte of `0x00` marks the frame as part of a multipart
//! payload. Senders set it even for single-frame payloads.

use crate::error::{Result, ScanError};

/// Header size in bytes (fixed, exactly 5).
pub const FRAME_HEADER_SIZE: usize = 5;

/// Multipart byte value written by senders.
pub const MULTIPART: u8 = 0x00;

/// Leading body bytes that frame 0 of a multipart payload may never carry.
///
/// `0x00` is an empty/legacy payload, `0x7B` (`{`) is JSON metadata.
pub const FORBIDDEN_FIRST_BYTES: [u8; 2] = [0x00, 0x7B];

/// Decoded frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Whether the frame declares itself multipart.
    pub is_multipart: bool,
    /// Total number of frames in the set.
    pub total_frame_count: u16,
    /// Zero-based index of this frame.
    pub frame_index: u16,
}

impl FrameHeader {
    /// Create a new header.
    pub fn new(is_multipart: bool, total_frame_count: u16, frame_index: u16) -> Self {
        Self {
            is_multipart,
            total_frame_count,
            frame_index,
        }
    }

    /// Header for frame `frame_index` of a `total_frame_count` set.
    pub fn multipart(total_frame_count: u16, frame_index: u16) -> Self {
        Self::new(true, total_frame_count, frame_index)
    }

    /// Encode header to bytes (Big Endian).
    ///
    /// # Example
    ///
    /// ```
    /// use uos_scanner::protocol::FrameHeader;
    ///
    /// let bytes = FrameHeader::multipart(3, 1).encode();
    /// assert_eq!(bytes, [0x00, 0x00, 0x03, 0x00, 0x01]);
    /// ```
    pub fn encode(&self) -> [u8; FRAME_HEADER_SIZE] {
        let mut buf = [0u8; FRAME_HEADER_SIZE];
        buf[0] = if self.is_multipart { MULTIPART } else { 0x01 };
        buf[1..3].copy_from_slice(&self.total_frame_count.to_be_bytes());
        buf[3..5].copy_from_slice(&self.frame_index.to_be_bytes());
        buf
    }

    /// Decode header from bytes (Big Endian).
    ///
    /// Returns `None` if buffer is too short.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < FRAME_HEADER_SIZE {
            return None;
        }
        Some(Self {
            is_multipart: buf[0] == MULTIPART,
            total_frame_count: u16::from_be_bytes([buf[1], buf[2]]),
            frame_index: u16::from_be_bytes([buf[3], buf[4]]),
        })
    }

    /// Decode header, failing with `TruncatedFrame` on short input.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        Self::decode(buf).ok_or(ScanError::TruncatedFrame {
            len: buf.len(),
            needed: FRAME_HEADER_SIZE,
        })
    }

    /// Check if this frame is the only one of its set.
    #[inline]
    pub fn is_single(&self) -> bool {
        self.total_frame_count == 1
    }
}

/// Check whether `body` is acceptable as frame `frame_index`.
#[inline]
pub fn is_forbidden_first_body(frame_index: u16, body: &[u8]) -> Option<u8> {
    if frame_index != 0 {
        return None;
    }
    match body.first() {
        None => Some(0x00),
        Some(b) if FORBIDDEN_FIRST_BYTES.contains(b) => Some(*b),
        Some(_) => None,
    }
}
