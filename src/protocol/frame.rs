//! Frame struct with typed accessors.
//!
//! Represents one scanned QR frame: the decoded 5-byte header plus body.
//! Uses `bytes::Bytes` so splitting the body off the scanned bytes is
//! zero-copy.
//!
//! # Example
//!
//! ```
//! use uos_scanner::protocol::{split_frame_header, FrameHeader, build_frame};
//!
//! let bytes = build_frame(&FrameHeader::multipart(2, 1), b"tail");
//! let frame = split_frame_header(bytes.into()).unwrap();
//!
//! assert_eq!(frame.frame_index(), 1);
//! assert_eq!(frame.total_frame_count(), 2);
//! assert_eq!(frame.body(), b"tail");
//! ```

use bytes::Bytes;

use super::wire_format::{FrameHeader, FRAME_HEADER_SIZE};
use crate::error::{Result, ScanError};

/// A single scanned frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Decoded header.
    pub header: FrameHeader,
    /// Body bytes after the header.
    pub body: Bytes,
}

impl RawFrame {
    /// Create a new frame from header and body.
    pub fn new(header: FrameHeader, body: Bytes) -> Self {
        Self { header, body }
    }

    /// Get a reference to the body bytes.
    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Whether the sender marked the frame as multipart.
    #[inline]
    pub fn is_multipart(&self) -> bool {
        self.header.is_multipart
    }

    /// Get the total frame count of the set.
    #[inline]
    pub fn total_frame_count(&self) -> u16 {
        self.header.total_frame_count
    }

    /// Get the index of this frame.
    #[inline]
    pub fn frame_index(&self) -> u16 {
        self.header.frame_index
    }
}

/// Split the 5-byte frame header off scanned bytes.
///
/// No validation beyond length; fails with `TruncatedFrame` under 5 bytes.
pub fn split_frame_header(mut bytes: Bytes) -> Result<RawFrame> {
    let header = FrameHeader::parse(&bytes)?;
    let body = bytes.split_off(FRAME_HEADER_SIZE);
    Ok(RawFrame::new(header, body))
}

/// Build a complete frame as a single byte vector.
pub fn build_frame(header: &FrameHeader, body: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE + body.len());
    buf.extend_from_slice(&header.encode());
    buf.extend_from_slice(body);
    buf
}

/// Split outbound data into framed chunks of at most `max_body_len` bytes.
///
/// Every chunk is marked multipart and carries its index, mirroring the
/// inbound framing. Empty data yields a single empty frame. Data needing
/// more frames than a header can count is rejected.
///
/// # Example
///
/// ```
/// use uos_scanner::protocol::split_into_frames;
///
/// let frames = split_into_frames(&[1, 2, 3, 4, 5], 2).unwrap();
/// assert_eq!(frames.len(), 3);
/// assert_eq!(&frames[2][..], &[0x00, 0x00, 0x03, 0x00, 0x02, 5]);
/// ```
pub fn split_into_frames(data: &[u8], max_body_len: usize) -> Result<Vec<Bytes>> {
    let max_body_len = max_body_len.max(1);
    let chunks: Vec<&[u8]> = if data.is_empty() {
        vec![data]
    } else {
        data.chunks(max_body_len).collect()
    };
    let total = u16::try_from(chunks.len()).map_err(|_| {
        ScanError::MalformedFrame(format!(
            "{} bytes need {} frames of {} bytes, at most {} allowed",
            data.len(),
            chunks.len(),
            max_body_len,
            u16::MAX
        ))
    })?;

    Ok(chunks
        .iter()
        .zip(0..total)
        .map(|(chunk, index)| {
            let header = FrameHeader::multipart(total, index);
            Bytes::from(build_frame(&header, chunk))
        })
        .collect())
}
