//! Frame reassembly for multipart payloads.
//!
//! Implements a state machine over the scanned frames of one payload:
//! - `Empty`: no frame seen, no buffer allocated
//! - `Collecting`: buffer sized to the frame count, some slots missing
//! - `Complete`: every slot filled, assembled body handed out
//!
//! Frames may arrive in any order and may repeat. A repeated frame
//! overwrites its slot with the same bytes.
//!
//! # Example
//!
//! ```
//! use uos_scanner::protocol::{FrameReassembler, Reassembly};
//! use bytes::Bytes;
//!
//! let mut reassembler = FrameReassembler::new();
//!
//! let first = reassembler.submit_frame(1, 2, Bytes::from_static(b"lo")).unwrap();
//! assert!(matches!(first, Reassembly::Progress(_)));
//!
//! match reassembler.submit_frame(0, 2, Bytes::from_static(b"hel")).unwrap() {
//!     Reassembly::Complete(body) => assert_eq!(&body[..], b"hello"),
//!     Reassembly::Progress(_) => unreachable!(),
//! }
//! ```

use std::collections::BTreeSet;

use bytes::{Bytes, BytesMut};
use serde::Serialize;

use super::wire_format::is_forbidden_first_body;
use crate::error::{Result, ScanError};

/// Collection progress of a multipart payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    /// Frames received so far.
    pub received_count: u16,
    /// Indices still missing, ascending.
    pub missing_indices: Vec<u16>,
    /// Total frames in the set.
    pub total_frame_count: u16,
}

impl Progress {
    /// Whether every frame has been received.
    pub fn is_complete(&self) -> bool {
        self.total_frame_count > 0 && self.missing_indices.is_empty()
    }
}

/// Outcome of submitting a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reassembly {
    /// More frames are needed.
    Progress(Progress),
    /// All frames are in; the assembled body (without frame headers).
    Complete(Bytes),
}

/// Slots of an in-progress payload.
#[derive(Debug, Clone)]
struct FrameBuffer {
    slots: Vec<Option<Bytes>>,
    missing: BTreeSet<u16>,
}

impl FrameBuffer {
    fn new(total_frame_count: u16) -> Self {
        Self {
            slots: vec![None; total_frame_count as usize],
            missing: (0..total_frame_count).collect(),
        }
    }

    fn total(&self) -> u16 {
        self.slots.len() as u16
    }

    fn received(&self) -> u16 {
        self.total() - self.missing.len() as u16
    }

    fn write(&mut self, frame_index: u16, body: Bytes) {
        self.slots[frame_index as usize] = Some(body);
        self.missing = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(i, _)| i as u16)
            .collect();
    }

    fn progress(&self) -> Progress {
        Progress {
            received_count: self.received(),
            missing_indices: self.missing.iter().copied().collect(),
            total_frame_count: self.total(),
        }
    }

    fn assemble(&self) -> Bytes {
        let len = self.slots.iter().flatten().map(Bytes::len).sum();
        let mut out = BytesMut::with_capacity(len);
        for body in self.slots.iter().flatten() {
            out.extend_from_slice(body);
        }
        out.freeze()
    }
}

/// State machine for frame reassembly.
#[derive(Debug, Clone)]
enum State {
    /// No frame received yet.
    Empty,
    /// Buffer allocated, waiting for missing frames.
    Collecting(FrameBuffer),
    /// All frames received.
    Complete { total_frame_count: u16 },
}

/// Accumulates scanned frames and yields the assembled body.
///
/// Errors never reset the reassembler; only [`clear`](Self::clear) does.
#[derive(Debug, Clone)]
pub struct FrameReassembler {
    state: State,
}

impl FrameReassembler {
    /// Create an empty reassembler.
    pub fn new() -> Self {
        Self {
            state: State::Empty,
        }
    }

    /// Submit one frame body.
    ///
    /// # Errors
    ///
    /// - `InvalidFirstFrame` if frame 0 starts with `0x00` or `0x7B`
    /// - `MalformedFrame` if the frame count is zero, disagrees with the
    ///   count of the set being collected, or the index is out of range
    ///
    /// Neither error changes the collected frames.
    pub fn submit_frame(
        &mut self,
        frame_index: u16,
        total_frame_count: u16,
        body: Bytes,
    ) -> Result<Reassembly> {
        if total_frame_count == 0 {
            return Err(ScanError::MalformedFrame("frame count is zero".to_string()));
        }
        if frame_index >= total_frame_count {
            return Err(ScanError::MalformedFrame(format!(
                "frame index {} out of range for {} frames",
                frame_index, total_frame_count
            )));
        }

        if let State::Complete { total_frame_count } = self.state {
            tracing::debug!("Ignoring frame {} after completion", frame_index);
            return Ok(Reassembly::Progress(Progress {
                received_count: total_frame_count,
                missing_indices: Vec::new(),
                total_frame_count,
            }));
        }

        if let State::Collecting(buffer) = &self.state {
            if buffer.total() != total_frame_count {
                return Err(ScanError::MalformedFrame(format!(
                    "frame declares {} frames, collecting {}",
                    total_frame_count,
                    buffer.total()
                )));
            }
        }

        if let Some(byte) = is_forbidden_first_body(frame_index, &body) {
            tracing::warn!("Rejecting first frame starting with {:#04x}", byte);
            return Err(ScanError::InvalidFirstFrame(byte));
        }

        let mut buffer = match std::mem::replace(&mut self.state, State::Empty) {
            State::Collecting(buffer) => buffer,
            State::Empty | State::Complete { .. } => FrameBuffer::new(total_frame_count),
        };

        buffer.write(frame_index, body);
        let progress = buffer.progress();
        tracing::debug!(
            "Frame {}/{} accepted, {} received",
            frame_index + 1,
            total_frame_count,
            progress.received_count
        );

        if !progress.is_complete() {
            self.state = State::Collecting(buffer);
            return Ok(Reassembly::Progress(progress));
        }

        let assembled = buffer.assemble();
        self.state = State::Complete { total_frame_count };
        tracing::info!(
            "All {} frames received, {} bytes assembled",
            total_frame_count,
            assembled.len()
        );

        Ok(Reassembly::Complete(assembled))
    }

    /// Current progress, `None` before the first frame.
    pub fn progress(&self) -> Option<Progress> {
        match &self.state {
            State::Empty => None,
            State::Collecting(buffer) => Some(buffer.progress()),
            State::Complete { total_frame_count } => Some(Progress {
                received_count: *total_frame_count,
                missing_indices: Vec::new(),
                total_frame_count: *total_frame_count,
            }),
        }
    }

    /// Number of frames received so far.
    pub fn received_count(&self) -> u16 {
        self.progress().map_or(0, |p| p.received_count)
    }

    /// Check if no frame has been received.
    pub fn is_empty(&self) -> bool {
        matches!(self.state, State::Empty)
    }

    /// Check if the set is complete.
    pub fn is_complete(&self) -> bool {
        matches!(self.state, State::Complete { .. })
    }

    /// Drop the buffer and reset state.
    pub fn clear(&mut self) {
        self.state = State::Empty;
    }

    /// Get the current state for debugging.
    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match &self.state {
            State::Empty => "Empty",
            State::Collecting(_) => "Collecting",
            State::Complete { .. } => "Complete",
        }
    }
}

impl Default for FrameReassembler {
    fn default() -> Self {
        Self::new()
    }
}
