//! Protocol module - raw scans, frame headers, and reassembly.
//!
//! This module implements the optical transport:
//! - Raw scanned string to bytes (`decode_raw_frame`)
//! - 5-byte frame header encoding/decoding
//! - Frame reassembler for multipart payloads
//! - Output framing for data shown back to the user

mod frame;
mod frame_buffer;
mod raw_frame;
mod wire_format;

pub use frame::{build_frame, split_frame_header, split_into_frames, RawFrame};
pub use frame_buffer::{FrameReassembler, Progress, Reassembly};
pub use raw_frame::{decode_raw_frame, encode_raw_frame};
pub use wire_format::{
    is_forbidden_first_body, FrameHeader, FORBIDDEN_FIRST_BYTES, FRAME_HEADER_SIZE, MULTIPART,
};
