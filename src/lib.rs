//! # uos-scanner
//!
//! Scan/sign pipeline of an air-gapped signing companion.
//!
//! All data reaches the device through QR codes. A signing request too
//! large for one code arrives as a set of frames, scanned in any order.
//! This crate reassembles the frames, decodes the request (Ethereum or
//! Substrate), prepares the bytes to sign, and encodes the signature for
//! display back as QR frames.
//!
//! ## Architecture
//!
//! - **Protocol**: raw scan strings, 5-byte frame headers, reassembly
//! - **Payload**: protocol dispatch, extrinsic/RLP decoding, oversize hashing
//! - **Signing**: account lookup, data to sign, signature tagging
//! - **Session**: composition root with the busy flag and read-only views
//!
//! Key storage, hashing choice, and network lookup are external
//! capabilities, injected as traits.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use uos_scanner::{ScanEvent, ScanSession, SigningCapability};
//!
//! let mut session = ScanSession::builder()
//!     .accounts(Arc::new(accounts))
//!     .build();
//!
//! for scan in camera.frames() {
//!     if let ScanEvent::Ready(request) = session.submit_scan(&scan)? {
//!         show(request);
//!         break;
//!     }
//! }
//!
//! session.prepare()?;
//! session.sign(SigningCapability::Unlocked(&signer)).await?;
//! for frame in session.signature_frames(None)? {
//!     display(frame);
//! }
//! ```

pub mod crypto;
pub mod error;
pub mod payload;
pub mod protocol;
pub mod signing;
pub mod view;

mod session;

pub use error::{CapabilityError, ErrorKind, Result, ScanError};
pub use session::{ScanEvent, ScanSession, ScanSessionBuilder, SessionConfig, DEFAULT_OUTPUT_FRAME_LEN};
pub use signing::{SignatureResult, SigningCapability};
