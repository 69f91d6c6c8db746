//! Scan session - the composition root of the scan/sign pipeline.
//!
//! A [`ScanSession`] owns the frame reassembler, the payload decoder, the
//! signing coordinator, and the per-request state. Every transition takes
//! `&mut self` and returns a read-only view.
//!
//! ```text
//!            submit_scan (any order, duplicates ok)
//!                 │
//!   ┌─────────────▼─────────────┐   Progress
//!   │ Collecting frames          │──────────► ProgressView
//!   └─────────────┬─────────────┘
//!                 │ last frame
//!   ┌─────────────▼─────────────┐   Ready
//!   │ Busy: request decoded      │──────────► RequestView
//!   └─────────────┬─────────────┘
//!                 │ prepare / sign
//!   ┌─────────────▼─────────────┐
//!   │ Signed                     │──────────► SignatureView + output frames
//!   └─────────────┬─────────────┘
//!                 │ cleanup
//!                 ▼
//!               Empty
//! ```
//!
//! # Example
//!
//! ```
//! use uos_scanner::{ScanEvent, ScanSession};
//!
//! let mut session = ScanSession::builder().build();
//! let scan = "4370000010000530103f4cd755672a8f9542ca9da4fbf2182e79135d94304002e6a09ffc96fef6e6c4c5448495320495320535041525441210ec11ec11ec11ec";
//!
//! match session.submit_scan(scan).unwrap() {
//!     ScanEvent::Ready(view) => assert_eq!(view.signer_address, "J7JEcan7j6m2Fa9TbiGJ7jj52oB6CL3eQVbmfiMxKu7TR3X"),
//!     ScanEvent::Progress(_) => unreachable!(),
//! }
//! assert!(session.is_busy());
//! ```

use std::sync::Arc;

use bytes::Bytes;
use serde::Deserialize;

use crate::crypto::Hasher;
use crate::error::{Result, ScanError};
use crate::payload::{DecoderConfig, NetworkRegistry, PayloadDecoder, SigningRequest};
use crate::protocol::{
    decode_raw_frame, encode_raw_frame, split_frame_header, split_into_frames, FrameReassembler,
    Progress, Reassembly,
};
use crate::signing::{
    AccountRegistry, InMemoryAccounts, SignatureResult, SigningCapability, SigningContext,
    SigningCoordinator,
};
use crate::view::{ProgressView, RequestView};

/// Default body size of output frames.
pub const DEFAULT_OUTPUT_FRAME_LEN: usize = 1024;

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// Payload decoder settings.
    pub decoder: DecoderConfig,
    /// Output frame body size used by [`ScanSession::signature_frames`].
    pub default_output_frame_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            decoder: DecoderConfig::default(),
            default_output_frame_len: DEFAULT_OUTPUT_FRAME_LEN,
        }
    }
}

impl SessionConfig {
    /// Set the decoder settings.
    pub fn decoder(mut self, decoder: DecoderConfig) -> Self {
        self.decoder = decoder;
        self
    }

    /// Set the output frame body size.
    pub fn default_output_frame_len(mut self, len: usize) -> Self {
        self.default_output_frame_len = len;
        self
    }
}

/// Result of submitting a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// More frames are needed.
    Progress(ProgressView),
    /// The set is complete and decoded; the session is now busy.
    Ready(RequestView),
}

/// Builder for [`ScanSession`].
#[derive(Default)]
pub struct ScanSessionBuilder {
    accounts: Option<Arc<dyn AccountRegistry>>,
    networks: Option<Arc<dyn NetworkRegistry>>,
    hasher: Option<Arc<dyn Hasher>>,
    config: SessionConfig,
}

impl ScanSessionBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the account registry. Defaults to an empty registry.
    pub fn accounts(mut self, accounts: Arc<dyn AccountRegistry>) -> Self {
        self.accounts = Some(accounts);
        self
    }

    /// Set the network registry used to pick address prefixes and to
    /// find signers stored under another network's address.
    pub fn networks(mut self, networks: Arc<dyn NetworkRegistry>) -> Self {
        self.networks = Some(networks);
        self
    }

    /// Set the hash capability. Defaults to Blake2b-256.
    pub fn hasher(mut self, hasher: Arc<dyn Hasher>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    /// Set the configuration.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the session.
    pub fn build(self) -> ScanSession {
        let mut decoder = PayloadDecoder::new(self.config.decoder.clone());
        if let Some(hasher) = self.hasher {
            decoder = decoder.with_hasher(hasher);
        }
        let accounts = self
            .accounts
            .unwrap_or_else(|| Arc::new(InMemoryAccounts::new()));
        let mut coordinator = SigningCoordinator::new(accounts);
        if let Some(networks) = self.networks {
            decoder = decoder.with_networks(networks.clone());
            coordinator = coordinator.with_networks(networks);
        }

        ScanSession {
            config: self.config,
            decoder,
            coordinator,
            reassembler: FrameReassembler::new(),
            request: None,
            context: None,
            signature: None,
            busy: false,
        }
    }
}

/// One scan/sign cycle.
#[derive(Debug)]
pub struct ScanSession {
    config: SessionConfig,
    decoder: PayloadDecoder,
    coordinator: SigningCoordinator,
    reassembler: FrameReassembler,
    request: Option<SigningRequest>,
    context: Option<SigningContext>,
    signature: Option<SignatureResult>,
    busy: bool,
}

impl ScanSession {
    /// Create a session builder.
    pub fn builder() -> ScanSessionBuilder {
        ScanSessionBuilder::new()
    }

    /// Submit a raw scanned string.
    pub fn submit_scan(&mut self, raw: &str) -> Result<ScanEvent> {
        if self.busy {
            return Err(ScanError::SessionBusy);
        }
        let bytes = decode_raw_frame(raw)?;
        self.submit_frame_bytes(bytes)
    }

    /// Submit an already-decoded frame (header included).
    pub fn submit_frame_bytes(&mut self, bytes: Bytes) -> Result<ScanEvent> {
        if self.busy {
            return Err(ScanError::SessionBusy);
        }
        let frame = split_frame_header(bytes)?;
        let index = frame.frame_index();
        let total = frame.total_frame_count();

        let body = match self.reassembler.submit_frame(index, total, frame.body)? {
            Reassembly::Progress(progress) => {
                return Ok(ScanEvent::Progress(ProgressView::from(&progress)));
            }
            Reassembly::Complete(body) => body,
        };

        match self.decoder.decode_body(body) {
            Ok(request) => {
                tracing::info!(
                    "Decoded {} request for {}",
                    request.action.as_str(),
                    request.signer_address
                );
                let view = RequestView::from(&request);
                self.request = Some(request);
                self.context = None;
                self.signature = None;
                self.busy = true;
                Ok(ScanEvent::Ready(view))
            }
            Err(e) => {
                tracing::warn!("Decoding assembled payload failed, rescan required: {}", e);
                self.reassembler.clear();
                Err(e)
            }
        }
    }

    /// Prepare the decoded request for signing.
    ///
    /// Errors leave the request in place.
    pub fn prepare(&mut self) -> Result<&SigningContext> {
        let request = self
            .request
            .as_ref()
            .ok_or(ScanError::NothingToSign("no request has been scanned"))?;
        let context = self.coordinator.prepare(request)?;
        Ok(self.context.insert(context))
    }

    /// Sign the prepared context.
    ///
    /// A failed capability keeps the context so signing can be retried.
    pub async fn sign(&mut self, capability: SigningCapability<'_>) -> Result<&SignatureResult> {
        let context = self
            .context
            .as_ref()
            .ok_or(ScanError::NothingToSign("request has not been prepared"))?;
        let result = self.coordinator.sign(context, capability).await?;
        Ok(self.signature.insert(result))
    }

    /// Raw strings of the signature split into output frames.
    ///
    /// Uses the configured frame length when `max_body_len` is `None`.
    pub fn signature_frames(&self, max_body_len: Option<usize>) -> Result<Vec<String>> {
        let signature = self
            .signature
            .as_ref()
            .ok_or(ScanError::NothingToSign("nothing has been signed"))?;
        let max_body_len = max_body_len.unwrap_or(self.config.default_output_frame_len);

        Ok(split_into_frames(signature.to_hex().as_bytes(), max_body_len)?
            .iter()
            .map(|frame| encode_raw_frame(frame))
            .collect())
    }

    /// Stop accepting frames.
    pub fn set_busy(&mut self) {
        self.busy = true;
    }

    /// Accept frames again.
    ///
    /// A completed frame set is dropped so the next scan starts a new one.
    pub fn set_ready(&mut self) {
        if self.reassembler.is_complete() {
            self.reassembler.clear();
        }
        self.busy = false;
    }

    /// Drop the in-progress frame buffer, keeping everything else.
    pub fn clear_multipart_progress(&mut self) {
        tracing::debug!("Clearing multipart progress");
        self.reassembler.clear();
    }

    /// Reset the session to its initial state.
    pub fn cleanup(&mut self) {
        tracing::debug!("Session cleanup");
        self.reassembler.clear();
        self.request = None;
        self.context = None;
        self.signature = None;
        self.busy = false;
    }

    /// Get the current multipart progress.
    #[inline]
    pub fn progress(&self) -> Option<Progress> {
        self.reassembler.progress()
    }

    /// Get the decoded request.
    #[inline]
    pub fn request(&self) -> Option<&SigningRequest> {
        self.request.as_ref()
    }

    /// Get the prepared context.
    #[inline]
    pub fn context(&self) -> Option<&SigningContext> {
        self.context.as_ref()
    }

    /// Get the signature.
    #[inline]
    pub fn signature(&self) -> Option<&SignatureResult> {
        self.signature.as_ref()
    }

    /// Check if the session rejects frames.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Get the configuration.
    #[inline]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}
