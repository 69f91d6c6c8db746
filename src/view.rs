//! Read-only views for the presentation layer.
//!
//! Every session transition hands out one of these instead of its internal
//! state. Views serialize to camelCase JSON via [`to_json`].
//!
//! ```text
//! ScanEvent::Progress ─► ProgressView   { receivedCount, totalFrameCount, missingIndices }
//! ScanEvent::Ready    ─► RequestView    { ecosystem, action, signerAddress, payload, .. }
//! prepare()           ─► ContextView    { request, accountAddress, dataToSign, .. }
//! sign()              ─► SignatureView  { signature, typeTag }
//! ```

use serde::Serialize;

use crate::payload::{
    Action, CryptoType, Ecosystem, Era, EthereumTransaction, Payload, SigningRequest,
    StructuredExtrinsic,
};
use crate::protocol::Progress;
use crate::signing::{SignatureResult, SigningContext};

/// Serialize a view to JSON.
pub fn to_json<T: Serialize>(view: &T) -> String {
    serde_json::to_string(view).expect("JSON serialization should not fail")
}

/// Multipart scan progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    /// Frames received so far.
    pub received_count: u16,
    /// Frames in the set.
    pub total_frame_count: u16,
    /// Indices still to scan, ascending.
    pub missing_indices: Vec<u16>,
    /// Whether the set is complete.
    pub is_complete: bool,
}

impl From<&Progress> for ProgressView {
    fn from(progress: &Progress) -> Self {
        Self {
            received_count: progress.received_count,
            total_frame_count: progress.total_frame_count,
            missing_indices: progress.missing_indices.clone(),
            is_complete: progress.is_complete(),
        }
    }
}

/// Decoded extrinsic fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtrinsicView {
    /// Encoded call, hex.
    pub method: String,
    /// Whether the transaction has a limited lifetime.
    pub mortal: bool,
    /// Era period in blocks, mortal only.
    pub period: Option<u64>,
    /// Era phase, mortal only.
    pub phase: Option<u64>,
    /// Sender nonce.
    pub nonce: u64,
    /// Tip for the block author.
    pub tip: u128,
    /// Runtime spec version.
    pub spec_version: u32,
    /// Genesis hash, hex.
    pub genesis_hash: String,
    /// Checkpoint block hash, hex.
    pub block_hash: String,
}

impl From<&StructuredExtrinsic> for ExtrinsicView {
    fn from(ext: &StructuredExtrinsic) -> Self {
        let (period, phase) = match ext.era {
            Era::Immortal => (None, None),
            Era::Mortal { period, phase } => (Some(period), Some(phase)),
        };
        Self {
            method: hex::encode(&ext.method),
            mortal: !ext.era.is_immortal(),
            period,
            phase,
            nonce: ext.nonce,
            tip: ext.tip,
            spec_version: ext.spec_version,
            genesis_hash: hex::encode(ext.genesis_hash),
            block_hash: hex::encode(ext.block_hash),
        }
    }
}

/// Request payload, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PayloadView {
    /// Decoded Substrate extrinsic.
    Extrinsic(ExtrinsicView),
    /// Hash to sign.
    Hash { hash: String },
    /// Substrate message.
    Message { text: String },
    /// RLP-encoded Ethereum transaction.
    RlpTransaction { rlp: String },
    /// Ethereum message; `text` is the lossy UTF-8 rendition.
    RawMessage { hex: String, text: String },
}

impl From<&Payload> for PayloadView {
    fn from(payload: &Payload) -> Self {
        match payload {
            Payload::Extrinsic(ext) => PayloadView::Extrinsic(ext.into()),
            Payload::Hash(hash) => PayloadView::Hash {
                hash: hex::encode(hash),
            },
            Payload::Message { text, .. } => PayloadView::Message { text: text.clone() },
            Payload::RlpTransaction(rlp) => PayloadView::RlpTransaction {
                rlp: hex::encode(rlp),
            },
            Payload::RawMessage(bytes) => PayloadView::RawMessage {
                hex: hex::encode(bytes),
                text: String::from_utf8_lossy(bytes).into_owned(),
            },
        }
    }
}

/// Decoded signing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestView {
    /// Ecosystem of the signer.
    pub ecosystem: Ecosystem,
    /// Requested action.
    pub action: Action,
    /// Signer crypto.
    pub crypto: CryptoType,
    /// Address as decoded from the payload.
    pub signer_address: String,
    /// Whether the payload is a hash.
    pub is_hash: bool,
    /// Whether the payload was hashed for exceeding the threshold.
    pub is_oversized: bool,
    /// SS58 prefix of `signer_address`; `None` for Ethereum.
    pub network_prefix: Option<u16>,
    /// The payload.
    pub payload: PayloadView,
    /// Extrinsic behind an oversized hash, when it decoded.
    pub pre_hash: Option<ExtrinsicView>,
}

impl From<&SigningRequest> for RequestView {
    fn from(request: &SigningRequest) -> Self {
        Self {
            ecosystem: request.ecosystem,
            action: request.action,
            crypto: request.crypto,
            signer_address: request.signer_address.clone(),
            is_hash: request.is_hash,
            is_oversized: request.is_oversized,
            network_prefix: request.network_prefix,
            payload: (&request.payload).into(),
            pre_hash: request.pre_hash.as_ref().map(ExtrinsicView::from),
        }
    }
}

/// Prepared request awaiting a signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextView {
    /// The request being signed.
    pub request: RequestView,
    /// Address the signing account is stored under.
    pub account_address: String,
    /// Account label, if any.
    pub account_name: Option<String>,
    /// Bytes handed to the signer, hex.
    pub data_to_sign: String,
    /// Ethereum transaction summary.
    pub transaction: Option<EthereumTransaction>,
}

impl From<&SigningContext> for ContextView {
    fn from(context: &SigningContext) -> Self {
        Self {
            request: (&context.request).into(),
            account_address: context.account.address.clone(),
            account_name: context.account.name.clone(),
            data_to_sign: hex::encode(&context.data_to_sign),
            transaction: context.transaction.clone(),
        }
    }
}

/// Signature to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureView {
    /// Tag and signature, hex without `0x`.
    pub signature: String,
    /// Leading signature type tag; `None` for Ethereum.
    pub type_tag: Option<u8>,
}

impl From<&SignatureResult> for SignatureView {
    fn from(result: &SignatureResult) -> Self {
        Self {
            signature: result.to_hex(),
            type_tag: result.signature_type_tag,
        }
    }
}
