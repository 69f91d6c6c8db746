//! Decoded signing request types.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::extrinsic::StructuredExtrinsic;
use crate::error::{Result, ScanError};

/// Account ecosystem the request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    /// Protocol byte `0x45` (`E`).
    Ethereum,
    /// Protocol byte `0x53` (`S`).
    Substrate,
}

impl Ecosystem {
    /// Protocol indicator byte for Ethereum payloads.
    pub const ETHEREUM_BYTE: u8 = 0x45;
    /// Protocol indicator byte for Substrate payloads.
    pub const SUBSTRATE_BYTE: u8 = 0x53;

    /// Map a protocol indicator byte.
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            Self::ETHEREUM_BYTE => Ok(Ecosystem::Ethereum),
            Self::SUBSTRATE_BYTE => Ok(Ecosystem::Substrate),
            other => Err(ScanError::UnrecognizedProtocol(other)),
        }
    }
}

/// What the user is asked to sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    /// A transaction (or its hash).
    SignTransaction,
    /// An arbitrary message (or its hash).
    SignMessage,
}

impl Action {
    /// Name used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::SignTransaction => "signTransaction",
            Action::SignMessage => "signMessage",
        }
    }

    /// Map an Ethereum action byte.
    pub fn from_ethereum_byte(byte: u8) -> Result<Self> {
        match byte {
            0x00 => Ok(Action::SignMessage),
            0x01 => Ok(Action::SignTransaction),
            other => Err(ScanError::UnknownAction(other)),
        }
    }
}

/// Signature algorithm of the signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CryptoType {
    /// Substrate crypto byte `0x00`.
    Ed25519,
    /// Substrate crypto byte `0x01`.
    Sr25519,
    /// secp256k1, implied for Ethereum.
    Ecdsa,
}

impl CryptoType {
    /// Map a Substrate crypto byte.
    pub fn from_substrate_byte(byte: u8) -> Result<Self> {
        match byte {
            0x00 => Ok(CryptoType::Ed25519),
            0x01 => Ok(CryptoType::Sr25519),
            other => Err(ScanError::UnknownCrypto(other)),
        }
    }

    /// Name used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            CryptoType::Ed25519 => "ed25519",
            CryptoType::Sr25519 => "sr25519",
            CryptoType::Ecdsa => "ecdsa",
        }
    }
}

/// Substrate payload variant (third body byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubstrateVariant {
    /// `0x00`: mortal extrinsic payload.
    MortalTransaction,
    /// `0x01`: payload is already a hash.
    PreHashedTransaction,
    /// `0x02`: immortal extrinsic payload.
    ImmortalTransaction,
    /// `0x03`: message to sign.
    Message,
}

impl SubstrateVariant {
    /// Map a Substrate variant byte.
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0x00 => Ok(SubstrateVariant::MortalTransaction),
            0x01 => Ok(SubstrateVariant::PreHashedTransaction),
            0x02 => Ok(SubstrateVariant::ImmortalTransaction),
            0x03 => Ok(SubstrateVariant::Message),
            other => Err(ScanError::UnknownAction(other)),
        }
    }

    /// Action implied by the variant.
    pub fn action(&self) -> Action {
        match self {
            SubstrateVariant::Message => Action::SignMessage,
            _ => Action::SignTransaction,
        }
    }
}

/// Payload carried by a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Decoded Substrate extrinsic payload.
    Extrinsic(StructuredExtrinsic),
    /// Hash to sign in place of the full payload.
    Hash(Bytes),
    /// Substrate message; `text` is for display, `bytes` are signed.
    Message {
        /// Lossy UTF-8 rendition.
        text: String,
        /// Raw message bytes.
        bytes: Bytes,
    },
    /// Un-parsed RLP-encoded Ethereum transaction.
    RlpTransaction(Bytes),
    /// Raw Ethereum message bytes.
    RawMessage(Bytes),
}

/// A fully decoded signing request.
///
/// Produced once per scanned payload and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    /// Ecosystem of the signer.
    pub ecosystem: Ecosystem,
    /// Requested action.
    pub action: Action,
    /// Signer crypto declared by the payload.
    pub crypto: CryptoType,
    /// Signer address (SS58 for Substrate, 40 lowercase hex digits for Ethereum).
    pub signer_address: String,
    /// Substrate public key behind `signer_address`.
    pub public_key: Option<[u8; 32]>,
    /// Whether `payload` is a hash rather than the data itself.
    pub is_hash: bool,
    /// Whether the payload exceeded the oversize threshold.
    pub is_oversized: bool,
    /// The payload.
    pub payload: Payload,
    /// Decoded extrinsic of an oversized transaction, when it decodes.
    pub pre_hash: Option<StructuredExtrinsic>,
    /// SS58 prefix used for `signer_address`.
    pub network_prefix: Option<u16>,
}

impl SigningRequest {
    /// Check if this is a transaction request.
    #[inline]
    pub fn is_transaction(&self) -> bool {
        self.action == Action::SignTransaction
    }

    /// Check if this is a message request.
    #[inline]
    pub fn is_message(&self) -> bool {
        self.action == Action::SignMessage
    }

    /// Message text, when the payload is a displayable message.
    pub fn message_text(&self) -> Option<&str> {
        match &self.payload {
            Payload::Message { text, .. } => Some(text),
            _ => None,
        }
    }
}
