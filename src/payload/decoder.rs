//! Payload decoder - turns an assembled body into a [`SigningRequest`].
//!
//! # Body layouts
//!
//! ```text
//! Ethereum (0x45)
//! ┌──────┬────────┬──────────────┬──────────────────────────────┐
//! │ 0x45 │ action │ address (20) │ RLP transaction / message    │
//! └──────┴────────┴──────────────┴──────────────────────────────┘
//!
//! Substrate (0x53)
//! ┌──────┬────────┬─────────┬─────────────────┬─────────────────┐
//! │ 0x53 │ crypto │ variant │ public key (32) │ raw payload     │
//! └──────┴────────┴─────────┴─────────────────┴─────────────────┘
//! ```
//!
//! Substrate raw payloads longer than the oversize threshold are replaced
//! by their hash; the [`Hasher`] capability decides which hash.

use std::sync::Arc;

use bytes::Bytes;
use serde::Deserialize;

use super::extrinsic::StructuredExtrinsic;
use super::types::{Action, CryptoType, Ecosystem, Payload, SigningRequest, SubstrateVariant};
use crate::crypto::{ss58_encode, Blake2bHasher, Hasher, KUSAMA_PREFIX};
use crate::error::{Result, ScanError};
use crate::protocol::split_frame_header;

/// Default oversize threshold in bytes.
pub const DEFAULT_OVERSIZE_THRESHOLD: usize = 256;

const ETHEREUM_ADDRESS_LEN: usize = 20;
const PUBLIC_KEY_LEN: usize = 32;

/// Decoder configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DecoderConfig {
    /// Raw Substrate payloads longer than this are signed as a hash.
    pub oversize_threshold: usize,
    /// SS58 prefix used when the network is unknown.
    pub default_network_prefix: u16,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            oversize_threshold: DEFAULT_OVERSIZE_THRESHOLD,
            default_network_prefix: KUSAMA_PREFIX,
        }
    }
}

impl DecoderConfig {
    /// Set the oversize threshold.
    pub fn oversize_threshold(mut self, bytes: usize) -> Self {
        self.oversize_threshold = bytes;
        self
    }

    /// Set the fallback SS58 prefix.
    pub fn default_network_prefix(mut self, prefix: u16) -> Self {
        self.default_network_prefix = prefix;
        self
    }
}

/// Network lookup by genesis hash.
pub trait NetworkRegistry: Send + Sync {
    /// SS58 prefix of the network with this genesis hash, if known.
    fn prefix_for_genesis(&self, genesis_hash: &[u8; 32]) -> Option<u16>;

    /// Prefixes of every known network, tried in order when a signer is
    /// not stored under the decoded address.
    fn known_prefixes(&self) -> Vec<u16> {
        Vec::new()
    }
}

/// Reads fixed-width fields, reporting short reads as `TruncatedPayload`.
struct Cursor {
    buf: Bytes,
}

impl Cursor {
    fn new(buf: Bytes) -> Self {
        Self { buf }
    }

    fn byte(&mut self, field: &'static str) -> Result<u8> {
        Ok(self.take(field, 1)?[0])
    }

    fn take(&mut self, field: &'static str, needed: usize) -> Result<Bytes> {
        if self.buf.len() < needed {
            return Err(ScanError::TruncatedPayload {
                field,
                needed,
                available: self.buf.len(),
            });
        }
        Ok(self.buf.split_to(needed))
    }

    fn rest(self) -> Bytes {
        self.buf
    }
}

/// Decoder for assembled signing-request bodies.
#[derive(Clone)]
pub struct PayloadDecoder {
    config: DecoderConfig,
    hasher: Arc<dyn Hasher>,
    networks: Option<Arc<dyn NetworkRegistry>>,
}

impl Default for PayloadDecoder {
    fn default() -> Self {
        Self::new(DecoderConfig::default())
    }
}

impl std::fmt::Debug for PayloadDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayloadDecoder")
            .field("config", &self.config)
            .field("networks", &self.networks.is_some())
            .finish()
    }
}

impl PayloadDecoder {
    /// Create a decoder with the Blake2b-256 hasher and no network registry.
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            hasher: Arc::new(Blake2bHasher),
            networks: None,
        }
    }

    /// Replace the hash capability.
    pub fn with_hasher(mut self, hasher: Arc<dyn Hasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Attach a network registry for address prefixes.
    pub fn with_networks(mut self, networks: Arc<dyn NetworkRegistry>) -> Self {
        self.networks = Some(networks);
        self
    }

    /// Get the configuration.
    #[inline]
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode a single framed payload (header included).
    ///
    /// The header is informational here; multipart sets go through the
    /// reassembler and [`decode_body`](Self::decode_body).
    pub fn decode(&self, bytes: Bytes) -> Result<SigningRequest> {
        let frame = split_frame_header(bytes)?;
        self.decode_body(frame.body)
    }

    /// Decode an assembled body.
    ///
    /// # Example
    ///
    /// ```
    /// use bytes::Bytes;
    /// use uos_scanner::payload::{Action, Ecosystem, PayloadDecoder};
    ///
    /// let mut body = vec![0x45, 0x00];
    /// body.extend_from_slice(&[0xab; 20]);
    /// body.extend_from_slice(b"hi");
    ///
    /// let request = PayloadDecoder::default().decode_body(Bytes::from(body)).unwrap();
    /// assert_eq!(request.ecosystem, Ecosystem::Ethereum);
    /// assert_eq!(request.action, Action::SignMessage);
    /// assert_eq!(request.signer_address, "ab".repeat(20));
    /// ```
    pub fn decode_body(&self, body: Bytes) -> Result<SigningRequest> {
        let mut cursor = Cursor::new(body);
        let protocol = cursor.byte("protocol")?;

        match Ecosystem::from_byte(protocol)? {
            Ecosystem::Ethereum => self.decode_ethereum(cursor),
            Ecosystem::Substrate => self.decode_substrate(cursor),
        }
    }

    fn decode_ethereum(&self, mut cursor: Cursor) -> Result<SigningRequest> {
        let action = Action::from_ethereum_byte(cursor.byte("action")?)?;
        let address = cursor.take("address", ETHEREUM_ADDRESS_LEN)?;
        let rest = cursor.rest();

        let payload = match action {
            Action::SignTransaction => Payload::RlpTransaction(rest),
            Action::SignMessage => Payload::RawMessage(rest),
        };

        tracing::debug!("Decoded Ethereum {} request", action.as_str());

        Ok(SigningRequest {
            ecosystem: Ecosystem::Ethereum,
            action,
            crypto: CryptoType::Ecdsa,
            signer_address: hex::encode(&address),
            public_key: None,
            is_hash: false,
            is_oversized: false,
            payload,
            pre_hash: None,
            network_prefix: None,
        })
    }

    fn decode_substrate(&self, mut cursor: Cursor) -> Result<SigningRequest> {
        let crypto = CryptoType::from_substrate_byte(cursor.byte("crypto")?)?;
        let variant = SubstrateVariant::from_byte(cursor.byte("variant")?)?;
        let mut public_key = [0u8; PUBLIC_KEY_LEN];
        public_key.copy_from_slice(&cursor.take("public key", PUBLIC_KEY_LEN)?);
        let raw = cursor.rest();
        let raw_len = raw.len();

        let is_oversized = variant != SubstrateVariant::PreHashedTransaction
            && raw.len() > self.config.oversize_threshold;

        let mut pre_hash = None;
        let (payload, is_hash) = match variant {
            SubstrateVariant::PreHashedTransaction => (Payload::Hash(raw), true),
            SubstrateVariant::MortalTransaction | SubstrateVariant::ImmortalTransaction => {
                if is_oversized {
                    pre_hash = StructuredExtrinsic::from_raw(&raw).ok();
                    (Payload::Hash(self.hasher.hash(&raw)), true)
                } else {
                    let extrinsic = StructuredExtrinsic::from_raw(&raw)?;
                    (Payload::Extrinsic(extrinsic), false)
                }
            }
            SubstrateVariant::Message => {
                if is_oversized {
                    (Payload::Hash(self.hasher.hash(&raw)), true)
                } else {
                    let text = String::from_utf8_lossy(&raw).into_owned();
                    (Payload::Message { text, bytes: raw }, false)
                }
            }
        };

        let genesis_hash = match (&payload, &pre_hash) {
            (Payload::Extrinsic(ext), _) | (_, Some(ext)) => Some(ext.genesis_hash),
            _ => None,
        };
        let prefix = genesis_hash
            .and_then(|genesis| {
                self.networks
                    .as_ref()
                    .and_then(|networks| networks.prefix_for_genesis(&genesis))
            })
            .unwrap_or(self.config.default_network_prefix);

        if is_oversized {
            tracing::debug!(
                "Substrate payload oversized ({} > {} bytes), signing hash",
                raw_len,
                self.config.oversize_threshold
            );
        }

        Ok(SigningRequest {
            ecosystem: Ecosystem::Substrate,
            action: variant.action(),
            crypto,
            signer_address: ss58_encode(&public_key, prefix),
            public_key: Some(public_key),
            is_hash,
            is_oversized,
            payload,
            pre_hash,
            network_prefix: Some(prefix),
        })
    }
}
