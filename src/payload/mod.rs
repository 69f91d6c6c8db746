//! Payload module - decoding assembled bodies into signing requests.
//!
//! - [`PayloadDecoder`] - protocol dispatch, oversize handling, addresses
//! - [`StructuredExtrinsic`] - SCALE extrinsic signing payload
//! - [`EthereumTransaction`] - legacy RLP transaction summary

mod decoder;
mod ethereum;
mod extrinsic;
mod types;

pub use decoder::{DecoderConfig, NetworkRegistry, PayloadDecoder, DEFAULT_OVERSIZE_THRESHOLD};
pub use ethereum::EthereumTransaction;
pub use extrinsic::{Era, StructuredExtrinsic, EXTRINSIC_PAYLOAD_VERSION};
pub use types::{Action, CryptoType, Ecosystem, Payload, SigningRequest, SubstrateVariant};
