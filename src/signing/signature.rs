//! Signature encoding.

use bytes::Bytes;

/// Type tag of an sr25519 signature.
pub const SIG_TYPE_SR25519: u8 = 0x01;

/// Signature ready for display.
///
/// Rendered as the optional one-byte type tag followed by the raw
/// signature, hex-encoded without `0x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureResult {
    /// Leading type tag (Substrate only).
    pub signature_type_tag: Option<u8>,
    /// Signature as returned by the capability.
    pub raw_signature: Bytes,
}

impl SignatureResult {
    /// Create a result.
    pub fn new(signature_type_tag: Option<u8>, raw_signature: Bytes) -> Self {
        Self {
            signature_type_tag,
            raw_signature,
        }
    }

    /// Tag and signature as bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.raw_signature.len());
        out.extend(self.signature_type_tag);
        out.extend_from_slice(&self.raw_signature);
        out
    }

    /// Hex rendition, no `0x` prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}
