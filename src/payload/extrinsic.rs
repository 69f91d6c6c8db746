//! SCALE-encoded Substrate extrinsic signing payload (version 3).
//!
//! ```text
//! ┌──────────────┬─────┬─────────┬─────────┬──────────┬─────────┬────────┐
//! │ Call         │ Era │ Nonce   │ Tip     │ Spec ver │ Genesis │ Block  │
//! │ compact len  │ 1|2 │ compact │ compact │ u32 LE   │ 32      │ 32     │
//! │ + bytes      │     │         │         │          │         │        │
//! └──────────────┴─────┴─────────┴─────────┴──────────┴─────────┴────────┘
//! ```
//!
//! The scanned form carries a length prefix on the call; the signed form
//! (see [`StructuredExtrinsic::signable_bytes`]) does not.

use parity_scale_codec::{Compact, Decode, DecodeAll, Encode, Error, Input, Output};

use crate::error::{Result, ScanError};

/// Extrinsic payload version produced by the decoder.
pub const EXTRINSIC_PAYLOAD_VERSION: u8 = 3;

/// Transaction lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Era {
    /// Valid forever.
    Immortal,
    /// Valid for `period` blocks starting at `phase`.
    Mortal {
        /// Period in blocks, a power of two in `4..=65536`.
        period: u64,
        /// Phase within the period.
        phase: u64,
    },
}

impl Era {
    /// Check if the era never expires.
    pub fn is_immortal(&self) -> bool {
        matches!(self, Era::Immortal)
    }
}

impl Encode for Era {
    fn encode_to<T: Output + ?Sized>(&self, output: &mut T) {
        match self {
            Era::Immortal => output.push_byte(0),
            Era::Mortal { period, phase } => {
                let quantize_factor = (*period >> 12).max(1);
                let low = u64::from(period.trailing_zeros().saturating_sub(1)).clamp(1, 15);
                let encoded = (low | ((phase / quantize_factor) << 4)) as u16;
                encoded.encode_to(output);
            }
        }
    }
}

impl Decode for Era {
    fn decode<I: Input>(input: &mut I) -> std::result::Result<Self, Error> {
        let first = input.read_byte()?;
        if first == 0 {
            return Ok(Era::Immortal);
        }
        let encoded = u64::from(first) + (u64::from(input.read_byte()?) << 8);
        let period = 2 << (encoded % (1 << 4));
        let quantize_factor = (period >> 12).max(1);
        let phase = (encoded >> 4) * quantize_factor;
        if period >= 4 && phase < period {
            Ok(Era::Mortal { period, phase })
        } else {
            Err("Invalid period and phase".into())
        }
    }
}

/// Decoded extrinsic signing payload.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct StructuredExtrinsic {
    /// Encoded call.
    pub method: Vec<u8>,
    /// Transaction lifetime.
    pub era: Era,
    /// Sender nonce.
    #[codec(compact)]
    pub nonce: u64,
    /// Tip for the block author.
    #[codec(compact)]
    pub tip: u128,
    /// Runtime spec version.
    pub spec_version: u32,
    /// Genesis hash of the chain.
    pub genesis_hash: [u8; 32],
    /// Checkpoint block hash (genesis hash for immortal transactions).
    pub block_hash: [u8; 32],
}

impl StructuredExtrinsic {
    /// Decode a scanned payload. All bytes must be consumed.
    pub fn from_raw(raw: &[u8]) -> Result<Self> {
        Self::decode_all(&mut &raw[..]).map_err(|e| ScanError::InvalidExtrinsic(e.to_string()))
    }

    /// Payload version.
    #[inline]
    pub fn version(&self) -> u8 {
        EXTRINSIC_PAYLOAD_VERSION
    }

    /// Bytes a signer signs: the payload without the call length prefix.
    pub fn signable_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.size_hint());
        out.extend_from_slice(&self.method);
        self.era.encode_to(&mut out);
        Compact(self.nonce).encode_to(&mut out);
        Compact(self.tip).encode_to(&mut out);
        self.spec_version.encode_to(&mut out);
        out.extend_from_slice(&self.genesis_hash);
        out.extend_from_slice(&self.block_hash);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(era: Era) -> StructuredExtrinsic {
        StructuredExtrinsic {
            method: vec![0x05, 0x00, 0xff, 0x01, 0x02],
            era,
            nonce: 7,
            tip: 0,
            spec_version: 1_055,
            genesis_hash: [0xb0; 32],
            block_hash: [0x1b; 32],
        }
    }

    #[test]
    fn test_mortal_era_bytes() {
        let era = Era::Mortal {
            period: 64,
            phase: 42,
        };
        assert_eq!(era.encode(), vec![0xa5, 0x02]);
        assert_eq!(Era::decode(&mut &[0xa5, 0x02][..]).unwrap(), era);
    }

    #[test]
    fn test_immortal_era_bytes() {
        assert_eq!(Era::Immortal.encode(), vec![0x00]);
        assert!(Era::decode(&mut &[0x00][..]).unwrap().is_immortal());
    }

    #[test]
    fn test_invalid_era() {
        // period 2 is below the minimum of 4
        assert!(Era::decode(&mut &[0x10, 0x00][..]).is_err());
    }

    #[test]
    fn test_decode_scanned_payload() {
        let original = sample(Era::Mortal {
            period: 64,
            phase: 42,
        });
        let raw = original.encode();

        // Call is length-prefixed on the wire
        assert_eq!(raw[0], 5 << 2);

        let decoded = StructuredExtrinsic::from_raw(&raw).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(decoded.version(), 3);
    }

    #[test]
    fn test_signable_bytes_drop_length_prefix() {
        let ext = sample(Era::Immortal);
        let raw = ext.encode();

        assert_eq!(ext.signable_bytes(), raw[1..].to_vec());
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut raw = sample(Era::Immortal).encode();
        raw.push(0x00);

        let err = StructuredExtrinsic::from_raw(&raw).unwrap_err();
        assert!(matches!(err, ScanError::InvalidExtrinsic(_)));
    }

    #[test]
    fn test_short_payload_rejected() {
        let raw = sample(Era::Immortal).encode();
        assert!(StructuredExtrinsic::from_raw(&raw[..raw.len() - 1]).is_err());
    }
}
