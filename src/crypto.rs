//! Hashing and address helpers.
//!
//! - [`Hasher`] - pluggable hash capability used for oversized payloads
//! - [`Blake2bHasher`] - default Blake2b-256 implementation
//! - [`keccak256`] / [`ethereum_message_hash`] - Ethereum hashing
//! - [`ss58_encode`] - Substrate address encoding

use blake2::digest::consts::U32;
use blake2::{Blake2b, Blake2b512, Digest};
use bytes::Bytes;
use sha3::Keccak256;

/// SS58 prefix of Kusama, used when no network is known.
pub const KUSAMA_PREFIX: u16 = 2;

/// Largest prefix representable in the two-byte SS58 form.
pub const MAX_SS58_PREFIX: u16 = 16_383;

const SS58_CHECKSUM_PREIMAGE: &[u8] = b"SS58PRE";
const SS58_CHECKSUM_LEN: usize = 2;

const ETHEREUM_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n";

/// Hash capability applied to oversized Substrate payloads.
pub trait Hasher: Send + Sync {
    /// Hash `data`.
    fn hash(&self, data: &[u8]) -> Bytes;
}

/// Blake2b with a 256-bit digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake2bHasher;

impl Hasher for Blake2bHasher {
    fn hash(&self, data: &[u8]) -> Bytes {
        let digest = Blake2b::<U32>::digest(data);
        Bytes::copy_from_slice(&digest)
    }
}

/// Keccak-256 digest.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Hash signed by `personal_sign`: prefix, decimal length, message.
pub fn ethereum_message_hash(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(ETHEREUM_MESSAGE_PREFIX);
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// Encode a public key as an SS58 address for `prefix`.
///
/// # Example
///
/// ```
/// use uos_scanner::crypto::ss58_encode;
///
/// let alice = hex::decode("d43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d").unwrap();
/// assert_eq!(ss58_encode(&alice, 42), "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY");
/// ```
pub fn ss58_encode(public_key: &[u8], prefix: u16) -> String {
    let prefix = prefix & MAX_SS58_PREFIX;
    let mut data = Vec::with_capacity(2 + public_key.len() + SS58_CHECKSUM_LEN);

    if prefix < 64 {
        data.push(prefix as u8);
    } else {
        let first = ((prefix & 0b0000_0000_1111_1100) >> 2) as u8 | 0b0100_0000;
        let second = (prefix >> 8) as u8 | ((prefix & 0b0000_0000_0000_0011) as u8) << 6;
        data.push(first);
        data.push(second);
    }
    data.extend_from_slice(public_key);

    let checksum = Blake2b512::new()
        .chain_update(SS58_CHECKSUM_PREIMAGE)
        .chain_update(&data)
        .finalize();
    data.extend_from_slice(&checksum[..SS58_CHECKSUM_LEN]);

    bs58::encode(data).into_string()
}
