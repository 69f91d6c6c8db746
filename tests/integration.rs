//! Integration tests for uos-scanner.
//!
//! These tests drive the session from raw scanned strings to signatures.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use parity_scale_codec::Encode;
use proptest::prelude::*;

use uos_scanner::crypto::{keccak256, Blake2bHasher, Hasher};
use uos_scanner::payload::{
    Action, CryptoType, Ecosystem, Era, NetworkRegistry, Payload, StructuredExtrinsic,
};
use uos_scanner::protocol::{decode_raw_frame, encode_raw_frame, split_frame_header, split_into_frames};
use uos_scanner::signing::{InMemoryAccounts, SecretSeed, SecretVault, Signer, SignerAccount};
use uos_scanner::view::{to_json, PayloadView, SignatureView};
use uos_scanner::{CapabilityError, ScanError, ScanEvent, ScanSession, SigningCapability};

const SPARTA_SCAN: &str = "4370000010000530103f4cd755672a8f9542ca9da4fbf2182e79135d94304002e6a09ffc96fef6e6c4c5448495320495320535041525441210ec11ec11ec11ec";
const SPARTA_ADDRESS: &str = "J7JEcan7j6m2Fa9TbiGJ7jj52oB6CL3eQVbmfiMxKu7TR3X";
const SPARTA_POLKADOT_ADDRESS: &str = "16XyidVyM9MJi8mDeXxDYKCsn4Wayq51GXPLYJRm2ci8tpY7";
const SPARTA_KEY: &str = "f4cd755672a8f9542ca9da4fbf2182e79135d94304002e6a09ffc96fef6e6c4c";
const ETH_ADDRESS: &str = "8e1fb6f9a4a4b4a8ea8e4e5e1a48a1b8a4c8e1f0";
const EIP155_RLP: &str =
    "ec098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080018080";

/// Signer returning a fixed signature and recording what it signed.
struct RecordingSigner {
    signature: Vec<u8>,
    signed: std::sync::Mutex<Vec<Vec<u8>>>,
}

impl RecordingSigner {
    fn new(signature: Vec<u8>) -> Self {
        Self {
            signature,
            signed: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Signer for RecordingSigner {
    async fn sign(&self, _account: &SignerAccount, data: &[u8]) -> Result<Bytes, CapabilityError> {
        self.signed.lock().unwrap().push(data.to_vec());
        Ok(Bytes::from(self.signature.clone()))
    }
}

/// Vault accepting one passphrase; "signs" by prefixing the seed.
struct TestVault;

#[async_trait]
impl SecretVault for TestVault {
    async fn decrypt(
        &self,
        encrypted_seed: &[u8],
        passphrase: &str,
    ) -> Result<SecretSeed, CapabilityError> {
        if passphrase != "correct horse" {
            return Err(CapabilityError::WrongPassphrase);
        }
        Ok(SecretSeed::new(encrypted_seed.iter().map(|b| b ^ 0xff).collect()))
    }

    async fn sign_with_seed(
        &self,
        seed: &SecretSeed,
        crypto: CryptoType,
        _data: &[u8],
    ) -> Result<Bytes, CapabilityError> {
        assert_eq!(crypto, CryptoType::Sr25519);
        let mut signature = seed.expose().to_vec();
        signature.resize(64, 0x77);
        Ok(Bytes::from(signature))
    }
}

struct Kusama;

impl NetworkRegistry for Kusama {
    fn prefix_for_genesis(&self, genesis_hash: &[u8; 32]) -> Option<u16> {
        (genesis_hash == &[0xb0; 32]).then_some(2)
    }

    fn known_prefixes(&self) -> Vec<u16> {
        vec![0, 2, 42]
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn accounts() -> Arc<InMemoryAccounts> {
    Arc::new(
        [
            SignerAccount::new(SPARTA_ADDRESS, Ecosystem::Substrate, CryptoType::Sr25519)
                .with_encrypted_seed(vec![0xfe, 0xfd])
                .with_name("sparta"),
            SignerAccount::new(ETH_ADDRESS, Ecosystem::Ethereum, CryptoType::Ecdsa),
        ]
        .into_iter()
        .collect(),
    )
}

fn session() -> ScanSession {
    ScanSession::builder()
        .accounts(accounts())
        .networks(Arc::new(Kusama))
        .build()
}

fn extrinsic(method_len: usize) -> StructuredExtrinsic {
    StructuredExtrinsic {
        method: (0..method_len).map(|i| i as u8).collect(),
        era: Era::Mortal {
            period: 64,
            phase: 42,
        },
        nonce: 5,
        tip: 0,
        spec_version: 2_030,
        genesis_hash: [0xb0; 32],
        block_hash: [0x1b; 32],
    }
}

fn substrate_body(variant: u8, raw: &[u8]) -> Vec<u8> {
    let mut body = vec![0x53, 0x01, variant];
    body.extend_from_slice(&hex::decode(SPARTA_KEY).unwrap());
    body.extend_from_slice(raw);
    body
}

fn scans(body: &[u8], max_body_len: usize) -> Vec<String> {
    split_into_frames(body, max_body_len)
        .unwrap()
        .iter()
        .map(|frame| encode_raw_frame(frame))
        .collect()
}

/// Submit scans in order, returning the first Ready event.
fn scan_all(session: &mut ScanSession, scans: &[String]) -> ScanEvent {
    let mut last = None;
    for scan in scans {
        last = Some(session.submit_scan(scan).unwrap());
    }
    last.unwrap()
}

/// The single-frame Substrate message scenario.
#[tokio::test]
async fn test_sparta_message_signature() {
    init_tracing();
    let mut session = session();

    let view = match session.submit_scan(SPARTA_SCAN).unwrap() {
        ScanEvent::Ready(view) => view,
        ScanEvent::Progress(_) => panic!("single frame must complete"),
    };
    assert_eq!(view.signer_address, SPARTA_ADDRESS);
    assert_eq!(view.action, Action::SignMessage);
    assert_eq!(
        view.payload,
        PayloadView::Message {
            text: "THIS IS SPARTA!".into()
        }
    );

    let context = session.prepare().unwrap();
    assert_eq!(&context.data_to_sign[..], b"THIS IS SPARTA!");
    assert_eq!(context.account.name.as_deref(), Some("sparta"));

    let signer = RecordingSigner::new(vec![0x5c; 64]);
    let result = session
        .sign(SigningCapability::Unlocked(&signer))
        .await
        .unwrap();

    assert_eq!(result.to_hex(), format!("01{}", "5c".repeat(64)));
    assert!(!result.to_hex().starts_with("0x"));
    assert_eq!(signer.signed.lock().unwrap()[0], b"THIS IS SPARTA!");
}

/// Ethereum transaction from a single frame, signed over the RLP hash.
#[tokio::test]
async fn test_signer_stored_under_polkadot_address() {
    init_tracing();
    let accounts: InMemoryAccounts = [SignerAccount::new(
        SPARTA_POLKADOT_ADDRESS,
        Ecosystem::Substrate,
        CryptoType::Sr25519,
    )]
    .into_iter()
    .collect();
    let mut session = ScanSession::builder()
        .accounts(Arc::new(accounts))
        .networks(Arc::new(Kusama))
        .build();

    let view = match session.submit_scan(SPARTA_SCAN).unwrap() {
        ScanEvent::Ready(view) => view,
        ScanEvent::Progress(_) => panic!("single frame must complete"),
    };
    assert_eq!(view.signer_address, SPARTA_ADDRESS);

    let context = session.prepare().unwrap();
    assert_eq!(context.account.address, SPARTA_POLKADOT_ADDRESS);

    let signer = RecordingSigner::new(vec![0x5c; 64]);
    let result = session
        .sign(SigningCapability::Unlocked(&signer))
        .await
        .unwrap();
    assert_eq!(result.signature_type_tag, Some(0x01));
}

#[test]
fn test_signer_under_other_prefix_needs_networks() {
    let accounts: InMemoryAccounts = [SignerAccount::new(
        SPARTA_POLKADOT_ADDRESS,
        Ecosystem::Substrate,
        CryptoType::Sr25519,
    )]
    .into_iter()
    .collect();
    let mut session = ScanSession::builder().accounts(Arc::new(accounts)).build();

    session.submit_scan(SPARTA_SCAN).unwrap();
    let err = session.prepare().unwrap_err();
    assert!(matches!(err, ScanError::SignerNotFound(addr) if addr == SPARTA_ADDRESS));
}

#[tokio::test]
async fn test_ethereum_transaction_flow() {
    let rlp = hex::decode(EIP155_RLP).unwrap();
    let mut body = vec![0x45, 0x01];
    body.extend_from_slice(&hex::decode(ETH_ADDRESS).unwrap());
    body.extend_from_slice(&rlp);

    let mut session = session();
    let view = match scan_all(&mut session, &scans(&body, 1024)) {
        ScanEvent::Ready(view) => view,
        ScanEvent::Progress(_) => panic!("expected ready"),
    };
    assert_eq!(view.ecosystem, Ecosystem::Ethereum);
    assert_eq!(view.action, Action::SignTransaction);
    assert_eq!(view.signer_address, ETH_ADDRESS);
    assert!(!view.is_hash);

    let context = session.prepare().unwrap();
    assert_eq!(&context.data_to_sign[..], &keccak256(&rlp)[..]);
    let tx = context.transaction.clone().unwrap();
    assert_eq!(tx.chain_id, Some(1));
    assert_eq!(tx.value, 1_000_000_000_000_000_000);

    let signer = RecordingSigner::new(vec![0x1c; 65]);
    let result = session
        .sign(SigningCapability::Unlocked(&signer))
        .await
        .unwrap();
    assert_eq!(result.signature_type_tag, None);
    assert_eq!(result.to_hex(), "1c".repeat(65));
}

/// Multipart mortal transaction, scanned in reverse with a duplicate.
#[test]
fn test_multipart_extrinsic_out_of_order() {
    init_tracing();
    let ext = extrinsic(40);
    let body = substrate_body(0x00, &ext.encode());
    let mut frames = scans(&body, 32);
    assert!(frames.len() > 2);
    frames.reverse();
    frames.insert(1, frames[0].clone());

    let mut session = session();
    let mut ready = None;
    for (i, scan) in frames.iter().enumerate() {
        match session.submit_scan(scan).unwrap() {
            ScanEvent::Progress(view) => {
                assert!(i < frames.len() - 1);
                assert_eq!(
                    usize::from(view.received_count) + view.missing_indices.len(),
                    usize::from(view.total_frame_count)
                );
            }
            ScanEvent::Ready(view) => ready = Some(view),
        }
    }

    let view = ready.unwrap();
    assert_eq!(view.signer_address, SPARTA_ADDRESS);
    assert_eq!(view.network_prefix, Some(2));
    assert_eq!(
        session.request().unwrap().payload,
        Payload::Extrinsic(ext.clone())
    );

    let context = session.prepare().unwrap();
    assert_eq!(context.data_to_sign.to_vec(), ext.signable_bytes());
}

/// Oversized transaction is signed as its Blake2b-256 hash.
#[tokio::test]
async fn test_oversized_transaction_signs_hash() {
    let raw = extrinsic(400).encode();
    let body = substrate_body(0x02, &raw);

    let mut session = session();
    let view = match scan_all(&mut session, &scans(&body, 128)) {
        ScanEvent::Ready(view) => view,
        ScanEvent::Progress(_) => panic!("expected ready"),
    };
    assert!(view.is_oversized);
    assert!(view.is_hash);
    assert!(view.pre_hash.is_some());

    let expected = Blake2bHasher.hash(&raw);
    let context = session.prepare().unwrap();
    assert_eq!(context.data_to_sign, expected);

    let result = session
        .sign(SigningCapability::Passphrase {
            vault: &TestVault,
            passphrase: "correct horse",
        })
        .await
        .unwrap();
    assert_eq!(&result.raw_signature[..2], &[0x01, 0x02]);
    assert_eq!(result.to_hex().len(), 2 + 128);
}

/// A wrong passphrase keeps the prepared context for a retry.
#[tokio::test]
async fn test_wrong_passphrase_then_retry() {
    let mut session = session();
    session.submit_scan(SPARTA_SCAN).unwrap();
    session.prepare().unwrap();

    let err = session
        .sign(SigningCapability::Passphrase {
            vault: &TestVault,
            passphrase: "nope",
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScanError::SigningFailed(CapabilityError::WrongPassphrase)
    ));
    assert!(session.context().is_some());
    assert!(session.signature().is_none());

    session
        .sign(SigningCapability::Passphrase {
            vault: &TestVault,
            passphrase: "correct horse",
        })
        .await
        .unwrap();
    assert!(session.signature().is_some());
}

/// Signature output frames scan back to the signature hex.
#[tokio::test]
async fn test_signature_frames_round_trip() {
    let mut session = session();
    session.submit_scan(SPARTA_SCAN).unwrap();
    session.prepare().unwrap();
    let signer = RecordingSigner::new(vec![0xa1; 64]);
    session
        .sign(SigningCapability::Unlocked(&signer))
        .await
        .unwrap();

    let frames = session.signature_frames(Some(50)).unwrap();
    assert_eq!(frames.len(), 3);

    let mut hex_text = Vec::new();
    for frame in &frames {
        let bytes = decode_raw_frame(frame).unwrap();
        hex_text.extend_from_slice(split_frame_header(bytes).unwrap().body());
    }
    let view = SignatureView::from(session.signature().unwrap());
    assert_eq!(String::from_utf8(hex_text).unwrap(), view.signature);

    let json: serde_json::Value = serde_json::from_str(&to_json(&view)).unwrap();
    assert_eq!(json["typeTag"], 1);
}

/// Frame 0 may not start with 0x00.
#[test]
fn test_invalid_first_frame_rejected() {
    let mut session = session();
    let frames = scans(&[0x00, 0x53, 0x01, 0x02], 2);

    let err = session.submit_scan(&frames[0]).unwrap_err();
    assert!(matches!(err, ScanError::InvalidFirstFrame(0x00)));
    assert!(err.is_recoverable());
    assert!(session.progress().is_none());

    // Other frames are still collected
    session.submit_scan(&frames[1]).unwrap();
    assert_eq!(session.progress().unwrap().received_count, 1);
}

/// Malformed scans do not disturb collected frames.
#[test]
fn test_malformed_scan_is_recoverable() {
    let body = substrate_body(0x03, b"hello from a multipart message");
    let frames = scans(&body, 16);

    let mut session = session();
    session.submit_scan(&frames[0]).unwrap();

    let err = session.submit_scan("not a qr payload").unwrap_err();
    assert!(matches!(err, ScanError::MalformedFrame(_)));
    assert_eq!(session.progress().unwrap().received_count, 1);

    let event = scan_all(&mut session, &frames[1..]);
    assert!(matches!(event, ScanEvent::Ready(_)));
    assert_eq!(
        session.request().unwrap().message_text(),
        Some("hello from a multipart message")
    );
}

proptest! {
    #[test]
    fn reassembly_is_order_independent(
        order in Just((0..6usize).collect::<Vec<_>>()).prop_shuffle(),
        repeats in proptest::collection::vec(0..6usize, 0..4),
    ) {
        let body = substrate_body(0x03, b"order does not matter for multipart frames");
        let frames = scans(&body, 13);
        prop_assert_eq!(frames.len(), 6);

        let mut session = session();
        let mut ready = 0;
        let sequence = repeats.iter().chain(order.iter());
        for &index in sequence {
            if let ScanEvent::Ready(view) = session.submit_scan(&frames[index]).unwrap() {
                ready += 1;
                prop_assert_eq!(view.signer_address.as_str(), SPARTA_ADDRESS);
            }
            if session.is_busy() {
                break;
            }
        }

        prop_assert_eq!(ready, 1);
        prop_assert_eq!(
            session.request().unwrap().message_text(),
            Some("order does not matter for multipart frames")
        );
    }
}
