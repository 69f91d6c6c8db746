//! Signing coordinator - from a decoded request to an encoded signature.
//!
//! ```text
//! SigningRequest ──prepare──► SigningContext ──sign(capability)──► SignatureResult
//!                   │                               │
//!            account lookup                 Signer / SecretVault
//!            data to sign                   type tag selection
//! ```
//!
//! | Request                 | Data to sign                              |
//! |-------------------------|-------------------------------------------|
//! | Ethereum transaction    | Keccak-256 of the RLP bytes               |
//! | Ethereum message        | Keccak-256 of the personal-message form   |
//! | Substrate transaction   | extrinsic without call length prefix      |
//! | Substrate message       | raw message bytes                         |
//! | any hashed payload      | the hash as given                         |

use std::sync::Arc;

use bytes::Bytes;

use super::account::{AccountRegistry, SignerAccount};
use super::capability::SigningCapability;
use super::signature::{SignatureResult, SIG_TYPE_SR25519};
use crate::crypto::{ethereum_message_hash, keccak256, ss58_encode};
use crate::error::{Result, ScanError};
use crate::payload::{
    Action, CryptoType, Ecosystem, EthereumTransaction, NetworkRegistry, Payload, SigningRequest,
};

/// A request bound to its account and the exact bytes to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningContext {
    /// The decoded request.
    pub request: SigningRequest,
    /// Account that signs.
    pub account: SignerAccount,
    /// Bytes handed to the capability.
    pub data_to_sign: Bytes,
    /// Summary of an Ethereum transaction, for display.
    pub transaction: Option<EthereumTransaction>,
}

/// Resolves signers and produces signatures.
#[derive(Clone)]
pub struct SigningCoordinator {
    accounts: Arc<dyn AccountRegistry>,
    networks: Option<Arc<dyn NetworkRegistry>>,
}

impl std::fmt::Debug for SigningCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningCoordinator")
            .field("networks", &self.networks.is_some())
            .finish_non_exhaustive()
    }
}

impl SigningCoordinator {
    /// Create a coordinator over an account registry.
    pub fn new(accounts: Arc<dyn AccountRegistry>) -> Self {
        Self {
            accounts,
            networks: None,
        }
    }

    /// Attach a network registry.
    ///
    /// Substrate signers not stored under the decoded address are then
    /// looked up under every known network prefix.
    pub fn with_networks(mut self, networks: Arc<dyn NetworkRegistry>) -> Self {
        self.networks = Some(networks);
        self
    }

    /// Prepare a request for signing, dispatching on its action.
    pub fn prepare(&self, request: &SigningRequest) -> Result<SigningContext> {
        match request.action {
            Action::SignTransaction => self.prepare_transaction(request),
            Action::SignMessage => self.prepare_message(request),
        }
    }

    /// Prepare a transaction request.
    pub fn prepare_transaction(&self, request: &SigningRequest) -> Result<SigningContext> {
        expect_action(request, Action::SignTransaction)?;
        let account = self.lookup(request)?;

        let (data_to_sign, transaction) = match (request.ecosystem, &request.payload) {
            (Ecosystem::Ethereum, Payload::RlpTransaction(rlp)) => {
                let transaction = EthereumTransaction::from_rlp(rlp)?;
                (Bytes::copy_from_slice(&keccak256(rlp)), Some(transaction))
            }
            (Ecosystem::Substrate, Payload::Extrinsic(extrinsic)) => {
                (Bytes::from(extrinsic.signable_bytes()), None)
            }
            (Ecosystem::Substrate, Payload::Hash(hash)) if request.is_hash => (hash.clone(), None),
            (Ecosystem::Ethereum, _) => {
                return Err(ScanError::InvalidTransaction(
                    "payload is not an RLP transaction".into(),
                ))
            }
            (Ecosystem::Substrate, _) => {
                return Err(ScanError::InvalidExtrinsic(
                    "payload is not an extrinsic or hash".into(),
                ))
            }
        };

        tracing::debug!(
            "Prepared transaction for {} ({} bytes to sign)",
            account.address,
            data_to_sign.len()
        );

        Ok(SigningContext {
            request: request.clone(),
            account,
            data_to_sign,
            transaction,
        })
    }

    /// Prepare a message request.
    ///
    /// Substrate messages are only signed with sr25519 keys.
    pub fn prepare_message(&self, request: &SigningRequest) -> Result<SigningContext> {
        expect_action(request, Action::SignMessage)?;

        if request.ecosystem == Ecosystem::Substrate && request.crypto != CryptoType::Sr25519 {
            return Err(ScanError::UnsupportedCrypto(format!(
                "{} cannot sign messages",
                request.crypto.as_str()
            )));
        }
        let account = self.lookup(request)?;

        let data_to_sign = match (request.ecosystem, &request.payload) {
            (Ecosystem::Ethereum, Payload::RawMessage(message)) => {
                Bytes::copy_from_slice(&ethereum_message_hash(message))
            }
            (Ecosystem::Substrate, Payload::Message { bytes, .. }) => bytes.clone(),
            (Ecosystem::Substrate, Payload::Hash(hash)) => hash.clone(),
            (ecosystem, _) => {
                return Err(ScanError::NothingToSign(match ecosystem {
                    Ecosystem::Ethereum => "Ethereum request carries no message",
                    Ecosystem::Substrate => "Substrate request carries no message",
                }))
            }
        };

        Ok(SigningContext {
            request: request.clone(),
            account,
            data_to_sign,
            transaction: None,
        })
    }

    /// Sign a prepared context.
    ///
    /// On failure the context is unchanged and may be signed again.
    pub async fn sign(
        &self,
        context: &SigningContext,
        capability: SigningCapability<'_>,
    ) -> Result<SignatureResult> {
        let tag = signature_tag(context)?;

        let raw_signature = capability
            .sign(&context.account, &context.data_to_sign)
            .await
            .map_err(|e| {
                tracing::warn!("Signing with {} failed: {}", context.account.address, e);
                ScanError::SigningFailed(e)
            })?;

        tracing::info!(
            "Signed {} for {}",
            context.request.action.as_str(),
            context.account.address
        );

        Ok(SignatureResult::new(tag, raw_signature))
    }

    fn lookup(&self, request: &SigningRequest) -> Result<SignerAccount> {
        if let Some(account) = self.accounts.account_by_address(&request.signer_address) {
            return Ok(account);
        }

        let not_found = || ScanError::SignerNotFound(request.signer_address.clone());
        let (Some(public_key), Some(networks)) = (&request.public_key, &self.networks) else {
            return Err(not_found());
        };

        networks
            .known_prefixes()
            .into_iter()
            .filter(|prefix| Some(*prefix) != request.network_prefix)
            .find_map(|prefix| {
                let account = self
                    .accounts
                    .account_by_address(&ss58_encode(public_key, prefix))?;
                tracing::debug!(
                    "Signer {} found as {} (prefix {})",
                    request.signer_address,
                    account.address,
                    prefix
                );
                Some(account)
            })
            .ok_or_else(not_found)
    }
}

fn expect_action(request: &SigningRequest, expected: Action) -> Result<()> {
    if request.action == expected {
        Ok(())
    } else {
        Err(ScanError::ActionMismatch {
            expected: expected.as_str(),
            actual: request.action.as_str(),
        })
    }
}

fn signature_tag(context: &SigningContext) -> Result<Option<u8>> {
    match context.request.ecosystem {
        Ecosystem::Ethereum => Ok(None),
        Ecosystem::Substrate => match context.account.crypto {
            CryptoType::Sr25519 => Ok(Some(SIG_TYPE_SR25519)),
            other => Err(ScanError::UnsupportedCrypto(format!(
                "no signature tag for {}",
                other.as_str()
            ))),
        },
    }
}
