//! External signing capabilities.
//!
//! Key material never lives in this crate. A request is signed either by
//! an already-unlocked [`Signer`] or by a [`SecretVault`] that decrypts an
//! account's seed with a passphrase and signs with it. Decrypted seeds are
//! held in [`SecretSeed`] and wiped on drop.

use async_trait::async_trait;
use bytes::Bytes;
use zeroize::Zeroizing;

use super::account::SignerAccount;
use crate::error::CapabilityError;
use crate::payload::CryptoType;

/// Decrypted seed, zeroed when dropped.
pub struct SecretSeed(Zeroizing<Vec<u8>>);

impl SecretSeed {
    /// Wrap decrypted seed bytes.
    pub fn new(seed: Vec<u8>) -> Self {
        Self(Zeroizing::new(seed))
    }

    /// Borrow the seed bytes.
    #[inline]
    pub fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SecretSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretSeed(..)")
    }
}

/// An unlocked key that signs on request.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Sign `data` with the key of `account`.
    async fn sign(&self, account: &SignerAccount, data: &[u8]) -> Result<Bytes, CapabilityError>;
}

/// Secure storage that can decrypt seeds and sign with them.
#[async_trait]
pub trait SecretVault: Send + Sync {
    /// Decrypt an encrypted seed.
    ///
    /// Returns `WrongPassphrase` when the passphrase does not match.
    async fn decrypt(
        &self,
        encrypted_seed: &[u8],
        passphrase: &str,
    ) -> Result<SecretSeed, CapabilityError>;

    /// Sign `data` with a decrypted seed.
    async fn sign_with_seed(
        &self,
        seed: &SecretSeed,
        crypto: CryptoType,
        data: &[u8],
    ) -> Result<Bytes, CapabilityError>;
}

/// How a prepared request gets signed.
#[derive(Clone, Copy)]
pub enum SigningCapability<'a> {
    /// Key is already unlocked.
    Unlocked(&'a dyn Signer),
    /// Decrypt the account seed with a passphrase first.
    Passphrase {
        /// Vault holding the decryption and signing primitives.
        vault: &'a dyn SecretVault,
        /// User passphrase.
        passphrase: &'a str,
    },
}

impl std::fmt::Debug for SigningCapability<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SigningCapability::Unlocked(_) => f.write_str("Unlocked"),
            SigningCapability::Passphrase { .. } => f.write_str("Passphrase"),
        }
    }
}

impl SigningCapability<'_> {
    /// Produce a raw signature over `data` for `account`.
    pub async fn sign(
        &self,
        account: &SignerAccount,
        data: &[u8],
    ) -> Result<Bytes, CapabilityError> {
        match self {
            SigningCapability::Unlocked(signer) => signer.sign(account, data).await,
            SigningCapability::Passphrase { vault, passphrase } => {
                let encrypted = account.encrypted_seed.as_ref().ok_or_else(|| {
                    CapabilityError::Other(format!("no encrypted seed for {}", account.address))
                })?;
                let seed = vault.decrypt(encrypted, passphrase).await?;
                vault.sign_with_seed(&seed, account.crypto, data).await
            }
        }
    }
}
