//! Signer accounts and their lookup.

use std::collections::HashMap;

use bytes::Bytes;

use crate::payload::{CryptoType, Ecosystem};

/// A key the device can sign with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerAccount {
    /// Address as carried by requests.
    pub address: String,
    /// Ecosystem of the key.
    pub ecosystem: Ecosystem,
    /// Signature algorithm of the key.
    pub crypto: CryptoType,
    /// Encrypted seed, for passphrase-based signing.
    pub encrypted_seed: Option<Bytes>,
    /// Display name.
    pub name: Option<String>,
}

impl SignerAccount {
    /// Create an account without seed or name.
    pub fn new(address: impl Into<String>, ecosystem: Ecosystem, crypto: CryptoType) -> Self {
        Self {
            address: address.into(),
            ecosystem,
            crypto,
            encrypted_seed: None,
            name: None,
        }
    }

    /// Attach an encrypted seed.
    pub fn with_encrypted_seed(mut self, seed: impl Into<Bytes>) -> Self {
        self.encrypted_seed = Some(seed.into());
        self
    }

    /// Attach a display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Account lookup by address.
pub trait AccountRegistry: Send + Sync {
    /// Find the account for `address`.
    fn account_by_address(&self, address: &str) -> Option<SignerAccount>;
}

/// Normalise an address for lookup.
///
/// Ethereum addresses compare without `0x` and case-insensitively. SS58
/// addresses are case-sensitive and kept as-is.
pub fn normalize_address(address: &str) -> String {
    let trimmed = address.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if hex_part.len() == 40 && hex_part.bytes().all(|b| b.is_ascii_hexdigit()) {
        hex_part.to_ascii_lowercase()
    } else {
        trimmed.to_string()
    }
}

/// Account registry held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccounts {
    accounts: HashMap<String, SignerAccount>,
}

impl InMemoryAccounts {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an account.
    pub fn insert(&mut self, account: SignerAccount) {
        self.accounts
            .insert(normalize_address(&account.address), account);
    }

    /// Get the number of accounts.
    #[inline]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Check if the registry is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl FromIterator<SignerAccount> for InMemoryAccounts {
    fn from_iter<I: IntoIterator<Item = SignerAccount>>(iter: I) -> Self {
        let mut registry = Self::new();
        for account in iter {
            registry.insert(account);
        }
        registry
    }
}

impl AccountRegistry for InMemoryAccounts {
    fn account_by_address(&self, address: &str) -> Option<SignerAccount> {
        self.accounts.get(&normalize_address(address)).cloned()
    }
}
