//! Signing module - accounts, capabilities, and the coordinator.

mod account;
mod capability;
mod coordinator;
mod signature;

pub use account::{normalize_address, AccountRegistry, InMemoryAccounts, SignerAccount};
pub use capability::{SecretSeed, SecretVault, Signer, SigningCapability};
pub use coordinator::{SigningContext, SigningCoordinator};
pub use signature::{SignatureResult, SIG_TYPE_SR25519};
