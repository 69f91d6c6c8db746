//! Error types for uos-scanner.

use thiserror::Error;

/// Where in the pipeline an error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A single scanned frame could not be read. The camera may rescan it.
    Frame,
    /// The assembled payload could not be decoded. The request is dropped.
    Decode,
    /// The decoded request cannot be signed as-is (unknown account, crypto).
    Coordinator,
    /// The signing capability refused or failed.
    Capability,
    /// The session is not in a state that accepts the call.
    Session,
}

/// Main error type for all scan and signing operations.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Raw scanned string is not a binary-mode QR payload.
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Frame is shorter than the 5-byte frame header.
    #[error("Truncated frame: {len} bytes, need at least {needed}")]
    TruncatedFrame {
        /// Bytes available.
        len: usize,
        /// Bytes required.
        needed: usize,
    },

    /// Frame 0 starts with a byte that multipart data may never start with.
    #[error("Invalid first frame: leading byte {0:#04x} is not allowed")]
    InvalidFirstFrame(u8),

    /// Protocol indicator byte is neither Ethereum nor Substrate.
    #[error("Unrecognized protocol byte {0:#04x}")]
    UnrecognizedProtocol(u8),

    /// Substrate crypto byte is not ed25519 or sr25519.
    #[error("Unknown crypto byte {0:#04x}")]
    UnknownCrypto(u8),

    /// Action or variant byte is not known for the ecosystem.
    #[error("Unknown action byte {0:#04x}")]
    UnknownAction(u8),

    /// Payload ended before a fixed-width field.
    #[error("Truncated payload: {field} needs {needed} bytes, {available} left")]
    TruncatedPayload {
        /// Field being read.
        field: &'static str,
        /// Bytes required.
        needed: usize,
        /// Bytes remaining.
        available: usize,
    },

    /// Substrate extrinsic payload is not valid SCALE.
    #[error("Invalid extrinsic payload: {0}")]
    InvalidExtrinsic(String),

    /// Ethereum transaction is not valid RLP.
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    /// No account is known for the signer address.
    #[error("No private key found for account {0}")]
    SignerNotFound(String),

    /// The account's crypto cannot produce this signature.
    #[error("Unsupported crypto: {0}")]
    UnsupportedCrypto(String),

    /// Prepared with the wrong operation for the request action.
    #[error("Action mismatch: request is {actual}, expected {expected}")]
    ActionMismatch {
        /// Action expected by the operation.
        expected: &'static str,
        /// Action carried by the request.
        actual: &'static str,
    },

    /// Signing capability failed.
    #[error("Signing failed: {0}")]
    SigningFailed(#[from] CapabilityError),

    /// A completed request is being processed; frames are not accepted.
    #[error("Session busy")]
    SessionBusy,

    /// Nothing has been decoded or prepared yet.
    #[error("Nothing to sign: {0}")]
    NothingToSign(&'static str),
}

impl ScanError {
    /// Pipeline stage that raised the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScanError::MalformedFrame(_)
            | ScanError::TruncatedFrame { .. }
            | ScanError::InvalidFirstFrame(_) => ErrorKind::Frame,
            ScanError::UnrecognizedProtocol(_)
            | ScanError::UnknownCrypto(_)
            | ScanError::UnknownAction(_)
            | ScanError::TruncatedPayload { .. }
            | ScanError::InvalidExtrinsic(_) => ErrorKind::Decode,
            ScanError::InvalidTransaction(_)
            | ScanError::SignerNotFound(_)
            | ScanError::UnsupportedCrypto(_)
            | ScanError::ActionMismatch { .. } => ErrorKind::Coordinator,
            ScanError::SigningFailed(_) => ErrorKind::Capability,
            ScanError::SessionBusy | ScanError::NothingToSign(_) => ErrorKind::Session,
        }
    }

    /// Whether progress made so far survives the error.
    ///
    /// Frame errors keep the reassembly buffer, capability errors keep the
    /// prepared context. Decode and coordinator errors end the request.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Frame | ErrorKind::Capability | ErrorKind::Session
        )
    }
}

/// Errors reported by external signing capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    /// Passphrase did not decrypt the seed.
    #[error("wrong passphrase")]
    WrongPassphrase,

    /// User cancelled the operation.
    #[error("cancelled")]
    Cancelled,

    /// Any other failure inside the capability.
    #[error("{0}")]
    Other(String),
}

/// Result type alias using ScanError.
pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(ScanError::InvalidFirstFrame(0).kind(), ErrorKind::Frame);
        assert_eq!(ScanError::UnknownCrypto(7).kind(), ErrorKind::Decode);
        assert_eq!(
            ScanError::SignerNotFound("x".into()).kind(),
            ErrorKind::Coordinator
        );
        assert_eq!(
            ScanError::from(CapabilityError::Cancelled).kind(),
            ErrorKind::Capability
        );
    }

    #[test]
    fn test_recoverable() {
        assert!(ScanError::MalformedFrame("x".into()).is_recoverable());
        assert!(ScanError::from(CapabilityError::WrongPassphrase).is_recoverable());
        assert!(!ScanError::UnrecognizedProtocol(0x11).is_recoverable());
        assert!(!ScanError::UnsupportedCrypto("ed25519".into()).is_recoverable());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ScanError::UnrecognizedProtocol(0x11).to_string(),
            "Unrecognized protocol byte 0x11"
        );
        assert_eq!(
            ScanError::from(CapabilityError::WrongPassphrase).to_string(),
            "Signing failed: wrong passphrase"
        );
    }
}
