//! # Signature Errors
//!
//! Error types for signing and recovery operations.

use shared_types::ChainId;
use thiserror::Error;

/// Errors that can occur while signing or recovering signatures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// The signature format is invalid (wrong length, invalid encoding)
    #[error("Invalid signature format")]
    InvalidFormat,

    /// Invalid recovery ID (v must be 0, 1, 27, or 28)
    #[error("Invalid recovery ID: {0}")]
    InvalidRecoveryId(u8),

    /// Failed to recover public key from signature
    #[error("Failed to recover public key")]
    RecoveryFailed,

    /// The underlying ECDSA implementation refused to sign
    #[error("Signing failed")]
    SigningFailed,

    /// No signing key is configured for the chain
    #[error("No signing key configured for chain {0}")]
    MissingKey(ChainId),

    /// A configured private key could not be parsed
    #[error("Invalid signing key for chain {chain}: {reason}")]
    InvalidKey { chain: ChainId, reason: String },
}
