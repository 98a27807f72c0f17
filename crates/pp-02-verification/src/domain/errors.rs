//! # Verification Errors
//!
//! Error taxonomy for the verification services. The HTTP layer maps each
//! variant to a status code; only the client-facing variants carry a message
//! that is safe to return verbatim.

use crate::ports::outbound::{LedgerError, ProviderError, StoreError};
use pp_01_signing_engine::SignatureError;
use thiserror::Error;

/// Errors returned by the verification services.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerificationError {
    /// Malformed or semantically invalid input.
    #[error("{0}")]
    Validation(String),

    /// Ownership proof did not recover to the claimed account.
    #[error("Invalid signature provided")]
    InvalidSignature,

    /// The fee-payment block already has a session past `requires_input`.
    #[error("Verification already completed")]
    AlreadyCompleted,

    /// Admission ceiling reached.
    #[error("Verification limit reached")]
    CapacityExceeded,

    /// No matching record.
    #[error("{0}")]
    NotFound(String),

    /// Polled again inside the cooldown window.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// A write did not land where it was expected to.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The identity provider failed or returned something unusable.
    #[error("Provider error: {0}")]
    Provider(String),

    /// The fee ledger could not be queried.
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Stored data violates an expected shape.
    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    /// Some records could not be redacted provider-side.
    #[error("Redaction incomplete: {failed} of {total} records failed")]
    RedactionIncomplete { failed: usize, total: usize },

    /// Server misconfiguration (e.g. no signing key for the chain).
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl VerificationError {
    /// True for errors caused by the server or its collaborators rather
    /// than the caller.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Persistence(_)
                | Self::Provider(_)
                | Self::Ledger(_)
                | Self::DataIntegrity(_)
                | Self::RedactionIncomplete { .. }
                | Self::Configuration(_)
        )
    }
}

impl From<StoreError> for VerificationError {
    fn from(e: StoreError) -> Self {
        Self::Persistence(e.to_string())
    }
}

impl From<ProviderError> for VerificationError {
    fn from(e: ProviderError) -> Self {
        Self::Provider(e.to_string())
    }
}

impl From<LedgerError> for VerificationError {
    fn from(e: LedgerError) -> Self {
        Self::Ledger(e.to_string())
    }
}

impl From<SignatureError> for VerificationError {
    fn from(e: SignatureError) -> Self {
        match e {
            SignatureError::MissingKey(_)
            | SignatureError::InvalidKey { .. }
            | SignatureError::SigningFailed => Self::Configuration(e.to_string()),
            SignatureError::InvalidFormat
            | SignatureError::InvalidRecoveryId(_)
            | SignatureError::RecoveryFailed => Self::InvalidSignature,
        }
    }
}
