//! # Outbound Ports (Driven Ports)
//!
//! Dependencies the verification services require the host to provide.
//!
//! Production: RocksDB store, Stripe-compatible provider client and JSON-RPC
//! ledger client (`verification-server/src/adapters/`).
//! Testing: `InMemoryVerificationStore`, `MockIdentityProvider`,
//! `MockFeeLedger` (`adapters/`).

use crate::domain::record::{RecordId, RecordKey, StatusUpdate, VerificationRecord};
use crate::domain::report::VerificationReport;
use async_trait::async_trait;
use shared_types::{Address, ChainId, VerificationStatus};
use thiserror::Error;

// =============================================================================
// ERRORS
// =============================================================================

/// Datastore failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("record already exists for {0:?}")]
    Duplicate(RecordKey),

    #[error("record serialization failed: {0}")]
    Serialization(String),
}

/// Identity provider failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("provider transport error: {0}")]
    Http(String),

    #[error("provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected provider response: {0}")]
    Decode(String),

    #[error("provider object not found: {0}")]
    NotFound(String),
}

/// Fee ledger failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("no ledger configured for chain {0}")]
    UnsupportedChain(ChainId),

    #[error("ledger RPC error: {0}")]
    Rpc(String),

    #[error("undecodable ledger response: {0}")]
    Decode(String),
}

// =============================================================================
// VERIFICATION STORE
// =============================================================================

/// Keyed table of verification records.
///
/// Update methods return the number of affected rows (0 or 1) so the
/// caller can tell a lost race from a successful write.
#[async_trait]
pub trait VerificationStore: Send + Sync {
    /// Total number of records, any status.
    async fn count(&self) -> Result<u64, StoreError>;

    /// Insert a fresh record. Fails with [`StoreError::Duplicate`] if the key exists.
    async fn insert(&self, key: RecordKey) -> Result<VerificationRecord, StoreError>;

    async fn get(&self, id: RecordId) -> Result<Option<VerificationRecord>, StoreError>;

    async fn find(&self, key: &RecordKey) -> Result<Option<VerificationRecord>, StoreError>;

    /// Most recently created record for `account`, any chain or block.
    async fn latest_for_account(
        &self,
        account: Address,
    ) -> Result<Option<VerificationRecord>, StoreError>;

    /// Record with the highest fee-payment block for `account`.
    async fn highest_block_for_account(
        &self,
        account: Address,
    ) -> Result<Option<VerificationRecord>, StoreError>;

    /// All `verified` records for `account`, newest first, redacted or not.
    async fn verified_for_account(
        &self,
        account: Address,
    ) -> Result<Vec<VerificationRecord>, StoreError>;

    /// Store the provider session id and, if known, its status.
    async fn attach_session(
        &self,
        id: RecordId,
        session_id: &str,
        status: Option<VerificationStatus>,
    ) -> Result<u64, StoreError>;

    /// Apply `update` only if the stored status still equals `expected`.
    async fn update_status(
        &self,
        id: RecordId,
        expected: Option<VerificationStatus>,
        update: &StatusUpdate,
    ) -> Result<u64, StoreError>;

    /// Set `redacted` and clear personal fields.
    async fn mark_redacted(&self, id: RecordId) -> Result<u64, StoreError>;
}

// =============================================================================
// IDENTITY PROVIDER
// =============================================================================

/// Parameters for opening a passport verification session.
///
/// Sessions always require a passport, live capture and a matching selfie;
/// the account travels in the provider metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateSessionParams {
    pub account: Address,
    /// Where the provider sends the user back after capture.
    pub return_url: Option<String>,
}

/// Provider view of a verification session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderSession {
    pub id: String,
    pub status: VerificationStatus,
    /// Hosted capture-flow URL, present while input is required.
    pub url: Option<String>,
    pub last_verification_report: Option<String>,
}

/// Third-party document verification service.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_session(
        &self,
        params: CreateSessionParams,
    ) -> Result<ProviderSession, ProviderError>;

    async fn retrieve_session(&self, session_id: &str) -> Result<ProviderSession, ProviderError>;

    /// Report with document expiry, number and date of birth expanded.
    async fn retrieve_report(&self, report_id: &str) -> Result<VerificationReport, ProviderError>;

    /// Permanently remove personal data held by the provider.
    async fn redact_session(&self, session_id: &str) -> Result<(), ProviderError>;
}

// =============================================================================
// FEE LEDGER
// =============================================================================

/// On-chain fee-payment lookup.
#[async_trait]
pub trait FeeLedger: Send + Sync {
    /// Block number of `account`'s latest fee payment; 0 if none.
    async fn fee_paid_for(&self, chain: ChainId, account: Address) -> Result<u64, LedgerError>;
}
