//! # Inbound Ports (Driving Ports / API)
//!
//! Traits the HTTP gateway calls.

use crate::domain::errors::VerificationError;
use crate::domain::views::{AccountDetails, AccountStatus, BlockStatus, DisclosureFacts};
use async_trait::async_trait;
use pp_01_signing_engine::EcdsaSignature;
use shared_types::{Address, ChainId};

/// Message signed to prove ownership before disclosure.
pub const FETCH_PERSONAL_DATA_MESSAGE: &str = "Fetch Personal Data";

/// Message signed to authorize redaction.
pub const REDACT_PERSONAL_DATA_MESSAGE: &str = "Redact Personal Data";

/// A request to start or resume a verification session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionRequest {
    pub account: Address,
    /// Personal-message signature over the decimal fee-payment block.
    pub signature: EcdsaSignature,
    pub chain: ChainId,
    pub return_url: Option<String>,
}

/// Session lifecycle and status reconciliation.
#[async_trait]
pub trait SessionReconcilerApi: Send + Sync {
    /// Open a session for the account's current fee payment, or resume the
    /// one already open. Returns the provider's redirect URL.
    async fn request_or_resume_session(
        &self,
        request: SessionRequest,
    ) -> Result<String, VerificationError>;

    /// Status of the account's most recent record, polling the provider
    /// when the record is non-terminal and the account is outside its
    /// cooldown window.
    async fn poll_and_reconcile(
        &self,
        account: Address,
        chain: ChainId,
    ) -> Result<AccountStatus, VerificationError>;

    /// Status of one (account, block, chain) record. Fails with
    /// [`VerificationError::RateLimited`] inside the cooldown window.
    async fn check_verification_status(
        &self,
        account: Address,
        fee_paid_block: u64,
        chain: ChainId,
    ) -> Result<BlockStatus, VerificationError>;

    /// Signed details of the account's highest-block record, which must be
    /// verified.
    async fn account_details(
        &self,
        account: Address,
        chain: ChainId,
    ) -> Result<AccountDetails, VerificationError>;

    /// Whether the admission ceiling still has room.
    async fn verification_allowed(&self) -> Result<bool, VerificationError>;
}

/// Selective-disclosure attestations.
#[async_trait]
pub trait DisclosureApi: Send + Sync {
    /// Signed age and country facts for the signer of the fixed challenge.
    async fn derive_facts(
        &self,
        signature: &EcdsaSignature,
        chain: ChainId,
    ) -> Result<DisclosureFacts, VerificationError>;
}

/// Irreversible personal-data removal.
#[async_trait]
pub trait RedactionApi: Send + Sync {
    /// Redact every verified record of the signer. Returns how many were
    /// redacted.
    async fn redact(&self, signature: &EcdsaSignature) -> Result<usize, VerificationError>;

    /// True when every verified record for `account` is redacted.
    async fn has_redacted(&self, account: Address) -> Result<bool, VerificationError>;
}
