//! # Verification Record
//!
//! One row per (account, fee-payment block, chain).
//!
//! ## Invariants
//!
//! - The (account, fee_paid_block, chain_id) triple is unique
//! - `redacted` only moves false → true, and a redacted record carries no
//!   personal fields
//! - `expiration` and `country_and_doc_number_hash` are set exactly when the
//!   status is `verified`
//! - Records are never deleted

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared_types::{Address, ChainId, Hash, VerificationStatus};

/// Store-assigned row id.
pub type RecordId = u64;

/// Identity key of a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub account: Address,
    pub fee_paid_block: u64,
    pub chain_id: ChainId,
}

impl RecordKey {
    pub fn new(account: Address, fee_paid_block: u64, chain_id: ChainId) -> Self {
        Self {
            account,
            fee_paid_block,
            chain_id,
        }
    }
}

/// Persisted verification state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub id: RecordId,
    pub account: Address,
    pub fee_paid_block: u64,
    pub chain_id: ChainId,
    /// Provider session id, once a session has been opened.
    pub session_id: Option<String>,
    /// `None` until the provider reports a status.
    pub status: Option<VerificationStatus>,
    pub report_id: Option<String>,
    /// Document expiry, unix seconds.
    pub expiration: Option<u64>,
    pub country_and_doc_number_hash: Option<Hash>,
    pub personal_date_of_birth: Option<NaiveDate>,
    pub personal_country: Option<String>,
    pub redacted: bool,
    /// Creation time, ms since epoch.
    pub created: u64,
}

impl VerificationRecord {
    /// Fresh record with no session attached.
    pub fn new(id: RecordId, key: RecordKey, created: u64) -> Self {
        Self {
            id,
            account: key.account,
            fee_paid_block: key.fee_paid_block,
            chain_id: key.chain_id,
            session_id: None,
            status: None,
            report_id: None,
            expiration: None,
            country_and_doc_number_hash: None,
            personal_date_of_birth: None,
            personal_country: None,
            redacted: false,
            created,
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.account, self.fee_paid_block, self.chain_id)
    }

    pub fn is_verified(&self) -> bool {
        self.status == Some(VerificationStatus::Verified)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.map(|s| s.is_terminal()).unwrap_or(false)
    }

    /// `(expiration, countryAndDocNumberHash)` for a verified record.
    pub fn attestation_inputs(&self) -> Option<(u64, Hash)> {
        match (self.is_verified(), self.expiration, self.country_and_doc_number_hash) {
            (true, Some(expiration), Some(hash)) => Some((expiration, hash)),
            _ => None,
        }
    }

    /// Apply a status transition in place.
    pub fn apply(&mut self, update: &StatusUpdate) {
        self.status = Some(update.status);
        self.report_id = update.report_id.clone();
        if let Some(details) = &update.verified {
            self.expiration = Some(details.expiration);
            self.country_and_doc_number_hash = Some(details.country_and_doc_number_hash);
            self.personal_date_of_birth = Some(details.date_of_birth);
            self.personal_country = Some(details.country.clone());
        }
    }

    /// Irreversibly scrub personal fields.
    pub fn redact(&mut self) {
        self.redacted = true;
        self.personal_date_of_birth = None;
        self.personal_country = None;
    }

    /// Newest-first ordering used for "most recent record" lookups.
    pub fn recency(&self) -> (u64, RecordId) {
        (self.created, self.id)
    }
}

/// Fields extracted from a verified report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedDetails {
    pub expiration: u64,
    pub country_and_doc_number_hash: Hash,
    pub date_of_birth: NaiveDate,
    pub country: String,
}

/// A status transition to persist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: VerificationStatus,
    pub report_id: Option<String>,
    /// Present only for the transition into `verified`.
    pub verified: Option<VerifiedDetails>,
}

impl StatusUpdate {
    pub fn status_only(status: VerificationStatus, report_id: Option<String>) -> Self {
        Self {
            status,
            report_id,
            verified: None,
        }
    }

    pub fn verified(report_id: String, details: VerifiedDetails) -> Self {
        Self {
            status: VerificationStatus::Verified,
            report_id: Some(report_id),
            verified: Some(details),
        }
    }
}
