//! Result views returned by the inbound APIs.
//!
//! These carry domain values; the HTTP layer decides how to render them.

use super::record::VerificationRecord;
use pp_01_signing_engine::EcdsaSignature;
use shared_types::{ChainId, Hash, VerificationStatus};

/// Most recent record for an account, reconciled against the provider.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountStatus {
    pub verification_allowed: bool,
    pub status: Option<VerificationStatus>,
    pub exists: bool,
    pub redacted: bool,
    pub signature: Option<EcdsaSignature>,
    pub expiration: Option<u64>,
    pub country_and_doc_number_hash: Option<Hash>,
    pub fee_paid_chain: Option<ChainId>,
    pub fee_paid_block: Option<u64>,
}

impl AccountStatus {
    /// No record for the account.
    pub fn absent(verification_allowed: bool) -> Self {
        Self {
            verification_allowed,
            ..Self::default()
        }
    }

    /// View of `record`, with `signature` attached when it is verified.
    pub fn from_record(
        verification_allowed: bool,
        record: &VerificationRecord,
        signature: Option<EcdsaSignature>,
    ) -> Self {
        let verified = record.attestation_inputs();
        Self {
            verification_allowed,
            status: record.status,
            exists: true,
            redacted: record.redacted,
            signature,
            expiration: verified.map(|(expiration, _)| expiration),
            country_and_doc_number_hash: verified.map(|(_, hash)| hash),
            fee_paid_chain: Some(record.chain_id),
            fee_paid_block: Some(record.fee_paid_block),
        }
    }
}

/// One (account, block, chain) record, reconciled against the provider.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockStatus {
    pub status: Option<VerificationStatus>,
    pub exists: bool,
    pub signature: Option<EcdsaSignature>,
    pub expiration: Option<u64>,
    pub fee_paid_block: Option<u64>,
    pub country_and_doc_number_hash: Option<Hash>,
}

impl BlockStatus {
    /// View of `record`, with `signature` attached when it is verified.
    pub fn from_record(record: &VerificationRecord, signature: Option<EcdsaSignature>) -> Self {
        let verified = record.attestation_inputs();
        Self {
            status: record.status,
            exists: true,
            signature,
            expiration: verified.map(|(expiration, _)| expiration),
            fee_paid_block: Some(record.fee_paid_block),
            country_and_doc_number_hash: verified.map(|(_, hash)| hash),
        }
    }
}

/// Signed verification of the account's latest fee payment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountDetails {
    pub fee_paid_block: u64,
    pub expiration: u64,
    pub country_and_doc_number_hash: Hash,
    pub signature: EcdsaSignature,
}

/// Independently signed selective-disclosure facts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisclosureFacts {
    pub over18: bool,
    pub over18_signature: EcdsaSignature,
    pub over21: bool,
    pub over21_signature: EcdsaSignature,
    pub country_code_int: u32,
    pub country_signature: EcdsaSignature,
}
