//! JSON success bodies.
//!
//! Field names are camelCase. Signatures and hashes are 0x-prefixed hex,
//! `feePaidChain` is the chain id in the hex form wallets report. Absent
//! values serialize as `null`.

use pp_01_signing_engine::EcdsaSignature;
use pp_02_verification::{AccountDetails, AccountStatus, BlockStatus, DisclosureFacts};
use serde::Serialize;
use shared_types::{to_hex_prefixed, Address, Hash, VerificationStatus};

fn sig_hex(signature: Option<&EcdsaSignature>) -> Option<String> {
    signature.map(EcdsaSignature::to_hex)
}

fn hash_hex(hash: Option<Hash>) -> Option<String> {
    hash.map(|h| to_hex_prefixed(&h))
}

/// `/verify`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RedirectResponse {
    pub redirect: String,
}

/// `/verification-limit`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationLimitResponse {
    pub verification_allowed: bool,
}

/// `/account-status`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatusResponse {
    pub verification_allowed: bool,
    pub status: Option<VerificationStatus>,
    pub exists: bool,
    pub redacted: bool,
    pub signature: Option<String>,
    pub expiration: Option<u64>,
    pub country_and_doc_number_hash: Option<String>,
    pub fee_paid_chain: Option<String>,
    pub fee_paid_block: Option<u64>,
}

impl From<AccountStatus> for AccountStatusResponse {
    fn from(s: AccountStatus) -> Self {
        Self {
            verification_allowed: s.verification_allowed,
            status: s.status,
            exists: s.exists,
            redacted: s.redacted,
            signature: sig_hex(s.signature.as_ref()),
            expiration: s.expiration,
            country_and_doc_number_hash: hash_hex(s.country_and_doc_number_hash),
            fee_paid_chain: s.fee_paid_chain.map(|c| c.to_hex()),
            fee_paid_block: s.fee_paid_block,
        }
    }
}

/// `/check-verification-status`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlockStatusResponse {
    pub status: Option<VerificationStatus>,
    pub exists: bool,
    pub signature: Option<String>,
    pub expiration: Option<u64>,
    pub fee_paid_block: Option<u64>,
    pub country_and_doc_number_hash: Option<String>,
}

impl From<BlockStatus> for BlockStatusResponse {
    fn from(s: BlockStatus) -> Self {
        Self {
            status: s.status,
            exists: s.exists,
            signature: sig_hex(s.signature.as_ref()),
            expiration: s.expiration,
            fee_paid_block: s.fee_paid_block,
            country_and_doc_number_hash: hash_hex(s.country_and_doc_number_hash),
        }
    }
}

/// `/get-account-details`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccountDetailsResponse {
    /// Always `verified`; anything else is a 404.
    pub status: VerificationStatus,
    pub fee_paid_block: u64,
    pub expiration: u64,
    pub country_and_doc_number_hash: String,
    pub signature: String,
}

impl From<AccountDetails> for AccountDetailsResponse {
    fn from(d: AccountDetails) -> Self {
        Self {
            status: VerificationStatus::Verified,
            fee_paid_block: d.fee_paid_block,
            expiration: d.expiration,
            country_and_doc_number_hash: to_hex_prefixed(&d.country_and_doc_number_hash),
            signature: d.signature.to_hex(),
        }
    }
}

/// `/fetch-personal-data`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersonalDataResponse {
    pub over18: bool,
    pub over18_signature: String,
    pub over21: bool,
    pub over21_signature: String,
    pub country_code_int: u32,
    pub country_signature: String,
}

impl From<DisclosureFacts> for PersonalDataResponse {
    fn from(f: DisclosureFacts) -> Self {
        Self {
            over18: f.over18,
            over18_signature: f.over18_signature.to_hex(),
            over21: f.over21,
            over21_signature: f.over21_signature.to_hex(),
            country_code_int: f.country_code_int,
            country_signature: f.country_signature.to_hex(),
        }
    }
}

/// `/redact-personal-data`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

/// `/has-redacted`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HasRedactedResponse {
    pub redacted: bool,
}

/// `/dev-contracts`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DevContractsResponse {
    #[serde(rename = "Verification")]
    pub verification: Address,
    #[serde(rename = "ExampleFeeToken")]
    pub example_fee_token: Address,
}
