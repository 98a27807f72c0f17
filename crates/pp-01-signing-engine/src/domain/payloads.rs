//! # Attestation Payloads
//!
//! Canonical tuples the contract re-hashes on-chain. The digest returned here
//! is what gets signed (as a 32-byte personal message).

use super::abi::{encode, AbiToken};
use super::ecdsa::keccak256;
use super::entities::AgeThreshold;
use primitive_types::U256;
use shared_types::{Address, Hash};

/// `keccak256(abi.encode(address, uint256 expiration, bytes32 countryAndDocNumberHash))`
pub fn verification_digest(account: Address, expiration: u64, country_and_doc_hash: Hash) -> Hash {
    keccak256(&encode(&[
        AbiToken::Address(account),
        AbiToken::Uint(U256::from(expiration)),
        AbiToken::FixedBytes(country_and_doc_hash),
    ]))
}

/// `keccak256(abi.encode(address, string tag))` with tag `over18`, `notOver21`, ...
pub fn age_digest(account: Address, threshold: AgeThreshold, satisfied: bool) -> Hash {
    keccak256(&encode(&[
        AbiToken::Address(account),
        AbiToken::String(threshold.tag(satisfied).to_string()),
    ]))
}

/// `keccak256(abi.encode(address, uint256 countryCodeInt))`
pub fn country_digest(account: Address, country_code_int: u32) -> Hash {
    keccak256(&encode(&[
        AbiToken::Address(account),
        AbiToken::Uint(U256::from(country_code_int)),
    ]))
}
