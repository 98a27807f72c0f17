//! # Inbound Ports (Driving Ports / API)
//!
//! Traits that define the public API of this subsystem.

use crate::domain::entities::{AgeThreshold, EcdsaSignature};
use crate::domain::errors::SignatureError;
use shared_types::{Address, ChainId, Hash};

/// Attestation signing and ownership-proof recovery.
///
/// Implementations must be thread-safe (`Send + Sync`). Every `sign_*`
/// method fails with [`SignatureError::MissingKey`] when `chain` has no key.
pub trait SigningApi: Send + Sync {
    /// Sign the full verification tuple `(account, expiration, countryAndDocNumberHash)`.
    fn sign_verification(
        &self,
        chain: ChainId,
        account: Address,
        expiration: u64,
        country_and_doc_hash: Hash,
    ) -> Result<EcdsaSignature, SignatureError>;

    /// Sign an age fact; the tag reflects whether the threshold is met.
    fn sign_age(
        &self,
        chain: ChainId,
        account: Address,
        threshold: AgeThreshold,
        satisfied: bool,
    ) -> Result<EcdsaSignature, SignatureError>;

    /// Sign the packed two-letter country code.
    fn sign_country(
        &self,
        chain: ChainId,
        account: Address,
        country_code_int: u32,
    ) -> Result<EcdsaSignature, SignatureError>;

    /// Recover who signed `message` via `personal_sign`.
    fn recover_personal_signer(
        &self,
        message: &[u8],
        signature: &EcdsaSignature,
    ) -> Result<Address, SignatureError>;
}
