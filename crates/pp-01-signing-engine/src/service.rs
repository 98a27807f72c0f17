//! # Signing Engine Service
//!
//! Application service layer that implements the `SigningApi` trait.
//!
//! ## Architecture
//!
//! This is the hexagonal "application service" that:
//! - Implements the inbound port (`SigningApi`)
//! - Owns the read-only [`SignerKeyring`]
//! - Delegates encoding and cryptography to the domain layer

use crate::domain::ecdsa;
use crate::domain::entities::{AgeThreshold, EcdsaSignature};
use crate::domain::errors::SignatureError;
use crate::domain::keyring::SignerKeyring;
use crate::domain::payloads;
use crate::ports::inbound::SigningApi;
use shared_types::{Address, ChainId, Hash};
use tracing::debug;

/// Signing Engine.
///
/// Attestations are signed as personal messages over the 32-byte payload
/// digest, matching what the verification contract recovers with
/// `ecrecover(toEthSignedMessageHash(digest), sig)`.
#[derive(Debug, Clone)]
pub struct SigningEngine {
    keyring: SignerKeyring,
}

impl SigningEngine {
    /// Create a new signing engine over a loaded keyring.
    pub fn new(keyring: SignerKeyring) -> Self {
        Self { keyring }
    }

    pub fn keyring(&self) -> &SignerKeyring {
        &self.keyring
    }

    fn sign_digest(&self, chain: ChainId, digest: &Hash) -> Result<EcdsaSignature, SignatureError> {
        let key = self.keyring.key_for(chain)?;
        let prefixed = ecdsa::personal_message_hash(digest);
        debug!("[pp-01] Signing attestation for chain {}", chain);
        ecdsa::sign_prehash(key, &prefixed)
    }
}

impl SigningApi for SigningEngine {
    fn sign_verification(
        &self,
        chain: ChainId,
        account: Address,
        expiration: u64,
        country_and_doc_hash: Hash,
    ) -> Result<EcdsaSignature, SignatureError> {
        let digest = payloads::verification_digest(account, expiration, country_and_doc_hash);
        self.sign_digest(chain, &digest)
    }

    fn sign_age(
        &self,
        chain: ChainId,
        account: Address,
        threshold: AgeThreshold,
        satisfied: bool,
    ) -> Result<EcdsaSignature, SignatureError> {
        let digest = payloads::age_digest(account, threshold, satisfied);
        self.sign_digest(chain, &digest)
    }

    fn sign_country(
        &self,
        chain: ChainId,
        account: Address,
        country_code_int: u32,
    ) -> Result<EcdsaSignature, SignatureError> {
        let digest = payloads::country_digest(account, country_code_int);
        self.sign_digest(chain, &digest)
    }

    fn recover_personal_signer(
        &self,
        message: &[u8],
        signature: &EcdsaSignature,
    ) -> Result<Address, SignatureError> {
        ecdsa::recover_personal_signer(message, signature)
    }
}
