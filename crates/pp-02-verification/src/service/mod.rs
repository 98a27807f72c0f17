//! # Service Layer
//!
//! Application services implementing the inbound ports on top of the
//! outbound ports.

mod attestor;
mod reconciler;
mod redaction;


pub use attestor::DisclosureAttestor;
pub use reconciler::SessionReconciler;
pub use redaction::RedactionCoordinator;

use crate::domain::errors::VerificationError;
use crate::domain::record::VerificationRecord;
use crate::ports::outbound::{FeeLedger, IdentityProvider, VerificationStore};
use pp_01_signing_engine::{EcdsaSignature, SigningApi};
use shared_types::{Address, ChainId, TimeSource};
use std::sync::Arc;

/// Shared handles every verification service needs.
#[derive(Clone)]
pub struct VerificationPorts {
    pub store: Arc<dyn VerificationStore>,
    pub provider: Arc<dyn IdentityProvider>,
    pub ledger: Arc<dyn FeeLedger>,
    pub signer: Arc<dyn SigningApi>,
    pub clock: Arc<dyn TimeSource>,
}

impl VerificationPorts {
    /// Recover the signer of a personal-message `signature` over `message`.
    pub(crate) fn recover(
        &self,
        message: &str,
        signature: &EcdsaSignature,
    ) -> Result<Address, VerificationError> {
        Ok(self
            .signer
            .recover_personal_signer(message.as_bytes(), signature)?)
    }

    /// Fresh verification attestation for a verified record.
    pub(crate) fn attest(
        &self,
        record: &VerificationRecord,
        chain: ChainId,
    ) -> Result<Option<EcdsaSignature>, VerificationError> {
        match record.attestation_inputs() {
            Some((expiration, hash)) => Ok(Some(self.signer.sign_verification(
                chain,
                record.account,
                expiration,
                hash,
            )?)),
            None => Ok(None),
        }
    }
}
