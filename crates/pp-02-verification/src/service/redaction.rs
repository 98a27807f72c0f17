//! # Redaction Coordinator
//!
//! Removes personal data at the provider first, then locally. A record is
//! only marked redacted once the provider confirmed; failures are left for
//! a retry.

use super::VerificationPorts;
use crate::domain::errors::VerificationError;
use crate::domain::record::VerificationRecord;
use crate::ports::inbound::{RedactionApi, REDACT_PERSONAL_DATA_MESSAGE};
use async_trait::async_trait;
use pp_01_signing_engine::EcdsaSignature;
use shared_types::Address;
use tracing::{error, info, warn};

/// Redaction Coordinator service.
pub struct RedactionCoordinator {
    ports: VerificationPorts,
}

impl RedactionCoordinator {
    pub fn new(ports: VerificationPorts) -> Self {
        Self { ports }
    }

    /// Provider-side then local redaction of one record.
    async fn redact_record(&self, record: &VerificationRecord) -> Result<(), VerificationError> {
        let session_id = record.session_id.as_deref().ok_or_else(|| {
            VerificationError::DataIntegrity(format!("record {} has no session", record.id))
        })?;

        self.ports.provider.redact_session(session_id).await?;

        match self.ports.store.mark_redacted(record.id).await? {
            1 => Ok(()),
            rows => Err(VerificationError::Persistence(format!(
                "redaction of record {} affected {} rows",
                record.id, rows
            ))),
        }
    }
}

#[async_trait]
impl RedactionApi for RedactionCoordinator {
    async fn redact(&self, signature: &EcdsaSignature) -> Result<usize, VerificationError> {
        let account = self.ports.recover(REDACT_PERSONAL_DATA_MESSAGE, signature)?;

        let pending: Vec<_> = self
            .ports
            .store
            .verified_for_account(account)
            .await?
            .into_iter()
            .filter(|r| !r.redacted)
            .collect();
        if pending.is_empty() {
            return Err(VerificationError::NotFound("Verification not found".into()));
        }

        let total = pending.len();
        let mut failed = 0;
        for record in &pending {
            if let Err(e) = self.redact_record(record).await {
                failed += 1;
                warn!(
                    %account,
                    id = record.id,
                    error = %e,
                    "[pp-02] Record not redacted, left for retry"
                );
            }
        }

        if failed > 0 {
            error!(%account, failed, total, "[pp-02] Redaction incomplete");
            return Err(VerificationError::RedactionIncomplete { failed, total });
        }

        info!(%account, total, "[pp-02] Personal data redacted");
        Ok(total)
    }

    async fn has_redacted(&self, account: Address) -> Result<bool, VerificationError> {
        let verified = self.ports.store.verified_for_account(account).await?;
        if verified.is_empty() {
            return Err(VerificationError::NotFound("No verifications found".into()));
        }
        Ok(verified.iter().all(|r| r.redacted))
    }
}
