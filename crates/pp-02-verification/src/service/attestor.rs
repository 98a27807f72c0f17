//! # Disclosure Attestor
//!
//! Signs age and country facts from a verified record so the holder can
//! publish any subset on-chain without revealing the rest.

use super::VerificationPorts;
use crate::domain::disclosure::{country_code_int, meets_age};
use crate::domain::errors::VerificationError;
use crate::domain::views::DisclosureFacts;
use crate::ports::inbound::{DisclosureApi, FETCH_PERSONAL_DATA_MESSAGE};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use pp_01_signing_engine::{AgeThreshold, EcdsaSignature};
use shared_types::ChainId;
use tracing::info;

/// Disclosure Attestor service.
pub struct DisclosureAttestor {
    ports: VerificationPorts,
}

impl DisclosureAttestor {
    pub fn new(ports: VerificationPorts) -> Self {
        Self { ports }
    }

    fn today(&self) -> Result<NaiveDate, VerificationError> {
        let now = self.ports.clock.now_millis();
        i64::try_from(now)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|instant| instant.date_naive())
            .ok_or_else(|| VerificationError::DataIntegrity(format!("clock out of range: {}", now)))
    }
}

#[async_trait]
impl DisclosureApi for DisclosureAttestor {
    async fn derive_facts(
        &self,
        signature: &EcdsaSignature,
        chain: ChainId,
    ) -> Result<DisclosureFacts, VerificationError> {
        let account = self.ports.recover(FETCH_PERSONAL_DATA_MESSAGE, signature)?;

        let record = self
            .ports
            .store
            .verified_for_account(account)
            .await?
            .into_iter()
            .find(|r| !r.redacted)
            .ok_or_else(|| VerificationError::NotFound("Verification not found".into()))?;

        let dob = record.personal_date_of_birth.ok_or_else(|| {
            VerificationError::DataIntegrity(format!("record {} has no date of birth", record.id))
        })?;
        let country = record.personal_country.as_deref().ok_or_else(|| {
            VerificationError::DataIntegrity(format!("record {} has no country", record.id))
        })?;
        let country_code_int = country_code_int(country)?;

        let today = self.today()?;
        let over18 = meets_age(dob, AgeThreshold::Over18.years(), today);
        let over21 = meets_age(dob, AgeThreshold::Over21.years(), today);

        let signer = &self.ports.signer;
        let facts = DisclosureFacts {
            over18,
            over18_signature: signer.sign_age(chain, account, AgeThreshold::Over18, over18)?,
            over21,
            over21_signature: signer.sign_age(chain, account, AgeThreshold::Over21, over21)?,
            country_code_int,
            country_signature: signer.sign_country(chain, account, country_code_int)?,
        };

        info!(%account, %chain, "[pp-02] Disclosure facts issued");
        Ok(facts)
    }
}
