//! # Verification Report
//!
//! Document fields the provider returns for a verified session, and the
//! values derived from them.

use super::errors::VerificationError;
use super::record::VerifiedDetails;
use chrono::NaiveDate;
use pp_01_signing_engine::keccak256;
use serde::{Deserialize, Serialize};
use shared_types::Hash;

/// Calendar date as the provider reports it (1-based month).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl ProviderDate {
    pub fn to_naive(self) -> Result<NaiveDate, VerificationError> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day).ok_or_else(|| {
            VerificationError::DataIntegrity(format!(
                "invalid report date {}-{}-{}",
                self.year, self.month, self.day
            ))
        })
    }
}

impl From<NaiveDate> for ProviderDate {
    fn from(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

/// Identity document section of a report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportDocument {
    /// ISO 3166-1 alpha-2 code of the issuing country.
    pub issuing_country: String,
    pub number: String,
    pub expiration_date: ProviderDate,
    pub dob: ProviderDate,
}

/// Provider verification report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub id: String,
    pub document: ReportDocument,
}

impl VerificationReport {
    /// Derive everything a verified record stores.
    pub fn verified_details(&self) -> Result<VerifiedDetails, VerificationError> {
        let doc = &self.document;
        let expiration = expiration_timestamp(doc.expiration_date.to_naive()?)?;
        Ok(VerifiedDetails {
            expiration,
            country_and_doc_number_hash: country_and_doc_number_hash(
                &doc.issuing_country,
                &doc.number,
                expiration,
            ),
            date_of_birth: doc.dob.to_naive()?,
            country: doc.issuing_country.clone(),
        })
    }
}

/// UTC midnight at the start of `date`, unix seconds.
pub fn expiration_timestamp(date: NaiveDate) -> Result<u64, VerificationError> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
        .ok_or_else(|| VerificationError::DataIntegrity("epoch out of range".into()))?;
    let days = date.signed_duration_since(epoch).num_days();
    u64::try_from(days)
        .map(|d| d * 86_400)
        .map_err(|_| VerificationError::DataIntegrity(format!("expiration {} precedes 1970", date)))
}

/// `keccak256(issuingCountry ‖ documentNumber ‖ expirationEpochMillis)`.
///
/// The expiry is part of the preimage so a renewed passport that keeps its
/// number yields a different hash.
pub fn country_and_doc_number_hash(country: &str, number: &str, expiration_secs: u64) -> Hash {
    let preimage = format!("{}{}{}", country, number, expiration_secs * 1000);
    keccak256(preimage.as_bytes())
}
