//! # Disclosure Facts
//!
//! Age thresholds and the packed country code derived from stored personal
//! data.

use super::errors::VerificationError;
use chrono::{Datelike, NaiveDate};

/// The date `dob` turns `years` old.
///
/// A 29 February birthday in a non-leap target year falls on 1 March.
pub fn anniversary(dob: NaiveDate, years: u32) -> Option<NaiveDate> {
    let year = dob.year().checked_add(i32::try_from(years).ok()?)?;
    NaiveDate::from_ymd_opt(year, dob.month(), dob.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
}

/// Whether someone born on `dob` is at least `years` old on `today`.
pub fn meets_age(dob: NaiveDate, years: u32, today: NaiveDate) -> bool {
    anniversary(dob, years)
        .map(|date| date <= today)
        .unwrap_or(false)
}

/// Pack a two-letter country code as `(c0 << 16) + c1`.
pub fn country_code_int(code: &str) -> Result<u32, VerificationError> {
    let mut chars = code.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(first), Some(second), None) => Ok(((first as u32) << 16) + second as u32),
        _ => Err(VerificationError::DataIntegrity(
            "Unexpected country code".to_string(),
        )),
    }
}
