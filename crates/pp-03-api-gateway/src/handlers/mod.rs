//! Endpoint handlers.
//!
//! Every handler takes its typed request through [`Endpoint`], rejects an
//! unconfigured chain, calls one service and renders the result.

pub mod extract;

mod dev;
mod disclosure;
mod verification;

pub use dev::dev_contracts;
pub use disclosure::{fetch_personal_data, has_redacted, redact_personal_data};
pub use extract::Endpoint;
pub use verification::{
    account_status, check_verification_status, get_account_details, verification_limit, verify,
};

use crate::domain::error::ApiError;

/// Fallback for unknown paths.
pub async fn not_found() -> ApiError {
    ApiError::not_found()
}
