//! Selective disclosure and redaction endpoints.

use super::Endpoint;
use crate::domain::error::ApiError;
use crate::domain::requests::{AccountRequest, SignedRequest};
use crate::domain::responses::{HasRedactedResponse, OkResponse, PersonalDataResponse};
use crate::service::AppState;
use axum::extract::State;
use axum::Json;
use tracing::info;

/// `POST /fetch-personal-data`
pub async fn fetch_personal_data(
    State(state): State<AppState>,
    Endpoint(req): Endpoint<SignedRequest>,
) -> Result<Json<PersonalDataResponse>, ApiError> {
    state.require_chain(req.chain_id)?;

    let facts = state
        .disclosure
        .derive_facts(&req.signature, req.chain_id)
        .await?;
    Ok(Json(facts.into()))
}

/// `POST /redact-personal-data`
pub async fn redact_personal_data(
    State(state): State<AppState>,
    Endpoint(req): Endpoint<SignedRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    state.require_chain(req.chain_id)?;

    let count = state.redaction.redact(&req.signature).await?;
    info!(count, "[pp-03] Personal data redacted");
    Ok(Json(OkResponse::ok()))
}

/// `POST /has-redacted`
pub async fn has_redacted(
    State(state): State<AppState>,
    Endpoint(req): Endpoint<AccountRequest>,
) -> Result<Json<HasRedactedResponse>, ApiError> {
    state.require_chain(req.chain_id)?;

    let redacted = state.redaction.has_redacted(req.account).await?;
    Ok(Json(HasRedactedResponse { redacted }))
}
