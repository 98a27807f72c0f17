//! Session and status endpoints.

use super::Endpoint;
use crate::domain::error::ApiError;
use crate::domain::requests::{AccountRequest, BlockStatusRequest, ChainRequest, VerifyRequest};
use crate::domain::responses::{
    AccountDetailsResponse, AccountStatusResponse, BlockStatusResponse, RedirectResponse,
    VerificationLimitResponse,
};
use crate::service::AppState;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use pp_02_verification::SessionRequest;
use tracing::debug;

/// `POST /verify`: open or resume the session for the caller's latest fee
/// payment. The page that sent the user is where the provider returns them.
pub async fn verify(
    State(state): State<AppState>,
    headers: HeaderMap,
    Endpoint(req): Endpoint<VerifyRequest>,
) -> Result<Json<RedirectResponse>, ApiError> {
    state.require_chain(req.chain_id)?;

    let return_url = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    debug!(account = %req.account, chain = %req.chain_id, "[pp-03] /verify");

    let redirect = state
        .reconciler
        .request_or_resume_session(SessionRequest {
            account: req.account,
            signature: req.signature,
            chain: req.chain_id,
            return_url,
        })
        .await?;

    Ok(Json(RedirectResponse { redirect }))
}

/// `POST /verification-limit`
pub async fn verification_limit(
    State(state): State<AppState>,
    Endpoint(req): Endpoint<ChainRequest>,
) -> Result<Json<VerificationLimitResponse>, ApiError> {
    state.require_chain(req.chain_id)?;

    let verification_allowed = state.reconciler.verification_allowed().await?;
    Ok(Json(VerificationLimitResponse {
        verification_allowed,
    }))
}

/// `POST /account-status`
pub async fn account_status(
    State(state): State<AppState>,
    Endpoint(req): Endpoint<AccountRequest>,
) -> Result<Json<AccountStatusResponse>, ApiError> {
    state.require_chain(req.chain_id)?;

    let status = state
        .reconciler
        .poll_and_reconcile(req.account, req.chain_id)
        .await?;
    Ok(Json(status.into()))
}

/// `POST /check-verification-status`
pub async fn check_verification_status(
    State(state): State<AppState>,
    Endpoint(req): Endpoint<BlockStatusRequest>,
) -> Result<Json<BlockStatusResponse>, ApiError> {
    state.require_chain(req.chain_id)?;

    let status = state
        .reconciler
        .check_verification_status(req.account, req.fee_paid_block, req.chain_id)
        .await?;
    Ok(Json(status.into()))
}

/// `POST /get-account-details`
pub async fn get_account_details(
    State(state): State<AppState>,
    Endpoint(req): Endpoint<AccountRequest>,
) -> Result<Json<AccountDetailsResponse>, ApiError> {
    state.require_chain(req.chain_id)?;

    let details = state
        .reconciler
        .account_details(req.account, req.chain_id)
        .await?;
    Ok(Json(details.into()))
}
