//! Development helpers.

use super::Endpoint;
use crate::domain::error::ApiError;
use crate::domain::requests::ChainRequest;
use crate::domain::responses::DevContractsResponse;
use crate::service::AppState;
use axum::extract::State;
use axum::Json;

/// `POST /dev-contracts`: contract addresses of a local development chain.
pub async fn dev_contracts(
    State(state): State<AppState>,
    Endpoint(req): Endpoint<ChainRequest>,
) -> Result<Json<DevContractsResponse>, ApiError> {
    let (verification, example_fee_token) = state
        .require_chain(req.chain_id)?
        .dev_contracts()
        .ok_or_else(|| ApiError::bad_request("Development mode not available"))?;

    Ok(Json(DevContractsResponse {
        verification,
        example_fee_token,
    }))
}
