//! API Gateway error types.
//!
//! Every failure leaves the gateway as `{"error": <message>}` with a fixed
//! status code per domain error.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pp_02_verification::VerificationError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Message returned for every internal failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// HTTP-facing error: a status code and a message safe to show the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 400 with the given message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn missing_parameter(name: &str) -> Self {
        Self::bad_request(format!("Missing parameter: {}", name))
    }

    pub fn invalid_parameter(name: &str) -> Self {
        Self::bad_request(format!("Invalid parameter: {}", name))
    }

    pub fn invalid_chain() -> Self {
        Self::bad_request("Invalid chain specified")
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not Found")
    }

    pub fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<VerificationError> for ApiError {
    fn from(e: VerificationError) -> Self {
        if e.is_internal() {
            error!(error = %e, "[pp-03] Request failed");
        }

        match e {
            VerificationError::Validation(message) => Self::bad_request(message),
            VerificationError::InvalidSignature | VerificationError::AlreadyCompleted => {
                Self::bad_request(e.to_string())
            }
            VerificationError::CapacityExceeded => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            }
            VerificationError::NotFound(message) => Self::new(StatusCode::NOT_FOUND, message),
            VerificationError::RateLimited => {
                Self::new(StatusCode::TOO_MANY_REQUESTS, e.to_string())
            }
            VerificationError::RedactionIncomplete { .. } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Unable to redact verification data from provider",
            ),
            VerificationError::Persistence(_)
            | VerificationError::Provider(_)
            | VerificationError::Ledger(_)
            | VerificationError::DataIntegrity(_)
            | VerificationError::Configuration(_) => Self::internal(),
        }
    }
}

/// Gateway lifecycle errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(String),

    /// The server task ended abnormally
    #[error("server error: {0}")]
    Server(String),

    /// `start` called on a running gateway
    #[error("gateway already running")]
    AlreadyRunning,
}
