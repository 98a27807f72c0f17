//! `Endpoint<T>` extractor: body → required parameters → typed request.

use crate::domain::error::ApiError;
use crate::domain::requests::{EndpointRequest, Params};
use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};

/// A request body that passed its endpoint's schema.
#[derive(Debug, Clone)]
pub struct Endpoint<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Endpoint<T>
where
    T: EndpointRequest,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::new(rejection.status(), rejection.body_text()))?;

        let params = Params::from_body(&body)?;
        params.require(T::REQUIRED)?;
        T::parse(&params).map(Endpoint)
    }
}
