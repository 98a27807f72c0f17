//! Request deadline middleware.
//!
//! A request that outlives the configured deadline is dropped and answered
//! with the generic `{"error": ...}` 500 body, the same as any other
//! internal failure.

use crate::domain::error::ApiError;
use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::{Layer, Service};
use tracing::warn;

/// Timeout layer
#[derive(Debug, Clone, Copy)]
pub struct RequestTimeoutLayer {
    deadline: Duration,
}

impl RequestTimeoutLayer {
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }
}

impl<S> Layer<S> for RequestTimeoutLayer {
    type Service = RequestTimeout<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestTimeout {
            inner,
            deadline: self.deadline,
        }
    }
}

/// Timeout service
#[derive(Debug, Clone)]
pub struct RequestTimeout<S> {
    inner: S,
    deadline: Duration,
}

impl<S> Service<Request<Body>> for RequestTimeout<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // The readied service handles this request; the clone waits for the next one.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let deadline = self.deadline;
        let path = req.uri().path().to_owned();

        Box::pin(async move {
            match tokio::time::timeout(deadline, inner.call(req)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        path = %path,
                        timeout_ms = deadline.as_millis() as u64,
                        "[pp-03] Request timed out"
                    );
                    Ok(ApiError::internal().into_response())
                }
            }
        })
    }
}
