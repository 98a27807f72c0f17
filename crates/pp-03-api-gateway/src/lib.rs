//! # API Gateway (PP-03)
//!
//! POST-only JSON interface in front of the verification services.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    API GATEWAY (pp-03)                   │
//! ├──────────────────────────────────────────────────────────┤
//! │  Middleware: CORS → Trace → Timeout → Body limit         │
//! │                         │                                │
//! │  Endpoint<T> extractor: JSON body → required fields →    │
//! │                         typed request struct             │
//! │                         │                                │
//! │  Handlers: chain check → service call → JSON response    │
//! └─────────────────────────┼────────────────────────────────┘
//!                           ▼
//!        SessionReconciler · DisclosureAttestor · RedactionCoordinator
//! ```
//!
//! Every endpoint requires `chainId`; an unknown chain or a missing
//! parameter is a `400 {error}`. Domain errors map to fixed status codes
//! (see [`ApiError`]); internal failures are logged and answered with a
//! generic message.
//!
//! ## Usage
//!
//! ```ignore
//! use pp_03_api_gateway::{ApiGatewayService, AppState, GatewayConfig};
//!
//! let mut gateway = ApiGatewayService::new(GatewayConfig::default(), state)?;
//! let addr = gateway.start().await?;
//! ```

pub mod domain;
pub mod handlers;
pub mod middleware;
pub mod service;

pub use domain::chains::{ChainInfo, ChainRegistry};
pub use domain::config::{ConfigError, CorsConfig, GatewayConfig, HttpConfig};
pub use domain::error::{ApiError, GatewayError};
pub use service::{build_router, ApiGatewayService, AppState};
