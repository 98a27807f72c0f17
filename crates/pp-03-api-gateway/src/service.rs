//! API Gateway service - HTTP server lifecycle and router assembly.

use crate::domain::chains::{ChainInfo, ChainRegistry};
use crate::domain::config::GatewayConfig;
use crate::domain::error::{ApiError, GatewayError};
use crate::handlers::{self, not_found};
use crate::middleware::{create_cors_layer, RequestTimeoutLayer};
use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::Router;
use pp_02_verification::{DisclosureApi, RedactionApi, SessionReconcilerApi};
use shared_types::ChainId;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<dyn SessionReconcilerApi>,
    pub disclosure: Arc<dyn DisclosureApi>,
    pub redaction: Arc<dyn RedactionApi>,
    pub chains: Arc<ChainRegistry>,
}

impl AppState {
    /// Details of a configured chain, or `400 Invalid chain specified`.
    pub fn require_chain(&self, chain: ChainId) -> Result<&ChainInfo, ApiError> {
        self.chains.get(chain).ok_or_else(ApiError::invalid_chain)
    }
}

/// Build the HTTP router with its middleware stack.
pub fn build_router(state: AppState, config: &GatewayConfig) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(create_cors_layer(&config.cors))
        .layer(RequestTimeoutLayer::new(config.http.request_timeout));

    Router::new()
        .route("/verify", post(handlers::verify).fallback(not_found))
        .route(
            "/verification-limit",
            post(handlers::verification_limit).fallback(not_found),
        )
        .route(
            "/account-status",
            post(handlers::account_status).fallback(not_found),
        )
        .route(
            "/check-verification-status",
            post(handlers::check_verification_status).fallback(not_found),
        )
        .route(
            "/get-account-details",
            post(handlers::get_account_details).fallback(not_found),
        )
        .route(
            "/fetch-personal-data",
            post(handlers::fetch_personal_data).fallback(not_found),
        )
        .route(
            "/redact-personal-data",
            post(handlers::redact_personal_data).fallback(not_found),
        )
        .route(
            "/has-redacted",
            post(handlers::has_redacted).fallback(not_found),
        )
        .route(
            "/dev-contracts",
            post(handlers::dev_contracts).fallback(not_found),
        )
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.http.max_body_bytes))
        .layer(middleware)
        .with_state(state)
}

/// API Gateway service state
pub struct ApiGatewayService {
    config: GatewayConfig,
    state: AppState,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<std::io::Result<()>>>,
}

impl ApiGatewayService {
    /// Create a new API Gateway service
    pub fn new(config: GatewayConfig, state: AppState) -> Result<Self, GatewayError> {
        config
            .validate()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        Ok(Self {
            config,
            state,
            shutdown_tx: None,
            server: None,
        })
    }

    /// Bind and start serving in the background. Returns the bound address,
    /// which differs from the configured one when the port is 0.
    pub async fn start(&mut self) -> Result<SocketAddr, GatewayError> {
        if self.server.is_some() {
            return Err(GatewayError::AlreadyRunning);
        }

        let listener = tokio::net::TcpListener::bind(self.config.http_addr())
            .await
            .map_err(|e| GatewayError::Bind(e.to_string()))?;
        let addr = listener
            .local_addr()
            .map_err(|e| GatewayError::Bind(e.to_string()))?;

        let router = build_router(self.state.clone(), &self.config);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        self.shutdown_tx = Some(shutdown_tx);

        self.server = Some(tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        }));

        info!(addr = %addr, chains = self.state.chains.ids().count(), "[pp-03] HTTP server listening");
        Ok(addr)
    }

    /// Wait for the server task to finish.
    pub async fn wait(&mut self) -> Result<(), GatewayError> {
        let Some(handle) = self.server.take() else {
            return Ok(());
        };

        match handle.await {
            Ok(Ok(())) => {
                info!("[pp-03] HTTP server stopped");
                Ok(())
            }
            Ok(Err(e)) => {
                error!(error = %e, "[pp-03] HTTP server error");
                Err(GatewayError::Server(e.to_string()))
            }
            Err(e) => Err(GatewayError::Server(e.to_string())),
        }
    }

    /// Trigger graceful shutdown
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use k256::ecdsa::SigningKey;
    use pp_01_signing_engine::{address_from_pubkey, sign_personal_message, SignerKeyring, SigningEngine};
    use async_trait::async_trait;
    use pp_02_verification::{
        DisclosureAttestor, FeeLedger, InMemoryVerificationStore, LedgerError, MockFeeLedger,
        MockIdentityProvider, ProviderDate, RedactionCoordinator, ReportDocument,
        SessionReconciler, VerificationConfig, VerificationPorts,
    };
    use serde_json::{json, Value};
    use shared_types::{Address, ManualTimeSource, VerificationStatus};
    use std::time::Duration;
    use tower::ServiceExt;

    const CHAIN: ChainId = ChainId(1);

    struct Harness {
        state: AppState,
        router: Router,
        provider: Arc<MockIdentityProvider>,
        ledger: Arc<MockFeeLedger>,
        store: Arc<InMemoryVerificationStore>,
    }

    /// Fee ledger that answers only after `delay`.
    struct SlowLedger {
        inner: Arc<MockFeeLedger>,
        delay: Duration,
    }

    #[async_trait]
    impl FeeLedger for SlowLedger {
        async fn fee_paid_for(&self, chain: ChainId, account: Address) -> Result<u64, LedgerError> {
            tokio::time::sleep(self.delay).await;
            self.inner.fee_paid_for(chain, account).await
        }
    }

    fn harness(max_verifications: u64) -> Harness {
        harness_with(max_verifications, None, GatewayConfig::default())
    }

    fn harness_with(
        max_verifications: u64,
        ledger_delay: Option<Duration>,
        gateway: GatewayConfig,
    ) -> Harness {
        let clock = Arc::new(ManualTimeSource::new(1_792_324_800_000));
        let store = Arc::new(InMemoryVerificationStore::with_clock(clock.clone()));
        let provider = Arc::new(MockIdentityProvider::new());
        let ledger = Arc::new(MockFeeLedger::new());

        let mut keyring = SignerKeyring::new();
        keyring.insert(CHAIN, SigningKey::random(&mut rand::thread_rng()));
        keyring.insert(ChainId::DEV, SigningKey::random(&mut rand::thread_rng()));

        let ports = VerificationPorts {
            store: store.clone(),
            provider: provider.clone(),
            ledger: match ledger_delay {
                Some(delay) => Arc::new(SlowLedger {
                    inner: ledger.clone(),
                    delay,
                }),
                None => ledger.clone(),
            },
            signer: Arc::new(SigningEngine::new(keyring)),
            clock,
        };
        let config = VerificationConfig {
            max_verifications,
            poll_cooldown_ms: 2_000,
        };

        let chains: ChainRegistry = [
            (
                CHAIN,
                ChainInfo {
                    name: "mainnet".into(),
                    ..ChainInfo::default()
                },
            ),
            (
                ChainId::DEV,
                ChainInfo {
                    name: "local".into(),
                    verification_contract: Some(Address::new([0x11; 20])),
                    fee_token: Some(Address::new([0x22; 20])),
                    dev: true,
                },
            ),
        ]
        .into_iter()
        .collect();

        let state = AppState {
            reconciler: Arc::new(SessionReconciler::with_default_cooldown(ports.clone(), config)),
            disclosure: Arc::new(DisclosureAttestor::new(ports.clone())),
            redaction: Arc::new(RedactionCoordinator::new(ports)),
            chains: Arc::new(chains),
        };

        Harness {
            router: build_router(state.clone(), &gateway),
            state,
            provider,
            ledger,
            store,
        }
    }

    fn post_json(path: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn wallet() -> (SigningKey, Address) {
        let key = SigningKey::random(&mut rand::thread_rng());
        let address = address_from_pubkey(key.verifying_key());
        (key, address)
    }

    #[tokio::test]
    async fn test_unknown_path_is_json_404() {
        let h = harness(10);
        let (status, body) = send(&h.router, post_json("/nope", json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Not Found" }));
    }

    #[tokio::test]
    async fn test_non_post_is_404() {
        let h = harness(10);
        let request = Request::builder()
            .method(Method::GET)
            .uri("/account-status")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&h.router, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Not Found");
    }

    #[tokio::test]
    async fn test_invalid_json_and_missing_parameter() {
        let h = harness(10);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/account-status")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&h.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid JSON body");

        let (status, body) = send(&h.router, post_json("/account-status", json!({ "chainId": 1 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing parameter: account");
    }

    #[tokio::test]
    async fn test_unconfigured_chain_rejected() {
        let h = harness(10);
        let (_, account) = wallet();
        let (status, body) = send(
            &h.router,
            post_json("/account-status", json!({ "account": account, "chainId": "0x5" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid chain specified");
    }

    #[tokio::test]
    async fn test_absent_account_status_skips_provider() {
        let h = harness(10);
        let (_, account) = wallet();
        let (status, body) = send(
            &h.router,
            post_json("/account-status", json!({ "account": account, "chainId": "0x1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["exists"], false);
        assert_eq!(body["verificationAllowed"], true);
        assert_eq!(h.provider.retrieve_calls(), 0);
    }

    #[tokio::test]
    async fn test_verify_uses_referer_as_return_url() {
        let h = harness(10);
        let (key, account) = wallet();
        h.ledger.set_fee_paid(CHAIN, account, 1000);
        let signature = sign_personal_message(&key, b"1000").unwrap();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/verify")
            .header(header::REFERER, "https://dapp.example/passport")
            .body(Body::from(
                json!({ "account": account, "signature": signature.to_hex(), "chainId": 1 })
                    .to_string(),
            ))
            .unwrap();
        let (status, body) = send(&h.router, request).await;

        assert_eq!(status, StatusCode::OK);
        let session_id = h.provider.session_ids().pop().unwrap();
        assert!(body["redirect"].as_str().unwrap().ends_with(&session_id));
        assert_eq!(
            h.provider.created_with(&session_id).unwrap().return_url.as_deref(),
            Some("https://dapp.example/passport")
        );
        assert_eq!(h.store.records().len(), 1);
    }

    #[tokio::test]
    async fn test_verify_with_wrong_signer_is_400() {
        let h = harness(10);
        let (_, account) = wallet();
        let (other_key, _) = wallet();
        h.ledger.set_fee_paid(CHAIN, account, 1000);
        let signature = sign_personal_message(&other_key, b"1000").unwrap();

        let (status, body) = send(
            &h.router,
            post_json(
                "/verify",
                json!({ "account": account, "signature": signature.to_hex(), "chainId": 1 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid signature provided");
    }

    #[tokio::test]
    async fn test_capacity_exhausted_is_503() {
        let h = harness(0);
        let (key, account) = wallet();
        h.ledger.set_fee_paid(CHAIN, account, 5);
        let signature = sign_personal_message(&key, b"5").unwrap();

        let (status, _) = send(
            &h.router,
            post_json(
                "/verify",
                json!({ "account": account, "signature": signature.to_hex(), "chainId": 1 }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let (status, body) = send(&h.router, post_json("/verification-limit", json!({ "chainId": 1 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "verificationAllowed": false }));
    }

    async fn verify_paid(h: &Harness, block: u64) -> (StatusCode, Address) {
        let (key, account) = wallet();
        h.ledger.set_fee_paid(CHAIN, account, block);
        let signature = sign_personal_message(&key, block.to_string().as_bytes()).unwrap();
        let (status, _) = send(
            &h.router,
            post_json(
                "/verify",
                json!({ "account": account, "signature": signature.to_hex(), "chainId": 1 }),
            ),
        )
        .await;
        (status, account)
    }

    #[tokio::test]
    async fn test_terminal_records_fill_capacity() {
        let h = harness(2);
        let (status, verified) = verify_paid(&h, 1000).await;
        assert_eq!(status, StatusCode::OK);
        let (status, canceled) = verify_paid(&h, 1000).await;
        assert_eq!(status, StatusCode::OK);

        let session_of = |account: Address| {
            h.store
                .records()
                .into_iter()
                .find(|r| r.account == account)
                .and_then(|r| r.session_id)
                .unwrap()
        };
        h.provider.complete_session(
            &session_of(verified),
            ReportDocument {
                issuing_country: "US".into(),
                number: "X1234567".into(),
                expiration_date: ProviderDate { year: 2031, month: 6, day: 15 },
                dob: ProviderDate { year: 1990, month: 5, day: 17 },
            },
        );
        h.provider
            .set_status(&session_of(canceled), VerificationStatus::Canceled);

        for (account, expected) in [(verified, "verified"), (canceled, "canceled")] {
            let (status, body) = send(
                &h.router,
                post_json("/account-status", json!({ "account": account, "chainId": 1 })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["status"], expected);
        }

        let (status, _) = verify_paid(&h, 1000).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(h.store.records().len(), 2);
    }

    #[tokio::test]
    async fn test_check_status_inside_cooldown_is_429() {
        let h = harness(10);
        let (_, account) = wallet();
        let request = || {
            post_json(
                "/check-verification-status",
                json!({ "account": account, "feePaidBlock": 1000, "chainId": 1 }),
            )
        };

        let (status, body) = send(&h.router, request()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["exists"], false);

        let (status, body) = send(&h.router, request()).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"], "Rate limit exceeded");
    }

    #[tokio::test]
    async fn test_account_details_without_records_is_404() {
        let h = harness(10);
        let (_, account) = wallet();
        let (status, body) = send(
            &h.router,
            post_json("/get-account-details", json!({ "account": account, "chainId": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "No verifications found");
    }

    #[tokio::test]
    async fn test_dev_contracts() {
        let h = harness(10);

        let (status, body) = send(&h.router, post_json("/dev-contracts", json!({ "chainId": "0x539" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["Verification"], format!("0x{}", "11".repeat(20)));
        assert_eq!(body["ExampleFeeToken"], format!("0x{}", "22".repeat(20)));

        let (status, body) = send(&h.router, post_json("/dev-contracts", json!({ "chainId": 1 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Development mode not available");
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let h = harness(10);
        let padding = "x".repeat(GatewayConfig::default().http.max_body_bytes + 1);
        let (status, _) = send(
            &h.router,
            post_json("/verification-limit", json!({ "chainId": 1, "pad": padding })),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out_with_json_error() {
        let mut gateway = GatewayConfig::default();
        gateway.http.request_timeout = Duration::from_millis(50);
        let h = harness_with(10, Some(Duration::from_millis(300)), gateway);
        let (key, account) = wallet();
        h.ledger.set_fee_paid(CHAIN, account, 1000);
        let signature = sign_personal_message(&key, b"1000").unwrap();

        let (status, body) = send(
            &h.router,
            post_json(
                "/verify",
                json!({ "account": account, "signature": signature.to_hex(), "chainId": 1 }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Internal Server Error" }));
        assert!(h.store.records().is_empty());
    }

    #[tokio::test]
    async fn test_cors_preflight_answered() {
        let h = harness(10);
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/verify")
            .header(header::ORIGIN, "https://dapp.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = h.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn test_gateway_serves_and_shuts_down() {
        let mut config = GatewayConfig::default();
        config.http.host = std::net::IpAddr::from([127, 0, 0, 1]);
        config.http.port = 0;

        let mut gateway = ApiGatewayService::new(config, harness(10).state).unwrap();
        let addr = gateway.start().await.unwrap();
        assert_ne!(addr.port(), 0);
        assert!(matches!(gateway.start().await, Err(GatewayError::AlreadyRunning)));

        gateway.shutdown();
        gateway.wait().await.unwrap();
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = GatewayConfig::default();
        config.http.max_body_bytes = 0;
        assert!(matches!(
            ApiGatewayService::new(config, harness(10).state),
            Err(GatewayError::Config(_))
        ));
    }
}
