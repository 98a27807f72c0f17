//! # Live Stack
//!
//! Boots the real server (production adapters, RocksDB excluded) over TCP
//! against fake identity-provider and JSON-RPC upstreams.
//!
//! ## Checked Against The Upstreams
//!
//! - Session creation form (passport only, live capture, selfie, return url)
//! - Bearer keys: secret key for sessions, restricted key for reports
//! - Report expansion of the document fields
//! - `feePaidFor(address)` calldata and the uint256 decoding

#[cfg(test)]
mod tests {
    use axum::extract::{Path, Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::{get, post};
    use axum::{Form, Json, Router};
    use k256::ecdsa::SigningKey;
    use parking_lot::Mutex;
    use pp_01_signing_engine::{address_from_pubkey, sign_personal_message};
    use pp_03_api_gateway::ApiGatewayService;
    use serde_json::{json, Value};
    use shared_types::Address;
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use verification_server::{ServerConfig, ServiceContainer};

    const SECRET_KEY: &str = "sk_test_live_stack";
    const RESTRICTED_KEY: &str = "rk_test_live_stack";
    const SIGNER_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    // =============================================================================
    // FAKE UPSTREAMS
    // =============================================================================

    #[derive(Default)]
    struct FakeSession {
        status: String,
        report: Option<String>,
    }

    #[derive(Default)]
    struct Upstream {
        sessions: HashMap<String, FakeSession>,
        session_forms: Vec<Vec<(String, String)>>,
        report_queries: Vec<Vec<(String, String)>>,
        redacted: Vec<String>,
        /// Fee-payment block per lowercase hex address (no prefix).
        fee_blocks: HashMap<String, u64>,
        rpc_calls: Vec<Value>,
        failing: bool,
    }

    type Shared = Arc<Mutex<Upstream>>;

    fn provider_error(status: StatusCode, message: &str) -> Response {
        (status, Json(json!({ "error": { "message": message } }))).into_response()
    }

    fn authorized(headers: &HeaderMap, key: &str) -> bool {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map_or(false, |v| v == format!("Bearer {}", key))
    }

    fn session_json(id: &str, session: &FakeSession) -> Value {
        let url = (session.status == "requires_input")
            .then(|| format!("https://verify.fake/start/{}", id));
        json!({
            "id": id,
            "object": "identity.verification_session",
            "status": session.status,
            "url": url,
            "last_verification_report": session.report,
        })
    }

    async fn create_session(
        State(upstream): State<Shared>,
        headers: HeaderMap,
        Form(form): Form<Vec<(String, String)>>,
    ) -> Response {
        if !authorized(&headers, SECRET_KEY) {
            return provider_error(StatusCode::UNAUTHORIZED, "Invalid API Key provided");
        }
        let mut upstream = upstream.lock();
        if upstream.failing {
            return provider_error(StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded");
        }
        let id = format!("vs_{}", upstream.sessions.len() + 1);
        let session = FakeSession {
            status: "requires_input".into(),
            report: None,
        };
        let body = session_json(&id, &session);
        upstream.sessions.insert(id, session);
        upstream.session_forms.push(form);
        Json(body).into_response()
    }

    async fn retrieve_session(
        State(upstream): State<Shared>,
        Path(id): Path<String>,
        headers: HeaderMap,
    ) -> Response {
        if !authorized(&headers, SECRET_KEY) {
            return provider_error(StatusCode::UNAUTHORIZED, "Invalid API Key provided");
        }
        let upstream = upstream.lock();
        if upstream.failing {
            return provider_error(StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded");
        }
        match upstream.sessions.get(&id) {
            Some(session) => Json(session_json(&id, session)).into_response(),
            None => provider_error(StatusCode::NOT_FOUND, "No such verification_session"),
        }
    }

    async fn retrieve_report(
        State(upstream): State<Shared>,
        Path(id): Path<String>,
        Query(query): Query<Vec<(String, String)>>,
        headers: HeaderMap,
    ) -> Response {
        if !authorized(&headers, RESTRICTED_KEY) {
            return provider_error(StatusCode::FORBIDDEN, "Restricted key required");
        }
        upstream.lock().report_queries.push(query);
        Json(json!({
            "id": id,
            "object": "identity.verification_report",
            "document": {
                "issuing_country": "DE",
                "number": "C01X00T47",
                "expiration_date": { "day": 1, "month": 3, "year": 2032 },
                "dob": { "day": 12, "month": 8, "year": 1985 },
            },
        }))
        .into_response()
    }

    async fn redact_session(
        State(upstream): State<Shared>,
        Path(id): Path<String>,
        headers: HeaderMap,
    ) -> Response {
        if !authorized(&headers, SECRET_KEY) {
            return provider_error(StatusCode::UNAUTHORIZED, "Invalid API Key provided");
        }
        let mut upstream = upstream.lock();
        let Some(session) = upstream.sessions.get(&id) else {
            return provider_error(StatusCode::NOT_FOUND, "No such verification_session");
        };
        let body = session_json(&id, session);
        upstream.redacted.push(id);
        Json(body).into_response()
    }

    async fn json_rpc(State(upstream): State<Shared>, Json(request): Json<Value>) -> Json<Value> {
        let mut upstream = upstream.lock();
        let data = request["params"][0]["data"].as_str().unwrap_or_default().to_string();
        let account = data.get(data.len().saturating_sub(40)..).unwrap_or_default();
        let block = upstream.fee_blocks.get(account).copied().unwrap_or(0);
        upstream.rpc_calls.push(request.clone());
        Json(json!({
            "jsonrpc": "2.0",
            "id": request["id"],
            "result": format!("0x{:064x}", block),
        }))
    }

    async fn spawn(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    // =============================================================================
    // HARNESS
    // =============================================================================

    struct LiveStack {
        upstream: Shared,
        gateway: ApiGatewayService,
        base: String,
        client: reqwest::Client,
    }

    impl LiveStack {
        async fn start() -> Self {
            let upstream: Shared = Arc::default();

            let provider = Router::new()
                .route("/v1/identity/verification_sessions", post(create_session))
                .route("/v1/identity/verification_sessions/:id", get(retrieve_session))
                .route(
                    "/v1/identity/verification_sessions/:id/redact",
                    post(redact_session),
                )
                .route("/v1/identity/verification_reports/:id", get(retrieve_report))
                .with_state(upstream.clone());
            let rpc = Router::new()
                .route("/", post(json_rpc))
                .with_state(upstream.clone());

            let provider_addr = spawn(provider).await;
            let rpc_addr = spawn(rpc).await;

            let raw = json!({
                "http": { "host": "127.0.0.1", "port": 0 },
                "verification": { "max_verifications": 5, "poll_cooldown_ms": 0 },
                "provider": {
                    "base_url": format!("http://{}", provider_addr),
                    "secret_key": SECRET_KEY,
                    "restricted_key": RESTRICTED_KEY,
                    "timeout": "5s",
                },
                "chains": {
                    "0x539": {
                        "name": "local",
                        "rpc": format!("http://{}/", rpc_addr),
                        "verification_contract": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
                        "fee_token": "0xe7f1725e7734ce288f8367e1bb143e90bb3f0512",
                        "dev": true,
                    }
                }
            });
            let mut config = ServerConfig::from_json(&raw.to_string()).unwrap();
            config
                .apply_env([("PP_SIGNER_KEY_1337".to_string(), SIGNER_KEY.to_string())])
                .unwrap();
            config.validate().unwrap();

            let container = ServiceContainer::new(config).unwrap();
            let mut gateway = container.gateway().unwrap();
            let addr = gateway.start().await.unwrap();

            Self {
                upstream,
                gateway,
                base: format!("http://{}", addr),
                client: reqwest::Client::new(),
            }
        }

        async fn post(&self, path: &str, body: Value) -> (u16, Value) {
            let response = self
                .client
                .post(format!("{}{}", self.base, path))
                .header("Referer", "https://dapp.example/return")
                .json(&body)
                .send()
                .await
                .unwrap();
            let status = response.status().as_u16();
            (status, response.json().await.unwrap_or(Value::Null))
        }

        fn pay_fee(&self, account: Address, block: u64) {
            let key = account.to_hex().trim_start_matches("0x").to_string();
            self.upstream.lock().fee_blocks.insert(key, block);
        }

        fn complete(&self, session_id: &str) {
            let mut upstream = self.upstream.lock();
            if let Some(session) = upstream.sessions.get_mut(session_id) {
                session.status = "verified".into();
                session.report = Some(format!("vr_for_{}", session_id));
            }
        }

        async fn stop(mut self) {
            self.gateway.shutdown();
            self.gateway.wait().await.unwrap();
        }
    }

    fn wallet() -> (SigningKey, Address) {
        let key = SigningKey::random(&mut rand::thread_rng());
        let address = address_from_pubkey(key.verifying_key());
        (key, address)
    }

    fn sign(key: &SigningKey, message: &str) -> String {
        sign_personal_message(key, message.as_bytes()).unwrap().to_hex()
    }

    fn form_value<'a>(form: &'a [(String, String)], name: &str) -> Vec<&'a str> {
        form.iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    // =============================================================================
    // TESTS
    // =============================================================================

    #[tokio::test]
    async fn test_full_flow_over_real_adapters() {
        let stack = LiveStack::start().await;
        let (key, account) = wallet();
        stack.pay_fee(account, 4_242);

        let (status, body) = stack
            .post(
                "/verify",
                json!({ "account": account, "signature": sign(&key, "4242"), "chainId": "0x539" }),
            )
            .await;
        assert_eq!(status, 200, "{}", body);
        assert_eq!(body["redirect"], "https://verify.fake/start/vs_1");

        {
            let upstream = stack.upstream.lock();
            let form = &upstream.session_forms[0];
            assert_eq!(form_value(form, "type"), ["document"]);
            assert_eq!(form_value(form, "metadata[account]"), [account.to_hex().as_str()]);
            assert_eq!(form_value(form, "options[document][allowed_types][]"), ["passport"]);
            assert_eq!(form_value(form, "options[document][require_live_capture]"), ["true"]);
            assert_eq!(form_value(form, "options[document][require_matching_selfie]"), ["true"]);
            assert_eq!(form_value(form, "return_url"), ["https://dapp.example/return"]);

            let call = &upstream.rpc_calls[0];
            assert_eq!(call["method"], "eth_call");
            assert_eq!(call["params"][0]["to"], "0x5fbdb2315678afecb367f032d93f642f64180aa3");
            assert_eq!(call["params"][1], "latest");
        }

        stack.complete("vs_1");
        let (status, body) = stack
            .post("/account-status", json!({ "account": account, "chainId": "0x539" }))
            .await;
        assert_eq!(status, 200, "{}", body);
        assert_eq!(body["status"], "verified");
        assert_eq!(body["feePaidChain"], "0x539");
        assert_eq!(body["feePaidBlock"], 4_242);
        assert!(body["signature"].as_str().unwrap().starts_with("0x"));

        {
            let upstream = stack.upstream.lock();
            let expand = form_value(&upstream.report_queries[0], "expand[]");
            assert_eq!(
                expand,
                ["document.expiration_date", "document.number", "document.dob"]
            );
        }

        let (status, body) = stack
            .post(
                "/fetch-personal-data",
                json!({ "signature": sign(&key, "Fetch Personal Data"), "chainId": "0x539" }),
            )
            .await;
        assert_eq!(status, 200, "{}", body);
        assert_eq!(body["over18"], true);
        assert_eq!(body["over21"], true);
        assert_eq!(body["countryCodeInt"], ((b'D' as u32) << 16) + b'E' as u32);

        let (status, body) = stack
            .post(
                "/redact-personal-data",
                json!({ "signature": sign(&key, "Redact Personal Data"), "chainId": "0x539" }),
            )
            .await;
        assert_eq!(status, 200, "{}", body);
        assert_eq!(stack.upstream.lock().redacted, ["vs_1"]);

        let (_, body) = stack
            .post("/dev-contracts", json!({ "chainId": "0x539" }))
            .await;
        assert_eq!(
            body,
            json!({
                "Verification": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
                "ExampleFeeToken": "0xe7f1725e7734ce288f8367e1bb143e90bb3f0512",
            })
        );

        stack.stop().await;
    }

    #[tokio::test]
    async fn test_unpaid_account_rejected() {
        let stack = LiveStack::start().await;
        let (key, account) = wallet();

        let (status, body) = stack
            .post(
                "/verify",
                json!({ "account": account, "signature": sign(&key, "0"), "chainId": 1337 }),
            )
            .await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "Fee payment not found");
        assert!(stack.upstream.lock().session_forms.is_empty());

        stack.stop().await;
    }

    #[tokio::test]
    async fn test_provider_failure_is_opaque_500() {
        let stack = LiveStack::start().await;
        let (key, account) = wallet();
        stack.pay_fee(account, 7);
        stack.upstream.lock().failing = true;

        let (status, body) = stack
            .post(
                "/verify",
                json!({ "account": account, "signature": sign(&key, "7"), "chainId": "0x539" }),
            )
            .await;
        assert_eq!(status, 500);
        assert_eq!(body, json!({ "error": "Internal Server Error" }));

        stack.stop().await;
    }
}
