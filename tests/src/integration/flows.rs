//! # End-to-End Verification Flows
//!
//! Drives the HTTP API through the full service container (config, keyring,
//! services, router) with the mock identity provider and fee ledger.
//!
//! ## Flows Tested
//!
//! 1. **Verify → complete → status**: attestation recovers to the chain signer
//! 2. **Selective disclosure**: age and country facts with their signatures
//! 3. **Redaction**: provider and local redaction, then disclosure is refused
//! 4. **Re-verification**: a finished fee payment cannot open a new session

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use chrono::NaiveDate;
    use k256::ecdsa::SigningKey;
    use pp_01_signing_engine::domain::payloads::{age_digest, country_digest, verification_digest};
    use pp_01_signing_engine::{
        address_from_pubkey, recover_personal_signer, sign_personal_message, AgeThreshold,
        EcdsaSignature, SignerKeyring,
    };
    use pp_02_verification::adapters::mock::MOCK_FLOW_BASE;
    use pp_02_verification::domain::report::{country_and_doc_number_hash, expiration_timestamp};
    use pp_02_verification::{
        InMemoryVerificationStore, MockFeeLedger, MockIdentityProvider, ProviderDate,
        ReportDocument, FETCH_PERSONAL_DATA_MESSAGE, REDACT_PERSONAL_DATA_MESSAGE,
    };
    use pp_03_api_gateway::build_router;
    use serde_json::{json, Value};
    use shared_types::{Address, ChainId, Hash, ManualTimeSource};
    use std::sync::Arc;
    use tower::ServiceExt;
    use verification_server::container::{ServerConfig, ServiceContainer, ServicePorts};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const CHAIN: ChainId = ChainId(1);
    const SIGNER_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
    const FEE_BLOCK: u64 = 19_000_000;

    /// 2026-10-18T00:00:00Z
    const NOW_MILLIS: u64 = 1_792_281_600_000;

    const CONFIG: &str = r#"{
        "provider": { "secret_key": "sk_test", "restricted_key": "rk_test" },
        "verification": { "max_verifications": 10, "poll_cooldown_ms": 2000 },
        "chains": {
            "1": {
                "name": "mainnet",
                "rpc": "http://127.0.0.1:8545",
                "verification_contract": "0x1111111111111111111111111111111111111111"
            }
        }
    }"#;

    struct Stack {
        router: Router,
        provider: Arc<MockIdentityProvider>,
        ledger: Arc<MockFeeLedger>,
        clock: Arc<ManualTimeSource>,
        signer: Address,
    }

    fn stack() -> Stack {
        let mut config = ServerConfig::from_json(CONFIG).unwrap();
        config
            .apply_env([("PP_SIGNER_KEY_1".to_string(), SIGNER_KEY.to_string())])
            .unwrap();
        config.validate().unwrap();

        let clock = Arc::new(ManualTimeSource::new(NOW_MILLIS));
        let provider = Arc::new(MockIdentityProvider::new());
        let ledger = Arc::new(MockFeeLedger::new());
        let ports = ServicePorts {
            store: Arc::new(InMemoryVerificationStore::with_clock(clock.clone())),
            provider: provider.clone(),
            ledger: ledger.clone(),
            clock: clock.clone(),
        };

        let container = ServiceContainer::with_ports(config, ports).unwrap();
        let router = build_router(container.app_state(), &container.config.gateway());
        let signer = SignerKeyring::new().insert_hex(CHAIN, SIGNER_KEY).unwrap();

        Stack {
            router,
            provider,
            ledger,
            clock,
            signer,
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

    fn passport() -> ReportDocument {
        ReportDocument {
            issuing_country: "US".into(),
            number: "X1234567".into(),
            expiration_date: ProviderDate { year: 2031, month: 6, day: 15 },
            dob: ProviderDate { year: 1990, month: 5, day: 17 },
        }
    }

    async fn post(router: &Router, path: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::REFERER, "https://app.example/verified")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn recover(digest: &Hash, signature: &Value) -> Address {
        let signature: EcdsaSignature = signature.as_str().unwrap().parse().unwrap();
        recover_personal_signer(digest, &signature).unwrap()
    }

    /// Run the flow up to a verified record; returns the user's wallet.
    async fn verified_account(stack: &Stack) -> (SigningKey, Address) {
        let (key, account) = wallet();
        stack.ledger.set_fee_paid(CHAIN, account, FEE_BLOCK);

        let (status, body) = post(
            &stack.router,
            "/verify",
            json!({
                "account": account,
                "signature": sign(&key, &FEE_BLOCK.to_string()),
                "chainId": "0x1",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert!(body["redirect"].as_str().unwrap().starts_with(MOCK_FLOW_BASE));

        let session_id = stack.provider.session_ids().pop().unwrap();
        stack.provider.complete_session(&session_id, passport());
        (key, account)
    }

    // =============================================================================
    // FLOW 1: VERIFY → COMPLETE → STATUS
    // =============================================================================

    #[tokio::test]
    async fn test_verification_lifecycle_yields_recoverable_attestation() {
        let stack = stack();
        let (key, account) = wallet();
        stack.ledger.set_fee_paid(CHAIN, account, FEE_BLOCK);

        let (status, body) = post(
            &stack.router,
            "/verify",
            json!({
                "account": account,
                "signature": sign(&key, &FEE_BLOCK.to_string()),
                "chainId": 1,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);

        let session_id = stack.provider.session_ids().pop().unwrap();
        let created = stack.provider.created_with(&session_id).unwrap();
        assert_eq!(created.account, account);
        assert_eq!(created.return_url.as_deref(), Some("https://app.example/verified"));

        // Session opened, user has not submitted yet
        let (_, body) = post(
            &stack.router,
            "/account-status",
            json!({ "account": account, "chainId": "0x1" }),
        )
        .await;
        assert_eq!(body["exists"], true);
        assert_eq!(body["status"], "requires_input");
        assert_eq!(body["signature"], Value::Null);
        assert_eq!(body["feePaidBlock"], FEE_BLOCK);
        assert_eq!(body["feePaidChain"], "0x1");

        stack.provider.complete_session(&session_id, passport());
        stack.clock.advance(2_000);

        let (status, body) = post(
            &stack.router,
            "/account-status",
            json!({ "account": account, "chainId": "0x1" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "verified");
        assert_eq!(body["redacted"], false);

        let expiration =
            expiration_timestamp(NaiveDate::from_ymd_opt(2031, 6, 15).unwrap()).unwrap();
        let hash = country_and_doc_number_hash("US", "X1234567", expiration);
        assert_eq!(body["expiration"], expiration);
        assert_eq!(
            body["countryAndDocNumberHash"],
            format!("0x{}", hex::encode(hash))
        );

        let digest = verification_digest(account, expiration, hash);
        assert_eq!(recover(&digest, &body["signature"]), stack.signer);

        // Terminal records are served without another provider round trip
        stack.clock.advance(2_000);
        let calls = stack.provider.retrieve_calls();
        let (_, body) = post(
            &stack.router,
            "/check-verification-status",
            json!({ "account": account, "feePaidBlock": FEE_BLOCK, "chainId": "0x1" }),
        )
        .await;
        assert_eq!(body["status"], "verified");
        assert_eq!(body["feePaidBlock"], FEE_BLOCK);
        assert_eq!(stack.provider.retrieve_calls(), calls);

        let (status, body) = post(
            &stack.router,
            "/get-account-details",
            json!({ "account": account, "chainId": "0x1" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "verified");
        assert_eq!(body["feePaidBlock"], FEE_BLOCK);
        assert_eq!(recover(&digest, &body["signature"]), stack.signer);
    }

    // =============================================================================
    // FLOW 2: SELECTIVE DISCLOSURE
    // =============================================================================

    #[tokio::test]
    async fn test_disclosure_signs_age_and_country_facts() {
        let stack = stack();
        let (key, account) = verified_account(&stack).await;

        // Nothing stored yet: disclosure needs the reconciled record
        let (status, _) = post(
            &stack.router,
            "/fetch-personal-data",
            json!({ "signature": sign(&key, FETCH_PERSONAL_DATA_MESSAGE), "chainId": "0x1" }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        post(
            &stack.router,
            "/account-status",
            json!({ "account": account, "chainId": "0x1" }),
        )
        .await;

        let (status, body) = post(
            &stack.router,
            "/fetch-personal-data",
            json!({ "signature": sign(&key, FETCH_PERSONAL_DATA_MESSAGE), "chainId": "0x1" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        assert_eq!(body["over18"], true);
        assert_eq!(body["over21"], true);
        assert_eq!(body["countryCodeInt"], ((b'U' as u32) << 16) + b'S' as u32);

        assert_eq!(
            recover(&age_digest(account, AgeThreshold::Over18, true), &body["over18Signature"]),
            stack.signer
        );
        assert_eq!(
            recover(&age_digest(account, AgeThreshold::Over21, true), &body["over21Signature"]),
            stack.signer
        );
        assert_eq!(
            recover(
                &country_digest(account, body["countryCodeInt"].as_u64().unwrap() as u32),
                &body["countrySignature"]
            ),
            stack.signer
        );
    }

    // =============================================================================
    // FLOW 3: REDACTION
    // =============================================================================

    #[tokio::test]
    async fn test_redaction_hides_personal_data() {
        let stack = stack();
        let (key, account) = verified_account(&stack).await;
        post(
            &stack.router,
            "/account-status",
            json!({ "account": account, "chainId": "0x1" }),
        )
        .await;

        let (_, body) = post(
            &stack.router,
            "/has-redacted",
            json!({ "account": account, "chainId": "0x1" }),
        )
        .await;
        assert_eq!(body, json!({ "redacted": false }));

        // Signed for the wrong message: recovers to a stranger with no records
        let (status, _) = post(
            &stack.router,
            "/redact-personal-data",
            json!({ "signature": sign(&key, FETCH_PERSONAL_DATA_MESSAGE), "chainId": "0x1" }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = post(
            &stack.router,
            "/redact-personal-data",
            json!({ "signature": sign(&key, REDACT_PERSONAL_DATA_MESSAGE), "chainId": "0x1" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "ok": true }));
        assert_eq!(stack.provider.redacted_sessions().len(), 1);

        let (_, body) = post(
            &stack.router,
            "/has-redacted",
            json!({ "account": account, "chainId": "0x1" }),
        )
        .await;
        assert_eq!(body, json!({ "redacted": true }));

        let (status, _) = post(
            &stack.router,
            "/fetch-personal-data",
            json!({ "signature": sign(&key, FETCH_PERSONAL_DATA_MESSAGE), "chainId": "0x1" }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        stack.clock.advance(2_000);
        let (_, body) = post(
            &stack.router,
            "/account-status",
            json!({ "account": account, "chainId": "0x1" }),
        )
        .await;
        assert_eq!(body["redacted"], true);
        assert_eq!(body["status"], "verified");
    }

    #[tokio::test]
    async fn test_failed_provider_redaction_is_retryable() {
        let stack = stack();
        let (key, account) = verified_account(&stack).await;
        post(
            &stack.router,
            "/account-status",
            json!({ "account": account, "chainId": "0x1" }),
        )
        .await;

        let session_id = stack.provider.session_ids().pop().unwrap();
        stack.provider.fail_redaction_for(&session_id);

        let (status, body) = post(
            &stack.router,
            "/redact-personal-data",
            json!({ "signature": sign(&key, REDACT_PERSONAL_DATA_MESSAGE), "chainId": "0x1" }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Unable to redact verification data from provider");

        let (_, body) = post(
            &stack.router,
            "/has-redacted",
            json!({ "account": account, "chainId": "0x1" }),
        )
        .await;
        assert_eq!(body["redacted"], false);
    }

    // =============================================================================
    // FLOW 4: RE-VERIFICATION
    // =============================================================================

    #[tokio::test]
    async fn test_finished_fee_payment_cannot_reopen() {
        let stack = stack();
        let (key, account) = verified_account(&stack).await;
        post(
            &stack.router,
            "/account-status",
            json!({ "account": account, "chainId": "0x1" }),
        )
        .await;

        let (status, body) = post(
            &stack.router,
            "/verify",
            json!({
                "account": account,
                "signature": sign(&key, &FEE_BLOCK.to_string()),
                "chainId": "0x1",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Verification already completed");
        assert_eq!(stack.provider.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_unsubmitted_session_is_resumed() {
        let stack = stack();
        let (key, account) = wallet();
        stack.ledger.set_fee_paid(CHAIN, account, FEE_BLOCK);
        let body = json!({
            "account": account,
            "signature": sign(&key, &FEE_BLOCK.to_string()),
            "chainId": "0x1",
        });

        let (_, first) = post(&stack.router, "/verify", body.clone()).await;
        let (status, second) = post(&stack.router, "/verify", body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["redirect"], second["redirect"]);
        assert_eq!(stack.provider.create_calls(), 1);
    }

    #[tokio::test]
    async fn test_signature_for_another_block_rejected() {
        let stack = stack();
        let (key, account) = wallet();
        stack.ledger.set_fee_paid(CHAIN, account, FEE_BLOCK);

        let (status, body) = post(
            &stack.router,
            "/verify",
            json!({
                "account": account,
                "signature": sign(&key, &(FEE_BLOCK - 1).to_string()),
                "chainId": "0x1",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid signature provided");
        assert_eq!(stack.provider.create_calls(), 0);
    }
}
