//! # Mock Collaborators
//!
//! Scriptable identity provider and fee ledger for tests and local runs.

use crate::domain::report::{ReportDocument, VerificationReport};
use crate::ports::outbound::{
    CreateSessionParams, FeeLedger, IdentityProvider, LedgerError, ProviderError,
    ProviderSession,
};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use shared_types::{Address, ChainId, VerificationStatus};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::debug;
use uuid::Uuid;

/// Base of the hosted-flow URLs the mock hands out.
pub const MOCK_FLOW_BASE: &str = "https://verify.mock.local/start";

// =============================================================================
// IDENTITY PROVIDER
// =============================================================================

/// In-memory identity provider with knobs for driving session state.
#[derive(Default)]
pub struct MockIdentityProvider {
    sessions: RwLock<HashMap<String, ProviderSession>>,
    reports: RwLock<HashMap<String, VerificationReport>>,
    /// Return url and account each session was opened with.
    created_with: RwLock<HashMap<String, CreateSessionParams>>,
    redacted: RwLock<Vec<String>>,
    failing_redactions: RwLock<HashSet<String>>,
    unavailable: AtomicBool,
    create_calls: AtomicUsize,
    retrieve_calls: AtomicUsize,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `session_id` verified with a report built from `document`.
    /// Returns the report id.
    pub fn complete_session(&self, session_id: &str, document: ReportDocument) -> String {
        let report_id = format!("vr_{}", Uuid::new_v4().simple());
        self.reports.write().insert(
            report_id.clone(),
            VerificationReport {
                id: report_id.clone(),
                document,
            },
        );
        if let Some(session) = self.sessions.write().get_mut(session_id) {
            session.status = VerificationStatus::Verified;
            session.url = None;
            session.last_verification_report = Some(report_id.clone());
        }
        report_id
    }

    /// Force a session's status.
    pub fn set_status(&self, session_id: &str, status: VerificationStatus) {
        if let Some(session) = self.sessions.write().get_mut(session_id) {
            session.status = status;
        }
    }

    /// Make `redact_session` fail for `session_id`.
    pub fn fail_redaction_for(&self, session_id: &str) {
        self.failing_redactions.write().insert(session_id.to_string());
    }

    /// Make every call fail with a transport error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Session ids redacted so far, in call order.
    pub fn redacted_sessions(&self) -> Vec<String> {
        self.redacted.read().clone()
    }

    pub fn session_ids(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }

    /// Parameters a session was created with.
    pub fn created_with(&self, session_id: &str) -> Option<CreateSessionParams> {
        self.created_with.read().get(session_id).cloned()
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn retrieve_calls(&self) -> usize {
        self.retrieve_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), ProviderError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ProviderError::Http("mock provider unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn create_session(
        &self,
        params: CreateSessionParams,
    ) -> Result<ProviderSession, ProviderError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let id = format!("vs_{}", Uuid::new_v4().simple());
        let session = ProviderSession {
            id: id.clone(),
            status: VerificationStatus::RequiresInput,
            url: Some(format!("{}/{}", MOCK_FLOW_BASE, id)),
            last_verification_report: None,
        };
        debug!(session = %id, account = %params.account, "[pp-02] Mock session created");
        self.sessions.write().insert(id.clone(), session.clone());
        self.created_with.write().insert(id, params);
        Ok(session)
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<ProviderSession, ProviderError> {
        self.retrieve_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.sessions
            .read()
            .get(session_id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(session_id.to_string()))
    }

    async fn retrieve_report(&self, report_id: &str) -> Result<VerificationReport, ProviderError> {
        self.check_available()?;
        self.reports
            .read()
            .get(report_id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(report_id.to_string()))
    }

    async fn redact_session(&self, session_id: &str) -> Result<(), ProviderError> {
        self.check_available()?;
        if self.failing_redactions.read().contains(session_id) {
            return Err(ProviderError::Api {
                status: 500,
                message: format!("cannot redact {}", session_id),
            });
        }
        if !self.sessions.read().contains_key(session_id) {
            return Err(ProviderError::NotFound(session_id.to_string()));
        }
        self.redacted.write().push(session_id.to_string());
        Ok(())
    }
}

// =============================================================================
// FEE LEDGER
// =============================================================================

/// Fee ledger answering from a table; unknown accounts have paid nothing.
#[derive(Default)]
pub struct MockFeeLedger {
    payments: DashMap<(ChainId, Address), u64>,
    unsupported: RwLock<HashSet<ChainId>>,
}

impl MockFeeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `account` paid the fee at `block` on `chain`.
    pub fn set_fee_paid(&self, chain: ChainId, account: Address, block: u64) {
        self.payments.insert((chain, account), block);
    }

    /// Make lookups on `chain` fail.
    pub fn set_unsupported(&self, chain: ChainId) {
        self.unsupported.write().insert(chain);
    }
}

#[async_trait]
impl FeeLedger for MockFeeLedger {
    async fn fee_paid_for(&self, chain: ChainId, account: Address) -> Result<u64, LedgerError> {
        if self.unsupported.read().contains(&chain) {
            return Err(LedgerError::UnsupportedChain(chain));
        }
        Ok(self
            .payments
            .get(&(chain, account))
            .map(|block| *block)
            .unwrap_or(0))
    }
}
