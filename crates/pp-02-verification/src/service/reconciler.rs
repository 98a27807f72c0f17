//! # Session Reconciler
//!
//! Opens and resumes provider sessions and pulls provider state into the
//! local record on status checks.
//!
//! ## Write Discipline
//!
//! Every status write is conditional on the status read at the start of the
//! request. A write that affects no rows re-reads the record: if another
//! request already moved it on, the stored record is returned as is and the
//! losing write is dropped. A write that affects no rows while the stored
//! status is unchanged fails with `Persistence`.
//!
//! ## Throttling
//!
//! `/account-status` and `/check-verification-status` keep separate
//! per-account cooldown windows, so polling one never throttles the other.

use super::VerificationPorts;
use crate::domain::config::VerificationConfig;
use crate::domain::cooldown::CooldownCache;
use crate::domain::errors::VerificationError;
use crate::domain::record::{RecordKey, StatusUpdate, VerificationRecord};
use crate::domain::transitions::{reconcile, session_action, SessionAction, Transition};
use crate::domain::views::{AccountDetails, AccountStatus, BlockStatus};
use crate::ports::inbound::{SessionReconcilerApi, SessionRequest};
use crate::ports::outbound::{CreateSessionParams, ProviderSession};
use async_trait::async_trait;
use shared_types::{Address, ChainId, VerificationStatus};
use tracing::{debug, error, info, warn};

const STORE_SESSION_FAILED: &str = "Internal error storing verification session";

/// Session Reconciler service.
pub struct SessionReconciler {
    ports: VerificationPorts,
    config: VerificationConfig,
    /// Gates provider polls from `poll_and_reconcile`.
    poll_cooldown: CooldownCache<Address>,
    /// Gates `check_verification_status`.
    check_cooldown: CooldownCache<Address>,
}

impl SessionReconciler {
    pub fn new(
        ports: VerificationPorts,
        config: VerificationConfig,
        poll_cooldown: CooldownCache<Address>,
        check_cooldown: CooldownCache<Address>,
    ) -> Self {
        Self {
            ports,
            config,
            poll_cooldown,
            check_cooldown,
        }
    }

    /// Reconciler with both cooldown caches built from `config`.
    pub fn with_default_cooldown(ports: VerificationPorts, config: VerificationConfig) -> Self {
        let poll = CooldownCache::new(config.poll_cooldown(), ports.clock.clone());
        let check = CooldownCache::new(config.poll_cooldown(), ports.clock.clone());
        Self::new(ports, config, poll, check)
    }

    async fn has_capacity(&self) -> Result<bool, VerificationError> {
        let count = self.ports.store.count().await?;
        Ok(count < self.config.max_verifications)
    }

    // =========================================================================
    // SESSION CREATION
    // =========================================================================

    async fn create_record(
        &self,
        key: RecordKey,
        return_url: Option<String>,
    ) -> Result<ProviderSession, VerificationError> {
        if !self.has_capacity().await? {
            warn!(
                max = self.config.max_verifications,
                "[pp-02] Verification limit reached"
            );
            return Err(VerificationError::CapacityExceeded);
        }

        let record = self.ports.store.insert(key).await?;
        info!(
            account = %key.account,
            block = key.fee_paid_block,
            chain = %key.chain_id,
            id = record.id,
            "[pp-02] Verification record created"
        );
        self.open_session(&record, return_url).await
    }

    async fn open_session(
        &self,
        record: &VerificationRecord,
        return_url: Option<String>,
    ) -> Result<ProviderSession, VerificationError> {
        let session = self
            .ports
            .provider
            .create_session(CreateSessionParams {
                account: record.account,
                return_url,
            })
            .await?;

        let rows = self
            .ports
            .store
            .attach_session(record.id, &session.id, Some(session.status))
            .await?;
        if rows != 1 {
            error!(id = record.id, session = %session.id, rows, "[pp-02] Session id not stored");
            return Err(VerificationError::Persistence(STORE_SESSION_FAILED.into()));
        }

        info!(id = record.id, session = %session.id, "[pp-02] Provider session opened");
        Ok(session)
    }

    async fn resume_session(
        &self,
        record: VerificationRecord,
        session_id: &str,
    ) -> Result<ProviderSession, VerificationError> {
        let session = self.ports.provider.retrieve_session(session_id).await?;
        if session.status != VerificationStatus::RequiresInput {
            // The user already submitted; status checks take it from here.
            return Err(VerificationError::AlreadyCompleted);
        }
        if record.status.is_none() {
            self.persist(
                record,
                StatusUpdate::status_only(session.status, session.last_verification_report.clone()),
            )
            .await?;
        }
        debug!(session = %session_id, "[pp-02] Provider session resumed");
        Ok(session)
    }

    // =========================================================================
    // RECONCILIATION
    // =========================================================================

    /// Pull the provider's view of `record` and persist any transition.
    async fn reconcile_record(
        &self,
        record: VerificationRecord,
    ) -> Result<VerificationRecord, VerificationError> {
        let Some(session_id) = record.session_id.clone() else {
            return Ok(record);
        };

        let session = self.ports.provider.retrieve_session(&session_id).await?;
        match reconcile(record.status, session.status) {
            Transition::Unchanged => Ok(record),
            Transition::Changed(status) => {
                let update = StatusUpdate::status_only(status, session.last_verification_report);
                self.persist(record, update).await
            }
            Transition::BecameVerified => {
                let report_id = session.last_verification_report.ok_or_else(|| {
                    VerificationError::Provider(format!(
                        "verified session {} has no report",
                        session_id
                    ))
                })?;
                let report = self.ports.provider.retrieve_report(&report_id).await?;
                let details = report.verified_details()?;
                self.persist(record, StatusUpdate::verified(report_id, details))
                    .await
            }
        }
    }

    /// Conditionally apply `update`, resolving a lost race by re-reading.
    async fn persist(
        &self,
        mut record: VerificationRecord,
        update: StatusUpdate,
    ) -> Result<VerificationRecord, VerificationError> {
        let rows = self
            .ports
            .store
            .update_status(record.id, record.status, &update)
            .await?;
        if rows == 1 {
            info!(
                id = record.id,
                from = ?record.status,
                to = %update.status,
                "[pp-02] Verification status updated"
            );
            record.apply(&update);
            return Ok(record);
        }

        match self.ports.store.get(record.id).await? {
            Some(current) if current.status != record.status => {
                debug!(
                    id = record.id,
                    wanted = %update.status,
                    found = ?current.status,
                    "[pp-02] Record moved on by a concurrent request"
                );
                Ok(current)
            }
            current => {
                error!(
                    id = record.id,
                    expected = ?record.status,
                    found = ?current.and_then(|r| r.status),
                    to = %update.status,
                    "[pp-02] Conditional status update lost"
                );
                Err(VerificationError::Persistence(STORE_SESSION_FAILED.into()))
            }
        }
    }
}

#[async_trait]
impl SessionReconcilerApi for SessionReconciler {
    async fn request_or_resume_session(
        &self,
        request: SessionRequest,
    ) -> Result<String, VerificationError> {
        let SessionRequest {
            account,
            signature,
            chain,
            return_url,
        } = request;

        let fee_paid_block = self.ports.ledger.fee_paid_for(chain, account).await?;
        let signer = self
            .ports
            .recover(&fee_paid_block.to_string(), &signature)?;
        if signer != account {
            debug!(%account, %signer, "[pp-02] Ownership proof mismatch");
            return Err(VerificationError::InvalidSignature);
        }
        if fee_paid_block == 0 {
            return Err(VerificationError::Validation("Fee payment not found".into()));
        }

        let key = RecordKey::new(account, fee_paid_block, chain);
        let existing = self.ports.store.find(&key).await?;
        let session = match session_action(existing)? {
            SessionAction::CreateRecord => self.create_record(key, return_url).await?,
            SessionAction::OpenSession(record) => self.open_session(&record, return_url).await?,
            SessionAction::Resume { record, session_id } => {
                self.resume_session(record, &session_id).await?
            }
        };

        session.url.ok_or_else(|| {
            VerificationError::Provider(format!("session {} has no redirect url", session.id))
        })
    }

    async fn poll_and_reconcile(
        &self,
        account: Address,
        chain: ChainId,
    ) -> Result<AccountStatus, VerificationError> {
        let allowed = self.has_capacity().await?;
        let Some(record) = self.ports.store.latest_for_account(account).await? else {
            return Ok(AccountStatus::absent(allowed));
        };

        let record = if record.is_terminal() || record.session_id.is_none() {
            record
        } else if self.poll_cooldown.allow(&account) {
            self.reconcile_record(record).await?
        } else {
            debug!(%account, "[pp-02] Poll throttled, serving stored status");
            record
        };

        let signature = self.ports.attest(&record, chain)?;
        Ok(AccountStatus::from_record(allowed, &record, signature))
    }

    async fn check_verification_status(
        &self,
        account: Address,
        fee_paid_block: u64,
        chain: ChainId,
    ) -> Result<BlockStatus, VerificationError> {
        if !self.check_cooldown.allow(&account) {
            return Err(VerificationError::RateLimited);
        }

        let key = RecordKey::new(account, fee_paid_block, chain);
        let Some(record) = self.ports.store.find(&key).await? else {
            return Ok(BlockStatus::default());
        };

        let record = if record.is_terminal() {
            record
        } else {
            self.reconcile_record(record).await?
        };

        let signature = self.ports.attest(&record, chain)?;
        Ok(BlockStatus::from_record(&record, signature))
    }

    async fn account_details(
        &self,
        account: Address,
        chain: ChainId,
    ) -> Result<AccountDetails, VerificationError> {
        let not_found = || VerificationError::NotFound("No verifications found".into());
        let record = self
            .ports
            .store
            .highest_block_for_account(account)
            .await?
            .filter(VerificationRecord::is_verified)
            .ok_or_else(not_found)?;

        let (expiration, hash) = record.attestation_inputs().ok_or_else(|| {
            VerificationError::DataIntegrity(format!(
                "verified record {} lacks attestation inputs",
                record.id
            ))
        })?;
        let signature = self
            .ports
            .signer
            .sign_verification(chain, account, expiration, hash)?;

        Ok(AccountDetails {
            fee_paid_block: record.fee_paid_block,
            expiration,
            country_and_doc_number_hash: hash,
            signature,
        })
    }

    async fn verification_allowed(&self) -> Result<bool, VerificationError> {
        self.has_capacity().await
    }
}
