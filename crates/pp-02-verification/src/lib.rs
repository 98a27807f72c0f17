//! # Verification Subsystem (PP-02)
//!
//! Keeps local verification records in step with the identity provider's
//! asynchronous sessions, issues attestations once a session is verified,
//! derives selective-disclosure facts and redacts personal data on request.
//!
//! ## Architecture
//!
//! This subsystem follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): records, the pure transition function,
//!   the cooldown cache, age and country derivation
//! - **Ports Layer** (`ports/`): inbound service APIs, outbound store,
//!   provider and ledger traits
//! - **Service Layer** (`service/`): [`SessionReconciler`],
//!   [`DisclosureAttestor`], [`RedactionCoordinator`]
//! - **Adapters** (`adapters/`): in-memory store and provider/ledger mocks
//!
//! ## State Machine
//!
//! ```text
//! NONE ──create──→ REQUIRES_INPUT ⇄ PROCESSING ──→ VERIFIED
//!                        │               │
//!                        └───────────────┴───────→ CANCELED
//! ```
//!
//! `VERIFIED` and `CANCELED` are terminal. A new fee payment (new block)
//! starts a new record.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::memory::InMemoryVerificationStore;
pub use adapters::mock::{MockFeeLedger, MockIdentityProvider};
pub use domain::config::VerificationConfig;
pub use domain::cooldown::CooldownCache;
pub use domain::errors::VerificationError;
pub use domain::record::{RecordKey, StatusUpdate, VerificationRecord, VerifiedDetails};
pub use domain::report::{ProviderDate, ReportDocument, VerificationReport};
pub use domain::views::{AccountDetails, AccountStatus, BlockStatus, DisclosureFacts};
pub use ports::inbound::{
    DisclosureApi, RedactionApi, SessionReconcilerApi, SessionRequest, FETCH_PERSONAL_DATA_MESSAGE,
    REDACT_PERSONAL_DATA_MESSAGE,
};
pub use ports::outbound::{
    CreateSessionParams, FeeLedger, IdentityProvider, LedgerError, ProviderError, ProviderSession,
    StoreError, VerificationStore,
};
pub use service::{DisclosureAttestor, RedactionCoordinator, SessionReconciler, VerificationPorts};
