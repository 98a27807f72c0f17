//! # Service Container
//!
//! Builds every adapter and service from a validated [`ServerConfig`].
//!
//! ## Initialization Order
//!
//! ```text
//! Phase 1: Signing keys (one per chain, parsed once)
//! Phase 2: Outbound adapters (store, identity provider, fee ledger)
//! Phase 3: Verification services (reconciler, attestor, redaction)
//! Phase 4: Gateway state (services + public chain table)
//! ```

use crate::adapters::{JsonRpcFeeLedger, LedgerEndpoint, StripeIdentityProvider};
use crate::container::config::{ServerConfig, StorageBackend};
use pp_01_signing_engine::{SignatureError, SignerKeyring, SigningEngine};
use pp_02_verification::{
    DisclosureAttestor, FeeLedger, IdentityProvider, InMemoryVerificationStore,
    RedactionCoordinator, SessionReconciler, VerificationPorts, VerificationStore,
};
use pp_03_api_gateway::{ApiGatewayService, AppState, GatewayError};
use shared_types::{SystemTimeSource, TimeSource};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Startup failures.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("signer key: {0}")]
    Signer(#[from] SignatureError),

    #[error("storage: {0}")]
    Storage(String),

    #[error("adapter: {0}")]
    Adapter(String),

    #[error("gateway: {0}")]
    Gateway(#[from] GatewayError),
}

/// Outbound adapters the services run on.
#[derive(Clone)]
pub struct ServicePorts {
    pub store: Arc<dyn VerificationStore>,
    pub provider: Arc<dyn IdentityProvider>,
    pub ledger: Arc<dyn FeeLedger>,
    pub clock: Arc<dyn TimeSource>,
}

/// Wired application.
pub struct ServiceContainer {
    /// Server configuration (immutable after initialization).
    pub config: ServerConfig,
    pub reconciler: Arc<SessionReconciler>,
    pub attestor: Arc<DisclosureAttestor>,
    pub redaction: Arc<RedactionCoordinator>,
}

impl ServiceContainer {
    /// Build with the production adapters the configuration names.
    #[instrument(name = "container_init", skip(config))]
    pub fn new(config: ServerConfig) -> Result<Self, ContainerError> {
        info!("Initializing verification server container");

        let clock: Arc<dyn TimeSource> = Arc::new(SystemTimeSource);
        let store = open_store(&config, clock.clone())?;

        let provider = StripeIdentityProvider::new(&config.provider)
            .map_err(|e| ContainerError::Adapter(e.to_string()))?;

        let endpoints: HashMap<_, _> = config
            .chains
            .iter()
            .filter_map(|(id, chain)| {
                chain.verification_contract.map(|contract| {
                    (
                        *id,
                        LedgerEndpoint {
                            rpc_url: chain.rpc.clone(),
                            contract,
                        },
                    )
                })
            })
            .collect();
        let ledger = JsonRpcFeeLedger::new(endpoints, config.provider.timeout)
            .map_err(|e| ContainerError::Adapter(e.to_string()))?;

        Self::with_ports(
            config,
            ServicePorts {
                store,
                provider: Arc::new(provider),
                ledger: Arc::new(ledger),
                clock,
            },
        )
    }

    /// Build on caller-supplied adapters.
    pub fn with_ports(config: ServerConfig, ports: ServicePorts) -> Result<Self, ContainerError> {
        // =====================================================================
        // PHASE 1: Signing keys
        // =====================================================================
        let mut keyring = SignerKeyring::new();
        for (chain, entry) in &config.chains {
            match &entry.signer_key {
                Some(key) => {
                    let signer = keyring.insert_hex(*chain, key.expose())?;
                    info!(chain = %chain, name = %entry.name, signer = %signer, "Loaded signer key");
                }
                None => warn!(chain = %chain, "No signer key; attestations will fail"),
            }
        }

        // =====================================================================
        // PHASE 2-3: Services
        // =====================================================================
        let ports = VerificationPorts {
            store: ports.store,
            provider: ports.provider,
            ledger: ports.ledger,
            signer: Arc::new(SigningEngine::new(keyring)),
            clock: ports.clock,
        };

        let reconciler = Arc::new(SessionReconciler::with_default_cooldown(
            ports.clone(),
            config.verification.clone(),
        ));
        let attestor = Arc::new(DisclosureAttestor::new(ports.clone()));
        let redaction = Arc::new(RedactionCoordinator::new(ports));

        info!(
            chains = config.chains.len(),
            max_verifications = config.verification.max_verifications,
            "Verification services initialized"
        );

        Ok(Self {
            config,
            reconciler,
            attestor,
            redaction,
        })
    }

    // =========================================================================
    // PHASE 4: Gateway
    // =========================================================================

    /// Handler state for the HTTP router.
    pub fn app_state(&self) -> AppState {
        AppState {
            reconciler: self.reconciler.clone(),
            disclosure: self.attestor.clone(),
            redaction: self.redaction.clone(),
            chains: Arc::new(self.config.chain_registry()),
        }
    }

    /// HTTP server over the wired services.
    pub fn gateway(&self) -> Result<ApiGatewayService, ContainerError> {
        Ok(ApiGatewayService::new(
            self.config.gateway(),
            self.app_state(),
        )?)
    }
}

fn open_store(
    config: &ServerConfig,
    clock: Arc<dyn TimeSource>,
) -> Result<Arc<dyn VerificationStore>, ContainerError> {
    match config.storage.backend {
        StorageBackend::Memory => {
            warn!("Using in-memory record store; records are lost on restart");
            Ok(Arc::new(InMemoryVerificationStore::with_clock(clock)))
        }
        #[cfg(feature = "rocksdb")]
        StorageBackend::Rocksdb => {
            let store = crate::adapters::storage::RocksDbVerificationStore::open_with_clock(
                &config.storage.path,
                clock,
            )
            .map_err(|e| ContainerError::Storage(e.to_string()))?;
            info!(path = %config.storage.path.display(), "Opened RocksDB record store");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "rocksdb"))]
        StorageBackend::Rocksdb => Err(ContainerError::Storage(
            "rocksdb backend requested but the `rocksdb` feature is not enabled".into(),
        )),
    }
}
