//! # Server Configuration
//!
//! Unified configuration for the gateway, the verification services and the
//! production adapters.
//!
//! ## Load Order
//!
//! 1. Defaults
//! 2. JSON file (`--config`), every section optional
//! 3. Environment overrides (`PP_HTTP_PORT`, `PP_PROVIDER_SECRET`,
//!    `PP_PROVIDER_RESTRICTED`, `PP_MAX_VERIFICATIONS`,
//!    `PP_SIGNER_KEY_<chainId>`)
//! 4. [`ServerConfig::validate`]
//!
//! ## Security Requirements
//!
//! - Provider keys and signer keys never appear in `Debug` output
//! - Every served chain MUST have a signer key and a verification contract

use pp_02_verification::VerificationConfig;
use pp_03_api_gateway::domain::config::humantime_serde;
use pp_03_api_gateway::{ChainInfo, ChainRegistry, CorsConfig, GatewayConfig, HttpConfig};
use serde::{Deserialize, Serialize};
use shared_types::{Address, ChainId};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Prefix of the per-chain signer key variables.
pub const SIGNER_KEY_ENV_PREFIX: &str = "PP_SIGNER_KEY_";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {reason}")]
    Io { path: PathBuf, reason: String },

    #[error("malformed config: {0}")]
    Parse(String),

    #[error("invalid value for {var}: {reason}")]
    Env { var: String, reason: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// A credential that is never printed.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Complete server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub http: HttpConfig,
    pub cors: CorsConfig,
    pub verification: VerificationConfig,
    pub provider: ProviderConfig,
    pub storage: StorageConfig,
    /// Served chains, keyed by chain id (`"1"` or `"0x539"`).
    pub chains: BTreeMap<ChainId, ChainConfig>,
}

/// Identity provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API root, e.g. `https://api.stripe.com`.
    pub base_url: String,
    /// Key for session calls.
    pub secret_key: Secret,
    /// Restricted key allowed to read expanded report fields.
    pub restricted_key: Secret,
    /// Request timeout, shared with the JSON-RPC client.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.stripe.com".to_string(),
            secret_key: Secret::default(),
            restricted_key: Secret::default(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Record store backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Volatile; records are lost on restart.
    #[default]
    Memory,
    /// Persistent; requires the `rocksdb` feature.
    Rocksdb,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Database directory for the persistent backend.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            path: PathBuf::from("./data/verifications"),
        }
    }
}

/// One served chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub name: String,
    /// JSON-RPC endpoint.
    pub rpc: String,
    pub verification_contract: Option<Address>,
    pub fee_token: Option<Address>,
    /// Hex secp256k1 private key the chain's attestations are signed with.
    pub signer_key: Option<Secret>,
    /// Local development chain.
    pub dev: bool,
}

impl ServerConfig {
    /// Read a JSON config file. Missing sections take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `PP_*` overrides from `vars` (normally `std::env::vars()`).
    pub fn apply_env<I>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (var, value) in vars {
            match var.as_str() {
                "PP_HTTP_PORT" => {
                    self.http.port = value.parse().map_err(|_| ConfigError::Env {
                        var: var.clone(),
                        reason: "expected a port number".into(),
                    })?;
                }
                "PP_PROVIDER_SECRET" => self.provider.secret_key = Secret::new(value),
                "PP_PROVIDER_RESTRICTED" => self.provider.restricted_key = Secret::new(value),
                "PP_MAX_VERIFICATIONS" => {
                    self.verification.max_verifications =
                        value.parse().map_err(|_| ConfigError::Env {
                            var: var.clone(),
                            reason: "expected a non-negative integer".into(),
                        })?;
                }
                _ => {
                    if let Some(suffix) = var.strip_prefix(SIGNER_KEY_ENV_PREFIX) {
                        let chain: ChainId = suffix.parse().map_err(|_| ConfigError::Env {
                            var: var.clone(),
                            reason: "suffix is not a chain id".into(),
                        })?;
                        let entry = self.chains.get_mut(&chain).ok_or_else(|| ConfigError::Env {
                            var: var.clone(),
                            reason: format!("chain {} is not configured", chain),
                        })?;
                        entry.signer_key = Some(Secret::new(value));
                    }
                }
            }
        }
        Ok(())
    }

    /// Validate configuration for serving.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gateway()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.chains.is_empty() {
            return Err(ConfigError::Invalid("no chains configured".into()));
        }

        for (id, chain) in &self.chains {
            if chain.rpc.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("chain {}: rpc is required", id)));
            }
            if chain.verification_contract.is_none() {
                return Err(ConfigError::Invalid(format!(
                    "chain {}: verification_contract is required",
                    id
                )));
            }
            if chain.signer_key.as_ref().map_or(true, Secret::is_empty) {
                return Err(ConfigError::Invalid(format!(
                    "chain {}: signer key missing (set {}{})",
                    id, SIGNER_KEY_ENV_PREFIX, id
                )));
            }
        }

        if self.provider.secret_key.is_empty() || self.provider.restricted_key.is_empty() {
            return Err(ConfigError::Invalid(
                "provider secret_key and restricted_key are required".into(),
            ));
        }

        if self.provider.timeout.is_zero() {
            return Err(ConfigError::Invalid("provider.timeout cannot be 0".into()));
        }

        Ok(())
    }

    /// Gateway section.
    pub fn gateway(&self) -> GatewayConfig {
        GatewayConfig {
            http: self.http.clone(),
            cors: self.cors.clone(),
        }
    }

    /// Public chain table served by the gateway.
    pub fn chain_registry(&self) -> ChainRegistry {
        self.chains
            .iter()
            .map(|(id, chain)| {
                (
                    *id,
                    ChainInfo {
                        name: chain.name.clone(),
                        verification_contract: chain.verification_contract,
                        fee_token: chain.fee_token,
                        dev: chain.dev,
                    },
                )
            })
            .collect()
    }
}
