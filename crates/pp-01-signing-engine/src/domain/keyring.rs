//! # Signer Keyring
//!
//! Per-chain private keys, loaded once at startup and read-only afterwards.

use super::ecdsa::address_from_pubkey;
use super::errors::SignatureError;
use k256::ecdsa::SigningKey;
use shared_types::{Address, ChainId};
use std::collections::HashMap;
use std::fmt;
use zeroize::Zeroize;

/// Chain id to signing key map.
#[derive(Clone, Default)]
pub struct SignerKeyring {
    keys: HashMap<ChainId, SigningKey>,
}

impl SignerKeyring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key for a chain, replacing any previous one.
    pub fn insert(&mut self, chain: ChainId, key: SigningKey) {
        self.keys.insert(chain, key);
    }

    /// Parse a hex private key (with or without `0x`) and register it.
    pub fn insert_hex(&mut self, chain: ChainId, private_key: &str) -> Result<Address, SignatureError> {
        let raw = private_key.trim();
        let raw = raw.strip_prefix("0x").unwrap_or(raw);
        let mut bytes = hex::decode(raw).map_err(|e| SignatureError::InvalidKey {
            chain,
            reason: e.to_string(),
        })?;
        let parsed = SigningKey::from_slice(&bytes);
        bytes.zeroize();

        let key = parsed.map_err(|_| SignatureError::InvalidKey {
            chain,
            reason: "not a valid secp256k1 scalar".to_string(),
        })?;
        let address = address_from_pubkey(key.verifying_key());
        self.keys.insert(chain, key);
        Ok(address)
    }

    /// Key for `chain`, or `MissingKey`.
    pub fn key_for(&self, chain: ChainId) -> Result<&SigningKey, SignatureError> {
        self.keys.get(&chain).ok_or(SignatureError::MissingKey(chain))
    }

    /// Public signer address for `chain`, as the contract expects it.
    pub fn signer_address(&self, chain: ChainId) -> Result<Address, SignatureError> {
        self.key_for(chain)
            .map(|key| address_from_pubkey(key.verifying_key()))
    }

    pub fn chains(&self) -> impl Iterator<Item = &ChainId> {
        self.keys.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Debug for SignerKeyring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material
        let mut chains: Vec<_> = self.keys.keys().map(|c| c.0).collect();
        chains.sort_unstable();
        f.debug_struct("SignerKeyring").field("chains", &chains).finish()
    }
}
