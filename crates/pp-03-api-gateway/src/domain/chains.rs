//! Chains the gateway will serve.

use serde::{Deserialize, Serialize};
use shared_types::{Address, ChainId};
use std::collections::BTreeMap;

/// Public details of a configured chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    pub name: String,
    /// Deployed verification contract, if known.
    pub verification_contract: Option<Address>,
    /// Fee token accepted by the verification contract.
    pub fee_token: Option<Address>,
    /// Local development chain; its contract addresses are served by
    /// `/dev-contracts`.
    #[serde(default)]
    pub dev: bool,
}

impl ChainInfo {
    /// Contract pair for `/dev-contracts`, only on a development chain with
    /// both contracts deployed.
    pub fn dev_contracts(&self) -> Option<(Address, Address)> {
        if !self.dev {
            return None;
        }
        Some((self.verification_contract?, self.fee_token?))
    }
}

/// Lookup table of supported chains.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    chains: BTreeMap<ChainId, ChainInfo>,
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, chain: ChainId, info: ChainInfo) {
        self.chains.insert(chain, info);
    }

    pub fn get(&self, chain: ChainId) -> Option<&ChainInfo> {
        self.chains.get(&chain)
    }

    pub fn contains(&self, chain: ChainId) -> bool {
        self.chains.contains_key(&chain)
    }

    pub fn ids(&self) -> impl Iterator<Item = ChainId> + '_ {
        self.chains.keys().copied()
    }
}

impl FromIterator<(ChainId, ChainInfo)> for ChainRegistry {
    fn from_iter<I: IntoIterator<Item = (ChainId, ChainInfo)>>(iter: I) -> Self {
        Self {
            chains: iter.into_iter().collect(),
        }
    }
}
