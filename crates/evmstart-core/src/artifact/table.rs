//! Contract address table keyed by chain id

use std::collections::BTreeMap;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// EVM chain id, parsed from a broadcast directory name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl ChainId {
    pub const ANVIL: ChainId = ChainId(31337);
    pub const INJECTIVE_TESTNET: ChainId = ChainId(1439);
    pub const INJECTIVE_MAINNET: ChainId = ChainId(1776);
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChainId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse().map(ChainId)
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        ChainId(id)
    }
}

/// Deployed addresses: chain id, then contract name, then address.
///
/// Chains iterate in numeric order, which is also the key order a
/// JavaScript engine uses for integer-like object keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressTable {
    chains: BTreeMap<ChainId, BTreeMap<String, String>>,
}

impl AddressTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an address unless this chain already has one for `contract`.
    /// Returns whether the entry was inserted.
    pub fn insert_if_absent(&mut self, chain: ChainId, contract: &str, address: &str) -> bool {
        let contracts = self.chains.entry(chain).or_default();
        if contracts.contains_key(contract) {
            return false;
        }
        contracts.insert(contract.to_string(), address.to_string());
        true
    }

    /// Record an address, replacing any previous one
    pub fn insert(&mut self, chain: ChainId, contract: &str, address: &str) {
        self.chains
            .entry(chain)
            .or_default()
            .insert(contract.to_string(), address.to_string());
    }

    pub fn get(&self, chain: ChainId, contract: &str) -> Option<&str> {
        self.chains
            .get(&chain)
            .and_then(|contracts| contracts.get(contract))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.chains.values().all(BTreeMap::is_empty)
    }

    pub fn chain_count(&self) -> usize {
        self.chains.values().filter(|c| !c.is_empty()).count()
    }

    pub fn chains(&self) -> impl Iterator<Item = ChainId> + '_ {
        self.chains
            .iter()
            .filter(|(_, contracts)| !contracts.is_empty())
            .map(|(chain, _)| *chain)
    }

    /// Flattened `(chain, contract, address)` entries in table order
    pub fn entries(&self) -> impl Iterator<Item = (ChainId, &str, &str)> + '_ {
        self.chains.iter().flat_map(|(chain, contracts)| {
            contracts
                .iter()
                .map(move |(name, address)| (*chain, name.as_str(), address.as_str()))
        })
    }

    /// Render as an object literal, two-space indented with quoted keys
    pub fn render_literal(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.chains)
            .map_err(|err| Error::Other(format!("Failed to render address table: {}", err)))
    }
}
