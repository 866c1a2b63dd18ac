//! Foundry deployment artifacts
//!
//! `forge script --broadcast` records each run under
//! `broadcast/<script file>/<chain id>/run-latest.json`. This module reads
//! those records to find where contracts were deployed.

pub mod table;

pub use table::{AddressTable, ChainId};

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};

pub const BROADCAST_DIR: &str = "broadcast";
pub const LATEST_RUN_FILE: &str = "run-latest.json";

/// One `run-latest.json` document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeploymentRecord {
    #[serde(default)]
    pub transactions: Vec<TransactionEntry>,
}

/// One broadcast transaction; unknown fields are ignored
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEntry {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub contract_name: Option<String>,
    #[serde(default)]
    pub contract_address: Option<String>,
}

impl DeploymentRecord {
    /// Parse a record from disk
    pub fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|source| Error::ArtifactParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Address of the first transaction in file order that names `contract`
    /// and carries an address
    pub fn first_address_of(&self, contract: &str) -> Option<&str> {
        self.transactions
            .iter()
            .filter(|tx| tx.contract_name.as_deref() == Some(contract))
            .find_map(|tx| tx.contract_address.as_deref())
    }

    /// Every named deployment, first occurrence of each name kept, in file order
    pub fn deployments(&self) -> Vec<(&str, &str)> {
        let mut seen: Vec<(&str, &str)> = Vec::new();
        for tx in &self.transactions {
            let (Some(name), Some(address)) =
                (tx.contract_name.as_deref(), tx.contract_address.as_deref())
            else {
                continue;
            };
            if !seen.iter().any(|(n, _)| *n == name) {
                seen.push((name, address));
            }
        }
        seen
    }
}

/// `0x` followed by exactly 40 hex digits
pub fn is_address(value: &str) -> bool {
    value
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Where a script's latest run on a chain is recorded
pub fn artifact_path(contracts_root: &Path, script_name: &str, chain_id: ChainId) -> PathBuf {
    contracts_root
        .join(BROADCAST_DIR)
        .join(script_name)
        .join(chain_id.to_string())
        .join(LATEST_RUN_FILE)
}

/// Look up where `contract_name` was deployed by `script_name` on `chain_id`.
///
/// A missing artifact is `Ok(None)`: no deployment is an expected state.
/// When the script created the same contract more than once, the first
/// creation wins.
pub fn find_deployed_address(
    contracts_root: &Path,
    script_name: &str,
    chain_id: ChainId,
    contract_name: &str,
) -> Result<Option<String>> {
    let path = artifact_path(contracts_root, script_name, chain_id);
    if !path.is_file() {
        debug!(path = %path.display(), "No deployment artifact");
        return Ok(None);
    }

    let record = DeploymentRecord::read(&path)?;
    Ok(record.first_address_of(contract_name).map(str::to_string))
}

/// Scan every script and chain directory under `broadcast/` and collect all
/// deployed addresses.
///
/// First match wins, as with [`find_deployed_address`]: scripts are visited
/// in name order and transactions in file order, and a (chain, contract) pair
/// already in the table is never overwritten. A contract deployed by two
/// scripts on one chain therefore resolves to the alphabetically first script.
///
/// Malformed artifacts and non-numeric chain directories are logged and
/// skipped so one bad run does not hide the others.
pub fn discover_addresses(contracts_root: &Path) -> Result<AddressTable> {
    let mut table = AddressTable::default();
    let broadcast = contracts_root.join(BROADCAST_DIR);

    if !broadcast.is_dir() {
        debug!(path = %broadcast.display(), "No broadcast directory");
        return Ok(table);
    }

    for script_dir in sorted_subdirs(&broadcast)? {
        for chain_dir in sorted_subdirs(&script_dir)? {
            let Some(chain_id) = chain_dir
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.parse::<ChainId>().ok())
            else {
                debug!(path = %chain_dir.display(), "Skipping non-chain directory");
                continue;
            };

            let latest = chain_dir.join(LATEST_RUN_FILE);
            if !latest.is_file() {
                continue;
            }

            let record = match DeploymentRecord::read(&latest) {
                Ok(record) => record,
                Err(err) => {
                    warn!(path = %latest.display(), error = %err, "Skipping unreadable artifact");
                    continue;
                }
            };

            for (contract, address) in record.deployments() {
                if !is_address(address) {
                    debug!(contract, address, "Ignoring malformed address");
                    continue;
                }
                if table.insert_if_absent(chain_id, contract, address) {
                    debug!(chain = %chain_id, contract, address, "Found deployment");
                }
            }
        }
    }

    Ok(table)
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}
