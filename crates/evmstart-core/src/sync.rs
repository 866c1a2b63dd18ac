//! Contract sync for an existing project
//!
//! Run after `forge build` / `forge script --broadcast` to point the
//! frontend at whatever has been deployed since the project was created.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::artifact::{AddressTable, discover_addresses};
use crate::error::{Error, Result};
use crate::rewrite::{RewriteOutcome, Substitution, read_contract_abi, rewrite, write_abi_module};
use crate::template::{CONTRACTS_DIR, FRONTEND_DIR};

pub use crate::template::WAGMI_CONFIG;

#[derive(Debug, Clone)]
pub struct SyncReport {
    pub addresses: AddressTable,
    pub config: RewriteOutcome,
    /// ABI module rewritten, if build output was found
    pub abi_module: Option<PathBuf>,
}

/// Walk up from `start` to the first directory holding both workspaces
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CONTRACTS_DIR).is_dir() && dir.join(FRONTEND_DIR).is_dir())
        .map(Path::to_path_buf)
}

/// Rewrite the frontend address table from every recorded deployment and
/// refresh `contract_name`'s ABI module
pub fn sync_project(project_root: &Path, contract_name: &str) -> Result<SyncReport> {
    let contracts = project_root.join(CONTRACTS_DIR);
    let frontend = project_root.join(FRONTEND_DIR);
    if !contracts.is_dir() {
        return Err(Error::Other(format!(
            "No contracts workspace at {}",
            contracts.display()
        )));
    }

    let addresses = discover_addresses(&contracts)?;
    if addresses.is_empty() {
        warn!(path = %contracts.display(), "No deployments found");
    }
    for (chain, contract, address) in addresses.entries() {
        info!(chain = %chain, contract, address, "Deployment");
    }

    let config = rewrite(
        &frontend.join(WAGMI_CONFIG),
        &Substitution::Table(addresses.clone()),
    )?;
    if config == RewriteOutcome::PatternNotFound {
        warn!("No CONTRACT_ADDRESSES block found in {}", WAGMI_CONFIG);
    }

    let abi_module = match read_contract_abi(&contracts, contract_name)? {
        Some(abi) => Some(write_abi_module(&frontend, contract_name, &abi)?),
        None => {
            info!(contract = contract_name, "No build output, ABI left as is");
            None
        }
    };

    Ok(SyncReport {
        addresses,
        config,
        abi_module,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ChainId;
    use std::fs;
    use tempfile::TempDir;

    const ADDR: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("contracts")).unwrap();
        fs::create_dir_all(dir.path().join("frontend/src")).unwrap();
        fs::write(
            dir.path().join("frontend/src/wagmi.ts"),
            "// evmstart:addresses:begin\nexport const CONTRACT_ADDRESSES = {} as const\n// evmstart:addresses:end\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_sync_rewrites_addresses_and_abi() {
        let dir = project();
        let run = dir.path().join("contracts/broadcast/Counter.s.sol/31337");
        fs::create_dir_all(&run).unwrap();
        fs::write(
            run.join("run-latest.json"),
            format!(r#"{{"transactions":[{{"contractName":"Counter","contractAddress":"{ADDR}"}}]}}"#),
        )
        .unwrap();
        let out = dir.path().join("contracts/out/Counter.sol");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("Counter.json"), r#"{"abi":[{"type":"function","name":"number"}]}"#).unwrap();

        let report = sync_project(dir.path(), "Counter").unwrap();

        assert_eq!(report.config, RewriteOutcome::Rewritten);
        assert_eq!(report.addresses.get(ChainId::ANVIL, "Counter"), Some(ADDR));
        let wagmi = fs::read_to_string(dir.path().join("frontend/src/wagmi.ts")).unwrap();
        assert!(wagmi.contains(ADDR));
        assert!(wagmi.starts_with("// evmstart:addresses:begin\n"));

        let abi = report.abi_module.unwrap();
        assert!(abi.ends_with("src/abi/Counter.ts"));
        assert!(fs::read_to_string(abi).unwrap().contains("\"number\""));
    }

    #[test]
    fn test_sync_without_deployments_changes_nothing() {
        let dir = project();
        let before = fs::read_to_string(dir.path().join("frontend/src/wagmi.ts")).unwrap();

        let report = sync_project(dir.path(), "Counter").unwrap();

        assert_eq!(report.config, RewriteOutcome::Unchanged);
        assert!(report.abi_module.is_none());
        assert_eq!(
            fs::read_to_string(dir.path().join("frontend/src/wagmi.ts")).unwrap(),
            before
        );
    }

    #[test]
    fn test_sync_requires_contracts() {
        let dir = TempDir::new().unwrap();
        assert!(sync_project(dir.path(), "Counter").is_err());
    }

    #[test]
    fn test_find_project_root_from_nested_dir() {
        let dir = project();
        let nested = dir.path().join("contracts");
        assert_eq!(find_project_root(&nested).as_deref(), Some(dir.path()));
        assert!(find_project_root(&TempDir::new().unwrap().path().join("x")).is_none());
    }
}
