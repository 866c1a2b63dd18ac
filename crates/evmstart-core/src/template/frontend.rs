//! Which contract the frontend template talks to
//!
//! The frontend reads its contract through `src/contract.ts`: the name it
//! looks up in `CONTRACT_ADDRESSES` and the ABI module it imports. The
//! template ships pointing at `Counter`.

use std::fs;
use std::path::Path;

use regex::Regex;
use tracing::{debug, info};

use super::files::write_file;
use crate::artifact::{AddressTable, ChainId};
use crate::error::{Error, Result};
use crate::rewrite::abi::abi_module_path;
use crate::rewrite::{RewriteOutcome, Substitution, rewrite};

/// Frontend config file holding the address table, relative to the frontend root
pub const WAGMI_CONFIG: &str = "src/wagmi.ts";
/// Module naming the frontend's contract, relative to the frontend root
pub const CONTRACT_MODULE: &str = "src/contract.ts";
/// Contract the frontend template is wired to as shipped
pub const TEMPLATE_CONTRACT: &str = "Counter";

const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

const CONTRACT_NAME_DECL: &str = r#"export const CONTRACT_NAME = ['"]([A-Za-z_$][\w$]*)['"]"#;

pub fn render_contract_module(contract_name: &str) -> String {
    format!(
        "// Generated by evmstart; the contract the frontend talks to.\n\
         export const CONTRACT_NAME = '{name}'\n\
         export {{ contractAbi }} from './abi/{name}'\n",
        name = contract_name
    )
}

/// The contract named in the frontend's contract module, if it has one
pub fn read_contract_name(frontend_root: &Path) -> Result<Option<String>> {
    let path = frontend_root.join(CONTRACT_MODULE);
    if !path.is_file() {
        return Ok(None);
    }
    let source = fs::read_to_string(&path)?;
    Ok(Regex::new(CONTRACT_NAME_DECL)?
        .captures(&source)
        .and_then(|caps| caps.get(1))
        .map(|name| name.as_str().to_string()))
}

/// Point a freshly copied frontend at `contract_name`.
///
/// Renames the template's ABI module, rewrites the contract module and
/// re-keys the placeholder address table, so the frontend builds and shows
/// "not deployed" until real addresses are synced in.
pub fn retarget_frontend(frontend_root: &Path, contract_name: &str) -> Result<()> {
    if contract_name == TEMPLATE_CONTRACT {
        return Ok(());
    }

    let from = abi_module_path(frontend_root, TEMPLATE_CONTRACT);
    let to = abi_module_path(frontend_root, contract_name);
    if from.is_file() && !to.exists() {
        fs::rename(&from, &to).map_err(|source| Error::Copy {
            path: to.clone(),
            source,
        })?;
    }

    write_file(
        &frontend_root.join(CONTRACT_MODULE),
        &render_contract_module(contract_name),
    )?;

    let config = frontend_root.join(WAGMI_CONFIG);
    if config.is_file() {
        let mut placeholders = AddressTable::new();
        for chain in [ChainId::ANVIL, ChainId::INJECTIVE_TESTNET, ChainId::INJECTIVE_MAINNET] {
            placeholders.insert(chain, contract_name, ZERO_ADDRESS);
        }
        if rewrite(&config, &Substitution::Table(placeholders))? == RewriteOutcome::PatternNotFound {
            debug!(path = %config.display(), "No address block to re-key");
        }
    }

    info!(contract = contract_name, "Frontend wired to contract");
    Ok(())
}
