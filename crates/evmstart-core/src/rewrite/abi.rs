//! Contract ABI modules consumed by the frontend

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Forge build output directory inside the contracts workspace
pub const BUILD_OUT_DIR: &str = "out";

/// Forge build output for `contract_name` when it lives in `<contract_name>.sol`
pub fn build_artifact_path(contracts_root: &Path, contract_name: &str) -> PathBuf {
    contracts_root
        .join(BUILD_OUT_DIR)
        .join(format!("{}.sol", contract_name))
        .join(format!("{}.json", contract_name))
}

/// The frontend module holding `contract_name`'s ABI
pub fn abi_module_path(frontend_root: &Path, contract_name: &str) -> PathBuf {
    frontend_root
        .join("src")
        .join("abi")
        .join(format!("{}.ts", contract_name))
}

/// Locate `contract_name`'s build output.
///
/// Forge groups output by source file (`out/<file>.sol/<Contract>.json`), so
/// when the contract does not share its file's name every source directory
/// is searched, in name order.
pub fn find_build_artifact(contracts_root: &Path, contract_name: &str) -> Option<PathBuf> {
    let conventional = build_artifact_path(contracts_root, contract_name);
    if conventional.is_file() {
        return Some(conventional);
    }

    let file_name = format!("{}.json", contract_name);
    WalkDir::new(contracts_root.join(BUILD_OUT_DIR))
        .min_depth(2)
        .max_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .find(|entry| entry.file_type().is_file() && entry.file_name() == file_name.as_str())
        .map(walkdir::DirEntry::into_path)
}

/// Read the `abi` array from forge's build output.
///
/// `Ok(None)` when the contract has not been built or the output has no ABI.
pub fn read_contract_abi(contracts_root: &Path, contract_name: &str) -> Result<Option<Value>> {
    let Some(path) = find_build_artifact(contracts_root, contract_name) else {
        debug!(contract = contract_name, "No build output");
        return Ok(None);
    };

    let contents = fs::read_to_string(&path)?;
    let mut artifact: Value =
        serde_json::from_str(&contents).map_err(|source| Error::ArtifactParse {
            path: path.clone(),
            source,
        })?;

    Ok(artifact
        .get_mut("abi")
        .map(Value::take)
        .filter(Value::is_array))
}

/// Overwrite the frontend ABI module for `contract_name`
pub fn write_abi_module(frontend_root: &Path, contract_name: &str, abi: &Value) -> Result<PathBuf> {
    let path = abi_module_path(frontend_root, contract_name);
    let rendered = serde_json::to_string_pretty(abi)
        .map_err(|err| Error::Other(format!("Failed to render ABI: {}", err)))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, format!("export const contractAbi = {} as const\n", rendered))?;

    info!(contract = contract_name, path = %path.display(), "Updated contract ABI");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn increment_abi() -> Value {
        json!([{
            "type": "function",
            "name": "increment",
            "inputs": [],
            "outputs": [],
            "stateMutability": "nonpayable"
        }])
    }

    #[test]
    fn test_read_abi_from_build_output() {
        let dir = TempDir::new().unwrap();
        let path = build_artifact_path(dir.path(), "Counter");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(
            &path,
            json!({ "abi": increment_abi(), "bytecode": { "object": "0x00" } }).to_string(),
        )
        .unwrap();

        let abi = read_contract_abi(dir.path(), "Counter").unwrap();
        assert_eq!(abi, Some(increment_abi()));
    }

    #[test]
    fn test_read_abi_from_differently_named_source() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out/my_dapp.sol");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("My_dapp.json"), json!({ "abi": increment_abi() }).to_string()).unwrap();
        fs::create_dir_all(dir.path().join("out/build-info")).unwrap();
        fs::write(dir.path().join("out/build-info/abc123.json"), "{}").unwrap();

        assert_eq!(
            find_build_artifact(dir.path(), "My_dapp"),
            Some(out.join("My_dapp.json"))
        );
        assert_eq!(read_contract_abi(dir.path(), "My_dapp").unwrap(), Some(increment_abi()));
        assert_eq!(read_contract_abi(dir.path(), "Counter").unwrap(), None);
    }

    #[test]
    fn test_read_abi_missing_build() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_contract_abi(dir.path(), "Counter").unwrap(), None);
    }

    #[test]
    fn test_read_abi_without_abi_field() {
        let dir = TempDir::new().unwrap();
        let path = build_artifact_path(dir.path(), "Counter");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "bytecode": {} }"#).unwrap();
        assert_eq!(read_contract_abi(dir.path(), "Counter").unwrap(), None);
    }

    #[test]
    fn test_read_abi_malformed() {
        let dir = TempDir::new().unwrap();
        let path = build_artifact_path(dir.path(), "Counter");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{").unwrap();
        let err = read_contract_abi(dir.path(), "Counter").unwrap_err();
        assert!(matches!(err, Error::ArtifactParse { .. }));
    }

    #[test]
    fn test_write_abi_module_overwrites() {
        let dir = TempDir::new().unwrap();
        let module = abi_module_path(dir.path(), "Counter");
        fs::create_dir_all(module.parent().unwrap()).unwrap();
        fs::write(&module, "export const contractAbi = [] as const\n").unwrap();

        let written = write_abi_module(dir.path(), "Counter", &increment_abi()).unwrap();
        assert_eq!(written, module);

        let text = fs::read_to_string(&module).unwrap();
        assert!(text.starts_with("export const contractAbi = [\n  {\n"));
        assert!(text.contains("\"name\": \"increment\""));
        assert!(text.ends_with("] as const\n"));
    }
}
