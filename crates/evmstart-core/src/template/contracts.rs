//! Generated contracts workspace
//!
//! Alternative to copying the contracts template: renders a minimal Foundry
//! workspace whose contract is named after the project.

use std::path::{Path, PathBuf};

use tracing::info;

use super::files::write_file;
use crate::error::Result;
use crate::project::ProjectName;

/// Deploy script file name used by the generated workspace
pub const GENERATED_DEPLOY_SCRIPT: &str = "Deploy.s.sol";

const FOUNDRY_TOML: &str = r#"[profile.default]
src = "src"
out = "out"
libs = ["lib"]
remappings = []

[fmt]
bracket_spacing = true
int_types = "long"
line_length = 120
multiline_func_header = "all"
number_underscore = "thousands"
quote_style = "double"
tab_width = 4
wrap_comments = true

[rpc_endpoints]
local = "http://127.0.0.1:8545"
injective-testnet = "https://k8s.testnet.json-rpc.injective.network/"
injective = "https://sentry.evm-rpc.injective.network/"
"#;

/// What the generated workspace deploys, for the artifact lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedContracts {
    pub contract_name: String,
    pub script_name: String,
    pub files: Vec<PathBuf>,
}

/// Foundry cheatcodes the deploy script needs, declared locally so the
/// workspace builds without a forge-std checkout. Lives under `script/` and
/// uses two-hump names so no derived identifier or file stem can clash.
const CHEATS_SOURCE: &str = r#"// SPDX-License-Identifier: MIT
pragma solidity ^0.8.13;

interface FoundryVm {
    function startBroadcast() external;
    function stopBroadcast() external;
}

abstract contract FoundryCheats {
    FoundryVm internal constant vm = FoundryVm(address(uint160(uint256(keccak256("hevm cheat code")))));
}
"#;

/// Same interface as the template's `Counter`, so the bundled frontend can
/// drive it unchanged
fn contract_source(ident: &str) -> String {
    format!(
        r#"// SPDX-License-Identifier: MIT
pragma solidity ^0.8.13;

contract {ident} {{
    uint256 public number;

    event NumberChanged(uint256 number);

    function setNumber(uint256 newNumber) public {{
        number = newNumber;
        emit NumberChanged(newNumber);
    }}

    function increment() public {{
        number++;
        emit NumberChanged(number);
    }}
}}
"#
    )
}

fn test_source(ident: &str, stem: &str) -> String {
    format!(
        r#"// SPDX-License-Identifier: MIT
pragma solidity ^0.8.13;

import {{{ident}}} from "../src/{stem}.sol";

contract {ident}Test {{
    {ident} public target;

    function setUp() public {{
        target = new {ident}();
    }}

    function test_Increment() public {{
        target.increment();
        require(target.number() == 1, "increment");
    }}

    function testFuzz_SetNumber(uint256 x) public {{
        target.setNumber(x);
        require(target.number() == x, "setNumber");
    }}
}}
"#
    )
}

fn deploy_source(ident: &str, stem: &str) -> String {
    format!(
        r#"// SPDX-License-Identifier: MIT
pragma solidity ^0.8.13;

import {{FoundryCheats}} from "./Cheats.sol";
import {{{ident}}} from "../src/{stem}.sol";

contract Deploy{ident} is FoundryCheats {{
    function run() public returns ({ident} deployed) {{
        vm.startBroadcast();
        deployed = new {ident}();
        vm.stopBroadcast();
    }}
}}
"#
    )
}

fn readme(name: &ProjectName, stem: &str) -> String {
    format!(
        r#"# Smart Contracts

This directory contains the smart contracts for {name}, built with Foundry.

```bash
forge build
forge test

# Deploy to Injective testnet
forge script script/{script} --rpc-url injective-testnet --broadcast
```

## Layout

```
contracts/
├── foundry.toml
├── src/{stem}.sol
├── test/{stem}.t.sol
├── script/Cheats.sol
└── script/{script}
```
"#,
        script = GENERATED_DEPLOY_SCRIPT,
    )
}

/// Render the workspace into `contracts_dir`
pub fn generate_contracts(contracts_dir: &Path, name: &ProjectName) -> Result<GeneratedContracts> {
    let ident = name.derived_identifier();
    let stem = name.file_stem();

    let outputs = [
        (contracts_dir.join("foundry.toml"), FOUNDRY_TOML.to_string()),
        (
            contracts_dir.join("src").join(format!("{}.sol", stem)),
            contract_source(&ident),
        ),
        (contracts_dir.join("script").join("Cheats.sol"), CHEATS_SOURCE.to_string()),
        (
            contracts_dir.join("test").join(format!("{}.t.sol", stem)),
            test_source(&ident, &stem),
        ),
        (
            contracts_dir.join("script").join(GENERATED_DEPLOY_SCRIPT),
            deploy_source(&ident, &stem),
        ),
        (contracts_dir.join("README.md"), readme(name, &stem)),
    ];

    let mut files = Vec::with_capacity(outputs.len());
    for (path, content) in outputs {
        write_file(&path, &content)?;
        files.push(path);
    }

    info!(contract = %ident, dir = %contracts_dir.display(), "Generated contracts workspace");

    Ok(GeneratedContracts {
        contract_name: ident,
        script_name: GENERATED_DEPLOY_SCRIPT.to_string(),
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_generate_contracts_layout() {
        let dir = TempDir::new().unwrap();
        let name = ProjectName::parse("my-dapp").unwrap();

        let generated = generate_contracts(dir.path(), &name).unwrap();

        assert_eq!(generated.contract_name, "My_dapp");
        assert_eq!(generated.script_name, "Deploy.s.sol");
        assert_eq!(generated.files.len(), 6);
        assert!(dir.path().join("foundry.toml").exists());
        assert!(dir.path().join("src/my_dapp.sol").exists());
        assert!(dir.path().join("script/Cheats.sol").exists());
        assert!(dir.path().join("test/my_dapp.t.sol").exists());
        assert!(dir.path().join("script/Deploy.s.sol").exists());
    }

    #[test]
    fn test_generated_sources_use_identifier() {
        let dir = TempDir::new().unwrap();
        let name = ProjectName::parse("my-dapp").unwrap();
        generate_contracts(dir.path(), &name).unwrap();

        let contract = fs::read_to_string(dir.path().join("src/my_dapp.sol")).unwrap();
        assert!(contract.contains("contract My_dapp {"));

        let script = fs::read_to_string(dir.path().join("script/Deploy.s.sol")).unwrap();
        assert!(script.contains("contract DeployMy_dapp is FoundryCheats {"));
        assert!(script.contains("import {My_dapp} from \"../src/my_dapp.sol\";"));
    }

    #[test]
    fn test_generated_workspace_needs_no_forge_std() {
        let dir = TempDir::new().unwrap();
        let name = ProjectName::parse("token-shop").unwrap();
        let generated = generate_contracts(dir.path(), &name).unwrap();

        for file in &generated.files {
            let text = fs::read_to_string(file).unwrap();
            assert!(!text.contains("forge-std"), "{} imports forge-std", file.display());
        }

        let contract = fs::read_to_string(dir.path().join("src/token_shop.sol")).unwrap();
        assert!(contract.contains("contract Token_shop {"));
        assert!(contract.contains("function increment() public"));
        assert!(contract.contains("function setNumber(uint256 newNumber) public"));
    }
}
