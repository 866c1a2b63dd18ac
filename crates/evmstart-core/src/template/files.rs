//! Generated top-level project files
//!
//! Unlike template trees these are rendered per project, so they carry the
//! project name.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::project::ProjectName;

const GITIGNORE: &str = "# Dependencies
node_modules/

# Build outputs
dist/
build/
out/

# Environment variables
.env
.env.local
.env.production

# IDE
.vscode/
.idea/

# OS
.DS_Store
Thumbs.db

# Foundry
cache/
broadcast/

# Logs
*.log
";

/// Project README with layout and getting-started commands; `deploy_script`
/// is relative to the contracts workspace
pub fn readme(name: &ProjectName, deploy_script: &str) -> String {
    format!(
        r#"# {name}

A full-stack dApp built for Injective EVM.

## Project Structure

```
{name}/
├── contracts/    # Smart contracts (Foundry + Solidity)
├── frontend/     # React frontend (Vite + TypeScript + wagmi)
└── README.md
```

## Getting Started

### Frontend

```bash
cd frontend
npm install
npm run dev
```

Open http://localhost:5173 in your browser.

### Smart Contracts

```bash
cd contracts
forge build
forge test

# Deploy to a local Anvil node
anvil &
forge script {deploy_script} --rpc-url http://127.0.0.1:8545 --broadcast

# Deploy to Injective testnet
forge script {deploy_script} --rpc-url injective-testnet --broadcast
```

### Wiring deployments into the frontend

After any deployment, refresh the frontend's address table and ABI:

```bash
evmstart sync
```

## Tech Stack

- **Frontend**: React + Vite + TypeScript + TailwindCSS
- **Web3**: wagmi + viem + @tanstack/react-query
- **Smart Contracts**: Foundry + Solidity
- **Chain**: Injective EVM (testnet 1439, mainnet 1776) and local Anvil (31337)

## Foundry Commands

```bash
forge build              # Compile contracts
forge test               # Run tests
forge test --gas-report  # Gas usage report
forge fmt                # Format code
forge doc                # Generate docs
```
"#
    )
}

/// Contracts workspace README, written only when the template lacks one
pub fn contracts_readme(name: &ProjectName) -> String {
    format!(
        r#"# Smart Contracts

This directory contains the smart contracts for {name}, built with Foundry.

```bash
forge build
forge test
```
"#
    )
}

pub fn gitignore() -> &'static str {
    GITIGNORE
}

/// Write README.md and .gitignore at the project root, plus a contracts
/// README if the contracts workspace has none. Returns the files written.
pub fn write_initial_files(
    project_path: &Path,
    name: &ProjectName,
    deploy_script: &str,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    let readme_path = project_path.join("README.md");
    write_file(&readme_path, &readme(name, deploy_script))?;
    written.push(readme_path);

    let gitignore_path = project_path.join(".gitignore");
    write_file(&gitignore_path, gitignore())?;
    written.push(gitignore_path);

    let contracts_dir = project_path.join("contracts");
    let contracts_readme_path = contracts_dir.join("README.md");
    if contracts_dir.is_dir() && !contracts_readme_path.exists() {
        write_file(&contracts_readme_path, &contracts_readme(name))?;
        written.push(contracts_readme_path);
    }

    Ok(written)
}

pub(crate) fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| Error::Copy {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, content).map_err(|source| Error::Copy {
        path: path.to_path_buf(),
        source,
    })
}
