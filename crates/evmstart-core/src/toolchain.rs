//! External toolchain detection
//!
//! evmstart never installs toolchains; it only checks for them and tells
//! the user how to install what is missing.

use tracing::debug;

use crate::config::Config;
use crate::error::Result;
use crate::process::{CommandSpec, OutputMode, ProcessRunner};

/// Result of probing one tool with `--version`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStatus {
    /// Ran and exited zero; first line of its version output
    Available(String),
    /// Launched but exited non-zero
    Broken(String),
    /// Could not be launched at all
    Missing,
}

impl ToolStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// One external tool evmstart may call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    pub name: &'static str,
    pub program: String,
    pub install_hint: &'static str,
}

pub const FOUNDRY_HINT: &str = "curl -L https://foundry.paradigm.xyz | bash && foundryup";
pub const NODE_HINT: &str = "Install Node.js from https://nodejs.org";

/// The tools a full scaffold uses, with programs taken from config
pub fn known_tools(config: &Config) -> Vec<Tool> {
    vec![
        Tool {
            name: "forge",
            program: config.toolchain.forge.clone(),
            install_hint: FOUNDRY_HINT,
        },
        Tool {
            name: "anvil",
            program: config.chain.node_program.clone(),
            install_hint: FOUNDRY_HINT,
        },
        Tool {
            name: "npm",
            program: config.toolchain.npm.clone(),
            install_hint: NODE_HINT,
        },
    ]
}

/// Run `<program> --version` and classify the result
pub async fn probe(runner: &dyn ProcessRunner, program: &str) -> Result<ToolStatus> {
    let spec = CommandSpec::new(program)
        .arg("--version")
        .output(OutputMode::Capture);

    let status = match runner.run(&spec).await {
        Ok(outcome) if outcome.success() => {
            let version = outcome
                .stdout
                .as_deref()
                .and_then(|out| out.lines().next())
                .unwrap_or("")
                .trim()
                .to_string();
            ToolStatus::Available(version)
        }
        Ok(outcome) => ToolStatus::Broken(outcome.diagnostics()),
        Err(err) if err.is_launch_failure() => ToolStatus::Missing,
        Err(err) => return Err(err),
    };

    debug!(program = %program, status = ?status, "Probed toolchain");
    Ok(status)
}
