//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::template::DEFAULT_EXCLUDES;

/// evmstart configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub templates: TemplatesConfig,
    pub chain: ChainConfig,
    pub toolchain: ToolchainConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    /// Template root override
    pub dir: Option<PathBuf>,
    /// Directory names skipped when copying templates
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub node_program: String,
    pub rpc_url: String,
    pub chain_id: u64,
    /// Deploy script path relative to the contracts workspace
    pub deploy_script: String,
    pub contract_name: String,
    pub poll_interval_ms: u64,
    pub node_timeout_secs: u64,
    pub artifact_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    pub forge: String,
    pub npm: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            dir: None,
            exclude: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            node_program: "anvil".to_string(),
            rpc_url: "http://127.0.0.1:8545".to_string(),
            chain_id: 31337,
            deploy_script: "script/Counter.s.sol".to_string(),
            contract_name: "Counter".to_string(),
            poll_interval_ms: 250,
            node_timeout_secs: 10,
            artifact_timeout_secs: 30,
        }
    }
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            forge: "forge".to_string(),
            npm: "npm".to_string(),
        }
    }
}

impl ChainConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn node_timeout(&self) -> Duration {
        Duration::from_secs(self.node_timeout_secs)
    }

    pub fn artifact_timeout(&self) -> Duration {
        Duration::from_secs(self.artifact_timeout_secs)
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("EVMSTART_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("evmstart")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or fall back to defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chain.poll_interval_ms == 0 {
            return Err(anyhow!("chain.poll_interval_ms must be greater than zero"));
        }
        if !self.chain.rpc_url.starts_with("http://") && !self.chain.rpc_url.starts_with("https://") {
            return Err(anyhow!(
                "chain.rpc_url must be an http(s) URL, got '{}'",
                self.chain.rpc_url
            ));
        }
        if self.chain.deploy_script.trim().is_empty() {
            return Err(anyhow!("chain.deploy_script cannot be empty"));
        }
        if self.chain.contract_name.trim().is_empty() {
            return Err(anyhow!("chain.contract_name cannot be empty"));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "templates.dir" => Ok(self
                .templates
                .dir
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_else(|| "(bundled)".to_string())),
            "templates.exclude" => Ok(self.templates.exclude.join(", ")),

            "chain.node_program" => Ok(self.chain.node_program.clone()),
            "chain.rpc_url" => Ok(self.chain.rpc_url.clone()),
            "chain.chain_id" => Ok(self.chain.chain_id.to_string()),
            "chain.deploy_script" => Ok(self.chain.deploy_script.clone()),
            "chain.contract_name" => Ok(self.chain.contract_name.clone()),
            "chain.poll_interval_ms" => Ok(self.chain.poll_interval_ms.to_string()),
            "chain.node_timeout_secs" => Ok(self.chain.node_timeout_secs.to_string()),
            "chain.artifact_timeout_secs" => Ok(self.chain.artifact_timeout_secs.to_string()),

            "toolchain.forge" => Ok(self.toolchain.forge.clone()),
            "toolchain.npm" => Ok(self.toolchain.npm.clone()),

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `evmstart config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key; the change is kept only if the
    /// result still validates
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut next = self.clone();
        next.apply(key, value)?;
        next.validate()?;
        *self = next;
        Ok(())
    }

    fn apply(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "templates.dir" => {
                self.templates.dir = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "templates.exclude" => {
                self.templates.exclude = value
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }

            "chain.node_program" => self.chain.node_program = value.to_string(),
            "chain.rpc_url" => self.chain.rpc_url = value.to_string(),
            "chain.chain_id" => {
                self.chain.chain_id = value
                    .parse()
                    .with_context(|| format!("Invalid chain_id value: {}", value))?;
            }
            "chain.deploy_script" => self.chain.deploy_script = value.to_string(),
            "chain.contract_name" => self.chain.contract_name = value.to_string(),
            "chain.poll_interval_ms" => {
                self.chain.poll_interval_ms = value
                    .parse()
                    .with_context(|| format!("Invalid poll_interval_ms value: {}", value))?;
            }
            "chain.node_timeout_secs" => {
                self.chain.node_timeout_secs = value
                    .parse()
                    .with_context(|| format!("Invalid node_timeout_secs value: {}", value))?;
            }
            "chain.artifact_timeout_secs" => {
                self.chain.artifact_timeout_secs = value
                    .parse()
                    .with_context(|| format!("Invalid artifact_timeout_secs value: {}", value))?;
            }

            "toolchain.forge" => self.toolchain.forge = value.to_string(),
            "toolchain.npm" => self.toolchain.npm = value.to_string(),

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `evmstart config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = [
            "templates.dir",
            "templates.exclude",
            "chain.node_program",
            "chain.rpc_url",
            "chain.chain_id",
            "chain.deploy_script",
            "chain.contract_name",
            "chain.poll_interval_ms",
            "chain.node_timeout_secs",
            "chain.artifact_timeout_secs",
            "toolchain.forge",
            "toolchain.npm",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}
