//! Local chain bootstrap
//!
//! Starts a development node, deploys the sample contract to it, and waits
//! for the deployment artifact. Every failure here is soft: it becomes a
//! warning and the project is still usable without a running chain.

pub mod readiness;

pub use readiness::{ReadinessPolicy, poll_until, wait_for_path, wait_for_rpc};

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::artifact::{ChainId, artifact_path};
use crate::config::ChainConfig;
use crate::process::{CommandSpec, DetachedProcess, ExitOutcome, OutputMode, ProcessRunner};

/// Private key of Anvil's first pre-funded development account.
///
/// Public knowledge. Only ever valid against a throwaway local chain; never
/// use it with a network that holds real value.
pub const ANVIL_DEV_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// What the bootstrap managed to do
#[derive(Debug, Clone, Default)]
pub struct BootstrapOutcome {
    /// The node left running, if it launched
    pub node: Option<DetachedProcess>,
    /// Result of the deploy command, if it ran
    pub deploy: Option<ExitOutcome>,
    /// Where the deployment artifact is expected
    pub artifact: Option<PathBuf>,
    pub warnings: Vec<String>,
}

impl BootstrapOutcome {
    /// The deploy ran, exited zero, and its artifact appeared
    pub fn deployed(&self) -> bool {
        self.deploy.as_ref().is_some_and(ExitOutcome::success)
            && self.artifact.as_deref().is_some_and(Path::is_file)
    }

    fn warn(&mut self, message: String) {
        warn!("{}", message);
        self.warnings.push(message);
    }
}

/// Starts the local node and runs the deploy script against it
pub struct ChainBootstrapper<'a> {
    runner: &'a dyn ProcessRunner,
    config: &'a ChainConfig,
    forge: &'a str,
}

impl<'a> ChainBootstrapper<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, config: &'a ChainConfig, forge: &'a str) -> Self {
        Self {
            runner,
            config,
            forge,
        }
    }

    /// The detached node command
    pub fn node_command(&self, contracts_dir: &Path) -> CommandSpec {
        CommandSpec::new(&self.config.node_program)
            .current_dir(contracts_dir)
            .output(OutputMode::Discard)
            .detached()
    }

    /// The deploy command
    pub fn deploy_command(&self, contracts_dir: &Path, script: &str) -> CommandSpec {
        CommandSpec::new(self.forge)
            .args(["script", script])
            .args(["--rpc-url", self.config.rpc_url.as_str()])
            .arg("--broadcast")
            .args(["--private-key", ANVIL_DEV_PRIVATE_KEY])
            .current_dir(contracts_dir)
            .output(OutputMode::Capture)
    }

    /// Launch the node, deploy `script`, and wait for the artifact
    pub async fn bootstrap(&self, contracts_dir: &Path, script: &str) -> BootstrapOutcome {
        let mut outcome = BootstrapOutcome::default();

        let node = self.node_command(contracts_dir);
        match self.runner.run(&node).await {
            Ok(launched) => {
                if let Some(handle) = &launched.detached {
                    info!(command = %handle.command, pid = ?handle.pid, "Started local chain");
                }
                outcome.node = launched.detached;
            }
            Err(err) => {
                outcome.warn(format!("Could not start local chain: {}", err));
                return outcome;
            }
        }

        let policy = ReadinessPolicy::for_node(self.config);
        match wait_for_rpc(&self.config.rpc_url, policy).await {
            Ok(Some(reported)) if reported != self.config.chain_id => {
                outcome.warn(format!(
                    "Node at {} reports chain id {}, expected {}",
                    self.config.rpc_url, reported, self.config.chain_id
                ));
            }
            Ok(_) => info!(rpc = %self.config.rpc_url, "Local chain is ready"),
            Err(err) => {
                outcome.warn(format!("Local chain did not become ready: {}", err));
                return outcome;
            }
        }

        let deploy = self.deploy_command(contracts_dir, script);
        info!(script, "Deploying contracts");
        let result = match self.runner.run(&deploy).await {
            Ok(result) => result,
            Err(err) => {
                outcome.warn(format!("Could not run deploy: {}", err));
                return outcome;
            }
        };

        let succeeded = result.success();
        if !succeeded {
            let detail = result.diagnostics();
            outcome.warn(format!(
                "Deploy exited with {}: {}",
                result
                    .exit_code
                    .map_or_else(|| "a signal".to_string(), |code| format!("code {}", code)),
                detail
            ));
        }
        outcome.deploy = Some(result);
        if !succeeded {
            return outcome;
        }

        let script_name = script_file_name(script);
        let artifact = artifact_path(contracts_dir, script_name, ChainId(self.config.chain_id));
        match wait_for_path(&artifact, ReadinessPolicy::for_artifact(self.config)).await {
            Ok(()) => info!(path = %artifact.display(), "Deployment recorded"),
            Err(err) => outcome.warn(format!("Deployment artifact did not appear: {}", err)),
        }
        outcome.artifact = Some(artifact);

        outcome
    }
}

/// Final path component of a script path
pub fn script_file_name(script: &str) -> &str {
    script.rsplit(['/', '\\']).next().unwrap_or(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every command; fails launches of programs in `missing`
    struct Recorder {
        missing: Vec<&'static str>,
        calls: Mutex<Vec<CommandSpec>>,
    }

    impl Recorder {
        fn new(missing: Vec<&'static str>) -> Self {
            Self {
                missing,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn programs(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|c| c.program.clone())
                .collect()
        }
    }

    #[async_trait]
    impl ProcessRunner for Recorder {
        async fn run(&self, spec: &CommandSpec) -> Result<ExitOutcome> {
            self.calls.lock().unwrap().push(spec.clone());
            if self.missing.contains(&spec.program.as_str()) {
                return Err(Error::Launch {
                    command: spec.program.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
                });
            }
            Ok(ExitOutcome {
                exit_code: Some(0),
                ..ExitOutcome::default()
            })
        }
    }

    #[test]
    fn test_deploy_command_shape() {
        let runner = Recorder::new(vec![]);
        let config = ChainConfig::default();
        let bootstrapper = ChainBootstrapper::new(&runner, &config, "forge");

        let spec = bootstrapper.deploy_command(Path::new("/p/contracts"), "script/Counter.s.sol");
        assert_eq!(
            spec.to_string(),
            format!(
                "forge script script/Counter.s.sol --rpc-url http://127.0.0.1:8545 --broadcast --private-key {}",
                ANVIL_DEV_PRIVATE_KEY
            )
        );
        assert_eq!(spec.output, OutputMode::Capture);
        assert_eq!(spec.working_dir.as_deref(), Some(Path::new("/p/contracts")));

        let node = bootstrapper.node_command(Path::new("/p/contracts"));
        assert!(node.detached);
        assert_eq!(node.output, OutputMode::Discard);
        assert_eq!(node.program, "anvil");
    }

    #[tokio::test]
    async fn test_missing_node_is_a_warning() {
        let runner = Recorder::new(vec!["anvil"]);
        let config = ChainConfig::default();
        let bootstrapper = ChainBootstrapper::new(&runner, &config, "forge");

        let outcome = bootstrapper
            .bootstrap(Path::new("/p/contracts"), "script/Counter.s.sol")
            .await;

        assert!(outcome.node.is_none());
        assert!(outcome.deploy.is_none());
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("Could not start local chain"));
        assert!(!outcome.deployed());
        // Deploy is never attempted without a node
        assert_eq!(runner.programs(), vec!["anvil"]);
    }

    #[tokio::test]
    async fn test_unreachable_rpc_stops_before_deploy() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let runner = Recorder::new(vec![]);
        let config = ChainConfig {
            rpc_url: format!("http://127.0.0.1:{port}"),
            poll_interval_ms: 10,
            node_timeout_secs: 0,
            ..ChainConfig::default()
        };
        let bootstrapper = ChainBootstrapper::new(&runner, &config, "forge");

        let outcome = bootstrapper
            .bootstrap(Path::new("/p/contracts"), "script/Counter.s.sol")
            .await;

        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("did not become ready"));
        assert_eq!(runner.programs(), vec!["anvil"]);
    }

    #[test]
    fn test_script_file_name() {
        assert_eq!(script_file_name("script/Counter.s.sol"), "Counter.s.sol");
        assert_eq!(script_file_name("Deploy.s.sol"), "Deploy.s.sol");
    }
}
