//! External command invocation
//!
//! Every external tool (npm, anvil, forge) goes through [`ProcessRunner`].
//! A launch failure (binary missing, permission denied) is an `Err`; a
//! process that ran and exited non-zero is an `Ok` outcome the caller must
//! interpret.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

/// Where a child's stdout/stderr go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Stream directly to the invoking terminal
    #[default]
    Inherit,
    /// Buffer for programmatic inspection
    Capture,
    Discard,
}

/// A command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub output: OutputMode,
    /// Spawn and return without waiting; the process may outlive us
    pub detached: bool,
    /// Merged over the inherited environment
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            output: OutputMode::Inherit,
            detached: false,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn output(mut self, mode: OutputMode) -> Self {
        self.output = mode;
        self
    }

    pub fn detached(mut self) -> Self {
        self.detached = true;
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Program name with the platform shim applied (`npm.cmd` on Windows)
    pub fn resolved_program(&self) -> String {
        if cfg!(windows) && self.program == "npm" {
            "npm.cmd".to_string()
        } else {
            self.program.clone()
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// A process left running after launch.
///
/// The scaffolder does not own this process once it is spawned: nothing
/// waits on it or stops it. It is reported so the caller can tell the user
/// how to stop it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachedProcess {
    pub pid: Option<u32>,
    pub command: String,
}

/// How a command ended
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExitOutcome {
    /// `None` for detached processes and processes killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub detached: Option<DetachedProcess>,
}

impl ExitOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Captured stderr, falling back to stdout, trimmed
    pub fn diagnostics(&self) -> String {
        let stderr = self.stderr.as_deref().unwrap_or("").trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        self.stdout.as_deref().unwrap_or("").trim().to_string()
    }
}

/// Runs external commands
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> Result<ExitOutcome>;
}

/// Runs commands as real OS processes via tokio
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<ExitOutcome> {
        let program = spec.resolved_program();
        let mut command = Command::new(&program);
        command.args(&spec.args);
        if let Some(dir) = &spec.working_dir {
            command.current_dir(dir);
        }
        command.envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let launch_error = |source: std::io::Error| Error::Launch {
            command: spec.program.clone(),
            source,
        };

        if spec.detached {
            command
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null());
            #[cfg(unix)]
            command.process_group(0);

            let child = command.spawn().map_err(launch_error)?;
            let pid = child.id();
            debug!(command = %spec, pid = ?pid, "Spawned detached process");
            // Dropping the handle leaves the child running
            drop(child);

            return Ok(ExitOutcome {
                detached: Some(DetachedProcess {
                    pid,
                    command: spec.to_string(),
                }),
                ..ExitOutcome::default()
            });
        }

        debug!(command = %spec, mode = ?spec.output, "Running command");

        match spec.output {
            OutputMode::Capture => {
                let output = command
                    .stdin(Stdio::null())
                    .output()
                    .await
                    .map_err(launch_error)?;
                Ok(ExitOutcome {
                    exit_code: output.status.code(),
                    stdout: Some(String::from_utf8_lossy(&output.stdout).into_owned()),
                    stderr: Some(String::from_utf8_lossy(&output.stderr).into_owned()),
                    detached: None,
                })
            }
            OutputMode::Inherit | OutputMode::Discard => {
                if spec.output == OutputMode::Discard {
                    command.stdout(Stdio::null()).stderr(Stdio::null());
                }
                let status = command.status().await.map_err(launch_error)?;
                Ok(ExitOutcome {
                    exit_code: status.code(),
                    ..ExitOutcome::default()
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_builder() {
        let spec = CommandSpec::new("forge")
            .args(["script", "script/Counter.s.sol"])
            .arg("--broadcast")
            .current_dir("/tmp/contracts")
            .output(OutputMode::Capture)
            .env("FOUNDRY_PROFILE", "default");

        assert_eq!(spec.to_string(), "forge script script/Counter.s.sol --broadcast");
        assert_eq!(spec.working_dir, Some(PathBuf::from("/tmp/contracts")));
        assert_eq!(spec.output, OutputMode::Capture);
        assert!(!spec.detached);
        assert_eq!(spec.env, vec![("FOUNDRY_PROFILE".to_string(), "default".to_string())]);
    }

    #[test]
    fn test_exit_outcome_diagnostics() {
        let outcome = ExitOutcome {
            exit_code: Some(1),
            stdout: Some("compiling...\n".to_string()),
            stderr: Some("  Error: revert  \n".to_string()),
            detached: None,
        };
        assert!(!outcome.success());
        assert_eq!(outcome.diagnostics(), "Error: revert");

        let quiet = ExitOutcome {
            exit_code: Some(0),
            stdout: Some("done\n".to_string()),
            stderr: Some(String::new()),
            detached: None,
        };
        assert!(quiet.success());
        assert_eq!(quiet.diagnostics(), "done");
    }

    #[tokio::test]
    async fn test_missing_binary_is_launch_error() {
        let spec = CommandSpec::new("evmstart-definitely-not-a-real-binary")
            .output(OutputMode::Capture);
        let err = SystemRunner.run(&spec).await.unwrap_err();
        assert!(err.is_launch_failure());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_capture_and_exit_code() {
        let spec = CommandSpec::new("sh")
            .args(["-c", "echo out; echo err >&2; exit 3"])
            .output(OutputMode::Capture);
        let outcome = SystemRunner.run(&spec).await.unwrap();
        assert_eq!(outcome.exit_code, Some(3));
        assert_eq!(outcome.stdout.as_deref(), Some("out\n"));
        assert_eq!(outcome.stderr.as_deref(), Some("err\n"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_env_and_working_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let spec = CommandSpec::new("sh")
            .args(["-c", "printf '%s %s' \"$GREETING\" \"$(basename \"$PWD\")\""])
            .current_dir(dir.path())
            .env("GREETING", "hello")
            .output(OutputMode::Capture);
        let outcome = SystemRunner.run(&spec).await.unwrap();
        let expected = format!(
            "hello {}",
            dir.path().file_name().unwrap().to_string_lossy()
        );
        assert_eq!(outcome.stdout.as_deref(), Some(expected.as_str()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_discard_mode_reports_status_only() {
        let spec = CommandSpec::new("sh")
            .args(["-c", "echo noisy"])
            .output(OutputMode::Discard);
        let outcome = SystemRunner.run(&spec).await.unwrap();
        assert!(outcome.success());
        assert!(outcome.stdout.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_detached_returns_without_waiting() {
        let spec = CommandSpec::new("sleep").arg("5").detached();
        let started = std::time::Instant::now();
        let outcome = SystemRunner.run(&spec).await.unwrap();
        assert!(started.elapsed() < std::time::Duration::from_secs(2));

        let handle = outcome.detached.expect("detached handle");
        assert!(handle.pid.is_some());
        assert_eq!(handle.command, "sleep 5");
        assert_eq!(outcome.exit_code, None);

        if let Some(pid) = handle.pid {
            let _ = std::process::Command::new("kill").arg(pid.to_string()).status();
        }
    }
}
