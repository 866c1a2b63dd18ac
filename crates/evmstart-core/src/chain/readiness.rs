//! Poll-until-ready waits
//!
//! Each wait checks a condition every `interval` and gives up with
//! [`Error::ReadinessTimeout`] once `timeout` has elapsed.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::time::{Instant, sleep};
use tracing::{debug, trace};

use crate::config::ChainConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl ReadinessPolicy {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Policy for the local node's RPC endpoint
    pub fn for_node(config: &ChainConfig) -> Self {
        Self::new(config.poll_interval(), config.node_timeout())
    }

    /// Policy for the deployment artifact
    pub fn for_artifact(config: &ChainConfig) -> Self {
        Self::new(config.poll_interval(), config.artifact_timeout())
    }
}

/// Call `check` until it yields a value or the policy times out.
///
/// `check` always runs at least once, even with a zero timeout.
pub async fn poll_until<T, F, Fut>(what: &str, policy: ReadinessPolicy, mut check: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let started = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        if let Some(value) = check().await {
            debug!(what, attempts, elapsed_ms = started.elapsed().as_millis() as u64, "Ready");
            return Ok(value);
        }

        let elapsed = started.elapsed();
        if elapsed >= policy.timeout {
            return Err(Error::ReadinessTimeout {
                what: what.to_string(),
                waited_ms: elapsed.as_millis(),
            });
        }

        trace!(what, attempts, "Not ready yet");
        sleep(policy.interval.min(policy.timeout - elapsed)).await;
    }
}

/// Wait until `path` exists as a file
pub async fn wait_for_path(path: &Path, policy: ReadinessPolicy) -> Result<()> {
    let what = path.display().to_string();
    poll_until(&what, policy, || async { path.is_file().then_some(()) }).await
}

/// Wait until a JSON-RPC endpoint answers `eth_chainId`.
///
/// Returns the chain id the node reports, if it reported a parseable one.
pub async fn wait_for_rpc(url: &str, policy: ReadinessPolicy) -> Result<Option<u64>> {
    let client = reqwest::Client::builder()
        .timeout(policy.interval.max(Duration::from_millis(200)))
        .build()
        .map_err(|err| Error::Other(format!("Failed to build HTTP client: {}", err)))?;
    let client = &client;

    poll_until(url, policy, move || async move {
        match query_chain_id(client, url).await {
            Ok(id) => Some(id),
            Err(err) => {
                trace!(url, error = %err, "RPC not answering");
                None
            }
        }
    })
    .await
}

async fn query_chain_id(client: &reqwest::Client, url: &str) -> reqwest::Result<Option<u64>> {
    let body = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "eth_chainId",
        "params": []
    });

    let response: Value = client
        .post(url)
        .json(&body)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(response
        .get("result")
        .and_then(Value::as_str)
        .and_then(|hex| u64::from_str_radix(hex.trim_start_matches("0x"), 16).ok()))
}
