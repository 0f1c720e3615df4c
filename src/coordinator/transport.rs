//! Shard Engine Transport
//!
//! The boundary to the per-shard search engine. The coordinator hands over a
//! rewritten command (argument 0 already in its internal prefixed form, key
//! arguments already shard-tagged) and gets back one typed reply.
//!
//! The HTTP implementation retries transient transport failures with
//! exponential backoff and jitter; an error that survives the retries is
//! recorded positionally by the engine and never aborts the whole request.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::cluster::types::Node;
use crate::command::Command;
use crate::config::ClusterConfig;
use crate::protocol::{Reply, ShardCommandRequest, ENDPOINT_SHARD_COMMAND};

/// Number of attempts per dispatch before the failure is surfaced.
const DISPATCH_ATTEMPTS: usize = 3;

#[async_trait]
pub trait ShardTransport: Send + Sync {
    /// Sends one rewritten command to one node and returns its reply.
    async fn dispatch(&self, node: &Node, cmd: &Command) -> Result<Reply>;
}

/// HTTP transport to the shard engines' internal command endpoint.
pub struct HttpShardTransport {
    client: reqwest::Client,
    config: Arc<ClusterConfig>,
}

impl HttpShardTransport {
    pub fn new(config: Arc<ClusterConfig>) -> Arc<Self> {
        Arc::new(Self {
            client: reqwest::Client::new(),
            config,
        })
    }
}

#[async_trait]
impl ShardTransport for HttpShardTransport {
    async fn dispatch(&self, node: &Node, cmd: &Command) -> Result<Reply> {
        let url = format!(
            "http://{}{}",
            node.endpoint, ENDPOINT_SHARD_COMMAND
        );
        let payload = ShardCommandRequest { args: cmd.args().to_vec() };
        let attempt_timeout = Duration::from_millis(self.config.timeout_ms());

        let mut delay_ms = 150u64;
        for attempt in 0..DISPATCH_ATTEMPTS {
            let response = self
                .client
                .post(&url)
                .json(&payload)
                .timeout(attempt_timeout)
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    return Ok(resp.json::<Reply>().await?);
                }
                Ok(resp) => {
                    anyhow::bail!("shard {} replied {}", node.id, resp.status());
                }
                Err(e) => {
                    if attempt + 1 == DISPATCH_ATTEMPTS {
                        return Err(anyhow::anyhow!(e));
                    }
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(1200);
                }
            }
        }

        Err(anyhow::anyhow!("Retry attempts exhausted"))
    }
}
