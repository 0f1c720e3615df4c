//! Topology Updater
//!
//! Background refresh of the topology store from the host cluster's own
//! membership view. The source hands back full replacement snapshots; the
//! updater validates and installs them, reconciling the partition count on
//! the way. Refresh can also be triggered on demand by the administrative
//! endpoint.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use super::store::TopologyStore;
use super::types::Topology;

/// Where fresh topology snapshots come from. Implemented over HTTP for the
/// running system and by fixtures in tests.
#[async_trait]
pub trait TopologySource: Send + Sync {
    async fn fetch(&self) -> Result<Topology>;
}

/// Fetches the membership view as JSON from the host cluster.
pub struct HttpTopologySource {
    url: String,
    client: reqwest::Client,
}

impl HttpTopologySource {
    pub fn new(url: String) -> Self {
        Self {
            url,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TopologySource for HttpTopologySource {
    async fn fetch(&self) -> Result<Topology> {
        let response = self
            .client
            .get(&self.url)
            .timeout(Duration::from_millis(2000))
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("topology fetch failed: {}", response.status());
        }
        Ok(response.json().await?)
    }
}

pub struct TopologyUpdater {
    store: Arc<TopologyStore>,
    source: Arc<dyn TopologySource>,
    interval: Duration,
}

impl TopologyUpdater {
    pub fn new(
        store: Arc<TopologyStore>,
        source: Arc<dyn TopologySource>,
        interval: Duration,
    ) -> Arc<Self> {
        Arc::new(Self { store, source, interval })
    }

    /// Spawns the periodic refresh loop and returns immediately.
    pub fn start(self: Arc<Self>) {
        let updater = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(updater.interval);
            loop {
                interval.tick().await;
                if let Err(e) = updater.refresh().await {
                    tracing::warn!("Topology refresh failed: {}", e);
                }
            }
        });
        tracing::info!(
            "Topology updater started (refresh every {:?})",
            self.interval
        );
    }

    /// One refresh round: fetch, reconcile the partition count, install.
    /// A snapshot that fails validation leaves the previous one active.
    pub async fn refresh(&self) -> Result<()> {
        let topology = self.source.fetch().await?;
        self.store.ensure_size(&topology);
        self.store.update(topology)?;
        Ok(())
    }
}
