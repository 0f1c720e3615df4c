//! Topology Store
//!
//! Holds the current cluster topology as a copy-on-write snapshot behind an
//! atomically swapped reference. Readers always see a complete, consistent
//! snapshot and in-flight requests keep whatever snapshot they captured;
//! an update only affects requests started after the swap.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::ClusterConfig;
use crate::error::CoordinatorError;

use super::types::Topology;

pub struct TopologyStore {
    current: RwLock<Option<Arc<Topology>>>,
    config: Arc<ClusterConfig>,
}

impl TopologyStore {
    pub fn new(config: Arc<ClusterConfig>) -> Arc<Self> {
        Arc::new(Self {
            current: RwLock::new(None),
            config,
        })
    }

    /// Latest committed snapshot. Never blocks on an in-progress update
    /// beyond the brief pointer swap; `None` until the first install.
    pub fn get(&self) -> Option<Arc<Topology>> {
        self.current.read().clone()
    }

    /// True once any topology has been installed. Routed commands must be
    /// rejected while this is false.
    pub fn ready(&self) -> bool {
        self.current.read().is_some()
    }

    /// Validates and atomically installs a new snapshot. On validation
    /// failure the previous topology stays active and the error is returned
    /// to the caller.
    pub fn update(&self, topology: Topology) -> Result<(), CoordinatorError> {
        if let Err(reason) = topology.validate() {
            tracing::warn!("Rejected topology update: {}", reason);
            return Err(CoordinatorError::Topology(reason));
        }
        if topology.hash_func != self.config.hash_func() {
            // the snapshot's hash function wins; flag the drift
            tracing::warn!(
                "Topology uses {} while the coordinator was configured for {}",
                topology.hash_func.as_str(),
                self.config.hash_func().as_str()
            );
        }

        let shards = topology.num_shards();
        *self.current.write() = Some(Arc::new(topology));
        tracing::info!("Installed topology snapshot with {} shards", shards);
        Ok(())
    }

    /// Reconciles the logical partition count with the live shard count.
    ///
    /// Called by the membership watcher whenever node membership changes.
    /// Only acts in AUTO mode; an explicitly configured partition count is
    /// authoritative. Idempotent, and never disturbs in-flight requests:
    /// the count is a single atomic cell read at request start.
    pub fn ensure_size(&self, topology: &Topology) {
        if !self.config.auto_partitions() {
            return;
        }
        let live = topology.num_shards();
        let configured = self.config.partitions();
        if configured != live {
            tracing::info!(
                "Reconciling partition count: {} -> {} (live shards)",
                configured,
                live
            );
            self.config.set_partitions(live);
        }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }
}
