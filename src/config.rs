//! Cluster Configuration
//!
//! Runtime configuration consumed by the coordination core. Everything is
//! fixed after startup except the coordinator timeout and the logical
//! partition count, which may be hot-reloaded between requests; those two
//! live behind atomics so no request ever observes a torn update.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::cluster::slots::HashFunc;

/// Default coordinator timeout applied to every scatter-gather request.
pub const DEFAULT_TIMEOUT_MS: u64 = 500;

/// Which cluster flavor the coordinator runs inside. The flavor selects the
/// hash function (and therefore the slot-space size) used for routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterType {
    /// Open deployments: CRC16 over 16384 slots.
    Open,
    /// Enterprise deployments: CRC12 over 4096 slots.
    Enterprise,
}

impl ClusterType {
    pub fn hash_func(self) -> HashFunc {
        match self {
            ClusterType::Open => HashFunc::Crc16,
            ClusterType::Enterprise => HashFunc::Crc12,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ClusterType::Open => "open",
            ClusterType::Enterprise => "enterprise",
        }
    }
}

/// Shared, partially hot-reloadable coordinator configuration.
pub struct ClusterConfig {
    cluster_type: ClusterType,
    /// Logical partition count; 0 means AUTO (reconciled against the live
    /// shard count by `TopologyStore::ensure_size`).
    partitions: AtomicUsize,
    /// Whether the partition count was configured as AUTO. Only AUTO mode
    /// lets topology reconciliation adjust the count.
    auto_partitions: bool,
    timeout_ms: AtomicU64,
}

impl ClusterConfig {
    pub fn new(cluster_type: ClusterType, partitions: usize, timeout_ms: u64) -> Self {
        Self {
            cluster_type,
            partitions: AtomicUsize::new(partitions),
            auto_partitions: partitions == 0,
            timeout_ms: AtomicU64::new(if timeout_ms > 0 {
                timeout_ms
            } else {
                DEFAULT_TIMEOUT_MS
            }),
        }
    }

    pub fn cluster_type(&self) -> ClusterType {
        self.cluster_type
    }

    pub fn hash_func(&self) -> HashFunc {
        self.cluster_type.hash_func()
    }

    pub fn partitions(&self) -> usize {
        self.partitions.load(Ordering::Acquire)
    }

    pub fn set_partitions(&self, partitions: usize) {
        self.partitions.store(partitions, Ordering::Release);
    }

    pub fn auto_partitions(&self) -> bool {
        self.auto_partitions
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms.load(Ordering::Acquire)
    }

    /// Hot-reload the coordinator timeout. Non-positive values are ignored,
    /// matching the behavior of the original TIMEOUT option.
    pub fn set_timeout_ms(&self, timeout_ms: u64) {
        if timeout_ms > 0 {
            self.timeout_ms.store(timeout_ms, Ordering::Release);
        }
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self::new(ClusterType::Open, 0, DEFAULT_TIMEOUT_MS)
    }
}
