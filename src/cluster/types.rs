//! Topology snapshot records.
//!
//! A `Topology` is an immutable value describing the whole cluster: an
//! ordered list of shards, each owning a contiguous slot range and served by
//! one or more nodes. Snapshots arrive as full replacements from the
//! membership source and are validated before they become current.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::slots::HashFunc;

/// Network address of one cluster node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// One member node of a shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub endpoint: Endpoint,
    /// Whether this node is the shard's master.
    #[serde(default)]
    pub master: bool,
    /// Whether this node is the process the coordinator runs next to.
    #[serde(default)]
    pub myself: bool,
}

/// A partition of the dataset owning a contiguous slot range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shard {
    pub start_slot: u16,
    pub end_slot: u16,
    pub nodes: Vec<Node>,
}

impl Shard {
    pub fn contains_slot(&self, slot: u16) -> bool {
        slot >= self.start_slot && slot <= self.end_slot
    }

    /// The shard's master node, if the snapshot marks one.
    pub fn master(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| n.master)
    }

    pub fn has_local_node(&self) -> bool {
        self.nodes.iter().any(|n| n.myself)
    }
}

/// Immutable snapshot of the cluster layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub hash_func: HashFunc,
    pub shards: Vec<Shard>,
}

impl Topology {
    pub fn new(hash_func: HashFunc, shards: Vec<Shard>) -> Self {
        Self { hash_func, shards }
    }

    pub fn num_slots(&self) -> u16 {
        self.hash_func.num_slots()
    }

    pub fn num_shards(&self) -> usize {
        self.shards.len()
    }

    /// Index of the shard owning `slot` within this snapshot.
    pub fn shard_for_slot(&self, slot: u16) -> Option<usize> {
        self.shards.iter().position(|s| s.contains_slot(slot))
    }

    /// Checks that the snapshot is self-consistent: at least one shard, at
    /// least one node per shard, and slot ranges that are disjoint and
    /// jointly cover the whole slot space.
    pub fn validate(&self) -> Result<(), String> {
        if self.shards.is_empty() {
            return Err("topology has no shards".to_string());
        }

        let mut ranges: Vec<(u16, u16)> = Vec::with_capacity(self.shards.len());
        for (i, shard) in self.shards.iter().enumerate() {
            if shard.nodes.is_empty() {
                return Err(format!("shard {} has no nodes", i));
            }
            if shard.start_slot > shard.end_slot {
                return Err(format!(
                    "shard {} has inverted slot range {}-{}",
                    i, shard.start_slot, shard.end_slot
                ));
            }
            ranges.push((shard.start_slot, shard.end_slot));
        }

        ranges.sort_unstable();
        let num_slots = self.num_slots();

        if ranges[0].0 != 0 {
            return Err(format!("slot coverage starts at {}, expected 0", ranges[0].0));
        }
        for pair in ranges.windows(2) {
            let (_, prev_end) = pair[0];
            let (next_start, _) = pair[1];
            if next_start <= prev_end {
                return Err(format!(
                    "slot ranges overlap at {} (range ending {} vs range starting {})",
                    next_start, prev_end, next_start
                ));
            }
            if next_start != prev_end + 1 {
                return Err(format!(
                    "slot coverage gap between {} and {}",
                    prev_end, next_start
                ));
            }
        }
        let last_end = ranges[ranges.len() - 1].1;
        if last_end != num_slots - 1 {
            return Err(format!(
                "slot coverage ends at {}, expected {}",
                last_end,
                num_slots - 1
            ));
        }

        Ok(())
    }
}
