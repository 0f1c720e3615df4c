//! Cluster Topology Module
//!
//! Maintains the coordinator's view of the sharded cluster and everything
//! derived from it: slot hashing, key-to-shard routing, and command
//! multiplexing.
//!
//! ## Core Concepts
//! - **Slots**: routing keys hash to a fixed slot space (16384 slots under
//!   CRC16, 4096 under CRC12); each shard owns one contiguous slot range.
//! - **Snapshots**: the topology is an immutable snapshot behind an
//!   atomically swapped reference. In-flight requests keep the snapshot they
//!   captured; updates never mutate in place.
//! - **Reconciliation**: the updater consumes full replacement snapshots from
//!   the membership source, and `ensure_size` keeps the logical partition
//!   count in step with the live shard count when running in AUTO mode.
//!
//! ## Submodules
//! - **`slots`**: Hash functions and the key-to-slot mapping.
//! - **`types`**: Topology, shard and node records plus validation.
//! - **`store`**: The atomically swapped current-topology store.
//! - **`partitioner`**: Shard tags, key rewriting, and command multiplexing.
//! - **`updater`**: Background and on-demand topology refresh.

pub mod partitioner;
pub mod slots;
pub mod store;
pub mod types;
pub mod updater;

pub use store::TopologyStore;
pub use types::{Endpoint, Node, Shard, Topology};

#[cfg(test)]
mod tests;
