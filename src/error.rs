//! Coordinator Error Types
//!
//! Partial failure is the normal case here, not the exception: a failed or
//! timed-out shard call is recorded positionally as data and never aborts a
//! request. The variants below cover the cases that do surface.

use thiserror::Error;

use crate::protocol::Reply;

/// Fixed message returned for any routed command received before a topology
/// snapshot has been installed.
pub const CLUSTER_NOT_READY: &str =
    "Uninitialized cluster state, could not perform command";

#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// No topology has ever been installed; rejected before any dispatch.
    #[error("Uninitialized cluster state, could not perform command")]
    ClusterNotReady,

    /// A topology update would leave the cluster view inconsistent.
    /// The previous topology stays active.
    #[error("invalid topology: {0}")]
    Topology(String),

    /// A reducer could not produce any usable result.
    #[error("{0}")]
    Reduction(String),

    /// A shard call failed outright (transport-level, after retries).
    #[error("shard dispatch failed: {0}")]
    Dispatch(String),
}

impl CoordinatorError {
    /// Project the error onto the client-facing reply type.
    pub fn to_reply(&self) -> Reply {
        Reply::Error(self.to_string())
    }
}
