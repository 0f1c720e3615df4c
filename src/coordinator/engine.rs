//! Scatter-Gather Engine
//!
//! Dispatches one logical request as concurrent shard calls and joins them
//! into a single reducer invocation. The caller thread never blocks past
//! dispatch: every shard call runs in its own task and the engine awaits the
//! handles in dispatch order, so reducers always see replies indexed by
//! dispatch order regardless of arrival order.
//!
//! One shared deadline (the configured coordinator timeout) covers the whole
//! request; a call that misses it contributes a `Nil` entry and its task is
//! aborted best-effort. A failed call contributes an `Error` entry. Either
//! way every dispatched slot counts toward completion, so the reducer runs
//! exactly once, with the full positional reply set.

use std::sync::Arc;

use rand::Rng;
use tokio::time::{Duration, Instant};

use crate::cluster::partitioner::shard_for_key;
use crate::cluster::store::TopologyStore;
use crate::cluster::types::{Node, Shard, Topology};
use crate::command::Command;
use crate::error::CoordinatorError;
use crate::protocol::Reply;
use crate::reducers::{Reducer, SearchRequest};

use super::transport::ShardTransport;

/// Node-selection scope for one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinationStrategy {
    /// Only ask each shard's master, avoiding duplicate answers from
    /// replicas.
    pub masters_only: bool,
    /// Restrict dispatch to the shard co-located with this coordinator.
    pub local_shard_only: bool,
}

impl CoordinationStrategy {
    pub fn flat() -> Self {
        Self::default()
    }

    pub fn masters() -> Self {
        Self { masters_only: true, local_shard_only: false }
    }

    pub fn local_masters() -> Self {
        Self { masters_only: true, local_shard_only: true }
    }
}

/// The dispatch shape of one logical request.
#[derive(Debug)]
pub enum Dispatch {
    /// One command routed to the single shard owning its key.
    Single(Command),
    /// One pre-rewritten command per shard, in topology order.
    Multiplex(Vec<Command>),
    /// The identical command sent to every shard.
    Fanout(Command),
}

pub struct ScatterGather {
    store: Arc<TopologyStore>,
    transport: Arc<dyn ShardTransport>,
}

impl ScatterGather {
    pub fn new(store: Arc<TopologyStore>, transport: Arc<dyn ShardTransport>) -> Arc<Self> {
        Arc::new(Self { store, transport })
    }

    /// Runs one logical request end to end and returns the reducer's reply.
    ///
    /// `request` is the call's private context, handed to the reducer
    /// untouched and dropped afterwards.
    pub async fn execute(
        &self,
        dispatch: Dispatch,
        strategy: CoordinationStrategy,
        reducer: Reducer,
        request: Option<SearchRequest>,
    ) -> Reply {
        let Some(topology) = self.store.get() else {
            return CoordinatorError::ClusterNotReady.to_reply();
        };

        let targets = match self.select_targets(&topology, dispatch, strategy) {
            Ok(t) => t,
            Err(msg) => return Reply::Error(msg),
        };

        let op_id = uuid::Uuid::new_v4();
        let deadline =
            Instant::now() + Duration::from_millis(self.store.config().timeout_ms());
        tracing::debug!(
            "op {}: dispatching {} shard call(s), reducer {:?}",
            op_id,
            targets.len(),
            reducer
        );

        let mut handles = Vec::with_capacity(targets.len());
        for (node, cmd) in targets {
            let transport = self.transport.clone();
            handles.push(tokio::spawn(async move {
                transport.dispatch(&node, &cmd).await
            }));
        }

        // Join in dispatch order so arrival order never leaks into the
        // reply vector the reducer observes.
        let mut replies = Vec::with_capacity(handles.len());
        for handle in handles {
            let abort = handle.abort_handle();
            let entry = match tokio::time::timeout_at(deadline, handle).await {
                Ok(Ok(Ok(reply))) => reply,
                Ok(Ok(Err(e))) => {
                    tracing::warn!("op {}: shard call failed: {}", op_id, e);
                    CoordinatorError::Dispatch(e.to_string()).to_reply()
                }
                Ok(Err(join_err)) => {
                    tracing::error!("op {}: dispatch task died: {}", op_id, join_err);
                    CoordinatorError::Dispatch("dispatch task failed".to_string()).to_reply()
                }
                Err(_) => {
                    // shared deadline passed; abandon the call
                    abort.abort();
                    tracing::warn!("op {}: shard call timed out", op_id);
                    Reply::Nil
                }
            };
            replies.push(entry);
        }

        // every slot has completed (value, error or timeout); reduce once
        reducer.reduce(replies, request.as_ref())
    }

    /// Resolves the dispatch shape into concrete (node, command) pairs under
    /// the captured topology snapshot.
    fn select_targets(
        &self,
        topology: &Topology,
        dispatch: Dispatch,
        strategy: CoordinationStrategy,
    ) -> Result<Vec<(Node, Command)>, String> {
        match dispatch {
            Dispatch::Single(cmd) => {
                let key_pos = cmd.sharding_key().max(1) as usize;
                let Some(key) = cmd.arg(key_pos) else {
                    return Err(format!("command '{}' is missing its routing key", cmd.name()));
                };
                let Some(owner) = shard_for_key(topology, key) else {
                    return Err(format!("no shard owns key '{}'", key));
                };
                let node = pick_node(&topology.shards[owner], strategy);
                Ok(vec![(node, cmd)])
            }
            Dispatch::Multiplex(commands) => Ok(topology
                .shards
                .iter()
                .zip(commands)
                .filter(|(shard, _)| !strategy.local_shard_only || shard.has_local_node())
                .map(|(shard, cmd)| (pick_node(shard, strategy), cmd))
                .collect()),
            Dispatch::Fanout(cmd) => Ok(topology
                .shards
                .iter()
                .filter(|shard| !strategy.local_shard_only || shard.has_local_node())
                .map(|shard| (pick_node(shard, strategy), cmd.clone()))
                .collect()),
        }
    }
}

/// Picks one representative node of a shard for this dispatch.
fn pick_node(shard: &Shard, strategy: CoordinationStrategy) -> Node {
    if strategy.masters_only {
        if let Some(master) = shard.master() {
            return master.clone();
        }
    }
    let idx = rand::thread_rng().gen_range(0..shard.nodes.len());
    shard.nodes[idx].clone()
}
