//! Command Handler Registry and HTTP API
//!
//! Every client command is registered once at startup with its dispatch
//! recipe, coordination strategy, minimum arity, and reducer. Execution is
//! a data lookup followed by the shared routing/rewrite path; there is no
//! per-command control flow scattered around the codebase.
//!
//! The axum handlers at the bottom are the client-protocol boundary: one
//! endpoint executes commands, the rest administer the topology.

use axum::extract::Extension;
use axum::http::StatusCode;
use axum::Json;
use dashmap::DashMap;
use std::sync::Arc;

use crate::cluster::partitioner::{multiplex_command, rewrite_command, rewrite_command_arg};
use crate::cluster::store::TopologyStore;
use crate::cluster::types::Topology;
use crate::cluster::updater::TopologyUpdater;
use crate::command::{Command, CommandTable};
use crate::error::CoordinatorError;
use crate::protocol::{ClusterAckResponse, CommandRequest, ConfigUpdateRequest, Reply};
use crate::reducers::request::{arg_index, arg_index_from};
use crate::reducers::{Reducer, SearchRequest};

use super::engine::{CoordinationStrategy, Dispatch, ScatterGather};

/// The dispatch recipe applied before a command goes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Prefix rewrite plus key tagging; lands on exactly one shard.
    SingleShard,
    /// Prefix rewrite, then every key argument (index 2 onward) tagged with
    /// its own shard; multiplexed to all shards.
    MultiKeys,
    /// Prefix rewrite, then multiplexed to all shards.
    PrefixMultiplex,
    /// Strips the wrapper argument and forwards the inner command verbatim,
    /// multiplexed when it is shardable and fanned out otherwise.
    Broadcast,
    /// The search merge path with its paging and flag rewrites. Whether the
    /// dispatch stays on the local shard is carried by the strategy.
    Search,
}

/// One registered command: recipe, strategy, arity and reducer, as data.
#[derive(Debug, Clone, Copy)]
pub struct HandlerEntry {
    pub kind: HandlerKind,
    pub strategy: CoordinationStrategy,
    pub reducer: Reducer,
    pub min_args: usize,
}

/// Registry holding the mapping between command names and their entries.
pub struct HandlerRegistry {
    entries: DashMap<String, HandlerEntry>,
}

impl HandlerRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self { entries: DashMap::new() })
    }

    /// Builds the registry for the full search command set.
    pub fn with_defaults() -> Arc<Self> {
        let registry = Self::new();

        // Single-shard simple commands
        for name in [
            "FT.ADD", "FT.DEL", "FT.GET", "FT.ADDHASH", "FT.EXPLAIN",
            "FT.SUGADD", "FT.SUGGET", "FT.SUGDEL", "FT.SUGLEN",
        ] {
            registry.register(name, HandlerEntry {
                kind: HandlerKind::SingleShard,
                strategy: CoordinationStrategy::flat(),
                reducer: Reducer::PassThrough,
                min_args: 2,
            });
        }

        // Multi-shard fanout commands
        registry.register("FT.MGET", HandlerEntry {
            kind: HandlerKind::MultiKeys,
            strategy: CoordinationStrategy::masters(),
            reducer: Reducer::ParallelMerge,
            min_args: 3,
        });
        registry.register("FT.TAGVALS", HandlerEntry {
            kind: HandlerKind::PrefixMultiplex,
            strategy: CoordinationStrategy::flat(),
            reducer: Reducer::DedupUnion,
            min_args: 3,
        });
        for name in ["FT.CREATE", "FT.ALTER", "FT.DROP"] {
            registry.register(name, HandlerEntry {
                kind: HandlerKind::PrefixMultiplex,
                strategy: CoordinationStrategy::masters(),
                reducer: Reducer::AllOk,
                min_args: 2,
            });
        }
        registry.register("FT.INFO", HandlerEntry {
            kind: HandlerKind::PrefixMultiplex,
            strategy: CoordinationStrategy::flat(),
            reducer: Reducer::Chain,
            min_args: 2,
        });
        registry.register("FT.BROADCAST", HandlerEntry {
            kind: HandlerKind::Broadcast,
            strategy: CoordinationStrategy::flat(),
            reducer: Reducer::Chain,
            min_args: 2,
        });

        // Coordination search commands
        for name in ["FT.SEARCH", "FT.FSEARCH"] {
            registry.register(name, HandlerEntry {
                kind: HandlerKind::Search,
                strategy: CoordinationStrategy::masters(),
                reducer: Reducer::TopK,
                min_args: 3,
            });
        }
        registry.register("FT.LSEARCH", HandlerEntry {
            kind: HandlerKind::Search,
            strategy: CoordinationStrategy::local_masters(),
            reducer: Reducer::TopK,
            min_args: 3,
        });

        registry
    }

    /// Registers a command handler entry. Later registrations win.
    pub fn register(&self, name: &str, entry: HandlerEntry) {
        self.entries.insert(name.to_ascii_uppercase(), entry);
        tracing::debug!("Registered command handler: {}", name);
    }

    pub fn lookup(&self, name: &str) -> Option<HandlerEntry> {
        self.entries
            .get(&name.to_ascii_uppercase())
            .map(|e| *e.value())
    }

    pub fn handler_count(&self) -> usize {
        self.entries.len()
    }
}

/// Everything one request needs, shared across the HTTP layer.
pub struct AppState {
    pub table: Arc<CommandTable>,
    pub registry: Arc<HandlerRegistry>,
    pub engine: Arc<ScatterGather>,
    pub store: Arc<TopologyStore>,
    pub updater: Option<Arc<TopologyUpdater>>,
}

impl AppState {
    /// Executes one client command and returns the single outbound reply.
    pub async fn execute(&self, args: Vec<String>) -> Reply {
        let Some(name) = args.first() else {
            return Reply::Error("empty command".to_string());
        };
        let Some(entry) = self.registry.lookup(name) else {
            return Reply::Error(format!("unknown command '{}'", name));
        };
        if args.len() < entry.min_args {
            return Reply::Error(format!("wrong number of arguments for '{}'", name));
        }
        // Reject before any routing work when no topology was ever installed
        let Some(topology) = self.store.get() else {
            return CoordinatorError::ClusterNotReady.to_reply();
        };

        let (dispatch, request) = match self.prepare(&topology, entry.kind, args) {
            Ok(prepared) => prepared,
            Err(reply) => return reply,
        };

        self.engine
            .execute(dispatch, entry.strategy, entry.reducer, request)
            .await
    }

    /// Applies the registered rewrite recipe under the captured snapshot.
    fn prepare(
        &self,
        topology: &Topology,
        kind: HandlerKind,
        args: Vec<String>,
    ) -> Result<(Dispatch, Option<SearchRequest>), Reply> {
        match kind {
            HandlerKind::SingleShard => {
                let mut cmd = Command::new(args, self.table.clone());
                cmd.set_prefix("_FT");
                let part = cmd.partitioning_key();
                if part > 0 {
                    rewrite_command(topology, &mut cmd, part as usize);
                    if cmd.is_multi_key() {
                        rewrite_command_arg(topology, &mut cmd, part as usize);
                    }
                }
                Ok((Dispatch::Single(cmd), None))
            }

            HandlerKind::MultiKeys => {
                let mut cmd = Command::new(args, self.table.clone());
                cmd.set_prefix("_FT");
                for i in 2..cmd.len() {
                    rewrite_command_arg(topology, &mut cmd, i);
                }
                Ok((Dispatch::Multiplex(multiplex_command(topology, &cmd)), None))
            }

            HandlerKind::PrefixMultiplex => {
                let mut cmd = Command::new(args, self.table.clone());
                cmd.set_prefix("_FT");
                Ok((Dispatch::Multiplex(multiplex_command(topology, &cmd)), None))
            }

            HandlerKind::Broadcast => {
                let inner = Command::new(args[1..].to_vec(), self.table.clone());
                if inner.len() > 1 && inner.sharding_key() >= 0 {
                    Ok((Dispatch::Multiplex(multiplex_command(topology, &inner)), None))
                } else {
                    Ok((Dispatch::Fanout(inner), None))
                }
            }

            HandlerKind::Search => {
                let Some(req) = SearchRequest::parse(&args) else {
                    return Err(Reply::Error("Invalid search request".to_string()));
                };

                let mut cmd = Command::new(args.clone(), self.table.clone());

                // the merge needs scores from every shard even when the
                // user did not ask for them
                if !req.with_scores {
                    cmd.append_args(["WITHSCORES"]);
                }
                if !req.with_sorting_keys && req.with_sort_by {
                    cmd.append_args(["WITHSORTKEYS"]);
                }

                // LIMIT {off} {lim} becomes LIMIT 0 {off+lim}: each shard
                // must return its full candidate prefix for the merge
                if let Some(limit_pos) = arg_index_from(&args, "LIMIT", 3) {
                    if req.limit > 0 && limit_pos + 2 < args.len() {
                        cmd.replace_arg(limit_pos + 1, "0");
                        cmd.replace_arg(limit_pos + 2, (req.offset + req.limit).to_string());
                    }
                }

                // tag INKEYS filters so each shard matches its own documents
                if let Some(inkeys) = arg_index(&args, "INKEYS") {
                    if inkeys > 2 {
                        let count = args
                            .get(inkeys + 1)
                            .and_then(|v| v.parse::<usize>().ok())
                            .unwrap_or(0);
                        if count > 0 && inkeys + 1 + count < args.len() {
                            let first = inkeys + 2;
                            for i in first..(first + count).min(args.len()) {
                                rewrite_command_arg(topology, &mut cmd, i);
                            }
                        }
                    }
                }

                cmd.replace_arg(0, "_FT.SEARCH");
                Ok((
                    Dispatch::Multiplex(multiplex_command(topology, &cmd)),
                    Some(req),
                ))
            }
        }
    }
}

// --- HTTP handlers ---

pub async fn handle_command(
    Extension(state): Extension<Arc<AppState>>,
    Json(req): Json<CommandRequest>,
) -> Json<Reply> {
    Json(state.execute(req.args).await)
}

pub async fn handle_cluster_set(
    Extension(state): Extension<Arc<AppState>>,
    Json(topology): Json<Topology>,
) -> (StatusCode, Json<ClusterAckResponse>) {
    state.store.ensure_size(&topology);
    match state.store.update(topology) {
        Ok(_) => (StatusCode::OK, Json(ClusterAckResponse::ok())),
        Err(e) => {
            tracing::error!("Failed to install topology: {}", e);
            (StatusCode::BAD_REQUEST, Json(ClusterAckResponse::err(e.to_string())))
        }
    }
}

pub async fn handle_cluster_refresh(
    Extension(state): Extension<Arc<AppState>>,
) -> (StatusCode, Json<ClusterAckResponse>) {
    let Some(updater) = &state.updater else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ClusterAckResponse::err("no topology source configured")),
        );
    };
    match updater.refresh().await {
        Ok(_) => (StatusCode::OK, Json(ClusterAckResponse::ok())),
        Err(e) => {
            tracing::error!("Topology refresh failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ClusterAckResponse::err(e.to_string())),
            )
        }
    }
}

/// Hot-reloads the mutable configuration values between requests. The
/// timeout applies to requests started after the change; an in-flight
/// request keeps the deadline it derived at dispatch.
pub async fn handle_config_set(
    Extension(state): Extension<Arc<AppState>>,
    Json(update): Json<ConfigUpdateRequest>,
) -> Json<ClusterAckResponse> {
    let config = state.store.config();
    if let Some(timeout_ms) = update.timeout_ms {
        config.set_timeout_ms(timeout_ms);
        tracing::info!("Coordinator timeout set to {}ms", config.timeout_ms());
    }
    if let Some(partitions) = update.partitions {
        config.set_partitions(partitions);
        tracing::info!("Partition count set to {}", partitions);
    }
    Json(ClusterAckResponse::ok())
}

/// Cluster introspection: partitions, flavor, hash function and the full
/// shard table with per-node roles.
pub async fn handle_cluster_info(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<Reply> {
    let config = state.store.config();
    let mut items = vec![
        Reply::Status("num_partitions".to_string()),
        Reply::Int(config.partitions() as i64),
        Reply::Status("cluster_type".to_string()),
        Reply::Status(config.cluster_type().as_str().to_string()),
    ];

    match state.store.get() {
        Some(topology) => {
            items.push(Reply::Status("hash_func".to_string()));
            items.push(Reply::Status(topology.hash_func.as_str().to_string()));
            items.push(Reply::Status("num_slots".to_string()));
            items.push(Reply::Int(topology.num_slots() as i64));
            items.push(Reply::Status("slots".to_string()));
            for shard in &topology.shards {
                let mut entry = vec![
                    Reply::Int(shard.start_slot as i64),
                    Reply::Int(shard.end_slot as i64),
                ];
                for node in &shard.nodes {
                    let role = format!(
                        "{}{}",
                        if node.master { "master " } else { "slave " },
                        if node.myself { "self" } else { "" }
                    );
                    entry.push(Reply::Array(vec![
                        Reply::Status(node.id.clone()),
                        Reply::Status(node.endpoint.host.clone()),
                        Reply::Int(node.endpoint.port as i64),
                        Reply::Status(role.trim_end().to_string()),
                    ]));
                }
                items.push(Reply::Array(entry));
            }
        }
        None => {
            items.push(Reply::Status("hash_func".to_string()));
            items.push(Reply::Status("n/a".to_string()));
            items.push(Reply::Status("num_slots".to_string()));
            items.push(Reply::Int(0));
            items.push(Reply::Status("slots".to_string()));
            items.push(Reply::Nil);
        }
    }

    Json(Reply::Array(items))
}
