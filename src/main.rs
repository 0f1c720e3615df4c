use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use clap::Parser;
use search_coordinator::cluster::store::TopologyStore;
use search_coordinator::cluster::updater::{HttpTopologySource, TopologyUpdater};
use search_coordinator::command::CommandTable;
use search_coordinator::config::{ClusterConfig, ClusterType, DEFAULT_TIMEOUT_MS};
use search_coordinator::coordinator::handlers::{
    handle_cluster_info, handle_cluster_refresh, handle_cluster_set, handle_command,
    handle_config_set, AppState, HandlerRegistry,
};
use search_coordinator::coordinator::transport::HttpShardTransport;
use search_coordinator::coordinator::ScatterGather;
use search_coordinator::protocol::{
    ENDPOINT_CLUSTER_INFO, ENDPOINT_CLUSTER_REFRESH, ENDPOINT_CLUSTER_SET, ENDPOINT_COMMAND,
    ENDPOINT_CONFIG,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "search-coordinator", about = "Sharded search cluster coordinator")]
struct Cli {
    /// Address the client-facing HTTP API binds to
    #[arg(long, default_value = "127.0.0.1:7400")]
    bind: String,
    /// Logical partition count; 0 means AUTO (follow the live shard count)
    #[arg(long, default_value_t = 0)]
    partitions: usize,
    /// Coordinator timeout in milliseconds, shared by every shard call of
    /// one request
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,
    /// Run against an enterprise cluster (CRC12 over 4096 slots) instead of
    /// an open one (CRC16 over 16384 slots)
    #[arg(long)]
    enterprise: bool,
    /// URL serving the cluster membership view as a topology snapshot;
    /// without it the topology must be pushed via /cluster/set
    #[arg(long)]
    topology_url: Option<String>,
    /// Seconds between background topology refreshes
    #[arg(long, default_value_t = 5)]
    refresh_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();
    let bind_addr: SocketAddr = cli.bind.parse()?;

    let cluster_type = if cli.enterprise {
        ClusterType::Enterprise
    } else {
        ClusterType::Open
    };

    tracing::info!(
        "Cluster configuration: {} partitions ({}), type: {}, coordinator timeout: {}ms",
        cli.partitions,
        if cli.partitions == 0 { "auto" } else { "fixed" },
        cluster_type.as_str(),
        cli.timeout_ms
    );

    // 1. Shared configuration and the topology store:
    let config = Arc::new(ClusterConfig::new(cluster_type, cli.partitions, cli.timeout_ms));
    let store = TopologyStore::new(config.clone());

    // 2. Command routing table and handler registry:
    let table = Arc::new(CommandTable::with_defaults());
    let registry = HandlerRegistry::with_defaults();
    tracing::info!(
        "Registered {} command handlers over {} routing table entries",
        registry.handler_count(),
        table.len()
    );

    // 3. Scatter-gather engine over the HTTP shard transport:
    let transport = HttpShardTransport::new(config.clone());
    let engine = ScatterGather::new(store.clone(), transport);

    // 4. Topology updater (background refresh), when a source is configured:
    let updater = cli.topology_url.map(|url| {
        let source = Arc::new(HttpTopologySource::new(url));
        TopologyUpdater::new(
            store.clone(),
            source,
            Duration::from_secs(cli.refresh_secs),
        )
    });
    if let Some(updater) = &updater {
        updater.clone().start();
    } else {
        tracing::info!("No topology source configured, waiting for /cluster/set");
    }

    let state = Arc::new(AppState {
        table,
        registry,
        engine,
        store,
        updater,
    });

    // 5. HTTP router:
    let app = Router::new()
        .route(ENDPOINT_COMMAND, post(handle_command))
        .route(ENDPOINT_CLUSTER_SET, post(handle_cluster_set))
        .route(ENDPOINT_CLUSTER_REFRESH, post(handle_cluster_refresh))
        .route(ENDPOINT_CLUSTER_INFO, get(handle_cluster_info))
        .route(ENDPOINT_CONFIG, post(handle_config_set))
        .layer(Extension(state));

    tracing::info!("Coordinator listening on {}", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
