//! SPROUTS cluster process entrypoint.
//!
//! Wires the pieces together: configuration, database, the Discord client for
//! this cluster's shard range, the monitoring scheduler, and the keep-alive
//! HTTP surface. Blocks until a shutdown signal arrives, then stops the
//! scheduler and shards gracefully.

mod bot;
mod commands;
mod config;
mod data;
mod error;
mod model;
mod monitor;
mod router;
mod scheduler;
mod startup;
mod state;
mod util;
mod variables;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::error::AppError;
use crate::monitor::cluster::{ClusterManager, ClusterTopology};
use crate::monitor::gateway::GatewayObserver;
use crate::monitor::rate_limit::RateLimitMonitor;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sprouts=info,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);
    let topology = ClusterTopology::new(
        config.cluster_id,
        config.total_clusters,
        config.total_shards,
    )?;
    info!(
        "Cluster {} of {} assigned shards {}-{} ({} total), environment {}",
        topology.cluster_id,
        topology.total_clusters,
        topology.shard_range.0,
        topology.shard_range.1,
        topology.total_shards,
        config.environment.as_str()
    );

    let db = startup::connect_to_database(&config).await?;

    let cluster = Arc::new(ClusterManager::new(topology, config.environment));
    let monitor = Arc::new(RateLimitMonitor::new(topology));

    // The client is built unstarted so its cache and shard manager can back
    // the gateway observer before anything connects.
    let client = bot::start::init_bot(&config, monitor.clone()).await?;
    let discord_http = client.http.clone();
    let observer = Arc::new(GatewayObserver::new(
        client.cache.clone(),
        client.shard_manager.clone(),
        topology.total_shards,
    ));

    let state = Arc::new(AppState::new(
        db,
        config.clone(),
        cluster.clone(),
        monitor,
        observer.clone(),
    ));
    {
        let mut data = client.data.write().await;
        data.insert::<AppState>(state.clone());
    }

    let mut job_scheduler = scheduler::start_scheduler(state.clone(), discord_http).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.health_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Health routes listening on {}", addr);
    let health_router = router::router(state.clone());
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, health_router).await {
            error!("Health server error: {}", e);
        }
    });

    let bot_task = tokio::spawn(async move {
        if let Err(e) = bot::start::start_bot(client, topology).await {
            error!("Discord bot error: {}", e);
        }
    });

    wait_for_shutdown().await;

    info!("Shutdown signal received");
    cluster.begin_shutdown();
    if let Err(e) = job_scheduler.shutdown().await {
        error!("Failed to stop scheduler: {}", e);
    }
    observer.shutdown_all().await;
    bot_task.await.ok();

    info!("Cluster {} stopped", topology.cluster_id);
    Ok(())
}

/// Blocks until SIGTERM or Ctrl+C.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.ok();
    }
}
