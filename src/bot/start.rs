use serenity::all::{Client, GatewayIntents};
use tracing::info;

use crate::bot::handler::Handler;
use crate::config::Config;
use crate::error::AppError;
use crate::monitor::cluster::ClusterTopology;
use crate::monitor::rate_limit::RateLimitMonitor;
use std::sync::Arc;

/// Builds the Discord client for this cluster.
///
/// The client is returned unstarted so the caller can wire the gateway
/// observer and application state (which need the client's cache and shard
/// manager) before connecting.
///
/// # Arguments
/// - `config` - Application configuration with the bot token
/// - `monitor` - Rate-limit monitor fed by the ratelimit hook
///
/// # Returns
/// - `Ok(Client)` - Built client ready to start
/// - `Err(AppError)` - Client construction failed
pub async fn init_bot(config: &Config, monitor: Arc<RateLimitMonitor>) -> Result<Client, AppError> {
    // MESSAGE_CONTENT is a privileged intent - must be enabled in the
    // Discord Developer Portal
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let handler = Handler::new(monitor);

    let client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await?;

    Ok(client)
}

/// Starts the Discord bot in a blocking manner.
///
/// Should be called from within a tokio::spawn task since it blocks until
/// the bot shuts down. Multi-shard deployments connect only this cluster's
/// shard range; a single-shard topology uses the plain start path.
///
/// # Arguments
/// - `client` - Built client from `init_bot`
/// - `topology` - This cluster's shard assignment
///
/// # Returns
/// - `Ok(())` - Bot ran and shut down cleanly
/// - `Err(AppError)` - Gateway connection failed
pub async fn start_bot(mut client: Client, topology: ClusterTopology) -> Result<(), AppError> {
    let (min_shard, max_shard) = topology.shard_range;

    if topology.total_shards > 1 {
        info!(
            "Starting Discord bot on shards {}-{} of {}",
            min_shard, max_shard, topology.total_shards
        );
        client
            .start_shard_range(gateway_shard_range(&topology), topology.total_shards)
            .await?;
    } else {
        info!("Starting Discord bot on a single shard");
        client.start().await?;
    }

    Ok(())
}

/// Converts the topology's inclusive shard range into the half-open range
/// the gateway client expects. The `+ 1` keeps the cluster's top shard in
/// the connection set.
fn gateway_shard_range(topology: &ClusterTopology) -> std::ops::Range<u32> {
    let (min_shard, max_shard) = topology.shard_range;
    min_shard..max_shard + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_range_includes_top_shard() {
        // Cluster 1 of 4 over 8 shards owns shards 2 and 3 inclusive.
        let topology = ClusterTopology::new(1, 4, 8).unwrap();
        let range = gateway_shard_range(&topology);

        assert_eq!(range, 2..4);
        assert!(range.contains(&3));
    }

    #[test]
    fn gateway_range_covers_single_shard_clusters() {
        let topology = ClusterTopology::new(0, 1, 1).unwrap();
        let range = gateway_shard_range(&topology);

        assert_eq!(range, 0..1);
        assert_eq!(range.len(), 1);
    }
}
