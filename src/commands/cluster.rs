//! `cluster` command group: dashboard, shard health, scaling analysis, and
//! metric export.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serenity::all::{Context, CreateEmbed, Message};
use tracing::error;

use crate::commands::{reply_embed, EMBED_COLOR_ERROR, EMBED_COLOR_INFO, EMBED_COLOR_SUCCESS};
use crate::error::AppError;
use crate::monitor::cluster::ClusterStats;
use crate::state::AppState;

/// Shards rendered per embed field before starting a new one.
const SHARD_CHUNK_SIZE: usize = 8;

pub async fn handle(
    ctx: &Context,
    state: &Arc<AppState>,
    message: &Message,
    args: &[&str],
) -> Result<(), AppError> {
    match args.first().copied() {
        None | Some("info") | Some("status") => info(ctx, state, message).await,
        Some("shards") | Some("sh") => shards(ctx, state, message).await,
        Some("optimize") | Some("recommendations") | Some("rec") => {
            optimize(ctx, state, message).await
        }
        Some("export") | Some("dump") => export(ctx, state, message).await,
        Some(_) => info(ctx, state, message).await,
    }
}

async fn current_stats(state: &AppState) -> ClusterStats {
    let gateway = state.observer.sample().await;
    state.cluster.stats(&gateway)
}

async fn info(ctx: &Context, state: &Arc<AppState>, message: &Message) -> Result<(), AppError> {
    let stats = current_stats(state).await;
    let info = &stats.cluster_info;
    let prefix = &state.config.command_prefix;

    let load_label = if stats.recommendations.current_efficiency >= 80.0 {
        "Optimal"
    } else if stats.recommendations.current_efficiency >= 60.0 {
        "Moderate"
    } else {
        "High"
    };

    let embed = CreateEmbed::new()
        .title("SPROUTS Cluster Dashboard")
        .description("Multi-instance deployment and shard distribution management")
        .color(EMBED_COLOR_INFO)
        .field(
            "Cluster Information",
            format!(
                "**Cluster ID:** {}\n**Instance:** `{}`\n**Environment:** {:?}\n**Status:** {:?}",
                info.cluster_id, info.instance_id, info.environment, info.status
            ),
            true,
        )
        .field(
            "Shard Distribution",
            format!(
                "**Assigned Range:** {}-{}\n**Total Shards:** {}\n**Guilds/Shard:** {:.1}\n**Efficiency:** {:.1}%",
                info.shard_range.0,
                info.shard_range.1,
                info.total_shards,
                stats.performance.guilds_per_shard,
                stats.recommendations.current_efficiency
            ),
            true,
        )
        .field(
            "Performance",
            format!(
                "**Guilds:** {}\n**Users:** {}\n**Users/Guild:** {:.1}\n**Growth Rate:** {:.1}/hr",
                info.guilds,
                info.users,
                stats.performance.users_per_guild,
                stats.performance.guilds_per_hour
            ),
            true,
        )
        .field(
            "Optimization Recommendations",
            format!(
                "**Optimal Shards:** {}\n**Recommended Clusters:** {}\n**Current Load:** {}",
                stats.recommendations.optimal_shards,
                stats.recommendations.recommended_clusters,
                load_label
            ),
            false,
        )
        .field(
            "Health Status",
            format!(
                "**Uptime:** {}\n**Started:** {}\n**Version:** {}",
                stats.uptime_human,
                state.cluster.start_time().format("%m/%d %H:%M"),
                info.version
            ),
            true,
        )
        .field(
            "Available Commands",
            format!(
                "`{prefix}cluster info` - This information\n\
                 `{prefix}cluster shards` - Shard health summary\n\
                 `{prefix}cluster export` - Export cluster metrics\n\
                 `{prefix}cluster optimize` - Optimization suggestions"
            ),
            true,
        );

    reply_embed(ctx, message, embed).await
}

async fn shards(ctx: &Context, state: &Arc<AppState>, message: &Message) -> Result<(), AppError> {
    let stats = current_stats(state).await;

    let mut embed = CreateEmbed::new()
        .title("Cluster Shard Health")
        .description(format!(
            "Shards managed by Cluster {}",
            stats.cluster_info.cluster_id
        ))
        .color(EMBED_COLOR_INFO);

    if stats.shard_health.is_empty() {
        embed = embed.field(
            "No Shard Data",
            "No shard health information available for this cluster.",
            false,
        );
        return reply_embed(ctx, message, embed).await;
    }

    let total = stats.shard_health.len();
    let connected = stats
        .shard_health
        .values()
        .filter(|s| s.connected)
        .count();
    let avg_latency = average_latency(stats.shard_health.values().map(|s| s.latency_ms));
    let total_guilds: u64 = stats.shard_health.values().map(|s| s.guilds).sum();

    embed = embed.field(
        "Cluster Health Summary",
        format!(
            "**Connected:** {}/{} ({:.1}%)\n**Avg Latency:** {:.1}ms\n**Total Guilds:** {}",
            connected,
            total,
            connected as f64 / total.max(1) as f64 * 100.0,
            avg_latency,
            total_guilds
        ),
        false,
    );

    let details: Vec<String> = stats
        .shard_health
        .iter()
        .map(|(shard_id, health)| {
            let marker = match (health.connected, health.latency_ms) {
                (true, Some(l)) if l < 500.0 => "\u{2705}",
                (true, _) => "\u{26a0}\u{fe0f}",
                (false, _) => "\u{274c}",
            };
            format!(
                "{} **Shard {}** - {:.0}ms | {} guilds",
                marker,
                shard_id,
                health.latency_ms.unwrap_or(0.0),
                health.guilds
            )
        })
        .collect();

    for (index, chunk) in details.chunks(SHARD_CHUNK_SIZE).enumerate() {
        let name = if details.len() > SHARD_CHUNK_SIZE {
            format!("Shards ({})", index + 1)
        } else {
            "Shard Details".to_string()
        };
        embed = embed.field(name, chunk.join("\n"), true);
    }

    reply_embed(ctx, message, embed).await
}

/// Mean latency across shards that have reported a heartbeat. Shards still
/// waiting on their first sample do not dilute the average.
fn average_latency(latencies: impl Iterator<Item = Option<f64>>) -> f64 {
    let samples: Vec<f64> = latencies.flatten().collect();
    if samples.is_empty() {
        0.0
    } else {
        samples.iter().sum::<f64>() / samples.len() as f64
    }
}

async fn optimize(ctx: &Context, state: &Arc<AppState>, message: &Message) -> Result<(), AppError> {
    let stats = current_stats(state).await;
    let info = &stats.cluster_info;
    let guilds_per_shard = stats.performance.guilds_per_shard;

    let (priority, action) = if guilds_per_shard > 2000.0 {
        ("**HIGH PRIORITY**", "Consider adding more shards immediately")
    } else if guilds_per_shard > 1500.0 {
        ("**MEDIUM PRIORITY**", "Plan for additional shards soon")
    } else if guilds_per_shard < 500.0 {
        ("**LOW PRIORITY**", "Current configuration is efficient")
    } else {
        ("**OPTIMAL**", "No immediate changes needed")
    };

    let scaling_advice = if info.guilds > 10_000 {
        "**Large Scale Deployment**\n\
         • Use multiple clusters for redundancy\n\
         • Monitor shard distribution carefully\n\
         • Consider geographic distribution\n\
         • Implement health monitoring"
    } else if info.guilds > 2_000 {
        "**Medium Scale Deployment**\n\
         • Single cluster should suffice\n\
         • Monitor growth trends\n\
         • Plan for future scaling\n\
         • Optimize shard count"
    } else {
        "**Small Scale Deployment**\n\
         • Single shard configuration optimal\n\
         • Focus on feature development\n\
         • Monitor for growth\n\
         • Simple deployment preferred"
    };

    let embed = CreateEmbed::new()
        .title("Cluster Optimization Analysis")
        .description("Scaling recommendations based on current performance")
        .color(EMBED_COLOR_INFO)
        .field(
            "Current Configuration",
            format!(
                "**Guilds:** {}\n**Shards:** {}\n**Clusters:** {}\n**Efficiency:** {:.1}%",
                info.guilds,
                info.total_shards,
                state.cluster.topology().total_clusters,
                stats.recommendations.current_efficiency
            ),
            true,
        )
        .field(
            "Optimization Recommendations",
            format!(
                "**Optimal Shards:** {}\n**Recommended Clusters:** {}\n\
                 **Target Guilds/Shard:** ~1000\n**Target Guilds/Cluster:** ~5000",
                stats.recommendations.optimal_shards,
                stats.recommendations.recommended_clusters
            ),
            true,
        )
        .field(
            "Load Analysis",
            format!(
                "{}\n**Guilds/Shard:** {:.1}\n**Action:** {}",
                priority, guilds_per_shard, action
            ),
            false,
        )
        .field("Scaling Guidance", scaling_advice, false);

    reply_embed(ctx, message, embed).await
}

async fn export(ctx: &Context, state: &Arc<AppState>, message: &Message) -> Result<(), AppError> {
    let filename = format!("cluster_metrics_{}.json", Utc::now().format("%Y%m%d_%H%M%S"));
    let gateway = state.observer.sample().await;

    if let Err(e) = state.cluster.export(Path::new(&filename), &gateway).await {
        error!("Failed to export cluster metrics: {:?}", e);
        let embed = CreateEmbed::new()
            .title("Export Failed")
            .description(format!("Failed to export cluster metrics: {}", e))
            .color(EMBED_COLOR_ERROR);
        return reply_embed(ctx, message, embed).await;
    }

    let embed = CreateEmbed::new()
        .title("Cluster Metrics Exported")
        .description(format!(
            "Comprehensive cluster data exported to `{}`",
            filename
        ))
        .color(EMBED_COLOR_SUCCESS)
        .field(
            "Exported Data",
            "Cluster configuration and status\n\
             Performance metrics and statistics\n\
             Shard health and distribution\n\
             Optimization recommendations\n\
             Uptime and historical data",
            false,
        );

    reply_embed(ctx, message, embed).await
}
