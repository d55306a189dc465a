//! Tick bodies for the monitoring scheduler.

use chrono::Utc;
use serenity::all::{ChannelId, CreateEmbed, CreateMessage};
use serenity::http::Http;
use tracing::{info, warn};

use crate::data::settings::MonitorSettingsRepository;
use crate::error::AppError;
use crate::state::AppState;

const ALERT_COLOR: u32 = 0xFF0000;

/// Refreshes the cluster snapshot from the live gateway.
pub async fn run_heartbeat(state: &AppState) {
    let gateway = state.observer.sample().await;
    state.cluster.heartbeat(&gateway);
}

/// Folds the latest gateway samples into the per-shard metrics.
pub async fn run_shard_monitor(state: &AppState) {
    let gateway = state.observer.sample().await;
    state.monitor.observe_shards(&gateway, Utc::now());
}

/// Logs warnings for high guild density or memory pressure.
pub async fn run_health_check(state: &AppState) {
    let gateway = state.observer.sample().await;
    state.cluster.health_check(&gateway);
}

/// Drops expired rate-limit events and truncates the window.
pub async fn run_cleanup(state: &AppState) {
    state.monitor.cleanup(Utc::now());
}

/// Evaluates the five-minute rate-limit window and sends an alert embed to
/// the configured channel when the threshold gate fires.
///
/// Short-circuits silently when no alert channel is configured.
pub async fn run_alert_check(state: &AppState, http: &Http) -> Result<(), AppError> {
    let settings = MonitorSettingsRepository::new(&state.db)
        .get_or_default()
        .await?;

    let Some(channel_id) = settings.alert_channel()? else {
        return Ok(());
    };

    let threshold = settings.alert_threshold.max(1) as usize;
    let Some(events) = state.monitor.take_alert_batch(threshold, Utc::now()) else {
        return Ok(());
    };

    warn!(
        "Rate limit alert: {} events in the last 5 minutes (threshold {})",
        events.len(),
        threshold
    );

    // Group events by endpoint, busiest first.
    let mut endpoint_counts: std::collections::BTreeMap<&str, usize> =
        std::collections::BTreeMap::new();
    for event in &events {
        *endpoint_counts.entry(event.endpoint.as_str()).or_insert(0) += 1;
    }
    let mut endpoints: Vec<(&str, usize)> = endpoint_counts.into_iter().collect();
    endpoints.sort_by(|a, b| b.1.cmp(&a.1));

    let topology = state.cluster.topology();
    let mut embed = CreateEmbed::new()
        .title("\u{1f6a8} Rate Limit Alert")
        .description(format!(
            "Detected {} rate limits in the last 5 minutes",
            events.len()
        ))
        .color(ALERT_COLOR);

    if !endpoints.is_empty() {
        let lines: Vec<String> = endpoints
            .iter()
            .take(10)
            .map(|(endpoint, count)| format!("• `{}`: {} hits", endpoint, count))
            .collect();
        embed = embed.field("Affected Endpoints", lines.join("\n"), false);
    }

    let shard_lines: Vec<String> = state
        .monitor
        .shard_reports(Utc::now())
        .iter()
        .filter(|r| r.metrics.rate_limits > 0)
        .take(5)
        .map(|r| format!("Shard {}: {} limits", r.metrics.shard_id, r.metrics.rate_limits))
        .collect();
    if !shard_lines.is_empty() {
        embed = embed.field("Shard Impact", shard_lines.join("\n"), false);
    }

    embed = embed.field(
        "Cluster Info",
        format!(
            "Cluster ID: {}\nShards: {}-{}",
            topology.cluster_id, topology.shard_range.0, topology.shard_range.1
        ),
        true,
    );

    ChannelId::new(channel_id)
        .send_message(http, CreateMessage::new().embed(embed))
        .await?;

    info!("Rate limit alert sent to channel {}", channel_id);

    Ok(())
}
