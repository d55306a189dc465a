//! `ratelimit` command group: monitor status, alert configuration, counter
//! reset, and metric export.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serenity::all::{Context, CreateEmbed, Message};
use tracing::error;

use crate::commands::{reply_embed, EMBED_COLOR_ERROR, EMBED_COLOR_INFO, EMBED_COLOR_SUCCESS};
use crate::data::settings::MonitorSettingsRepository;
use crate::error::AppError;
use crate::state::AppState;
use crate::util::parse::parse_channel_id;

pub async fn handle(
    ctx: &Context,
    state: &Arc<AppState>,
    message: &Message,
    args: &[&str],
) -> Result<(), AppError> {
    match args.first().copied() {
        None => help(ctx, state, message).await,
        Some("status") => status(ctx, state, message).await,
        Some("setchannel") => set_channel(ctx, state, message, args.get(1).copied()).await,
        Some("threshold") => set_threshold(ctx, state, message, args.get(1).copied()).await,
        Some("reset") => reset(ctx, state, message).await,
        Some("export") => export(ctx, state, message).await,
        Some(_) => help(ctx, state, message).await,
    }
}

async fn help(ctx: &Context, state: &Arc<AppState>, message: &Message) -> Result<(), AppError> {
    let prefix = &state.config.command_prefix;
    let embed = CreateEmbed::new()
        .title("Rate Limit Monitoring")
        .description("Monitor and get notified about bot rate limits")
        .color(EMBED_COLOR_INFO)
        .field(
            "Commands",
            format!(
                "`{prefix}ratelimit status` - Show current rate limit stats\n\
                 `{prefix}ratelimit setchannel <#channelID>` - Set notification channel\n\
                 `{prefix}ratelimit threshold <number>` - Set alert threshold\n\
                 `{prefix}ratelimit reset` - Reset rate limit counters\n\
                 `{prefix}ratelimit export` - Export rate limit metrics"
            ),
            false,
        );

    reply_embed(ctx, message, embed).await
}

async fn status(ctx: &Context, state: &Arc<AppState>, message: &Message) -> Result<(), AppError> {
    let now = Utc::now();
    let stats = state.monitor.stats(24, now);
    let settings = MonitorSettingsRepository::new(&state.db)
        .get_or_default()
        .await?;

    let mut embed = CreateEmbed::new()
        .title("Rate Limit Monitor Status")
        .color(EMBED_COLOR_INFO)
        .field(
            "Current Statistics",
            format!(
                "**Rate Limits (24h):** {}\n**Last 5 Minutes:** {}\n\
                 **Alert Threshold:** {}\n**Avg Retry-After:** {:.2}s",
                stats.total_events,
                state.monitor.recent_count(now),
                settings.alert_threshold,
                stats.average_retry_after
            ),
            false,
        );

    if !stats.by_endpoint.is_empty() {
        let endpoints: Vec<String> = stats
            .by_endpoint
            .iter()
            .take(10)
            .map(|e| format!("• `{}`: {} hits", e.endpoint, e.count))
            .collect();
        embed = embed.field("Affected Endpoints", endpoints.join("\n"), false);
    }

    if !stats.by_scope.is_empty() {
        let scopes: Vec<String> = stats
            .by_scope
            .iter()
            .map(|s| format!("• {}: {} hits", s.scope.as_str(), s.count))
            .collect();
        embed = embed.field("By Scope", scopes.join("\n"), false);
    }

    let channel_display = match settings.alert_channel()? {
        Some(id) => format!("<#{}>", id),
        None => "Not set".to_string(),
    };
    embed = embed.field(
        "Notifications",
        format!(
            "**Channel:** {}\n**Status:** {}",
            channel_display,
            if settings.alert_channel_id.is_some() {
                "Active"
            } else {
                "Disabled"
            }
        ),
        false,
    );

    let reports = state.monitor.shard_reports(now);
    if !reports.is_empty() {
        let lines: Vec<String> = reports
            .iter()
            .map(|r| {
                format!(
                    "**Shard {}** - {:?}, {} limits{}",
                    r.metrics.shard_id,
                    r.metrics.status,
                    r.metrics.rate_limits,
                    if r.healthy { "" } else { " (unhealthy)" }
                )
            })
            .collect();
        embed = embed.field("Shard Impact", lines.join("\n"), false);
    }

    reply_embed(ctx, message, embed).await
}

async fn set_channel(
    ctx: &Context,
    state: &Arc<AppState>,
    message: &Message,
    arg: Option<&str>,
) -> Result<(), AppError> {
    // Default to the invoking channel when no argument is given.
    let channel_id = match arg {
        Some(raw) => match parse_channel_id(raw) {
            Ok(id) => id,
            Err(_) => {
                let embed = CreateEmbed::new()
                    .title("Invalid Channel")
                    .description("Provide a channel mention or a numeric channel ID.")
                    .color(EMBED_COLOR_ERROR);
                return reply_embed(ctx, message, embed).await;
            }
        },
        None => message.channel_id.get(),
    };

    let settings = MonitorSettingsRepository::new(&state.db)
        .set_alert_channel(Some(channel_id))
        .await?;

    let embed = CreateEmbed::new()
        .title("Notification Channel Set")
        .description(format!(
            "Rate limit alerts will now be sent to <#{}>",
            channel_id
        ))
        .color(EMBED_COLOR_SUCCESS)
        .field(
            "Alert Threshold",
            format!(
                "You'll be notified after **{}** rate limits",
                settings.alert_threshold
            ),
            false,
        );

    reply_embed(ctx, message, embed).await
}

async fn set_threshold(
    ctx: &Context,
    state: &Arc<AppState>,
    message: &Message,
    arg: Option<&str>,
) -> Result<(), AppError> {
    let threshold = arg.and_then(|raw| raw.parse::<i32>().ok());

    let Some(threshold) = threshold.filter(|t| (1..=100).contains(t)) else {
        let embed = CreateEmbed::new()
            .title("Invalid Threshold")
            .description("Threshold must be between 1 and 100.")
            .color(EMBED_COLOR_ERROR);
        return reply_embed(ctx, message, embed).await;
    };

    MonitorSettingsRepository::new(&state.db)
        .set_alert_threshold(threshold)
        .await?;

    let embed = CreateEmbed::new()
        .title("Threshold Updated")
        .description(format!("Rate limit alert threshold set to **{}**", threshold))
        .color(EMBED_COLOR_SUCCESS);

    reply_embed(ctx, message, embed).await
}

async fn reset(ctx: &Context, state: &Arc<AppState>, message: &Message) -> Result<(), AppError> {
    let previous = state.monitor.stats(24, Utc::now()).total_events;
    state.monitor.reset();

    let embed = CreateEmbed::new()
        .title("Counters Reset")
        .description(format!(
            "Rate limit counters have been reset.\nPrevious count: **{}**",
            previous
        ))
        .color(EMBED_COLOR_SUCCESS);

    reply_embed(ctx, message, embed).await
}

async fn export(ctx: &Context, state: &Arc<AppState>, message: &Message) -> Result<(), AppError> {
    let filename = format!(
        "rate_limit_metrics_{}.json",
        Utc::now().format("%Y%m%d_%H%M%S")
    );

    if let Err(e) = state
        .monitor
        .export_metrics(Path::new(&filename), Utc::now())
        .await
    {
        error!("Failed to export rate limit metrics: {:?}", e);
        let embed = CreateEmbed::new()
            .title("Export Failed")
            .description(format!("Failed to export rate limit metrics: {}", e))
            .color(EMBED_COLOR_ERROR);
        return reply_embed(ctx, message, embed).await;
    }

    let embed = CreateEmbed::new()
        .title("Rate Limit Metrics Exported")
        .description(format!("Rate limit data exported to `{}`", filename))
        .color(EMBED_COLOR_SUCCESS)
        .field(
            "Exported Data",
            "Retained rate limit events\n\
             Per-shard metrics and health\n\
             24 hour statistics",
            false,
        );

    reply_embed(ctx, message, embed).await
}
