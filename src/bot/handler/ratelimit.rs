//! Rate-limit ingestion hook.
//!
//! Serenity surfaces every HTTP 429 through this event. The hook runs without
//! a gateway context, so it writes straight into the monitor held by the
//! handler.

use chrono::Utc;
use serenity::all::RatelimitInfo;

use crate::monitor::rate_limit::{RateLimitEvent, RateLimitMonitor, RateLimitScope};

/// Records one rate-limit hit into the monitor.
pub fn handle_ratelimit(monitor: &RateLimitMonitor, data: RatelimitInfo) {
    let topology = monitor.topology();

    let scope = RateLimitScope::classify(data.global, &data.path);

    monitor.record(RateLimitEvent {
        timestamp: Utc::now(),
        endpoint: data.path,
        retry_after: data.timeout.as_secs_f64(),
        scope,
        // The 429 signal does not identify the limited bucket.
        guild_id: None,
        channel_id: None,
        user_id: None,
        // HTTP rate limits carry no shard attribution; charge the cluster's
        // lowest shard so the per-shard counters stay meaningful.
        shard_id: Some(topology.shard_range.0),
        cluster_id: topology.cluster_id,
    });
}
