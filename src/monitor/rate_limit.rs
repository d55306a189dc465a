//! Rate-limit event tracking and shard health monitoring.
//!
//! Every HTTP 429 surfaced by the Discord client is recorded into a bounded
//! rolling window (24 hours, newest 1000 events). A scheduler job counts the
//! events of the last five minutes and fires an alert whenever the count
//! reaches a fresh multiple of the configured threshold, so a sustained storm
//! alerts repeatedly without spamming on every event.
//!
//! Shard connection state is folded in from gateway snapshots so one owner
//! command can answer "which shards are slow and which are getting limited".

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::AppError;
use crate::monitor::cluster::ClusterTopology;
use crate::monitor::gateway::{GatewaySnapshot, ShardStage};

/// Maximum events retained after a cleanup pass.
const MAX_EVENTS: usize = 1000;
/// Events older than this are dropped by cleanup.
const RETENTION_HOURS: i64 = 24;
/// Window used for alert counting.
const ALERT_WINDOW_SECONDS: i64 = 300;
/// Latency above which a connected shard is reported as degraded.
const DEGRADED_LATENCY_MS: f64 = 500.0;
/// A shard metric older than this is considered stale and unhealthy.
const HEALTHY_MAX_AGE_SECONDS: i64 = 120;
/// Latency at or above this marks a shard unhealthy regardless of status.
const HEALTHY_MAX_LATENCY_MS: f64 = 1000.0;

/// What a 429 applied to: the whole bot, or one guild/channel/user bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitScope {
    Global,
    Guild,
    Channel,
    User,
    Unknown,
}

impl RateLimitScope {
    /// Classifies a rate limit from the global flag and the limited path.
    /// The HTTP client reports only whether the limit was global; bucket
    /// scope is inferred from the route.
    pub fn classify(global: bool, path: &str) -> Self {
        if global {
            RateLimitScope::Global
        } else if path.starts_with("/guilds") {
            RateLimitScope::Guild
        } else if path.starts_with("/channels") {
            RateLimitScope::Channel
        } else if path.starts_with("/users") {
            RateLimitScope::User
        } else {
            RateLimitScope::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitScope::Global => "global",
            RateLimitScope::Guild => "guild",
            RateLimitScope::Channel => "channel",
            RateLimitScope::User => "user",
            RateLimitScope::Unknown => "unknown",
        }
    }
}

/// Connection status of one shard, derived from gateway samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShardStatus {
    /// No gateway sample observed yet.
    Unknown,
    Connected,
    Degraded,
    Reconnecting,
    Disconnected,
}

/// One recorded rate-limit hit.
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitEvent {
    pub timestamp: DateTime<Utc>,
    /// Request path that was limited, e.g. `/channels/{id}/messages`.
    pub endpoint: String,
    /// Seconds Discord asked us to wait before retrying.
    pub retry_after: f64,
    pub scope: RateLimitScope,
    /// Bucket identifiers when the signal carries them.
    pub guild_id: Option<u64>,
    pub channel_id: Option<u64>,
    pub user_id: Option<u64>,
    /// Shard the limited request is attributed to, when known.
    pub shard_id: Option<u32>,
    pub cluster_id: u32,
}

/// Rolling per-shard metrics, refreshed by the shard monitor job.
#[derive(Debug, Clone, Serialize)]
pub struct ShardMetrics {
    pub shard_id: u32,
    pub status: ShardStatus,
    pub latency_ms: Option<f64>,
    pub guilds: u64,
    /// Total rate limits attributed to this shard since startup or reset.
    pub rate_limits: u64,
    /// Gateway observations folded into this record since startup.
    pub events_processed: u64,
    pub last_updated: DateTime<Utc>,
}

/// Shard metrics plus the derived health verdict, for status rendering.
#[derive(Debug, Clone, Serialize)]
pub struct ShardHealthReport {
    #[serde(flatten)]
    pub metrics: ShardMetrics,
    pub healthy: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EndpointCount {
    pub endpoint: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScopeCount {
    pub scope: RateLimitScope,
    pub count: u64,
}

/// Aggregated view of the event window, rendered by `ratelimit status` and
/// embedded in exports.
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitStats {
    pub window_hours: i64,
    pub total_events: u64,
    /// Endpoints sorted by hit count, highest first.
    pub by_endpoint: Vec<EndpointCount>,
    /// Scopes sorted by hit count, highest first.
    pub by_scope: Vec<ScopeCount>,
    /// Mean retry-after across the window, seconds.
    pub average_retry_after: f64,
    /// Current per-shard metrics table, ordered by shard id.
    pub shard_metrics: Vec<ShardMetrics>,
}

/// Decides whether an alert fires for a five-minute event count.
///
/// Fires exactly when the count is a fresh non-zero multiple of the
/// threshold; between multiples the storm keeps accumulating silently.
pub fn should_alert(count: usize, threshold: usize) -> bool {
    threshold > 0 && count >= threshold && count % threshold == 0
}

/// Health verdict for a shard metric: fresh data and acceptable latency.
/// A shard with no heartbeat yet is unhealthy.
pub fn is_healthy(metrics: &ShardMetrics, now: DateTime<Utc>) -> bool {
    let fresh = (now - metrics.last_updated).num_seconds() < HEALTHY_MAX_AGE_SECONDS;
    let latency_ok = metrics
        .latency_ms
        .map(|l| l < HEALTHY_MAX_LATENCY_MS)
        .unwrap_or(false);

    fresh && latency_ok
}

/// Tracks rate-limit events and shard health for one cluster process.
pub struct RateLimitMonitor {
    topology: ClusterTopology,
    events: RwLock<Vec<RateLimitEvent>>,
    shard_metrics: RwLock<BTreeMap<u32, ShardMetrics>>,
    /// Five-minute count at the last fired alert, to suppress refiring while
    /// the count sits on the same multiple.
    last_alerted_count: Mutex<usize>,
}

impl RateLimitMonitor {
    pub fn new(topology: ClusterTopology) -> Self {
        Self {
            topology,
            events: RwLock::new(Vec::new()),
            shard_metrics: RwLock::new(BTreeMap::new()),
            last_alerted_count: Mutex::new(0),
        }
    }

    pub fn topology(&self) -> &ClusterTopology {
        &self.topology
    }

    /// Records one rate-limit event and attributes it to its shard's counter
    /// when the shard belongs to this cluster.
    pub fn record(&self, event: RateLimitEvent) {
        warn!(
            "Rate limit hit: {} (retry after {:.2}s, scope {})",
            event.endpoint,
            event.retry_after,
            event.scope.as_str()
        );

        if let Some(shard_id) = event.shard_id {
            if self.topology.owns_shard(shard_id) {
                let mut metrics = self.shard_metrics.write().expect("metrics lock poisoned");
                let entry = metrics.entry(shard_id).or_insert_with(|| ShardMetrics {
                    shard_id,
                    status: ShardStatus::Unknown,
                    latency_ms: None,
                    guilds: 0,
                    rate_limits: 0,
                    events_processed: 0,
                    last_updated: event.timestamp,
                });
                entry.rate_limits += 1;
            }
        }

        self.events.write().expect("events lock poisoned").push(event);
    }

    /// Drops events older than the retention window, then truncates to the
    /// newest `MAX_EVENTS`. Events are recorded in arrival order, so the tail
    /// of the vector is the newest.
    pub fn cleanup(&self, now: DateTime<Utc>) {
        let cutoff = now - Duration::hours(RETENTION_HOURS);
        let mut events = self.events.write().expect("events lock poisoned");

        let before = events.len();
        events.retain(|e| e.timestamp > cutoff);
        if events.len() > MAX_EVENTS {
            let excess = events.len() - MAX_EVENTS;
            events.drain(..excess);
        }

        let removed = before - events.len();
        if removed > 0 {
            info!("Rate limit cleanup removed {} old events", removed);
        }
    }

    /// Folds a gateway snapshot into the per-shard metrics, preserving each
    /// shard's accumulated rate-limit counter.
    pub fn observe_shards(&self, gateway: &GatewaySnapshot, now: DateTime<Utc>) {
        let mut metrics = self.shard_metrics.write().expect("metrics lock poisoned");

        for sample in &gateway.shards {
            if !self.topology.owns_shard(sample.shard_id) {
                continue;
            }

            let status = match sample.stage {
                ShardStage::Disconnected => ShardStatus::Disconnected,
                ShardStage::Reconnecting => ShardStatus::Reconnecting,
                ShardStage::Connected => match sample.latency_ms {
                    Some(l) if l > DEGRADED_LATENCY_MS => ShardStatus::Degraded,
                    _ => ShardStatus::Connected,
                },
            };

            if status != ShardStatus::Connected {
                warn!(
                    "Shard {} is {:?} (latency {:?}ms)",
                    sample.shard_id, status, sample.latency_ms
                );
            }

            let (rate_limits, events_processed) = metrics
                .get(&sample.shard_id)
                .map(|m| (m.rate_limits, m.events_processed))
                .unwrap_or((0, 0));
            metrics.insert(
                sample.shard_id,
                ShardMetrics {
                    shard_id: sample.shard_id,
                    status,
                    latency_ms: sample.latency_ms,
                    guilds: sample.guilds,
                    rate_limits,
                    events_processed: events_processed + 1,
                    last_updated: now,
                },
            );
        }
    }

    /// Number of events recorded within the five-minute alert window.
    pub fn recent_count(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::seconds(ALERT_WINDOW_SECONDS);
        self.events
            .read()
            .expect("events lock poisoned")
            .iter()
            .filter(|e| e.timestamp > cutoff)
            .count()
    }

    /// Returns the events of the alert window when an alert should fire now,
    /// or `None` otherwise.
    ///
    /// An alert fires when the five-minute count reaches a multiple of the
    /// threshold it has not already alerted on. The scheduler calls this
    /// every five minutes and dispatches a message for a `Some` result.
    pub fn take_alert_batch(
        &self,
        threshold: usize,
        now: DateTime<Utc>,
    ) -> Option<Vec<RateLimitEvent>> {
        let count = self.recent_count(now);
        let mut last = self
            .last_alerted_count
            .lock()
            .expect("alert lock poisoned");

        if !should_alert(count, threshold) {
            // Window drained below the last multiple; re-arm.
            if count < *last {
                *last = count;
            }
            return None;
        }
        if count == *last {
            return None;
        }
        *last = count;

        let cutoff = now - Duration::seconds(ALERT_WINDOW_SECONDS);
        let batch = self
            .events
            .read()
            .expect("events lock poisoned")
            .iter()
            .filter(|e| e.timestamp > cutoff)
            .cloned()
            .collect();

        Some(batch)
    }

    /// Aggregates the events of the last `hours` hours.
    pub fn stats(&self, hours: i64, now: DateTime<Utc>) -> RateLimitStats {
        let cutoff = now - Duration::hours(hours);
        let events = self.events.read().expect("events lock poisoned");

        let mut by_endpoint: BTreeMap<&str, u64> = BTreeMap::new();
        let mut by_scope: BTreeMap<RateLimitScope, u64> = BTreeMap::new();
        let mut total: u64 = 0;
        let mut retry_sum: f64 = 0.0;
        for event in events.iter().filter(|e| e.timestamp > cutoff) {
            total += 1;
            retry_sum += event.retry_after;
            *by_endpoint.entry(event.endpoint.as_str()).or_insert(0) += 1;
            *by_scope.entry(event.scope).or_insert(0) += 1;
        }

        let mut by_endpoint: Vec<EndpointCount> = by_endpoint
            .into_iter()
            .map(|(endpoint, count)| EndpointCount {
                endpoint: endpoint.to_string(),
                count,
            })
            .collect();
        by_endpoint.sort_by(|a, b| b.count.cmp(&a.count));

        let mut by_scope: Vec<ScopeCount> = by_scope
            .into_iter()
            .map(|(scope, count)| ScopeCount { scope, count })
            .collect();
        by_scope.sort_by(|a, b| b.count.cmp(&a.count));

        let shard_metrics: Vec<ShardMetrics> = self
            .shard_metrics
            .read()
            .expect("metrics lock poisoned")
            .values()
            .cloned()
            .collect();

        RateLimitStats {
            window_hours: hours,
            total_events: total,
            by_endpoint,
            by_scope,
            average_retry_after: if total > 0 {
                retry_sum / total as f64
            } else {
                0.0
            },
            shard_metrics,
        }
    }

    /// Per-shard metrics with derived health verdicts, ordered by shard id.
    pub fn shard_reports(&self, now: DateTime<Utc>) -> Vec<ShardHealthReport> {
        self.shard_metrics
            .read()
            .expect("metrics lock poisoned")
            .values()
            .map(|metrics| ShardHealthReport {
                healthy: is_healthy(metrics, now),
                metrics: metrics.clone(),
            })
            .collect()
    }

    /// Clears all recorded events, zeroes the per-shard counters, and re-arms
    /// the alert gate.
    pub fn reset(&self) {
        self.events.write().expect("events lock poisoned").clear();
        for metrics in self
            .shard_metrics
            .write()
            .expect("metrics lock poisoned")
            .values_mut()
        {
            metrics.rate_limits = 0;
        }
        *self
            .last_alerted_count
            .lock()
            .expect("alert lock poisoned") = 0;

        info!("Rate limit monitor reset");
    }

    /// Exports the full event window, shard metrics, and aggregate stats to
    /// a JSON file.
    pub async fn export_metrics(&self, path: &Path, now: DateTime<Utc>) -> Result<(), AppError> {
        let events = self.events.read().expect("events lock poisoned").clone();
        let shard_metrics: BTreeMap<String, ShardMetrics> = self
            .shard_metrics
            .read()
            .expect("metrics lock poisoned")
            .iter()
            .map(|(id, m)| (id.to_string(), m.clone()))
            .collect();

        let data = serde_json::json!({
            "export_timestamp": now.timestamp(),
            "cluster_id": self.topology.cluster_id,
            "shard_range": self.topology.shard_range,
            "stats_24h": self.stats(24, now),
            "shard_metrics": shard_metrics,
            "events": events,
        });

        tokio::fs::write(path, serde_json::to_vec_pretty(&data)?).await?;

        info!("Rate limit metrics exported to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::gateway::ShardSample;

    fn test_monitor() -> RateLimitMonitor {
        RateLimitMonitor::new(ClusterTopology::new(0, 1, 2).unwrap())
    }

    fn event_at(timestamp: DateTime<Utc>, endpoint: &str, shard_id: Option<u32>) -> RateLimitEvent {
        RateLimitEvent {
            timestamp,
            endpoint: endpoint.to_string(),
            retry_after: 1.5,
            scope: RateLimitScope::User,
            guild_id: None,
            channel_id: None,
            user_id: None,
            shard_id,
            cluster_id: 0,
        }
    }

    fn connected_sample(shard_id: u32, latency_ms: Option<f64>) -> ShardSample {
        ShardSample {
            shard_id,
            latency_ms,
            stage: ShardStage::Connected,
            guilds: 10,
        }
    }

    fn snapshot_with(shards: Vec<ShardSample>) -> GatewaySnapshot {
        GatewaySnapshot {
            ready: true,
            guilds: 10,
            users: 100,
            shards,
        }
    }

    #[test]
    fn alert_fires_only_on_fresh_threshold_multiples() {
        // threshold 5: fires at 5 and 10, silent everywhere else
        for count in 0..=12usize {
            let expected = count == 5 || count == 10;
            assert_eq!(should_alert(count, 5), expected, "count {}", count);
        }
    }

    #[test]
    fn alert_batch_suppresses_repeat_at_same_count() {
        let monitor = test_monitor();
        let now = Utc::now();
        for _ in 0..5 {
            monitor.record(event_at(now, "/channels/1/messages", Some(0)));
        }

        assert_eq!(monitor.take_alert_batch(5, now).unwrap().len(), 5);
        // Same count on the next tick stays silent.
        assert!(monitor.take_alert_batch(5, now).is_none());

        // Five more events reach the next multiple and fire again.
        for _ in 0..5 {
            monitor.record(event_at(now, "/channels/1/messages", Some(0)));
        }
        assert_eq!(monitor.take_alert_batch(5, now).unwrap().len(), 10);
    }

    #[test]
    fn alert_rearms_after_window_drains() {
        let monitor = test_monitor();
        let start = Utc::now();
        for _ in 0..5 {
            monitor.record(event_at(start, "/guilds/1", Some(0)));
        }
        assert!(monitor.take_alert_batch(5, start).is_some());

        // Ten minutes later the window is empty; the gate re-arms so a new
        // storm of five alerts again.
        let later = start + Duration::minutes(10);
        assert!(monitor.take_alert_batch(5, later).is_none());
        for _ in 0..5 {
            monitor.record(event_at(later, "/guilds/1", Some(0)));
        }
        assert_eq!(monitor.take_alert_batch(5, later).unwrap().len(), 5);
    }

    #[test]
    fn cleanup_keeps_newest_thousand() {
        let monitor = test_monitor();
        let now = Utc::now();
        for i in 0..1050u32 {
            monitor.record(event_at(
                now - Duration::seconds(i64::from(1050 - i)),
                &format!("/endpoint/{}", i),
                None,
            ));
        }

        monitor.cleanup(now);

        let events = monitor.events.read().unwrap();
        assert_eq!(events.len(), 1000);
        // The oldest 50 were dropped; the newest event survives.
        assert_eq!(events.last().unwrap().endpoint, "/endpoint/1049");
        assert_eq!(events.first().unwrap().endpoint, "/endpoint/50");
    }

    #[test]
    fn cleanup_drops_expired_events() {
        let monitor = test_monitor();
        let now = Utc::now();
        monitor.record(event_at(now - Duration::hours(25), "/old", None));
        monitor.record(event_at(now - Duration::hours(1), "/fresh", None));

        monitor.cleanup(now);

        let events = monitor.events.read().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].endpoint, "/fresh");
    }

    #[test]
    fn record_attributes_rate_limits_to_owned_shards_only() {
        let monitor = test_monitor();
        let now = Utc::now();
        monitor.observe_shards(
            &snapshot_with(vec![connected_sample(0, Some(50.0))]),
            now,
        );

        monitor.record(event_at(now, "/a", Some(0)));
        monitor.record(event_at(now, "/b", Some(7))); // not ours
        monitor.record(event_at(now, "/c", None));

        let metrics = monitor.shard_metrics.read().unwrap();
        assert_eq!(metrics.get(&0).unwrap().rate_limits, 1);
        assert!(!metrics.contains_key(&7));
    }

    #[test]
    fn observe_shards_derives_status_from_latency() {
        let monitor = test_monitor();
        let now = Utc::now();
        monitor.observe_shards(
            &snapshot_with(vec![
                connected_sample(0, Some(120.0)),
                connected_sample(1, Some(750.0)),
            ]),
            now,
        );

        let metrics = monitor.shard_metrics.read().unwrap();
        assert_eq!(metrics.get(&0).unwrap().status, ShardStatus::Connected);
        assert_eq!(metrics.get(&1).unwrap().status, ShardStatus::Degraded);
    }

    #[test]
    fn observe_shards_preserves_counters_across_updates() {
        let monitor = test_monitor();
        let now = Utc::now();
        monitor.observe_shards(&snapshot_with(vec![connected_sample(0, Some(50.0))]), now);
        monitor.record(event_at(now, "/a", Some(0)));

        monitor.observe_shards(
            &snapshot_with(vec![connected_sample(0, Some(60.0))]),
            now + Duration::minutes(1),
        );

        let metrics = monitor.shard_metrics.read().unwrap();
        assert_eq!(metrics.get(&0).unwrap().rate_limits, 1);
        assert_eq!(metrics.get(&0).unwrap().events_processed, 2);
    }

    #[test]
    fn classify_infers_scope_from_route() {
        assert_eq!(
            RateLimitScope::classify(true, "/channels/1/messages"),
            RateLimitScope::Global
        );
        assert_eq!(
            RateLimitScope::classify(false, "/guilds/1/members"),
            RateLimitScope::Guild
        );
        assert_eq!(
            RateLimitScope::classify(false, "/channels/1/messages"),
            RateLimitScope::Channel
        );
        assert_eq!(
            RateLimitScope::classify(false, "/users/@me"),
            RateLimitScope::User
        );
        assert_eq!(
            RateLimitScope::classify(false, "/webhooks/1"),
            RateLimitScope::Unknown
        );
    }

    #[test]
    fn health_requires_fresh_data_and_low_latency() {
        let now = Utc::now();
        let base = ShardMetrics {
            shard_id: 0,
            status: ShardStatus::Connected,
            latency_ms: Some(80.0),
            guilds: 5,
            rate_limits: 0,
            events_processed: 0,
            last_updated: now,
        };
        assert!(is_healthy(&base, now));

        let stale = ShardMetrics {
            last_updated: now - Duration::seconds(121),
            ..base.clone()
        };
        assert!(!is_healthy(&stale, now));

        let slow = ShardMetrics {
            latency_ms: Some(1000.0),
            ..base.clone()
        };
        assert!(!is_healthy(&slow, now));

        let no_heartbeat = ShardMetrics {
            latency_ms: None,
            ..base.clone()
        };
        assert!(!is_healthy(&no_heartbeat, now));

        // Boundary values: 999 ms / 119 s healthy, exact limits unhealthy.
        let at_latency_limit = ShardMetrics {
            latency_ms: Some(999.0),
            ..base.clone()
        };
        assert!(is_healthy(&at_latency_limit, now));
        let at_age_limit = ShardMetrics {
            last_updated: now - Duration::seconds(119),
            ..base
        };
        assert!(is_healthy(&at_age_limit, now));
    }

    #[test]
    fn stats_sort_endpoints_by_count() {
        let monitor = test_monitor();
        let now = Utc::now();
        for _ in 0..3 {
            monitor.record(event_at(now, "/busy", None));
        }
        monitor.record(event_at(now, "/quiet", None));
        monitor.record(RateLimitEvent {
            scope: RateLimitScope::Global,
            ..event_at(now, "/busy", None)
        });

        let stats = monitor.stats(1, now);
        assert_eq!(stats.total_events, 5);
        assert_eq!(stats.by_endpoint[0].endpoint, "/busy");
        assert_eq!(stats.by_endpoint[0].count, 4);
        assert_eq!(stats.by_scope[0].scope, RateLimitScope::User);
        assert_eq!(stats.by_scope[0].count, 4);
        assert_eq!(stats.by_scope[1].scope, RateLimitScope::Global);
        assert_eq!(stats.by_scope[1].count, 1);
    }

    #[test]
    fn reset_clears_events_and_counters() {
        let monitor = test_monitor();
        let now = Utc::now();
        monitor.observe_shards(&snapshot_with(vec![connected_sample(0, Some(50.0))]), now);
        monitor.record(event_at(now, "/a", Some(0)));

        monitor.reset();

        assert_eq!(monitor.recent_count(now), 0);
        let metrics = monitor.shard_metrics.read().unwrap();
        assert_eq!(metrics.get(&0).unwrap().rate_limits, 0);
    }

    #[tokio::test]
    async fn export_writes_expected_shape() {
        let monitor = test_monitor();
        let now = Utc::now();
        monitor.record(event_at(now, "/channels/1/messages", Some(0)));

        let path = std::env::temp_dir().join(format!(
            "sprouts_ratelimit_export_{}.json",
            std::process::id()
        ));
        monitor.export_metrics(&path, now).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["cluster_id"], 0);
        assert_eq!(value["events"].as_array().unwrap().len(), 1);
        assert_eq!(value["stats_24h"]["total_events"], 1);

        std::fs::remove_file(&path).ok();
    }
}
