//! Cluster and shard distribution management.
//!
//! Each deployed SPROUTS process owns a contiguous shard range computed from
//! its cluster id. The manager snapshots live gateway counts on a heartbeat,
//! watches guild density and memory pressure, and derives scaling advice
//! (optimal shard count, recommended cluster count, efficiency score) from
//! Discord's ~1000-guilds-per-shard guidance.
//!
//! Snapshot and stats calls never fail: a not-ready gateway degrades to a
//! zeroed snapshot with status `error` and version `"unknown"` so the owner
//! commands always have something to render.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::Environment;
use crate::error::{config::ConfigError, AppError};
use crate::monitor::gateway::{GatewaySnapshot, ShardStage};

/// Guilds per shard above which the health monitor logs a density warning.
const GUILD_DENSITY_WARN: f64 = 2000.0;
/// System memory percentage above which the health monitor logs a warning.
const MEMORY_WARN_PERCENT: f64 = 85.0;
/// Discord's recommended guild count per shard.
const GUILDS_PER_SHARD_TARGET: u64 = 1000;
/// Default target guild count per cluster for scaling recommendations.
pub const GUILDS_PER_CLUSTER_TARGET: u64 = 5000;

/// Lifecycle status of this cluster instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterStatus {
    Starting,
    Running,
    Stopping,
    Error,
}

/// Shard range assignment for one cluster process.
///
/// Computed once at construction and never recomputed while the process
/// lives. Construction fails fast on an inconsistent topology instead of
/// producing a degenerate range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterTopology {
    pub cluster_id: u32,
    pub total_clusters: u32,
    pub total_shards: u32,
    /// Inclusive `(min_shard, max_shard)` owned by this cluster.
    pub shard_range: (u32, u32),
}

impl ClusterTopology {
    /// Validates the topology and computes this cluster's shard range.
    ///
    /// # Returns
    /// - `Ok(ClusterTopology)` - Valid assignment
    /// - `Err(ConfigError::InvalidClusterTopology)` - `total_shards == 0`,
    ///   `total_clusters == 0`, or `cluster_id >= total_clusters`
    pub fn new(
        cluster_id: u32,
        total_clusters: u32,
        total_shards: u32,
    ) -> Result<Self, ConfigError> {
        if total_shards == 0 || total_clusters == 0 || cluster_id >= total_clusters {
            return Err(ConfigError::InvalidClusterTopology {
                cluster_id,
                total_clusters,
                total_shards,
            });
        }

        Ok(Self {
            cluster_id,
            total_clusters,
            total_shards,
            shard_range: Self::compute_range(cluster_id, total_clusters, total_shards),
        })
    }

    /// Computes the inclusive shard range for a cluster.
    ///
    /// `shards_per_cluster = max(1, total_shards / total_clusters)`; the last
    /// cluster's range is clamped to `total_shards - 1`. A single-cluster
    /// deployment owns everything.
    pub fn compute_range(cluster_id: u32, total_clusters: u32, total_shards: u32) -> (u32, u32) {
        if total_clusters <= 1 {
            return (0, total_shards.saturating_sub(1));
        }

        let shards_per_cluster = (total_shards / total_clusters).max(1);
        let min_shard = cluster_id * shards_per_cluster;
        let max_shard = (min_shard + shards_per_cluster - 1).min(total_shards - 1);

        (min_shard, max_shard)
    }

    /// Whether a shard id falls inside this cluster's assignment.
    pub fn owns_shard(&self, shard_id: u32) -> bool {
        shard_id >= self.shard_range.0 && shard_id <= self.shard_range.1
    }

    /// Number of shards assigned to this cluster.
    pub fn shard_count(&self) -> u32 {
        self.shard_range.1 - self.shard_range.0 + 1
    }
}

/// Snapshot of one cluster instance, rebuilt on every heartbeat tick.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterInfo {
    pub cluster_id: u32,
    /// Process-unique identifier, `sprouts-<cluster>-<start unix>`.
    pub instance_id: String,
    /// Unix seconds at manager construction.
    pub start_time: i64,
    pub shard_range: (u32, u32),
    pub total_shards: u32,
    pub guilds: u64,
    pub users: u64,
    pub status: ClusterStatus,
    /// Unix seconds of the snapshot capture.
    pub last_heartbeat: i64,
    pub version: String,
    pub environment: Environment,
}

/// Per-shard health entry in the stats report, restricted to this cluster's
/// assigned range.
#[derive(Debug, Clone, Serialize)]
pub struct ShardHealth {
    pub latency_ms: Option<f64>,
    pub connected: bool,
    pub guilds: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceStats {
    /// Guild growth rate extrapolated from uptime.
    pub guilds_per_hour: f64,
    pub guilds_per_shard: f64,
    pub users_per_guild: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendations {
    pub optimal_shards: u32,
    pub recommended_clusters: u32,
    /// 0-100 score; 100 means at or under the guilds-per-shard target.
    pub current_efficiency: f64,
}

/// Comprehensive cluster statistics rendered by the owner commands and the
/// `/api/stats` route, and embedded in metric exports.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterStats {
    pub cluster_info: ClusterInfo,
    pub uptime_seconds: f64,
    pub uptime_human: String,
    pub performance: PerformanceStats,
    pub shard_health: BTreeMap<u32, ShardHealth>,
    pub recommendations: Recommendations,
}

/// Calculates the optimal shard count for a guild count.
///
/// Discord recommends ~1000 guilds per shard; a 25% growth buffer is added
/// and the result rounded up to the next power of two for even snowflake
/// distribution.
pub fn optimal_shard_count(guild_count: u64) -> u32 {
    let base = (guild_count / GUILDS_PER_SHARD_TARGET).max(1);
    let optimal = ((base as f64 * 1.25).round() as u64).max(1);

    (optimal as u32).next_power_of_two()
}

/// Recommends a cluster count for a guild count, one cluster per
/// `target_guilds_per_cluster` once the target is exceeded.
pub fn recommended_cluster_count(guild_count: u64, target_guilds_per_cluster: u64) -> u32 {
    if guild_count <= target_guilds_per_cluster {
        return 1;
    }

    ((guild_count / target_guilds_per_cluster).max(1)) as u32
}

/// 0-100 efficiency score: 100 while guilds-per-shard is at or under the
/// target, shrinking proportionally as shards get denser.
pub fn efficiency_score(guilds_per_shard: f64) -> f64 {
    (GUILDS_PER_SHARD_TARGET as f64 / guilds_per_shard.max(1.0) * 100.0).min(100.0)
}

/// Formats an uptime duration as `XdYhZm`, dropping leading zero units.
pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Samples system memory usage from `/proc/meminfo`.
///
/// Returns `None` when the facility is unavailable (non-Linux hosts, missing
/// fields); callers skip the memory check silently in that case.
pub fn memory_percent() -> Option<f64> {
    let contents = std::fs::read_to_string("/proc/meminfo").ok()?;

    let mut total_kb: Option<f64> = None;
    let mut available_kb: Option<f64> = None;
    for line in contents.lines() {
        if let Some(rest) = line.strip_prefix("MemTotal:") {
            total_kb = rest.trim().split_whitespace().next()?.parse().ok();
        } else if let Some(rest) = line.strip_prefix("MemAvailable:") {
            available_kb = rest.trim().split_whitespace().next()?.parse().ok();
        }
    }

    let total = total_kb?;
    let available = available_kb?;
    if total <= 0.0 {
        return None;
    }

    Some((1.0 - available / total) * 100.0)
}

/// Manages this process's cluster assignment and health reporting.
pub struct ClusterManager {
    topology: ClusterTopology,
    instance_id: String,
    start_time: DateTime<Utc>,
    environment: Environment,
    version: String,
    status: RwLock<ClusterStatus>,
    /// Latest snapshot per known cluster id. Only this process's entry is
    /// refreshed by the heartbeat; the map shape matches the export format.
    cluster_info: RwLock<BTreeMap<u32, ClusterInfo>>,
}

impl ClusterManager {
    pub fn new(topology: ClusterTopology, environment: Environment) -> Self {
        let start_time = Utc::now();

        Self {
            topology,
            instance_id: format!(
                "sprouts-{}-{}",
                topology.cluster_id,
                start_time.timestamp()
            ),
            start_time,
            environment,
            version: env!("CARGO_PKG_VERSION").to_string(),
            status: RwLock::new(ClusterStatus::Starting),
            cluster_info: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn topology(&self) -> &ClusterTopology {
        &self.topology
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn uptime_seconds(&self, now: DateTime<Utc>) -> f64 {
        (now - self.start_time).num_milliseconds().max(0) as f64 / 1000.0
    }

    /// Marks the cluster as fully connected. Called from the ready handler.
    pub fn mark_running(&self) {
        *self.status.write().expect("status lock poisoned") = ClusterStatus::Running;
    }

    /// Marks the cluster as shutting down. Called once at graceful shutdown.
    pub fn begin_shutdown(&self) {
        *self.status.write().expect("status lock poisoned") = ClusterStatus::Stopping;
        info!(
            "Starting graceful shutdown of cluster {}",
            self.topology.cluster_id
        );
    }

    fn current_status(&self) -> ClusterStatus {
        *self.status.read().expect("status lock poisoned")
    }

    /// Builds a `ClusterInfo` from a gateway snapshot.
    ///
    /// A not-ready gateway yields a zeroed snapshot with status `error` and
    /// version `"unknown"` instead of an error; callers always get a value.
    pub fn snapshot_at(&self, gateway: &GatewaySnapshot, now: DateTime<Utc>) -> ClusterInfo {
        if !gateway.ready {
            return ClusterInfo {
                cluster_id: self.topology.cluster_id,
                instance_id: self.instance_id.clone(),
                start_time: self.start_time.timestamp(),
                shard_range: self.topology.shard_range,
                total_shards: self.topology.total_shards,
                guilds: 0,
                users: 0,
                status: ClusterStatus::Error,
                last_heartbeat: now.timestamp(),
                version: "unknown".to_string(),
                environment: self.environment,
            };
        }

        ClusterInfo {
            cluster_id: self.topology.cluster_id,
            instance_id: self.instance_id.clone(),
            start_time: self.start_time.timestamp(),
            shard_range: self.topology.shard_range,
            total_shards: self.topology.total_shards,
            guilds: gateway.guilds,
            users: gateway.users,
            status: self.current_status(),
            last_heartbeat: now.timestamp(),
            version: self.version.clone(),
            environment: self.environment,
        }
    }

    pub fn snapshot(&self, gateway: &GatewaySnapshot) -> ClusterInfo {
        self.snapshot_at(gateway, Utc::now())
    }

    /// Heartbeat tick: stores the latest snapshot and logs a one-line status
    /// summary.
    pub fn heartbeat(&self, gateway: &GatewaySnapshot) {
        let info = self.snapshot(gateway);

        info!(
            "Cluster {} heartbeat - Shards: {}-{}, Guilds: {}, Users: {}, Status: {:?}",
            info.cluster_id,
            info.shard_range.0,
            info.shard_range.1,
            info.guilds,
            info.users,
            info.status
        );

        self.cluster_info
            .write()
            .expect("cluster_info lock poisoned")
            .insert(info.cluster_id, info);
    }

    /// Health-monitor tick: warns on high guild density and high memory
    /// usage. Logging only; no alert message is dispatched (asymmetric with
    /// the rate-limit monitor on purpose).
    pub fn health_check(&self, gateway: &GatewaySnapshot) {
        let info = self.snapshot(gateway);

        if info.guilds > 0 {
            let guilds_per_shard = info.guilds as f64 / f64::from(self.topology.shard_count());
            if guilds_per_shard > GUILD_DENSITY_WARN {
                warn!(
                    "Cluster {} has high guild density: {:.1} guilds per shard",
                    info.cluster_id, guilds_per_shard
                );
            }
        }

        // Silently skipped on hosts without /proc/meminfo.
        if let Some(percent) = memory_percent() {
            if percent > MEMORY_WARN_PERCENT {
                warn!(
                    "Cluster {} high memory usage: {:.1}%",
                    info.cluster_id, percent
                );
            }
        }
    }

    /// Builds the comprehensive stats report at a given instant.
    pub fn stats_at(&self, gateway: &GatewaySnapshot, now: DateTime<Utc>) -> ClusterStats {
        let info = self.snapshot_at(gateway, now);
        let uptime_seconds = self.uptime_seconds(now);

        let guilds_per_hour = info.guilds as f64 / uptime_seconds.max(1.0) * 3600.0;

        let mut shard_health = BTreeMap::new();
        for sample in &gateway.shards {
            if self.topology.owns_shard(sample.shard_id) {
                shard_health.insert(
                    sample.shard_id,
                    ShardHealth {
                        latency_ms: sample.latency_ms.map(|l| (l * 100.0).round() / 100.0),
                        connected: sample.stage != ShardStage::Disconnected,
                        guilds: sample.guilds,
                    },
                );
            }
        }

        let guilds_per_shard = info.guilds as f64 / shard_health.len().max(1) as f64;

        ClusterStats {
            uptime_seconds,
            uptime_human: format_uptime(uptime_seconds as u64),
            performance: PerformanceStats {
                guilds_per_hour,
                guilds_per_shard,
                users_per_guild: info.users as f64 / info.guilds.max(1) as f64,
            },
            recommendations: Recommendations {
                optimal_shards: optimal_shard_count(info.guilds),
                recommended_clusters: recommended_cluster_count(
                    info.guilds,
                    GUILDS_PER_CLUSTER_TARGET,
                ),
                current_efficiency: efficiency_score(guilds_per_shard),
            },
            shard_health,
            cluster_info: info,
        }
    }

    pub fn stats(&self, gateway: &GatewaySnapshot) -> ClusterStats {
        self.stats_at(gateway, Utc::now())
    }

    /// Exports the current stats plus all known cluster snapshots to a JSON
    /// file.
    ///
    /// # Returns
    /// - `Ok(())` - File written
    /// - `Err(AppError)` - Serialization or file I/O failure; callers log and
    ///   render the failure instead of crashing
    pub async fn export(&self, path: &Path, gateway: &GatewaySnapshot) -> Result<(), AppError> {
        let now = Utc::now();

        let all_clusters: BTreeMap<String, ClusterInfo> = self
            .cluster_info
            .read()
            .expect("cluster_info lock poisoned")
            .iter()
            .map(|(id, info)| (id.to_string(), info.clone()))
            .collect();

        let data = serde_json::json!({
            "export_timestamp": now.timestamp(),
            "cluster_stats": self.stats_at(gateway, now),
            "all_clusters": all_clusters,
            "shard_distribution": {
                "total_shards": self.topology.total_shards,
                "this_cluster_range": self.topology.shard_range,
                "total_clusters": self.topology.total_clusters,
            },
        });

        tokio::fs::write(path, serde_json::to_vec_pretty(&data)?).await?;

        info!("Cluster metrics exported to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::gateway::ShardSample;

    fn test_manager(topology: ClusterTopology) -> ClusterManager {
        ClusterManager::new(topology, Environment::Development)
    }

    fn ready_gateway(guilds: u64, users: u64, shards: Vec<ShardSample>) -> GatewaySnapshot {
        GatewaySnapshot {
            ready: true,
            guilds,
            users,
            shards,
        }
    }

    #[test]
    fn shard_ranges_partition_evenly() {
        // 8 shards over 4 clusters tile [0, 7] without gaps or overlaps
        let expected = [(0, 1), (2, 3), (4, 5), (6, 7)];
        for (cluster_id, want) in expected.iter().enumerate() {
            assert_eq!(
                ClusterTopology::compute_range(cluster_id as u32, 4, 8),
                *want
            );
        }
    }

    #[test]
    fn shard_ranges_cover_all_shards_when_divisible() {
        for (total_clusters, total_shards) in [(2u32, 8u32), (4, 16), (8, 8), (1, 4)] {
            let mut covered = vec![false; total_shards as usize];
            for cluster_id in 0..total_clusters {
                let (min, max) =
                    ClusterTopology::compute_range(cluster_id, total_clusters, total_shards);
                for shard in min..=max {
                    assert!(!covered[shard as usize], "shard {} assigned twice", shard);
                    covered[shard as usize] = true;
                }
            }
            assert!(covered.iter().all(|c| *c), "uncovered shard in partition");
        }
    }

    #[test]
    fn single_cluster_owns_everything() {
        let topology = ClusterTopology::new(0, 1, 16).unwrap();
        assert_eq!(topology.shard_range, (0, 15));
        assert_eq!(topology.shard_count(), 16);
    }

    #[test]
    fn rejects_cluster_id_out_of_range() {
        assert!(ClusterTopology::new(4, 4, 8).is_err());
        assert!(ClusterTopology::new(0, 0, 8).is_err());
        assert!(ClusterTopology::new(0, 1, 0).is_err());
    }

    #[test]
    fn optimal_shard_count_pins() {
        assert_eq!(optimal_shard_count(0), 1);
        assert_eq!(optimal_shard_count(1000), 1);
        assert_eq!(optimal_shard_count(5000), 8);
    }

    #[test]
    fn recommended_cluster_count_pins() {
        assert_eq!(recommended_cluster_count(4999, 5000), 1);
        assert_eq!(recommended_cluster_count(5000, 5000), 1);
        assert_eq!(recommended_cluster_count(10000, 5000), 2);
    }

    #[test]
    fn efficiency_caps_at_one_hundred() {
        assert_eq!(efficiency_score(0.0), 100.0);
        assert_eq!(efficiency_score(500.0), 100.0);
        assert_eq!(efficiency_score(2000.0), 50.0);
    }

    #[test]
    fn uptime_formatting_tiers() {
        assert_eq!(format_uptime(3 * 86_400 + 4 * 3_600 + 5 * 60), "3d 4h 5m");
        assert_eq!(format_uptime(3_700), "1h 1m");
        assert_eq!(format_uptime(59), "0m");
    }

    #[test]
    fn snapshot_degrades_when_gateway_not_ready() {
        let manager = test_manager(ClusterTopology::new(0, 1, 2).unwrap());
        let info = manager.snapshot(&GatewaySnapshot::default());

        assert_eq!(info.status, ClusterStatus::Error);
        assert_eq!(info.guilds, 0);
        assert_eq!(info.users, 0);
        assert_eq!(info.version, "unknown");
    }

    #[test]
    fn snapshot_reflects_gateway_counts() {
        let manager = test_manager(ClusterTopology::new(0, 1, 1).unwrap());
        manager.mark_running();

        let gateway = ready_gateway(
            42,
            4200,
            vec![ShardSample {
                shard_id: 0,
                latency_ms: Some(55.0),
                stage: ShardStage::Connected,
                guilds: 42,
            }],
        );
        let info = manager.snapshot(&gateway);

        assert_eq!(info.status, ClusterStatus::Running);
        assert_eq!(info.guilds, 42);
        assert_eq!(info.users, 4200);
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn stats_restrict_shard_health_to_owned_range() {
        // cluster 0 of 2 owns shards 0-1; shard 2 belongs to cluster 1
        let manager = test_manager(ClusterTopology::new(0, 2, 4).unwrap());
        manager.mark_running();

        let shards = vec![
            ShardSample {
                shard_id: 0,
                latency_ms: Some(80.0),
                stage: ShardStage::Connected,
                guilds: 10,
            },
            ShardSample {
                shard_id: 1,
                latency_ms: None,
                stage: ShardStage::Disconnected,
                guilds: 5,
            },
            ShardSample {
                shard_id: 2,
                latency_ms: Some(40.0),
                stage: ShardStage::Connected,
                guilds: 7,
            },
        ];
        let stats = manager.stats(&ready_gateway(15, 1500, shards));

        assert_eq!(stats.shard_health.len(), 2);
        assert!(stats.shard_health.contains_key(&0));
        assert!(stats.shard_health.contains_key(&1));
        assert!(!stats.shard_health.get(&1).unwrap().connected);
        assert_eq!(stats.performance.users_per_guild, 100.0);
    }

    #[test]
    fn shutdown_status_appears_in_snapshots() {
        let manager = test_manager(ClusterTopology::new(0, 1, 1).unwrap());
        manager.mark_running();
        manager.begin_shutdown();

        let gateway = ready_gateway(1, 1, Vec::new());
        assert_eq!(manager.snapshot(&gateway).status, ClusterStatus::Stopping);
    }

    #[tokio::test]
    async fn export_writes_expected_shape() {
        let manager = test_manager(ClusterTopology::new(0, 1, 1).unwrap());
        manager.mark_running();
        let gateway = ready_gateway(3, 30, Vec::new());
        manager.heartbeat(&gateway);

        let dir = std::env::temp_dir();
        let path = dir.join(format!("sprouts_cluster_export_{}.json", std::process::id()));
        manager.export(&path, &gateway).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert!(value["export_timestamp"].is_i64());
        assert_eq!(value["cluster_stats"]["cluster_info"]["guilds"], 3);
        assert!(value["all_clusters"]["0"].is_object());
        assert_eq!(value["shard_distribution"]["total_shards"], 1);

        std::fs::remove_file(&path).ok();
    }
}
