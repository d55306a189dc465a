//! Live gateway sampling.
//!
//! Bridges the Serenity cache and shard manager into plain data the monitors
//! can consume. Sampling never fails: before the cache is populated the
//! snapshot simply reports `ready: false` with zeroed counts, and the monitors
//! degrade accordingly.

use std::collections::HashMap;
use std::sync::Arc;

use serenity::all::{Cache, ConnectionStage, ShardManager};

/// Connection state of a single shard as last reported by its runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShardStage {
    Connected,
    Reconnecting,
    Disconnected,
}

/// One shard's most recent gateway sample.
#[derive(Debug, Clone)]
pub struct ShardSample {
    pub shard_id: u32,
    /// Heartbeat latency in milliseconds; `None` until the first heartbeat
    /// round-trip completes.
    pub latency_ms: Option<f64>,
    pub stage: ShardStage,
    /// Number of cached guilds owned by this shard.
    pub guilds: u64,
}

/// Point-in-time view of the gateway: aggregate counts plus one sample per
/// shard runner owned by this process.
#[derive(Debug, Clone, Default)]
pub struct GatewaySnapshot {
    /// False until the cache has seen at least one guild or a shard runner
    /// exists; monitors treat a non-ready snapshot as a degraded view.
    pub ready: bool,
    pub guilds: u64,
    pub users: u64,
    pub shards: Vec<ShardSample>,
}

/// Computes which shard owns a guild, per the gateway sharding contract:
/// `(guild_id >> 22) % total_shards`.
pub fn shard_id_for_guild(guild_id: u64, total_shards: u32) -> u32 {
    ((guild_id >> 22) % u64::from(total_shards.max(1))) as u32
}

/// Samples guild/user counts and shard runner state from a live client.
///
/// Constructed once after the Serenity client is built, then shared with the
/// scheduler jobs, the command surface, and the health routes.
pub struct GatewayObserver {
    cache: Arc<Cache>,
    shard_manager: Arc<ShardManager>,
    total_shards: u32,
}

impl GatewayObserver {
    pub fn new(cache: Arc<Cache>, shard_manager: Arc<ShardManager>, total_shards: u32) -> Self {
        Self {
            cache,
            shard_manager,
            total_shards,
        }
    }

    /// Takes a fresh snapshot of the gateway.
    ///
    /// User counts are approximated from cached guild member counts; the
    /// per-shard guild distribution is derived from the sharding formula
    /// rather than asking Discord, so it is exact for cached guilds.
    pub async fn sample(&self) -> GatewaySnapshot {
        let guild_ids = self.cache.guilds();
        let guilds = guild_ids.len() as u64;

        let mut users: u64 = 0;
        let mut guilds_per_shard: HashMap<u32, u64> = HashMap::new();
        for guild_id in &guild_ids {
            let shard = shard_id_for_guild(guild_id.get(), self.total_shards);
            *guilds_per_shard.entry(shard).or_insert(0) += 1;

            if let Some(guild) = self.cache.guild(*guild_id) {
                users += guild.member_count;
            }
        }

        let runners = self.shard_manager.runners.lock().await;
        let mut shards: Vec<ShardSample> = runners
            .iter()
            .map(|(shard_id, info)| {
                let id = shard_id.0;
                ShardSample {
                    shard_id: id,
                    latency_ms: info.latency.map(|d| d.as_secs_f64() * 1000.0),
                    stage: match info.stage {
                        ConnectionStage::Connected => ShardStage::Connected,
                        ConnectionStage::Disconnected => ShardStage::Disconnected,
                        _ => ShardStage::Reconnecting,
                    },
                    guilds: guilds_per_shard.get(&id).copied().unwrap_or(0),
                }
            })
            .collect();
        drop(runners);

        shards.sort_by_key(|s| s.shard_id);

        GatewaySnapshot {
            ready: guilds > 0 || !shards.is_empty(),
            guilds,
            users,
            shards,
        }
    }

    /// Asks every shard runner to shut down. Used during graceful shutdown.
    pub async fn shutdown_all(&self) {
        self.shard_manager.shutdown_all().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_formula_matches_gateway_contract() {
        // guild snowflakes differ above bit 22; low bits are ignored
        assert_eq!(shard_id_for_guild(0, 4), 0);
        assert_eq!(shard_id_for_guild(1 << 22, 4), 1);
        assert_eq!(shard_id_for_guild(5 << 22, 4), 1);
        assert_eq!(shard_id_for_guild((1 << 22) - 1, 4), 0);
    }

    #[test]
    fn shard_formula_tolerates_zero_shards() {
        assert_eq!(shard_id_for_guild(123 << 22, 0), 0);
    }
}
