//! Cluster, shard, and rate-limit monitoring.
//!
//! This is the core of SPROUTS: the cluster manager partitions shards across
//! deployed processes and derives scaling advice; the rate-limit monitor keeps
//! a bounded rolling window of HTTP-429 events and alerts on density; the
//! gateway module samples live counts from the Serenity cache and shard
//! manager so the other two stay free of SDK types and unit-testable.
//!
//! All shared collections are guarded by `std::sync::RwLock` with no `.await`
//! inside a critical section; the monitors are constructed once at startup and
//! shared as `Arc`s between the event handlers, the scheduler jobs, the
//! command surface, and the health routes.

pub mod cluster;
pub mod gateway;
pub mod rate_limit;
