//! Application state shared across the bot, scheduler, and health routes.
//!
//! This module defines the `AppState` struct which holds all shared services.
//! The state is initialized once during startup after the Serenity client is
//! built, inserted into the client's data map for the event handlers, and
//! handed as an `Arc` to the scheduler jobs and the Axum router.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sea_orm::DatabaseConnection;
use serenity::prelude::TypeMapKey;

use crate::config::Config;
use crate::monitor::cluster::ClusterManager;
use crate::monitor::gateway::GatewayObserver;
use crate::monitor::rate_limit::RateLimitMonitor;
use crate::variables::VariableProcessor;

/// Application state containing shared services.
///
/// All fields are cheap to share: the database connection is a pool and the
/// services are reference-counted. One `Arc<AppState>` is cloned into every
/// consumer.
pub struct AppState {
    /// Database connection pool for accessing persistent storage.
    pub db: DatabaseConnection,

    /// Immutable runtime configuration loaded from the environment.
    pub config: Arc<Config>,

    /// Cluster assignment, heartbeats, and scaling recommendations.
    pub cluster: Arc<ClusterManager>,

    /// Rate-limit event window and shard health tracking.
    pub monitor: Arc<RateLimitMonitor>,

    /// Live gateway sampler backing the two monitors.
    pub observer: Arc<GatewayObserver>,

    /// Template-variable substitution for message text.
    pub variables: Arc<VariableProcessor>,

    /// Bot owner's user ID, resolved from application info in the ready
    /// handler. Zero until then, which makes every owner check fail closed.
    owner_id: AtomicU64,
}

impl TypeMapKey for AppState {
    type Value = Arc<AppState>;
}

impl AppState {
    /// Creates the application state once all services are constructed.
    ///
    /// # Arguments
    /// - `db` - Database connection pool
    /// - `config` - Runtime configuration
    /// - `cluster` - Cluster manager service
    /// - `monitor` - Rate-limit monitor service
    /// - `observer` - Gateway sampler bound to the live client
    ///
    /// # Returns
    /// - `AppState` - Initialized application state ready for use
    pub fn new(
        db: DatabaseConnection,
        config: Arc<Config>,
        cluster: Arc<ClusterManager>,
        monitor: Arc<RateLimitMonitor>,
        observer: Arc<GatewayObserver>,
    ) -> Self {
        Self {
            db,
            config,
            cluster,
            monitor,
            observer,
            variables: Arc::new(VariableProcessor::new()),
            owner_id: AtomicU64::new(0),
        }
    }

    /// Stores the bot owner's user ID. Called from the ready handler.
    pub fn set_owner_id(&self, id: u64) {
        self.owner_id.store(id, Ordering::Relaxed);
    }

    /// Whether a user is the bot owner. False until the ready handler has
    /// resolved the owner, so commands stay locked during startup.
    pub fn is_owner(&self, user_id: u64) -> bool {
        let owner = self.owner_id.load(Ordering::Relaxed);
        owner != 0 && owner == user_id
    }
}
