//! Ready event handler for bot initialization.
//!
//! Fired once per connection after the gateway handshake. Resolves the bot
//! owner from application info (the command surface stays locked until this
//! succeeds) and flips the cluster status to running.

use serenity::all::{ActivityData, Context, Ready};
use tracing::{error, info};

use crate::state::AppState;

/// Handles the ready event when the bot connects to Discord.
///
/// # Arguments
/// - `ctx` - Discord context for setting activity and reading shared state
/// - `ready` - Ready event data containing bot user information
pub async fn handle_ready(ctx: Context, ready: Ready) {
    info!("{} is connected to Discord", ready.user.name);

    let state = {
        let data = ctx.data.read().await;
        data.get::<AppState>().cloned()
    };
    let Some(state) = state else {
        error!("Application state missing from client data map");
        return;
    };

    let topology = state.cluster.topology();
    ctx.set_activity(Some(ActivityData::custom(format!(
        "Cluster {} | {}help",
        topology.cluster_id, state.config.command_prefix
    ))));

    match ctx.http.get_current_application_info().await {
        Ok(info) => {
            if let Some(owner) = info.owner {
                state.set_owner_id(owner.id.get());
                info!("Resolved bot owner {}", owner.id);
            }
        }
        Err(e) => {
            error!("Failed to fetch application info: {:?}", e);
        }
    }

    state.cluster.mark_running();
    info!(
        "Cluster {} online with shards {}-{}",
        topology.cluster_id, topology.shard_range.0, topology.shard_range.1
    );
}
