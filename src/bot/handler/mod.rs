use std::sync::Arc;

use serenity::all::{Context, EventHandler, Message, RatelimitInfo, Ready};
use serenity::async_trait;

use crate::monitor::rate_limit::RateLimitMonitor;

pub mod message;
pub mod ratelimit;
pub mod ready;

/// Discord bot event handler.
///
/// Holds the rate-limit monitor directly because the ratelimit hook fires
/// without a gateway context; everything else is pulled from the client's
/// data map where startup stores the application state.
pub struct Handler {
    pub monitor: Arc<RateLimitMonitor>,
}

impl Handler {
    pub fn new(monitor: Arc<RateLimitMonitor>) -> Self {
        Self { monitor }
    }
}

#[async_trait]
impl EventHandler for Handler {
    /// Called when the bot is ready and connected to Discord
    async fn ready(&self, ctx: Context, ready: Ready) {
        ready::handle_ready(ctx, ready).await;
    }

    /// Called when a message is sent in a channel
    async fn message(&self, ctx: Context, message: Message) {
        message::handle_message(ctx, message).await;
    }

    /// Called when an HTTP request is rate limited by Discord
    async fn ratelimit(&self, data: RatelimitInfo) {
        ratelimit::handle_ratelimit(&self.monitor, data);
    }
}
