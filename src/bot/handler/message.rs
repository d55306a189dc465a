//! Message event handler for the prefix command surface.

use serenity::all::{Context, Message};
use tracing::{debug, error};

use crate::commands;
use crate::state::AppState;

/// Handles message creation and dispatches owner commands.
///
/// Non-command messages, bot messages, and invocations by anyone other than
/// the bot owner are ignored without a reply.
pub async fn handle_message(ctx: Context, message: Message) {
    if message.author.bot {
        return;
    }

    let state = {
        let data = ctx.data.read().await;
        data.get::<AppState>().cloned()
    };
    let Some(state) = state else {
        return;
    };

    let Some(rest) = message.content.strip_prefix(&state.config.command_prefix) else {
        return;
    };
    let rest = rest.trim().to_string();
    if rest.is_empty() {
        return;
    }

    if !state.is_owner(message.author.id.get()) {
        debug!(
            "Ignoring command from non-owner {}: {}",
            message.author.id, rest
        );
        return;
    }

    if let Err(e) = commands::dispatch(&ctx, &state, &message, &rest).await {
        error!("Command '{}' failed: {:?}", rest, e);
    }
}
