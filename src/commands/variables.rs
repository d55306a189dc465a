//! `variables` command group: template variable reference and live preview.

use std::sync::Arc;

use serenity::all::{Context, CreateEmbed, Message};

use crate::commands::{reply_embed, EMBED_COLOR_INFO};
use crate::error::AppError;
use crate::state::AppState;
use crate::variables::{variable_reference, ChannelVars, ServerVars, UserVars, VariableContext};

pub async fn handle(
    ctx: &Context,
    state: &Arc<AppState>,
    message: &Message,
    args: &[&str],
) -> Result<(), AppError> {
    match args.first().copied() {
        Some("test") | Some("preview") if args.len() > 1 => {
            preview(ctx, state, message, &args[1..].join(" ")).await
        }
        _ => reference(ctx, state, message).await,
    }
}

async fn reference(
    ctx: &Context,
    state: &Arc<AppState>,
    message: &Message,
) -> Result<(), AppError> {
    let prefix = &state.config.command_prefix;
    let embed = CreateEmbed::new()
        .title("Template Variable Reference")
        .description(variable_reference())
        .color(EMBED_COLOR_INFO)
        .field(
            "Try It",
            format!("`{prefix}variables test Hello $(user.name)!` renders a template live"),
            false,
        );

    reply_embed(ctx, message, embed).await
}

/// Renders a template against the invoking user, guild, and channel so
/// variables can be checked before they go into real message content.
async fn preview(
    ctx: &Context,
    state: &Arc<AppState>,
    message: &Message,
    template: &str,
) -> Result<(), AppError> {
    let var_ctx = build_context(ctx, message).await;
    let rendered = state.variables.substitute(template, &var_ctx);

    let embed = CreateEmbed::new()
        .title("Variable Preview")
        .description(rendered)
        .color(EMBED_COLOR_INFO)
        .field("Raw Input", format!("`{}`", template), false);

    reply_embed(ctx, message, embed).await
}

/// Assembles a substitution context from whatever the cache knows about the
/// invocation. Direct messages get an empty context; unresolvable parts are
/// simply left out and their tokens stay verbatim.
async fn build_context(ctx: &Context, message: &Message) -> VariableContext {
    let mut var_ctx = VariableContext::default();

    let Some(guild_id) = message.guild_id else {
        return var_ctx;
    };

    if let Ok(member) = guild_id.member(ctx, message.author.id).await {
        var_ctx.user = Some(UserVars::from_member(&member));
    }

    // Everything needed from the cache is cloned out before the guard drops.
    let cached = ctx.cache.guild(guild_id).map(|guild| {
        let owner_name = guild
            .members
            .get(&guild.owner_id)
            .map(|m| m.user.name.clone());
        let channel = guild.channels.get(&message.channel_id).cloned();
        let category_name = channel
            .as_ref()
            .and_then(|c| c.parent_id)
            .and_then(|id| guild.channels.get(&id).map(|c| c.name.clone()));
        (
            ServerVars::from_guild(&guild, owner_name),
            channel,
            category_name,
        )
    });

    if let Some((server, channel, category_name)) = cached {
        var_ctx.server = Some(server);
        if let Some(channel) = channel {
            var_ctx.channel = Some(ChannelVars::from_channel(&channel, category_name));
        }
    }

    var_ctx
}
