//! Owner-only prefix command surface.
//!
//! Commands are plain messages starting with the configured prefix
//! (`s.` by default): `cluster` and `ratelimit` command groups plus the
//! `variables` reference and preview. The message handler has already
//! checked the owner gate before anything here runs.

use std::sync::Arc;

use serenity::all::{Context, CreateEmbed, CreateMessage, Message, MessageReference, Timestamp};

use crate::error::AppError;
use crate::state::AppState;

pub mod cluster;
pub mod ratelimit;
pub mod variables;

pub(crate) const EMBED_COLOR_INFO: u32 = 0x00D9FF;
pub(crate) const EMBED_COLOR_SUCCESS: u32 = 0x00FF00;
pub(crate) const EMBED_COLOR_ERROR: u32 = 0xFF0000;

/// Routes one owner command line to its handler.
///
/// Unknown commands are ignored without a reply, matching the silent
/// treatment of non-owner invocations.
pub async fn dispatch(
    ctx: &Context,
    state: &Arc<AppState>,
    message: &Message,
    input: &str,
) -> Result<(), AppError> {
    let mut parts = input.split_whitespace();
    let Some(command) = parts.next() else {
        return Ok(());
    };
    let args: Vec<&str> = parts.collect();

    match command {
        "cluster" => cluster::handle(ctx, state, message, &args).await,
        "ratelimit" => ratelimit::handle(ctx, state, message, &args).await,
        "variables" => variables::handle(ctx, state, message, &args).await,
        _ => Ok(()),
    }
}

/// Replies to the invoking message with an embed, without pinging the
/// author.
pub(crate) async fn reply_embed(
    ctx: &Context,
    message: &Message,
    embed: CreateEmbed,
) -> Result<(), AppError> {
    message
        .channel_id
        .send_message(
            &ctx.http,
            CreateMessage::new()
                .embed(embed.timestamp(Timestamp::now()))
                .reference_message(MessageReference::from(message)),
        )
        .await?;

    Ok(())
}
