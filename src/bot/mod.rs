//! Discord bot integration.
//!
//! The bot connects this cluster's shard range to the gateway and feeds the
//! monitoring services: the ready handler resolves the bot owner and marks
//! the cluster running, the message handler dispatches the owner-only command
//! surface, and the ratelimit hook records every HTTP 429 the client observes.
//!
//! # Gateway Intents
//!
//! The bot requires the following gateway intents:
//! - `GUILDS` - Guild create/delete events and the guild cache
//! - `GUILD_MESSAGES` - Message events for the prefix commands
//! - `MESSAGE_CONTENT` - Reading command text (privileged intent)
//!
//! Note: `MESSAGE_CONTENT` is a privileged intent and must be explicitly
//! enabled in the Discord Developer Portal for the bot application.

pub mod handler;
pub mod start;
