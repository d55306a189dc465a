//! Test factories for Serenity model objects.
//!
//! Creates valid `Guild`, `Member`, and `GuildChannel` structs by deserializing
//! JSON shaped like Discord API payloads. Used to exercise code that extracts
//! template-variable context from live gateway objects without a gateway.

use serenity::all::{Guild, GuildChannel, Member};

/// Creates a test Serenity Guild with the fields the variable processor reads.
///
/// # Arguments
/// - `guild_id` - Discord guild ID (snowflake)
/// - `name` - Guild name
/// - `member_count` - Approximate member count reported by the gateway
///
/// # Panics
/// - If the JSON cannot be deserialized into a Guild (indicates invalid test data)
pub fn create_test_guild(guild_id: u64, name: &str, member_count: u64) -> Guild {
    serde_json::from_value(serde_json::json!({
        "id": guild_id.to_string(),
        "name": name,
        "icon": null,
        "icon_hash": null,
        "owner_id": "100000000000000000",
        "afk_timeout": 300,
        "verification_level": 0,
        "default_message_notifications": 0,
        "explicit_content_filter": 0,
        "roles": [],
        "emojis": [],
        "stickers": [],
        "features": [],
        "mfa_level": 0,
        "system_channel_flags": 0,
        "premium_tier": 0,
        "premium_subscription_count": 3,
        "premium_progress_bar_enabled": false,
        "preferred_locale": "en-US",
        "nsfw_level": 0,
        "joined_at": "2020-01-01T00:00:00.000000+00:00",
        "large": false,
        "member_count": member_count,
        "voice_states": [],
        "channels": [],
        "threads": [],
        "presences": [],
        "max_presences": 25000,
        "max_members": 100000,
        "unavailable": false,
        "members": [],
        "stage_instances": [],
        "guild_scheduled_events": [],
    }))
    .expect("Failed to create test guild - invalid JSON structure")
}

/// Creates a test Serenity Member wrapping a user with the given name.
///
/// The member belongs to guild `200000000000000000` and joined on
/// 2021-06-01. Pass `nick: None` for a member without a server nickname.
///
/// # Arguments
/// - `user_id` - Discord user ID (snowflake)
/// - `name` - Username
/// - `nick` - Optional server nickname
/// - `bot` - Whether the user is a bot account
///
/// # Panics
/// - If the JSON cannot be deserialized into a Member (indicates invalid test data)
pub fn create_test_member(user_id: u64, name: &str, nick: Option<&str>, bot: bool) -> Member {
    serde_json::from_value(serde_json::json!({
        "user": {
            "id": user_id.to_string(),
            "username": name,
            "discriminator": null,
            "global_name": name,
            "avatar": null,
            "bot": bot,
            "system": false,
            "mfa_enabled": false,
            "banner": null,
            "accent_color": null,
            "locale": null,
            "verified": null,
            "email": null,
            "flags": 0,
            "premium_type": 0,
            "public_flags": 0,
        },
        "nick": nick,
        "avatar": null,
        "roles": [],
        "joined_at": "2021-06-01T00:00:00.000000+00:00",
        "premium_since": null,
        "deaf": false,
        "mute": false,
        "flags": 0,
        "pending": false,
        "permissions": null,
        "communication_disabled_until": null,
        "guild_id": "200000000000000000",
        "unusual_dm_activity_until": null,
    }))
    .expect("Failed to create test member - invalid JSON structure")
}

/// Creates a test Serenity GuildChannel (text channel).
///
/// # Arguments
/// - `channel_id` - Discord channel ID (snowflake)
/// - `name` - Channel name
/// - `topic` - Optional channel topic
///
/// # Panics
/// - If the JSON cannot be deserialized into a GuildChannel (indicates invalid test data)
pub fn create_test_channel(channel_id: u64, name: &str, topic: Option<&str>) -> GuildChannel {
    serde_json::from_value(serde_json::json!({
        "id": channel_id.to_string(),
        "guild_id": "200000000000000000",
        "type": 0,
        "name": name,
        "position": 4,
        "permission_overwrites": [],
        "nsfw": false,
        "topic": topic,
        "parent_id": null,
        "rate_limit_per_user": 0,
        "last_message_id": null,
        "last_pin_timestamp": null,
        "bitrate": null,
        "user_limit": null,
        "rtc_region": null,
        "video_quality_mode": null,
        "message_count": null,
        "member_count": null,
        "default_auto_archive_duration": null,
        "flags": 0,
    }))
    .expect("Failed to create test channel - invalid JSON structure")
}
