//! Plain-data substitution contexts.
//!
//! The processor works against these structs rather than live Serenity
//! objects so substitution stays synchronous and unit-testable. Converters
//! take whatever the caller already has on hand; lookups that need extra
//! cache or HTTP access (owner name, category name) are resolved by the
//! caller and passed in.

use serenity::all::{Guild, GuildChannel, Member};

const DATE_FORMAT: &str = "%B %d, %Y";

/// Values backing the `$(user.*)` namespace.
#[derive(Debug, Clone, Default)]
pub struct UserVars {
    pub name: String,
    pub mention: String,
    pub id: String,
    pub nick: String,
    pub tag: String,
    pub avatar: String,
    /// Formatted join date, `Unknown` when the member object carries none.
    pub joined: String,
    pub created: String,
    pub bot: bool,
}

impl UserVars {
    pub fn from_member(member: &Member) -> Self {
        Self {
            name: member.user.name.clone(),
            mention: format!("<@{}>", member.user.id),
            id: member.user.id.to_string(),
            nick: member.display_name().to_string(),
            tag: member.user.tag(),
            avatar: member.user.face(),
            joined: member
                .joined_at
                .map(|ts| ts.to_utc().format(DATE_FORMAT).to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            created: member
                .user
                .created_at()
                .to_utc()
                .format(DATE_FORMAT)
                .to_string(),
            bot: member.user.bot,
        }
    }
}

/// Values backing the `$(server.*)` namespace.
#[derive(Debug, Clone, Default)]
pub struct ServerVars {
    pub name: String,
    pub membercount: String,
    pub owner: String,
    pub id: String,
    pub icon: String,
    pub created: String,
    pub boosts: String,
    pub channels: String,
}

impl ServerVars {
    /// `owner_name` is looked up by the caller; the guild object only carries
    /// the owner's id.
    pub fn from_guild(guild: &Guild, owner_name: Option<String>) -> Self {
        Self {
            name: guild.name.clone(),
            membercount: guild.member_count.to_string(),
            owner: owner_name.unwrap_or_else(|| "Unknown".to_string()),
            id: guild.id.to_string(),
            icon: guild
                .icon_url()
                .unwrap_or_else(|| "No icon".to_string()),
            created: guild
                .id
                .created_at()
                .to_utc()
                .format(DATE_FORMAT)
                .to_string(),
            boosts: guild.premium_subscription_count.unwrap_or(0).to_string(),
            channels: guild.channels.len().to_string(),
        }
    }
}

/// Values backing the `$(channel.*)` namespace.
#[derive(Debug, Clone, Default)]
pub struct ChannelVars {
    pub name: String,
    pub id: String,
    pub mention: String,
    pub topic: String,
    pub category: String,
    pub position: String,
    pub created: String,
    pub nsfw: String,
    pub slowmode: String,
}

impl ChannelVars {
    /// `category_name` is looked up by the caller from the channel's parent
    /// id.
    pub fn from_channel(channel: &GuildChannel, category_name: Option<String>) -> Self {
        Self {
            name: channel.name.clone(),
            id: channel.id.to_string(),
            mention: format!("<#{}>", channel.id),
            topic: channel
                .topic
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "No topic set".to_string()),
            category: category_name.unwrap_or_else(|| "No category".to_string()),
            position: channel.position.to_string(),
            created: channel
                .id
                .created_at()
                .to_utc()
                .format(DATE_FORMAT)
                .to_string(),
            nsfw: if channel.nsfw { "Yes" } else { "No" }.to_string(),
            slowmode: match channel.rate_limit_per_user {
                Some(delay) if delay > 0 => format!("{} seconds", delay),
                _ => "Disabled".to_string(),
            },
        }
    }
}

/// Values backing the `$(ticket.*)` namespace, assembled from a ticket
/// record by the calling feature.
#[derive(Debug, Clone)]
pub struct TicketVars {
    pub id: String,
    pub creator: String,
    pub category: String,
    pub status: String,
    pub staff: String,
    pub claimed: bool,
    pub tags: Vec<String>,
    pub panel: String,
}

impl Default for TicketVars {
    fn default() -> Self {
        Self {
            id: "Unknown".to_string(),
            creator: "Unknown".to_string(),
            category: "General".to_string(),
            status: "open".to_string(),
            staff: "Unassigned".to_string(),
            claimed: false,
            tags: Vec::new(),
            panel: "Direct".to_string(),
        }
    }
}

impl TicketVars {
    pub fn tags_display(&self) -> String {
        if self.tags.is_empty() {
            "None".to_string()
        } else {
            self.tags.join(", ")
        }
    }

    pub fn transcript_filename(&self) -> String {
        format!("transcript_{}.html", self.id)
    }
}

/// Everything a substitution pass may draw from. Any part may be absent;
/// tokens whose namespace is missing stay verbatim.
#[derive(Debug, Clone, Default)]
pub struct VariableContext {
    pub user: Option<UserVars>,
    pub server: Option<ServerVars>,
    pub channel: Option<ChannelVars>,
    pub ticket: Option<TicketVars>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::serenity::{create_test_channel, create_test_guild, create_test_member};

    #[test]
    fn member_converts_to_user_vars() {
        let member = create_test_member(100000000000000001, "alice", Some("Ally"), false);

        let vars = UserVars::from_member(&member);
        assert_eq!(vars.name, "alice");
        assert_eq!(vars.nick, "Ally");
        assert_eq!(vars.id, "100000000000000001");
        assert_eq!(vars.mention, "<@100000000000000001>");
        assert_eq!(vars.joined, "June 01, 2021");
        assert!(!vars.bot);
    }

    #[test]
    fn guild_converts_to_server_vars() {
        let guild = create_test_guild(200000000000000000, "Haven", 1500);

        let vars = ServerVars::from_guild(&guild, Some("owner#0".to_string()));
        assert_eq!(vars.name, "Haven");
        assert_eq!(vars.membercount, "1500");
        assert_eq!(vars.owner, "owner#0");

        let no_owner = ServerVars::from_guild(&guild, None);
        assert_eq!(no_owner.owner, "Unknown");
    }

    #[test]
    fn channel_converts_to_channel_vars() {
        let channel = create_test_channel(300000000000000000, "general", Some("daily chatter"));

        let vars = ChannelVars::from_channel(&channel, None);
        assert_eq!(vars.name, "general");
        assert_eq!(vars.mention, "<#300000000000000000>");
        assert_eq!(vars.topic, "daily chatter");
        assert_eq!(vars.category, "No category");
        assert_eq!(vars.nsfw, "No");
        assert_eq!(vars.slowmode, "Disabled");
    }

    #[test]
    fn ticket_defaults_match_unclaimed_record() {
        let vars = TicketVars::default();
        assert_eq!(vars.staff, "Unassigned");
        assert_eq!(vars.tags_display(), "None");
        assert_eq!(vars.transcript_filename(), "transcript_Unknown.html");
    }
}
