//! `$(...)` template substitution.
//!
//! The whole input is scanned exactly once: each `$(...)` token is resolved
//! independently and the replacement text is never re-scanned, so a token
//! smuggled in through a context value stays literal. Unrecognized tokens
//! are left verbatim.

use chrono::{DateTime, Datelike, Local};
use rand::Rng;
use regex::{Captures, Regex};

use crate::variables::context::VariableContext;
use crate::variables::expr;

/// Resolves `$(...)` tokens against a [`VariableContext`].
pub struct VariableProcessor {
    token: Regex,
}

impl Default for VariableProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableProcessor {
    pub fn new() -> Self {
        Self {
            // Token bodies never nest parentheses.
            token: Regex::new(r"\$\(([^()]+)\)").expect("token pattern is valid"),
        }
    }

    /// Substitutes every recognized token in `text`.
    pub fn substitute(&self, text: &str, ctx: &VariableContext) -> String {
        self.render(text, ctx, Local::now())
    }

    fn render(&self, text: &str, ctx: &VariableContext, now: DateTime<Local>) -> String {
        let mut rng = rand::rng();
        self.token
            .replace_all(text, |caps: &Captures| {
                resolve(&caps[1], ctx, now, &mut rng).unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

/// Resolves one token body. `None` leaves the token verbatim.
fn resolve(
    inner: &str,
    ctx: &VariableContext,
    now: DateTime<Local>,
    rng: &mut impl Rng,
) -> Option<String> {
    if let Some(expression) = inner.strip_prefix("math:") {
        if !expr::is_allowed_expression(expression) {
            return None;
        }
        return expr::evaluate(expression).map(expr::format_result);
    }
    if let Some(spec) = inner.strip_prefix("random:") {
        return resolve_random(spec, rng);
    }
    if let Some(choices) = inner.strip_prefix("choose:") {
        return pick(choices, rng);
    }
    if let Some(text) = inner.strip_prefix("len:") {
        return Some(text.chars().count().to_string());
    }
    if let Some(text) = inner.strip_prefix("upper:") {
        return Some(text.to_uppercase());
    }
    if let Some(conditional) = inner.strip_prefix("if:") {
        return resolve_conditional(conditional, ctx);
    }

    if let Some(value) = resolve_time(inner, now) {
        return Some(value);
    }

    let (namespace, field) = inner.split_once('.')?;
    match namespace {
        "user" => resolve_user(field, ctx),
        "server" => resolve_server(field, ctx),
        "channel" => resolve_channel(field, ctx),
        "ticket" => resolve_ticket(field, ctx),
        _ => None,
    }
}

/// `random:A-B` draws a uniform integer; `random:a|b|c` picks uniformly.
fn resolve_random(spec: &str, rng: &mut impl Rng) -> Option<String> {
    if let Some((low, high)) = spec.split_once('-') {
        if let (Ok(low), Ok(high)) = (low.parse::<i64>(), high.parse::<i64>()) {
            if low > high {
                return None;
            }
            return Some(rng.random_range(low..=high).to_string());
        }
    }
    if spec.contains('|') {
        return pick(spec, rng);
    }

    None
}

fn pick(choices: &str, rng: &mut impl Rng) -> Option<String> {
    let options: Vec<&str> = choices.split('|').collect();
    if options.is_empty() {
        return None;
    }

    Some(options[rng.random_range(0..options.len())].to_string())
}

/// `if:COND?T:F`. The condition evaluator is intentionally shallow: it
/// understands `user.bot` and non-empty checks on the other user fields,
/// and everything else resolves to `F`.
fn resolve_conditional(conditional: &str, ctx: &VariableContext) -> Option<String> {
    let (condition, branches) = conditional.split_once('?')?;
    let (true_value, false_value) = branches.split_once(':')?;

    let truthy = match (condition.strip_prefix("user."), &ctx.user) {
        (Some("bot"), Some(user)) => user.bot,
        (Some(field), Some(user)) => match field {
            "name" => !user.name.is_empty(),
            "nick" => !user.nick.is_empty(),
            "tag" => !user.tag.is_empty(),
            "avatar" => !user.avatar.is_empty(),
            _ => false,
        },
        _ => false,
    };

    Some(if truthy { true_value } else { false_value }.to_string())
}

fn resolve_time(inner: &str, now: DateTime<Local>) -> Option<String> {
    let value = match inner {
        "time" => now.format("%H:%M:%S").to_string(),
        "date" => now.format("%m/%d/%Y").to_string(),
        "datetime" => now.format("%m/%d/%Y %H:%M:%S").to_string(),
        "year" => now.year().to_string(),
        "month" => now.format("%B").to_string(),
        "day" => now.day().to_string(),
        "weekday" => now.format("%A").to_string(),
        "timestamp" => now.timestamp().to_string(),
        _ => return None,
    };

    Some(value)
}

fn resolve_user(field: &str, ctx: &VariableContext) -> Option<String> {
    let user = ctx.user.as_ref()?;
    let value = match field {
        "name" => user.name.clone(),
        "mention" => user.mention.clone(),
        "id" => user.id.clone(),
        "nick" => user.nick.clone(),
        "tag" => user.tag.clone(),
        "avatar" => user.avatar.clone(),
        "joined" => user.joined.clone(),
        "created" => user.created.clone(),
        _ => return None,
    };

    Some(value)
}

fn resolve_server(field: &str, ctx: &VariableContext) -> Option<String> {
    let server = ctx.server.as_ref()?;
    let value = match field {
        "name" => server.name.clone(),
        "membercount" => server.membercount.clone(),
        "owner" => server.owner.clone(),
        "id" => server.id.clone(),
        "icon" => server.icon.clone(),
        "created" => server.created.clone(),
        "boosts" => server.boosts.clone(),
        "channels" => server.channels.clone(),
        _ => return None,
    };

    Some(value)
}

fn resolve_channel(field: &str, ctx: &VariableContext) -> Option<String> {
    let channel = ctx.channel.as_ref()?;
    let value = match field {
        "name" => channel.name.clone(),
        "id" => channel.id.clone(),
        "mention" => channel.mention.clone(),
        "topic" => channel.topic.clone(),
        "category" => channel.category.clone(),
        "position" => channel.position.clone(),
        "created" => channel.created.clone(),
        "nsfw" => channel.nsfw.clone(),
        "slowmode" => channel.slowmode.clone(),
        _ => return None,
    };

    Some(value)
}

fn resolve_ticket(field: &str, ctx: &VariableContext) -> Option<String> {
    let ticket = ctx.ticket.as_ref()?;
    let value = match field {
        "id" => ticket.id.clone(),
        "creator" => ticket.creator.clone(),
        "category" => ticket.category.clone(),
        "status" => ticket.status.clone(),
        "staff" => ticket.staff.clone(),
        "claimed" => if ticket.claimed { "Yes" } else { "No" }.to_string(),
        "tags" => ticket.tags_display(),
        "panel" => ticket.panel.clone(),
        "transcript" => ticket.transcript_filename(),
        _ => return None,
    };

    Some(value)
}

/// Help text rendered by the `variables` command.
pub fn variable_reference() -> &'static str {
    "**User Variables**\n\
     `$(user.name)` `$(user.mention)` `$(user.id)` `$(user.nick)` `$(user.tag)` \
     `$(user.avatar)` `$(user.joined)` `$(user.created)`\n\n\
     **Server Variables**\n\
     `$(server.name)` `$(server.membercount)` `$(server.owner)` `$(server.id)` \
     `$(server.icon)` `$(server.created)` `$(server.boosts)` `$(server.channels)`\n\n\
     **Channel Variables**\n\
     `$(channel.name)` `$(channel.id)` `$(channel.mention)` `$(channel.topic)` \
     `$(channel.category)` `$(channel.position)` `$(channel.created)` \
     `$(channel.nsfw)` `$(channel.slowmode)`\n\n\
     **Time Variables**\n\
     `$(time)` `$(date)` `$(datetime)` `$(year)` `$(month)` `$(day)` \
     `$(weekday)` `$(timestamp)`\n\n\
     **Math & Logic**\n\
     `$(math:5+5)` `$(random:1-100)` `$(choose:a|b|c)` `$(if:user.bot?Bot:Human)` \
     `$(len:text)` `$(upper:text)`\n\n\
     **Ticket Variables**\n\
     `$(ticket.id)` `$(ticket.creator)` `$(ticket.category)` `$(ticket.status)` \
     `$(ticket.staff)` `$(ticket.claimed)` `$(ticket.tags)` `$(ticket.panel)` \
     `$(ticket.transcript)`"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::context::{ServerVars, TicketVars, UserVars};
    use chrono::TimeZone;

    fn ctx_with_user_and_server() -> VariableContext {
        VariableContext {
            user: Some(UserVars {
                name: "Alice".to_string(),
                nick: "Alice".to_string(),
                ..UserVars::default()
            }),
            server: Some(ServerVars {
                name: "Haven".to_string(),
                membercount: "1500".to_string(),
                ..ServerVars::default()
            }),
            ..VariableContext::default()
        }
    }

    #[test]
    fn substitutes_user_and_server_names() {
        let processor = VariableProcessor::new();
        let out = processor.substitute(
            "$(user.name) joined $(server.name)",
            &ctx_with_user_and_server(),
        );
        assert_eq!(out, "Alice joined Haven");
    }

    #[test]
    fn unrecognized_tokens_stay_verbatim() {
        let processor = VariableProcessor::new();
        let ctx = ctx_with_user_and_server();
        assert_eq!(processor.substitute("$(foo.bar)", &ctx), "$(foo.bar)");
        assert_eq!(processor.substitute("$(user.shoesize)", &ctx), "$(user.shoesize)");
    }

    #[test]
    fn missing_namespace_leaves_token_verbatim() {
        let processor = VariableProcessor::new();
        let ctx = VariableContext::default();
        assert_eq!(processor.substitute("$(user.name)", &ctx), "$(user.name)");
    }

    #[test]
    fn replacements_are_not_rescanned() {
        // A context value containing a token must come through literally.
        let processor = VariableProcessor::new();
        let mut ctx = ctx_with_user_and_server();
        ctx.server.as_mut().unwrap().name = "$(user.name)".to_string();

        let out = processor.substitute("welcome to $(server.name)", &ctx);
        assert_eq!(out, "welcome to $(user.name)");
    }

    #[test]
    fn degenerate_random_range_is_deterministic() {
        let processor = VariableProcessor::new();
        let out = processor.substitute("$(random:1-1)", &VariableContext::default());
        assert_eq!(out, "1");
    }

    #[test]
    fn random_range_stays_within_bounds() {
        let processor = VariableProcessor::new();
        for _ in 0..50 {
            let out = processor.substitute("$(random:3-7)", &VariableContext::default());
            let n: i64 = out.parse().unwrap();
            assert!((3..=7).contains(&n));
        }
    }

    #[test]
    fn inverted_random_range_stays_verbatim() {
        let processor = VariableProcessor::new();
        let out = processor.substitute("$(random:9-1)", &VariableContext::default());
        assert_eq!(out, "$(random:9-1)");
    }

    #[test]
    fn choose_picks_from_options() {
        let processor = VariableProcessor::new();
        let ctx = VariableContext::default();
        assert_eq!(processor.substitute("$(choose:only)", &ctx), "only");

        let out = processor.substitute("$(choose:red|green|blue)", &ctx);
        assert!(["red", "green", "blue"].contains(&out.as_str()));

        let piped = processor.substitute("$(random:red|blue)", &ctx);
        assert!(["red", "blue"].contains(&piped.as_str()));
    }

    #[test]
    fn math_evaluates_or_stays_verbatim() {
        let processor = VariableProcessor::new();
        let ctx = VariableContext::default();
        assert_eq!(processor.substitute("$(math:2+2)", &ctx), "4");
        assert_eq!(processor.substitute("$(math:7/2)", &ctx), "3.5");
        assert_eq!(processor.substitute("$(math:2+foo)", &ctx), "$(math:2+foo)");
        assert_eq!(processor.substitute("$(math:1/0)", &ctx), "$(math:1/0)");
    }

    #[test]
    fn string_helpers() {
        let processor = VariableProcessor::new();
        let ctx = VariableContext::default();
        assert_eq!(processor.substitute("$(len:hello)", &ctx), "5");
        assert_eq!(processor.substitute("$(upper:hello)", &ctx), "HELLO");
    }

    #[test]
    fn conditional_handles_bot_flag_and_defaults_false() {
        let processor = VariableProcessor::new();

        let mut ctx = ctx_with_user_and_server();
        assert_eq!(
            processor.substitute("$(if:user.bot?Bot:Human)", &ctx),
            "Human"
        );

        ctx.user.as_mut().unwrap().bot = true;
        assert_eq!(processor.substitute("$(if:user.bot?Bot:Human)", &ctx), "Bot");

        // Unknown conditions resolve to the false branch, not verbatim.
        assert_eq!(
            processor.substitute("$(if:server.huge?Big:Small)", &ctx),
            "Small"
        );
        // Absent user context also resolves false.
        assert_eq!(
            processor.substitute("$(if:user.bot?Bot:Human)", &VariableContext::default()),
            "Human"
        );
    }

    #[test]
    fn time_tokens_use_injected_clock() {
        let processor = VariableProcessor::new();
        let ctx = VariableContext::default();
        let now = Local.with_ymd_and_hms(2026, 8, 23, 14, 30, 5).unwrap();

        assert_eq!(processor.render("$(time)", &ctx, now), "14:30:05");
        assert_eq!(processor.render("$(date)", &ctx, now), "08/23/2026");
        assert_eq!(processor.render("$(year)", &ctx, now), "2026");
        assert_eq!(processor.render("$(day)", &ctx, now), "23");
        assert_eq!(processor.render("$(weekday)", &ctx, now), "Sunday");
        assert_eq!(
            processor.render("$(timestamp)", &ctx, now),
            now.timestamp().to_string()
        );
    }

    #[test]
    fn ticket_tokens_render_from_record() {
        let processor = VariableProcessor::new();
        let ctx = VariableContext {
            ticket: Some(TicketVars {
                id: "42".to_string(),
                creator: "Alice".to_string(),
                claimed: true,
                staff: "Mod".to_string(),
                tags: vec!["billing".to_string(), "urgent".to_string()],
                ..TicketVars::default()
            }),
            ..VariableContext::default()
        };

        assert_eq!(
            processor.substitute("#$(ticket.id) by $(ticket.creator)", &ctx),
            "#42 by Alice"
        );
        assert_eq!(processor.substitute("$(ticket.claimed)", &ctx), "Yes");
        assert_eq!(processor.substitute("$(ticket.tags)", &ctx), "billing, urgent");
        assert_eq!(
            processor.substitute("$(ticket.transcript)", &ctx),
            "transcript_42.html"
        );
    }

    #[test]
    fn reference_mentions_every_namespace() {
        let reference = variable_reference();
        for needle in ["$(user.name)", "$(server.name)", "$(channel.name)", "$(time)", "$(math:5+5)", "$(ticket.id)"] {
            assert!(reference.contains(needle), "missing {}", needle);
        }
    }
}
