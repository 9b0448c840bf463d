//! Discord queue commands (`!yells`, `!yells clear`).
//!
//! Lets operators inspect and purge the yell backlog, e.g. after a long
//! rate-limit cooldown. Restricted to members holding the admin role.

use std::sync::Arc;

use serenity::model::channel::Message;
use serenity::model::id::RoleId;
use serenity::prelude::*;
use tracing::{debug, info, warn};

use crate::relay::queue::YellQueue;

/// Queue management commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueCommand {
    /// Report the current backlog (`!yells`).
    Status,
    /// Drop every pending yell (`!yells clear`).
    Clear,
    /// Unknown subcommand; reply with usage.
    Usage,
}

/// Parse a queue command. Returns `None` for anything else.
pub fn parse_command(content: &str, prefix: &str) -> Option<QueueCommand> {
    if content.len() > 100 {
        return None;
    }
    let rest = content.trim().strip_prefix(prefix)?;

    let mut parts = rest.split_whitespace();
    if !parts.next()?.eq_ignore_ascii_case("yells") {
        return None;
    }

    match parts.next().map(str::to_lowercase).as_deref() {
        None => Some(QueueCommand::Status),
        Some("clear") => Some(QueueCommand::Clear),
        Some(_) => Some(QueueCommand::Usage),
    }
}

/// Parse a configured role ID, rejecting zero and non-numeric values.
pub fn parse_role_id(raw: &str) -> Option<RoleId> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(RoleId::new)
}

/// Command handler for queue management.
pub struct CommandHandler {
    queue: Arc<YellQueue>,
    admin_role: Option<RoleId>,
    prefix: String,
}

impl CommandHandler {
    pub fn new(queue: Arc<YellQueue>, admin_role: Option<RoleId>, prefix: impl Into<String>) -> Self {
        Self {
            queue,
            admin_role,
            prefix: prefix.into(),
        }
    }

    /// Parse and execute a command from Discord.
    ///
    /// Returns `true` if the message was a command, `false` otherwise.
    pub async fn handle_command(&self, ctx: &Context, msg: &Message) -> anyhow::Result<bool> {
        let Some(command) = parse_command(&msg.content, &self.prefix) else {
            return Ok(false);
        };
        debug!("Processing command {:?} from {}", command, msg.author.name);

        let roles = msg
            .member
            .as_ref()
            .map(|member| member.roles.as_slice())
            .unwrap_or_default();

        let reply = if self.is_authorized(roles) {
            self.execute(command)
        } else {
            warn!("Refused {:?} from {}: missing admin role", command, msg.author.name);
            "You don't have permission to manage the yell queue.".to_string()
        };

        msg.channel_id.say(&ctx.http, reply).await?;
        Ok(true)
    }

    /// Whether a member with `roles` may manage the queue.
    ///
    /// Always false when no admin role is configured.
    pub fn is_authorized(&self, roles: &[RoleId]) -> bool {
        self.admin_role.is_some_and(|admin| roles.contains(&admin))
    }

    /// Run a command against the queue and build the reply text.
    pub fn execute(&self, command: QueueCommand) -> String {
        match command {
            QueueCommand::Status => {
                let pending = self.queue.size();
                let cooldown = self
                    .queue
                    .governor()
                    .remaining()
                    .map(|left| format!(" (rate limited for {:.1}s)", left.as_secs_f64()))
                    .unwrap_or_default();
                format!("{} yell message(s) waiting for delivery{}.", pending, cooldown)
            }
            QueueCommand::Clear => {
                let cleared = self.queue.clear();
                info!("Yell queue cleared from Discord: {} messages removed", cleared);
                format!("Cleared {} pending yell message(s).", cleared)
            }
            QueueCommand::Usage => format!(
                "**Usage:**\n• `{p}yells` - Show pending yell count\n• `{p}yells clear` - Drop all pending yells",
                p = self.prefix
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use serenity::model::id::ChannelId;

    use super::*;
    use crate::common::messages::ChannelHandle;
    use crate::relay::governor::RateLimitGovernor;
    use crate::relay::queue::DeliverySettings;
    use crate::relay::sink::testing::RecordingSink;

    fn make_handler(admin_role: Option<RoleId>) -> CommandHandler {
        let queue = YellQueue::new(
            Arc::new(RecordingSink::new()),
            Arc::new(RateLimitGovernor::new()),
            DeliverySettings::default(),
        );
        CommandHandler::new(Arc::new(queue), admin_role, "!")
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("!yells", "!"), Some(QueueCommand::Status));
        assert_eq!(parse_command("  !YELLS  ", "!"), Some(QueueCommand::Status));
        assert_eq!(parse_command("!yells clear", "!"), Some(QueueCommand::Clear));
        assert_eq!(parse_command("!yells Clear", "!"), Some(QueueCommand::Clear));
        assert_eq!(parse_command("!yells purge", "!"), Some(QueueCommand::Usage));
        assert_eq!(parse_command("?yells", "?"), Some(QueueCommand::Status));

        assert_eq!(parse_command("yells", "!"), None);
        assert_eq!(parse_command("!yellsclear", "!"), None);
        assert_eq!(parse_command("!who", "!"), None);
        assert_eq!(parse_command("hello !yells", "!"), None);
    }

    #[test]
    fn test_parse_role_id() {
        assert_eq!(parse_role_id("42"), Some(RoleId::new(42)));
        assert_eq!(parse_role_id("0"), None);
        assert_eq!(parse_role_id("admins"), None);
    }

    #[test]
    fn test_authorization_requires_configured_role() {
        let admin = RoleId::new(7);

        let handler = make_handler(Some(admin));
        assert!(handler.is_authorized(&[RoleId::new(1), admin]));
        assert!(!handler.is_authorized(&[RoleId::new(1)]));
        assert!(!handler.is_authorized(&[]));

        let unconfigured = make_handler(None);
        assert!(!unconfigured.is_authorized(&[admin]));
    }

    #[tokio::test]
    async fn test_status_and_clear() {
        let handler = make_handler(None);
        let channel = ChannelHandle::new(ChannelId::new(1), "yells");
        for i in 0..3 {
            handler.queue.enqueue(channel.clone(), format!("yell {}", i)).unwrap();
        }

        assert_eq!(
            handler.execute(QueueCommand::Status),
            "3 yell message(s) waiting for delivery."
        );
        assert_eq!(
            handler.execute(QueueCommand::Clear),
            "Cleared 3 pending yell message(s)."
        );
        assert_eq!(handler.queue.size(), 0);
        assert_eq!(
            handler.execute(QueueCommand::Clear),
            "Cleared 0 pending yell message(s)."
        );
    }
}
