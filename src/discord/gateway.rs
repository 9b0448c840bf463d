//! Live Discord connection shared with the relay.
//!
//! The gateway starts detached and is attached to serenity's HTTP client and
//! cache once the bot is ready. Until then every channel lookup misses and
//! every send fails, so yells are rejected with a resolution error instead
//! of queueing up against a connection that does not exist yet.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serenity::async_trait;
use serenity::builder::{CreateAllowedMentions, CreateMessage};
use serenity::cache::Cache;
use serenity::http::Http;
use serenity::model::id::ChannelId;

use crate::common::error::SendError;
use crate::common::messages::ChannelHandle;
use crate::relay::registry::ChannelDirectory;
use crate::relay::sink::ChatSink;

pub struct DiscordGateway {
    http: RwLock<Option<Arc<Http>>>,
    cache: RwLock<Option<Arc<Cache>>>,
    /// Cooldown applied when a throttle carries no retry-after.
    default_retry_after: Duration,
}

impl DiscordGateway {
    pub fn new(default_retry_after: Duration) -> Self {
        Self {
            http: RwLock::new(None),
            cache: RwLock::new(None),
            default_retry_after,
        }
    }

    /// Bind to a connected client's HTTP API and cache.
    pub fn attach(&self, http: Arc<Http>, cache: Arc<Cache>) {
        *self.http.write() = Some(http);
        *self.cache.write() = Some(cache);
    }
}

#[async_trait]
impl ChatSink for DiscordGateway {
    async fn send(&self, channel: &ChannelHandle, text: &str) -> Result<(), SendError> {
        let http = self
            .http
            .read()
            .clone()
            .ok_or_else(|| SendError::Transient("Discord is not connected".to_string()))?;

        // Game chat must never ping @everyone, roles or users
        let message = CreateMessage::new()
            .content(text)
            .allowed_mentions(CreateAllowedMentions::new());

        channel
            .id
            .send_message(&*http, message)
            .await
            .map(|_| ())
            .map_err(|e| classify_send_error(&e, self.default_retry_after))
    }
}

impl ChannelDirectory for DiscordGateway {
    fn lookup(&self, id: ChannelId) -> Option<ChannelHandle> {
        let cache = self.cache.read().clone()?;
        let name = cache.guilds().into_iter().find_map(|guild_id| {
            let guild = cache.guild(guild_id)?;
            guild.channels.get(&id).map(|channel| channel.name.clone())
        })?;
        Some(ChannelHandle::new(id, name))
    }
}

/// Map a serenity error onto the relay's retry policy.
///
/// HTTP 429 responses and errors whose text mentions a rate limit are
/// throttles; everything else is a final failure.
pub fn classify_send_error(error: &serenity::Error, default_retry_after: Duration) -> SendError {
    let status_throttled = match error {
        serenity::Error::Http(http_error) => http_error
            .status_code()
            .is_some_and(|status| status.as_u16() == 429),
        _ => false,
    };

    let description = error.to_string();
    if status_throttled || description.to_lowercase().contains("rate limit") {
        SendError::Throttled {
            retry_after: default_retry_after,
        }
    } else {
        SendError::Transient(description)
    }
}
