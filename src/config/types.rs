//! Configuration type definitions.

use std::time::Duration;

use serde::Deserialize;

/// Default port the yell endpoint listens on.
pub const DEFAULT_BIND: &str = "0.0.0.0:8091";

/// Longest yell accepted from either side, in characters.
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 300;

/// Placeholder left in sample configs for servers without a channel.
pub const CHANNEL_PLACEHOLDER: &str = "YOUR_DISCORD_CHANNEL_ID";

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub discord: DiscordConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub servers: Vec<ServerConfig>,
}

/// Discord bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    pub token: String,
    /// Role allowed to manage the yell queue from Discord.
    pub admin_role_id: Option<String>,
    /// Prefix for text commands (default "!").
    pub command_prefix: Option<String>,
}

impl DiscordConfig {
    pub fn command_prefix(&self) -> &str {
        self.command_prefix.as_deref().unwrap_or("!")
    }
}

/// Yell relay settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Shared credential accepted for every server.
    pub api_key: Option<String>,
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
    #[serde(default = "default_idle_poll_ms")]
    pub idle_poll_ms: u64,
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    #[serde(default = "default_retry_after_ms")]
    pub default_retry_after_ms: u64,
    /// Backlog bound (None = unbounded).
    pub max_pending: Option<usize>,
    /// Force every game server host to localhost.
    #[serde(default)]
    pub testing_mode: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            api_key: None,
            max_message_length: default_max_message_length(),
            idle_poll_ms: default_idle_poll_ms(),
            pacing_ms: default_pacing_ms(),
            default_retry_after_ms: default_retry_after_ms(),
            max_pending: None,
            testing_mode: false,
        }
    }
}

impl RelayConfig {
    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn default_retry_after(&self) -> Duration {
        Duration::from_millis(self.default_retry_after_ms)
    }
}

/// A game server entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub host: String,
    pub port: u16,
    /// Discord channel receiving this server's yells.
    pub channel_id: String,
    /// Discord channel whose messages are sent back into the game.
    pub yell_channel_id: Option<String>,
    /// Per-server credential, overriding `relay.api_key`.
    pub api_key: Option<String>,
}

impl ServerConfig {
    /// Base URL of the server's HTTP API, honouring testing mode.
    pub fn url(&self, testing_mode: bool) -> String {
        let host = if testing_mode { "localhost" } else { &self.host };
        format!("http://{}:{}", host, self.port)
    }
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_max_message_length() -> usize {
    DEFAULT_MAX_MESSAGE_LENGTH
}

fn default_idle_poll_ms() -> u64 {
    100
}

fn default_pacing_ms() -> u64 {
    1000
}

fn default_retry_after_ms() -> u64 {
    5000
}
