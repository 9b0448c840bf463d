//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::common::error::ConfigError;
use crate::config::types::{Config, CHANNEL_PLACEHOLDER};

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    // Validate Discord config
    if config.discord.token.is_empty() {
        errors.push("discord.token is required".to_string());
    }
    if config.discord.token == "YOUR_DISCORD_TOKEN_HERE" {
        errors.push("discord.token has not been configured (still using placeholder)".to_string());
    }
    if let Some(ref role) = config.discord.admin_role_id {
        if !is_snowflake(role) {
            errors.push(format!("discord.admin_role_id '{}' is not a valid ID", role));
        }
    }

    // Validate relay config
    if config.relay.bind.parse::<SocketAddr>().is_err() {
        errors.push(format!(
            "relay.bind '{}' is not a valid socket address",
            config.relay.bind
        ));
    }
    if config.relay.max_message_length == 0 {
        errors.push("relay.max_message_length must be non-zero".to_string());
    }
    if config.relay.pacing_ms == 0 {
        errors.push("relay.pacing_ms must be non-zero".to_string());
    }
    if config.relay.idle_poll_ms == 0 {
        errors.push("relay.idle_poll_ms must be non-zero".to_string());
    }
    if config.relay.default_retry_after_ms == 0 {
        errors.push("relay.default_retry_after_ms must be non-zero".to_string());
    }
    if config.relay.max_pending == Some(0) {
        errors.push("relay.max_pending must be non-zero when set".to_string());
    }
    let shared_key = config
        .relay
        .api_key
        .as_deref()
        .is_some_and(|key| !key.is_empty());

    // Validate server entries
    if config.servers.is_empty() {
        errors.push("servers is empty - no yell routing configured".to_string());
    }

    let mut names = HashSet::new();
    for (i, server) in config.servers.iter().enumerate() {
        if server.name.trim().is_empty() {
            errors.push(format!("servers[{}].name is required", i));
        } else if !names.insert(server.name.to_lowercase()) {
            errors.push(format!("servers[{}].name '{}' is duplicated", i, server.name));
        }
        if server.host.is_empty() {
            errors.push(format!("servers[{}].host is required", i));
        }
        if server.port == 0 {
            errors.push(format!("servers[{}].port must be non-zero", i));
        }
        if server.channel_id != CHANNEL_PLACEHOLDER && !is_snowflake(&server.channel_id) {
            errors.push(format!(
                "servers[{}].channel_id '{}' is not a valid channel ID",
                i, server.channel_id
            ));
        }
        if let Some(ref yell_channel) = server.yell_channel_id {
            if !is_snowflake(yell_channel) {
                errors.push(format!(
                    "servers[{}].yell_channel_id '{}' is not a valid channel ID",
                    i, yell_channel
                ));
            }
        }
        let own_key = server.api_key.as_deref().is_some_and(|key| !key.is_empty());
        if !own_key && !shared_key {
            errors.push(format!(
                "servers[{}] has no credential (set relay.api_key or servers[{}].api_key)",
                i, i
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}

/// Whether the value is a non-zero Discord ID.
pub fn is_snowflake(value: &str) -> bool {
    value.parse::<u64>().is_ok_and(|id| id != 0)
}
