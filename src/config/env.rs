//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `CRIER_DISCORD_TOKEN` - Discord bot token
//! - `CRIER_API_KEY` - Shared credential for game servers
//! - `CRIER_BIND` - Address the yell endpoint listens on
//! - `CRIER_TESTING_MODE` - Route game server calls to localhost

use std::env;

use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "CRIER";

/// Apply environment variable overrides to a config.
///
/// This allows secrets like the bot token and API key to be
/// provided via environment variables instead of the config file.
pub fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(token) = env::var(format!("{}_DISCORD_TOKEN", ENV_PREFIX)) {
        config.discord.token = token;
    }

    if let Ok(api_key) = env::var(format!("{}_API_KEY", ENV_PREFIX)) {
        config.relay.api_key = Some(api_key);
    }

    if let Ok(bind) = env::var(format!("{}_BIND", ENV_PREFIX)) {
        config.relay.bind = bind;
    }

    if let Ok(testing) = env::var(format!("{}_TESTING_MODE", ENV_PREFIX)) {
        if let Some(enabled) = parse_flag(&testing) {
            config.relay.testing_mode = enabled;
        }
    }

    config
}

/// Check if any secret environment variables are set but empty.
///
/// Returns a list of variable names that are set but empty.
pub fn check_empty_env_vars() -> Vec<String> {
    let vars = [
        format!("{}_DISCORD_TOKEN", ENV_PREFIX),
        format!("{}_API_KEY", ENV_PREFIX),
    ];

    vars.into_iter()
        .filter(|var| env::var(var).map(|v| v.is_empty()).unwrap_or(false))
        .collect()
}

/// Get the config file path from environment or use default.
///
/// Checks `CRIER_CONFIG` environment variable, otherwise returns "crier.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "crier.conf".to_string())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
