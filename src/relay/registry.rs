//! Game server registry.
//!
//! Maps credentials and server names to [`ServerIdentity`] entries and
//! resolves their destination channel through a [`ChannelDirectory`].
//! Built once at startup and shared read-only.

use std::sync::Arc;

use serenity::model::id::ChannelId;

use crate::common::messages::{ChannelHandle, ServerIdentity};
use crate::config::types::Config;

/// Source of live Discord channels.
pub trait ChannelDirectory: Send + Sync {
    /// Return a handle if the channel exists and is reachable right now.
    fn lookup(&self, id: ChannelId) -> Option<ChannelHandle>;
}

/// Registry of the game servers allowed to yell.
pub struct ChannelRegistry {
    servers: Vec<ServerIdentity>,
    directory: Arc<dyn ChannelDirectory>,
}

impl ChannelRegistry {
    pub fn new(servers: Vec<ServerIdentity>, directory: Arc<dyn ChannelDirectory>) -> Self {
        Self { servers, directory }
    }

    /// Build the registry from the server list in the config.
    ///
    /// Servers without their own `api_key` share `relay.api_key`.
    pub fn from_config(config: &Config, directory: Arc<dyn ChannelDirectory>) -> Self {
        let shared_key = config.relay.api_key.clone().unwrap_or_default();
        let servers = config
            .servers
            .iter()
            .map(|server| ServerIdentity {
                name: server.name.clone(),
                channel_id: server.channel_id.clone(),
                yell_channel_id: server.yell_channel_id.clone(),
                credential: server
                    .api_key
                    .clone()
                    .filter(|key| !key.is_empty())
                    .unwrap_or_else(|| shared_key.clone()),
                url: server.url(config.relay.testing_mode),
            })
            .collect();

        Self::new(servers, directory)
    }

    pub fn servers(&self) -> &[ServerIdentity] {
        &self.servers
    }

    /// Find the server a credential belongs to.
    ///
    /// With a shared credential every server matches; the first configured
    /// one wins and callers disambiguate with an explicit server name.
    pub fn resolve_by_credential(&self, credential: &str) -> Option<&ServerIdentity> {
        if credential.is_empty() {
            return None;
        }
        self.servers.iter().find(|s| s.credential == credential)
    }

    /// Find a server by name (case-insensitive).
    pub fn resolve_by_name(&self, name: &str) -> Option<&ServerIdentity> {
        self.servers
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Find the server whose reply channel is `channel`.
    pub fn resolve_by_yell_channel(&self, channel: ChannelId) -> Option<&ServerIdentity> {
        self.servers.iter().find(|s| {
            s.yell_channel_id
                .as_deref()
                .and_then(parse_channel_id)
                .is_some_and(|id| id == channel)
        })
    }

    /// Resolve the live destination channel for a server.
    pub fn destination_channel(&self, identity: &ServerIdentity) -> Option<ChannelHandle> {
        parse_channel_id(&identity.channel_id).and_then(|id| self.directory.lookup(id))
    }
}

/// Parse a configured channel ID, rejecting zero and non-numeric values.
pub fn parse_channel_id(raw: &str) -> Option<ChannelId> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(ChannelId::new)
}
