//! Canonical message types for relay communication.
//!
//! This module defines the single source of truth for the values that
//! flow between the ingestion endpoint, the delivery queue and Discord.

use serenity::model::id::ChannelId;

/// A live Discord channel that yells can be delivered to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHandle {
    /// Discord channel ID.
    pub id: ChannelId,
    /// Discord channel name, for logging.
    pub name: String,
}

impl ChannelHandle {
    pub fn new(id: ChannelId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A formatted yell waiting for delivery.
///
/// Immutable once created. A throttled message is re-enqueued as a new
/// queue entry carrying the same content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    /// Destination channel.
    pub channel: ChannelHandle,
    /// Fully formatted text, e.g. `[Fantasy] Bob: hello`.
    pub text: String,
}

impl QueuedMessage {
    pub fn new(channel: ChannelHandle, text: impl Into<String>) -> Self {
        Self {
            channel,
            text: text.into(),
        }
    }
}

/// A game server known to the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerIdentity {
    /// Logical server name, shown as the yell prefix.
    pub name: String,
    /// Raw Discord channel ID yells are delivered to.
    pub channel_id: String,
    /// Discord channel watched for replies going back into the game.
    pub yell_channel_id: Option<String>,
    /// Shared secret the game server authenticates with.
    pub credential: String,
    /// Base URL of the game server's HTTP API.
    pub url: String,
}
