//! Discord event handling.
//!
//! Attaches the relay's gateway once the bot is ready, runs queue commands,
//! and forwards messages posted in a server's yell channel back into that
//! game server.

use std::sync::Arc;

use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use tracing::{error, info};

use crate::discord::commands::CommandHandler;
use crate::discord::gateway::DiscordGateway;
use crate::discord::resolver::ReplyResolver;
use crate::game::client::GameServerClient;
use crate::relay::registry::ChannelRegistry;

/// Discord event handler.
pub struct RelayHandler {
    gateway: Arc<DiscordGateway>,
    registry: Arc<ChannelRegistry>,
    commands: CommandHandler,
    resolver: ReplyResolver,
    game: GameServerClient,
    max_message_length: usize,
}

impl RelayHandler {
    pub fn new(
        gateway: Arc<DiscordGateway>,
        registry: Arc<ChannelRegistry>,
        commands: CommandHandler,
        game: GameServerClient,
        max_message_length: usize,
    ) -> Self {
        Self {
            gateway,
            registry,
            commands,
            resolver: ReplyResolver::new(),
            game,
            max_message_length,
        }
    }
}

#[async_trait]
impl EventHandler for RelayHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Discord bot connected as {}", ready.user.name);
        self.gateway.attach(ctx.http.clone(), ctx.cache.clone());
        info!(
            "Relaying yells for {} server(s) in {} guild(s)",
            self.registry.servers().len(),
            ready.guilds.len()
        );
    }

    async fn message(&self, ctx: Context, msg: Message) {
        // Ignore bots, including our own yells
        if msg.author.bot {
            return;
        }

        // Only handle guild (server) messages
        if msg.guild_id.is_none() {
            return;
        }

        match self.commands.handle_command(&ctx, &msg).await {
            Ok(true) => return,
            Ok(false) => {}
            Err(e) => {
                error!("Command handler error: {}", e);
                return;
            }
        }

        let Some(server) = self.registry.resolve_by_yell_channel(msg.channel_id) else {
            return;
        };

        let content = msg.content_safe(&ctx.cache);
        let Some(text) = self.resolver.prepare_reply(&content, self.max_message_length) else {
            return;
        };

        // Effective display name: guild nickname, else username
        let sender = msg
            .member
            .as_ref()
            .and_then(|m| m.nick.clone())
            .unwrap_or_else(|| msg.author.name.clone());

        match self.game.send_discord_yell(server, &sender, &text).await {
            Ok(()) => info!("Discord -> {} [{}]: {}", server.name, sender, text),
            Err(e) => error!("Failed to send Discord yell to game server: {:#}", e),
        }
    }
}
