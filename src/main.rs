//! Crier - game server yell relay for Discord
//!
//! Accepts yells from game servers over HTTP, delivers them to each server's
//! Discord channel at a pace Discord tolerates, and sends messages posted
//! in a server's yell channel back into the game.

mod common;
mod config;
mod discord;
mod game;
mod relay;
mod server;

use std::sync::Arc;

use anyhow::{Context as _, Result};
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use config::{env::get_config_path, load_and_validate};
use discord::commands::{parse_role_id, CommandHandler};
use discord::{run_discord, DiscordGateway, RelayHandler};
use game::GameServerClient;
use relay::{ChannelRegistry, DeliverySettings, RateLimitGovernor, YellQueue};
use server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Crier v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Please ensure {} exists and is properly formatted.", config_path);
        e
    })?;

    info!("Configuration loaded successfully");
    info!("  Bind: {}", config.relay.bind);
    info!("  Servers: {}", config.servers.len());
    for server in &config.servers {
        info!(
            "    {} -> channel {} (replies from {})",
            server.name,
            server.channel_id,
            server.yell_channel_id.as_deref().unwrap_or("none")
        );
    }
    if config.relay.testing_mode {
        warn!("Testing mode enabled: game server calls go to localhost");
    }

    // ============================================================
    // Relay core
    // ============================================================
    let gateway = Arc::new(DiscordGateway::new(config.relay.default_retry_after()));
    let registry = Arc::new(ChannelRegistry::from_config(&config, gateway.clone()));
    let queue = Arc::new(YellQueue::new(
        gateway.clone(),
        Arc::new(RateLimitGovernor::new()),
        DeliverySettings::from(&config.relay),
    ));
    queue.start();

    let shutdown = CancellationToken::new();

    // ============================================================
    // Discord
    // ============================================================
    let admin_role = config.discord.admin_role_id.as_deref().and_then(parse_role_id);
    if admin_role.is_none() {
        warn!("No discord.admin_role_id configured: queue commands are disabled");
    }

    let handler = Arc::new(RelayHandler::new(
        gateway.clone(),
        registry.clone(),
        CommandHandler::new(queue.clone(), admin_role, config.discord.command_prefix()),
        GameServerClient::new()?,
        config.relay.max_message_length,
    ));

    info!("Starting Discord bot...");
    let mut discord_task = tokio::spawn(run_discord(
        config.discord.token.clone(),
        handler,
        shutdown.clone(),
    ));

    // ============================================================
    // HTTP endpoint
    // ============================================================
    let listener = TcpListener::bind(&config.relay.bind)
        .await
        .with_context(|| format!("Failed to bind yell endpoint to {}", config.relay.bind))?;

    let state = AppState {
        registry,
        queue: queue.clone(),
        max_message_length: config.relay.max_message_length,
    };
    let mut server_task = tokio::spawn(server::serve(listener, state, shutdown.clone()));

    // ============================================================
    // Run until shutdown
    // ============================================================
    tokio::select! {
        biased;
        _ = shutdown_signal() => {
            info!("Shutdown signal received - stopping relay...");
        }
        result = &mut server_task => match result {
            Ok(Ok(())) => warn!("Yell endpoint stopped unexpectedly"),
            Ok(Err(e)) => error!("Yell endpoint failed: {:#}", e),
            Err(e) => error!("Yell endpoint task panicked: {}", e),
        },
        _ = &mut discord_task => warn!("Discord task exited"),
    }

    queue.stop();
    shutdown.cancel();

    let pending = queue.size();
    if pending > 0 {
        warn!("Discarding {} undelivered yell message(s)", pending);
    }

    let timeout = tokio::time::Duration::from_secs(5);
    if tokio::time::timeout(timeout, async {
        if !server_task.is_finished() {
            let _ = server_task.await;
        }
        if !discord_task.is_finished() {
            let _ = discord_task.await;
        }
    })
    .await
    .is_err()
    {
        warn!("Shutdown timed out");
    }

    info!("Exiting...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
