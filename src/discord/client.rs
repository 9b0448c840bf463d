//! Discord connection lifecycle.
//!
//! Builds the serenity client around the relay's event handler and keeps it
//! connected, rebuilding it with exponential backoff after failures.

use std::sync::Arc;
use std::time::Duration;

use backon::BackoffBuilder;
use serenity::http::HttpBuilder;
use serenity::prelude::*;
use serenity::Client;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::discord::handler::RelayHandler;

/// Longest wait between reconnection attempts.
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(300);

async fn build_client(token: &str, handler: Arc<RelayHandler>) -> anyhow::Result<Client> {
    let intents =
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;

    // Build a custom reqwest client with timeout settings
    let reqwest_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .connect_timeout(Duration::from_secs(10))
        .build()?;

    let http = HttpBuilder::new(token).client(reqwest_client).build();

    let client = serenity::client::ClientBuilder::new_with_http(http, intents)
        .event_handler_arc(handler)
        .await?;
    Ok(client)
}

/// Create an exponential backoff iterator for Discord reconnection.
/// 5s initial, 5min max, factor 1.1, with jitter, unlimited retries.
fn discord_backoff() -> impl Iterator<Item = Duration> {
    backon::ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(5))
        .with_max_delay(MAX_RECONNECT_DELAY)
        .with_factor(1.1)
        .with_jitter()
        .without_max_times()
        .build()
}

/// Run the Discord connection until `shutdown` is cancelled or the client
/// exits normally.
pub async fn run_discord(token: String, handler: Arc<RelayHandler>, shutdown: CancellationToken) {
    let mut backoff = discord_backoff();

    loop {
        info!("Connecting to Discord...");

        let mut client = match build_client(&token, Arc::clone(&handler)).await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to build Discord client: {}", e);
                if !wait_before_retry(&mut backoff, &shutdown).await {
                    break;
                }
                continue;
            }
        };
        let shard_manager = client.shard_manager.clone();

        tokio::select! {
            result = client.start() => match result {
                Ok(()) => {
                    info!("Discord client disconnected normally");
                    break;
                }
                Err(e) => {
                    error!("Discord client error: {}", e);
                    if !wait_before_retry(&mut backoff, &shutdown).await {
                        break;
                    }
                }
            },
            _ = shutdown.cancelled() => {
                info!("Initiating graceful Discord shutdown...");
                shard_manager.shutdown_all().await;
                info!("Discord shutdown complete");
                break;
            }
        }
    }

    info!("Discord task ended");
}

/// Sleep for the next backoff delay. Returns `false` if shut down meanwhile.
async fn wait_before_retry(
    backoff: &mut impl Iterator<Item = Duration>,
    shutdown: &CancellationToken,
) -> bool {
    let delay = backoff.next().unwrap_or(MAX_RECONNECT_DELAY);
    warn!("Reconnecting to Discord in {:.1}s...", delay.as_secs_f64());

    tokio::select! {
        _ = sleep(delay) => true,
        _ = shutdown.cancelled() => false,
    }
}
