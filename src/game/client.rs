//! HTTP client for the game servers' API.
//!
//! Discord replies are pushed into the game with `POST {url}/discord-yell`,
//! authenticated with the server's credential.

use std::time::Duration;

use anyhow::Context as _;
use serde::Serialize;
use tracing::debug;

use crate::common::messages::ServerIdentity;

/// Body of a `/discord-yell` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DiscordYell<'a> {
    discord_username: &'a str,
    message: &'a str,
}

/// Client for game server HTTP endpoints.
#[derive(Debug, Clone)]
pub struct GameServerClient {
    http: reqwest::Client,
}

impl GameServerClient {
    /// Create a client with timeouts short enough that an offline game
    /// server cannot stall the Discord event loop.
    pub fn new() -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self { http })
    }

    /// Send a Discord message into the game as a yell.
    pub async fn send_discord_yell(
        &self,
        server: &ServerIdentity,
        discord_username: &str,
        message: &str,
    ) -> anyhow::Result<()> {
        let url = endpoint_url(&server.url, "/discord-yell");
        let payload = DiscordYell {
            discord_username,
            message,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&server.credential)
            .header("X-API-Key", &server.credential)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("Failed to reach game server {} at {}", server.name, url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Game server {} returned {}: {}", server.name, status, body);
        }

        debug!("Game server {} accepted Discord yell from {}", server.name, discord_username);
        Ok(())
    }
}

fn endpoint_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use parking_lot::Mutex;
    use tokio::net::TcpListener;

    use super::*;

    #[derive(Debug, Clone)]
    struct Received {
        authorization: Option<String>,
        api_key: Option<String>,
        body: serde_json::Value,
    }

    async fn spawn_game_server(status: StatusCode) -> (String, Arc<Mutex<Vec<Received>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);

        let app = Router::new().route(
            "/discord-yell",
            post(move |headers: HeaderMap, Json(body): Json<serde_json::Value>| {
                let sink = Arc::clone(&sink);
                async move {
                    let header = |name: &str| {
                        headers
                            .get(name)
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string)
                    };
                    sink.lock().push(Received {
                        authorization: header("authorization"),
                        api_key: header("x-api-key"),
                        body,
                    });
                    status
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/", addr), received)
    }

    fn server(url: String) -> ServerIdentity {
        ServerIdentity {
            name: "Fantasy".to_string(),
            channel_id: "111".to_string(),
            yell_channel_id: Some("333".to_string()),
            credential: "secret".to_string(),
            url,
        }
    }

    #[test]
    fn test_endpoint_url() {
        assert_eq!(
            endpoint_url("http://localhost:8090/", "/discord-yell"),
            "http://localhost:8090/discord-yell"
        );
        assert_eq!(
            endpoint_url("http://localhost:8090", "/discord-yell"),
            "http://localhost:8090/discord-yell"
        );
    }

    #[tokio::test]
    async fn test_send_discord_yell() {
        let (url, received) = spawn_game_server(StatusCode::OK).await;
        let client = GameServerClient::new().unwrap();

        client
            .send_discord_yell(&server(url), "Alice", "hi from discord")
            .await
            .unwrap();

        let received = received.lock().clone();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].authorization.as_deref(), Some("Bearer secret"));
        assert_eq!(received[0].api_key.as_deref(), Some("secret"));
        assert_eq!(
            received[0].body,
            serde_json::json!({ "discordUsername": "Alice", "message": "hi from discord" })
        );
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let (url, _) = spawn_game_server(StatusCode::UNAUTHORIZED).await;
        let client = GameServerClient::new().unwrap();

        let error = client
            .send_discord_yell(&server(url), "Alice", "hi")
            .await
            .unwrap_err();
        assert!(error.to_string().contains("401"), "got: {}", error);
    }
}
