//! Discord bot integration.
//!
//! Connects the relay to Discord: the gateway delivers queued yells and
//! resolves channels, the handler sends replies back into the game.

pub mod client;
pub mod commands;
pub mod gateway;
pub mod handler;
pub mod resolver;

pub use client::run_discord;
pub use gateway::DiscordGateway;
pub use handler::RelayHandler;
