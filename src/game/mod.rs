//! Game server side of the relay.
//!
//! Yells arrive from game servers over HTTP (see `server`); this module
//! covers the reverse direction, pushing Discord replies into the game.

pub mod client;

pub use client::GameServerClient;
