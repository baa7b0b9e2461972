//! Spotify client library for the LED matrix kiosk
//!
//! This crate answers one question per poll tick: what is playing, and where
//! is its artwork?
//!
//! # Features
//!
//! - **Track Fetcher**: [`SpotifyClient::fetch`] maps the currently-playing
//!   endpoint to a [`TrackSnapshot`]
//! - **Authorization**: PKCE login ([`SessionAuth`]) and an in-memory
//!   [`TokenStore`] exposed through [`TokenProvider`]
//! - **Configuration Extension**: [`SpotifyConfigExt`] reads the `spotify`
//!   section of `ledconfig`
//!
//! # Example
//!
//! ```no_run
//! use ledspotify::{Credential, NowPlayingSource, SpotifyClient, SpotifyFetcher, TokenStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tokens = Arc::new(TokenStore::with_token(Credential::new("BQD...")));
//!     let fetcher = SpotifyFetcher::new(SpotifyClient::new()?, tokens);
//!
//!     println!("{:?}", fetcher.now_playing().await);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod fetcher;
pub mod models;

#[cfg(feature = "ledconfig")]
pub mod config_ext;

// Re-exports
pub use auth::{
    AuthClient, Credential, PkcePair, SessionAuth, TokenPersistence, TokenProvider, TokenStore,
};
pub use client::{ClientBuilder, SpotifyClient};
pub use error::{Error, Result};
pub use fetcher::{NowPlayingSource, SpotifyFetcher, TrackSnapshot};
pub use models::{CurrentlyPlaying, TokenResponse, TrackInfo};

#[cfg(feature = "ledconfig")]
pub use config_ext::SpotifyConfigExt;
