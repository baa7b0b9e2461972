//! HTTP client for the Spotify Web API
//!
//! Only the currently-playing endpoint is used. The client is stateless:
//! it never keeps the credential beyond a single call.
//!
//! # Example
//!
//! ```no_run
//! use ledspotify::{Credential, SpotifyClient, TrackSnapshot};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SpotifyClient::new()?;
//!     let token = Credential::new("BQD...");
//!
//!     match client.fetch(Some(&token)).await {
//!         TrackSnapshot::Playing { artwork_url, .. } => println!("{artwork_url}"),
//!         other => println!("{other:?}"),
//!     }
//!     Ok(())
//! }
//! ```

use crate::auth::Credential;
use crate::error::{Error, Result};
use crate::fetcher::TrackSnapshot;
use crate::models::{CurrentlyPlaying, TrackInfo};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, trace};

/// Default Web API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";

/// Default accounts service base URL
pub const DEFAULT_ACCOUNTS_BASE_URL: &str = "https://accounts.spotify.com";

/// Default timeout for HTTP requests (10 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Default User-Agent
pub const DEFAULT_USER_AGENT: &str = concat!("ledmatrix/", env!("CARGO_PKG_VERSION"));

/// Path of the currently-playing endpoint, relative to the API base URL
pub const CURRENTLY_PLAYING_PATH: &str = "/me/player/currently-playing";

/// Spotify Web API client
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    client: Client,
    api_base_url: String,
}

impl SpotifyClient {
    /// Create a new client with default settings
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a builder for configuring the client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Get the API base URL
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Get the internal HTTP client
    ///
    /// Shared with the artwork sampler and the accounts client so that all
    /// requests reuse one connection pool.
    pub fn http_client(&self) -> &Client {
        &self.client
    }

    /// Raw currently-playing query
    ///
    /// Returns `Ok(None)` on `204 No Content`.
    ///
    /// # Errors
    ///
    /// * `Error::Unauthorized` - token expired or revoked (401)
    /// * `Error::Api` - any other non-success status
    /// * `Error::MalformedResponse` - the body is not valid JSON
    /// * `Error::Network` - connection, timeout or body read failure
    pub async fn currently_playing(
        &self,
        credential: &Credential,
    ) -> Result<Option<CurrentlyPlaying>> {
        let url = format!("{}{}", self.api_base_url, CURRENTLY_PLAYING_PATH);
        trace!(url = %url, "GET currently playing");

        let response = self
            .client
            .get(&url)
            .bearer_auth(credential.secret())
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::NO_CONTENT => return Ok(None),
            StatusCode::UNAUTHORIZED => {
                return Err(Error::unauthorized("token expired or revoked"));
            }
            s if !s.is_success() => {
                let body = response.text().await?;
                return Err(Error::api(s.as_u16(), body));
            }
            _ => {}
        }

        let body = response.text().await?;
        let playing: CurrentlyPlaying =
            serde_json::from_str(&body).map_err(|e| Error::malformed(e.to_string()))?;
        Ok(Some(playing))
    }

    /// One tick's worth of playback state
    ///
    /// Never fails: every outcome, errors included, is a [`TrackSnapshot`].
    /// Without a credential no request is made.
    pub async fn fetch(&self, credential: Option<&Credential>) -> TrackSnapshot {
        let Some(credential) = credential else {
            return TrackSnapshot::NoActiveSession;
        };

        let playing = match self.currently_playing(credential).await {
            Ok(Some(playing)) => playing,
            Ok(None) => return TrackSnapshot::NothingPlaying,
            Err(cause) => return TrackSnapshot::FetchError { cause },
        };

        let Some(item) = playing.item else {
            return TrackSnapshot::FetchError {
                cause: Error::malformed("no item in currently-playing response"),
            };
        };

        match item.artwork_url() {
            Some(url) => {
                let track = TrackInfo::from(&item);
                debug!(track = %track.display(), artwork = url, "Playback state fetched");
                TrackSnapshot::Playing {
                    artwork_url: url.to_string(),
                    track: Some(track),
                }
            }
            None => TrackSnapshot::FetchError {
                cause: Error::malformed(format!("no artwork for '{}'", item.name)),
            },
        }
    }
}

/// Builder for [`SpotifyClient`]
#[derive(Debug)]
pub struct ClientBuilder {
    client: Option<Client>,
    api_base_url: String,
    timeout: Duration,
    user_agent: String,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            client: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom HTTP client
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the API base URL (trailing slashes are ignored)
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the client
    pub fn build(self) -> Result<SpotifyClient> {
        let client = match self.client {
            Some(client) => client,
            None => Client::builder()
                .user_agent(&self.user_agent)
                .timeout(self.timeout)
                .build()?,
        };

        Ok(SpotifyClient {
            client,
            api_base_url: self.api_base_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = ClientBuilder::default();
        assert_eq!(builder.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(
            builder.timeout,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_builder_trims_base_url() {
        let client = SpotifyClient::builder()
            .api_base_url("http://localhost:1234/v1/")
            .build()
            .unwrap();
        assert_eq!(client.api_base_url(), "http://localhost:1234/v1");
    }

    #[tokio::test]
    async fn test_no_credential_makes_no_request() {
        // Un port fermé: toute requête échouerait en FetchError
        let client = SpotifyClient::builder()
            .api_base_url("http://127.0.0.1:9")
            .build()
            .unwrap();
        assert!(matches!(
            client.fetch(None).await,
            TrackSnapshot::NoActiveSession
        ));
    }
}
