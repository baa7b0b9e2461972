//! Track fetcher: turns the session token into one playback snapshot per tick

use crate::auth::{SessionAuth, TokenProvider};
use crate::client::SpotifyClient;
use crate::error::Error;
use crate::models::TrackInfo;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// What the player is doing right now
///
/// Produced once per poll tick and consumed by the same tick.
#[derive(Debug)]
pub enum TrackSnapshot {
    /// No token: the user has not logged in (or the session was cleared)
    NoActiveSession,
    /// The player is idle
    NothingPlaying,
    /// Something is playing and has artwork
    Playing {
        artwork_url: String,
        track: Option<TrackInfo>,
    },
    /// The query failed; the display keeps its current frame
    FetchError { cause: Error },
}

impl TrackSnapshot {
    /// Short label used in logs and status reports
    pub fn label(&self) -> &'static str {
        match self {
            TrackSnapshot::NoActiveSession => "no_active_session",
            TrackSnapshot::NothingPlaying => "nothing_playing",
            TrackSnapshot::Playing { .. } => "playing",
            TrackSnapshot::FetchError { .. } => "fetch_error",
        }
    }
}

/// Anything able to report the current playback state
#[async_trait]
pub trait NowPlayingSource: Send + Sync {
    async fn now_playing(&self) -> TrackSnapshot;
}

/// [`NowPlayingSource`] backed by the Web API and a token provider
///
/// On a `401` the fetcher refreshes the token once, when a session is
/// attached with [`SpotifyFetcher::with_refresh`], and retries the query.
/// If that is not possible the provider's token is invalidated, so later
/// ticks report [`TrackSnapshot::NoActiveSession`] until the user logs in
/// again.
#[derive(Clone)]
pub struct SpotifyFetcher {
    client: SpotifyClient,
    tokens: Arc<dyn TokenProvider>,
    session: Option<SessionAuth>,
}

impl SpotifyFetcher {
    pub fn new(client: SpotifyClient, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            client,
            tokens,
            session: None,
        }
    }

    /// Renews rejected tokens through `session`
    pub fn with_refresh(mut self, session: SessionAuth) -> Self {
        self.session = Some(session);
        self
    }

    pub fn client(&self) -> &SpotifyClient {
        &self.client
    }
}

#[async_trait]
impl NowPlayingSource for SpotifyFetcher {
    async fn now_playing(&self) -> TrackSnapshot {
        let credential = self.tokens.current_token();
        let mut snapshot = self.client.fetch(credential.as_ref()).await;

        if !is_unauthorized(&snapshot) {
            return snapshot;
        }

        if let Some(session) = &self.session {
            match session.refresh().await {
                Ok(renewed) => {
                    snapshot = self.client.fetch(Some(&renewed)).await;
                    if !is_unauthorized(&snapshot) {
                        return snapshot;
                    }
                }
                Err(e) => debug!("Token refresh failed: {}", e),
            }
        }

        warn!("Spotify rejected the access token, log in again");
        self.tokens.invalidate();
        snapshot
    }
}

fn is_unauthorized(snapshot: &TrackSnapshot) -> bool {
    matches!(snapshot, TrackSnapshot::FetchError { cause } if cause.is_unauthorized())
}
