//! Data models for the Spotify Web API responses we consume
//!
//! Only the handful of fields the kiosk needs are modelled; everything else in
//! the payloads is ignored by serde.

use serde::{Deserialize, Serialize};

/// Body of `GET /me/player/currently-playing`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CurrentlyPlaying {
    #[serde(default)]
    pub is_playing: bool,

    /// `track` or `episode` (or `ad`, `unknown`)
    #[serde(default)]
    pub currently_playing_type: Option<String>,

    /// Null while an ad plays or in private sessions
    #[serde(default)]
    pub item: Option<PlayingItem>,
}

/// A track or an episode
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayingItem {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub name: String,

    /// Present for tracks
    #[serde(default)]
    pub album: Option<Album>,

    #[serde(default)]
    pub artists: Vec<Artist>,

    /// Present for episodes
    #[serde(default)]
    pub images: Vec<Image>,

    /// Present for episodes
    #[serde(default)]
    pub show: Option<Show>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Album {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Artist {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Show {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

/// Artwork reference, widest first in Spotify payloads
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

impl PlayingItem {
    /// First artwork URL: album images for tracks, own images (then the
    /// show's) for episodes
    pub fn artwork_url(&self) -> Option<&str> {
        self.album
            .iter()
            .flat_map(|a| a.images.iter())
            .chain(self.images.iter())
            .chain(self.show.iter().flat_map(|s| s.images.iter()))
            .map(|i| i.url.as_str())
            .find(|url| !url.is_empty())
    }

    /// Display names of the performers (or the show for an episode)
    pub fn artist_names(&self) -> Vec<String> {
        if !self.artists.is_empty() {
            self.artists.iter().map(|a| a.name.clone()).collect()
        } else if let Some(show) = &self.show {
            vec![show.name.clone()]
        } else {
            Vec::new()
        }
    }
}

/// Descriptive metadata about what is playing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackInfo {
    /// Spotify id, falls back to the name when absent (local files)
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
}

impl TrackInfo {
    /// "name by artist1, artist2"
    pub fn display(&self) -> String {
        if self.artists.is_empty() {
            self.name.clone()
        } else {
            format!("{} by {}", self.name, self.artists.join(", "))
        }
    }
}

impl From<&PlayingItem> for TrackInfo {
    fn from(item: &PlayingItem) -> Self {
        Self {
            id: item.id.clone().unwrap_or_else(|| item.name.clone()),
            name: item.name.clone(),
            artists: item.artist_names(),
        }
    }
}

/// Body of a successful `POST /api/token`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}
