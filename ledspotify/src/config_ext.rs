//! Extension pour intégrer Spotify dans ledconfig
//!
//! Ce module fournit le trait `SpotifyConfigExt` qui ajoute à
//! `ledconfig::Config` la lecture de la section `spotify` et la
//! construction des clients correspondants.
//!
//! # Exemple
//!
//! ```no_run
//! use ledconfig::get_config;
//! use ledspotify::SpotifyConfigExt;
//! use std::time::Duration;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = get_config();
//!
//! if config.get_spotify_client_id()?.is_empty() {
//!     println!("Set spotify.client_id in config.yaml");
//!     return Ok(());
//! }
//!
//! let client = config.build_spotify_client(Duration::from_secs(10))?;
//! let auth = config.build_auth_client(client.http_client().clone())?;
//! # Ok(())
//! # }
//! ```

use crate::auth::{AuthClient, Credential, TokenPersistence};
use crate::client::{DEFAULT_ACCOUNTS_BASE_URL, DEFAULT_API_BASE_URL, SpotifyClient};
use anyhow::Result;
use ledconfig::Config;
use reqwest::Client;
use serde_yaml::Value;
use std::time::Duration;

/// Scope nécessaire pour lire la lecture en cours
pub const DEFAULT_SCOPE: &str = "user-read-currently-playing";

/// Trait d'extension pour la configuration Spotify
pub trait SpotifyConfigExt {
    /// Identifiant de l'application enregistrée côté Spotify
    fn get_spotify_client_id(&self) -> Result<String>;
    fn set_spotify_client_id(&self, client_id: &str) -> Result<()>;

    /// URI de redirection déclarée pour l'application
    ///
    /// Par défaut `<base_url>/callback` du serveur kiosque.
    fn get_spotify_redirect_uri(&self) -> Result<String>;

    fn get_spotify_scope(&self) -> Result<String>;
    fn get_spotify_api_base_url(&self) -> Result<String>;
    fn get_spotify_accounts_base_url(&self) -> Result<String>;

    /// Token pré-chargé (kiosques sans navigateur)
    fn get_spotify_access_token(&self) -> Result<Option<Credential>>;
    fn set_spotify_access_token(&self, token: &str) -> Result<()>;

    /// Refresh token sauvegardé par une session précédente
    fn get_spotify_refresh_token(&self) -> Result<Option<String>>;
    fn set_spotify_refresh_token(&self, token: &str) -> Result<()>;

    /// Client Web API configuré (base URL, timeout)
    fn build_spotify_client(&self, timeout: Duration) -> crate::Result<SpotifyClient>;

    /// Client du service de comptes, partageant le pool HTTP `client`
    fn build_auth_client(&self, client: Client) -> crate::Result<AuthClient>;
}

impl SpotifyConfigExt for Config {
    fn get_spotify_client_id(&self) -> Result<String> {
        Ok(self.get_string_or(&["spotify", "client_id"], ""))
    }

    fn set_spotify_client_id(&self, client_id: &str) -> Result<()> {
        self.set_value(
            &["spotify", "client_id"],
            Value::String(client_id.to_string()),
        )
    }

    fn get_spotify_redirect_uri(&self) -> Result<String> {
        let fallback = format!("{}/callback", self.get_base_url());
        Ok(self.get_string_or(&["spotify", "redirect_uri"], &fallback))
    }

    fn get_spotify_scope(&self) -> Result<String> {
        Ok(self.get_string_or(&["spotify", "scope"], DEFAULT_SCOPE))
    }

    fn get_spotify_api_base_url(&self) -> Result<String> {
        Ok(self.get_string_or(&["spotify", "api_base_url"], DEFAULT_API_BASE_URL))
    }

    fn get_spotify_accounts_base_url(&self) -> Result<String> {
        Ok(self.get_string_or(&["spotify", "accounts_base_url"], DEFAULT_ACCOUNTS_BASE_URL))
    }

    fn get_spotify_access_token(&self) -> Result<Option<Credential>> {
        let token = self.get_string_or(&["spotify", "access_token"], "");
        Ok((!token.is_empty()).then(|| Credential::new(token)))
    }

    fn set_spotify_access_token(&self, token: &str) -> Result<()> {
        self.set_value(
            &["spotify", "access_token"],
            Value::String(token.to_string()),
        )
    }

    fn get_spotify_refresh_token(&self) -> Result<Option<String>> {
        let token = self.get_string_or(&["spotify", "refresh_token"], "");
        Ok((!token.is_empty()).then_some(token))
    }

    fn set_spotify_refresh_token(&self, token: &str) -> Result<()> {
        self.set_value(
            &["spotify", "refresh_token"],
            Value::String(token.to_string()),
        )
    }

    fn build_spotify_client(&self, timeout: Duration) -> crate::Result<SpotifyClient> {
        SpotifyClient::builder()
            .api_base_url(self.get_spotify_api_base_url()?)
            .timeout(timeout)
            .build()
    }

    fn build_auth_client(&self, client: Client) -> crate::Result<AuthClient> {
        AuthClient::new(
            client,
            &self.get_spotify_accounts_base_url()?,
            self.get_spotify_client_id()?,
            self.get_spotify_redirect_uri()?,
            self.get_spotify_scope()?,
        )
    }
}

/// Les tokens obtenus sont écrits dans `config.yaml`
impl TokenPersistence for Config {
    fn save_tokens(&self, access_token: &str, refresh_token: Option<&str>) -> Result<()> {
        self.set_spotify_access_token(access_token)?;
        if let Some(refresh_token) = refresh_token {
            self.set_spotify_refresh_token(refresh_token)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{TokenProvider, TokenStore};
    use crate::models::TokenResponse;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> Config {
        Config::load_config(dir.path().to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        assert_eq!(cfg.get_spotify_client_id().unwrap(), "");
        assert_eq!(
            cfg.get_spotify_redirect_uri().unwrap(),
            "http://127.0.0.1:8888/callback"
        );
        assert_eq!(cfg.get_spotify_scope().unwrap(), DEFAULT_SCOPE);
        assert_eq!(cfg.get_spotify_api_base_url().unwrap(), DEFAULT_API_BASE_URL);
        assert!(cfg.get_spotify_access_token().unwrap().is_none());
        assert!(cfg.get_spotify_refresh_token().unwrap().is_none());
    }

    #[test]
    fn test_tokens_survive_restart() {
        let dir = TempDir::new().unwrap();
        let store = TokenStore::new().with_persistence(Arc::new(config(&dir)));
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token":"BQD-new","refresh_token":"AQ-refresh"}"#)
                .unwrap();
        store.store_response(&response);

        let reloaded = config(&dir);
        let token = reloaded.get_spotify_access_token().unwrap().unwrap();
        let refresh = reloaded.get_spotify_refresh_token().unwrap().unwrap();
        let restored = TokenStore::with_token(token).with_refresh_token(refresh);
        assert_eq!(restored.current_token().unwrap().secret(), "BQD-new");
        assert_eq!(restored.refresh_token().as_deref(), Some("AQ-refresh"));
    }

    #[test]
    fn test_seeded_token_and_client_id() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        cfg.set_spotify_client_id("abc123").unwrap();
        cfg.set_spotify_access_token("BQD-token").unwrap();

        let reloaded = config(&dir);
        assert_eq!(reloaded.get_spotify_client_id().unwrap(), "abc123");
        assert_eq!(
            reloaded.get_spotify_access_token().unwrap().unwrap().secret(),
            "BQD-token"
        );
    }

    #[test]
    fn test_build_clients() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        let client = cfg.build_spotify_client(Duration::from_secs(1)).unwrap();
        assert_eq!(client.api_base_url(), DEFAULT_API_BASE_URL);

        let auth = cfg.build_auth_client(client.http_client().clone()).unwrap();
        assert_eq!(auth.redirect_uri(), "http://127.0.0.1:8888/callback");
    }
}
