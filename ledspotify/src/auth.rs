//! Authorization: PKCE login flow and session-scoped token storage
//!
//! The kiosk authenticates with the Authorization Code flow and PKCE:
//!
//! 1. [`SessionAuth::begin_login`] draws a fresh [`PkcePair`], keeps the
//!    verifier in the [`TokenStore`] and returns the authorize URL
//! 2. the accounts service redirects back with `?code=...`
//! 3. [`SessionAuth::on_authenticated`] exchanges the code with the pending
//!    verifier and stores the resulting [`Credential`]
//!
//! Access tokens expire after an hour. When the Web API rejects one,
//! [`SessionAuth::refresh`] trades the stored refresh token for a new access
//! token. Tokens live in memory and, when a [`TokenPersistence`] is attached,
//! are saved so the kiosk survives a restart. The fetcher reads the token
//! through the [`TokenProvider`] trait on every cycle.

use crate::error::{Error, Result};
use crate::models::TokenResponse;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use rand::distr::Alphanumeric;
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info, warn};
use url::Url;

/// Length of the PKCE code verifier
pub const VERIFIER_LEN: usize = 64;

/// Bearer token presented to the Web API
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the `Authorization` header
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Source of the current access token
pub trait TokenProvider: Send + Sync {
    /// Token to use for the next request, if a session is active
    fn current_token(&self) -> Option<Credential>;

    /// Forget the token after the API rejected it
    fn invalidate(&self) {}
}

/// Durable storage for the tokens of a session
pub trait TokenPersistence: Send + Sync {
    fn save_tokens(&self, access_token: &str, refresh_token: Option<&str>) -> anyhow::Result<()>;
}

/// PKCE verifier and its S256 challenge
#[derive(Debug, Clone)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

impl PkcePair {
    /// Random alphanumeric verifier of [`VERIFIER_LEN`] characters
    pub fn generate() -> Self {
        let verifier: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(VERIFIER_LEN)
            .map(char::from)
            .collect();
        Self::from_verifier(verifier)
    }

    pub fn from_verifier(verifier: impl Into<String>) -> Self {
        let verifier = verifier.into();
        let challenge = challenge_for(&verifier);
        Self {
            verifier,
            challenge,
        }
    }
}

/// base64url (no padding) of the SHA-256 digest of `verifier`
pub fn challenge_for(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Client for the accounts service (`/authorize`, `/api/token`)
#[derive(Debug, Clone)]
pub struct AuthClient {
    client: Client,
    accounts_base_url: Url,
    client_id: String,
    redirect_uri: String,
    scope: String,
}

impl AuthClient {
    pub fn new(
        client: Client,
        accounts_base_url: &str,
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        scope: impl Into<String>,
    ) -> Result<Self> {
        // Url::join remplace le dernier segment sans '/' final
        let base = format!("{}/", accounts_base_url.trim_end_matches('/'));
        Ok(Self {
            client,
            accounts_base_url: Url::parse(&base)?,
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            scope: scope.into(),
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// URL the user is sent to in order to grant access
    pub fn authorize_url(&self, pkce: &PkcePair) -> Result<String> {
        let mut url = self.accounts_base_url.join("authorize")?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &self.scope)
            .append_pair("code_challenge_method", "S256")
            .append_pair("code_challenge", &pkce.challenge);
        Ok(url.into())
    }

    /// Trades an authorization code for an access token
    ///
    /// # Errors
    ///
    /// * `Error::Unauthorized` - the code or verifier was rejected (400/401)
    /// * `Error::Api` - any other non-success status
    /// * `Error::MalformedResponse` - the body is not a token response
    pub async fn exchange_code(&self, code: &str, verifier: &str) -> Result<TokenResponse> {
        debug!("Exchanging authorization code");
        self.request_token(&[
            ("client_id", self.client_id.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("code_verifier", verifier),
        ])
        .await
    }

    /// Trades a refresh token for a new access token
    ///
    /// The response may carry a rotated refresh token.
    ///
    /// # Errors
    ///
    /// Same as [`AuthClient::exchange_code`]; a revoked refresh token is
    /// `Error::Unauthorized`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse> {
        debug!("Refreshing access token");
        self.request_token(&[
            ("client_id", self.client_id.as_str()),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> Result<TokenResponse> {
        let url = self.accounts_base_url.join("api/token")?;
        let response = self.client.post(url).form(params).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if status.as_u16() == 400 || status.as_u16() == 401 {
            return Err(Error::unauthorized(body));
        }
        if !status.is_success() {
            return Err(Error::api(status.as_u16(), body));
        }

        serde_json::from_str(&body).map_err(|e| Error::malformed(e.to_string()))
    }
}

/// Holder for the session tokens and the pending PKCE verifier
#[derive(Default)]
pub struct TokenStore {
    token: RwLock<Option<Credential>>,
    refresh_token: RwLock<Option<String>>,
    pending_verifier: Mutex<Option<String>>,
    persistence: Option<Arc<dyn TokenPersistence>>,
}

impl fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenStore")
            .field("authenticated", &self.is_authenticated())
            .field("refreshable", &self.refresh_token().is_some())
            .field("persistent", &self.persistence.is_some())
            .finish()
    }
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store already holding `token` (headless kiosks)
    pub fn with_token(token: Credential) -> Self {
        Self {
            token: RwLock::new(Some(token)),
            ..Self::default()
        }
    }

    /// Seeds the refresh token, e.g. one saved by a previous run
    pub fn with_refresh_token(self, refresh_token: impl Into<String>) -> Self {
        *self.refresh_token.write().unwrap_or_else(|e| e.into_inner()) =
            Some(refresh_token.into());
        self
    }

    /// Saves every token obtained from now on through `persistence`
    pub fn with_persistence(mut self, persistence: Arc<dyn TokenPersistence>) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn set_token(&self, token: Credential) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = Some(token);
    }

    /// Stores a token response, keeping the current refresh token when the
    /// response does not rotate it, then persists both
    pub fn store_response(&self, response: &TokenResponse) -> Credential {
        let credential = Credential::new(response.access_token.clone());
        self.set_token(credential.clone());

        let refresh_token = {
            let mut slot = self.refresh_token.write().unwrap_or_else(|e| e.into_inner());
            if let Some(rotated) = &response.refresh_token {
                *slot = Some(rotated.clone());
            }
            slot.clone()
        };

        if let Some(persistence) = &self.persistence {
            if let Err(e) = persistence.save_tokens(credential.secret(), refresh_token.as_deref()) {
                warn!("Cannot save Spotify tokens: {}", e);
            }
        }
        credential
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.refresh_token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Forgets the access token; the refresh token is kept
    pub fn clear(&self) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Forgets both tokens
    pub fn clear_all(&self) {
        self.clear();
        *self.refresh_token.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Remembers the verifier of the login in progress, replacing any older one
    pub fn set_pending_verifier(&self, verifier: String) {
        *self
            .pending_verifier
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(verifier);
    }

    /// Takes the pending verifier; a second call returns `None`
    pub fn take_pending_verifier(&self) -> Option<String> {
        self.pending_verifier
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }
}

impl TokenProvider for TokenStore {
    fn current_token(&self) -> Option<Credential> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn invalidate(&self) {
        if self.is_authenticated() {
            warn!("Access token rejected, session cleared");
        }
        self.clear();
    }
}

/// Login flow bound to one token store
#[derive(Debug, Clone)]
pub struct SessionAuth {
    auth: AuthClient,
    store: Arc<TokenStore>,
}

impl SessionAuth {
    pub fn new(auth: AuthClient, store: Arc<TokenStore>) -> Self {
        Self { auth, store }
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// Starts a login: stores a fresh verifier and returns the authorize URL
    pub fn begin_login(&self) -> Result<String> {
        let pkce = PkcePair::generate();
        let url = self.auth.authorize_url(&pkce)?;
        self.store.set_pending_verifier(pkce.verifier);
        debug!("Login started");
        Ok(url)
    }

    /// Exchanges `code` with the pending verifier and stores the token
    pub async fn on_authenticated(&self, code: &str) -> Result<Credential> {
        let verifier = self
            .store
            .take_pending_verifier()
            .ok_or(Error::NoPendingAuthorization)?;

        let response = self.auth.exchange_code(code, &verifier).await?;
        let credential = self.store.store_response(&response);

        info!(
            expires_in = response.expires_in,
            scope = response.scope.as_deref().unwrap_or(""),
            "Spotify session authenticated"
        );
        Ok(credential)
    }

    /// Renews the access token with the stored refresh token
    ///
    /// # Errors
    ///
    /// * `Error::NoCredential` - no refresh token is stored
    /// * `Error::Unauthorized` - the refresh token was revoked; both tokens
    ///   are forgotten
    pub async fn refresh(&self) -> Result<Credential> {
        let refresh_token = self.store.refresh_token().ok_or(Error::NoCredential)?;

        match self.auth.refresh(&refresh_token).await {
            Ok(response) => {
                info!(expires_in = response.expires_in, "🔄 Spotify access token refreshed");
                Ok(self.store.store_response(&response))
            }
            Err(e) => {
                if e.is_unauthorized() {
                    self.store.clear_all();
                }
                Err(e)
            }
        }
    }
}
