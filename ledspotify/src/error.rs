//! Error types for the Spotify client

/// Result type alias for Spotify operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the Spotify Web API or accounts service
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No access token is available for this session
    #[error("No active session: log in first")]
    NoCredential,

    /// No PKCE verifier is pending (callback without a prior login)
    #[error("No authorization in progress")]
    NoPendingAuthorization,

    /// HTTP request failed (connection, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The body could not be parsed or lacks what we need
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The token was rejected or expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// API returned an unexpected status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Configuration error (from ledconfig/anyhow)
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),
}

impl Error {
    /// Create a malformed response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create an unauthorized error
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    /// Create an API error from a status code and body
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// True for a rejected or expired token
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized(_))
    }
}
