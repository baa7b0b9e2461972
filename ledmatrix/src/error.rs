//! Error types for artwork sampling and matrix rendering

/// Result type alias for LED matrix operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while sampling artwork or drawing the matrix
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Artwork download failed (connection, timeout, body read)
    #[error("Artwork request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Artwork server answered with a non-success status
    #[error("Artwork request returned status {0}")]
    Status(u16),

    /// Artwork bytes could not be decoded or encoded
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// A grid does not have the expected shape
    #[error("Invalid color grid: {0}")]
    InvalidGrid(String),

    /// Display settings are inconsistent
    #[error("Invalid display configuration: {0}")]
    InvalidConfig(String),

    /// The blocking decode task panicked or was cancelled
    #[error("Decode task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    /// Create an invalid grid error
    pub fn invalid_grid(msg: impl Into<String>) -> Self {
        Self::InvalidGrid(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// True when the error comes from loading the artwork image
    /// (network, HTTP status, decoding)
    pub fn is_image_load(&self) -> bool {
        matches!(
            self,
            Error::Http(_) | Error::Status(_) | Error::Image(_) | Error::Join(_)
        )
    }
}
