//! Errors raised by one poll cycle

/// Why a cycle stopped before drawing
///
/// Every variant is handled at the cycle boundary: logged, never shown to the
/// viewer, never stopping the scheduler. The display keeps its last frame.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    /// The currently-playing query failed
    #[error("Track fetch failed: {0}")]
    Fetch(#[from] ledspotify::Error),

    /// The artwork could not be loaded or decoded
    #[error("Artwork sampling failed: {0}")]
    Sample(#[source] ledmatrix::Error),

    /// The grid could not be drawn
    #[error("Render failed: {0}")]
    Render(#[source] ledmatrix::Error),
}

impl CycleError {
    /// Short label used in status reports
    pub fn label(&self) -> &'static str {
        match self {
            CycleError::Fetch(e) if e.is_unauthorized() => "unauthorized",
            CycleError::Fetch(_) => "fetch_error",
            CycleError::Sample(_) => "image_load_error",
            CycleError::Render(_) => "render_error",
        }
    }
}
