//! # ledmatrix - Rendu de pochettes sur une matrice de LEDs simulée
//!
//! This crate turns album artwork into a low-resolution LED picture:
//!
//! - [`sampler`]: downloads the artwork and shrinks it to an N×N [`ColorGrid`]
//! - [`renderer`]: paints a grid as round or square LEDs on a [`DisplaySurface`]
//! - [`preview`]: text rendition of a grid for headless runs
//! - [`config_ext`]: reads the display settings from `ledconfig`
//!
//! ## Exemple
//!
//! ```rust,no_run
//! use ledmatrix::{ArtworkSampler, DisplaySurface, HttpSampler, MatrixConfig, MatrixRenderer};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = MatrixConfig::default();
//!     let sampler = HttpSampler::new(&settings, Duration::from_secs(10))?;
//!     let grid = sampler.sample("https://example.com/cover.jpg").await?;
//!
//!     let mut surface = DisplaySurface::new(settings.canvas_size);
//!     MatrixRenderer::new(&settings).render(&grid, &mut surface)?;
//!     std::fs::write("matrix.png", surface.encode_png()?)?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod grid;
pub mod preview;
pub mod renderer;
pub mod sampler;
pub mod settings;

#[cfg(feature = "ledconfig")]
pub mod config_ext;

pub use error::{Error, Result};
pub use grid::{ColorGrid, Rgb};
pub use renderer::{DisplaySurface, MatrixRenderer, SharedSurface};
pub use sampler::{ArtworkSampler, HttpSampler};
pub use settings::{LedShape, MatrixConfig, ResampleFilter};

#[cfg(feature = "ledconfig")]
pub use config_ext::MatrixConfigExt;
