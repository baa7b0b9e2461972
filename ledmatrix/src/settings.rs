//! Display and polling settings, fixed for the lifetime of the process

use crate::error::{Error, Result};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default canvas side in pixels
pub const DEFAULT_CANVAS_SIZE: u32 = 600;
/// Default number of LEDs per side
pub const DEFAULT_MATRIX_SIZE: u32 = 32;
/// Default poll period in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
/// Tuned LED radius divisor: `radius = cell_size / divisor`
pub const DEFAULT_LED_RADIUS_DIVISOR: f64 = 2.3;
/// Gutter left on each side of a square LED, in pixels
pub const DEFAULT_SQUARE_INSET: f64 = 1.0;

/// Shape used to draw each LED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedShape {
    #[default]
    Circle,
    Square,
}

impl FromStr for LedShape {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "circle" => Ok(LedShape::Circle),
            "square" => Ok(LedShape::Square),
            other => Err(Error::invalid_config(format!(
                "unknown LED shape '{other}' (expected 'circle' or 'square')"
            ))),
        }
    }
}

impl fmt::Display for LedShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedShape::Circle => f.write_str("circle"),
            LedShape::Square => f.write_str("square"),
        }
    }
}

/// Filter used when shrinking the artwork to N×N
///
/// `Area` averages the source area covered by a cell, partially covered
/// pixels weighted by their overlap, which is what a browser canvas does when
/// drawing a large image into a tiny one. The other
/// variants map to the `image` crate convolution filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleFilter {
    #[default]
    Area,
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl ResampleFilter {
    /// Convolution filter, `None` for area averaging
    pub fn filter_type(self) -> Option<FilterType> {
        match self {
            ResampleFilter::Area => None,
            ResampleFilter::Nearest => Some(FilterType::Nearest),
            ResampleFilter::Triangle => Some(FilterType::Triangle),
            ResampleFilter::CatmullRom => Some(FilterType::CatmullRom),
            ResampleFilter::Gaussian => Some(FilterType::Gaussian),
            ResampleFilter::Lanczos3 => Some(FilterType::Lanczos3),
        }
    }
}

impl FromStr for ResampleFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "area" | "box" => Ok(ResampleFilter::Area),
            "nearest" => Ok(ResampleFilter::Nearest),
            "triangle" | "bilinear" => Ok(ResampleFilter::Triangle),
            "catmullrom" | "bicubic" => Ok(ResampleFilter::CatmullRom),
            "gaussian" => Ok(ResampleFilter::Gaussian),
            "lanczos3" | "lanczos" => Ok(ResampleFilter::Lanczos3),
            other => Err(Error::invalid_config(format!(
                "unknown resample filter '{other}'"
            ))),
        }
    }
}

/// Process-wide matrix configuration
///
/// Built once at startup (see `MatrixConfigExt::matrix_settings`) and never
/// changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixConfig {
    /// Side of the square canvas in pixels
    pub canvas_size: u32,
    /// Number of LEDs per side (N)
    pub matrix_size: u32,
    pub led_shape: LedShape,
    pub poll_interval_ms: u64,
    pub led_radius_divisor: f64,
    pub square_inset: f64,
    pub resample_filter: ResampleFilter,
    /// Log an ASCII rendition of every new grid
    pub terminal_preview: bool,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            canvas_size: DEFAULT_CANVAS_SIZE,
            matrix_size: DEFAULT_MATRIX_SIZE,
            led_shape: LedShape::default(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            led_radius_divisor: DEFAULT_LED_RADIUS_DIVISOR,
            square_inset: DEFAULT_SQUARE_INSET,
            resample_filter: ResampleFilter::default(),
            terminal_preview: false,
        }
    }
}

impl MatrixConfig {
    /// Side of one LED cell in pixels (may be fractional)
    pub fn cell_size(&self) -> f64 {
        self.canvas_size as f64 / self.matrix_size as f64
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Checks that every LED fits inside its own cell
    pub fn validate(&self) -> Result<()> {
        if self.matrix_size == 0 {
            return Err(Error::invalid_config("matrix_size must be at least 1"));
        }
        if self.canvas_size < self.matrix_size {
            return Err(Error::invalid_config(format!(
                "canvas_size ({}) must be >= matrix_size ({})",
                self.canvas_size, self.matrix_size
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::invalid_config("poll interval must be at least 1 ms"));
        }
        if self.led_radius_divisor.is_nan() || self.led_radius_divisor < 2.0 {
            return Err(Error::invalid_config(format!(
                "led_radius_divisor ({}) must be >= 2 so LEDs stay inside their cell",
                self.led_radius_divisor
            )));
        }
        if self.square_inset.is_nan()
            || self.square_inset < 0.0
            || self.square_inset * 2.0 >= self.cell_size()
        {
            return Err(Error::invalid_config(format!(
                "square_inset ({}) must be >= 0 and leave room in a {:.2}px cell",
                self.square_inset,
                self.cell_size()
            )));
        }
        Ok(())
    }
}
