//! Color grid produced by the sampler and consumed by the renderer

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// One LED color, alpha already discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Perceived luminance (ITU-R BT.601 weights), 0.0 to 255.0
    pub fn luminance(&self) -> f32 {
        0.299 * self.r as f32 + 0.587 * self.g as f32 + 0.114 * self.b as f32
    }
}

impl From<Rgb> for image::Rgb<u8> {
    fn from(c: Rgb) -> Self {
        image::Rgb([c.r, c.g, c.b])
    }
}

impl From<image::Rgb<u8>> for Rgb {
    fn from(p: image::Rgb<u8>) -> Self {
        Rgb::new(p[0], p[1], p[2])
    }
}

/// An N×N grid of colors, stored row-major
///
/// The dimensions are fixed at construction and the grid is never mutated
/// afterwards: a new grid is built on every successful poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorGrid {
    size: usize,
    cells: Vec<Rgb>,
}

impl ColorGrid {
    /// Builds a grid from row-major cells
    ///
    /// Fails when `size` is zero or `cells.len() != size * size`.
    pub fn from_cells(size: usize, cells: Vec<Rgb>) -> Result<Self> {
        if size == 0 {
            return Err(Error::invalid_grid("grid size must be at least 1"));
        }
        if cells.len() != size * size {
            return Err(Error::invalid_grid(format!(
                "expected {} cells for a {}x{} grid, got {}",
                size * size,
                size,
                size,
                cells.len()
            )));
        }
        Ok(Self { size, cells })
    }

    /// A grid where every cell has the same color
    pub fn filled(size: usize, color: Rgb) -> Self {
        Self {
            size,
            cells: vec![color; size * size],
        }
    }

    /// Builds a grid from a raw RGBA pixel buffer of `size`×`size` pixels,
    /// dropping the alpha channel
    pub fn from_rgba(size: usize, rgba: &[u8]) -> Result<Self> {
        if rgba.len() != size * size * 4 {
            return Err(Error::invalid_grid(format!(
                "RGBA buffer has {} bytes, expected {}",
                rgba.len(),
                size * size * 4
            )));
        }
        let cells = rgba
            .chunks_exact(4)
            .map(|px| Rgb::new(px[0], px[1], px[2]))
            .collect();
        Self::from_cells(size, cells)
    }

    /// Side length N
    pub fn size(&self) -> usize {
        self.size
    }

    /// Color of the cell at column `x`, row `y`
    ///
    /// # Panics
    ///
    /// Panics if `x` or `y` is out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Rgb {
        assert!(x < self.size && y < self.size, "cell ({x}, {y}) out of bounds");
        self.cells[y * self.size + x]
    }

    /// Rows from top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Rgb]> {
        self.cells.chunks_exact(self.size)
    }

    /// Every cell as `(x, y, color)`, row-major
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, Rgb)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, c)| (i % self.size, i / self.size, *c))
    }
}
