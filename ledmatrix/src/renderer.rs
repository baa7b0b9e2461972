//! Matrix renderer: paints a color grid as discrete LEDs on a square canvas

use crate::error::{Error, Result};
use crate::grid::{ColorGrid, Rgb};
use crate::settings::{LedShape, MatrixConfig};
use image::{ImageFormat, RgbImage};
use std::io::Cursor;
use std::sync::{Arc, RwLock};

/// Surface shared between the renderer and whoever displays it
pub type SharedSurface = Arc<RwLock<DisplaySurface>>;

/// Fixed-size square canvas the LEDs are drawn on
///
/// Shapes use a pixel-centre coverage rule: a pixel is painted when its
/// centre `(px + 0.5, py + 0.5)` falls inside the shape.
#[derive(Debug, Clone)]
pub struct DisplaySurface {
    canvas: RgbImage,
}

impl DisplaySurface {
    /// A black canvas of `canvas_size`×`canvas_size` pixels
    pub fn new(canvas_size: u32) -> Self {
        Self {
            canvas: RgbImage::new(canvas_size, canvas_size),
        }
    }

    pub fn shared(canvas_size: u32) -> SharedSurface {
        Arc::new(RwLock::new(Self::new(canvas_size)))
    }

    /// Side length in pixels
    pub fn size(&self) -> u32 {
        self.canvas.width()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgb {
        (*self.canvas.get_pixel(x, y)).into()
    }

    pub fn as_image(&self) -> &RgbImage {
        &self.canvas
    }

    pub fn clear(&mut self, color: Rgb) {
        let px: image::Rgb<u8> = color.into();
        for p in self.canvas.pixels_mut() {
            *p = px;
        }
    }

    /// Fills the axis-aligned rectangle `[x, x + w) × [y, y + h)`
    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgb) {
        let (x0, x1) = self.pixel_span(x, x + w);
        let (y0, y1) = self.pixel_span(y, y + h);
        let px: image::Rgb<u8> = color.into();
        for py in y0..y1 {
            for px_x in x0..x1 {
                self.canvas.put_pixel(px_x, py, px);
            }
        }
    }

    /// Fills the disc of radius `r` centred on `(cx, cy)`
    pub fn fill_circle(&mut self, cx: f64, cy: f64, r: f64, color: Rgb) {
        let (x0, x1) = self.pixel_span(cx - r, cx + r);
        let (y0, y1) = self.pixel_span(cy - r, cy + r);
        let r2 = r * r;
        let px: image::Rgb<u8> = color.into();
        for py in y0..y1 {
            let dy = py as f64 + 0.5 - cy;
            for px_x in x0..x1 {
                let dx = px_x as f64 + 0.5 - cx;
                if dx * dx + dy * dy <= r2 {
                    self.canvas.put_pixel(px_x, py, px);
                }
            }
        }
    }

    /// Pixel indices whose centre lies in `[from, to)`, clamped to the canvas
    fn pixel_span(&self, from: f64, to: f64) -> (u32, u32) {
        let size = self.size() as f64;
        let start = (from - 0.5).ceil().clamp(0.0, size) as u32;
        let end = (to - 0.5).ceil().clamp(0.0, size) as u32;
        (start, end.max(start))
    }

    /// PNG encoding of the current frame
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        self.canvas.write_to(&mut out, ImageFormat::Png)?;
        Ok(out.into_inner())
    }
}

/// Draws color grids as LED cells
///
/// Geometry is derived once from the [`MatrixConfig`]: every cell is a square
/// of side `canvas_size / N`, the LED is either a disc of radius
/// `cell / led_radius_divisor` or a square inset by `square_inset`.
#[derive(Debug, Clone)]
pub struct MatrixRenderer {
    matrix_size: usize,
    cell: f64,
    shape: LedShape,
    radius: f64,
    inset: f64,
}

impl MatrixRenderer {
    pub fn new(settings: &MatrixConfig) -> Self {
        let cell = settings.cell_size();
        Self {
            matrix_size: settings.matrix_size as usize,
            cell,
            shape: settings.led_shape,
            radius: cell / settings.led_radius_divisor,
            inset: settings.square_inset,
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn shape(&self) -> LedShape {
        self.shape
    }

    /// Top-left corner of cell `(x, y)` on the canvas
    pub fn cell_origin(&self, x: usize, y: usize) -> (f64, f64) {
        (x as f64 * self.cell, y as f64 * self.cell)
    }

    /// Clears `surface` to black and draws one LED per grid cell, row-major
    ///
    /// Fails without touching the surface when the grid is not N×N.
    pub fn render(&self, grid: &ColorGrid, surface: &mut DisplaySurface) -> Result<()> {
        if grid.size() != self.matrix_size {
            return Err(Error::invalid_grid(format!(
                "renderer expects a {n}x{n} grid, got {m}x{m}",
                n = self.matrix_size,
                m = grid.size()
            )));
        }

        surface.clear(Rgb::BLACK);

        for (x, y, color) in grid.cells() {
            let (ox, oy) = self.cell_origin(x, y);
            match self.shape {
                LedShape::Circle => {
                    let half = self.cell / 2.0;
                    surface.fill_circle(ox + half, oy + half, self.radius, color);
                }
                LedShape::Square => {
                    let side = self.cell - 2.0 * self.inset;
                    surface.fill_rect(ox + self.inset, oy + self.inset, side, side, color);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_rect_pixel_centres() {
        let mut surface = DisplaySurface::new(10);
        surface.fill_rect(1.0, 1.0, 3.0, 3.0, Rgb::new(9, 9, 9));
        for y in 0..10 {
            for x in 0..10 {
                let inside = (1..=3).contains(&x) && (1..=3).contains(&y);
                let expected = if inside { Rgb::new(9, 9, 9) } else { Rgb::BLACK };
                assert_eq!(surface.pixel(x, y), expected, "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_fill_shapes_clamped_to_canvas() {
        let mut surface = DisplaySurface::new(4);
        surface.fill_rect(-5.0, -5.0, 100.0, 100.0, Rgb::new(1, 1, 1));
        surface.fill_circle(0.0, 0.0, 50.0, Rgb::new(2, 2, 2));
        assert_eq!(surface.pixel(3, 3), Rgb::new(2, 2, 2));
    }

    #[test]
    fn test_render_rejects_wrong_grid_size() {
        let settings = MatrixConfig {
            canvas_size: 20,
            matrix_size: 4,
            ..Default::default()
        };
        let renderer = MatrixRenderer::new(&settings);
        let mut surface = DisplaySurface::new(20);
        surface.clear(Rgb::new(7, 7, 7));

        let grid = ColorGrid::filled(3, Rgb::new(255, 0, 0));
        assert!(renderer.render(&grid, &mut surface).is_err());
        // Untouched
        assert_eq!(surface.pixel(0, 0), Rgb::new(7, 7, 7));
    }

    #[test]
    fn test_circle_radius_uses_divisor() {
        let settings = MatrixConfig::default();
        let renderer = MatrixRenderer::new(&settings);
        assert!((renderer.radius() - 18.75 / 2.3).abs() < 1e-9);
    }

    #[test]
    fn test_encode_png_signature() {
        let surface = DisplaySurface::new(8);
        let png = surface.encode_png().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
