//! Artwork sampler: downloads cover art and shrinks it to an N×N color grid
//!
//! Each output pixel is whatever the resampling filter produces when the
//! whole artwork is squeezed into N×N. The default area filter averages the
//! source pixels covered by the cell, weighting partially covered pixels by
//! their overlap. The other filters are delegated to the `image` crate.
//! Non-square artwork is squashed, never cropped.

use crate::error::{Error, Result};
use crate::grid::ColorGrid;
use crate::settings::{MatrixConfig, ResampleFilter};
use async_trait::async_trait;
use image::{DynamicImage, RgbaImage};
use image::imageops;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, trace};

/// Turns an artwork reference into a color grid
///
/// Each call completes or fails exactly once.
#[async_trait]
pub trait ArtworkSampler: Send + Sync {
    async fn sample(&self, url: &str) -> Result<ColorGrid>;
}

/// Sampler fetching artwork over plain HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpSampler {
    client: Client,
    matrix_size: u32,
    filter: ResampleFilter,
}

impl HttpSampler {
    /// Create a sampler with its own HTTP client
    pub fn new(settings: &MatrixConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(
            client,
            settings.matrix_size,
            settings.resample_filter,
        ))
    }

    /// Create a sampler sharing an existing `reqwest::Client`
    pub fn with_client(client: Client, matrix_size: u32, filter: ResampleFilter) -> Self {
        Self {
            client,
            matrix_size,
            filter,
        }
    }

    pub fn matrix_size(&self) -> u32 {
        self.matrix_size
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status(status.as_u16()));
        }
        let bytes = response.bytes().await?;
        trace!(url, bytes = bytes.len(), "artwork downloaded");
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ArtworkSampler for HttpSampler {
    async fn sample(&self, url: &str) -> Result<ColorGrid> {
        let bytes = self.download(url).await?;
        let size = self.matrix_size;
        let filter = self.filter;

        // Le décodage est synchrone et coûteux: hors du runtime async
        let grid =
            tokio::task::spawn_blocking(move || decode_and_downsample(&bytes, size, filter))
                .await??;

        debug!(url, size, "artwork sampled");
        Ok(grid)
    }
}

/// Decodes an encoded image (PNG, JPEG, WebP) and downsamples it
pub fn decode_and_downsample(
    bytes: &[u8],
    size: u32,
    filter: ResampleFilter,
) -> Result<ColorGrid> {
    let img = image::load_from_memory(bytes)?;
    downsample(&img, size, filter)
}

/// Shrinks `img` to `size`×`size` and keeps one RGB triple per pixel
pub fn downsample(img: &DynamicImage, size: u32, filter: ResampleFilter) -> Result<ColorGrid> {
    if size == 0 {
        return Err(Error::invalid_grid("grid size must be at least 1"));
    }
    let rgba = img.to_rgba8();
    let resized = match filter.filter_type() {
        Some(kernel) => imageops::resize(&rgba, size, size, kernel),
        None => area_average(&rgba, size),
    };
    ColorGrid::from_rgba(size as usize, resized.as_raw())
}

/// Source pixels overlapped by each of the `size` output cells along one
/// axis of length `len`, with the overlap as weight
fn cell_spans(len: u32, size: u32) -> Vec<Vec<(u32, f64)>> {
    let scale = len as f64 / size as f64;
    (0..size)
        .map(|cell| {
            let start = cell as f64 * scale;
            let end = start + scale;
            let first = start.floor() as u32;
            let last = (end.ceil() as u32).min(len);
            (first..last)
                .map(|px| {
                    let px_start = px as f64;
                    let weight = end.min(px_start + 1.0) - start.max(px_start);
                    (px, weight)
                })
                .filter(|&(_, weight)| weight > 0.0)
                .collect()
        })
        .collect()
}

/// Box filter with fractional coverage: every output pixel is the mean of
/// the source area it covers
fn area_average(src: &RgbaImage, size: u32) -> RgbaImage {
    let (width, height) = src.dimensions();
    let columns = cell_spans(width, size);
    let rows = cell_spans(height, size);
    let area = (width as f64 / size as f64) * (height as f64 / size as f64);

    RgbaImage::from_fn(size, size, |x, y| {
        let mut sum = [0.0f64; 4];
        for &(sy, wy) in &rows[y as usize] {
            for &(sx, wx) in &columns[x as usize] {
                let px = src.get_pixel(sx, sy).0;
                for (acc, channel) in sum.iter_mut().zip(px) {
                    *acc += channel as f64 * wx * wy;
                }
            }
        }
        image::Rgba(sum.map(|v| (v / area).round().clamp(0.0, 255.0) as u8))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Rgb;
    use image::{ImageBuffer, Rgba};

    #[test]
    fn test_downsample_keeps_quadrants() {
        // 64x64 image split in four solid quadrants
        let img = ImageBuffer::from_fn(64, 64, |x, y| match (x < 32, y < 32) {
            (true, true) => Rgba([255, 0, 0, 255]),
            (false, true) => Rgba([0, 255, 0, 255]),
            (true, false) => Rgba([0, 0, 255, 255]),
            (false, false) => Rgba([255, 255, 255, 255]),
        });
        let grid = downsample(&DynamicImage::ImageRgba8(img), 2, ResampleFilter::Area).unwrap();

        let close = |a: u8, b: u8| a.abs_diff(b) <= 1;
        let tl = grid.get(0, 0);
        assert!(close(tl.r, 255) && close(tl.g, 0) && close(tl.b, 0), "{tl:?}");
        let tr = grid.get(1, 0);
        assert!(close(tr.r, 0) && close(tr.g, 255) && close(tr.b, 0), "{tr:?}");
        let bl = grid.get(0, 1);
        assert!(close(bl.r, 0) && close(bl.g, 0) && close(bl.b, 255), "{bl:?}");
        let br = grid.get(1, 1);
        assert!(close(br.r, 255) && close(br.g, 255) && close(br.b, 255), "{br:?}");
    }

    #[test]
    fn test_area_weights_partial_pixels() {
        // Moitié gauche rouge, moitié droite bleue, réduite à 3 colonnes
        let img = ImageBuffer::from_fn(4, 4, |x, _| {
            if x < 2 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        let grid = downsample(&DynamicImage::ImageRgba8(img), 3, ResampleFilter::Area).unwrap();

        assert_eq!(grid.get(0, 0), Rgb::new(255, 0, 0));
        assert_eq!(grid.get(2, 0), Rgb::new(0, 0, 255));
        let middle = grid.get(1, 0);
        assert!(middle.r.abs_diff(128) <= 1 && middle.b.abs_diff(128) <= 1, "{middle:?}");
        assert_eq!(middle.g, 0);
    }

    #[test]
    fn test_area_upscale_repeats_pixels() {
        let img = ImageBuffer::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgba([10, 20, 30, 255])
            } else {
                Rgba([200, 100, 50, 255])
            }
        });
        let grid = downsample(&DynamicImage::ImageRgba8(img), 4, ResampleFilter::Area).unwrap();
        assert_eq!(grid.get(0, 3), Rgb::new(10, 20, 30));
        assert_eq!(grid.get(1, 0), Rgb::new(10, 20, 30));
        assert_eq!(grid.get(2, 0), Rgb::new(200, 100, 50));
    }

    #[test]
    fn test_downsample_rejects_zero_size() {
        let img = DynamicImage::new_rgb8(4, 4);
        assert!(downsample(&img, 0, ResampleFilter::Area).is_err());
    }

    #[test]
    fn test_decode_garbage_is_image_error() {
        let err = decode_and_downsample(b"definitely not an image", 4, ResampleFilter::Area)
            .unwrap_err();
        assert!(matches!(err, Error::Image(_)));
        assert!(err.is_image_load());
    }
}
