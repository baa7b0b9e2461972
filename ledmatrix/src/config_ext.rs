//! Extension pour lire les réglages d'affichage depuis ledconfig
//!
//! Ce module fournit le trait `MatrixConfigExt` qui ajoute à
//! `ledconfig::Config` les getters/setters de la section `display` et
//! `poll`, ainsi que la construction du [`MatrixConfig`] validé.
//!
//! # Exemple
//!
//! ```no_run
//! use ledconfig::get_config;
//! use ledmatrix::MatrixConfigExt;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = get_config();
//! let settings = config.matrix_settings()?;
//! println!("{}x{} LEDs", settings.matrix_size, settings.matrix_size);
//! # Ok(())
//! # }
//! ```

use crate::settings::{
    DEFAULT_CANVAS_SIZE, DEFAULT_LED_RADIUS_DIVISOR, DEFAULT_MATRIX_SIZE,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_SQUARE_INSET, LedShape, MatrixConfig, ResampleFilter,
};
use anyhow::{Result, anyhow};
use ledconfig::Config;
use serde_yaml::{Number, Value};
use std::time::Duration;

/// Default timeout for outgoing HTTP requests (10 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Trait d'extension pour la configuration de la matrice
pub trait MatrixConfigExt {
    fn get_canvas_size(&self) -> Result<u32>;
    fn set_canvas_size(&self, size: u32) -> Result<()>;

    fn get_matrix_size(&self) -> Result<u32>;
    fn set_matrix_size(&self, size: u32) -> Result<()>;

    /// Forme des LEDs (`circle` ou `square`)
    fn get_led_shape(&self) -> Result<LedShape>;
    fn set_led_shape(&self, shape: LedShape) -> Result<()>;

    fn get_led_radius_divisor(&self) -> Result<f64>;
    fn get_square_inset(&self) -> Result<f64>;
    fn get_resample_filter(&self) -> Result<ResampleFilter>;
    fn get_terminal_preview(&self) -> Result<bool>;

    fn get_poll_interval_ms(&self) -> Result<u64>;
    fn set_poll_interval_ms(&self, interval_ms: u64) -> Result<()>;

    /// Timeout appliqué aux requêtes HTTP sortantes
    fn get_request_timeout(&self) -> Result<Duration>;

    /// Construit et valide le [`MatrixConfig`] utilisé pendant toute la vie du processus
    fn matrix_settings(&self) -> Result<MatrixConfig>;
}

fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| anyhow!("{what} is too large: {value}"))
}

impl MatrixConfigExt for Config {
    fn get_canvas_size(&self) -> Result<u32> {
        to_u32(
            self.get_usize_or(&["display", "canvas_size"], DEFAULT_CANVAS_SIZE as usize),
            "display.canvas_size",
        )
    }

    fn set_canvas_size(&self, size: u32) -> Result<()> {
        self.set_value(&["display", "canvas_size"], Value::Number(Number::from(size)))
    }

    fn get_matrix_size(&self) -> Result<u32> {
        to_u32(
            self.get_usize_or(&["display", "matrix_size"], DEFAULT_MATRIX_SIZE as usize),
            "display.matrix_size",
        )
    }

    fn set_matrix_size(&self, size: u32) -> Result<()> {
        self.set_value(&["display", "matrix_size"], Value::Number(Number::from(size)))
    }

    fn get_led_shape(&self) -> Result<LedShape> {
        let raw = self.get_string_or(&["display", "led_shape"], "circle");
        Ok(raw.parse()?)
    }

    fn set_led_shape(&self, shape: LedShape) -> Result<()> {
        self.set_value(&["display", "led_shape"], Value::String(shape.to_string()))
    }

    fn get_led_radius_divisor(&self) -> Result<f64> {
        Ok(self.get_f64_or(
            &["display", "led_radius_divisor"],
            DEFAULT_LED_RADIUS_DIVISOR,
        ))
    }

    fn get_square_inset(&self) -> Result<f64> {
        Ok(self.get_f64_or(&["display", "square_inset"], DEFAULT_SQUARE_INSET))
    }

    fn get_resample_filter(&self) -> Result<ResampleFilter> {
        let raw = self.get_string_or(&["display", "resample_filter"], "area");
        Ok(raw.parse()?)
    }

    fn get_terminal_preview(&self) -> Result<bool> {
        Ok(self.get_bool_or(&["display", "terminal_preview"], false))
    }

    fn get_poll_interval_ms(&self) -> Result<u64> {
        Ok(self.get_usize_or(&["poll", "interval_ms"], DEFAULT_POLL_INTERVAL_MS as usize) as u64)
    }

    fn set_poll_interval_ms(&self, interval_ms: u64) -> Result<()> {
        self.set_value(
            &["poll", "interval_ms"],
            Value::Number(Number::from(interval_ms)),
        )
    }

    fn get_request_timeout(&self) -> Result<Duration> {
        let ms = self.get_usize_or(
            &["poll", "request_timeout_ms"],
            DEFAULT_REQUEST_TIMEOUT_MS as usize,
        );
        Ok(Duration::from_millis(ms as u64))
    }

    fn matrix_settings(&self) -> Result<MatrixConfig> {
        let settings = MatrixConfig {
            canvas_size: self.get_canvas_size()?,
            matrix_size: self.get_matrix_size()?,
            led_shape: self.get_led_shape()?,
            poll_interval_ms: self.get_poll_interval_ms()?,
            led_radius_divisor: self.get_led_radius_divisor()?,
            square_inset: self.get_square_inset()?,
            resample_filter: self.get_resample_filter()?,
            terminal_preview: self.get_terminal_preview()?,
        };
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> Config {
        Config::load_config(dir.path().to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_default_settings() {
        let dir = TempDir::new().unwrap();
        let settings = config(&dir).matrix_settings().unwrap();
        assert_eq!(settings, MatrixConfig::default());
    }

    #[test]
    fn test_setters_round_trip_through_yaml() {
        let dir = TempDir::new().unwrap();
        let cfg = config(&dir);
        cfg.set_matrix_size(16).unwrap();
        cfg.set_canvas_size(320).unwrap();
        cfg.set_led_shape(LedShape::Square).unwrap();
        cfg.set_poll_interval_ms(2500).unwrap();

        let settings = config(&dir).matrix_settings().unwrap();
        assert_eq!(settings.matrix_size, 16);
        assert_eq!(settings.canvas_size, 320);
        assert_eq!(settings.led_shape, LedShape::Square);
        assert_eq!(settings.poll_interval(), Duration::from_millis(2500));
    }

    #[test]
    fn test_invalid_shape_is_reported() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.yaml"),
            "display:\n  led_shape: triangle\n",
        )
        .unwrap();
        let err = config(&dir).matrix_settings().unwrap_err();
        assert!(err.to_string().contains("triangle"));
    }

    #[test]
    fn test_inconsistent_geometry_is_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.yaml"),
            "display:\n  canvas_size: 10\n  matrix_size: 32\n",
        )
        .unwrap();
        assert!(config(&dir).matrix_settings().is_err());
    }
}
