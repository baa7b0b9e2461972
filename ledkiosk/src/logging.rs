//! Tracing subscriber setup

use ledconfig::Config;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Maps a configured level name to an `EnvFilter` directive
///
/// Unknown names fall back to `info`.
pub fn level_directive(level: &str) -> &'static str {
    match level.trim().to_uppercase().as_str() {
        "ERROR" => "error",
        "WARN" | "WARNING" => "warn",
        "INFO" => "info",
        "DEBUG" => "debug",
        "TRACE" => "trace",
        _ => "info",
    }
}

/// Initialise le logging
///
/// `RUST_LOG` wins when set; otherwise `host.logger.min_level` applies.
/// The console layer can be disabled with `host.logger.enable_console`.
/// Calling it twice is harmless.
pub fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = config
            .get_log_min_level()
            .unwrap_or_else(|_| "INFO".to_string());
        EnvFilter::new(level_directive(&level))
    });

    let enable_console = config.get_log_enable_console().unwrap_or(true);

    let subscriber = tracing_subscriber::registry().with(filter);
    let result = if enable_console {
        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_ansi(true),
            )
            .try_init()
    } else {
        subscriber.try_init()
    };

    if result.is_err() {
        tracing::debug!("Logging already initialised");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_directive() {
        assert_eq!(level_directive("INFO"), "info");
        assert_eq!(level_directive(" warning "), "warn");
        assert_eq!(level_directive("Trace"), "trace");
        assert_eq!(level_directive("verbose"), "info");
    }
}
