//! Logging initialization.

use crate::LogSettings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use wallpost_error::{ConfigError, WallpostError, WallpostResult};

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. The JSON flag
/// switches the fmt layer to structured output for log shippers.
///
/// # Errors
///
/// Returns an error when the configured level filter cannot be parsed.
pub fn init_observability(settings: &LogSettings) -> WallpostResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| {
            WallpostError::from(ConfigError::new(format!(
                "invalid log filter {:?}: {e}",
                settings.level
            )))
        })?;

    let fmt_layer = if settings.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_level(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
    Ok(())
}
