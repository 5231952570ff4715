//! Application settings.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, instrument};
use wallpost_core::{SessionConfig, WallConfig, WorkerConfig};
use wallpost_error::{ConfigError, WallpostError, WallpostResult};

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Logging output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    /// Log level filter (e.g., "info", "debug"); `RUST_LOG` overrides it
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON-formatted log lines
    #[serde(default)]
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Top-level application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the feed service API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Worker pool configuration
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Credential lifecycle configuration
    #[serde(default)]
    pub session: SessionConfig,
    /// Wall presentation configuration
    #[serde(default)]
    pub wall: WallConfig,
    /// Logging configuration
    #[serde(default)]
    pub log: LogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            worker: WorkerConfig::default(),
            session: SessionConfig::default(),
            wall: WallConfig::default(),
            log: LogSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a specific file path plus environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> WallpostResult<Self> {
        debug!("loading settings from file");
        Self::build(Config::builder().add_source(File::from(path.as_ref())))
    }

    /// Load settings with precedence: environment > `./wallpost.toml` >
    /// built-in defaults.
    ///
    /// Environment variables use the `WALLPOST_` prefix with `__` as the
    /// section separator, e.g. `WALLPOST_WORKER__WORKERS=4`.
    ///
    /// # Errors
    ///
    /// Returns an error if a present source cannot be read or parsed.
    #[instrument]
    pub fn load() -> WallpostResult<Self> {
        debug!("loading settings: environment > ./wallpost.toml > defaults");
        Self::build(Config::builder().add_source(File::with_name("wallpost").required(false)))
    }

    fn build(builder: config::ConfigBuilder<config::builder::DefaultState>) -> WallpostResult<Self> {
        builder
            .add_source(Environment::with_prefix("WALLPOST").separator("__"))
            .build()
            .map_err(|e| {
                WallpostError::from(ConfigError::new(format!("failed to read settings: {e}")))
            })?
            .try_deserialize()
            .map_err(|e| {
                WallpostError::from(ConfigError::new(format!("failed to parse settings: {e}")))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let settings = Settings::default();
        assert_eq!(settings.base_url, "http://127.0.0.1:8080");
        assert_eq!(settings.worker.workers, 1);
        assert_eq!(settings.session.keep_alive_secs, 0);
        assert!(!settings.log.json);
    }

    #[test]
    fn test_from_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallpost.toml");
        std::fs::write(
            &path,
            r#"
base_url = "https://feed.example"

[worker]
workers = 3
rate_limit_secs = 10

[session]
keep_alive_secs = 300

[log]
level = "debug"
json = true
"#,
        )
        .unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.base_url, "https://feed.example");
        assert_eq!(settings.worker.workers, 3);
        assert_eq!(settings.worker.rate_limit_secs, 10);
        // Unset fields keep their defaults.
        assert_eq!(settings.worker.poll_interval_secs, 5);
        assert_eq!(settings.session.keep_alive_secs, 300);
        assert!(settings.log.json);
    }

    #[test]
    fn test_from_file_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallpost.toml");
        std::fs::write(&path, "base_url = [not toml").unwrap();
        assert!(Settings::from_file(&path).is_err());
    }
}
