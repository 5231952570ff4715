//! Configuration surface consumed by the core components.
//!
//! Loading happens in the facade; these types only carry values and validate
//! them at construction time.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use wallpost_error::{ConfigError, WallpostResult};

fn default_workers() -> usize {
    1
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_delay_secs() -> u64 {
    3
}

fn default_rate_limit_secs() -> u64 {
    30
}

/// Worker pool configuration.
///
/// # Examples
///
/// ```
/// use wallpost_core::WorkerConfig;
///
/// let config = WorkerConfig::default();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of concurrent polling tasks
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Seconds between poll ticks
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Retries after the first failed publish attempt
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    /// Seconds between publish attempts
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    /// Minimum seconds between successful publishes across the pool
    #[serde(default = "default_rate_limit_secs")]
    pub rate_limit_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            poll_interval_secs: default_poll_interval_secs(),
            retry_count: default_retry_count(),
            retry_delay_secs: default_retry_delay_secs(),
            rate_limit_secs: default_rate_limit_secs(),
        }
    }
}

impl WorkerConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the worker count is zero or the poll
    /// interval is zero.
    pub fn validate(&self) -> WallpostResult<()> {
        if self.workers == 0 {
            Err(ConfigError::new("worker count must be at least 1"))?;
        }
        if self.poll_interval_secs == 0 {
            Err(ConfigError::new("poll interval must be positive"))?;
        }
        Ok(())
    }

    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Retry delay as a [`Duration`].
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// Rate-limit interval as a [`Duration`].
    pub fn rate_limit(&self) -> Duration {
        Duration::from_secs(self.rate_limit_secs)
    }
}

/// Credential/session lifecycle configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Explicitly configured credential value, tried first at startup
    #[serde(default)]
    pub cookie: String,
    /// File holding the last-known credential, overwritten on refresh
    #[serde(default)]
    pub cookie_file: Option<PathBuf>,
    /// Enable the interactive device-pairing (QR) login fallback
    #[serde(default)]
    pub auto_login: bool,
    /// Keep-alive probe interval in seconds; zero disables the prober
    #[serde(default)]
    pub keep_alive_secs: u64,
    /// Administrative notification channel; zero disables notifications
    #[serde(default)]
    pub admin_channel: i64,
}

impl SessionConfig {
    /// Keep-alive interval, `None` when the prober is disabled.
    pub fn keep_alive(&self) -> Option<Duration> {
        (self.keep_alive_secs > 0).then(|| Duration::from_secs(self.keep_alive_secs))
    }
}

fn default_author_prefix() -> String {
    "【来自 {} 的投稿】\n\n".to_string()
}

/// Wall presentation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallConfig {
    /// Prefix published text with the author display name
    #[serde(default)]
    pub show_author: bool,
    /// Attribution template; `{}` is replaced with the display name
    #[serde(default = "default_author_prefix")]
    pub author_prefix: String,
}

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            show_author: false,
            author_prefix: default_author_prefix(),
        }
    }
}

impl WallConfig {
    /// Compose the outbound text for a submission.
    ///
    /// The author prefix is applied only when `show_author` is set and the
    /// submission is not anonymous.
    pub fn compose_text(&self, display_name: &str, text: &str, anonymous: bool) -> String {
        if self.show_author && !anonymous {
            format!("{}{}", self.author_prefix.replace("{}", display_name), text)
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_config_rejects_zero_workers() {
        let config = WorkerConfig {
            workers: 0,
            ..WorkerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_worker_config_rejects_zero_poll_interval() {
        let config = WorkerConfig {
            poll_interval_secs: 0,
            ..WorkerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_retry_count_is_valid() {
        let config = WorkerConfig {
            retry_count: 0,
            ..WorkerConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_keep_alive_disabled_at_zero() {
        let config = SessionConfig::default();
        assert!(config.keep_alive().is_none());
    }

    #[test]
    fn test_compose_text_respects_anonymity() {
        let config = WallConfig {
            show_author: true,
            ..WallConfig::default()
        };
        let attributed = config.compose_text("alice", "hi", false);
        assert!(attributed.contains("alice"));
        assert!(attributed.ends_with("hi"));
        assert_eq!(config.compose_text("alice", "hi", true), "hi");
    }
}
