use std::time::Duration;

use crate::error::{LetzError, Result};

/// Public LetzAI API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.letz.ai";

fn normalize(endpoint: String) -> String {
    endpoint.trim_end_matches('/').to_string()
}

/// Timing and endpoint settings for [`LetzClient`](crate::LetzClient).
///
/// Use [`ClientConfig::builder()`] for ergonomic construction, or
/// [`ClientConfig::default()`] for the public API with stock timings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API base URL without trailing slash.
    pub base_url: String,

    /// Delay between status checks.
    pub poll_interval: Duration,

    /// Longest time to wait for a job to reach a terminal status.
    pub max_wait: Duration,

    /// Timeout for submit, status and interruption calls.
    pub request_timeout: Duration,

    /// Timeout for downloading the finished image.
    pub download_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: Duration::from_secs(2),
            max_wait: Duration::from_secs(300),
            request_timeout: Duration::from_secs(30),
            download_timeout: Duration::from_secs(60),
        }
    }
}

impl ClientConfig {
    /// Start building a config with the builder pattern.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Defaults overlaid with `LETZAI_BASE_URL`, `LETZAI_POLL_INTERVAL_SECS`
    /// and `LETZAI_MAX_WAIT_SECS` when set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::builder();
        if let Some(url) = lookup("LETZAI_BASE_URL") {
            builder = builder.with_base_url(url);
        }
        if let Some(secs) = lookup("LETZAI_POLL_INTERVAL_SECS") {
            builder = builder.with_poll_interval(parse_secs("LETZAI_POLL_INTERVAL_SECS", &secs)?);
        }
        if let Some(secs) = lookup("LETZAI_MAX_WAIT_SECS") {
            builder = builder.with_max_wait(parse_secs("LETZAI_MAX_WAIT_SECS", &secs)?);
        }
        Ok(builder.build())
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| LetzError::InvalidInput(format!("{} must be whole seconds, got {:?}", key, value)))
}

/// Builder for [`ClientConfig`].
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Point the client at a different API host (trailing slashes are dropped).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = normalize(url.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.config.max_wait = max_wait;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.config.download_timeout = timeout;
        self
    }

    /// Build the final [`ClientConfig`].
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
