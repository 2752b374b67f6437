//! CLI configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use roster_core::client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use roster_core::{ClientConfig, RetryPolicy};

pub const DEFAULT_DATA_DIR: &str = ".roster";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Holds the token and form drafts.
    pub data_dir: PathBuf,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let millis = |key: &str| {
            var(key)
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_millis)
        };
        let defaults = RetryPolicy::default();

        Self {
            api_url: var("ROSTER_API_URL")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: millis("ROSTER_TIMEOUT_MS").unwrap_or(DEFAULT_TIMEOUT),
            retry: RetryPolicy {
                max_retries: var("ROSTER_RETRIES")
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(defaults.max_retries),
                base_delay: millis("ROSTER_RETRY_DELAY_MS").unwrap_or(defaults.base_delay),
                max_delay: millis("ROSTER_MAX_DELAY_MS").unwrap_or(defaults.max_delay),
                ..defaults
            },
            data_dir: var("ROSTER_DATA_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_url.clone(),
            timeout: self.timeout,
            retry: self.retry,
        }
    }
}
