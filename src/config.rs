//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default relevance filter fraction
pub const DEFAULT_RELEVANCE_THRESHOLD: f64 = 0.10;

/// Default remote API base URL
pub const DEFAULT_BASE_URL: &str = "https://classic.warcraftlogs.com:443/v1";

/// TTL and capacity for one cache namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceConfig {
    /// Time-to-live in seconds
    pub ttl: u64,
    /// Maximum number of live entries
    pub limit: usize,
}

impl NamespaceConfig {
    /// Returns the TTL as a Duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl)
    }
}

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Report listings change as new raids are uploaded
    pub reports: NamespaceConfig,
    /// Per-log tables are immutable once a report is closed
    pub logs: NamespaceConfig,
    /// Fraction of the top mean below which rows are dropped
    pub relevance_threshold: f64,
    /// Bound on one remote fetch, and on waiting for someone else's
    pub fetch_timeout: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background expiry sweep interval in seconds
    pub cleanup_interval: u64,
    /// Remote API base URL
    pub base_url: String,
    /// Remote API key
    pub api_key: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REPORTS_TTL` / `REPORTS_LIMIT` - listing namespace (default: 600s / 100)
    /// - `LOGS_TTL` / `LOGS_LIMIT` - log namespace (default: 86400s / 500)
    /// - `RELEVANCE_THRESHOLD` - fraction in (0, 1) (default: 0.10)
    /// - `FETCH_TIMEOUT` - seconds, at least 1 (default: 30)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - sweep frequency in seconds (default: 60)
    /// - `WCL_BASE_URL` - remote API base URL
    /// - `API_KEY` - remote API key (default: empty)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let relevance_threshold = env_or("RELEVANCE_THRESHOLD", defaults.relevance_threshold);
        let relevance_threshold = if relevance_threshold > 0.0 && relevance_threshold < 1.0 {
            relevance_threshold
        } else {
            defaults.relevance_threshold
        };

        Self {
            reports: NamespaceConfig {
                ttl: env_or("REPORTS_TTL", defaults.reports.ttl),
                limit: env_or("REPORTS_LIMIT", defaults.reports.limit),
            },
            logs: NamespaceConfig {
                ttl: env_or("LOGS_TTL", defaults.logs.ttl),
                limit: env_or("LOGS_LIMIT", defaults.logs.limit),
            },
            relevance_threshold,
            fetch_timeout: env_or("FETCH_TIMEOUT", defaults.fetch_timeout).max(1),
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            base_url: env::var("WCL_BASE_URL").unwrap_or(defaults.base_url),
            api_key: env::var("API_KEY").unwrap_or(defaults.api_key),
        }
    }

    /// Returns the fetch timeout as a Duration, never shorter than a second.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout.max(1))
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reports: NamespaceConfig {
                ttl: 60 * 10,
                limit: 100,
            },
            logs: NamespaceConfig {
                ttl: 60 * 60 * 24,
                limit: 500,
            },
            relevance_threshold: DEFAULT_RELEVANCE_THRESHOLD,
            fetch_timeout: 30,
            server_port: 3000,
            cleanup_interval: 60,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
        }
    }
}
