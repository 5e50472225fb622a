//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Origins allowed to make cross-origin requests when none are configured.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 3] = [
    "https://pjsk.moe",
    "https://www.pjsk.moe",
    "https://snowyviewer.exmeaning.com",
];

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Remote cache locator; empty selects the memory tier
    pub redis_url: String,
    /// Directory served by the static file handler
    pub static_root: PathBuf,
    /// HTTP server port
    pub server_port: u16,
    /// Memory-tier sweep interval in seconds, 0 disables the sweep
    pub cleanup_interval: u64,
    /// Exact origins echoed by the CORS middleware
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_URL` - Redis URL or `host:port` (default: empty, memory cache)
    /// - `STATIC_ROOT` - Static site directory (default: ./web/out)
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `CLEANUP_INTERVAL` - Memory sweep frequency in seconds (default: 60)
    /// - `ALLOWED_ORIGINS` - Comma-separated CORS allowlist
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            redis_url: env::var("REDIS_URL")
                .map(|v| v.trim().to_string())
                .unwrap_or(defaults.redis_url),
            static_root: env::var("STATIC_ROOT")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.static_root),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            cleanup_interval: env::var("CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cleanup_interval),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| parse_origins(&v))
                .filter(|origins| !origins.is_empty())
                .unwrap_or(defaults.allowed_origins),
        }
    }

    /// Sweep interval, or `None` when the sweep is disabled.
    pub fn cleanup_period(&self) -> Option<Duration> {
        (self.cleanup_interval > 0).then(|| Duration::from_secs(self.cleanup_interval))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: String::new(),
            static_root: PathBuf::from("./web/out"),
            server_port: 8080,
            cleanup_interval: 60,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.redis_url, "");
        assert_eq!(config.static_root, PathBuf::from("./web/out"));
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.cleanup_interval, 60);
        assert_eq!(config.allowed_origins.len(), 3);
        assert!(config.allowed_origins.contains(&"https://pjsk.moe".to_string()));
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("REDIS_URL");
        env::remove_var("STATIC_ROOT");
        env::remove_var("SERVER_PORT");
        env::remove_var("CLEANUP_INTERVAL");
        env::remove_var("ALLOWED_ORIGINS");

        let config = Config::from_env();
        assert_eq!(config.redis_url, "");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.cleanup_interval, 60);
        assert_eq!(config.allowed_origins, Config::default().allowed_origins);
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins(" https://a.example , https://b.example,,"),
            vec!["https://a.example", "https://b.example"]
        );
        assert!(parse_origins(" , ").is_empty());
    }

    #[test]
    fn test_cleanup_period() {
        let mut config = Config::default();
        assert_eq!(config.cleanup_period(), Some(Duration::from_secs(60)));

        config.cleanup_interval = 0;
        assert_eq!(config.cleanup_period(), None);
    }
}
