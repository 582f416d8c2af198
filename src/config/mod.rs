//! Configuration module for bc-stats.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::errors::AppError;
use crate::queue::DEFAULT_CONCURRENCY;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the competition API
    pub api_base: String,
    /// Competition episode to scrape
    pub episode: String,
    /// Directory holding the published snapshot files
    pub data_dir: PathBuf,
    /// Maximum number of page requests in flight
    pub concurrency: usize,
    /// Base URL the snapshot files are published at
    pub publish_url: String,
    /// Path to the SQLite file backing the local cache
    pub cache_path: PathBuf,
    /// Namespace the local cache entries are scoped under
    pub cache_namespace: String,
    /// Address the publisher binds to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_base = env::var("BC_API_BASE")
            .unwrap_or_else(|_| "https://api.battlecode.org/api".to_string())
            .trim_end_matches('/')
            .to_string();

        let episode = env::var("BC_EPISODE").unwrap_or_else(|_| "bc24".to_string());

        let data_dir = env::var("BC_DATA_DIR")
            .unwrap_or_else(|_| "./data".to_string())
            .into();

        let concurrency = env::var("BC_CONCURRENCY")
            .ok()
            .map_or(Some(DEFAULT_CONCURRENCY), |v| v.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .ok_or_else(|| AppError::Config("BC_CONCURRENCY must be a positive integer".into()))?;

        let publish_url = env::var("BC_PUBLISH_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string())
            .trim_end_matches('/')
            .to_string();

        let cache_path = env::var("BC_CACHE_PATH")
            .unwrap_or_else(|_| "./cache/bc-stats.sqlite".to_string())
            .into();

        let cache_namespace = env::var("BC_CACHE_NAMESPACE")
            .unwrap_or_else(|_| "battlecode-2024-statistics".to_string());

        let bind_addr = env::var("BC_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid BC_BIND_ADDR format: {}", e)))?;

        let log_level = env::var("BC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            api_base,
            episode,
            data_dir,
            concurrency,
            publish_url,
            cache_path,
            cache_namespace,
            bind_addr,
            log_level,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 9] = [
        "BC_API_BASE",
        "BC_EPISODE",
        "BC_DATA_DIR",
        "BC_CONCURRENCY",
        "BC_PUBLISH_URL",
        "BC_CACHE_PATH",
        "BC_CACHE_NAMESPACE",
        "BC_BIND_ADDR",
        "BC_LOG_LEVEL",
    ];

    #[test]
    fn test_default_config() {
        for var in VARS {
            env::remove_var(var);
        }

        let config = Config::from_env().unwrap();

        assert_eq!(config.api_base, "https://api.battlecode.org/api");
        assert_eq!(config.episode, "bc24");
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.publish_url, "http://127.0.0.1:8080");
        assert_eq!(config.cache_path, PathBuf::from("./cache/bc-stats.sqlite"));
        assert_eq!(config.cache_namespace, "battlecode-2024-statistics");
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
    }
}
