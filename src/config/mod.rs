//! Configuration module for the marketplace backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default number of listings returned by the recent feed.
pub const DEFAULT_RECENT_LIMIT: usize = 12;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key guarding the admin routes
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Path to Tantivy search index directory
    pub index_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Size of the recent listings feed
    pub recent_limit: usize,
}

/// A malformed configuration value.
#[derive(Debug)]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid value for {}: {:?}", self.key, self.value)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("MOWER_API_PSK").ok().filter(|k| !k.is_empty());

        let db_path = env::var("MOWER_DB_PATH")
            .unwrap_or_else(|_| "./data/market.sqlite".to_string())
            .into();

        let index_path = env::var("MOWER_INDEX_PATH")
            .unwrap_or_else(|_| "./data/index".to_string())
            .into();

        let raw_addr = env::var("MOWER_BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let bind_addr = raw_addr.parse().map_err(|_| ConfigError {
            key: "MOWER_BIND_ADDR",
            value: raw_addr.clone(),
        })?;

        let log_level = env::var("MOWER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let recent_limit = match env::var("MOWER_RECENT_LIMIT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError {
                key: "MOWER_RECENT_LIMIT",
                value: raw,
            })?,
            Err(_) => DEFAULT_RECENT_LIMIT,
        };

        Ok(Self {
            api_psk,
            db_path,
            index_path,
            bind_addr,
            log_level,
            recent_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: [&str; 6] = [
        "MOWER_API_PSK",
        "MOWER_DB_PATH",
        "MOWER_INDEX_PATH",
        "MOWER_BIND_ADDR",
        "MOWER_LOG_LEVEL",
        "MOWER_RECENT_LIMIT",
    ];

    // Both cases touch process-wide env vars, so they run in one test.
    #[test]
    fn test_config_from_env() {
        for key in KEYS {
            env::remove_var(key);
        }

        let config = Config::from_env().unwrap();

        assert!(config.api_psk.is_none());
        assert_eq!(config.db_path, PathBuf::from("./data/market.sqlite"));
        assert_eq!(config.index_path, PathBuf::from("./data/index"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.recent_limit, DEFAULT_RECENT_LIMIT);

        env::set_var("MOWER_BIND_ADDR", "not-an-address");
        let err = Config::from_env().unwrap_err();
        assert_eq!(err.key, "MOWER_BIND_ADDR");
        env::remove_var("MOWER_BIND_ADDR");

        env::set_var("MOWER_RECENT_LIMIT", "twelve");
        let err = Config::from_env().unwrap_err();
        assert_eq!(err.key, "MOWER_RECENT_LIMIT");
        env::remove_var("MOWER_RECENT_LIMIT");
    }
}
