//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 100;

/// Agent server configuration.
#[derive(Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Shared secret for the internal reload endpoint.
    pub internal_token: Option<String>,
    /// Directory served under `/widget`.
    pub widget_dir: PathBuf,
    /// Requests allowed per client IP per minute. 0 disables the limit.
    pub rate_limit_per_minute: u32,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("database_url", &self.database_url)
            .field("internal_token", &self.internal_token.as_ref().map(|_| "[REDACTED]"))
            .field("widget_dir", &self.widget_dir)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `AGENT_SERVER_ADDR` | Server bind address | `0.0.0.0:3001` |
    /// | `DATABASE_URL` | SQLite database URL | `sqlite:agent_chat.db?mode=rwc` |
    /// | `INTERNAL_API_TOKEN` | Reload endpoint secret | (unset) |
    /// | `WIDGET_DIR` | Static widget assets | `widget` |
    /// | `RATE_LIMIT_PER_MINUTE` | Requests per client IP per minute, 0 to disable | `100` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("AGENT_SERVER_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3001".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:agent_chat.db?mode=rwc".to_string());

        let internal_token = env::var("INTERNAL_API_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        let widget_dir = env::var("WIDGET_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("widget"));

        let rate_limit_per_minute = match env::var("RATE_LIMIT_PER_MINUTE") {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidRateLimit)?,
            Err(_) => DEFAULT_RATE_LIMIT_PER_MINUTE,
        };

        Ok(Self {
            addr,
            database_url,
            internal_token,
            widget_dir,
            rate_limit_per_minute,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid AGENT_SERVER_ADDR format")]
    InvalidAddr,

    #[error("RATE_LIMIT_PER_MINUTE must be a non-negative integer")]
    InvalidRateLimit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env() {
        env::remove_var("AGENT_SERVER_ADDR");
        env::remove_var("DATABASE_URL");
        env::set_var("INTERNAL_API_TOKEN", "  ");
        env::remove_var("WIDGET_DIR");
        env::remove_var("RATE_LIMIT_PER_MINUTE");

        let config = Config::from_env().unwrap();
        assert_eq!(config.addr.port(), 3001);
        assert_eq!(config.database_url, "sqlite:agent_chat.db?mode=rwc");
        assert!(config.internal_token.is_none());
        assert_eq!(config.widget_dir, PathBuf::from("widget"));
        assert_eq!(config.rate_limit_per_minute, 100);

        env::set_var("INTERNAL_API_TOKEN", "s3cret");
        env::set_var("AGENT_SERVER_ADDR", "127.0.0.1:8080");
        let config = Config::from_env().unwrap();
        assert_eq!(config.internal_token.as_deref(), Some("s3cret"));
        assert!(!format!("{:?}", config).contains("s3cret"));

        env::set_var("AGENT_SERVER_ADDR", "not an address");
        assert!(matches!(Config::from_env(), Err(ConfigError::InvalidAddr)));
        env::remove_var("AGENT_SERVER_ADDR");

        env::set_var("RATE_LIMIT_PER_MINUTE", "0");
        assert_eq!(Config::from_env().unwrap().rate_limit_per_minute, 0);
        env::set_var("RATE_LIMIT_PER_MINUTE", "lots");
        assert!(matches!(Config::from_env(), Err(ConfigError::InvalidRateLimit)));

        env::remove_var("RATE_LIMIT_PER_MINUTE");
        env::remove_var("INTERNAL_API_TOKEN");
    }
}
