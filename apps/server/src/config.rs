//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `MADEH_ENV` | `development` |
//! | `MADEH_BIND_ADDR` | `0.0.0.0:8080` |
//! | `MADEH_DB_PATH` | `<data dir>/madeh.db` |
//! | `MADEH_STORAGE_DIR` | `<data dir>/backups` |
//! | `MADEH_JWT_SECRET` | development only: a fixed dev secret |
//! | `MADEH_SESSION_LIFETIME_SECS` | `28800` (8 hours) |
//! | `MADEH_LOW_STOCK_THRESHOLD` | `5` |
//! | `MADEH_DB_MAX_CONNECTIONS` | `5` |

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use directories::ProjectDirs;

const DEV_JWT_SECRET: &str = "madeh-dev-secret-change-in-production";

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub environment: Environment,

    /// Listen address
    pub bind_addr: SocketAddr,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Root directory of stored backups
    pub storage_dir: PathBuf,

    /// Secret key for signing session tokens
    pub jwt_secret: String,

    /// Session token lifetime in seconds
    pub session_lifetime_secs: i64,

    /// Products at or below this stock are reported on the dashboard
    pub low_stock_threshold: i64,

    pub db_max_connections: u32,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("MADEH_ENV").as_deref().map(str::trim) {
            None | Some("") | Some("development") | Some("dev") => Environment::Development,
            Some("production") | Some("prod") => Environment::Production,
            Some(_) => return Err(ConfigError::InvalidValue("MADEH_ENV".to_string())),
        };

        let data_dir = default_data_dir();

        let jwt_secret = match lookup("MADEH_JWT_SECRET").filter(|s| !s.trim().is_empty()) {
            Some(secret) => secret,
            None if environment == Environment::Development => DEV_JWT_SECRET.to_string(),
            None => return Err(ConfigError::MissingRequired("MADEH_JWT_SECRET".to_string())),
        };

        let config = ServerConfig {
            environment,

            bind_addr: parse_or(&lookup, "MADEH_BIND_ADDR", "0.0.0.0:8080")?,

            database_path: lookup("MADEH_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join("madeh.db")),

            storage_dir: lookup("MADEH_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join("backups")),

            jwt_secret,

            session_lifetime_secs: parse_or(&lookup, "MADEH_SESSION_LIFETIME_SECS", "28800")?,

            low_stock_threshold: parse_or(&lookup, "MADEH_LOW_STOCK_THRESHOLD", "5")?,

            db_max_connections: parse_or(&lookup, "MADEH_DB_MAX_CONNECTIONS", "5")?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.session_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue(
                "MADEH_SESSION_LIFETIME_SECS".to_string(),
            ));
        }
        if self.low_stock_threshold < 0 {
            return Err(ConfigError::InvalidValue("MADEH_LOW_STOCK_THRESHOLD".to_string()));
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("MADEH_DB_MAX_CONNECTIONS".to_string()));
        }
        Ok(())
    }

    /// Whether the built-in development secret is in use.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("ke", "Madeh", "Madeh Hardware")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./data"))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.bind_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.session_lifetime_secs, 28800);
        assert_eq!(config.low_stock_threshold, 5);
        assert_eq!(config.db_max_connections, 5);
        assert!(config.database_path.ends_with("madeh.db"));
        assert!(config.storage_dir.ends_with("backups"));
        assert!(config.uses_dev_secret());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("MADEH_BIND_ADDR", "127.0.0.1:9000"),
            ("MADEH_DB_PATH", "/var/lib/madeh/shop.db"),
            ("MADEH_JWT_SECRET", "s3cret"),
            ("MADEH_LOW_STOCK_THRESHOLD", "10"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.database_path, PathBuf::from("/var/lib/madeh/shop.db"));
        assert_eq!(config.low_stock_threshold, 10);
        assert!(!config.uses_dev_secret());
    }

    #[test]
    fn test_production_requires_secret() {
        let err = load(&[("MADEH_ENV", "production")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(ref key) if key == "MADEH_JWT_SECRET"));

        let config = load(&[("MADEH_ENV", "production"), ("MADEH_JWT_SECRET", "x")]).unwrap();
        assert_eq!(config.environment, Environment::Production);
    }

    #[test]
    fn test_invalid_values() {
        assert!(load(&[("MADEH_BIND_ADDR", "not-an-addr")]).is_err());
        assert!(load(&[("MADEH_SESSION_LIFETIME_SECS", "0")]).is_err());
        assert!(load(&[("MADEH_DB_MAX_CONNECTIONS", "zero")]).is_err());
        assert!(load(&[("MADEH_ENV", "staging")]).is_err());
    }
}
