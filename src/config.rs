use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_path: PathBuf,

    // Web server
    pub web_host: String,
    pub web_port: u16,

    // Store tuning
    pub db_max_connections: u32,
    pub db_busy_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable holds an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_path: PathBuf::from(env_or_default("DATABASE_PATH", "./data/forum.sqlite")),
            web_host: env_or_default("WEB_HOST", "0.0.0.0"),
            web_port: parse_env_u16("WEB_PORT", 8080)?,
            db_max_connections: parse_env_u32("DB_MAX_CONNECTIONS", 5)?,
            db_busy_timeout_secs: parse_env_u64("DB_BUSY_TIMEOUT_SECS", 10)?,
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                name: "DB_MAX_CONNECTIONS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "DATABASE_PATH".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u32(name: &str, default: u32) -> Result<u32, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_defaults() {
        std::env::remove_var("DATABASE_PATH");
        std::env::remove_var("WEB_PORT");
        let config = Config::from_env().unwrap();
        assert_eq!(config.web_port, 8080);
        assert_eq!(config.db_max_connections, 5);
        config.validate().unwrap();
    }

    #[test]
    #[serial]
    fn test_invalid_port() {
        std::env::set_var("WEB_PORT", "not-a-port");
        let result = Config::from_env();
        std::env::remove_var("WEB_PORT");
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_connections_rejected() {
        let config = Config {
            database_path: PathBuf::from("./data/forum.sqlite"),
            web_host: "127.0.0.1".to_string(),
            web_port: 8080,
            db_max_connections: 0,
            db_busy_timeout_secs: 10,
        };
        assert!(config.validate().is_err());
    }
}
