use std::env;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} has an invalid value: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Where records are persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageConfig {
    Postgres {
        /// PostgreSQL connection URL. The server needs the PostGIS extension.
        database_url: String,
        max_connections: u32,
        min_connections: u32,
    },
    /// Process-local storage, lost on shutdown.
    Memory,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Server host to bind to.
    pub host: String,
    /// Server port to bind to.
    pub port: u16,
    pub storage: StorageConfig,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage = match lookup("STORAGE_BACKEND").as_deref().unwrap_or("postgres") {
            "postgres" => StorageConfig::Postgres {
                database_url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
                max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 20)?,
                min_connections: parse_or(&lookup, "DB_MIN_CONNECTIONS", 1)?,
            },
            "memory" => StorageConfig::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    var: "STORAGE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 3000)?,
            storage,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Build the socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn postgres_is_the_default_backend() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/apiary")]).unwrap();
        assert_eq!(
            config.storage,
            StorageConfig::Postgres {
                database_url: "postgres://localhost/apiary".into(),
                max_connections: 20,
                min_connections: 1,
            }
        );
        assert_eq!(config.addr(), "0.0.0.0:3000");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn postgres_requires_database_url() {
        assert_eq!(load(&[]), Err(ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn memory_backend_needs_no_url() {
        let config = load(&[("STORAGE_BACKEND", "memory"), ("PORT", "8080")]).unwrap();
        assert_eq!(config.storage, StorageConfig::Memory);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn malformed_values_are_reported() {
        assert_eq!(
            load(&[("STORAGE_BACKEND", "memory"), ("PORT", "http")]),
            Err(ConfigError::Invalid {
                var: "PORT",
                value: "http".into()
            })
        );
        assert!(matches!(
            load(&[("STORAGE_BACKEND", "mongo")]),
            Err(ConfigError::Invalid {
                var: "STORAGE_BACKEND",
                ..
            })
        ));
    }
}
