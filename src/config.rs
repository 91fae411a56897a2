//! Service configuration, read from the environment (and `.env` via dotenvy).

use std::env;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::pricing::MinimumRatePolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
    /// Only required for [`StorageBackend::Postgres`].
    pub database_url: Option<String>,
    pub db_pool_size: u32,
    pub minimum_rate_policy: MinimumRatePolicy,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

fn parse_var<T: FromStr>(name: &str, default: &str) -> Result<T, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name.to_string()))
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("PORT", "8080")?,
            storage: parse_var("STORAGE", "postgres")?,
            database_url: env::var("DATABASE_URL").ok(),
            db_pool_size: parse_var("DB_POOL_SIZE", "10")?,
            minimum_rate_policy: parse_var("MINIMUM_RATE_POLICY", "informational")?,
        };

        if config.storage == StorageBackend::Postgres && config.database_url.is_none() {
            return Err(ConfigError::MissingRequired("DATABASE_URL".to_string()));
        }
        if config.db_pool_size == 0 {
            return Err(ConfigError::InvalidValue("DB_POOL_SIZE".to_string()));
        }

        Ok(config)
    }
}
