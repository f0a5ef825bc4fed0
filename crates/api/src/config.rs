//! Environment-driven configuration.
//!
//! | variable                   | default          |
//! |----------------------------|------------------|
//! | `BIND_ADDR`                | `0.0.0.0:8080`   |
//! | `USE_PERSISTENT_STORES`    | `false`          |
//! | `DATABASE_URL`             | required when persistent |
//! | `DATABASE_MAX_CONNECTIONS` | `10`             |
//! | `REDIS_URL`                | unset (in-process bus) |
//! | `RESTOCK_CHANNEL`          | `catalog.restock` |
//! | `STOCK_UPDATE_ATTEMPTS`    | `3`              |

use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

use eshop_infra::services::items::DEFAULT_STOCK_UPDATE_ATTEMPTS;

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_RESTOCK_CHANNEL: &str = "catalog.restock";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}={value:?} is not valid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("DATABASE_URL must be set when USE_PERSISTENT_STORES=true")]
    MissingDatabaseUrl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub redis_url: Option<String>,
    pub restock_channel: String,
    pub stock_update_attempts: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            use_persistent_stores: false,
            database_url: None,
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
            redis_url: None,
            restock_channel: DEFAULT_RESTOCK_CHANNEL.to_string(),
            stock_update_attempts: DEFAULT_STOCK_UPDATE_ATTEMPTS,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source (the process env in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let defaults = Self::default();

        let config = Self {
            bind_addr: parse_or("BIND_ADDR", get("BIND_ADDR"), defaults.bind_addr)?,
            use_persistent_stores: parse_or(
                "USE_PERSISTENT_STORES",
                get("USE_PERSISTENT_STORES"),
                false,
            )?,
            database_url: get("DATABASE_URL"),
            database_max_connections: parse_or(
                "DATABASE_MAX_CONNECTIONS",
                get("DATABASE_MAX_CONNECTIONS"),
                DEFAULT_MAX_CONNECTIONS,
            )?,
            redis_url: get("REDIS_URL"),
            restock_channel: get("RESTOCK_CHANNEL").unwrap_or(defaults.restock_channel),
            stock_update_attempts: parse_or(
                "STOCK_UPDATE_ATTEMPTS",
                get("STOCK_UPDATE_ATTEMPTS"),
                DEFAULT_STOCK_UPDATE_ATTEMPTS,
            )?,
        };

        if config.use_persistent_stores && config.database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        if config.stock_update_attempts == 0 {
            return Err(ConfigError::Invalid {
                var: "STOCK_UPDATE_ATTEMPTS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(config)
    }
}

fn parse_or<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => {
            let parsed = value.trim().parse::<T>();
            parsed.map_err(|e| ConfigError::Invalid {
                var,
                reason: e.to_string(),
                value,
            })
        }
    }
}
