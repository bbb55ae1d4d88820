//! Service configuration, read once from the environment at start-up.
// region:    --- Imports
use crate::listing::DEFAULT_MAX_AUCTION_HOURS;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

// endregion: --- Imports

pub const STORE_BACKEND_ENV: &str = "STORE_BACKEND";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const DATABASE_MAX_CONNECTIONS_ENV: &str = "DATABASE_MAX_CONNECTIONS";
pub const KAFKA_BROKERS_ENV: &str = "KAFKA_BROKERS";
pub const EVENTS_TOPIC_ENV: &str = "EVENTS_TOPIC";
pub const ADMIN_UID_ENV: &str = "ADMIN_UID";
pub const BIND_ADDR_ENV: &str = "BIND_ADDR";
pub const MAX_AUCTION_HOURS_ENV: &str = "MAX_AUCTION_HOURS";
pub const FEED_TICK_MS_ENV: &str = "FEED_TICK_MS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub kafka_brokers: String,
    pub events_topic: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backend: StoreBackend,
    /// Only present for the PostgreSQL backend.
    pub postgres: Option<PostgresConfig>,
    pub admin_uid: Option<String>,
    pub bind_addr: String,
    pub max_auction_hours: i64,
    pub feed_tick: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            vars.get(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let backend = match get(STORE_BACKEND_ENV) {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: STORE_BACKEND_ENV,
                value,
            })?,
            None => StoreBackend::Postgres,
        };

        let postgres = match backend {
            StoreBackend::Memory => None,
            StoreBackend::Postgres => Some(PostgresConfig {
                database_url: get(DATABASE_URL_ENV).ok_or(ConfigError::Missing(DATABASE_URL_ENV))?,
                max_connections: parse_or(&get, DATABASE_MAX_CONNECTIONS_ENV, 5)?,
                kafka_brokers: get(KAFKA_BROKERS_ENV)
                    .unwrap_or_else(|| "localhost:9092".to_string()),
                events_topic: get(EVENTS_TOPIC_ENV)
                    .unwrap_or_else(|| "auction-events".to_string()),
            }),
        };

        let max_auction_hours = parse_or(&get, MAX_AUCTION_HOURS_ENV, DEFAULT_MAX_AUCTION_HOURS)?;
        if max_auction_hours <= 0 || max_auction_hours > 24 * 365 {
            return Err(ConfigError::Invalid {
                name: MAX_AUCTION_HOURS_ENV,
                value: max_auction_hours.to_string(),
            });
        }

        let feed_tick_ms: u64 = parse_or(&get, FEED_TICK_MS_ENV, 1000)?;
        if feed_tick_ms == 0 {
            return Err(ConfigError::Invalid {
                name: FEED_TICK_MS_ENV,
                value: feed_tick_ms.to_string(),
            });
        }

        Ok(Config {
            backend,
            postgres,
            admin_uid: get(ADMIN_UID_ENV),
            bind_addr: get(BIND_ADDR_ENV).unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            max_auction_hours,
            feed_tick: Duration::from_millis(feed_tick_ms),
        })
    }

    pub fn auction_horizon(&self) -> chrono::Duration {
        chrono::Duration::hours(self.max_auction_hours)
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
