// src/config.rs
use std::{env, fmt::Display, net::IpAddr, str::FromStr};

use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{key} must be set")]
    Missing { key: &'static str },

    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreKind::Postgres),
            "memory" => Ok(StoreKind::Memory),
            other => Err(format!("unknown store {other:?}, expected postgres or memory")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: IpAddr,
    pub port: u16,
    pub store: StoreKind,
    /// Required when `store` is [`StoreKind::Postgres`].
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store: StoreKind = try_load(&lookup, "POLLS_STORE", "postgres")?;
        let database_url = lookup("DATABASE_URL");

        if store == StoreKind::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing { key: "DATABASE_URL" });
        }

        Ok(Self {
            bind_address: try_load(&lookup, "BIND_ADDRESS", "0.0.0.0")?,
            port: try_load(&lookup, "PORT", "3030")?,
            store,
            database_url,
            max_connections: try_load(&lookup, "DATABASE_MAX_CONNECTIONS", "5")?,
        })
    }
}

fn try_load<F, T>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}
