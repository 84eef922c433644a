use std::{net::SocketAddr, time::Duration};

use crate::{error::AppError, repositories::postgres::DatabaseSettings};

const DEFAULT_HTTP_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 3000);
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 2;

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseSettings,
    pub http_addr: SocketAddr,
    pub store_deadline: Duration,
    pub cors_allowed_origin: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let url = std::env::var("DATABASE_URL")
            .map_err(|err| AppError::Internal(format!("DATABASE_URL missing: {}", err)))?;
        let max_connections = read_env::<u32>("DATABASE_MAX_CONNECTIONS").unwrap_or(20);
        let min_connections = read_env::<u32>("DATABASE_MIN_CONNECTIONS").unwrap_or(5);
        let acquire_timeout_secs = read_env::<u64>("DATABASE_ACQUIRE_TIMEOUT_SECS").unwrap_or(15);

        let http_addr = match std::env::var("HTTP_ADDR") {
            Ok(raw) => raw
                .parse::<SocketAddr>()
                .map_err(|err| AppError::Internal(format!("HTTP_ADDR invalid: {}", err)))?,
            Err(_) => SocketAddr::from(DEFAULT_HTTP_ADDR),
        };

        let store_timeout_secs =
            read_env::<u64>("STORE_TIMEOUT_SECS").unwrap_or(DEFAULT_STORE_TIMEOUT_SECS);
        let cors_allowed_origin =
            std::env::var("CORS_ALLOWED_ORIGIN").unwrap_or_else(|_| "*".to_string());

        Ok(Self {
            database: DatabaseSettings {
                url,
                max_connections,
                min_connections,
                acquire_timeout: Duration::from_secs(acquire_timeout_secs),
            },
            http_addr,
            store_deadline: Duration::from_secs(store_timeout_secs),
            cors_allowed_origin,
        })
    }
}

fn read_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<T>().ok())
}
