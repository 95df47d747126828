//! Runtime configuration.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults, then turned into a [`DbConfig`].

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::pool::DbConfig;

/// Default tracing filter when neither `STOCK_LOG_FILTER` nor `RUST_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "info,stock=debug,sqlx=warn";

/// Environment-driven settings for binaries embedding the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockConfig {
    /// SQLite database file (`STOCK_DB_PATH`)
    pub database_path: PathBuf,

    /// Pool size (`STOCK_DB_MAX_CONNECTIONS`)
    pub max_connections: u32,

    /// tracing-subscriber filter (`STOCK_LOG_FILTER`)
    pub log_filter: String,
}

impl StockConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let max_connections = env::var("STOCK_DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidValue("STOCK_DB_MAX_CONNECTIONS".to_string()))?;

        if max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "STOCK_DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        Ok(StockConfig {
            database_path: env::var("STOCK_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./stock.db")),
            max_connections,
            log_filter: env::var("STOCK_LOG_FILTER")
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string()),
        })
    }

    /// Pool configuration for these settings.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone()).max_connections(self.max_connections)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_config_from_settings() {
        let config = StockConfig {
            database_path: PathBuf::from("/tmp/stock-test.db"),
            max_connections: 3,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        };
        let db = config.db_config();
        assert_eq!(db.database_path, PathBuf::from("/tmp/stock-test.db"));
        assert_eq!(db.max_connections, 3);
    }
}
