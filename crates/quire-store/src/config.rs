//! Store configuration resolved from the environment.

use quire_core::{Error, Result};

use crate::pool::PoolConfig;

/// Configuration for the PostgreSQL-backed store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Connection URL for the backing database.
    pub database_url: String,
    /// Connection pool settings.
    pub pool: PoolConfig,
}

impl StoreConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `DATABASE_URL` | (required) | PostgreSQL connection URL |
    /// | `QUIRE_DB_MAX_CONNECTIONS` | `10` | Max pool connections |
    /// | `QUIRE_DB_MIN_CONNECTIONS` | `1` | Min pool connections |
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| Error::Config("DATABASE_URL is not set".to_string()))?;

        let mut pool = PoolConfig::default();
        if let Some(max) = env_u32("QUIRE_DB_MAX_CONNECTIONS") {
            pool = pool.max_connections(max.max(1));
        }
        if let Some(min) = env_u32("QUIRE_DB_MIN_CONNECTIONS") {
            pool = pool.min_connections(min);
        }

        Ok(Self { database_url, pool })
    }

    /// Config for an explicit URL with default pool settings.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            pool: PoolConfig::default(),
        }
    }
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok().and_then(|v| v.parse::<u32>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_url_uses_default_pool() {
        let config = StoreConfig::with_url("postgres://localhost/quire_test");
        assert_eq!(config.database_url, "postgres://localhost/quire_test");
        assert_eq!(config.pool.max_connections, 10);
    }

    #[test]
    fn test_env_u32_rejects_garbage() {
        std::env::set_var("QUIRE_TEST_BOGUS_U32", "not-a-number");
        assert_eq!(env_u32("QUIRE_TEST_BOGUS_U32"), None);
        std::env::remove_var("QUIRE_TEST_BOGUS_U32");
    }
}
