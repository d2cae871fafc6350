//! Pool settings and connection setup.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::AppError;

/// Database pool configuration.
#[derive(Debug, Clone)]
#[must_use]
pub struct DbConfig {
    pub url: String,
    pub pool_min: u32,
    pub pool_max: u32,
    /// Upper bound for acquiring a pooled connection.
    pub connect_timeout: Duration,
}

impl DbConfig {
    pub const DEFAULT_POOL_MIN: u32 = 1;
    pub const DEFAULT_POOL_MAX: u32 = 10;
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Configuration for `url` with default pool settings.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            pool_min: Self::DEFAULT_POOL_MIN,
            pool_max: Self::DEFAULT_POOL_MAX,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Connection URL with the password masked, for logs.
    #[must_use]
    pub fn redacted_url(&self) -> String {
        let Some((scheme, rest)) = self.url.split_once("://") else {
            return self.url.clone();
        };
        let Some((credentials, host)) = rest.rsplit_once('@') else {
            return self.url.clone();
        };
        match credentials.split_once(':') {
            Some((user, _)) => format!("{scheme}://{user}:***@{host}"),
            None => self.url.clone(),
        }
    }
}

/// Create the shared connection pool.
///
/// Every repository call borrows one connection for the duration of a single
/// statement; the pool bounds concurrency at `pool_max`.
pub async fn create_pool(config: &DbConfig) -> Result<PgPool, AppError> {
    info!(
        url = %config.redacted_url(),
        pool_min = config.pool_min,
        pool_max = config.pool_max,
        "Connecting to database"
    );

    PgPoolOptions::new()
        .min_connections(config.pool_min)
        .max_connections(config.pool_max)
        .acquire_timeout(config.connect_timeout)
        .connect(&config.url)
        .await
        .map_err(|e| AppError::Unavailable(format!("Database connection failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_url_uses_defaults() {
        let config = DbConfig::from_url("postgres://localhost/library");
        assert_eq!(config.pool_min, DbConfig::DEFAULT_POOL_MIN);
        assert_eq!(config.pool_max, DbConfig::DEFAULT_POOL_MAX);
        assert_eq!(config.connect_timeout, DbConfig::DEFAULT_CONNECT_TIMEOUT);
    }

    #[test]
    fn redacted_url_masks_password() {
        let config = DbConfig::from_url("postgres://books:s3cret@db:5432/library");
        let redacted = config.redacted_url();
        assert!(!redacted.contains("s3cret"));
        assert_eq!(redacted, "postgres://books:***@db:5432/library");
    }

    #[test]
    fn redacted_url_without_credentials_is_unchanged() {
        let config = DbConfig::from_url("postgres://localhost/library");
        assert_eq!(config.redacted_url(), "postgres://localhost/library");
    }
}
