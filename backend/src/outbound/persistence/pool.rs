//! Pooled async PostgreSQL connections.
//!
//! `bb8` manages the connections and `diesel-async` drives them, so checkout
//! and queries never block the runtime.

use std::time::Duration;

use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::{debug, info};

const DEFAULT_MAX_SIZE: u32 = 10;
const DEFAULT_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// No usable connection within the checkout timeout.
    #[error("database connection unavailable: {message}")]
    Checkout { message: String },

    #[error("failed to build connection pool: {message}")]
    Build { message: String },
}

impl PoolError {
    pub fn checkout(message: impl Into<String>) -> Self {
        Self::Checkout {
            message: message.into(),
        }
    }

    pub fn build(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
        }
    }
}

/// Where to connect and how many connections to hold.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    database_url: String,
    max_size: u32,
    checkout_timeout: Duration,
}

impl PoolConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: DEFAULT_MAX_SIZE,
            checkout_timeout: DEFAULT_CHECKOUT_TIMEOUT,
        }
    }

    /// Zero is raised to one.
    #[must_use]
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size.max(1);
        self
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn max_size(&self) -> u32 {
        self.max_size
    }

    /// A quarter of the pool stays warm, never fewer than one connection.
    fn min_idle(&self) -> u32 {
        (self.max_size / 4).max(1)
    }
}

/// Shared handle to the connection pool.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Build the pool and confirm the database answers.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Build`] when the URL is unusable or the warm
    /// connections cannot be opened, and [`PoolError::Checkout`] when the
    /// database does not answer the ping.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let min_idle = config.min_idle();
        let PoolConfig {
            database_url,
            max_size,
            checkout_timeout,
        } = config;
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let inner = Pool::builder()
            .max_size(max_size)
            .min_idle(Some(min_idle))
            .connection_timeout(checkout_timeout)
            .build(manager)
            .await
            .map_err(|err| PoolError::build(err.to_string()))?;
        let pool = Self { inner };
        pool.ping().await?;
        info!(max_size, min_idle, "database pool ready");
        Ok(pool)
    }

    /// Check out a connection.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Checkout`] when the checkout timeout elapses.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))
    }

    /// Round-trip a trivial query.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Checkout`] when no connection is available or the
    /// query fails.
    pub async fn ping(&self) -> Result<(), PoolError> {
        let mut conn = self.get().await?;
        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))?;
        debug!("database answered ping");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_suit_a_single_service_instance() {
        let config = PoolConfig::new("postgres://localhost/bloodlink");

        assert_eq!(config.database_url(), "postgres://localhost/bloodlink");
        assert_eq!(config.max_size(), 10);
        assert_eq!(config.min_idle(), 2);
        assert_eq!(config.checkout_timeout, Duration::from_secs(30));
    }

    #[rstest]
    #[case(0, 1, 1)]
    #[case(3, 3, 1)]
    #[case(40, 40, 10)]
    fn warm_connections_follow_pool_size(
        #[case] requested: u32,
        #[case] max_size: u32,
        #[case] min_idle: u32,
    ) {
        let config = PoolConfig::new("postgres://localhost/bloodlink").with_max_size(requested);

        assert_eq!(config.max_size(), max_size);
        assert_eq!(config.min_idle(), min_idle);
    }

    #[rstest]
    fn checkout_errors_name_the_cause() {
        let error = PoolError::checkout("timed out waiting for connection");
        assert_eq!(
            error.to_string(),
            "database connection unavailable: timed out waiting for connection"
        );
    }
}
