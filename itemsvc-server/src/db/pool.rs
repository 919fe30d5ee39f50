//! Database connection pool management
//!
//! Uses sqlx PgPool with explicit connection limits.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

/// Default maximum connections for the pool.
/// Matches the node-postgres default the service was first deployed with.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Default time to wait for a free connection before failing the request.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything needed to open the pool.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub connect: PgConnectOptions,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl PoolSettings {
    pub fn new(connect: PgConnectOptions) -> Self {
        Self {
            connect,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
    }
}

/// Create a PostgreSQL connection pool, connecting eagerly.
///
/// # Errors
///
/// Returns an error if the first connection cannot be established.
///
/// # Example
///
/// ```ignore
/// let settings = PoolSettings::new(PgConnectOptions::new());
/// let pool = create_pool(&settings).await?;
/// ```
pub async fn create_pool(settings: &PoolSettings) -> Result<PgPool, sqlx::Error> {
    let pool = settings
        .pool_options()
        .connect_with(settings.connect.clone())
        .await?;

    tracing::info!(
        host = settings.connect.get_host(),
        port = settings.connect.get_port(),
        max_connections = settings.max_connections,
        "Database pool ready"
    );
    Ok(pool)
}

/// Create a pool that opens connections on first use.
pub fn create_lazy_pool(settings: &PoolSettings) -> PgPool {
    settings.pool_options().connect_lazy_with(settings.connect.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_defaults() {
        let settings = PoolSettings::new(PgConnectOptions::new());
        assert_eq!(settings.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(settings.acquire_timeout, DEFAULT_ACQUIRE_TIMEOUT);
    }

    #[test]
    fn settings_builders_override_defaults() {
        let settings = PoolSettings::new(PgConnectOptions::new())
            .max_connections(2)
            .acquire_timeout(Duration::from_millis(250));
        assert_eq!(settings.max_connections, 2);
        assert_eq!(settings.acquire_timeout, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn lazy_pool_starts_empty() {
        let settings = PoolSettings::new(PgConnectOptions::new().host("127.0.0.1").port(1));
        let pool = create_lazy_pool(&settings);
        assert_eq!(pool.size(), 0);
    }

    // Integration tests require a real database
    // Run with: DATABASE_URL=postgres://... cargo test -p itemsvc-server -- --ignored

    #[tokio::test]
    #[ignore = "requires database"]
    async fn pool_acquires_connection() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let connect: PgConnectOptions = url.parse().expect("invalid DATABASE_URL");
        let pool = create_pool(&PoolSettings::new(connect))
            .await
            .expect("pool creation failed");

        let result: (i32,) = sqlx::query_as("SELECT 1")
            .fetch_one(&pool)
            .await
            .expect("query failed");

        assert_eq!(result.0, 1);
    }
}
