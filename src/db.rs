use redis::aio::ConnectionManager;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Type alias for the PostgreSQL connection pool
pub type DbPool = PgPool;

/// Creates and configures a PostgreSQL connection pool
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    tracing::debug!("Creating database connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await?;

    tracing::info!("Database connection pool created successfully");
    Ok(pool)
}

/// Connects to Redis and returns a multiplexed connection manager
///
/// The manager reconnects transparently; individual commands still fail
/// while the connection is down, which the auth core treats as fail-closed
/// on verification and best-effort on logout.
pub async fn create_redis(redis_url: &str) -> Result<ConnectionManager, redis::RedisError> {
    tracing::debug!("Connecting to Redis");

    let client = redis::Client::open(redis_url)?;
    let manager = ConnectionManager::new(client).await?;

    tracing::info!("Redis connection established");
    Ok(manager)
}
