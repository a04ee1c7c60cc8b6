//! PostgreSQL pool and schema setup for the content repository

use std::time::Duration;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tracing::info;
use crate::config::DatabaseConfig;
use crate::utils::errors::Result;

pub type DatabasePool = Pool<Postgres>;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Open the pool and make sure the server answers
pub async fn create_pool(config: &DatabaseConfig) -> Result<DatabasePool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
        .idle_timeout(Some(Duration::from_secs(600)))
        .test_before_acquire(true)
        .connect(&config.url)
        .await?;

    health_check(&pool).await?;

    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Storage database pool ready"
    );
    Ok(pool)
}

/// Create or upgrade the storage tables
pub async fn run_migrations(pool: &DatabasePool) -> Result<()> {
    info!(known = MIGRATOR.iter().count(), "Applying storage migrations");
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Round-trip a trivial query
pub async fn health_check(pool: &DatabasePool) -> Result<()> {
    let _: i32 = sqlx::query_scalar("SELECT 1").fetch_one(pool).await?;
    Ok(())
}
