pub mod migrate;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

use crate::config::Config;

/// Opens the pool; the database file is created when missing.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    // Connections are kept for the life of the pool so an in-memory
    // database is not dropped between requests.
    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

/// Connects and brings the schema up to date. Any failure here must stop
/// startup before the listener is bound.
pub async fn init_db(config: &Config) -> Result<SqlitePool> {
    let pool = connect(&config.database_url, config.db_max_connections)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;

    migrate::run_pending_migrations(&pool).await?;

    Ok(pool)
}
