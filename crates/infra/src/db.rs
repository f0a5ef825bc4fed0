//! Database wiring: connection pool and embedded migrations.
//!
//! Migrations live in `migrations/postgres/` at the workspace root and are
//! compiled into the binary with `sqlx::migrate!`. Add new files with the next
//! sequence number; never edit an applied one.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations/postgres");

/// Open a Postgres pool.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Run all pending migrations (idempotent).
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    info!(total = MIGRATOR.migrations.len(), "checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("all migrations applied");
    Ok(())
}
