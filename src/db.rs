use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::DatabaseConfig;

pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let options = config
        .connect_options()
        .context("parse database connection options")?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
        .context("connect to database")?;
    tracing::info!(
        host = %config.host,
        database = %config.name,
        max_connections = config.max_connections,
        "database pool ready"
    );
    Ok(pool)
}

/// Applies the bundled `users` table definition. Failure is logged, not fatal.
pub async fn apply_schema(pool: &PgPool) {
    if let Err(e) = sqlx::migrate!("./migrations").run(pool).await {
        tracing::warn!(error = %e, "schema bootstrap failed; continuing");
    }
}
