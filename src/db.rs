use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::AppConfig;

/// Open the pool and bring the schema up to date.
pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let db = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")?;
    tracing::info!("database connection established");

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("run database migrations")?;
    tracing::info!("database migrations applied");

    Ok(db)
}
