// src/db.rs
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tracing::info;

use crate::config::{Config, ConfigError};
use crate::error::ServerError;

pub async fn create_pool(config: &Config) -> Result<Pool<Postgres>, ServerError> {
    let database_url = config
        .database_url
        .as_deref()
        .ok_or(ConfigError::Missing { key: "DATABASE_URL" })?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(database_url)
        .await?;

    info!("Running migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
