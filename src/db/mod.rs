pub mod departments;
#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod reference;
pub mod store;

use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::errors::AppError;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub async fn create_pool(config: &AppConfig) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    MIGRATOR
        .run(&pool)
        .await
        .map_err(|err| AppError::DatabaseError(err.to_string()))?;

    Ok(pool)
}
