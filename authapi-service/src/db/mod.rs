//! PostgreSQL pool setup and schema migrations.

use crate::config::DatabaseConfig;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, AppError> {
    tracing::info!(
        max_connections = config.max_connections,
        "Connecting to PostgreSQL"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.url)
        .await?;

    tracing::info!("Connected to PostgreSQL");
    Ok(pool)
}

/// Applies `migrations/*.sql`, embedded at compile time.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    tracing::info!("Running database migrations");
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires running PostgreSQL
    async fn pool_connects_and_migrates() {
        let config = DatabaseConfig {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/authapi_test".to_string()),
            max_connections: 2,
            min_connections: 1,
        };

        let pool = create_pool(&config).await.expect("connect");
        run_migrations(&pool).await.expect("migrate");
    }
}
