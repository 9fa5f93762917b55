use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::debug;

use trellis_core::config::DatabaseConfig;
use trellis_core::error::{Result, TrellisError};

/// Database connection wrapper providing connection pooling.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect using the configuration, or `None` when no URL is configured.
    pub async fn from_config(config: &DatabaseConfig) -> Result<Option<Self>> {
        let Some(url) = config.connection_url() else {
            debug!("No database URL configured");
            return Ok(None);
        };

        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(config.pool_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| TrellisError::Database(format!("Failed to connect: {}", e)))?;

        Ok(Some(Self { pool }))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close all connections gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
