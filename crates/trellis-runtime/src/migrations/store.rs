//! PostgreSQL-backed migration log.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use sqlx::{Executor, PgPool, Row};
use tracing::debug;

use trellis_core::error::{Result, TrellisError};
use trellis_core::store::{MigrationRecord, MigrationStore};

use crate::db::checked_identifier;

/// Default name of the migration log table.
pub const DEFAULT_MIGRATIONS_TABLE: &str = "trellis_migrations";

/// Migration log stored in a PostgreSQL table.
#[derive(Clone)]
pub struct PgMigrationStore {
    pool: PgPool,
    table: String,
}

impl PgMigrationStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            table: DEFAULT_MIGRATIONS_TABLE.to_string(),
        }
    }

    /// Use a custom log table name.
    pub fn with_table(pool: PgPool, table: &str) -> Result<Self> {
        Ok(Self {
            pool,
            table: checked_identifier(table)?.to_string(),
        })
    }

    async fn has_manager_inner(&self) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
            .bind(&self.table)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn install_manager_inner(&self) -> Result<()> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR(255) UNIQUE NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            self.table
        ))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            TrellisError::Database(format!("Failed to create {} table: {}", self.table, e))
        })?;
        Ok(())
    }

    async fn fetch_by_name_inner(&self, name: &str) -> Result<Option<MigrationRecord>> {
        let row = sqlx::query(&format!(
            "SELECT name, applied_at FROM {} WHERE name = $1",
            self.table
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> Result<MigrationRecord> {
            Ok(MigrationRecord {
                name: row.try_get("name")?,
                applied_at: Some(row.try_get::<DateTime<Utc>, _>("applied_at")?),
            })
        })
        .transpose()
    }

    async fn execute_inner(&self, record: &MigrationRecord, content: &str) -> Result<()> {
        let failed = |message: String| TrellisError::Migration {
            name: record.name.clone(),
            message,
        };

        // Dropping the transaction on an early return rolls everything back
        let mut tx = self.pool.begin().await?;

        debug!("{}: executing change-set", record.name);
        (&mut *tx)
            .execute(sqlx::raw_sql(content))
            .await
            .map_err(|e| failed(e.to_string()))?;

        sqlx::query(&format!("INSERT INTO {} (name) VALUES ($1)", self.table))
            .bind(&record.name)
            .execute(&mut *tx)
            .await
            .map_err(|e| failed(format!("failed to record: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| failed(format!("commit failed: {}", e)))?;
        Ok(())
    }
}

impl MigrationStore for PgMigrationStore {
    fn has_manager(&self) -> BoxFuture<'_, Result<bool>> {
        Box::pin(self.has_manager_inner())
    }

    fn install_manager(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(self.install_manager_inner())
    }

    fn fetch_by_name<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<MigrationRecord>>> {
        Box::pin(self.fetch_by_name_inner(name))
    }

    fn execute<'a>(
        &'a self,
        record: &'a MigrationRecord,
        content: &'a str,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.execute_inner(record, content))
    }
}
