//! PostgreSQL-backed fixture log.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use sqlx::{PgPool, Row};

use trellis_core::error::Result;
use trellis_core::store::{FixtureRecord, FixtureStore};

/// Fixture log table, created by the built-in `trellis/0001_fixtures.sql`.
pub const FIXTURES_TABLE: &str = "trellis_fixtures";

/// Fixture log stored in PostgreSQL.
#[derive(Clone)]
pub struct PgFixtureStore {
    pool: PgPool,
}

impl PgFixtureStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn list_inner(&self) -> Result<Vec<FixtureRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT name, applied_at FROM {} ORDER BY id ASC",
            FIXTURES_TABLE
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(FixtureRecord {
                name: row.try_get("name")?,
                applied_at: Some(row.try_get::<DateTime<Utc>, _>("applied_at")?),
            });
        }
        Ok(records)
    }

    async fn add_inner(&self, record: &FixtureRecord) -> Result<()> {
        sqlx::query(&format!("INSERT INTO {} (name) VALUES ($1)", FIXTURES_TABLE))
            .bind(&record.name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

impl FixtureStore for PgFixtureStore {
    fn list(&self) -> BoxFuture<'_, Result<Vec<FixtureRecord>>> {
        Box::pin(self.list_inner())
    }

    fn add<'a>(&'a self, record: &'a FixtureRecord) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.add_inner(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::testing::TestDatabase;

    #[tokio::test]
    async fn test_add_and_list() {
        let Some(server) = TestDatabase::from_env().await.unwrap() else {
            return;
        };
        let db = server.isolated("fixture_store").await.unwrap();
        db.execute(include_str!("../../sql/0001_fixtures.sql"))
            .await
            .unwrap();

        let store = PgFixtureStore::new(db.pool().clone());
        assert!(store.list().await.unwrap().is_empty());

        store.add(&FixtureRecord::new("blog.posts")).await.unwrap();
        store.add(&FixtureRecord::new("auth.admin")).await.unwrap();
        assert!(store.add(&FixtureRecord::new("blog.posts")).await.is_err());

        let names: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["blog.posts", "auth.admin"]);

        db.cleanup().await.unwrap();
    }
}
