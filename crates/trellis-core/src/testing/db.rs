//! Explicit database provisioning for tests.
//!
//! Only `TEST_DATABASE_URL` is consulted. `DATABASE_URL` is never read, so a
//! developer's `.env` can not point tests at a real application database.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::error::{Result, TrellisError};

/// Environment variable naming the test server.
pub const TEST_DATABASE_URL: &str = "TEST_DATABASE_URL";

/// Connection to the test database server.
pub struct TestDatabase {
    pool: PgPool,
    url: String,
}

impl TestDatabase {
    /// Connect to the database at the given URL.
    pub async fn from_url(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect(url)
            .await?;

        Ok(Self {
            pool,
            url: url.to_string(),
        })
    }

    /// Connect using `TEST_DATABASE_URL`, or `None` when it is not set.
    ///
    /// Database-backed tests return early on `None`.
    pub async fn from_env() -> Result<Option<Self>> {
        match std::env::var(TEST_DATABASE_URL) {
            Ok(url) if !url.trim().is_empty() => Self::from_url(&url).await.map(Some),
            _ => Ok(None),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Create a dedicated database for one test.
    pub async fn isolated(&self, test_name: &str) -> Result<IsolatedTestDb> {
        // Postgres truncates identifiers past 63 bytes
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let db_name = format!(
            "trellis_test_{}_{}",
            sanitize_db_name(test_name),
            &suffix[..12]
        );

        sqlx::query(&format!("CREATE DATABASE \"{}\"", db_name))
            .execute(&self.pool)
            .await?;

        let url = replace_db_name(&self.url, &db_name);
        let pool = PgPoolOptions::new()
            .max_connections(4)
            .connect(&url)
            .await
            .map_err(|e| {
                TrellisError::Database(format!("Failed to connect to {}: {}", db_name, e))
            })?;

        Ok(IsolatedTestDb {
            pool,
            url,
            db_name,
            admin: self.pool.clone(),
        })
    }
}

/// A database that lives for a single test.
pub struct IsolatedTestDb {
    pool: PgPool,
    url: String,
    db_name: String,
    admin: PgPool,
}

impl IsolatedTestDb {
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Connection URL of this database, for opening extra pools.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    /// Run raw SQL to set up schema or data.
    pub async fn execute(&self, sql: &str) -> Result<()> {
        sqlx::raw_sql(sql).execute(&self.pool).await?;
        Ok(())
    }

    /// Drop the database.
    pub async fn cleanup(self) -> Result<()> {
        self.pool.close().await;

        sqlx::query(&format!(
            "DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)",
            self.db_name
        ))
        .execute(&self.admin)
        .await?;

        Ok(())
    }
}

fn sanitize_db_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(24)
        .collect()
}

/// Swap the database component of a connection URL, keeping any query string.
fn replace_db_name(url: &str, new_db: &str) -> String {
    let (base, query) = match url.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (url, None),
    };

    let base = match base.rsplit_once('/') {
        Some((prefix, _)) if prefix.contains("://") && !prefix.ends_with('/') => {
            format!("{}/{}", prefix, new_db)
        }
        _ => format!("{}/{}", base.trim_end_matches('/'), new_db),
    };

    match query {
        Some(query) => format!("{}?{}", base, query),
        None => base,
    }
}
