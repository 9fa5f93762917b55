//! In-memory tracking stores that record every call.

use std::collections::HashSet;
use std::sync::RwLock;

use chrono::Utc;
use futures::future::BoxFuture;

use crate::error::{Result, TrellisError};
use crate::store::{FixtureRecord, FixtureStore, MigrationRecord, MigrationStore};

/// In-memory [`MigrationStore`].
///
/// Content is "applied" by appending it to an execution log. Names passed to
/// [`MockMigrationStore::fail_on`] are rejected without recording anything.
#[derive(Default)]
pub struct MockMigrationStore {
    installed: RwLock<bool>,
    records: RwLock<Vec<MigrationRecord>>,
    executed: RwLock<Vec<String>>,
    lookups: RwLock<Vec<String>>,
    failing: RwLock<HashSet<String>>,
    install_error: RwLock<Option<String>>,
}

impl MockMigrationStore {
    /// A store with no tracking table.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose tracking table already exists.
    pub fn installed() -> Self {
        let store = Self::default();
        *store.installed.write().unwrap() = true;
        store
    }

    /// Make `execute` fail for the given change-set name.
    pub fn fail_on(&self, name: &str) {
        self.failing.write().unwrap().insert(name.to_string());
    }

    /// Make `install_manager` fail with the given message.
    pub fn fail_install(&self, message: &str) {
        *self.install_error.write().unwrap() = Some(message.to_string());
    }

    /// Names of recorded change-sets, in insertion order.
    pub fn applied_names(&self) -> Vec<String> {
        self.records
            .read()
            .unwrap()
            .iter()
            .map(|r| r.name.clone())
            .collect()
    }

    /// Names passed to `execute` that succeeded, in call order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.read().unwrap().clone()
    }

    /// Names passed to `fetch_by_name`, in call order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.read().unwrap().clone()
    }

    pub fn is_installed(&self) -> bool {
        *self.installed.read().unwrap()
    }
}

impl MigrationStore for MockMigrationStore {
    fn has_manager(&self) -> BoxFuture<'_, Result<bool>> {
        Box::pin(async move { Ok(self.is_installed()) })
    }

    fn install_manager(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            if let Some(message) = self.install_error.read().unwrap().clone() {
                return Err(TrellisError::Database(message));
            }
            *self.installed.write().unwrap() = true;
            Ok(())
        })
    }

    fn fetch_by_name<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<MigrationRecord>>> {
        Box::pin(async move {
            self.lookups.write().unwrap().push(name.to_string());
            Ok(self
                .records
                .read()
                .unwrap()
                .iter()
                .find(|r| r.name == name)
                .cloned())
        })
    }

    fn execute<'a>(
        &'a self,
        record: &'a MigrationRecord,
        _content: &'a str,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            if self.failing.read().unwrap().contains(&record.name) {
                return Err(TrellisError::Migration {
                    name: record.name.clone(),
                    message: "syntax error".to_string(),
                });
            }

            let mut records = self.records.write().unwrap();
            if records.iter().any(|r| r.name == record.name) {
                return Err(TrellisError::Database(format!(
                    "duplicate migration record '{}'",
                    record.name
                )));
            }
            records.push(MigrationRecord {
                name: record.name.clone(),
                applied_at: Some(Utc::now()),
            });
            self.executed.write().unwrap().push(record.name.clone());
            Ok(())
        })
    }
}

/// In-memory [`FixtureStore`].
#[derive(Default)]
pub struct MockFixtureStore {
    records: RwLock<Vec<FixtureRecord>>,
    list_calls: RwLock<usize>,
}

impl MockFixtureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store where the given fixtures are already applied.
    pub fn with_applied(names: &[&str]) -> Self {
        let store = Self::default();
        store
            .records
            .write()
            .unwrap()
            .extend(names.iter().map(|n| FixtureRecord::new(*n)));
        store
    }

    /// Names of recorded fixtures, in insertion order.
    pub fn applied_names(&self) -> Vec<String> {
        self.records
            .read()
            .unwrap()
            .iter()
            .map(|r| r.name.clone())
            .collect()
    }

    /// Number of times `list` was called.
    pub fn list_calls(&self) -> usize {
        *self.list_calls.read().unwrap()
    }
}

impl FixtureStore for MockFixtureStore {
    fn list(&self) -> BoxFuture<'_, Result<Vec<FixtureRecord>>> {
        Box::pin(async move {
            *self.list_calls.write().unwrap() += 1;
            Ok(self.records.read().unwrap().clone())
        })
    }

    fn add<'a>(&'a self, record: &'a FixtureRecord) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut records = self.records.write().unwrap();
            if records.iter().any(|r| r.name == record.name) {
                return Err(TrellisError::Database(format!(
                    "duplicate fixture record '{}'",
                    record.name
                )));
            }
            records.push(FixtureRecord {
                name: record.name.clone(),
                applied_at: Some(Utc::now()),
            });
            Ok(())
        })
    }
}
