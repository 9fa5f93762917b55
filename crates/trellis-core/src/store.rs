//! Tracking-store records and the traits orchestration code runs against.

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;

use crate::error::Result;

/// A change-set that has been (or is about to be) applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRecord {
    /// Qualified name, `<module>/<filename>`.
    pub name: String,
    /// Set by the store at insertion time.
    pub applied_at: Option<DateTime<Utc>>,
}

impl MigrationRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            applied_at: None,
        }
    }
}

/// A single change-set read from a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    /// Qualified name, `<module>/<filename>`.
    pub name: String,
    /// Raw statement text; may be blank.
    pub content: String,
}

impl ChangeSet {
    pub fn new(module: &str, filename: &str, content: impl Into<String>) -> Self {
        Self {
            name: format!("{}/{}", module, filename),
            content: content.into(),
        }
    }

    /// Whether the content is blank after trimming.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// The record to insert once this change-set is applied.
    pub fn record(&self) -> MigrationRecord {
        MigrationRecord::new(self.name.clone())
    }
}

/// A fixture that has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureRecord {
    /// Namespaced name, `<namespace>.<identifier>`.
    pub name: String,
    /// Set by the store at insertion time.
    pub applied_at: Option<DateTime<Utc>>,
}

impl FixtureRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            applied_at: None,
        }
    }
}

/// Fixture names must be namespaced with a `.` separator.
pub fn is_valid_fixture_name(name: &str) -> bool {
    name.contains('.')
}

/// Persistent log of applied change-sets.
pub trait MigrationStore: Send + Sync {
    /// Whether the tracking table exists.
    fn has_manager(&self) -> BoxFuture<'_, Result<bool>>;

    /// Create the tracking table. Safe to call when it already exists.
    fn install_manager(&self) -> BoxFuture<'_, Result<()>>;

    /// Look up an applied change-set.
    fn fetch_by_name<'a>(&'a self, name: &'a str)
        -> BoxFuture<'a, Result<Option<MigrationRecord>>>;

    /// Apply `content` and insert `record` as one unit of work.
    fn execute<'a>(
        &'a self,
        record: &'a MigrationRecord,
        content: &'a str,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Persistent log of applied fixtures.
pub trait FixtureStore: Send + Sync {
    /// All applied fixtures.
    fn list(&self) -> BoxFuture<'_, Result<Vec<FixtureRecord>>>;

    /// Record a fixture as applied.
    fn add<'a>(&'a self, record: &'a FixtureRecord) -> BoxFuture<'a, Result<()>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_set_name_is_qualified() {
        let cs = ChangeSet::new("blog", "0001_posts.sql", "CREATE TABLE posts ()");
        assert_eq!(cs.name, "blog/0001_posts.sql");
        assert_eq!(cs.record().name, "blog/0001_posts.sql");
        assert!(cs.record().applied_at.is_none());
    }

    #[test]
    fn test_whitespace_change_set_is_empty() {
        assert!(ChangeSet::new("m", "a.sql", "  \n\t ").is_empty());
        assert!(!ChangeSet::new("m", "a.sql", "SELECT 1;").is_empty());
    }

    #[test]
    fn test_fixture_name_validity() {
        assert!(is_valid_fixture_name("blog.seed_posts"));
        assert!(!is_valid_fixture_name("nodotname"));
    }
}
