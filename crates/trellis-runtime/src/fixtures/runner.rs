//! Fixture execution.
//!
//! Fixtures are seeding functions that must run at most once per database.
//! Each one is recorded in the fixture log after it succeeds. The first
//! failing fixture aborts the run; fixtures recorded before it stay recorded.

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, error, info, warn};

use trellis_core::error::{Result, TrellisError};
use trellis_core::store::{is_valid_fixture_name, FixtureRecord, FixtureStore};

use super::registry::FixtureRegistry;

/// What happened to a single fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureOutcome {
    AlreadyApplied,
    /// Not yet applied (check only).
    New,
    /// Name lacks the `.` namespace separator; skipped.
    Invalid,
    Applied,
}

impl FixtureOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadyApplied => "already executed, skipping",
            Self::New => "new fixture",
            Self::Invalid => "invalid name, skipping",
            Self::Applied => "executed successfully",
        }
    }
}

impl fmt::Display for FixtureOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureEntry {
    pub name: String,
    pub outcome: FixtureOutcome,
}

/// The fixture that stopped a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureFailure {
    pub name: String,
    pub message: String,
}

/// Result of a check or run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixtureReport {
    pub entries: Vec<FixtureEntry>,
    pub failure: Option<FixtureFailure>,
}

impl FixtureReport {
    pub fn success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn count(&self, outcome: FixtureOutcome) -> usize {
        self.entries.iter().filter(|e| e.outcome == outcome).count()
    }

    /// Names of fixtures executed during this run.
    pub fn applied(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.outcome == FixtureOutcome::Applied)
            .map(|e| e.name.as_str())
            .collect()
    }
}

/// Names that occur more than once, each reported once, in first-repeat order.
pub fn find_duplicates(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();

    for name in names {
        if !seen.insert(name.as_str()) && reported.insert(name.as_str()) {
            duplicates.push(name.clone());
        }
    }
    duplicates
}

/// Runs registered fixtures against a fixture log.
pub struct FixtureRunner<'a, S> {
    registry: &'a FixtureRegistry,
    store: &'a S,
}

impl<'a, S: FixtureStore> FixtureRunner<'a, S> {
    pub fn new(registry: &'a FixtureRegistry, store: &'a S) -> Self {
        Self { registry, store }
    }

    /// Scan all modules for fixtures, rejecting duplicate names.
    fn scan(&self) -> Result<Vec<String>> {
        let names = self.registry.scan();
        let duplicates = find_duplicates(&names);
        if !duplicates.is_empty() {
            error!("Duplicated fixture(s) found: {}", duplicates.join(","));
            return Err(TrellisError::DuplicateFixtures(duplicates));
        }
        Ok(names)
    }

    async fn applied_names(&self) -> Result<HashSet<String>> {
        Ok(self
            .store
            .list()
            .await?
            .into_iter()
            .map(|r| r.name)
            .collect())
    }

    /// Report each candidate fixture as new or already applied.
    pub async fn check(&self) -> Result<FixtureReport> {
        let names = self.scan()?;
        let applied = self.applied_names().await?;

        let entries = names
            .into_iter()
            .map(|name| {
                let outcome = if applied.contains(&name) {
                    FixtureOutcome::AlreadyApplied
                } else {
                    FixtureOutcome::New
                };
                FixtureEntry { name, outcome }
            })
            .collect();

        Ok(FixtureReport {
            entries,
            failure: None,
        })
    }

    /// Execute fixtures that have not been applied yet.
    ///
    /// `names` restricts the run to an explicit list; otherwise every
    /// registered fixture is a candidate.
    pub async fn run(&self, names: Option<&[String]>) -> Result<FixtureReport> {
        let candidates = match names {
            Some(names) => names.to_vec(),
            None => self.scan()?,
        };
        let mut applied = self.applied_names().await?;
        let mut report = FixtureReport::default();

        for name in candidates {
            if !is_valid_fixture_name(&name) {
                warn!("Fixture '{}': invalid name, skipping", name);
                report.entries.push(FixtureEntry {
                    name,
                    outcome: FixtureOutcome::Invalid,
                });
                continue;
            }

            if applied.contains(&name) {
                debug!("Fixture {}: already executed", name);
                report.entries.push(FixtureEntry {
                    name,
                    outcome: FixtureOutcome::AlreadyApplied,
                });
                continue;
            }

            if let Err(e) = self.apply(&name).await {
                error!("Fixture {} failed: {}", name, e);
                report.failure = Some(FixtureFailure {
                    name,
                    message: e.to_string(),
                });
                break;
            }

            info!("Fixture applied: {}", name);
            applied.insert(name.clone());
            report.entries.push(FixtureEntry {
                name,
                outcome: FixtureOutcome::Applied,
            });
        }

        Ok(report)
    }

    async fn apply(&self, name: &str) -> Result<()> {
        self.registry.execute(name).await?;
        self.store.add(&FixtureRecord::new(name)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use trellis_core::testing::MockFixtureStore;

    /// Registry whose handlers append their name to a shared log.
    fn recording_registry(names: &[&str], fail: &[&str]) -> (FixtureRegistry, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = FixtureRegistry::new();

        for name in names {
            let log = log.clone();
            let owned = name.to_string();
            let fails = fail.contains(name);
            registry.register(*name, move || {
                let log = log.clone();
                let owned = owned.clone();
                async move {
                    if fails {
                        return Err(TrellisError::Fixture {
                            name: owned,
                            message: "constraint violation".to_string(),
                        });
                    }
                    log.lock().unwrap().push(owned);
                    Ok(())
                }
            });
        }
        (registry, log)
    }

    #[test]
    fn test_find_duplicates() {
        let names: Vec<String> = ["a.x", "a.x", "b.y", "a.x", "b.y"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(find_duplicates(&names), vec!["a.x", "b.y"]);
        assert!(find_duplicates(&names[2..3]).is_empty());
    }

    #[tokio::test]
    async fn test_check_aborts_on_duplicates_without_lookups() {
        let (registry, _) = recording_registry(&["a.x", "a.x", "b.y"], &[]);
        let store = MockFixtureStore::new();
        let runner = FixtureRunner::new(&registry, &store);

        match runner.check().await {
            Err(TrellisError::DuplicateFixtures(names)) => assert_eq!(names, vec!["a.x"]),
            other => panic!("expected duplicate error, got {:?}", other),
        }
        assert_eq!(store.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_full_run_aborts_on_duplicates_with_no_side_effects() {
        let (registry, log) = recording_registry(&["a.x", "b.y", "a.x"], &[]);
        let store = MockFixtureStore::new();
        let runner = FixtureRunner::new(&registry, &store);

        assert!(matches!(
            runner.run(None).await,
            Err(TrellisError::DuplicateFixtures(_))
        ));
        assert!(log.lock().unwrap().is_empty());
        assert!(store.applied_names().is_empty());
    }

    #[tokio::test]
    async fn test_check_reports_membership() {
        let (registry, log) = recording_registry(&["a.x", "b.y"], &[]);
        let store = MockFixtureStore::with_applied(&["a.x"]);
        let runner = FixtureRunner::new(&registry, &store);

        let report = runner.check().await.unwrap();
        assert!(report.success());
        assert_eq!(
            report.entries,
            vec![
                FixtureEntry {
                    name: "a.x".into(),
                    outcome: FixtureOutcome::AlreadyApplied
                },
                FixtureEntry {
                    name: "b.y".into(),
                    outcome: FixtureOutcome::New
                },
            ]
        );
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_name_is_skipped_not_fatal() {
        let (registry, log) = recording_registry(&["a.x", "nodotname", "b.y"], &[]);
        let store = MockFixtureStore::new();
        let runner = FixtureRunner::new(&registry, &store);

        let names: Vec<String> = vec!["a.x".into(), "nodotname".into(), "b.y".into()];
        let report = runner.run(Some(&names)).await.unwrap();

        assert!(report.success());
        assert_eq!(report.count(FixtureOutcome::Invalid), 1);
        assert_eq!(*log.lock().unwrap(), vec!["a.x", "b.y"]);
        assert_eq!(store.applied_names(), vec!["a.x", "b.y"]);
    }

    #[tokio::test]
    async fn test_run_skips_applied_fixtures() {
        let (registry, log) = recording_registry(&["a.x", "b.y"], &[]);
        let store = MockFixtureStore::with_applied(&["a.x"]);
        let runner = FixtureRunner::new(&registry, &store);

        let report = runner.run(None).await.unwrap();
        assert_eq!(report.applied(), vec!["b.y"]);
        assert_eq!(*log.lock().unwrap(), vec!["b.y"]);

        let again = runner.run(None).await.unwrap();
        assert!(again.applied().is_empty());
        assert_eq!(again.count(FixtureOutcome::AlreadyApplied), 2);
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_fixtures() {
        let (registry, log) = recording_registry(&["a.x", "b.bad", "c.z"], &["b.bad"]);
        let store = MockFixtureStore::new();
        let runner = FixtureRunner::new(&registry, &store);

        let report = runner.run(None).await.unwrap();
        assert!(!report.success());

        let failure = report.failure.as_ref().unwrap();
        assert_eq!(failure.name, "b.bad");
        assert!(failure.message.contains("constraint violation"));
        assert_eq!(*log.lock().unwrap(), vec!["a.x"]);
        assert_eq!(store.applied_names(), vec!["a.x"]);
    }

    #[tokio::test]
    async fn test_unknown_explicit_name_aborts() {
        let (registry, _) = recording_registry(&["a.x"], &[]);
        let store = MockFixtureStore::new();
        let runner = FixtureRunner::new(&registry, &store);

        let names: Vec<String> = vec!["blog.missing".into(), "a.x".into()];
        let report = runner.run(Some(&names)).await.unwrap();
        assert!(!report.success());
        assert!(store.applied_names().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_explicit_name_runs_once() {
        let (registry, log) = recording_registry(&["a.x"], &[]);
        let store = MockFixtureStore::new();
        let runner = FixtureRunner::new(&registry, &store);

        let names: Vec<String> = vec!["a.x".into(), "a.x".into()];
        let report = runner.run(Some(&names)).await.unwrap();
        assert!(report.success());
        assert_eq!(report.count(FixtureOutcome::AlreadyApplied), 1);
        assert_eq!(log.lock().unwrap().len(), 1);
    }
}
