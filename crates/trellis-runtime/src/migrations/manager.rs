//! Migration orchestration.
//!
//! Modules are visited in registration order and their change-sets in
//! filename order. Each change-set is looked up in the store before it is
//! considered; nothing about applied state is cached between lookups, so
//! concurrent runs from other processes are observed. The first failure
//! stops the whole run. Change-sets applied before it stay recorded, and a
//! rerun picks up where the failed one left off.

use std::fmt;

use tracing::{debug, error, info, warn};

use trellis_core::error::{Result, TrellisError};
use trellis_core::module::{Module, ModuleRegistry};
use trellis_core::store::{ChangeSet, MigrationStore};

use super::loader::module_change_sets;

/// What happened to a single change-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Already present in the migration log.
    AlreadyApplied,
    /// Blank content; never recorded.
    Empty,
    /// Not yet applied (check only).
    New,
    /// Would have been applied (dry run).
    DryRun,
    /// Applied and recorded.
    Applied,
}

impl MigrationOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadyApplied => "already applied",
            Self::Empty => "empty migration",
            Self::New => "new migration",
            Self::DryRun => "success (dry run)",
            Self::Applied => "success",
        }
    }
}

impl fmt::Display for MigrationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one change-set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationEntry {
    pub name: String,
    pub outcome: MigrationOutcome,
}

/// Outcomes for one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleReport {
    pub module: String,
    /// False when the module has no change-set directory.
    pub has_migrations: bool,
    pub entries: Vec<MigrationEntry>,
}

/// The error that stopped a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyFailure {
    pub module: String,
    /// Change-set being processed, if the failure was not while loading.
    pub name: Option<String>,
    pub message: String,
}

/// Result of a check or apply run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub modules: Vec<ModuleReport>,
    pub failure: Option<ApplyFailure>,
}

impl MigrationReport {
    pub fn success(&self) -> bool {
        self.failure.is_none()
    }

    /// All entries across modules, in evaluation order.
    pub fn entries(&self) -> impl Iterator<Item = &MigrationEntry> {
        self.modules.iter().flat_map(|m| m.entries.iter())
    }

    pub fn count(&self, outcome: MigrationOutcome) -> usize {
        self.entries().filter(|e| e.outcome == outcome).count()
    }

    /// Names of change-sets applied during this run.
    pub fn applied(&self) -> Vec<&str> {
        self.entries()
            .filter(|e| e.outcome == MigrationOutcome::Applied)
            .map(|e| e.name.as_str())
            .collect()
    }
}

/// Result of installing the migration log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    AlreadyInstalled,
    Installed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Check,
    DryRun,
    Apply,
}

/// Applies module change-sets against a migration log.
pub struct MigrationManager<'a, S> {
    store: Option<&'a S>,
    modules: &'a ModuleRegistry,
}

impl<'a, S: MigrationStore> MigrationManager<'a, S> {
    /// `store` is `None` when the application has no database connection.
    pub fn new(store: Option<&'a S>, modules: &'a ModuleRegistry) -> Self {
        Self { store, modules }
    }

    /// Install the migration log unless it already exists.
    pub async fn init(&self) -> Result<InitOutcome> {
        let store = self.store.ok_or(TrellisError::NoConnection)?;

        if store.has_manager().await? {
            debug!("Migration log already installed");
            return Ok(InitOutcome::AlreadyInstalled);
        }

        info!("Installing migration log");
        store.install_manager().await?;
        Ok(InitOutcome::Installed)
    }

    /// Report the state of every change-set without executing any of them.
    pub async fn check(&self) -> Result<MigrationReport> {
        self.run(Mode::Check).await
    }

    /// Apply pending change-sets. With `dry_run`, nothing is executed.
    pub async fn apply(&self, dry_run: bool) -> Result<MigrationReport> {
        self.run(if dry_run { Mode::DryRun } else { Mode::Apply })
            .await
    }

    async fn ready_store(&self) -> Result<&'a S> {
        let store = self.store.ok_or(TrellisError::NoConnection)?;
        if !store.has_manager().await? {
            return Err(TrellisError::NotInitialized);
        }
        Ok(store)
    }

    async fn run(&self, mode: Mode) -> Result<MigrationReport> {
        let store = self.ready_store().await?;
        let mut report = MigrationReport::default();

        for module in self.modules.iter() {
            let (module_report, failure) = self.run_module(store, module, mode).await;
            report.modules.push(module_report);

            if let Some(failure) = failure {
                error!(
                    "Migration run aborted in module {}: {}",
                    failure.module, failure.message
                );
                report.failure = Some(failure);
                break;
            }
        }

        Ok(report)
    }

    async fn run_module(
        &self,
        store: &S,
        module: &Module,
        mode: Mode,
    ) -> (ModuleReport, Option<ApplyFailure>) {
        let mut module_report = ModuleReport {
            module: module.name().to_string(),
            has_migrations: false,
            entries: Vec::new(),
        };

        let change_sets = match module_change_sets(module) {
            Ok(Some(change_sets)) => change_sets,
            Ok(None) => return (module_report, None),
            Err(e) => {
                let failure = ApplyFailure {
                    module: module.name().to_string(),
                    name: None,
                    message: e.to_string(),
                };
                return (module_report, Some(failure));
            }
        };
        module_report.has_migrations = true;

        for change_set in &change_sets {
            match evaluate(store, change_set, mode).await {
                Ok(outcome) => module_report.entries.push(MigrationEntry {
                    name: change_set.name.clone(),
                    outcome,
                }),
                Err(e) => {
                    let failure = ApplyFailure {
                        module: module.name().to_string(),
                        name: Some(change_set.name.clone()),
                        message: e.to_string(),
                    };
                    return (module_report, Some(failure));
                }
            }
        }

        (module_report, None)
    }
}

async fn evaluate<S: MigrationStore>(
    store: &S,
    change_set: &ChangeSet,
    mode: Mode,
) -> Result<MigrationOutcome> {
    if store.fetch_by_name(&change_set.name).await?.is_some() {
        debug!("{}: already applied", change_set.name);
        return Ok(MigrationOutcome::AlreadyApplied);
    }

    if change_set.is_empty() {
        warn!("{}: empty migration, skipping", change_set.name);
        return Ok(MigrationOutcome::Empty);
    }

    match mode {
        Mode::Check => Ok(MigrationOutcome::New),
        Mode::DryRun => Ok(MigrationOutcome::DryRun),
        Mode::Apply => {
            store
                .execute(&change_set.record(), &change_set.content)
                .await?;
            info!("Migration applied: {}", change_set.name);
            Ok(MigrationOutcome::Applied)
        }
    }
}
