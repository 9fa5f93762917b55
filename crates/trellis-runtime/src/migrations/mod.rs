mod builtin;
mod loader;
mod manager;
mod store;

pub use builtin::{builtin_module, BUILTIN_MODULE};
pub use loader::{load_embedded, load_migrations, module_change_sets, CHANGE_SET_EXTENSION};
pub use manager::{
    ApplyFailure, InitOutcome, MigrationEntry, MigrationManager, MigrationOutcome,
    MigrationReport, ModuleReport,
};
pub use store::{PgMigrationStore, DEFAULT_MIGRATIONS_TABLE};
