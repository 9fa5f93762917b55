pub mod config;
pub mod error;
pub mod module;
pub mod store;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{DatabaseConfig, ModuleConfig, TrellisConfig};
pub use error::{Result, TrellisError};
pub use module::{MigrationSource, Module, ModuleRegistry, MIGRATIONS_FOLDER};
pub use store::{
    is_valid_fixture_name, ChangeSet, FixtureRecord, FixtureStore, MigrationRecord, MigrationStore,
};
