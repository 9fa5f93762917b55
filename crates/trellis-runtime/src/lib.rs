pub mod db;
pub mod fixtures;
pub mod mail;
pub mod migrations;

pub use db::Database;
pub use fixtures::{FixtureRegistry, FixtureReport, FixtureRunner, PgFixtureStore};
pub use mail::{MessageQueueRepository, MessageStatus, MessageTemplateRepository, QueueMessage};
pub use migrations::{
    builtin_module, MigrationManager, MigrationOutcome, MigrationReport, PgMigrationStore,
};
