//! Testing utilities for trellis stores and runners.
//!
//! Orchestration logic is tested against the in-memory mock stores, which
//! record every call. Store implementations are tested against a real
//! PostgreSQL database obtained through [`TestDatabase`].

pub mod db;
pub mod mock_store;

pub use db::{IsolatedTestDb, TestDatabase};
pub use mock_store::{MockFixtureStore, MockMigrationStore};
