mod registry;
mod runner;
mod store;

pub use registry::{BoxedFixtureHandler, FixtureRegistry, RegisteredFixture};
pub use runner::{
    find_duplicates, FixtureEntry, FixtureFailure, FixtureOutcome, FixtureReport, FixtureRunner,
};
pub use store::{PgFixtureStore, FIXTURES_TABLE};
