//! trellis - migration and fixture tooling for web applications.
//!
//! Applications that ship fixtures build their own binary around
//! [`run_with_fixtures`], registering seeding functions first:
//!
//! ```ignore
//! let mut fixtures = FixtureRegistry::new();
//! fixtures.register("blog.sample_posts", move || seed_posts(pool.clone()));
//! trellis::run_with_fixtures(fixtures).await
//! ```

pub mod cli;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

pub use cli::Cli;
pub use trellis_core::{Module, ModuleRegistry, TrellisConfig, TrellisError};
pub use trellis_runtime::FixtureRegistry;

/// Parse the command line and run it with the given fixtures.
pub async fn run_with_fixtures(fixtures: FixtureRegistry) -> Result<ExitCode> {
    let cli = Cli::parse();
    cli.init_tracing();

    let success = cli.execute(&fixtures).await?;
    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
