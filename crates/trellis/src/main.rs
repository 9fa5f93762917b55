use std::process::ExitCode;

use anyhow::Result;
use trellis_runtime::FixtureRegistry;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    trellis::run_with_fixtures(FixtureRegistry::new()).await
}
