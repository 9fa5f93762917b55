use trellis_core::error::TrellisError;
use trellis_runtime::fixtures::{FixtureRegistry, FixtureRunner};

use super::output;
use super::AppContext;

/// `fixture:check`
pub(crate) async fn check(ctx: &AppContext, fixtures: &FixtureRegistry) -> bool {
    output::header(ctx, "Fixture Status");

    let Some(store) = ctx.fixture_store() else {
        return output::fatal(&TrellisError::NoConnection);
    };
    let runner = FixtureRunner::new(fixtures, &store);

    match runner.check().await {
        Ok(report) => output::fixture_report(&report),
        Err(e) => output::fatal(&e),
    }
}

/// `fixture:run [name...]`
pub(crate) async fn run(ctx: &AppContext, fixtures: &FixtureRegistry, names: &[String]) -> bool {
    output::header(ctx, "Fixtures");

    let Some(store) = ctx.fixture_store() else {
        return output::fatal(&TrellisError::NoConnection);
    };
    let runner = FixtureRunner::new(fixtures, &store);
    let selected = (!names.is_empty()).then_some(names);

    match runner.run(selected).await {
        Ok(report) => output::fixture_report(&report),
        Err(e) => output::fatal(&e),
    }
}
