use console::style;

use trellis_runtime::migrations::{InitOutcome, MigrationManager};

use super::output;
use super::AppContext;

/// `migrate:init`
pub(crate) async fn init(ctx: &AppContext) -> bool {
    output::header(ctx, "Migration Log");

    let store = match ctx.migration_store() {
        Ok(store) => store,
        Err(e) => return output::fatal(&e),
    };
    let manager = MigrationManager::new(store.as_ref(), &ctx.modules);

    match manager.init().await {
        Ok(InitOutcome::Installed) => {
            println!(
                "  {} Installed migration log: {}",
                style("✓").green(),
                style(&ctx.config.database.migrations_table).cyan()
            );
            println!();
            true
        }
        Ok(InitOutcome::AlreadyInstalled) => {
            println!(
                "  {} Migration log already installed, nothing to do",
                style("ℹ").blue()
            );
            println!();
            true
        }
        Err(e) => output::fatal(&e),
    }
}

/// `migrate:check`
pub(crate) async fn check(ctx: &AppContext) -> bool {
    output::header(ctx, "Migration Status");

    let store = match ctx.migration_store() {
        Ok(store) => store,
        Err(e) => return output::fatal(&e),
    };
    let manager = MigrationManager::new(store.as_ref(), &ctx.modules);

    match manager.check().await {
        Ok(report) => output::migration_report(&report),
        Err(e) => output::fatal(&e),
    }
}

/// `migrate:apply [--dry]`
pub(crate) async fn apply(ctx: &AppContext, dry_run: bool) -> bool {
    output::header(ctx, if dry_run {
        "Migrations (dry run)"
    } else {
        "Migrations"
    });

    let store = match ctx.migration_store() {
        Ok(store) => store,
        Err(e) => return output::fatal(&e),
    };
    let manager = MigrationManager::new(store.as_ref(), &ctx.modules);

    match manager.apply(dry_run).await {
        Ok(report) => output::migration_report(&report),
        Err(e) => output::fatal(&e),
    }
}
