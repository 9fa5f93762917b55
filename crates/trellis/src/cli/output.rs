//! Console rendering of migration and fixture reports.

use console::{style, StyledObject};

use trellis_core::error::TrellisError;
use trellis_runtime::fixtures::{FixtureOutcome, FixtureReport};
use trellis_runtime::migrations::{MigrationOutcome, MigrationReport};

use super::AppContext;

pub(crate) fn header(ctx: &AppContext, title: &str) {
    println!();
    println!(
        "  {}  {} {} {}",
        style("🌿").bold(),
        style("TRELLIS").bold().green(),
        title,
        style(format!("({})", ctx.config.project.name)).dim()
    );
    println!();
}

/// Print an error that ends the command. Always returns `false`.
pub(crate) fn fatal(err: &TrellisError) -> bool {
    if err.is_precondition() {
        println!("  {} {}", style("!").yellow().bold(), style(err).yellow());
    } else {
        println!("  {} {}", style("✗").red(), style(err).red());
    }
    println!();
    false
}

fn migration_marker(outcome: MigrationOutcome) -> StyledObject<&'static str> {
    match outcome {
        MigrationOutcome::AlreadyApplied => style("·").dim(),
        MigrationOutcome::Empty => style("○").yellow(),
        MigrationOutcome::New => style("→").cyan(),
        MigrationOutcome::DryRun | MigrationOutcome::Applied => style("✓").green(),
    }
}

fn fixture_marker(outcome: FixtureOutcome) -> StyledObject<&'static str> {
    match outcome {
        FixtureOutcome::AlreadyApplied => style("·").dim(),
        FixtureOutcome::Invalid => style("○").yellow(),
        FixtureOutcome::New => style("→").cyan(),
        FixtureOutcome::Applied => style("✓").green(),
    }
}

/// Returns whether the run succeeded.
pub(crate) fn migration_report(report: &MigrationReport) -> bool {
    for module in &report.modules {
        if !module.has_migrations {
            println!(
                "  {} {}: no migrations",
                style("ℹ").blue(),
                style(&module.module).dim()
            );
            continue;
        }

        println!("  {} {}", style("▸").bold(), style(&module.module).bold());
        for entry in &module.entries {
            println!(
                "    {} {} {}",
                migration_marker(entry.outcome),
                style(&entry.name).cyan(),
                style(entry.outcome).dim()
            );
        }
    }

    if let Some(failure) = &report.failure {
        println!();
        println!(
            "  {} {}: {}",
            style("✗").red(),
            failure.name.as_deref().unwrap_or(&failure.module),
            style(&failure.message).red()
        );
        println!();
        return false;
    }

    println!();
    println!(
        "  {} {} applied, {} new, {} dry run, {} empty, {} already applied",
        style("ℹ").blue(),
        report.count(MigrationOutcome::Applied),
        report.count(MigrationOutcome::New),
        report.count(MigrationOutcome::DryRun),
        report.count(MigrationOutcome::Empty),
        report.count(MigrationOutcome::AlreadyApplied)
    );
    println!();
    true
}

/// Returns whether the run succeeded.
pub(crate) fn fixture_report(report: &FixtureReport) -> bool {
    if report.entries.is_empty() && report.failure.is_none() {
        println!("  {} No fixtures registered", style("ℹ").blue());
        println!();
        return true;
    }

    for entry in &report.entries {
        println!(
            "  {} {} {}",
            fixture_marker(entry.outcome),
            style(&entry.name).cyan(),
            style(entry.outcome).dim()
        );
    }

    if let Some(failure) = &report.failure {
        println!();
        println!(
            "  {} {}: {}",
            style("✗").red(),
            failure.name,
            style(&failure.message).red()
        );
        println!();
        return false;
    }

    println!();
    println!(
        "  {} {} applied, {} new, {} skipped",
        style("ℹ").blue(),
        report.count(FixtureOutcome::Applied),
        report.count(FixtureOutcome::New),
        report.count(FixtureOutcome::AlreadyApplied) + report.count(FixtureOutcome::Invalid)
    );
    println!();
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_runtime::fixtures::{FixtureEntry, FixtureFailure};
    use trellis_runtime::migrations::{ApplyFailure, MigrationEntry, ModuleReport};

    #[test]
    fn test_migration_report_result_follows_failure() {
        let mut report = MigrationReport {
            modules: vec![ModuleReport {
                module: "blog".into(),
                has_migrations: true,
                entries: vec![MigrationEntry {
                    name: "blog/0001_posts.sql".into(),
                    outcome: MigrationOutcome::Applied,
                }],
            }],
            failure: None,
        };
        assert!(migration_report(&report));

        report.failure = Some(ApplyFailure {
            module: "blog".into(),
            name: Some("blog/0002_tags.sql".into()),
            message: "syntax error".into(),
        });
        assert!(!migration_report(&report));
    }

    #[test]
    fn test_fixture_report_result_follows_failure() {
        let mut report = FixtureReport::default();
        assert!(fixture_report(&report));

        report.entries.push(FixtureEntry {
            name: "blog.posts".into(),
            outcome: FixtureOutcome::Applied,
        });
        report.failure = Some(FixtureFailure {
            name: "blog.tags".into(),
            message: "constraint violation".into(),
        });
        assert!(!fixture_report(&report));
    }

    #[test]
    fn test_fatal_is_false() {
        assert!(!fatal(&TrellisError::NoConnection));
        assert!(!fatal(&TrellisError::DuplicateFixtures(vec!["blog.posts".into()])));
    }
}
