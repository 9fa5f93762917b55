mod fixture;
mod migrate;
mod output;

use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};

use trellis_core::config::TrellisConfig;
use trellis_core::module::ModuleRegistry;
use trellis_runtime::fixtures::{FixtureRegistry, PgFixtureStore};
use trellis_runtime::migrations::{builtin_module, PgMigrationStore};
use trellis_runtime::Database;

/// TRELLIS - migrations and fixtures for modular web applications
#[derive(Parser, Debug)]
#[command(name = "trellis")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path.
    #[arg(short, long, default_value = "trellis.toml", global = true)]
    pub config: String,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// CLI commands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Install the migration log table.
    #[command(name = "migrate:init")]
    MigrateInit,

    /// Show which change-sets are applied, new or empty.
    #[command(name = "migrate:check")]
    MigrateCheck,

    /// Apply pending change-sets.
    #[command(name = "migrate:apply")]
    MigrateApply {
        /// Report what would be applied without executing anything.
        #[arg(long)]
        dry: bool,
    },

    /// Show which fixtures are applied or new.
    #[command(name = "fixture:check")]
    FixtureCheck,

    /// Run pending fixtures, or only the named ones.
    #[command(name = "fixture:run")]
    FixtureRun {
        /// Fixture names (`module.fixture`); all registered fixtures if omitted.
        names: Vec<String>,
    },
}

impl Cli {
    /// Install the global tracing subscriber.
    ///
    /// `RUST_LOG` wins over `--verbose`.
    pub fn init_tracing(&self) {
        let log_level = if self.verbose { "debug" } else { "warn" };
        tracing_subscriber::fmt()
            .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()))
            .init();
    }

    /// Execute the CLI command. Returns whether it succeeded.
    pub async fn execute(self, fixtures: &FixtureRegistry) -> Result<bool> {
        let ctx = AppContext::load(&self.config).await?;

        let success = match self.command {
            Commands::MigrateInit => migrate::init(&ctx).await,
            Commands::MigrateCheck => migrate::check(&ctx).await,
            Commands::MigrateApply { dry } => migrate::apply(&ctx, dry).await,
            Commands::FixtureCheck => fixture::check(&ctx, fixtures).await,
            Commands::FixtureRun { names } => fixture::run(&ctx, fixtures, &names).await,
        };

        if let Some(db) = &ctx.db {
            db.close().await;
        }
        Ok(success)
    }
}

/// Configuration, connection and modules shared by every command.
pub(crate) struct AppContext {
    pub config: TrellisConfig,
    pub db: Option<Database>,
    pub modules: ModuleRegistry,
}

impl AppContext {
    async fn load(config_path: &str) -> Result<Self> {
        // Load .env if present
        dotenvy::dotenv().ok();

        if !Path::new(config_path).exists() {
            anyhow::bail!(
                "Configuration file not found: {}\nCreate one with a [database] section and your [[modules]].",
                config_path
            );
        }

        let config = TrellisConfig::from_file(config_path)?;
        let modules = config.module_registry(vec![builtin_module()])?;
        let db = Database::from_config(&config.database).await?;

        Ok(Self {
            config,
            db,
            modules,
        })
    }

    fn migration_store(&self) -> trellis_core::Result<Option<PgMigrationStore>> {
        let table = &self.config.database.migrations_table;
        self.db
            .as_ref()
            .map(|db| PgMigrationStore::with_table(db.pool().clone(), table))
            .transpose()
    }

    fn fixture_store(&self) -> Option<PgFixtureStore> {
        self.db
            .as_ref()
            .map(|db| PgFixtureStore::new(db.pool().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parse_migrate_commands() {
        let cli = Cli::try_parse_from(["trellis", "migrate:init"]).unwrap();
        assert_eq!(cli.command, Commands::MigrateInit);
        assert_eq!(cli.config, "trellis.toml");

        let cli = Cli::try_parse_from(["trellis", "migrate:apply", "--dry"]).unwrap();
        assert_eq!(cli.command, Commands::MigrateApply { dry: true });

        let cli = Cli::try_parse_from(["trellis", "-c", "app.toml", "migrate:check"]).unwrap();
        assert_eq!(cli.config, "app.toml");
    }

    #[test]
    fn test_cli_parse_fixture_run_names() {
        let cli = Cli::try_parse_from(["trellis", "fixture:run", "blog.posts", "auth.users"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::FixtureRun {
                names: vec!["blog.posts".into(), "auth.users".into()]
            }
        );

        let cli = Cli::try_parse_from(["trellis", "fixture:run", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.command, Commands::FixtureRun { names: vec![] });
    }

    #[test]
    fn test_cli_rejects_unknown_command() {
        assert!(Cli::try_parse_from(["trellis", "migrate"]).is_err());
        assert!(Cli::try_parse_from(["trellis", "fixture:check", "--dry"]).is_err());
    }

    #[tokio::test]
    async fn test_missing_config_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        let cli = Cli::try_parse_from(["trellis", "-c", path.to_str().unwrap(), "migrate:check"])
            .unwrap();
        assert!(cli.execute(&FixtureRegistry::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_commands_without_connection_fail() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trellis.toml");
        fs::write(&path, "[project]\nname = \"blog\"\n").unwrap();
        let config = path.to_str().unwrap();

        for command in ["migrate:init", "migrate:check", "fixture:check", "fixture:run"] {
            let cli = Cli::try_parse_from(["trellis", "-c", config, command]).unwrap();
            assert!(!cli.execute(&FixtureRegistry::new()).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_context_registers_builtin_module_first() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trellis.toml");
        fs::write(
            &path,
            "[project]\nname = \"shop\"\n\n[[modules]]\nname = \"blog\"\npath = \"blog\"\n",
        )
        .unwrap();

        let ctx = AppContext::load(path.to_str().unwrap()).await.unwrap();
        let names: Vec<_> = ctx.modules.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["trellis", "blog"]);
        assert_eq!(ctx.config.project.name, "shop");
        assert!(ctx.db.is_none());
    }
}
