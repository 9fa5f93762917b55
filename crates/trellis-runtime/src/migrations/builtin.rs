//! Built-in change-sets for the tables trellis itself owns.
//!
//! They are registered as the `trellis` module, ahead of application
//! modules, and are tracked in the migration log like any other change-set.

use trellis_core::module::Module;

/// Name of the built-in module.
pub const BUILTIN_MODULE: &str = "trellis";

const FIXTURES_SQL: &str = include_str!("../../sql/0001_fixtures.sql");
const MAIL_SQL: &str = include_str!("../../sql/0002_mail.sql");

/// The built-in module.
pub fn builtin_module() -> Module {
    Module::embedded(
        BUILTIN_MODULE,
        vec![("0001_fixtures.sql", FIXTURES_SQL), ("0002_mail.sql", MAIL_SQL)],
    )
}
