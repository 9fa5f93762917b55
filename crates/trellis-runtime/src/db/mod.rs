mod pool;

pub use pool::Database;

use trellis_core::error::{Result, TrellisError};

/// Validate a table name before it is interpolated into SQL.
pub(crate) fn checked_identifier(name: &str) -> Result<&str> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);

    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && name.len() <= 63 {
        Ok(name)
    } else {
        Err(TrellisError::Config(format!(
            "invalid table name '{}'",
            name
        )))
    }
}
