use thiserror::Error;

/// Core error type for trellis operations.
#[derive(Error, Debug)]
pub enum TrellisError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("no database connection found in the application")]
    NoConnection,

    #[error("migration manager not installed; run 'migrate:init' command first")]
    NotInitialized,

    #[error("Duplicated fixture(s) found: {}", .0.join(","))]
    DuplicateFixtures(Vec<String>),

    #[error("Migration '{name}' failed: {message}")]
    Migration { name: String, message: String },

    #[error("Fixture '{name}' failed: {message}")]
    Fixture { name: String, message: String },
}

impl TrellisError {
    /// Whether this error stops a run before any item is evaluated.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            TrellisError::NoConnection | TrellisError::NotInitialized | TrellisError::Config(_)
        )
    }
}

/// Result type alias using TrellisError.
pub type Result<T> = std::result::Result<T, TrellisError>;
