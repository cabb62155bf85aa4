use domain::StoreError;
use thiserror::Error;

/// Errors raised inside the PostgreSQL adapter.
#[derive(Debug, Error)]
pub enum PostgresError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored JSON document could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A column held a value the domain does not recognize.
    #[error("Corrupt row: {0}")]
    CorruptRow(String),
}

/// Result type for adapter internals.
pub type Result<T> = std::result::Result<T, PostgresError>;

impl From<PostgresError> for StoreError {
    fn from(err: PostgresError) -> Self {
        match err {
            PostgresError::Database(sqlx::Error::Database(db_err))
                if db_err.is_unique_violation() =>
            {
                StoreError::Conflict(match db_err.constraint() {
                    Some(constraint) => format!("unique constraint {constraint} violated"),
                    None => db_err.message().to_string(),
                })
            }
            other => StoreError::backend(other),
        }
    }
}
