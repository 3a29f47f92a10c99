use sqlx::error::ErrorKind;
use thiserror::Error;

/// Errors that can occur when reading from or writing to the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A concurrent transaction touched the same rows and this one lost.
    /// Retrying the whole unit of work may succeed.
    #[error("Write conflict: {0}")]
    Conflict(String),

    /// A row with the same key already exists.
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A row references a parent row that does not exist.
    #[error("Foreign key violated: {0}")]
    ForeignKeyViolation(String),

    /// A column value is outside its allowed range (e.g. a negative quantity).
    #[error("Check constraint violated: {0}")]
    CheckViolation(String),

    /// An update targeted a row that does not exist.
    #[error("Row not found: {0}")]
    RowNotFound(String),

    /// A stored value could not be decoded into a model type.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The transaction could not be made durable.
    #[error("Commit failed: {0}")]
    CommitFailed(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            let constraint = db_err
                .constraint()
                .map(str::to_string)
                .unwrap_or_else(|| db_err.message().to_string());

            match db_err.kind() {
                ErrorKind::UniqueViolation => return StoreError::UniqueViolation(constraint),
                ErrorKind::ForeignKeyViolation => {
                    return StoreError::ForeignKeyViolation(constraint);
                }
                ErrorKind::CheckViolation => return StoreError::CheckViolation(constraint),
                _ => {}
            }

            // serialization_failure, deadlock_detected
            if matches!(db_err.code().as_deref(), Some("40001") | Some("40P01")) {
                return StoreError::Conflict(db_err.message().to_string());
            }
        }
        StoreError::Database(err)
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
