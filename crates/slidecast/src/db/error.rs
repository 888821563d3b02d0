//! Persistence error types.

use std::time::Duration;

use thiserror::Error;

/// Result type for repository operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A read found nothing.
    #[error("not found: {0}")]
    NotFound(String),

    /// An update, delete or vote matched zero rows.
    #[error("no rows affected: {0}")]
    NoRowsAffected(String),

    /// Slide type code outside {poll, heading, paragraph}.
    #[error("unsupported slide type: {0}")]
    UnsupportedSlideType(i64),

    /// Malformed input rejected before touching the database.
    #[error("invalid input: {0}")]
    Invalid(String),

    /// The operation exceeded its time budget.
    #[error("database operation timed out after {0:?}")]
    Timeout(Duration),

    /// Stored rows violate an invariant (e.g. a heading slide without a heading row).
    #[error("inconsistent data: {0}")]
    Inconsistent(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn no_rows(msg: impl Into<String>) -> Self {
        Self::NoRowsAffected(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::UnsupportedSlideType(4);
        assert_eq!(err.to_string(), "unsupported slide type: 4");

        let err = StoreError::no_rows("option 3 in content 7");
        assert_eq!(err.to_string(), "no rows affected: option 3 in content 7");
    }
}
