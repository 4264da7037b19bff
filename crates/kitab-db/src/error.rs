//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)          Business rule (CoreError)         │
//! │       │                                     │                           │
//! │       ▼                                     ▼                           │
//! │  DbError (this module) ◄────────── DbError::Domain                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (kitab-server) ← {code, error} JSON + HTTP status             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use kitab_core::{CoreError, ValidationError};
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - Unknown id in get/update/delete
    /// - An order line references a book id that does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Creating a book or buyer whose name already exists
    /// - Renaming onto an existing name
    /// - Two concurrent creates racing on the same name
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A business rule refused the operation (references, confirmation,
    /// invalid input reaching the storage layer).
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Fills in the offending value of a constraint-derived UniqueViolation.
    ///
    /// SQLite reports only `table.column`, so callers that know which value
    /// they were writing attach it here.
    pub fn with_duplicate_value(self, field: &str, value: &str) -> Self {
        match self {
            DbError::UniqueViolation { .. } => DbError::duplicate(field, value),
            other => other,
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "UNIQUE constraint failed: books.name"
                // "FOREIGN KEY constraint failed"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Domain(CoreError::Validation(err))
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_duplicate_value_only_touches_unique() {
        let err = DbError::duplicate("books.name", "unknown").with_duplicate_value("name", "Kitab A");
        assert_eq!(err.to_string(), "Duplicate name: 'Kitab A' already exists");

        let err = DbError::not_found("Book", 3).with_duplicate_value("name", "Kitab A");
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[test]
    fn test_domain_errors_pass_through() {
        let err: DbError = CoreError::ConfirmationMismatch.into();
        assert_eq!(err.to_string(), "Invalid confirmation token");

        let err: DbError = ValidationError::required("name").into();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }
}
