//! # Error Types
//!
//! Domain-specific error types for kitab-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  kitab-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Malformed or missing request fields            │
//! │                                                                         │
//! │  kitab-db      DbError     - Storage failures, NotFound, duplicates    │
//! │  kitab-sheet   SheetError  - Unreadable workbook, missing column       │
//! │  kitab-server  ApiError    - What the browser sees ({code, error})     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Browser      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A delete was refused because other rows still point at the target.
    ///
    /// ## When This Occurs
    /// - Deleting a buyer that still has offline sales
    /// - Deleting a book that is still referenced by sales rows
    ///
    /// ## User Workflow
    /// ```text
    /// Admin clicks "Hapus" on buyer Budi
    ///      │
    ///      ▼
    /// count(offline_sales where buyer_id = Budi) = 4
    ///      │
    ///      ▼
    /// HasReferences { entity: "Buyer", id: 7, count: 4 }
    ///      │
    ///      ▼
    /// UI shows: "Cannot delete Buyer 7: referenced by 4 sale(s)"
    /// ```
    #[error("Cannot delete {entity} {id}: referenced by {count} sale(s)")]
    HasReferences {
        entity: &'static str,
        id: i64,
        count: i64,
    },

    /// The bulk-delete confirmation token did not match.
    #[error("Invalid confirmation token")]
    ConfirmationMismatch,

    /// A monetary computation left the representable range.
    #[error("Amount overflow while computing {context}")]
    AmountOverflow { context: &'static str },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised while turning a request contract into a command, before any
/// storage is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// A list that must have entries is empty.
    #[error("{field} must contain at least one entry")]
    Empty { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., non-numeric price, unparseable date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    /// Shorthand for [`ValidationError::InvalidFormat`].
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_references_message() {
        let err = CoreError::HasReferences {
            entity: "Buyer",
            id: 7,
            count: 4,
        };
        assert_eq!(
            err.to_string(),
            "Cannot delete Buyer 7: referenced by 4 sale(s)"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(ValidationError::required("name").to_string(), "name is required");

        let err = ValidationError::invalid("price", "not a number");
        assert_eq!(err.to_string(), "price has invalid format: not a number");

        let err = ValidationError::Empty {
            field: "items".to_string(),
        };
        assert_eq!(err.to_string(), "items must contain at least one entry");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("name").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
