//! Custom error types for colcrypt
//!
//! This module defines the error hierarchy for the crate using thiserror.
//! Decryption authentication failures are deliberately absent: they are
//! per-value outcomes (see [`crate::crypto::DecryptFailure`]), not errors.

use thiserror::Error;

/// The main error type for colcrypt operations
#[derive(Error, Debug)]
pub enum ColcryptError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// CSV reading/writing errors
    #[error("CSV error: {0}")]
    Csv(String),

    /// Validation errors for tables and arguments
    #[error("Validation error: {0}")]
    Validation(String),

    /// A requested column does not exist in the table
    #[error("Column not found: {column}")]
    ColumnNotFound { column: String },

    /// A cell holds a value the cipher cannot operate on
    #[error("Unsupported value in column '{column}' at row {row}: expected text, found {kind}")]
    UnsupportedValue {
        column: String,
        row: usize,
        kind: &'static str,
    },

    /// Encryption errors
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Table already exists and the write mode forbids replacing it
    #[error("Table already exists: {0}")]
    TableExists(String),

    /// Table does not exist at the given location
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// A dry-run decryption found values that did not authenticate
    #[error("Verification failed: {failures} value(s) could not be decrypted")]
    VerificationFailed { failures: usize },

    /// A stored decrypt where not a single value authenticated
    #[error("None of {failures} value(s) could be decrypted (wrong password?); table left unchanged")]
    NothingDecrypted { failures: usize },

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl ColcryptError {
    /// Create a "column not found" error
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }
}

impl From<std::io::Error> for ColcryptError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ColcryptError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<csv::Error> for ColcryptError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}

impl From<rusqlite::Error> for ColcryptError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(format!("SQLite: {}", err))
    }
}

/// Result type alias for colcrypt operations
pub type ColcryptResult<T> = Result<T, ColcryptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ColcryptError::Config("test error".into());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_column_not_found_error() {
        let err = ColcryptError::column_not_found("email");
        assert_eq!(err.to_string(), "Column not found: email");
    }

    #[test]
    fn test_unsupported_value_error() {
        let err = ColcryptError::UnsupportedValue {
            column: "age".into(),
            row: 3,
            kind: "integer",
        };
        assert_eq!(
            err.to_string(),
            "Unsupported value in column 'age' at row 3: expected text, found integer"
        );
    }

    #[test]
    fn test_nothing_decrypted_error() {
        let err = ColcryptError::NothingDecrypted { failures: 4 };
        assert!(err.to_string().contains("None of 4 value(s)"));
        assert!(err.to_string().contains("table left unchanged"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ColcryptError = io_err.into();
        assert!(matches!(err, ColcryptError::Io(_)));
    }
}
