//! Storage contract error types
//!
//! Error codes:
//! - STORE_UNKNOWN_TABLE (ERROR)
//! - STORE_UNKNOWN_INDEX (ERROR)
//! - STORE_INVALID_BOUND (ERROR)
//! - STORE_INVALID_FILTER (ERROR)
//! - STORE_INVALID_ROW (ERROR)

use thiserror::Error;

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a storage engine while opening or running a scan
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Table '{0}' does not exist")]
    UnknownTable(String),

    #[error("Index '{index}' does not exist on table '{table}'")]
    UnknownIndex { table: String, index: String },

    #[error("Invalid bound: {0}")]
    InvalidBound(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid row: {0}")]
    InvalidRow(String),
}

impl StoreError {
    /// Returns the string code for this error
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::UnknownTable(_) => "STORE_UNKNOWN_TABLE",
            StoreError::UnknownIndex { .. } => "STORE_UNKNOWN_INDEX",
            StoreError::InvalidBound(_) => "STORE_INVALID_BOUND",
            StoreError::InvalidFilter(_) => "STORE_INVALID_FILTER",
            StoreError::InvalidRow(_) => "STORE_INVALID_ROW",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            StoreError::UnknownTable("t".into()).code(),
            "STORE_UNKNOWN_TABLE"
        );
        assert_eq!(
            StoreError::InvalidBound("x".into()).code(),
            "STORE_INVALID_BOUND"
        );
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::UnknownIndex {
            table: "users".into(),
            index: "by_email".into(),
        };
        let display = format!("{}", err);
        assert!(display.contains("by_email"));
        assert!(display.contains("users"));
    }
}
